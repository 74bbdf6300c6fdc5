use super::*;
use crate::api::*;

/* planar YUV block or picture buffer, stride == plane width */
#[derive(Debug, Clone, Default)]
pub struct HevcYuv {
    width: usize,
    height: usize,
    chroma: ChromaSampling,
    planes: [Vec<pel>; N_C],
}

impl HevcYuv {
    pub fn new(width: usize, height: usize, chroma: ChromaSampling) -> Self {
        let mut yuv = HevcYuv {
            width,
            height,
            chroma,
            planes: [vec![], vec![], vec![]],
        };
        for c in 0..yuv.num_comps() {
            yuv.planes[c] = vec![0; yuv.width(c) * yuv.height(c)];
        }
        yuv
    }

    #[inline]
    pub fn num_comps(&self) -> usize {
        self.chroma.num_comps()
    }

    #[inline]
    pub fn chroma(&self) -> ChromaSampling {
        self.chroma
    }

    #[inline]
    fn shift(&self, comp: usize) -> (usize, usize) {
        if comp == Y_C {
            (0, 0)
        } else {
            self.chroma.shift()
        }
    }

    #[inline]
    pub fn width(&self, comp: usize) -> usize {
        self.width >> self.shift(comp).0
    }

    #[inline]
    pub fn height(&self, comp: usize) -> usize {
        self.height >> self.shift(comp).1
    }

    #[inline]
    pub fn plane(&self, comp: usize) -> &[pel] {
        &self.planes[comp]
    }

    #[inline]
    pub fn plane_mut(&mut self, comp: usize) -> &mut [pel] {
        &mut self.planes[comp]
    }

    #[inline]
    pub fn at(&self, comp: usize, x: usize, y: usize) -> pel {
        self.planes[comp][y * self.width(comp) + x]
    }

    pub fn fill(&mut self, comp: usize, val: pel) {
        for p in self.planes[comp].iter_mut() {
            *p = val;
        }
    }

    pub fn clear(&mut self) {
        for c in 0..self.num_comps() {
            self.fill(c, 0);
        }
    }

    /* copy a w x h luma rectangle (and matching chroma) from src, clipped to both buffers */
    pub fn copy_region_from(
        &mut self,
        src: &HevcYuv,
        src_x: usize,
        src_y: usize,
        dst_x: usize,
        dst_y: usize,
        w: usize,
        h: usize,
    ) {
        for c in 0..self.num_comps().min(src.num_comps()) {
            let (sx, sy) = self.shift(c);
            let (x0, y0, x1, y1) = (src_x >> sx, src_y >> sy, dst_x >> sx, dst_y >> sy);
            let cw = (w >> sx)
                .min(src.width(c).saturating_sub(x0))
                .min(self.width(c).saturating_sub(x1));
            let ch = (h >> sy)
                .min(src.height(c).saturating_sub(y0))
                .min(self.height(c).saturating_sub(y1));
            let (s_stride, d_stride) = (src.width(c), self.width(c));
            for j in 0..ch {
                let s = (y0 + j) * s_stride + x0;
                let d = (y1 + j) * d_stride + x1;
                self.planes[c][d..d + cw].copy_from_slice(&src.planes[c][s..s + cw]);
            }
        }
    }

    /* load this block from a picture at luma position (x, y), edge samples replicated outside */
    pub fn copy_from_pic_yuv(&mut self, pic: &HevcYuv, x: usize, y: usize) {
        for c in 0..self.num_comps().min(pic.num_comps()) {
            let (sx, sy) = self.shift(c);
            let (pw, ph) = (pic.width(c), pic.height(c));
            let (bw, bh) = (self.width(c), self.height(c));
            if pw == 0 || ph == 0 {
                continue;
            }
            for j in 0..bh {
                let py = ((y >> sy) + j).min(ph - 1);
                for i in 0..bw {
                    let px = ((x >> sx) + i).min(pw - 1);
                    self.planes[c][j * bw + i] = pic.planes[c][py * pw + px];
                }
            }
        }
    }

    /* store this block into a picture at luma position (x, y), clipped */
    pub fn copy_to_pic_yuv(&self, pic: &mut HevcYuv, x: usize, y: usize) {
        pic.copy_region_from(self, 0, 0, x, y, self.width, self.height);
    }

    /* store this block as quadrant part of a buffer twice its size */
    pub fn copy_to_part_yuv(&self, dst: &mut HevcYuv, part: usize) {
        let x = (part & 1) * self.width;
        let y = (part >> 1) * self.height;
        dst.copy_region_from(self, 0, 0, x, y, self.width, self.height);
    }

    /* sum of squared differences over every component */
    pub fn ssd(&self, other: &HevcYuv) -> u64 {
        let mut dist = 0u64;
        for c in 0..self.num_comps().min(other.num_comps()) {
            for (a, b) in self.planes[c].iter().zip(other.planes[c].iter()) {
                let d = *a as i64 - *b as i64;
                dist += (d * d) as u64;
            }
        }
        dist
    }
}
