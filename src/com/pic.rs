use super::cu::*;
use super::yuv::*;
use super::*;
use crate::api::*;

/* foreground mask of the low-rank/sparse decomposition, non-zero = foreground */
#[derive(Debug, Clone, Default)]
pub struct HevcMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl HevcMask {
    pub fn new(width: usize, height: usize) -> Self {
        HevcMask {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn set_foreground(&mut self, x: usize, y: usize, w: usize, h: usize) {
        for j in y..(y + h).min(self.height) {
            for i in x..(x + w).min(self.width) {
                self.data[j * self.width + i] = 1;
            }
        }
    }
}

impl BackgroundMask for HevcMask {
    fn is_background_only(&self, x: u32, y: u32, w: u32, h: u32) -> bool {
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return true;
        }
        let x1 = (x + w as usize).min(self.width);
        let y1 = (y + h as usize).min(self.height);
        (y..y1).all(|j| {
            self.data[j * self.width + x..j * self.width + x1]
                .iter()
                .all(|&m| m == 0)
        })
    }
}

/* picture being coded: source, reconstruction and the committed CTU decisions */
pub struct HevcPic {
    pub org: HevcYuv,
    pub rec: HevcYuv,
    /* background picture of the low-rank/sparse decomposition */
    pub bkg: Option<HevcYuv>,
    pub mask: Option<Box<dyn BackgroundMask>>,
    pub ctus: Vec<HevcCUData>,
}

impl HevcPic {
    pub fn new(sps: &HevcSps) -> Self {
        let (w, h) = (sps.pic_width as usize, sps.pic_height as usize);
        let geom = HevcCuGeom::new(sps);
        let ctus = (0..sps.num_ctus())
            .map(|addr| {
                let mut ctu = HevcCUData::new(geom, 0);
                ctu.cu_addr = addr;
                ctu.cu_pel_x = (addr % geom.frame_width_in_ctu) as u32 * geom.max_cu_width;
                ctu.cu_pel_y = (addr / geom.frame_width_in_ctu) as u32 * geom.max_cu_height;
                ctu
            })
            .collect();
        HevcPic {
            org: HevcYuv::new(w, h, sps.chroma_format),
            rec: HevcYuv::new(w, h, sps.chroma_format),
            bkg: None,
            mask: None,
            ctus,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.org.width(Y_C)
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.org.height(Y_C)
    }

    #[inline]
    pub fn ctu(&self, addr: usize) -> &HevcCUData {
        &self.ctus[addr]
    }

    /* no mask means nothing is background */
    pub fn is_background_only(&self, x: u32, y: u32, w: u32, h: u32) -> bool {
        match &self.mask {
            Some(mask) => mask.is_background_only(x, y, w, h),
            None => false,
        }
    }
}
