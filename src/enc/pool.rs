use crate::api::*;
use crate::com::cu::*;

/* mutable pair (best, temp) out of a two slot array */
#[inline]
fn pick<T>(pair: &mut [T; 2], best: usize) -> (&mut T, &mut T) {
    let (a, b) = pair.split_at_mut(1);
    if best == 0 {
        (&mut a[0], &mut b[0])
    } else {
        (&mut b[0], &mut a[0])
    }
}

/* working set of one quadtree depth: a best and a temp candidate plus the source */
pub(crate) struct HevceDepthBuf {
    pub(crate) cu: [HevcCUData; 2],
    pub(crate) pred: [HevcYuv; 2],
    pub(crate) reco: [HevcYuv; 2],
    pub(crate) resi: [HevcYuv; 2],
    pub(crate) orig: HevcYuv,
    pub(crate) bkg: HevcYuv,
    /* which slot holds the best candidate */
    best: usize,
}

impl HevceDepthBuf {
    fn new(geom: HevcCuGeom, depth: u8) -> Self {
        let w = (geom.max_cu_width >> depth) as usize;
        let h = (geom.max_cu_height >> depth) as usize;
        let yuv = HevcYuv::new(w, h, geom.chroma);
        HevceDepthBuf {
            cu: [HevcCUData::new(geom, depth), HevcCUData::new(geom, depth)],
            pred: [yuv.clone(), yuv.clone()],
            reco: [yuv.clone(), yuv.clone()],
            resi: [yuv.clone(), yuv.clone()],
            orig: yuv.clone(),
            bkg: yuv,
            best: 0,
        }
    }

    #[inline]
    pub(crate) fn best_idx(&self) -> usize {
        self.best
    }

    #[inline]
    pub(crate) fn temp_idx(&self) -> usize {
        1 - self.best
    }

    /* the temp candidate becomes the best one */
    #[inline]
    pub(crate) fn swap(&mut self) {
        self.best = 1 - self.best;
    }

    #[inline]
    pub(crate) fn best_cu(&self) -> &HevcCUData {
        &self.cu[self.best]
    }

    #[inline]
    pub(crate) fn temp_cu(&self) -> &HevcCUData {
        &self.cu[1 - self.best]
    }

    #[inline]
    pub(crate) fn temp_cu_mut(&mut self) -> &mut HevcCUData {
        &mut self.cu[1 - self.best]
    }

    #[inline]
    pub(crate) fn best_cu_mut(&mut self) -> &mut HevcCUData {
        &mut self.cu[self.best]
    }

    #[inline]
    pub(crate) fn cus_mut(&mut self) -> (&mut HevcCUData, &mut HevcCUData) {
        pick(&mut self.cu, self.best)
    }

    #[inline]
    pub(crate) fn best_reco(&self) -> &HevcYuv {
        &self.reco[self.best]
    }

    #[inline]
    pub(crate) fn best_pred(&self) -> &HevcYuv {
        &self.pred[self.best]
    }
}

/* per depth working buffers of the recursive search, allocated once */
pub(crate) struct HevceBufPool {
    slots: Vec<HevceDepthBuf>,
}

impl HevceBufPool {
    pub(crate) fn new(sps: &HevcSps) -> Self {
        let geom = HevcCuGeom::new(sps);
        let slots = (0..=sps.max_cu_depth())
            .map(|d| HevceDepthBuf::new(geom, d))
            .collect();
        HevceBufPool { slots }
    }

    #[inline]
    pub(crate) fn num_depths(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(crate) fn at(&self, depth: u8) -> &HevceDepthBuf {
        &self.slots[depth as usize]
    }

    #[inline]
    pub(crate) fn at_mut(&mut self, depth: u8) -> &mut HevceDepthBuf {
        &mut self.slots[depth as usize]
    }

    /* buffers of depth and depth + 1 at once */
    pub(crate) fn pair_mut(&mut self, depth: u8) -> (&mut HevceDepthBuf, &mut HevceDepthBuf) {
        let d = depth as usize;
        let (lo, hi) = self.slots.split_at_mut(d + 1);
        (&mut lo[d], &mut hi[0])
    }
}
