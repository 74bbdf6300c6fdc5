//! In-crate collaborator doubles for the engine tests.

use crate::api::*;
use crate::com::*;

/* syntax recorder, every element costs one bit, a delta QP 1 + |dqp| */
#[derive(Default)]
pub(crate) struct HevceFakeCoder {
    pub(crate) log: Vec<&'static str>,
    pub(crate) dqp: Vec<i32>,
    bits: u32,
    base: u32,
}

impl HevceFakeCoder {
    fn put(&mut self, name: &'static str) {
        self.log.push(name);
        self.bits += 1;
    }
}

impl EntropyCoder for HevceFakeCoder {
    type Context = u32;

    fn save_context(&self) -> u32 {
        self.bits
    }
    fn load_context(&mut self, ctx: &u32) {
        self.bits = *ctx;
    }
    fn reset_bits(&mut self) {
        self.base = self.bits;
    }
    fn num_written_bits(&self) -> u32 {
        self.bits - self.base
    }
    fn num_bins_coded(&self) -> u32 {
        self.bits - self.base
    }

    fn encode_split_flag(&mut self, _cu: &HevcCUData, _idx: usize, _depth: u8) {
        self.put("split_flag");
    }
    fn encode_bg_skip_flag(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("bg_skip_flag");
    }
    fn encode_cu_transquant_bypass_flag(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("transquant_bypass_flag");
    }
    fn encode_skip_flag(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("skip_flag");
    }
    fn encode_merge_flag(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("merge_flag");
    }
    fn encode_merge_index(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("merge_index");
    }
    fn encode_intra_bc_flag(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("intra_bc_flag");
    }
    fn encode_intra_bc(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("intra_bc");
    }
    fn encode_pred_mode(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("pred_mode");
    }
    fn encode_part_size(&mut self, _cu: &HevcCUData, _idx: usize, _depth: u8) {
        self.put("part_size");
    }
    fn encode_ipcm_info(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("ipcm_info");
    }
    fn encode_intra_dir_luma(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("intra_dir_luma");
    }
    fn encode_intra_dir_chroma(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("intra_dir_chroma");
    }
    fn encode_inter_dir(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("inter_dir");
    }
    fn encode_ref_frm_idx(&mut self, _cu: &HevcCUData, _idx: usize, _list: usize) {
        self.put("ref_frm_idx");
    }
    fn encode_mvd(&mut self, _cu: &HevcCUData, _idx: usize, _list: usize) {
        self.put("mvd");
    }
    fn encode_mvp_idx(&mut self, _cu: &HevcCUData, _idx: usize, _list: usize) {
        self.put("mvp_idx");
    }
    fn encode_qt_root_cbf(&mut self, _cu: &HevcCUData, _idx: usize) {
        self.put("qt_root_cbf");
    }
    fn encode_qt_cbf(&mut self, _cu: &HevcCUData, _idx: usize, _comp: usize) {
        self.put("qt_cbf");
    }
    fn encode_coeff_nxn(&mut self, _cu: &HevcCUData, _idx: usize, _comp: usize) {
        self.put("coeff_nxn");
    }
    fn encode_delta_qp(&mut self, dqp: i32) {
        self.put("delta_qp");
        self.bits += dqp.abs() as u32;
        self.dqp.push(dqp);
    }
    fn encode_terminating_bit(&mut self, _last: bool) {
        self.put("terminating_bit");
    }
    fn encode_slice_finish(&mut self) {
        self.put("slice_finish");
    }
}

/* residual kept when any sample of a component deviates by more than thresh;
a coded residual reconstructs exactly */
pub(crate) fn fake_code_residual(
    cu: &mut HevcCUData,
    org: &HevcYuv,
    pred: &HevcYuv,
    resi: &mut HevcYuv,
    reco: &mut HevcYuv,
    skip_residual: bool,
    thresh: i32,
) -> u64 {
    let depth = cu.depth(0);
    let (w, h) = (cu.width(0) as usize, cu.height(0) as usize);
    let mut dist = 0u64;
    for comp in 0..org.num_comps() {
        let (sx, sy) = if comp == Y_C {
            (0, 0)
        } else {
            org.chroma().shift()
        };
        let (cw, ch) = (w >> sx, h >> sy);
        let stride = org.width(comp);
        let mut coded = false;
        for y in 0..ch {
            for x in 0..cw {
                let i = y * stride + x;
                let r = org.plane(comp)[i] as i32 - pred.plane(comp)[i] as i32;
                resi.plane_mut(comp)[i] = r as pel;
                coded |= r.abs() > thresh;
            }
        }
        coded &= !skip_residual;

        let off = cu.coeff_offset(0, comp);
        for y in 0..ch {
            for x in 0..cw {
                let i = y * stride + x;
                let r = resi.plane(comp)[i];
                cu.coeff_mut(comp)[off + y * cw + x] = if coded { r as coef } else { 0 };
                reco.plane_mut(comp)[i] = if coded {
                    org.plane(comp)[i]
                } else {
                    pred.plane(comp)[i]
                };
                let d = (org.plane(comp)[i] - reco.plane(comp)[i]) as i64;
                dist += (d * d) as u64;
            }
        }
        cu.set_cbf_sub_parts(coded as u8, comp, 0, depth);
    }
    dist
}

/* one searched CU, recorded per search call */
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HevceVisit {
    pub(crate) kind: &'static str,
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) width: u32,
    pub(crate) part_size: PartSize,
    /* block vector hint the CU was searched with */
    pub(crate) hint: HevcMv,
}

/* block copy reproducing the source exactly for CUs no wider than max_width
lying inside the top-left region x region square */
#[derive(Debug, Clone, Copy)]
pub(crate) struct HevceFakeIbc {
    pub(crate) region: u32,
    pub(crate) max_width: u32,
    pub(crate) bv: HevcMv,
}

/* DC intra, integer-pel merge candidates over a reference picture, zero-motion inter */
pub(crate) struct HevceFakeSearch {
    pub(crate) refp: Option<HevcYuv>,
    /* quarter-pel vectors offered as merge candidates, L0 only */
    pub(crate) merge_mvs: Vec<HevcMv>,
    pub(crate) thresh: i32,
    pub(crate) ibc: Option<HevceFakeIbc>,
    pub(crate) visits: Vec<HevceVisit>,
}

impl Default for HevceFakeSearch {
    fn default() -> Self {
        HevceFakeSearch {
            refp: None,
            merge_mvs: vec![HevcMv::default()],
            thresh: 0,
            ibc: None,
            visits: vec![],
        }
    }
}

impl HevceFakeSearch {
    fn visit(&mut self, kind: &'static str, cu: &HevcCUData) {
        self.visits.push(HevceVisit {
            kind,
            x: cu.cu_pel_x(),
            y: cu.cu_pel_y(),
            width: cu.width(0),
            part_size: cu.part_size(0),
            hint: cu.last_intra_bc_mv(),
        });
    }

    fn predict(&self, cu: &HevcCUData, mv: HevcMv, pred: &mut HevcYuv) {
        match &self.refp {
            Some(refp) => {
                let x = (cu.cu_pel_x() as i32 + (mv.hor as i32 >> 2)).max(0) as usize;
                let y = (cu.cu_pel_y() as i32 + (mv.ver as i32 >> 2)).max(0) as usize;
                pred.copy_from_pic_yuv(refp, x, y);
            }
            None => {
                for comp in 0..pred.num_comps() {
                    pred.fill(comp, 1 << 7);
                }
            }
        }
    }

    fn stamp_motion(cu: &mut HevcCUData, mv: HevcMv, depth: u8) {
        for pu in 0..cu.part_size(0).num_pu() {
            let (off, _, _) = cu.part_index_and_size(0, pu);
            cu.set_inter_dir_sub_parts(1, off, pu, depth);
            cu.set_all_mv_field(HevcMvField::new(mv, 0), REF_PIC_LIST_0, off, pu, depth);
            cu.set_all_mvd(mv, REF_PIC_LIST_0, off, pu, depth);
            cu.set_mvp_idx_sub_parts(0, REF_PIC_LIST_0, off, pu, depth);
        }
    }
}

impl PredSearch for HevceFakeSearch {
    fn merge_candidates(&mut self, cu: &HevcCUData, _pic: &HevcPic) -> Vec<HevcMergeCand> {
        self.visit("merge", cu);
        self.merge_mvs
            .iter()
            .map(|mv| HevcMergeCand {
                inter_dir: 1,
                mv_field: [HevcMvField::new(*mv, 0), HevcMvField::default()],
            })
            .collect()
    }

    fn motion_compensation(&mut self, cu: &HevcCUData, _pic: &HevcPic, pred: &mut HevcYuv) {
        let mv = cu.mv_field(REF_PIC_LIST_0).mv(0);
        self.predict(cu, mv, pred);
    }

    fn pred_inter_search(
        &mut self,
        cu: &mut HevcCUData,
        _pic: &HevcPic,
        _org: &HevcYuv,
        pred: &mut HevcYuv,
        use_mrg: bool,
    ) -> bool {
        self.visit(if use_mrg { "inter_merge" } else { "inter" }, cu);
        if use_mrg {
            return false;
        }
        let depth = cu.depth(0);
        Self::stamp_motion(cu, HevcMv::default(), depth);
        self.predict(cu, HevcMv::default(), pred);
        true
    }

    fn est_intra_pred(
        &mut self,
        cu: &mut HevcCUData,
        _pic: &HevcPic,
        org: &HevcYuv,
        pred: &mut HevcYuv,
        resi: &mut HevcYuv,
        reco: &mut HevcYuv,
    ) -> u64 {
        self.visit("intra", cu);
        let depth = cu.depth(0);
        let w = cu.width(0) as usize;
        for comp in 0..org.num_comps() {
            let (sx, sy) = if comp == Y_C {
                (0, 0)
            } else {
                org.chroma().shift()
            };
            let (cw, ch) = (w >> sx, w >> sy);
            let stride = org.width(comp);
            let mut sum = 0i64;
            for y in 0..ch {
                for x in 0..cw {
                    sum += org.plane(comp)[y * stride + x] as i64;
                }
            }
            let dc = (sum / (cw * ch) as i64) as pel;
            pred.fill(comp, dc);
        }
        cu.set_intra_dir_sub_parts(0, DC_IDX, 0, depth);
        cu.set_intra_dir_sub_parts(1, DM_CHROMA_IDX, 0, depth);
        fake_code_residual(cu, org, pred, resi, reco, false, self.thresh)
    }

    fn pred_intra_bc_search(
        &mut self,
        cu: &mut HevcCUData,
        pic: &HevcPic,
        _org: &HevcYuv,
        pred: &mut HevcYuv,
        search_1d: bool,
    ) -> bool {
        self.visit(if search_1d { "intra_bc_1d" } else { "intra_bc" }, cu);
        let ibc = match self.ibc {
            Some(ibc) => ibc,
            None => return false,
        };
        let (x, y, w) = (cu.cu_pel_x(), cu.cu_pel_y(), cu.width(0));
        if w > ibc.max_width || x + w > ibc.region || y + w > ibc.region {
            return false;
        }
        let depth = cu.depth(0);
        cu.set_all_mv_field(HevcMvField::new(ibc.bv, 0), REF_PIC_LIST_INTRABC, 0, 0, depth);
        pred.copy_from_pic_yuv(&pic.org, x as usize, y as usize);
        true
    }
}

/* thresholded residual coder */
#[derive(Default)]
pub(crate) struct HevceFakeResidual {
    pub(crate) thresh: i32,
    pub(crate) calls: usize,
}

impl ResidualCoder for HevceFakeResidual {
    fn encode_res_and_calc_rd_inter_cu(
        &mut self,
        cu: &mut HevcCUData,
        org: &HevcYuv,
        pred: &HevcYuv,
        resi: &mut HevcYuv,
        reco: &mut HevcYuv,
        skip_residual: bool,
    ) -> u64 {
        self.calls += 1;
        fake_code_residual(cu, org, pred, resi, reco, skip_residual, self.thresh)
    }
}
