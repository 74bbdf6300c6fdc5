use super::dqp::*;
use super::eco::*;
use super::pool::*;
use super::HevceCu;
use crate::api::*;
use crate::com::cu::*;
use crate::com::*;

use log::*;

/* RD cost scalarisation of one slice */
#[derive(Debug, Clone, Copy)]
pub(crate) struct HevceRdCost {
    pub(crate) lambda: f64,
    mode: CostMode,
}

impl Default for HevceRdCost {
    fn default() -> Self {
        HevceRdCost {
            lambda: 1.0,
            mode: CostMode::COST_STANDARD_LOSSY,
        }
    }
}

impl HevceRdCost {
    pub(crate) fn new(lambda: f64, mode: CostMode) -> Self {
        HevceRdCost { lambda, mode }
    }

    #[inline]
    pub(crate) fn calc(&self, bits: u32, dist: u64) -> f64 {
        if self.mode == CostMode::COST_STANDARD_LOSSY {
            dist as f64 + bits as f64 * self.lambda
        } else {
            dist as f64 / self.lambda + bits as f64
        }
    }

    /* smallest cost step that still makes a candidate lose */
    #[inline]
    pub(crate) fn penalty(&self) -> f64 {
        if self.mode == CostMode::COST_MIXED_LOSSLESS_LOSSY_CODING {
            1.0 / self.lambda
        } else {
            1.0
        }
    }
}

/* entropy coder snapshots of one depth */
pub(crate) struct HevceRdCtx<C> {
    /* state the depth started from */
    pub(crate) curr_best: C,
    /* state after the best candidate so far */
    pub(crate) next_best: C,
    /* state after the candidate just evaluated */
    pub(crate) temp_best: C,
}

impl<C: Clone> HevceRdCtx<C> {
    pub(crate) fn new(curr_best: C) -> Self {
        HevceRdCtx {
            next_best: curr_best.clone(),
            temp_best: curr_best.clone(),
            curr_best,
        }
    }
}

/* AMP shapes worth a search after the symmetric ones */
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct HevceAmpModes {
    pub(crate) hor: bool,
    pub(crate) ver: bool,
    pub(crate) mrg_hor: bool,
    pub(crate) mrg_ver: bool,
}

/* motion vector difference magnitude of partition 0 over the lists in use */
pub(crate) fn hevce_mvd_sum(cu: &HevcCUData, slice: &HevcSlice) -> u32 {
    (0..2)
        .filter(|&l| slice.num_ref_idx[l] > 0)
        .map(|l| cu.mv_field(l).mvd(0).abs_sum())
        .sum()
}

pub(crate) fn hevce_derive_test_mode_amp(
    tools: &ToolProfile,
    best: &HevcCUData,
    parent_part_size: PartSize,
) -> HevceAmpModes {
    use PartSize::*;
    let mut m = HevceAmpModes::default();
    if !tools.amp_enc_speedup {
        m.hor = true;
        m.ver = true;
        return m;
    }

    let part = best.part_size(0);
    match part {
        SIZE_2NxN => m.hor = true,
        SIZE_Nx2N => m.ver = true,
        SIZE_2Nx2N if !best.merge_flag(0) && !best.is_skipped(0) => {
            m.hor = true;
            m.ver = true;
        }
        _ => {}
    }

    if tools.amp_mrg {
        if parent_part_size.is_amp() {
            m.mrg_hor = true;
            m.mrg_ver = true;
        } else if parent_part_size == NUMBER_OF_PART_SIZES && tools.amp_mrg_intra_parent {
            if part == SIZE_2NxN {
                m.mrg_hor = true;
            } else if part == SIZE_Nx2N {
                m.mrg_ver = true;
            }
        }
        if part == SIZE_2Nx2N && !best.is_skipped(0) {
            m.mrg_hor = true;
            m.mrg_ver = true;
        }
    }

    if best.width(0) == 64 {
        m.hor = false;
        m.ver = false;
    }
    m
}

/* the temp candidate replaces the best one when strictly cheaper */
pub(crate) fn hevce_check_best_mode<C: Clone>(slot: &mut HevceDepthBuf, rc: &mut HevceRdCtx<C>) -> bool {
    if slot.temp_cu().total_cost() < slot.best_cu().total_cost() {
        slot.swap();
        rc.next_best = rc.temp_best.clone();
        return true;
    }
    false
}

/* syntax bits of a candidate on top of the state its depth started from */
pub(crate) fn hevce_count_cu_bits<E: EntropyCoder>(
    sx: &HevceSyntaxCtx,
    e: &mut E,
    rc: &mut HevceRdCtx<E::Context>,
    cu: &mut HevcCUData,
    depth: u8,
) {
    e.load_context(&rc.curr_best);
    e.reset_bits();
    let mut code_dqp = false;
    hevce_eco_cu_body(sx, e, cu, 0, depth, &mut code_dqp);
    rc.temp_best = e.save_context();
    cu.total_bits = e.num_written_bits();
    cu.total_bins = e.num_bins_coded();
}

/* no descendant that falls inside the slice segment is background only */
pub(crate) fn hevce_check_this_depth(
    pic: &HevcPic,
    sps: &HevcSps,
    slice: &HevcSlice,
    scu: usize,
    x: u32,
    y: u32,
    depth: u8,
) -> bool {
    let w = sps.max_cu_width >> depth;
    if pic.is_background_only(x, y, w, w) {
        return false;
    }
    if depth >= sps.max_cu_depth() {
        return true;
    }
    let n = sps.num_part_in_ctu() >> (2 * (depth as usize + 1));
    let (seg_start, seg_end) = (
        slice.slice_segment_cur_start_cu_addr as usize,
        slice.slice_segment_cur_end_cu_addr as usize,
    );
    let half = w >> 1;
    (0..4).all(|i| {
        let child = scu + i * n;
        let in_slice = child + n > seg_start && child < seg_end;
        !in_slice
            || hevce_check_this_depth(
                pic,
                sps,
                slice,
                child,
                x + half * (i as u32 & 1),
                y + half * (i as u32 >> 1),
                depth + 1,
            )
    })
}

impl<P: PredSearch, R: ResidualCoder, E: EntropyCoder> HevceCu<P, R, E> {
    /* background skip of the whole CU; returns (test_this_depth, test_higher_depth) */
    pub(crate) fn x_check_bg_skip(
        &mut self,
        pic: &HevcPic,
        slice: &HevcSlice,
        depth: u8,
        rc: &mut HevceRdCtx<E::Context>,
    ) -> (bool, bool) {
        let rd = self.rd;
        let HevceCu { sps, pool, .. } = self;
        let slot = pool.at_mut(depth);
        let t = slot.temp_idx();
        let (x, y, w, h, scu) = {
            let cu = &slot.cu[t];
            (cu.cu_pel_x(), cu.cu_pel_y(), cu.width(0), cu.height(0), cu.scu_addr())
        };

        if pic.is_background_only(x, y, w, h) {
            let cu = &mut slot.cu[t];
            cu.set_depth_sub_parts(depth, 0);
            cu.set_bg_skip_flag_sub_parts(true, 0, depth);
            cu.set_pred_mode_sub_parts(PredMode::MODE_INTRA, 0, depth);
            cu.set_part_size_sub_parts(PartSize::SIZE_2Nx2N, 0, depth);
            let reco = &mut slot.reco[t];
            reco.copy_region_from(&slot.bkg, 0, 0, 0, 0, w as usize, h as usize);
            slot.pred[t].copy_region_from(&slot.bkg, 0, 0, 0, 0, w as usize, h as usize);
            cu.total_bits = 0;
            cu.total_bins = 0;
            cu.total_distortion = slot.orig.ssd(&slot.reco[t]);
            cu.total_cost = rd.calc(0, cu.total_distortion);
            trace!("bg skip ({}, {}) {}x{} cost {:.1}", x, y, w, h, cu.total_cost);
            rc.temp_best = rc.curr_best.clone();
            hevce_check_best_mode(slot, rc);
            return (false, false);
        }

        slot.cu[t].set_bg_skip_flag_sub_parts(false, 0, depth);
        let test_this = depth >= sps.max_cu_depth()
            || hevce_check_this_depth(pic, sps, slice, scu, x, y, depth);
        (test_this, true)
    }

    pub(crate) fn x_check_rd_cost_merge_2nx2n(
        &mut self,
        pic: &HevcPic,
        slice: &HevcSlice,
        depth: u8,
        rc: &mut HevceRdCtx<E::Context>,
        early_detection_skip: &mut bool,
    ) {
        let rd = self.rd;
        let (fast_merge, esd) = (
            self.cfg.use_fast_decision_for_merge,
            self.cfg.use_early_skip_detection,
        );
        let HevceCu {
            sps,
            pps,
            tools,
            pool,
            search,
            resid,
            sbac,
            ..
        } = self;
        let sx = HevceSyntaxCtx {
            sps,
            pps,
            slice,
            ctus: &pic.ctus,
            bg_skip: tools.bg_skip,
        };
        let slot = pool.at_mut(depth);

        let (org_qp, bypass, cands) = {
            let cu = slot.temp_cu_mut();
            cu.set_part_size_sub_parts(PartSize::SIZE_2Nx2N, 0, depth);
            (
                cu.qp(0) as i32,
                cu.cu_transquant_bypass(0),
                search.merge_candidates(cu, pic),
            )
        };
        let num_cands = cands.len().min(sps.max_num_merge_cand as usize);

        /* candidates whose residual was zero anyway need no skip retry */
        let mut zero_residual = [false; MRG_MAX_NUM_CANDS];
        let mut best_is_skip = false;
        let iterations = if bypass { 1 } else { 2 };

        for no_residual in (0..iterations).map(|i| i != 0) {
            for (idx, cand) in cands.iter().take(num_cands).enumerate() {
                if (no_residual && zero_residual[idx]) || (best_is_skip && !no_residual) {
                    continue;
                }
                let t = slot.temp_idx();
                {
                    let cu = &mut slot.cu[t];
                    cu.set_pred_mode_sub_parts(PredMode::MODE_INTER, 0, depth);
                    cu.set_cu_transquant_bypass_sub_parts(bypass, 0, depth);
                    cu.set_part_size_sub_parts(PartSize::SIZE_2Nx2N, 0, depth);
                    cu.set_merge_flag_sub_parts(true, 0, 0, depth);
                    cu.set_merge_index_sub_parts(idx as u8, 0, 0, depth);
                    cu.set_inter_dir_sub_parts(cand.inter_dir, 0, 0, depth);
                    cu.set_all_mv_field(cand.mv_field[0], REF_PIC_LIST_0, 0, 0, depth);
                    cu.set_all_mv_field(cand.mv_field[1], REF_PIC_LIST_1, 0, 0, depth);
                    search.motion_compensation(cu, pic, &mut slot.pred[t]);

                    cu.total_distortion = resid.encode_res_and_calc_rd_inter_cu(
                        cu,
                        &slot.orig,
                        &slot.pred[t],
                        &mut slot.resi[t],
                        &mut slot.reco[t],
                        no_residual,
                    );
                    let root_cbf = cu.qt_root_cbf(0);
                    if !no_residual && !root_cbf {
                        zero_residual[idx] = true;
                    }
                    cu.set_skip_flag_sub_parts(!root_cbf, 0, depth);
                    hevce_count_cu_bits(&sx, sbac, rc, cu, depth);
                    cu.total_cost = rd.calc(cu.total_bits, cu.total_distortion);
                    hevce_check_dqp(&sx, sbac, cu, depth, &rd);
                    trace!(
                        "merge {} d{} skip {} cost {:.1}",
                        idx,
                        depth,
                        !root_cbf,
                        cu.total_cost
                    );
                }
                hevce_check_best_mode(slot, rc);
                slot.temp_cu_mut().init_est_data(depth, org_qp, bypass);

                if fast_merge && !best_is_skip {
                    best_is_skip = !slot.best_cu().qt_root_cbf(0);
                }
            }

            if !no_residual && esd {
                let best = slot.best_cu();
                if !best.qt_root_cbf(0) {
                    if best.merge_flag(0) || hevce_mvd_sum(best, slice) == 0 {
                        *early_detection_skip = true;
                    }
                }
            }
        }
    }

    pub(crate) fn x_check_rd_cost_inter(
        &mut self,
        pic: &HevcPic,
        slice: &HevcSlice,
        depth: u8,
        part_size: PartSize,
        use_mrg: bool,
        rc: &mut HevceRdCtx<E::Context>,
    ) {
        let rd = self.rd;
        let HevceCu {
            sps,
            pps,
            tools,
            pool,
            search,
            resid,
            sbac,
            ..
        } = self;
        let sx = HevceSyntaxCtx {
            sps,
            pps,
            slice,
            ctus: &pic.ctus,
            bg_skip: tools.bg_skip,
        };
        let slot = pool.at_mut(depth);
        let t = slot.temp_idx();
        {
            let cu = &mut slot.cu[t];
            cu.set_depth_sub_parts(depth, 0);
            cu.set_skip_flag_sub_parts(false, 0, depth);
            cu.set_part_size_sub_parts(part_size, 0, depth);
            cu.set_pred_mode_sub_parts(PredMode::MODE_INTER, 0, depth);
            cu.set_merge_amp(true);

            let found = search.pred_inter_search(cu, pic, &slot.orig, &mut slot.pred[t], use_mrg);
            if !found || !cu.merge_amp() {
                return;
            }

            cu.total_distortion = resid.encode_res_and_calc_rd_inter_cu(
                cu,
                &slot.orig,
                &slot.pred[t],
                &mut slot.resi[t],
                &mut slot.reco[t],
                false,
            );
            if cu.merge_flag(0) && part_size == PartSize::SIZE_2Nx2N && !cu.qt_root_cbf(0) {
                cu.set_skip_flag_sub_parts(true, 0, depth);
            }
            hevce_count_cu_bits(&sx, sbac, rc, cu, depth);
            cu.total_cost = rd.calc(cu.total_bits, cu.total_distortion);
            hevce_check_dqp(&sx, sbac, cu, depth, &rd);
            trace!("inter {:?} d{} cost {:.1}", part_size, depth, cu.total_cost);
        }
        hevce_check_best_mode(slot, rc);
    }

    /* returns the cost of the intra candidate whether it won or not */
    pub(crate) fn x_check_rd_cost_intra(
        &mut self,
        pic: &HevcPic,
        slice: &HevcSlice,
        depth: u8,
        part_size: PartSize,
        rc: &mut HevceRdCtx<E::Context>,
    ) -> f64 {
        let rd = self.rd;
        let HevceCu {
            sps,
            pps,
            tools,
            pool,
            search,
            sbac,
            ..
        } = self;
        let sx = HevceSyntaxCtx {
            sps,
            pps,
            slice,
            ctus: &pic.ctus,
            bg_skip: tools.bg_skip,
        };
        let slot = pool.at_mut(depth);
        let t = slot.temp_idx();
        let cost = {
            let cu = &mut slot.cu[t];
            cu.set_skip_flag_sub_parts(false, 0, depth);
            cu.set_part_size_sub_parts(part_size, 0, depth);
            cu.set_pred_mode_sub_parts(PredMode::MODE_INTRA, 0, depth);

            cu.total_distortion = search.est_intra_pred(
                cu,
                pic,
                &slot.orig,
                &mut slot.pred[t],
                &mut slot.resi[t],
                &mut slot.reco[t],
            );
            hevce_count_cu_bits(&sx, sbac, rc, cu, depth);
            cu.total_cost = rd.calc(cu.total_bits, cu.total_distortion);
            hevce_check_dqp(&sx, sbac, cu, depth, &rd);
            trace!("intra {:?} d{} cost {:.1}", part_size, depth, cu.total_cost);
            cu.total_cost
        };
        hevce_check_best_mode(slot, rc);
        cost
    }

    pub(crate) fn x_check_rd_cost_intra_bc(
        &mut self,
        pic: &HevcPic,
        slice: &HevcSlice,
        depth: u8,
        search_1d: bool,
        rc: &mut HevceRdCtx<E::Context>,
    ) {
        let rd = self.rd;
        let HevceCu {
            sps,
            pps,
            tools,
            pool,
            search,
            resid,
            sbac,
            ..
        } = self;
        let sx = HevceSyntaxCtx {
            sps,
            pps,
            slice,
            ctus: &pic.ctus,
            bg_skip: tools.bg_skip,
        };
        let slot = pool.at_mut(depth);
        let t = slot.temp_idx();
        {
            let cu = &mut slot.cu[t];
            cu.set_depth_sub_parts(depth, 0);
            cu.set_skip_flag_sub_parts(false, 0, depth);
            cu.set_part_size_sub_parts(PartSize::SIZE_2Nx2N, 0, depth);
            cu.set_pred_mode_sub_parts(PredMode::MODE_INTRABC, 0, depth);
            cu.set_intra_dir_sub_parts(0, DC_IDX, 0, depth);
            cu.set_intra_dir_sub_parts(1, DC_IDX, 0, depth);

            if !search.pred_intra_bc_search(cu, pic, &slot.orig, &mut slot.pred[t], search_1d) {
                return;
            }
            cu.total_distortion = resid.encode_res_and_calc_rd_inter_cu(
                cu,
                &slot.orig,
                &slot.pred[t],
                &mut slot.resi[t],
                &mut slot.reco[t],
                false,
            );
            hevce_count_cu_bits(&sx, sbac, rc, cu, depth);
            cu.total_cost = rd.calc(cu.total_bits, cu.total_distortion);
            hevce_check_dqp(&sx, sbac, cu, depth, &rd);
            trace!("intra bc d{} 1d {} cost {:.1}", depth, search_1d, cu.total_cost);
        }
        hevce_check_best_mode(slot, rc);
    }

    /* raw samples at PCM bit depth */
    pub(crate) fn x_check_intra_pcm(
        &mut self,
        pic: &HevcPic,
        slice: &HevcSlice,
        depth: u8,
        rc: &mut HevceRdCtx<E::Context>,
    ) {
        let rd = self.rd;
        let HevceCu {
            sps,
            pps,
            tools,
            pool,
            sbac,
            ..
        } = self;
        let sx = HevceSyntaxCtx {
            sps,
            pps,
            slice,
            ctus: &pic.ctus,
            bg_skip: tools.bg_skip,
        };
        let slot = pool.at_mut(depth);
        let t = slot.temp_idx();
        {
            let cu = &mut slot.cu[t];
            cu.set_skip_flag_sub_parts(false, 0, depth);
            cu.set_ipcm_flag_sub_parts(true, 0, depth);
            cu.set_part_size_sub_parts(PartSize::SIZE_2Nx2N, 0, depth);
            cu.set_pred_mode_sub_parts(PredMode::MODE_INTRA, 0, depth);
            cu.set_tr_idx_sub_parts(0, 0, depth);

            let w = cu.width(0) as usize;
            let org = &slot.orig;
            let reco = &mut slot.reco[t];
            for comp in 0..org.num_comps() {
                let (cx, cy) = if comp == Y_C { (0, 0) } else { org.chroma().shift() };
                let (bd, pcm_bd) = if comp == Y_C {
                    (sps.bit_depth_luma, sps.pcm_bit_depth_luma)
                } else {
                    (sps.bit_depth_chroma, sps.pcm_bit_depth_chroma)
                };
                let shift = bd.saturating_sub(pcm_bd);
                let (cw, ch) = (w >> cx, w >> cy);
                let stride = org.width(comp);
                let off = cu.coeff_offset(0, comp);
                for y in 0..ch {
                    for x in 0..cw {
                        let s = org.plane(comp)[y * stride + x] >> shift;
                        cu.pcm_sample_mut(comp)[off + y * cw + x] = s;
                        reco.plane_mut(comp)[y * stride + x] = s << shift;
                    }
                }
            }
            cu.total_distortion = slot.orig.ssd(&slot.reco[t]);

            hevce_count_cu_bits(&sx, sbac, rc, cu, depth);
            cu.total_cost = rd.calc(cu.total_bits, cu.total_distortion);
            hevce_check_dqp(&sx, sbac, cu, depth, &rd);
            trace!("pcm d{} cost {:.1}", depth, cu.total_cost);
        }
        hevce_check_best_mode(slot, rc);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cu_at(sps: &HevcSps, depth: u8) -> HevcCUData {
        let geom = HevcCuGeom::new(sps);
        let slice = HevcSlice::new(sps, SliceType::P_SLICE, 30, 10.0);
        let pic = HevcCUData::new(geom, 0);
        let mut ctu = HevcCUData::new(geom, 0);
        ctu.init_cu(&pic, &slice, 0);
        if depth == 0 {
            ctu.init_est_data(0, 30, false);
            return ctu;
        }
        let mut cu = HevcCUData::new(geom, depth);
        cu.init_sub_cu(&ctu, 0, depth, 30);
        cu.init_est_data(depth, 30, false);
        cu
    }

    #[test]
    fn cost_scalarisation() {
        let lossy = HevceRdCost::new(4.0, CostMode::COST_STANDARD_LOSSY);
        assert_eq!(lossy.calc(10, 100), 140.0);
        assert_eq!(lossy.penalty(), 1.0);
        let mixed = HevceRdCost::new(4.0, CostMode::COST_MIXED_LOSSLESS_LOSSY_CODING);
        assert_eq!(mixed.calc(10, 100), 35.0);
        assert_eq!(mixed.penalty(), 0.25);
    }

    #[test]
    fn mvd_sum_skips_lists_without_references() {
        let sps = HevcSps::new(64, 64, 64, 4);
        let mut cu = cu_at(&sps, 0);
        cu.set_part_size_sub_parts(PartSize::SIZE_2Nx2N, 0, 0);
        cu.set_all_mvd(HevcMv::new(4, -2), REF_PIC_LIST_1, 0, 0, 0);

        let p = HevcSlice::new(&sps, SliceType::P_SLICE, 30, 10.0);
        assert_eq!(hevce_mvd_sum(&cu, &p), 0);
        let mut b = HevcSlice::new(&sps, SliceType::B_SLICE, 30, 10.0);
        assert_eq!(hevce_mvd_sum(&cu, &b), 6);
        b.num_ref_idx = [1, 0];
        assert_eq!(hevce_mvd_sum(&cu, &b), 0);

        cu.set_all_mvd(HevcMv::new(-1, 0), REF_PIC_LIST_0, 0, 0, 0);
        assert_eq!(hevce_mvd_sum(&cu, &b), 1);
    }

    #[test]
    fn amp_follows_best_shape() {
        let sps = HevcSps::new(64, 64, 64, 4);
        let tools = ToolProfile {
            amp_enc_speedup: true,
            amp_mrg: true,
            ..Default::default()
        };
        let mut cu = cu_at(&sps, 1);
        cu.set_pred_mode_sub_parts(PredMode::MODE_INTER, 0, 1);
        cu.set_part_size_sub_parts(PartSize::SIZE_2NxN, 0, 1);
        let m = hevce_derive_test_mode_amp(&tools, &cu, PartSize::SIZE_2Nx2N);
        assert_eq!(
            m,
            HevceAmpModes {
                hor: true,
                ..Default::default()
            }
        );

        let m = hevce_derive_test_mode_amp(&tools, &cu, PartSize::SIZE_2NxnU);
        assert_eq!((m.hor, m.ver, m.mrg_hor, m.mrg_ver), (true, false, true, true));

        cu.set_part_size_sub_parts(PartSize::SIZE_2Nx2N, 0, 1);
        let m = hevce_derive_test_mode_amp(&tools, &cu, PartSize::SIZE_2Nx2N);
        assert_eq!((m.hor, m.ver, m.mrg_hor, m.mrg_ver), (true, true, true, true));

        cu.set_merge_flag_sub_parts(true, 0, 0, 1);
        cu.set_skip_flag_sub_parts(true, 0, 1);
        let m = hevce_derive_test_mode_amp(&tools, &cu, PartSize::SIZE_2Nx2N);
        assert_eq!(m, HevceAmpModes::default());
    }

    #[test]
    fn amp_intra_parent_needs_the_flag() {
        let sps = HevcSps::new(64, 64, 64, 4);
        let mut tools = ToolProfile {
            amp_enc_speedup: true,
            amp_mrg: true,
            ..Default::default()
        };
        let mut cu = cu_at(&sps, 1);
        cu.set_pred_mode_sub_parts(PredMode::MODE_INTER, 0, 1);
        cu.set_part_size_sub_parts(PartSize::SIZE_Nx2N, 0, 1);
        let m = hevce_derive_test_mode_amp(&tools, &cu, PartSize::NUMBER_OF_PART_SIZES);
        assert!(!m.mrg_ver);
        tools.amp_mrg_intra_parent = true;
        let m = hevce_derive_test_mode_amp(&tools, &cu, PartSize::NUMBER_OF_PART_SIZES);
        assert_eq!((m.ver, m.mrg_hor, m.mrg_ver), (true, false, true));
    }

    #[test]
    fn no_amp_speedup_tests_all_shapes() {
        let sps = HevcSps::new(64, 64, 64, 4);
        let cu = cu_at(&sps, 0);
        let m = hevce_derive_test_mode_amp(&ToolProfile::default(), &cu, PartSize::SIZE_2Nx2N);
        assert_eq!((m.hor, m.ver, m.mrg_hor, m.mrg_ver), (true, true, false, false));
        let tools = ToolProfile {
            amp_enc_speedup: true,
            ..Default::default()
        };
        let m = hevce_derive_test_mode_amp(&tools, &cu, PartSize::SIZE_2Nx2N);
        assert_eq!(m, HevceAmpModes::default());
    }

    #[test]
    fn strictly_cheaper_candidate_wins() {
        let sps = HevcSps::new(64, 64, 64, 4);
        let mut pool = HevceBufPool::new(&sps);
        let slot = pool.at_mut(1);
        let mut rc = HevceRdCtx::new(1u32);
        rc.temp_best = 7;

        slot.best_cu_mut().total_cost = 10.0;
        slot.temp_cu_mut().total_cost = 10.0;
        assert!(!hevce_check_best_mode(slot, &mut rc));
        assert_eq!(rc.next_best, 1);

        slot.temp_cu_mut().total_cost = 9.5;
        assert!(hevce_check_best_mode(slot, &mut rc));
        assert_eq!(slot.best_cu().total_cost(), 9.5);
        assert_eq!(slot.temp_cu().total_cost(), 10.0);
        assert_eq!(rc.next_best, 7);
    }

    #[test]
    fn background_descendant_blocks_this_depth() {
        let mut sps = HevcSps::new(64, 64, 64, 4);
        sps.add_cu_depth = 1;
        let slice = HevcSlice::new(&sps, SliceType::P_SLICE, 30, 10.0);
        let mut pic = HevcPic::new(&sps);
        let mut mask = HevcMask::new(64, 64);
        mask.set_foreground(0, 0, 64, 64);
        pic.mask = Some(Box::new(mask.clone()));
        assert!(hevce_check_this_depth(&pic, &sps, &slice, 0, 0, 0, 0));

        for j in 48..64 {
            for v in &mut mask.data[j * 64 + 48..j * 64 + 64] {
                *v = 0;
            }
        }
        pic.mask = Some(Box::new(mask));
        /* the 16x16 at (48, 48) is background */
        assert!(!hevce_check_this_depth(&pic, &sps, &slice, 0, 0, 0, 0));
        assert!(hevce_check_this_depth(&pic, &sps, &slice, 0, 0, 0, 1));
        assert!(!hevce_check_this_depth(&pic, &sps, &slice, 192, 32, 32, 1));
    }
}
