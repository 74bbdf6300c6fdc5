use super::check::*;
use super::dqp::*;
use super::eco::*;
use super::util::*;
use super::HevceCu;
use crate::api::*;
use crate::com::cu::*;
use crate::com::tracer::*;
use crate::com::*;

use log::*;

/* what a depth receives from its parent */
pub(crate) struct HevceSearchIn<C> {
    /* entropy state the CU is coded from */
    pub(crate) curr_best: C,
    /* most recent non-zero block vector in coding order */
    pub(crate) last_ibc_mv: HevcMv,
    /* parent's best shape when it is inter, NUMBER_OF_PART_SIZES otherwise */
    pub(crate) parent_part_size: PartSize,
    pub(crate) parent_is_ibc: bool,
}

/* what a depth hands back to its parent */
pub(crate) struct HevceSearchOut<C> {
    /* entropy state after the CU as decided */
    pub(crate) next_best: C,
    pub(crate) last_ibc_mv: HevcMv,
}

/* lossless CUs carry their source samples */
fn hevce_fill_pcm_buffer(cu: &mut HevcCUData, org: &HevcYuv) {
    let w = cu.width(0) as usize;
    for comp in 0..org.num_comps() {
        let (cx, cy) = if comp == Y_C {
            (0, 0)
        } else {
            org.chroma().shift()
        };
        let (cw, ch) = (w >> cx, w >> cy);
        let stride = org.width(comp);
        let off = cu.coeff_offset(0, comp);
        for y in 0..ch {
            let src = &org.plane(comp)[y * stride..y * stride + cw];
            cu.pcm_sample_mut(comp)[off + y * cw..off + (y + 1) * cw].copy_from_slice(src);
        }
    }
}

impl<P: PredSearch, R: ResidualCoder, E: EntropyCoder> HevceCu<P, R, E> {
    #[inline]
    fn x_init_temp(&mut self, depth: u8, qp: i32, lossless: bool) {
        self.pool
            .at_mut(depth)
            .temp_cu_mut()
            .init_est_data(depth, qp, lossless);
    }

    #[inline]
    fn x_best_root_cbf(&self, depth: u8) -> bool {
        self.pool.at(depth).best_cu().qt_root_cbf(0)
    }

    /* one inter shape behind the cbf-fast gate; update re-arms the gate from the result */
    fn x_check_inter_shape(
        &mut self,
        pic: &HevcPic,
        slice: &HevcSlice,
        depth: u8,
        part_size: PartSize,
        use_mrg: bool,
        trial: (i32, bool),
        rc: &mut HevceRdCtx<E::Context>,
        do_not_block_pu: &mut bool,
        update: bool,
    ) {
        if !*do_not_block_pu {
            return;
        }
        self.x_check_rd_cost_inter(pic, slice, depth, part_size, use_mrg, rc);
        self.x_init_temp(depth, trial.0, trial.1);
        if update
            && self.cfg.use_cbf_fast_mode
            && self.pool.at(depth).best_cu().part_size(0) == part_size
        {
            *do_not_block_pu = self.x_best_root_cbf(depth);
        }
    }

    pub(crate) fn x_rc_qp(&self, ctu_addr: usize) -> Option<i32> {
        if !self.cfg.use_rate_ctrl {
            return None;
        }
        self.rc.as_ref().map(|rc| rc.rc_qp(ctu_addr))
    }

    /* best coding of the CU held by the depth buffers, committed into pic */
    pub(crate) fn x_compress_cu(
        &mut self,
        pic: &mut HevcPic,
        slice: &HevcSlice,
        depth: u8,
        inp: HevceSearchIn<E::Context>,
    ) -> Result<HevceSearchOut<E::Context>, HevcError> {
        use PartSize::*;

        let rd = self.rd;
        let max_depth = self.sps.max_cu_depth();
        let (pic_w, pic_h) = (self.sps.pic_width, self.sps.pic_height);
        let n_ctu = self.sps.num_part_in_ctu();
        let num_comps = self.sps.chroma_format.num_comps();

        let (lpel, tpel, width, scu, num_part, zorder, cu_addr, inherited_qp) = {
            let temp = self.pool.at(depth).temp_cu();
            (
                temp.cu_pel_x(),
                temp.cu_pel_y(),
                temp.width(0),
                temp.scu_addr(),
                temp.total_num_part(),
                temp.zorder_idx_in_cu(),
                temp.cu_addr(),
                temp.qp(0) as i32,
            )
        };
        {
            let bg_skip = self.tools.bg_skip;
            let slot = self.pool.at_mut(depth);
            let (best, temp) = slot.cus_mut();
            best.set_last_intra_bc_mv(inp.last_ibc_mv);
            temp.set_last_intra_bc_mv(inp.last_ibc_mv);
            slot.orig
                .copy_from_pic_yuv(&pic.org, lpel as usize, tpel as usize);
            if bg_skip {
                let src = pic.bkg.as_ref().unwrap_or(&pic.org);
                slot.bkg.copy_from_pic_yuv(src, lpel as usize, tpel as usize);
            }
        }

        let base_qp = hevce_compute_qp(
            &self.sps,
            &self.cfg,
            self.aq.as_deref(),
            slice.slice_qp,
            lpel,
            tpel,
            depth,
        );
        let rc_qp = self.x_rc_qp(cu_addr);

        let seg_start = slice.slice_segment_cur_start_cu_addr as usize;
        let seg_end = slice.slice_segment_cur_end_cu_addr as usize;
        let slice_start = seg_start > scu && seg_start < scu + num_part;
        let slice_end = seg_end > scu && seg_end < scu + num_part;
        let inside = lpel + width - 1 < pic_w && tpel + width - 1 < pic_h;

        let mut rc = HevceRdCtx::new(inp.curr_best);
        let mut last_ibc_mv = inp.last_ibc_mv;
        let mut test_this = true;
        let mut test_higher = true;
        let mut sub_branch = true;
        let mut boundary = false;

        if !slice_end && !slice_start && inside {
            let range = hevce_depth_qp_range(
                &self.sps,
                &self.pps,
                &self.cfg,
                rc_qp,
                base_qp,
                depth,
                inherited_qp,
            )?;
            let is_intra_slice = slice.is_intra();
            let esd = self.cfg.use_early_skip_detection;
            let mut do_not_block_pu = true;
            let mut early_skip = false;

            for trial in range.trials() {
                self.x_init_temp(depth, trial.0, trial.1);
                if self.tools.bg_skip {
                    let (this, higher) = self.x_check_bg_skip(pic, slice, depth, &mut rc);
                    test_this = this;
                    test_higher = higher;
                }
                if is_intra_slice || !test_this {
                    continue;
                }
                if esd {
                    self.x_check_rd_cost_inter(pic, slice, depth, SIZE_2Nx2N, false, &mut rc);
                    self.x_init_temp(depth, trial.0, trial.1);
                }
                self.x_check_rd_cost_merge_2nx2n(pic, slice, depth, &mut rc, &mut early_skip);
                self.x_init_temp(depth, trial.0, trial.1);
                if !esd {
                    self.x_check_rd_cost_inter(pic, slice, depth, SIZE_2Nx2N, false, &mut rc);
                    self.x_init_temp(depth, trial.0, trial.1);
                    if self.cfg.use_cbf_fast_mode {
                        do_not_block_pu = self.x_best_root_cbf(depth);
                    }
                }
            }

            if !early_skip {
                for trial in range.trials() {
                    self.x_init_temp(depth, trial.0, trial.1);
                    let dnb = &mut do_not_block_pu;

                    if !is_intra_slice && test_this {
                        if width != 8 && depth == max_depth {
                            self.x_check_inter_shape(
                                pic, slice, depth, SIZE_NxN, false, trial, &mut rc, dnb, false,
                            );
                        }
                        self.x_check_inter_shape(
                            pic, slice, depth, SIZE_Nx2N, false, trial, &mut rc, dnb, true,
                        );
                        self.x_check_inter_shape(
                            pic, slice, depth, SIZE_2NxN, false, trial, &mut rc, dnb, true,
                        );

                        if self.sps.amp_acc(depth) {
                            let amp = hevce_derive_test_mode_amp(
                                &self.tools,
                                self.pool.at(depth).best_cu(),
                                inp.parent_part_size,
                            );
                            if amp.hor || amp.mrg_hor {
                                let mrg = !amp.hor;
                                self.x_check_inter_shape(
                                    pic, slice, depth, SIZE_2NxnU, mrg, trial, &mut rc, dnb, true,
                                );
                                self.x_check_inter_shape(
                                    pic, slice, depth, SIZE_2NxnD, mrg, trial, &mut rc, dnb, true,
                                );
                            }
                            if amp.ver || amp.mrg_ver {
                                let mrg = !amp.ver;
                                self.x_check_inter_shape(
                                    pic, slice, depth, SIZE_nLx2N, mrg, trial, &mut rc, dnb, true,
                                );
                                self.x_check_inter_shape(
                                    pic, slice, depth, SIZE_nRx2N, mrg, trial, &mut rc, dnb, false,
                                );
                            }
                        }
                    }

                    let mut intra_cost = 0.0;
                    let try_intra = {
                        let best = self.pool.at(depth).best_cu();
                        is_intra_slice || (0..num_comps).any(|c| best.cbf(0, c) != 0)
                    };
                    if test_this && try_intra {
                        intra_cost =
                            self.x_check_rd_cost_intra(pic, slice, depth, SIZE_2Nx2N, &mut rc);
                        self.x_init_temp(depth, trial.0, trial.1);
                        if depth == max_depth && width > (1 << self.sps.quadtree_tu_log2_min_size)
                        {
                            let nxn =
                                self.x_check_rd_cost_intra(pic, slice, depth, SIZE_NxN, &mut rc);
                            self.x_init_temp(depth, trial.0, trial.1);
                            intra_cost = f64::min(intra_cost, nxn);
                        }
                    }

                    let sps = &self.sps;
                    if sps.use_pcm
                        && test_this
                        && width <= (1 << sps.pcm_log2_max_size)
                        && width >= (1 << sps.pcm_log2_min_size)
                    {
                        let raw = sps.pcm_raw_bits(width, width);
                        let best = self.pool.at(depth).best_cu();
                        if best.total_bits() > raw || best.total_cost() > rd.calc(raw, 0) {
                            self.x_check_intra_pcm(pic, slice, depth, &mut rc);
                            self.x_init_temp(depth, trial.0, trial.1);
                        }
                    }

                    if self.sps.use_intra_bc {
                        let skip_ibc = self.tools.intra_bc_fast_search
                            && (width > 16 || intra_cost < f64::max(32.0 * rd.lambda, 48.0));
                        let mut use_1d = false;
                        if !skip_ibc
                            && self.tools.intra_bc_1d_search
                            && width == 8
                            && !inp.parent_is_ibc
                        {
                            let th = INTRABC_FAST_ACT_TH << (self.sps.bit_depth_luma - 8);
                            use_1d = hevce_min_hv_activity(&self.pool.at(depth).orig, 8, 8) < th;
                        }
                        if test_this && !skip_ibc {
                            self.x_check_rd_cost_intra_bc(pic, slice, depth, use_1d, &mut rc);
                            self.x_init_temp(depth, trial.0, trial.1);
                        }
                    }
                }
            }

            let HevceCu {
                sps,
                pps,
                cfg,
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
            let b = slot.best_idx();
            let best = &mut slot.cu[b];
            if best.is_intra_bc(0) {
                let mv = best.mv_field(REF_PIC_LIST_INTRABC).mv(0);
                best.set_last_intra_bc_mv(mv);
            }
            if !best.is_bg_skipped(0) {
                sbac.load_context(&rc.next_best);
                sbac.reset_bits();
                hevce_eco_split_flag(&sx, sbac, best, 0, depth);
                best.total_bits += sbac.num_written_bits();
                best.total_bins += sbac.num_bins_coded();
                best.total_cost = rd.calc(best.total_bits, best.total_distortion);
            }
            sub_branch = !((cfg.use_early_cu && best.is_skipped(0)) || !test_higher);

            if best.is_lossless_coded(0, pps) && !best.ipcm_flag(0) {
                hevce_fill_pcm_buffer(best, &slot.orig);
            }
        } else if !(slice_end && inside) {
            boundary = true;
        }

        /* split alternative */
        let min_dqp = self.pps.min_cu_dqp_size(&self.sps);
        let start_qp = {
            let temp = self.pool.at(depth).temp_cu();
            if pic.ctus[cu_addr].slice_segment_start_cu(zorder) == seg_start as u32 {
                temp.qp(0)
            } else {
                temp.qp((seg_start % n_ctu).saturating_sub(zorder))
            }
        };
        let split_range = hevce_split_qp_range(
            &self.sps,
            &self.pps,
            &self.cfg,
            rc_qp,
            base_qp,
            depth,
            start_qp as i32,
        )?;

        for (qp, _) in split_range.trials() {
            self.x_init_temp(depth, qp, false);
            if !sub_branch || depth >= max_depth {
                continue;
            }

            let next = depth + 1;
            let mut chain = rc.curr_best.clone();
            for part in 0..4 {
                let (cscu, cn, cx, cy) = {
                    let (p, c) = self.pool.pair_mut(depth);
                    let parent = p.temp_cu();
                    let (cb, ct) = c.cus_mut();
                    cb.init_sub_cu(parent, part, next, qp);
                    ct.init_sub_cu(parent, part, next, qp);
                    (cb.scu_addr(), cb.total_num_part(), cb.cu_pel_x(), cb.cu_pel_y())
                };
                let in_slice = cscu + cn > seg_start && cscu < seg_end;

                if in_slice && cx < pic_w && cy < pic_h {
                    let (parent_part_size, parent_is_ibc) = {
                        let b = self.pool.at(depth).best_cu();
                        let ps = if b.is_inter(0) {
                            b.part_size(0)
                        } else {
                            NUMBER_OF_PART_SIZES
                        };
                        (ps, b.is_intra_bc(0))
                    };
                    let out = self.x_compress_cu(
                        pic,
                        slice,
                        next,
                        HevceSearchIn {
                            curr_best: chain,
                            last_ibc_mv,
                            parent_part_size,
                            parent_is_ibc,
                        },
                    )?;
                    chain = out.next_best;
                    if !out.last_ibc_mv.is_zero() {
                        last_ibc_mv = out.last_ibc_mv;
                    }

                    let (p, c) = self.pool.pair_mut(depth);
                    let t = p.temp_idx();
                    p.cu[t].copy_part_from(c.best_cu(), part, next);
                    c.best_reco().copy_to_part_yuv(&mut p.reco[t], part);
                    c.best_pred().copy_to_part_yuv(&mut p.pred[t], part);
                } else if in_slice {
                    let (p, c) = self.pool.pair_mut(depth);
                    let child = c.best_cu_mut();
                    child.set_outside_cu_part(0, next);
                    child.copy_to_pic(next, &mut pic.ctus[cu_addr]);
                    p.temp_cu_mut().copy_part_from(c.best_cu(), part, next);
                }
            }

            let HevceCu {
                sps,
                pps,
                cfg,
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
                let temp = &mut slot.cu[t];
                temp.set_last_intra_bc_mv(last_ibc_mv);
                if !boundary {
                    sbac.load_context(&chain);
                    sbac.reset_bits();
                    hevce_eco_split_flag(&sx, sbac, temp, 0, depth);
                    temp.total_bits += sbac.num_written_bits();
                    temp.total_bins += sbac.num_bins_coded();
                }
                temp.total_cost = rd.calc(temp.total_bits, temp.total_distortion);

                if width == min_dqp && pps.use_dqp {
                    let ctu = &pic.ctus[cu_addr];
                    let seg = seg_start as u32;
                    let has_residual = (0..temp.total_num_part()).any(|blk| {
                        ctu.slice_segment_start_cu(blk + zorder) == seg
                            && (0..num_comps).any(|c| temp.cbf(blk, c) != 0)
                    });
                    let target = if ctu.slice_segment_start_cu(zorder) != seg {
                        (seg_start % n_ctu).saturating_sub(zorder)
                    } else {
                        0
                    };
                    let ref_qp = temp.get_ref_qp(target, &pic.ctus, pps, slice) as i32;
                    if has_residual {
                        sbac.reset_bits();
                        hevce_eco_delta_qp(&sx, sbac, temp, target);
                        temp.total_bits += sbac.num_written_bits();
                        temp.total_bins += sbac.num_bins_coded();
                        temp.total_cost = rd.calc(temp.total_bits, temp.total_distortion);

                        let mut found = false;
                        temp.set_qp_sub_cus(ref_qp, 0, depth, &mut found);
                        if !found {
                            error!("quantisation group at ({}, {}) lost its residual", lpel, tpel);
                        }
                        hevc_assert_rv(found, HevcError::Unexpected("quantisation group residual"))?;
                    } else {
                        temp.set_qp_sub_parts(ref_qp, 0, depth);
                    }
                }
            }
            rc.temp_best = chain;

            let temp_cost = slot.temp_cu().total_cost();
            let best_bits = slot.best_cu().total_bits();
            let over_budget = |mode: SliceConstraint, arg: u32| {
                mode == SliceConstraint::FIXED_NUMBER_OF_BYTES && best_bits > arg << 3
            };
            if over_budget(cfg.slice_mode, cfg.slice_argument)
                || over_budget(cfg.slice_segment_mode, cfg.slice_segment_argument)
            {
                slot.best_cu_mut().total_cost = temp_cost + rd.penalty();
            }
            if !test_this {
                slot.best_cu_mut().total_cost = temp_cost + 1.0;
            }
            if hevce_check_best_mode(slot, &mut rc) {
                trace!("split ({}, {}) d{} cost {:.1}", lpel, tpel, depth, temp_cost);
            }
        }

        {
            let slot = self.pool.at(depth);
            let best = slot.best_cu();
            best.copy_to_pic(depth, &mut pic.ctus[cu_addr]);
            slot.best_reco()
                .copy_to_pic_yuv(&mut pic.rec, lpel as usize, tpel as usize);
            TRACE_CU(&mut self.tracer, best, depth);
        }

        let best = self.pool.at(depth).best_cu();
        let out = HevceSearchOut {
            next_best: rc.next_best,
            last_ibc_mv: best.last_intra_bc_mv(),
        };
        if boundary || (slice_end && inside) {
            return Ok(out);
        }

        if best.part_size(0) == NUMBER_OF_PART_SIZES
            || best.pred_mode(0) == PredMode::NUMBER_OF_PREDICTION_MODES
            || best.total_cost() == MAX_DOUBLE
        {
            error!("no mode decided for CU ({}, {}) at depth {}", lpel, tpel, depth);
            return Err(HevcError::Unexpected("no mode decided"));
        }
        Ok(out)
    }
}
