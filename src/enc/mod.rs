pub(crate) mod aq;
pub(crate) mod bsw;
pub(crate) mod check;
pub(crate) mod dqp;
pub(crate) mod eco;
pub(crate) mod mode;
pub(crate) mod pool;
pub(crate) mod sbac;
pub(crate) mod util;

#[cfg(test)]
pub(crate) mod fake;

use super::api::*;
use super::com::cu::*;
use super::com::tbl::*;
use super::com::tracer::*;
use super::com::*;

use check::*;
use eco::*;
use mode::*;
use pool::*;
use util::*;

pub use util::HevceArlStats;

use log::*;

/*****************************************************************************
 * CU search engine
 *****************************************************************************/

/// Recursive quadtree RD search of one picture's CTUs and the walk writing
/// the decisions out.
///
/// The engine owns one working-buffer pool sized for the deepest CU, so a
/// single instance compresses CTUs strictly one after the other.
pub struct HevceCu<P, R, E> {
    /* sequnce parameter set */
    sps: HevcSps,
    /* picture parameter set */
    pps: HevcPps,
    /* encoder only decisions */
    cfg: EncoderConfig,
    /* coding tools of this instance */
    tools: ToolProfile,

    /* best/temp working sets per depth */
    pool: HevceBufPool,

    /* prediction searches */
    search: P,
    /* transform, quantisation and reconstruction */
    resid: R,
    /* bit estimator used by the RD decisions */
    sbac: E,

    /* QP oracle of the external rate control */
    rc: Option<Box<dyn RateControl>>,
    /* activity statistics of the adaptive QP */
    aq: Option<Box<dyn AdaptiveQpLayer>>,

    /* coefficient statistics of adaptive reconstruction levels */
    arl: HevceArlStats,
    /* RD cost of the slice being compressed */
    rd: HevceRdCost,
    /* block vector hint carried from one CTU to the next */
    last_ibc_mv: HevcMv,

    /* debug tracer */
    tracer: Option<Tracer>,
}

impl<P: PredSearch, R: ResidualCoder, E: EntropyCoder> HevceCu<P, R, E> {
    pub fn new(
        sps: &HevcSps,
        pps: &HevcPps,
        cfg: &EncoderConfig,
        tools: &ToolProfile,
        search: P,
        residual: R,
        entropy: E,
    ) -> Result<Self, HevcError> {
        if let Err(err) = sps.validate().and_then(|_| cfg.validate()) {
            error!("cannot create CU engine: {}", err);
            return Err(err);
        }
        if pps.max_cu_dqp_depth > sps.max_cu_depth() {
            error!(
                "dQP depth {} below the smallest CU (depth {})",
                pps.max_cu_dqp_depth,
                sps.max_cu_depth()
            );
            return Err(HevcError::InvalidArgument("max_cu_dqp_depth"));
        }

        Ok(HevceCu {
            sps: sps.clone(),
            pps: pps.clone(),
            cfg: *cfg,
            tools: *tools,
            pool: HevceBufPool::new(sps),
            search,
            resid: residual,
            sbac: entropy,
            rc: None,
            aq: None,
            arl: HevceArlStats::default(),
            rd: HevceRdCost::default(),
            last_ibc_mv: HevcMv::default(),
            tracer: OPEN_TRACE(),
        })
    }

    pub fn set_rate_control(&mut self, rc: Option<Box<dyn RateControl>>) {
        self.rc = rc;
    }

    pub fn set_aq_layer(&mut self, aq: Option<Box<dyn AdaptiveQpLayer>>) {
        self.aq = aq;
    }

    /// Coefficient statistics gathered over the CTUs compressed so far.
    pub fn arl_stats(&self) -> &HevceArlStats {
        &self.arl
    }

    pub fn reset_arl_stats(&mut self) {
        self.arl.reset();
    }

    pub fn search(&self) -> &P {
        &self.search
    }

    pub fn entropy(&self) -> &E {
        &self.sbac
    }

    pub fn entropy_mut(&mut self) -> &mut E {
        &mut self.sbac
    }

    fn x_check_ctu_addr(pic: &HevcPic, ctu_addr: usize) -> Result<(), HevcError> {
        if ctu_addr >= pic.ctus.len() {
            error!("CTU {} outside a picture of {} CTUs", ctu_addr, pic.ctus.len());
            return Err(HevcError::OutOfRange("ctu_addr"));
        }
        Ok(())
    }

    fn x_check_preconditions(
        &self,
        pic: &HevcPic,
        slice: &HevcSlice,
        ctu_addr: usize,
    ) -> Result<(), HevcError> {
        Self::x_check_ctu_addr(pic, ctu_addr)?;
        if pic.width() != self.sps.pic_width as usize
            || pic.height() != self.sps.pic_height as usize
        {
            error!(
                "picture {}x{} does not match the sequence {}x{}",
                pic.width(),
                pic.height(),
                self.sps.pic_width,
                self.sps.pic_height
            );
            return Err(HevcError::InvalidArgument("picture size"));
        }
        if !(slice.lambda > 0.0) {
            error!("lambda {} is not positive", slice.lambda);
            return Err(HevcError::InvalidArgument("lambda"));
        }
        if self.cfg.use_rate_ctrl && self.rc.is_none() {
            error!("rate control enabled without a rate controller");
            return Err(HevcError::InvalidArgument("rate control"));
        }
        if self.cfg.use_adaptive_qp && self.aq.is_none() {
            error!("adaptive QP enabled without activity layers");
            return Err(HevcError::InvalidArgument("adaptive QP layer"));
        }
        Ok(())
    }

    /// Search the best coding of CTU `ctu_addr` and commit it into `pic`:
    /// decisions into `pic.ctus`, reconstruction into `pic.rec`.
    pub fn compress_cu(
        &mut self,
        pic: &mut HevcPic,
        slice: &HevcSlice,
        ctu_addr: usize,
    ) -> Result<(), HevcError> {
        self.x_check_preconditions(pic, slice, ctu_addr)?;
        self.rd = HevceRdCost::new(slice.lambda, self.cfg.cost_mode);

        {
            let (best, temp) = self.pool.at_mut(0).cus_mut();
            best.init_cu(&pic.ctus[ctu_addr], slice, ctu_addr);
            temp.init_cu(&pic.ctus[ctu_addr], slice, ctu_addr);
            /* slice segment layout of the CTU is looked up in the picture */
            best.copy_to_pic(0, &mut pic.ctus[ctu_addr]);
        }

        let n_ctu = self.sps.num_part_in_ctu();
        if ctu_addr * n_ctu <= slice.slice_segment_cur_start_cu_addr as usize {
            self.last_ibc_mv = HevcMv::default();
        }

        if slice.is_intra() && self.cfg.use_rate_ctrl && self.tools.i_slice_lcu_cost {
            let (x, y) = {
                let ctu = &pic.ctus[ctu_addr];
                (ctu.cu_pel_x(), ctu.cu_pel_y())
            };
            let w = self.sps.max_cu_width.min(self.sps.pic_width - x) as usize;
            let h = self.sps.max_cu_height.min(self.sps.pic_height - y) as usize;
            let orig = &mut self.pool.at_mut(0).orig;
            orig.copy_from_pic_yuv(&pic.org, x as usize, y as usize);
            let cost = hevce_lcu_intra_cost(orig, w, h);
            if let Some(rc) = self.rc.as_mut() {
                rc.set_i_slice_lcu_cost(ctu_addr, cost);
            }
        }

        let out = self.x_compress_cu(
            pic,
            slice,
            0,
            HevceSearchIn {
                curr_best: self.sbac.save_context(),
                last_ibc_mv: self.last_ibc_mv,
                parent_part_size: PartSize::NUMBER_OF_PART_SIZES,
                parent_is_ibc: false,
            },
        )?;
        /* next CTU is estimated from the state after this one as decided */
        self.sbac.load_context(&out.next_best);
        if !out.last_ibc_mv.is_zero() {
            self.last_ibc_mv = out.last_ibc_mv;
        }

        let ctu = &pic.ctus[ctu_addr];
        if self.tools.adaptive_qp_selection && !slice.is_intra() {
            self.arl.collect_lcu(ctu);
        }

        debug!(
            "ctu {} ({}, {}): cost {:.1} bits {} dist {} depth {} {:?} {:?}",
            ctu_addr,
            ctu.cu_pel_x(),
            ctu.cu_pel_y(),
            ctu.total_cost(),
            ctu.total_bits(),
            ctu.total_distortion(),
            ctu.depth(0),
            ctu.pred_mode(0),
            ctu.part_size(0)
        );
        Ok(())
    }

    /// Write the decisions of CTU `ctu_addr` with `coder`.
    ///
    /// Returns where a byte budget of the slice layout ran out; the end
    /// addresses of `slice` are moved accordingly.
    pub fn encode_cu<W: EntropyCoder>(
        &mut self,
        coder: &mut W,
        pic: &HevcPic,
        slice: &mut HevcSlice,
        ctu_addr: usize,
    ) -> Result<HevcSegmentEnd, HevcError> {
        Self::x_check_ctu_addr(pic, ctu_addr)?;

        let mut code_dqp = self.pps.use_dqp;
        let mut end = HevcSegmentEnd::None;
        self.x_encode_cu(coder, pic, slice, ctu_addr, 0, 0, &mut code_dqp, &mut end);

        if end != HevcSegmentEnd::None {
            warn!(
                "ctu {}: byte budget exhausted, {:?} ends at {}",
                ctu_addr, end, slice.slice_segment_cur_end_cu_addr
            );
        }
        Ok(end)
    }

    fn x_encode_cu<W: EntropyCoder>(
        &self,
        coder: &mut W,
        pic: &HevcPic,
        slice: &mut HevcSlice,
        ctu_addr: usize,
        abs_idx: usize,
        depth: u8,
        code_dqp: &mut bool,
        end: &mut HevcSegmentEnd,
    ) {
        let ctu = &pic.ctus[ctu_addr];
        let g = *ctu.geom();
        let (pic_w, pic_h) = (self.sps.pic_width, self.sps.pic_height);
        let width = self.sps.max_cu_width >> depth;
        let num_part = g.num_part_in_ctu >> (2 * depth as usize);

        let (ox, oy) = zscan_to_pel(g.max_total_depth, g.unit_size, abs_idx);
        let (lpel, tpel) = (ctu.cu_pel_x() + ox, ctu.cu_pel_y() + oy);
        let scu = ctu.scu_addr() + abs_idx;

        let seg_start = slice.slice_segment_cur_start_cu_addr as usize;
        let slice_start = seg_start > scu && seg_start < scu + num_part;
        let boundary = slice_start || lpel + width > pic_w || tpel + width > pic_h;

        let sx = HevceSyntaxCtx {
            sps: &self.sps,
            pps: &self.pps,
            slice: &*slice,
            ctus: &pic.ctus,
            bg_skip: self.tools.bg_skip,
        };
        if !boundary {
            hevce_eco_split_flag(&sx, coder, ctu, abs_idx, depth);
        }

        let min_dqp = self.pps.min_cu_dqp_size(&self.sps);
        if (depth < ctu.depth(abs_idx) && depth < self.sps.max_cu_depth()) || boundary {
            if width == min_dqp && self.pps.use_dqp {
                *code_dqp = true;
            }
            let q = num_part >> 2;
            for part in 0..4 {
                let sub = abs_idx + part * q;
                let (px, py) = zscan_to_pel(g.max_total_depth, g.unit_size, sub);
                let (lx, ty) = (ctu.cu_pel_x() + px, ctu.cu_pel_y() + py);
                let sub_scu = scu + part * q;
                let in_slice = sub_scu + q > slice.slice_segment_cur_start_cu_addr as usize
                    && sub_scu < slice.slice_segment_cur_end_cu_addr as usize;
                if in_slice && lx < pic_w && ty < pic_h {
                    self.x_encode_cu(coder, pic, slice, ctu_addr, sub, depth + 1, code_dqp, end);
                }
            }
            return;
        }

        if self.tools.bg_skip {
            hevce_eco_bg_skip_flag(&sx, coder, ctu, abs_idx);
            if ctu.is_bg_skipped(abs_idx) {
                hevce_eco_coeff(&sx, coder, ctu, abs_idx, code_dqp);
                let e = self.finish_cu(coder, pic, slice, ctu_addr, abs_idx, depth);
                Self::x_merge_end(end, e);
                return;
            }
        }

        if width >= min_dqp && self.pps.use_dqp {
            *code_dqp = true;
        }
        hevce_eco_cu_body(&sx, coder, ctu, abs_idx, depth, code_dqp);

        let e = self.finish_cu(coder, pic, slice, ctu_addr, abs_idx, depth);
        Self::x_merge_end(end, e);
    }

    #[inline]
    fn x_merge_end(end: &mut HevcSegmentEnd, e: HevcSegmentEnd) {
        use HevcSegmentEnd::*;
        *end = match (*end, e) {
            (Slice, _) | (_, Slice) => Slice,
            (None, e) => e,
            (e, None) => e,
            _ => SliceSegment,
        };
    }

    /* end of segment address in encoding order, past its last partition inside the picture */
    fn x_real_end_addr(&self, slice: &HevcSlice, g: &HevcCuGeom) -> usize {
        let n = g.num_part_in_ctu;
        let last = (slice.slice_segment_cur_end_cu_addr as usize).saturating_sub(1);
        let ext = last / n;
        let mut int = last % n;
        let (cx, cy) = (
            (ext % g.frame_width_in_ctu) as u32 * g.max_cu_width,
            (ext / g.frame_width_in_ctu) as u32 * g.max_cu_height,
        );
        while int > 0 {
            let (x, y) = zscan_to_pel(g.max_total_depth, g.unit_size, int);
            if cx + x < g.pic_width && cy + y < g.pic_height {
                break;
            }
            int -= 1;
        }
        ext * n + int + 1
    }

    /* terminating bit and byte budget bookkeeping after a leaf CU */
    fn finish_cu<W: EntropyCoder>(
        &self,
        coder: &mut W,
        pic: &HevcPic,
        slice: &mut HevcSlice,
        ctu_addr: usize,
        abs_idx: usize,
        depth: u8,
    ) -> HevcSegmentEnd {
        let ctu = &pic.ctus[ctu_addr];
        let g = *ctu.geom();
        let n = g.num_part_in_ctu;
        let cu_addr = ctu.scu_addr() + abs_idx;

        let real_end = self.x_real_end_addr(slice, &g);
        let terminate = cu_addr + (n >> (2 * depth as usize)) == real_end;

        let (ox, oy) = zscan_to_pel(g.max_total_depth, g.unit_size, abs_idx);
        let right = ctu.cu_pel_x() + ox + ctu.width(abs_idx);
        let bottom = ctu.cu_pel_y() + oy + ctu.height(abs_idx);
        let granularity = (right % g.max_cu_width == 0 || right == g.pic_width)
            && (bottom % g.max_cu_height == 0 || bottom == g.pic_height);

        /* the closing 1 is written by whoever finishes the slice */
        if granularity && !terminate {
            coder.encode_terminating_bit(false);
        }

        let written = coder.num_written_bits();
        let mut granularity_end = (cu_addr / n) * n;
        if granularity_end <= slice.slice_segment_cur_start_cu_addr as usize {
            granularity_end += n;
        }

        let over = |mode: SliceConstraint, arg: u32, bits: u32| {
            mode == SliceConstraint::FIXED_NUMBER_OF_BYTES && bits + written > arg << 3
        };
        if !slice.final_slice
            && over(self.cfg.slice_mode, self.cfg.slice_argument, slice.slice_bits)
        {
            slice.slice_segment_cur_end_cu_addr = granularity_end as u32;
            slice.slice_cur_end_cu_addr = granularity_end as u32;
            return HevcSegmentEnd::Slice;
        }
        if !slice.final_slice_segment
            && over(
                self.cfg.slice_segment_mode,
                self.cfg.slice_segment_argument,
                slice.slice_segment_bits,
            )
        {
            slice.slice_segment_cur_end_cu_addr = granularity_end as u32;
            return HevcSegmentEnd::SliceSegment;
        }

        if granularity {
            slice.slice_bits += written;
            slice.slice_segment_bits += written;
            coder.reset_bits();
        }
        HevcSegmentEnd::None
    }
}
