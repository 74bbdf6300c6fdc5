use super::check::HevceRdCost;
use super::eco::*;
use crate::api::*;
use crate::com::*;

use log::*;

/* inclusive QP trial range of one depth */
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct HevceQpRange {
    pub(crate) min: i32,
    pub(crate) max: i32,
    /* the trial at min is the lossless one, searched with lowest */
    pub(crate) add_lowest: bool,
    pub(crate) lowest: i32,
}

impl HevceQpRange {
    pub(crate) fn single(qp: i32) -> Self {
        HevceQpRange {
            min: qp,
            max: qp,
            add_lowest: false,
            lowest: qp,
        }
    }

    /* (qp, lossless) of every trial, in search order */
    pub(crate) fn trials(&self) -> impl Iterator<Item = (i32, bool)> {
        let r = *self;
        (r.min..=r.max).map(move |qp| {
            if r.add_lowest && qp == r.min {
                (r.lowest, true)
            } else {
                (qp, false)
            }
        })
    }

    fn clip(sps: &HevcSps, base: i32, max_delta_qp: i32) -> Self {
        let bd = -sps.qp_bd_offset_y();
        HevceQpRange {
            min: HEVC_CLIP3(bd, MAX_QP, base - max_delta_qp),
            max: HEVC_CLIP3(bd, MAX_QP, base + max_delta_qp),
            add_lowest: false,
            lowest: 0,
        }
    }

    fn check(self) -> Result<Self, HevcError> {
        if self.min > self.max {
            error!("empty QP range [{}, {}]", self.min, self.max);
            return Err(HevcError::InvalidQpRange {
                min: self.min,
                max: self.max,
            });
        }
        Ok(self)
    }
}

/* slice QP moved by the activity of the adaptation unit covering (x, y) */
pub(crate) fn hevce_compute_qp(
    sps: &HevcSps,
    cfg: &EncoderConfig,
    aq: Option<&dyn AdaptiveQpLayer>,
    slice_qp: i32,
    x: u32,
    y: u32,
    depth: u8,
) -> i32 {
    let mut offset = 0;
    if let (true, Some(aq)) = (cfg.use_adaptive_qp, aq) {
        let aq_depth = depth.min(cfg.max_aq_depth.saturating_sub(1));
        let (uw, uh) = aq.unit_size(aq_depth);
        let idx = (y / uh) as usize * aq.num_units_in_width(aq_depth) + (x / uw) as usize;
        let scale = 2f64.powf(cfg.qp_adaptation_range as f64 / 6.0);
        let avg = aq.avg_activity(aq_depth);
        let act = aq.activity(aq_depth, idx);
        let norm = (scale * act + avg) / (act + scale * avg);
        offset = (6.0 * norm.log2() + 0.49999).floor() as i32;
    }
    HEVC_CLIP3(-sps.qp_bd_offset_y(), MAX_QP, slice_qp + offset)
}

/* QPs the modes of one depth are searched with; inherited is the QP the CU was
initialised with when the CU is smaller than a quantisation group */
pub(crate) fn hevce_depth_qp_range(
    sps: &HevcSps,
    pps: &HevcPps,
    cfg: &EncoderConfig,
    rc_qp: Option<i32>,
    base: i32,
    depth: u8,
    inherited: i32,
) -> Result<HevceQpRange, HevcError> {
    let mut r = if (sps.max_cu_width >> depth) >= pps.min_cu_dqp_size(sps) {
        HevceQpRange::clip(sps, base, cfg.max_delta_qp)
    } else {
        HevceQpRange::single(inherited)
    };

    if pps.transquant_bypass_enable {
        r.lowest = r.min;
        r.add_lowest = true;
        r.min -= 1;
        if cfg.cu_transquant_bypass_flag_force_value {
            r.max = r.min;
        }
    }

    if let Some(qp) = rc_qp {
        r.min = qp;
        r.max = qp;
    }
    r.check()
}

/* QPs the split alternative is tried with */
pub(crate) fn hevce_split_qp_range(
    sps: &HevcSps,
    pps: &HevcPps,
    cfg: &EncoderConfig,
    rc_qp: Option<i32>,
    base: i32,
    depth: u8,
    start_qp: i32,
) -> Result<HevceQpRange, HevcError> {
    let w = sps.max_cu_width >> depth;
    let dqp_size = pps.min_cu_dqp_size(sps);
    let mut r = if w == dqp_size {
        HevceQpRange::clip(sps, base, cfg.max_delta_qp)
    } else if w > dqp_size {
        HevceQpRange::single(base)
    } else {
        HevceQpRange::single(start_qp)
    };
    if let Some(qp) = rc_qp {
        r = HevceQpRange::single(qp);
    }
    r.check()
}

/* delta QP signalling of a candidate heading its own quantisation group */
pub(crate) fn hevce_check_dqp<E: EntropyCoder>(
    sx: &HevceSyntaxCtx,
    e: &mut E,
    cu: &mut HevcCUData,
    depth: u8,
    rd: &HevceRdCost,
) {
    if !sx.pps.use_dqp || (sx.sps.max_cu_width >> depth) < sx.pps.min_cu_dqp_size(sx.sps) {
        return;
    }
    if cu.qt_root_cbf(0) {
        e.reset_bits();
        hevce_eco_delta_qp(sx, e, cu, 0);
        cu.total_bits += e.num_written_bits();
        cu.total_bins += e.num_bins_coded();
        cu.total_cost = rd.calc(cu.total_bits, cu.total_distortion);
    } else {
        let ref_qp = cu.get_ref_qp(0, sx.ctus, sx.pps, sx.slice);
        cu.set_qp_sub_parts(ref_qp as i32, 0, depth);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::com::cu::*;
    use crate::enc::fake::*;
    use pretty_assertions::assert_eq;

    struct FlatAq {
        acts: Vec<f64>,
    }

    impl AdaptiveQpLayer for FlatAq {
        fn unit_size(&self, _aq_depth: u8) -> (u32, u32) {
            (64, 64)
        }
        fn num_units_in_width(&self, _aq_depth: u8) -> usize {
            2
        }
        fn activity(&self, _aq_depth: u8, unit_idx: usize) -> f64 {
            self.acts[unit_idx]
        }
        fn avg_activity(&self, _aq_depth: u8) -> f64 {
            self.acts.iter().sum::<f64>() / self.acts.len() as f64
        }
    }

    fn dqp_pps(depth: u8) -> HevcPps {
        HevcPps {
            use_dqp: true,
            max_cu_dqp_depth: depth,
            ..Default::default()
        }
    }

    #[test]
    fn activity_moves_qp() {
        let sps = HevcSps::new(128, 64, 64, 4);
        let mut cfg = EncoderConfig::new();
        let aq = FlatAq {
            acts: vec![10.0, 1000.0],
        };
        assert_eq!(hevce_compute_qp(&sps, &cfg, Some(&aq), 30, 64, 0, 0), 30);

        cfg.use_adaptive_qp = true;
        let flat = hevce_compute_qp(&sps, &cfg, Some(&aq), 30, 0, 0, 0);
        let busy = hevce_compute_qp(&sps, &cfg, Some(&aq), 30, 64, 0, 2);
        assert!(flat < 30);
        assert!(busy > 30);
        assert!(busy - 30 <= cfg.qp_adaptation_range);
        assert_eq!(hevce_compute_qp(&sps, &cfg, Some(&aq), 50, 64, 0, 0), 51);
    }

    #[test]
    fn range_collapses_below_quantisation_group() {
        let sps = HevcSps::new(64, 64, 64, 4);
        let pps = dqp_pps(1);
        let mut cfg = EncoderConfig::new();
        cfg.max_delta_qp = 2;
        let r = hevce_depth_qp_range(&sps, &pps, &cfg, None, 30, 1, 27).unwrap();
        assert_eq!(r.trials().collect::<Vec<_>>(), vec![(28, false), (29, false), (30, false), (31, false), (32, false)]);
        let r = hevce_depth_qp_range(&sps, &pps, &cfg, None, 30, 2, 27).unwrap();
        assert_eq!(r.trials().collect::<Vec<_>>(), vec![(27, false)]);
        let r = hevce_depth_qp_range(&sps, &pps, &cfg, Some(40), 30, 1, 27).unwrap();
        assert_eq!((r.min, r.max), (40, 40));
    }

    #[test]
    fn lossless_trial_comes_first() {
        let sps = HevcSps::new(64, 64, 64, 4);
        let mut pps = dqp_pps(0);
        pps.transquant_bypass_enable = true;
        let mut cfg = EncoderConfig::new();
        cfg.max_delta_qp = 1;
        let r = hevce_depth_qp_range(&sps, &pps, &cfg, None, 30, 0, 30).unwrap();
        assert_eq!(
            r.trials().collect::<Vec<_>>(),
            vec![(29, true), (29, false), (30, false), (31, false)]
        );
        cfg.cu_transquant_bypass_flag_force_value = true;
        let r = hevce_depth_qp_range(&sps, &pps, &cfg, None, 30, 0, 30).unwrap();
        assert_eq!(r.trials().collect::<Vec<_>>(), vec![(29, true)]);
    }

    #[test]
    fn split_range_by_depth() {
        let sps = HevcSps::new(64, 64, 64, 4);
        let pps = dqp_pps(1);
        let mut cfg = EncoderConfig::new();
        cfg.max_delta_qp = 1;
        let r = hevce_split_qp_range(&sps, &pps, &cfg, None, 30, 0, 20).unwrap();
        assert_eq!((r.min, r.max), (30, 30));
        let r = hevce_split_qp_range(&sps, &pps, &cfg, None, 30, 1, 20).unwrap();
        assert_eq!((r.min, r.max), (29, 31));
        let r = hevce_split_qp_range(&sps, &pps, &cfg, None, 30, 2, 20).unwrap();
        assert_eq!((r.min, r.max), (20, 20));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let r = HevceQpRange {
            min: 3,
            max: 2,
            add_lowest: false,
            lowest: 3,
        };
        assert_eq!(r.check(), Err(HevcError::InvalidQpRange { min: 3, max: 2 }));
    }

    #[test]
    fn residual_free_candidate_takes_reference_qp() {
        let sps = HevcSps::new(64, 64, 64, 4);
        let pps = dqp_pps(0);
        let slice = HevcSlice::new(&sps, SliceType::P_SLICE, 30, 10.0);
        let geom = HevcCuGeom::new(&sps);
        let pic = HevcCUData::new(geom, 0);
        let mut cu = HevcCUData::new(geom, 0);
        cu.init_cu(&pic, &slice, 0);
        cu.init_est_data(0, 33, false);
        let ctus = vec![pic];
        let sx = HevceSyntaxCtx {
            sps: &sps,
            pps: &pps,
            slice: &slice,
            ctus: &ctus,
            bg_skip: false,
        };
        let rd = HevceRdCost::new(10.0, CostMode::COST_STANDARD_LOSSY);
        let mut e = HevceFakeCoder::default();

        hevce_check_dqp(&sx, &mut e, &mut cu, 0, &rd);
        assert_eq!(cu.qp(0), 30);
        assert!(e.dqp.is_empty());

        cu.set_qp_sub_parts(33, 0, 0);
        cu.set_cbf_sub_parts(1, Y_C, 0, 0);
        cu.set_total_distortion(5);
        hevce_check_dqp(&sx, &mut e, &mut cu, 0, &rd);
        assert_eq!(e.dqp, vec![3]);
        assert_eq!(cu.total_bits(), 4);
        assert_eq!(cu.total_cost(), 5.0 + 4.0 * 10.0);
    }
}
