use crate::api::*;

/* RD cost scalarisation */
#[allow(dead_code, non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostMode {
    COST_STANDARD_LOSSY,
    COST_SEQUENCE_LEVEL_LOSSLESS,
    COST_LOSSLESS_CODING,
    COST_MIXED_LOSSLESS_LOSSY_CODING,
}

impl Default for CostMode {
    fn default() -> Self {
        CostMode::COST_STANDARD_LOSSY
    }
}

// Encoder decisions which only change the search, never the syntax.
#[derive(Clone, Copy, Debug, Default)]
pub struct EncoderConfig {
    // test inter 2Nx2N ahead of merge and stop early on a residual-free result
    pub use_early_skip_detection: bool,
    // skip further PU shapes once the best candidate has no residual
    pub use_cbf_fast_mode: bool,
    // do not split below a skipped CU
    pub use_early_cu: bool,
    // stop zero-residual merge retries once a skip is found
    pub use_fast_decision_for_merge: bool,

    // external rate control supplies the QP of every CTU
    pub use_rate_ctrl: bool,

    // activity driven QP offsets
    pub use_adaptive_qp: bool,
    // QP span the activity offset is mapped onto
    pub qp_adaptation_range: i32,
    // number of adaptive QP layers
    pub max_aq_depth: u8,
    // largest QP distance from the base QP at the dQP depth
    pub max_delta_qp: i32,

    // value of cu_transquant_bypass_flag when it is forced
    pub cu_transquant_bypass_flag_force_value: bool,

    pub slice_mode: SliceConstraint,
    // LCU count or byte budget depending on the mode
    pub slice_argument: u32,
    pub slice_segment_mode: SliceConstraint,
    pub slice_segment_argument: u32,

    pub cost_mode: CostMode,
}

impl EncoderConfig {
    pub fn new() -> Self {
        EncoderConfig {
            use_early_skip_detection: false,
            use_cbf_fast_mode: false,
            use_early_cu: false,
            use_fast_decision_for_merge: true,
            use_rate_ctrl: false,
            use_adaptive_qp: false,
            qp_adaptation_range: 6,
            max_aq_depth: 1,
            max_delta_qp: 0,
            cu_transquant_bypass_flag_force_value: false,
            slice_mode: SliceConstraint::NO_SLICES,
            slice_argument: 0,
            slice_segment_mode: SliceConstraint::NO_SLICES,
            slice_segment_argument: 0,
            cost_mode: CostMode::COST_STANDARD_LOSSY,
        }
    }

    pub fn validate(&self) -> Result<(), HevcError> {
        if self.max_delta_qp < 0 {
            return Err(HevcError::InvalidArgument("max_delta_qp"));
        }
        if self.use_adaptive_qp && (self.max_aq_depth == 0 || self.qp_adaptation_range <= 0) {
            return Err(HevcError::InvalidArgument("adaptive QP layers"));
        }
        if self.slice_mode == SliceConstraint::FIXED_NUMBER_OF_BYTES && self.slice_argument == 0
        {
            return Err(HevcError::InvalidArgument("slice_argument"));
        }
        if self.slice_segment_mode == SliceConstraint::FIXED_NUMBER_OF_BYTES
            && self.slice_segment_argument == 0
        {
            return Err(HevcError::InvalidArgument("slice_segment_argument"));
        }
        Ok(())
    }
}

// Coding tools picked once per encoder instance.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ToolProfile {
    // low-rank/sparse background skip
    pub bg_skip: bool,
    // pick AMP directions from the best shape found so far
    pub amp_enc_speedup: bool,
    // try merge-only AMP shapes when the best is 2Nx2N
    pub amp_mrg: bool,
    // allow merge-only AMP when the parent CU is not inter
    pub amp_mrg_intra_parent: bool,
    // bail out of intra block copy on cheap intra blocks
    pub intra_bc_fast_search: bool,
    // restrict 8x8 intra block copy to a 1-D search on flat content
    pub intra_bc_1d_search: bool,
    // collect coefficient statistics for adaptive reconstruction levels
    pub adaptive_qp_selection: bool,
    // report the 8x8 Hadamard cost of I-slice CTUs to the rate controller
    pub i_slice_lcu_cost: bool,
}

impl ToolProfile {
    /* plain HEVC + screen content tools */
    pub fn hm() -> Self {
        ToolProfile {
            bg_skip: false,
            amp_enc_speedup: true,
            amp_mrg: true,
            amp_mrg_intra_parent: true,
            intra_bc_fast_search: true,
            intra_bc_1d_search: true,
            adaptive_qp_selection: false,
            i_slice_lcu_cost: true,
        }
    }

    /* surveillance profile with background skip */
    pub fn lrsp() -> Self {
        ToolProfile {
            bg_skip: true,
            ..ToolProfile::hm()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn profiles_differ_in_bg_skip_only() {
        let hm = ToolProfile::hm();
        let lrsp = ToolProfile::lrsp();
        assert!(!hm.bg_skip);
        assert!(lrsp.bg_skip);
        assert_eq!(ToolProfile { bg_skip: false, ..lrsp }, hm);
    }

    #[test]
    fn byte_slices_need_a_budget() {
        let mut cfg = EncoderConfig::new();
        assert!(cfg.validate().is_ok());
        cfg.slice_mode = SliceConstraint::FIXED_NUMBER_OF_BYTES;
        assert_eq!(
            cfg.validate(),
            Err(HevcError::InvalidArgument("slice_argument"))
        );
        cfg.slice_argument = 1500;
        assert!(cfg.validate().is_ok());
    }
}
