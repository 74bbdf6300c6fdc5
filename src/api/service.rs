use crate::api::*;

/*****************************************************************************
 * collaborators the CU search drives; pixel kernels, transforms and
 * arithmetic coding live behind these
 *****************************************************************************/

/* prediction kernels and their searches */
pub trait PredSearch {
    /* merge candidates of the 2Nx2N prediction unit of cu */
    fn merge_candidates(&mut self, cu: &HevcCUData, pic: &HevcPic) -> Vec<HevcMergeCand>;

    /* motion compensated prediction from the motion already stamped in cu */
    fn motion_compensation(&mut self, cu: &HevcCUData, pic: &HevcPic, pred: &mut HevcYuv);

    /* motion search of every prediction unit of cu; stamps motion and fills pred.
    with use_mrg only merge candidates are tried and false means none fitted */
    fn pred_inter_search(
        &mut self,
        cu: &mut HevcCUData,
        pic: &HevcPic,
        org: &HevcYuv,
        pred: &mut HevcYuv,
        use_mrg: bool,
    ) -> bool;

    /* intra mode search including residual coding; returns the distortion */
    fn est_intra_pred(
        &mut self,
        cu: &mut HevcCUData,
        pic: &HevcPic,
        org: &HevcYuv,
        pred: &mut HevcYuv,
        resi: &mut HevcYuv,
        reco: &mut HevcYuv,
    ) -> u64;

    /* block vector search; false when no valid vector exists */
    fn pred_intra_bc_search(
        &mut self,
        cu: &mut HevcCUData,
        pic: &HevcPic,
        org: &HevcYuv,
        pred: &mut HevcYuv,
        search_1d: bool,
    ) -> bool;
}

/* transform, quantisation and reconstruction of a predicted CU */
pub trait ResidualCoder {
    /* fills coefficients, coded block flags and reco; returns the distortion.
    skip_residual forces an all-zero residual */
    fn encode_res_and_calc_rd_inter_cu(
        &mut self,
        cu: &mut HevcCUData,
        org: &HevcYuv,
        pred: &HevcYuv,
        resi: &mut HevcYuv,
        reco: &mut HevcYuv,
        skip_residual: bool,
    ) -> u64;
}

/* CU level syntax coder; the same interface serves bit estimation and writing */
pub trait EntropyCoder {
    type Context: Clone;

    fn save_context(&self) -> Self::Context;
    fn load_context(&mut self, ctx: &Self::Context);

    fn reset_bits(&mut self);
    fn num_written_bits(&self) -> u32;
    fn num_bins_coded(&self) -> u32;

    fn encode_split_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize, depth: u8);
    fn encode_bg_skip_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_cu_transquant_bypass_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_skip_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_merge_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_merge_index(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_intra_bc_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_intra_bc(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_pred_mode(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_part_size(&mut self, cu: &HevcCUData, abs_part_idx: usize, depth: u8);
    fn encode_ipcm_info(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_intra_dir_luma(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_intra_dir_chroma(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_inter_dir(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_ref_frm_idx(&mut self, cu: &HevcCUData, abs_part_idx: usize, list: usize);
    fn encode_mvd(&mut self, cu: &HevcCUData, abs_part_idx: usize, list: usize);
    fn encode_mvp_idx(&mut self, cu: &HevcCUData, abs_part_idx: usize, list: usize);
    fn encode_qt_root_cbf(&mut self, cu: &HevcCUData, abs_part_idx: usize);
    fn encode_qt_cbf(&mut self, cu: &HevcCUData, abs_part_idx: usize, comp: usize);
    fn encode_coeff_nxn(&mut self, cu: &HevcCUData, abs_part_idx: usize, comp: usize);
    fn encode_delta_qp(&mut self, dqp: i32);
    fn encode_terminating_bit(&mut self, last: bool);
    fn encode_slice_finish(&mut self);
}

/* external rate control */
pub trait RateControl {
    /* QP every CU of the CTU is coded with */
    fn rc_qp(&self, ctu_addr: usize) -> i32;

    /* complexity of an I-slice CTU, 8x8 Hadamard based */
    fn set_i_slice_lcu_cost(&mut self, _ctu_addr: usize, _cost: i32) {}
}

/* per region activity statistics of the adaptive QP layers */
pub trait AdaptiveQpLayer {
    /* luma size of an adaptation unit of layer aq_depth */
    fn unit_size(&self, aq_depth: u8) -> (u32, u32);
    fn num_units_in_width(&self, aq_depth: u8) -> usize;
    fn activity(&self, aq_depth: u8, unit_idx: usize) -> f64;
    fn avg_activity(&self, aq_depth: u8) -> f64;
}

/* background predicate of the low-rank/sparse decomposition */
pub trait BackgroundMask {
    /* true when every sample of the luma rectangle is background */
    fn is_background_only(&self, x: u32, y: u32, w: u32, h: u32) -> bool;
}
