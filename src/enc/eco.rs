use crate::api::*;
use crate::com::cu::*;
use crate::com::*;

/* parameter sets and picture state the CU syntax depends on */
pub(crate) struct HevceSyntaxCtx<'a> {
    pub(crate) sps: &'a HevcSps,
    pub(crate) pps: &'a HevcPps,
    pub(crate) slice: &'a HevcSlice,
    pub(crate) ctus: &'a [HevcCUData],
    /* background skip flag present */
    pub(crate) bg_skip: bool,
}

pub(crate) fn hevce_eco_split_flag<E: EntropyCoder>(
    sx: &HevceSyntaxCtx,
    e: &mut E,
    cu: &HevcCUData,
    idx: usize,
    depth: u8,
) {
    if depth < sx.sps.max_cu_depth() {
        e.encode_split_flag(cu, idx, depth);
    }
}

pub(crate) fn hevce_eco_bg_skip_flag<E: EntropyCoder>(
    sx: &HevceSyntaxCtx,
    e: &mut E,
    cu: &HevcCUData,
    idx: usize,
) {
    if sx.bg_skip {
        e.encode_bg_skip_flag(cu, idx);
    }
}

/* delta to the predicted QP, wrapped into the coded range */
pub(crate) fn hevce_eco_delta_qp<E: EntropyCoder>(
    sx: &HevceSyntaxCtx,
    e: &mut E,
    cu: &HevcCUData,
    idx: usize,
) {
    let bd = sx.sps.qp_bd_offset_y();
    let ref_qp = cu.get_ref_qp(idx, sx.ctus, sx.pps, sx.slice) as i32;
    let dqp = cu.qp(idx) as i32 - ref_qp;
    let dqp = (dqp + 78 + bd + bd / 2) % (52 + bd) - 26 - bd / 2;
    e.encode_delta_qp(dqp);
}

fn hevce_eco_ipcm_info<E: EntropyCoder>(
    sx: &HevceSyntaxCtx,
    e: &mut E,
    cu: &HevcCUData,
    idx: usize,
) {
    let sps = sx.sps;
    let w = cu.width(idx);
    if !sps.use_pcm || w > (1 << sps.pcm_log2_max_size) || w < (1 << sps.pcm_log2_min_size) {
        return;
    }
    e.encode_ipcm_info(cu, idx);
}

pub(crate) fn hevce_eco_pred_info<E: EntropyCoder>(
    sx: &HevceSyntaxCtx,
    e: &mut E,
    cu: &HevcCUData,
    idx: usize,
) {
    if cu.is_intra(idx) {
        if cu.part_size(idx) == PartSize::SIZE_NxN {
            let q = cu.geom().num_part_at(cu.depth(idx)) >> 2;
            for pu in 0..4 {
                e.encode_intra_dir_luma(cu, idx + pu * q);
            }
        } else {
            e.encode_intra_dir_luma(cu, idx);
        }
        if sx.sps.chroma_format != ChromaSampling::Cs400 {
            e.encode_intra_dir_chroma(cu, idx);
        }
        return;
    }

    for pu in 0..cu.part_size(idx).num_pu() {
        let (off, _, _) = cu.part_index_and_size(idx, pu);
        let sub = idx + off;
        e.encode_merge_flag(cu, sub);
        if cu.merge_flag(sub) {
            e.encode_merge_index(cu, sub);
            continue;
        }
        if sx.slice.slice_type == SliceType::B_SLICE {
            e.encode_inter_dir(cu, sub);
        }
        for list in 0..2 {
            if cu.inter_dir(sub) & (1 << list) != 0 {
                e.encode_ref_frm_idx(cu, sub, list);
                e.encode_mvd(cu, sub, list);
                e.encode_mvp_idx(cu, sub, list);
            }
        }
    }
}

/* residual of a CU coded as one transform unit; the first cbf carries the delta QP */
pub(crate) fn hevce_eco_coeff<E: EntropyCoder>(
    sx: &HevceSyntaxCtx,
    e: &mut E,
    cu: &HevcCUData,
    idx: usize,
    code_dqp: &mut bool,
) {
    let intra = cu.is_intra(idx);
    if !intra {
        if !(cu.merge_flag(idx) && cu.part_size(idx) == PartSize::SIZE_2Nx2N) {
            e.encode_qt_root_cbf(cu, idx);
        }
        if !cu.qt_root_cbf(idx) {
            return;
        }
    }

    let chroma = sx.sps.chroma_format != ChromaSampling::Cs400;
    let mut chroma_cbf = false;
    if chroma {
        for comp in U_C..=V_C {
            e.encode_qt_cbf(cu, idx, comp);
            chroma_cbf |= cu.cbf_at_depth(idx, comp, 0) != 0;
        }
    }
    /* an inter root cbf without chroma residual implies luma */
    if intra || chroma_cbf {
        e.encode_qt_cbf(cu, idx, Y_C);
    }

    if !cu.qt_root_cbf(idx) {
        return;
    }
    if *code_dqp {
        hevce_eco_delta_qp(sx, e, cu, idx);
        *code_dqp = false;
    }
    let num_comps = if chroma { N_C } else { 1 };
    for comp in 0..num_comps {
        if cu.cbf_at_depth(idx, comp, 0) != 0 {
            e.encode_coeff_nxn(cu, idx, comp);
        }
    }
}

/* everything of a leaf CU after the split and background flags */
pub(crate) fn hevce_eco_cu_body<E: EntropyCoder>(
    sx: &HevceSyntaxCtx,
    e: &mut E,
    cu: &HevcCUData,
    idx: usize,
    depth: u8,
    code_dqp: &mut bool,
) {
    if sx.pps.transquant_bypass_enable {
        e.encode_cu_transquant_bypass_flag(cu, idx);
    }
    if !sx.slice.is_intra() {
        e.encode_skip_flag(cu, idx);
    }
    if cu.is_skipped(idx) {
        e.encode_merge_index(cu, idx);
        return;
    }

    if sx.sps.use_intra_bc {
        e.encode_intra_bc_flag(cu, idx);
        if cu.is_intra_bc(idx) {
            e.encode_intra_bc(cu, idx);
        }
    }

    if !cu.is_intra_bc(idx) {
        if !sx.slice.is_intra() {
            e.encode_pred_mode(cu, idx);
        }
        e.encode_part_size(cu, idx, depth);

        if cu.is_intra(idx) && cu.part_size(idx) == PartSize::SIZE_2Nx2N {
            hevce_eco_ipcm_info(sx, e, cu, idx);
            if cu.ipcm_flag(idx) {
                return;
            }
        }
        hevce_eco_pred_info(sx, e, cu, idx);
    }

    hevce_eco_coeff(sx, e, cu, idx, code_dqp);
}
