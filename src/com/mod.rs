pub mod cu;
pub mod mv;
pub mod pic;
pub(crate) mod tbl;
pub(crate) mod tracer;
pub mod yuv;

use crate::api::*;

/*****************************************************************************
 * types
 *****************************************************************************/
pub type pel = i16;
pub type coef = i32;

#[inline]
pub(crate) fn hevc_assert_rv(x: bool, r: HevcError) -> Result<(), HevcError> {
    if !x {
        debug_assert!(x, "{}", r);
        return Err(r);
    }
    Ok(())
}

#[inline]
pub(crate) fn HEVC_CLIP3<T: PartialOrd>(min_x: T, max_x: T, value: T) -> T {
    if value < min_x {
        min_x
    } else if value > max_x {
        max_x
    } else {
        value
    }
}

pub const Y_C: usize = 0; /* Y luma */
pub const U_C: usize = 1; /* Cb Chroma */
pub const V_C: usize = 2; /* Cr Chroma */
pub const N_C: usize = 3; /* number of color component */

pub const REF_PIC_LIST_0: usize = 0;
pub const REF_PIC_LIST_1: usize = 1;
pub const REF_PIC_LIST_INTRABC: usize = 2;
pub const NUM_MV_LISTS: usize = 3;

/* Max. and min. Quantization parameter */
pub const MAX_QP: i32 = 51;

pub const MAX_CU_DEPTH: usize = 6;
pub const MAX_CU_SIZE: usize = 1 << MAX_CU_DEPTH;
pub const MAX_NUM_PART_IDXS_IN_CTU_WIDTH: usize = MAX_CU_SIZE / 4;

pub const MRG_MAX_NUM_CANDS: usize = 5;
pub const AMVP_MAX_NUM_CANDS: usize = 2;

pub const PLANAR_IDX: u8 = 0;
pub const DC_IDX: u8 = 1;
pub const DM_CHROMA_IDX: u8 = 36;
pub const NUM_INTRA_MODE: u8 = 35;

/* adaptive reconstruction level statistics */
pub const LEVEL_RANGE: usize = 30;
pub const ARL_C_PRECISION: u32 = 7;

pub const CU_DQP_TU_CMAX: u32 = 5;
pub const CU_DQP_EG_K: u32 = 0;

/* gradient activity under which an 8x8 intra block copy search stays 1-D */
pub const INTRABC_FAST_ACT_TH: i32 = 168;

/*****************************************************************************
 * sequence parameter set
 *****************************************************************************/
#[derive(Clone, Debug, Default)]
pub struct HevcSps {
    pub pic_width: u32,
    pub pic_height: u32,
    pub chroma_format: ChromaSampling,
    pub bit_depth_luma: u8,
    pub bit_depth_chroma: u8,

    pub max_cu_width: u32,
    pub max_cu_height: u32,
    /* depth of the partition grid inside a CTU */
    pub max_total_cu_depth: u8,
    /* grid levels below the smallest CU */
    pub add_cu_depth: u8,
    pub quadtree_tu_log2_min_size: u8,

    pub use_amp: bool,

    pub use_pcm: bool,
    pub pcm_log2_min_size: u8,
    pub pcm_log2_max_size: u8,
    pub pcm_bit_depth_luma: u8,
    pub pcm_bit_depth_chroma: u8,

    pub use_intra_bc: bool,
    pub max_num_merge_cand: u8,
}

impl HevcSps {
    pub fn new(pic_width: u32, pic_height: u32, max_cu_size: u32, max_cu_depth: u8) -> Self {
        HevcSps {
            pic_width,
            pic_height,
            chroma_format: ChromaSampling::Cs420,
            bit_depth_luma: 8,
            bit_depth_chroma: 8,
            max_cu_width: max_cu_size,
            max_cu_height: max_cu_size,
            max_total_cu_depth: max_cu_depth,
            add_cu_depth: 0,
            quadtree_tu_log2_min_size: 2,
            use_amp: false,
            use_pcm: false,
            pcm_log2_min_size: 3,
            pcm_log2_max_size: 5,
            pcm_bit_depth_luma: 8,
            pcm_bit_depth_chroma: 8,
            use_intra_bc: false,
            max_num_merge_cand: MRG_MAX_NUM_CANDS as u8,
        }
    }

    pub fn validate(&self) -> Result<(), HevcError> {
        if !self.max_cu_width.is_power_of_two() || self.max_cu_width != self.max_cu_height {
            return Err(HevcError::Unsupported("CTU must be a power of two square"));
        }
        if self.max_cu_width as usize > MAX_CU_SIZE {
            return Err(HevcError::Unsupported("CTU larger than 64x64"));
        }
        if self.max_total_cu_depth as usize > MAX_CU_DEPTH
            || self.add_cu_depth >= self.max_total_cu_depth
            || (self.max_cu_width >> self.max_total_cu_depth) < 4
        {
            return Err(HevcError::Unsupported("CU depth"));
        }
        if self.pic_width == 0 || self.pic_height == 0 {
            return Err(HevcError::InvalidArgument("picture size"));
        }
        if self.max_num_merge_cand == 0 || self.max_num_merge_cand as usize > MRG_MAX_NUM_CANDS {
            return Err(HevcError::InvalidArgument("max_num_merge_cand"));
        }
        Ok(())
    }

    /* deepest depth a CU may be split to */
    #[inline]
    pub fn max_cu_depth(&self) -> u8 {
        self.max_total_cu_depth - self.add_cu_depth
    }

    #[inline]
    pub fn num_part_in_ctu(&self) -> usize {
        1 << (2 * self.max_total_cu_depth as usize)
    }

    #[inline]
    pub fn num_part_in_ctu_width(&self) -> usize {
        1 << self.max_total_cu_depth as usize
    }

    /* width of one partition unit */
    #[inline]
    pub fn min_cu_width(&self) -> u32 {
        self.max_cu_width >> self.max_total_cu_depth
    }

    #[inline]
    pub fn qp_bd_offset_y(&self) -> i32 {
        6 * (self.bit_depth_luma as i32 - 8)
    }

    #[inline]
    pub fn frame_width_in_ctu(&self) -> usize {
        ((self.pic_width + self.max_cu_width - 1) / self.max_cu_width) as usize
    }

    #[inline]
    pub fn frame_height_in_ctu(&self) -> usize {
        ((self.pic_height + self.max_cu_height - 1) / self.max_cu_height) as usize
    }

    #[inline]
    pub fn num_ctus(&self) -> usize {
        self.frame_width_in_ctu() * self.frame_height_in_ctu()
    }

    /* asymmetric partitions are searched at this depth */
    #[inline]
    pub fn amp_acc(&self, depth: u8) -> bool {
        self.use_amp && depth < self.max_cu_depth()
    }

    /* bits spent by a PCM coded CU of the given luma size */
    pub fn pcm_raw_bits(&self, width: u32, height: u32) -> u32 {
        let luma = width * height * self.pcm_bit_depth_luma as u32;
        if self.chroma_format == ChromaSampling::Cs400 {
            return luma;
        }
        let (sx, sy) = self.chroma_format.shift();
        luma + 2 * ((width >> sx) * (height >> sy) * self.pcm_bit_depth_chroma as u32)
    }
}

/*****************************************************************************
 * picture parameter set
 *****************************************************************************/
#[derive(Clone, Debug, Default)]
pub struct HevcPps {
    pub use_dqp: bool,
    pub max_cu_dqp_depth: u8,
    pub transquant_bypass_enable: bool,
    /* wavefront entry points reset the last coded QP on every CTU row */
    pub entropy_coding_sync: bool,
}

impl HevcPps {
    #[inline]
    pub fn min_cu_dqp_size(&self, sps: &HevcSps) -> u32 {
        sps.max_cu_width >> self.max_cu_dqp_depth
    }
}

/*****************************************************************************
 * slice header and running slice state
 *****************************************************************************/
#[derive(Clone, Debug, Default)]
pub struct HevcSlice {
    pub slice_type: SliceType,
    pub slice_qp: i32,
    pub lambda: f64,
    /* active reference pictures of lists 0 and 1 */
    pub num_ref_idx: [u8; 2],

    /* addresses in partition units, encoding order */
    pub slice_cur_start_cu_addr: u32,
    pub slice_cur_end_cu_addr: u32,
    pub slice_segment_cur_start_cu_addr: u32,
    pub slice_segment_cur_end_cu_addr: u32,

    /* bits written so far */
    pub slice_bits: u32,
    pub slice_segment_bits: u32,
    pub final_slice: bool,
    pub final_slice_segment: bool,
}

impl HevcSlice {
    /* one slice covering the whole picture */
    pub fn new(sps: &HevcSps, slice_type: SliceType, slice_qp: i32, lambda: f64) -> Self {
        let end = (sps.num_ctus() * sps.num_part_in_ctu()) as u32;
        HevcSlice {
            slice_type,
            slice_qp,
            lambda,
            num_ref_idx: match slice_type {
                SliceType::I_SLICE => [0, 0],
                SliceType::P_SLICE => [1, 0],
                SliceType::B_SLICE => [1, 1],
            },
            slice_cur_start_cu_addr: 0,
            slice_cur_end_cu_addr: end,
            slice_segment_cur_start_cu_addr: 0,
            slice_segment_cur_end_cu_addr: end,
            slice_bits: 0,
            slice_segment_bits: 0,
            final_slice: false,
            final_slice_segment: false,
        }
    }

    #[inline]
    pub fn is_intra(&self) -> bool {
        self.slice_type == SliceType::I_SLICE
    }
}
