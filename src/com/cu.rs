use super::mv::*;
use super::tbl::*;
use super::*;
use crate::api::*;

/* CTU geometry every CU of a sequence shares */
#[derive(Debug, Default, Clone, Copy)]
pub struct HevcCuGeom {
    pub max_cu_width: u32,
    pub max_cu_height: u32,
    pub max_total_depth: u8,
    pub num_part_in_ctu: usize,
    pub unit_size: u32,
    pub frame_width_in_ctu: usize,
    pub pic_width: u32,
    pub pic_height: u32,
    pub chroma: ChromaSampling,
}

impl HevcCuGeom {
    pub fn new(sps: &HevcSps) -> Self {
        HevcCuGeom {
            max_cu_width: sps.max_cu_width,
            max_cu_height: sps.max_cu_height,
            max_total_depth: sps.max_total_cu_depth,
            num_part_in_ctu: sps.num_part_in_ctu(),
            unit_size: sps.min_cu_width(),
            frame_width_in_ctu: sps.frame_width_in_ctu(),
            pic_width: sps.pic_width,
            pic_height: sps.pic_height,
            chroma: sps.chroma_format,
        }
    }

    /* partitions covered by a CU of the given depth */
    #[inline]
    pub fn num_part_at(&self, depth: u8) -> usize {
        self.num_part_in_ctu >> (2 * depth as usize)
    }

    #[inline]
    pub fn num_part_in_width(&self) -> usize {
        1 << self.max_total_depth
    }
}

/* write val over a prediction unit of a CU, shaped by its partition size */
fn set_sub_part<T: Copy>(
    arr: &mut [T],
    val: T,
    part_size: PartSize,
    cu_addr: usize,
    num_part: usize,
    pu_idx: usize,
) {
    use PartSize::*;
    let q = num_part >> 2;
    let mut fill = |start: usize, len: usize| {
        for v in &mut arr[cu_addr + start..cu_addr + start + len] {
            *v = val;
        }
    };
    match part_size {
        SIZE_2Nx2N | NUMBER_OF_PART_SIZES => fill(0, 4 * q),
        SIZE_2NxN => fill(0, 2 * q),
        SIZE_Nx2N => {
            fill(0, q);
            fill(2 * q, q);
        }
        SIZE_NxN => fill(0, q),
        SIZE_2NxnU => {
            if pu_idx == 0 {
                fill(0, q >> 1);
                fill(q, q >> 1);
            } else {
                fill(0, q >> 1);
                fill(q, (q >> 1) + (q << 1));
            }
        }
        SIZE_2NxnD => {
            if pu_idx == 0 {
                fill(0, (q << 1) + (q >> 1));
                fill((q << 1) + q, q >> 1);
            } else {
                fill(0, q >> 1);
                fill(q, q >> 1);
            }
        }
        SIZE_nLx2N => {
            if pu_idx == 0 {
                fill(0, q >> 2);
                fill(q >> 1, q >> 2);
                fill(q << 1, q >> 2);
                fill((q << 1) + (q >> 1), q >> 2);
            } else {
                fill(0, q >> 2);
                fill(q >> 1, q + (q >> 2));
                fill(q << 1, q >> 2);
                fill((q << 1) + (q >> 1), q + (q >> 2));
            }
        }
        SIZE_nRx2N => {
            if pu_idx == 0 {
                fill(0, q + (q >> 2));
                fill(q + (q >> 1), q >> 2);
                fill(q << 1, q + (q >> 2));
                fill((q << 1) + q + (q >> 1), q >> 2);
            } else {
                fill(0, q >> 2);
                fill(q >> 1, q >> 2);
                fill(q << 1, q >> 2);
                fill((q << 1) + (q >> 1), q >> 2);
            }
        }
    }
}

/*****************************************************************************
 * coding unit data: every attribute is a flat array over the z-order
 * partitions the CU covers
 *****************************************************************************/
#[derive(Debug, Clone)]
pub struct HevcCUData {
    pub(crate) geom: HevcCuGeom,

    /* CTU raster address */
    pub(crate) cu_addr: usize,
    /* first partition inside the CTU, z-order */
    pub(crate) abs_idx_in_lcu: usize,
    pub(crate) cu_pel_x: u32,
    pub(crate) cu_pel_y: u32,
    pub(crate) num_partition: usize,

    pub(crate) width: Vec<u8>,
    pub(crate) height: Vec<u8>,
    pub(crate) depth: Vec<u8>,

    pub(crate) skip_flag: Vec<bool>,
    pub(crate) bg_skip_flag: Vec<bool>,
    pub(crate) part_size: Vec<u8>,
    pub(crate) pred_mode: Vec<u8>,
    pub(crate) cu_transquant_bypass: Vec<bool>,
    pub(crate) qp: Vec<i8>,
    pub(crate) tr_idx: Vec<u8>,
    pub(crate) transform_skip: [Vec<u8>; N_C],
    pub(crate) cbf: [Vec<u8>; N_C],

    /* L0, L1 and the intra block copy vector field */
    pub(crate) mv_field: [HevcCUMvField; NUM_MV_LISTS],
    pub(crate) last_intra_bc_mv: HevcMv,

    pub(crate) coeff: [Vec<coef>; N_C],
    pub(crate) arl_coeff: [Vec<coef>; N_C],
    pub(crate) pcm_sample: [Vec<pel>; N_C],

    /* neighbouring CTU addresses, never owned */
    pub(crate) cu_left: Option<usize>,
    pub(crate) cu_above: Option<usize>,
    pub(crate) cu_above_left: Option<usize>,
    pub(crate) cu_above_right: Option<usize>,
    pub(crate) cu_colocated: [Option<usize>; 2],

    pub(crate) merge_flag: Vec<bool>,
    pub(crate) merge_index: Vec<u8>,
    pub(crate) is_merge_amp: bool,
    pub(crate) intra_dir: [Vec<u8>; 2],
    pub(crate) inter_dir: Vec<u8>,
    pub(crate) mvp_idx: [Vec<i8>; 2],
    pub(crate) mvp_num: [Vec<i8>; 2],
    pub(crate) ipcm_flag: Vec<bool>,

    pub(crate) total_cost: f64,
    pub(crate) total_distortion: u64,
    pub(crate) total_bits: u32,
    pub(crate) total_bins: u32,

    pub(crate) slice_start_cu: Vec<u32>,
    pub(crate) slice_segment_start_cu: Vec<u32>,
    /* start of the slice segment being coded */
    pub(crate) seg_cur_start: u32,
    pub(crate) coded_qp: i8,
}

pub const MAX_DOUBLE: f64 = 1.7e+308;

impl HevcCUData {
    /* allocate a CU able to hold a CU of the given depth */
    pub fn new(geom: HevcCuGeom, depth: u8) -> Self {
        let n = geom.num_part_at(depth);
        let w = (geom.max_cu_width >> depth) as usize;
        let h = (geom.max_cu_height >> depth) as usize;
        let (sx, sy) = geom.chroma.shift();
        let cn = if geom.chroma == ChromaSampling::Cs400 {
            0
        } else {
            (w >> sx) * (h >> sy)
        };
        let sizes = [w * h, cn, cn];
        HevcCUData {
            geom,
            cu_addr: 0,
            abs_idx_in_lcu: 0,
            cu_pel_x: 0,
            cu_pel_y: 0,
            num_partition: n,
            width: vec![w as u8; n],
            height: vec![h as u8; n],
            depth: vec![depth; n],
            skip_flag: vec![false; n],
            bg_skip_flag: vec![false; n],
            part_size: vec![PartSize::NUMBER_OF_PART_SIZES as u8; n],
            pred_mode: vec![PredMode::NUMBER_OF_PREDICTION_MODES as u8; n],
            cu_transquant_bypass: vec![false; n],
            qp: vec![0; n],
            tr_idx: vec![0; n],
            transform_skip: [vec![0; n], vec![0; n], vec![0; n]],
            cbf: [vec![0; n], vec![0; n], vec![0; n]],
            mv_field: [
                HevcCUMvField::new(n),
                HevcCUMvField::new(n),
                HevcCUMvField::new(n),
            ],
            last_intra_bc_mv: HevcMv::default(),
            coeff: [vec![0; sizes[0]], vec![0; sizes[1]], vec![0; sizes[2]]],
            arl_coeff: [vec![0; sizes[0]], vec![0; sizes[1]], vec![0; sizes[2]]],
            pcm_sample: [vec![0; sizes[0]], vec![0; sizes[1]], vec![0; sizes[2]]],
            cu_left: None,
            cu_above: None,
            cu_above_left: None,
            cu_above_right: None,
            cu_colocated: [None, None],
            merge_flag: vec![false; n],
            merge_index: vec![0; n],
            is_merge_amp: false,
            intra_dir: [vec![DC_IDX; n], vec![DC_IDX; n]],
            inter_dir: vec![0; n],
            mvp_idx: [vec![-1; n], vec![-1; n]],
            mvp_num: [vec![-1; n], vec![-1; n]],
            ipcm_flag: vec![false; n],
            total_cost: MAX_DOUBLE,
            total_distortion: 0,
            total_bits: 0,
            total_bins: 0,
            slice_start_cu: vec![0; n],
            slice_segment_start_cu: vec![0; n],
            seg_cur_start: 0,
            coded_qp: 0,
        }
    }

    /* coefficient offset of a partition, per component */
    #[inline]
    pub(crate) fn coeff_offset(&self, part: usize, comp: usize) -> usize {
        let luma = part * (self.geom.unit_size * self.geom.unit_size) as usize;
        if comp == Y_C {
            luma
        } else {
            let (sx, sy) = self.geom.chroma.shift();
            luma >> (sx + sy)
        }
    }

    #[inline]
    fn num_comps(&self) -> usize {
        self.geom.chroma.num_comps()
    }

    /* reset partitions [first, num_partition) to the undecided state */
    fn reset_parts(&mut self, first: usize, depth: u8, qp: i8, bypass: bool) {
        let w = (self.geom.max_cu_width >> depth) as u8;
        let h = (self.geom.max_cu_height >> depth) as u8;
        for ui in first..self.num_partition {
            self.mvp_idx[0][ui] = -1;
            self.mvp_idx[1][ui] = -1;
            self.mvp_num[0][ui] = -1;
            self.mvp_num[1][ui] = -1;
            self.depth[ui] = depth;
            self.width[ui] = w;
            self.height[ui] = h;
            self.tr_idx[ui] = 0;
            self.skip_flag[ui] = false;
            self.bg_skip_flag[ui] = false;
            self.part_size[ui] = PartSize::NUMBER_OF_PART_SIZES as u8;
            self.pred_mode[ui] = PredMode::NUMBER_OF_PREDICTION_MODES as u8;
            self.cu_transquant_bypass[ui] = bypass;
            self.ipcm_flag[ui] = false;
            self.qp[ui] = qp;
            self.merge_flag[ui] = false;
            self.merge_index[ui] = 0;
            self.intra_dir[0][ui] = DC_IDX;
            self.intra_dir[1][ui] = DC_IDX;
            self.inter_dir[ui] = 0;
            for c in 0..N_C {
                self.transform_skip[c][ui] = 0;
                self.cbf[c][ui] = 0;
            }
        }
        for f in self.mv_field.iter_mut() {
            f.clear_range(first, self.num_partition - first);
        }
        for c in 0..self.num_comps() {
            let start = self.coeff_offset(first, c);
            for v in &mut self.coeff[c][start..] {
                *v = 0;
            }
            for v in &mut self.arl_coeff[c][start..] {
                *v = 0;
            }
        }
    }

    /* bind this CU to CTU cu_addr and reset it for a new search */
    pub fn init_cu(&mut self, pic_ctu: &HevcCUData, slice: &HevcSlice, cu_addr: usize) {
        let g = self.geom;
        self.cu_addr = cu_addr;
        self.cu_pel_x = (cu_addr % g.frame_width_in_ctu) as u32 * g.max_cu_width;
        self.cu_pel_y = (cu_addr / g.frame_width_in_ctu) as u32 * g.max_cu_height;
        self.abs_idx_in_lcu = 0;
        self.total_cost = MAX_DOUBLE;
        self.total_distortion = 0;
        self.total_bits = 0;
        self.total_bins = 0;
        self.num_partition = g.num_part_in_ctu;
        self.seg_cur_start = slice.slice_segment_cur_start_cu_addr;
        self.is_merge_amp = false;
        self.last_intra_bc_mv = HevcMv::default();

        let base = (cu_addr * g.num_part_in_ctu) as u32;
        for i in 0..g.num_part_in_ctu {
            self.slice_start_cu[i] = if base + i as u32 >= slice.slice_cur_start_cu_addr {
                slice.slice_cur_start_cu_addr
            } else {
                pic_ctu.slice_start_cu[i]
            };
            self.slice_segment_start_cu[i] =
                if base + i as u32 >= slice.slice_segment_cur_start_cu_addr {
                    slice.slice_segment_cur_start_cu_addr
                } else {
                    pic_ctu.slice_segment_start_cu[i]
                };
        }

        /* partitions of an earlier slice segment keep their coded state */
        let part_start = slice.slice_segment_cur_start_cu_addr as i64 - base as i64;
        let num_copied = part_start.max(0).min(g.num_part_in_ctu as i64) as usize;
        if num_copied > 0 {
            self.copy_parts_from(pic_ctu, 0, 0, num_copied);
        }
        if num_copied < g.num_part_in_ctu {
            self.reset_parts(num_copied, 0, slice.slice_qp as i8, false);
        }

        let fw = g.frame_width_in_ctu;
        let col = cu_addr % fw;
        let row = cu_addr / fw;
        self.cu_left = if col > 0 { Some(cu_addr - 1) } else { None };
        self.cu_above = if row > 0 { Some(cu_addr - fw) } else { None };
        self.cu_above_left = if col > 0 && row > 0 {
            Some(cu_addr - fw - 1)
        } else {
            None
        };
        self.cu_above_right = if row > 0 && col + 1 < fw {
            Some(cu_addr - fw + 1)
        } else {
            None
        };
        self.cu_colocated = match slice.slice_type {
            SliceType::I_SLICE => [None, None],
            SliceType::P_SLICE => [Some(cu_addr), None],
            SliceType::B_SLICE => [Some(cu_addr), Some(cu_addr)],
        };
        self.coded_qp = slice.slice_qp as i8;
    }

    /* copy n partitions of src starting at src_idx into this CU at dst_idx */
    fn copy_parts_from(&mut self, src: &HevcCUData, src_idx: usize, dst_idx: usize, n: usize) {
        let (s, d) = (src_idx..src_idx + n, dst_idx..dst_idx + n);
        self.width[d.clone()].copy_from_slice(&src.width[s.clone()]);
        self.height[d.clone()].copy_from_slice(&src.height[s.clone()]);
        self.depth[d.clone()].copy_from_slice(&src.depth[s.clone()]);
        self.skip_flag[d.clone()].copy_from_slice(&src.skip_flag[s.clone()]);
        self.bg_skip_flag[d.clone()].copy_from_slice(&src.bg_skip_flag[s.clone()]);
        self.part_size[d.clone()].copy_from_slice(&src.part_size[s.clone()]);
        self.pred_mode[d.clone()].copy_from_slice(&src.pred_mode[s.clone()]);
        self.cu_transquant_bypass[d.clone()]
            .copy_from_slice(&src.cu_transquant_bypass[s.clone()]);
        self.qp[d.clone()].copy_from_slice(&src.qp[s.clone()]);
        self.tr_idx[d.clone()].copy_from_slice(&src.tr_idx[s.clone()]);
        for c in 0..N_C {
            self.transform_skip[c][d.clone()].copy_from_slice(&src.transform_skip[c][s.clone()]);
            self.cbf[c][d.clone()].copy_from_slice(&src.cbf[c][s.clone()]);
        }
        for l in 0..NUM_MV_LISTS {
            let (dst, srcf) = (&mut self.mv_field[l], &src.mv_field[l]);
            dst.mv[d.clone()].copy_from_slice(&srcf.mv[s.clone()]);
            dst.mvd[d.clone()].copy_from_slice(&srcf.mvd[s.clone()]);
            dst.ref_idx[d.clone()].copy_from_slice(&srcf.ref_idx[s.clone()]);
        }
        self.merge_flag[d.clone()].copy_from_slice(&src.merge_flag[s.clone()]);
        self.merge_index[d.clone()].copy_from_slice(&src.merge_index[s.clone()]);
        for ch in 0..2 {
            self.intra_dir[ch][d.clone()].copy_from_slice(&src.intra_dir[ch][s.clone()]);
            self.mvp_idx[ch][d.clone()].copy_from_slice(&src.mvp_idx[ch][s.clone()]);
            self.mvp_num[ch][d.clone()].copy_from_slice(&src.mvp_num[ch][s.clone()]);
        }
        self.inter_dir[d.clone()].copy_from_slice(&src.inter_dir[s.clone()]);
        self.ipcm_flag[d.clone()].copy_from_slice(&src.ipcm_flag[s.clone()]);
        self.slice_start_cu[d.clone()].copy_from_slice(&src.slice_start_cu[s.clone()]);
        self.slice_segment_start_cu[d].copy_from_slice(&src.slice_segment_start_cu[s]);

        for c in 0..self.num_comps() {
            let (so, dof) = (src.coeff_offset(src_idx, c), self.coeff_offset(dst_idx, c));
            let len = self.coeff_offset(n, c);
            self.coeff[c][dof..dof + len].copy_from_slice(&src.coeff[c][so..so + len]);
            self.arl_coeff[c][dof..dof + len].copy_from_slice(&src.arl_coeff[c][so..so + len]);
            self.pcm_sample[c][dof..dof + len].copy_from_slice(&src.pcm_sample[c][so..so + len]);
        }
    }

    /* reset the search state of this CU before a new QP trial */
    pub fn init_est_data(&mut self, depth: u8, qp: i32, transquant_bypass: bool) {
        self.total_cost = MAX_DOUBLE;
        self.total_distortion = 0;
        self.total_bits = 0;
        self.total_bins = 0;

        let base = self.scu_addr() as u32;
        let first = if base >= self.seg_cur_start {
            0
        } else {
            ((self.seg_cur_start - base) as usize).min(self.num_partition)
        };
        if first < self.num_partition {
            self.reset_parts(first, depth, qp as i8, transquant_bypass);
        }
    }

    /* bind this CU to quadrant part_unit_idx of parent */
    pub fn init_sub_cu(&mut self, parent: &HevcCUData, part_unit_idx: usize, depth: u8, qp: i32) {
        debug_assert!(part_unit_idx < 4);
        let g = self.geom;
        let part_offset = (parent.num_partition >> 2) * part_unit_idx;
        self.cu_addr = parent.cu_addr;
        self.abs_idx_in_lcu = parent.abs_idx_in_lcu + part_offset;
        self.cu_pel_x = parent.cu_pel_x + (g.max_cu_width >> depth) * (part_unit_idx as u32 & 1);
        self.cu_pel_y = parent.cu_pel_y + (g.max_cu_height >> depth) * (part_unit_idx as u32 >> 1);
        self.total_cost = MAX_DOUBLE;
        self.total_distortion = 0;
        self.total_bits = 0;
        self.total_bins = 0;
        self.num_partition = parent.num_partition >> 2;
        self.seg_cur_start = parent.seg_cur_start;
        self.is_merge_amp = false;
        self.coded_qp = parent.coded_qp;

        self.reset_parts(0, depth, qp as i8, false);

        let n = self.num_partition;
        self.slice_start_cu[..n]
            .copy_from_slice(&parent.slice_start_cu[part_offset..part_offset + n]);
        self.slice_segment_start_cu[..n]
            .copy_from_slice(&parent.slice_segment_start_cu[part_offset..part_offset + n]);

        self.cu_left = parent.cu_left;
        self.cu_above = parent.cu_above;
        self.cu_above_left = parent.cu_above_left;
        self.cu_above_right = parent.cu_above_right;
        self.cu_colocated = parent.cu_colocated;
    }

    /* mark a span lying outside the picture with its depth and size only */
    pub fn set_outside_cu_part(&mut self, abs_part_idx: usize, depth: u8) {
        let n = self.geom.num_part_at(depth);
        let w = (self.geom.max_cu_width >> depth) as u8;
        let h = (self.geom.max_cu_height >> depth) as u8;
        for i in abs_part_idx..abs_part_idx + n {
            self.depth[i] = depth;
            self.width[i] = w;
            self.height[i] = h;
        }
    }

    /* load the CU at abs_part_idx of a picture CTU into this CU */
    pub fn copy_sub_cu(&mut self, ctu: &HevcCUData, abs_part_idx: usize, depth: u8) {
        let g = self.geom;
        let (x, y) = zscan_to_pel(g.max_total_depth, g.unit_size, abs_part_idx);
        self.cu_addr = ctu.cu_addr;
        self.abs_idx_in_lcu = abs_part_idx;
        self.cu_pel_x = ctu.cu_pel_x + x;
        self.cu_pel_y = ctu.cu_pel_y + y;
        self.num_partition = g.num_part_at(depth);
        self.seg_cur_start = ctu.seg_cur_start;
        self.cu_left = ctu.cu_left;
        self.cu_above = ctu.cu_above;
        self.cu_above_left = ctu.cu_above_left;
        self.cu_above_right = ctu.cu_above_right;
        self.cu_colocated = ctu.cu_colocated;
        self.coded_qp = ctu.coded_qp;
        let n = self.num_partition;
        self.copy_parts_from(ctu, abs_part_idx, 0, n);
    }

    /* copy a finished child into its quadrant, accumulating its cost */
    pub fn copy_part_from(&mut self, child: &HevcCUData, part_unit_idx: usize, _depth: u8) {
        debug_assert!(part_unit_idx < 4);
        let offset = child.num_partition * part_unit_idx;
        self.copy_parts_from(child, 0, offset, child.num_partition);
        self.total_cost += child.total_cost;
        self.total_distortion += child.total_distortion;
        self.total_bits += child.total_bits;
        self.total_bins += child.total_bins;
        self.cu_left = child.cu_left;
        self.cu_above = child.cu_above;
        self.cu_above_left = child.cu_above_left;
        self.cu_above_right = child.cu_above_right;
        self.cu_colocated = child.cu_colocated;
    }

    /* commit this CU into the picture level CTU */
    pub fn copy_to_pic(&self, _depth: u8, ctu: &mut HevcCUData) {
        ctu.copy_parts_from(self, 0, self.abs_idx_in_lcu, self.num_partition);
        ctu.total_cost = self.total_cost;
        ctu.total_distortion = self.total_distortion;
        ctu.total_bits = self.total_bits;
        ctu.total_bins = self.total_bins;
    }

    /* commit sub part part_idx of depth part_depth inside this CU */
    pub fn copy_to_pic_part(
        &self,
        _depth: u8,
        part_idx: usize,
        part_depth: u8,
        ctu: &mut HevcCUData,
    ) {
        let q = self.num_partition >> (2 * part_depth as usize);
        let start = part_idx * q;
        ctu.copy_parts_from(self, start, self.abs_idx_in_lcu + start, q);
        ctu.total_cost = self.total_cost;
        ctu.total_distortion = self.total_distortion;
        ctu.total_bits = self.total_bits;
        ctu.total_bins = self.total_bins;
    }

    /*************************************************************************
     * accessors
     *************************************************************************/
    #[inline]
    pub fn cu_addr(&self) -> usize {
        self.cu_addr
    }
    #[inline]
    pub fn zorder_idx_in_cu(&self) -> usize {
        self.abs_idx_in_lcu
    }
    /* first partition in picture encoding order */
    #[inline]
    pub fn scu_addr(&self) -> usize {
        self.cu_addr * self.geom.num_part_in_ctu + self.abs_idx_in_lcu
    }
    #[inline]
    pub fn cu_pel_x(&self) -> u32 {
        self.cu_pel_x
    }
    #[inline]
    pub fn cu_pel_y(&self) -> u32 {
        self.cu_pel_y
    }
    #[inline]
    pub fn total_num_part(&self) -> usize {
        self.num_partition
    }
    #[inline]
    pub fn geom(&self) -> &HevcCuGeom {
        &self.geom
    }
    #[inline]
    pub fn width(&self, idx: usize) -> u32 {
        self.width[idx] as u32
    }
    #[inline]
    pub fn height(&self, idx: usize) -> u32 {
        self.height[idx] as u32
    }
    #[inline]
    pub fn depth(&self, idx: usize) -> u8 {
        self.depth[idx]
    }
    #[inline]
    pub fn part_size(&self, idx: usize) -> PartSize {
        PartSize::from(self.part_size[idx])
    }
    #[inline]
    pub fn pred_mode(&self, idx: usize) -> PredMode {
        PredMode::from(self.pred_mode[idx])
    }
    #[inline]
    pub fn skip_flag(&self, idx: usize) -> bool {
        self.skip_flag[idx]
    }
    #[inline]
    pub fn bg_skip_flag(&self, idx: usize) -> bool {
        self.bg_skip_flag[idx]
    }
    #[inline]
    pub fn cu_transquant_bypass(&self, idx: usize) -> bool {
        self.cu_transquant_bypass[idx]
    }
    #[inline]
    pub fn qp(&self, idx: usize) -> i8 {
        self.qp[idx]
    }
    #[inline]
    pub fn transform_idx(&self, idx: usize) -> u8 {
        self.tr_idx[idx]
    }
    #[inline]
    pub fn transform_skip(&self, idx: usize, comp: usize) -> u8 {
        self.transform_skip[comp][idx]
    }
    #[inline]
    pub fn cbf(&self, idx: usize, comp: usize) -> u8 {
        self.cbf[comp][idx]
    }
    #[inline]
    pub fn cbf_at_depth(&self, idx: usize, comp: usize, tr_depth: u8) -> u8 {
        (self.cbf[comp][idx] >> tr_depth) & 0x1
    }
    #[inline]
    pub fn mv_field(&self, list: usize) -> &HevcCUMvField {
        &self.mv_field[list]
    }
    #[inline]
    pub fn mv_field_mut(&mut self, list: usize) -> &mut HevcCUMvField {
        &mut self.mv_field[list]
    }
    #[inline]
    pub fn merge_flag(&self, idx: usize) -> bool {
        self.merge_flag[idx]
    }
    #[inline]
    pub fn merge_index(&self, idx: usize) -> u8 {
        self.merge_index[idx]
    }
    #[inline]
    pub fn merge_amp(&self) -> bool {
        self.is_merge_amp
    }
    #[inline]
    pub fn set_merge_amp(&mut self, b: bool) {
        self.is_merge_amp = b;
    }
    #[inline]
    pub fn intra_dir(&self, ch: usize, idx: usize) -> u8 {
        self.intra_dir[ch][idx]
    }
    #[inline]
    pub fn inter_dir(&self, idx: usize) -> u8 {
        self.inter_dir[idx]
    }
    #[inline]
    pub fn mvp_idx(&self, list: usize, idx: usize) -> i8 {
        self.mvp_idx[list][idx]
    }
    #[inline]
    pub fn ipcm_flag(&self, idx: usize) -> bool {
        self.ipcm_flag[idx]
    }
    #[inline]
    pub fn coeff(&self, comp: usize) -> &[coef] {
        &self.coeff[comp]
    }
    #[inline]
    pub fn coeff_mut(&mut self, comp: usize) -> &mut [coef] {
        &mut self.coeff[comp]
    }
    #[inline]
    pub fn arl_coeff(&self, comp: usize) -> &[coef] {
        &self.arl_coeff[comp]
    }
    #[inline]
    pub fn arl_coeff_mut(&mut self, comp: usize) -> &mut [coef] {
        &mut self.arl_coeff[comp]
    }
    #[inline]
    pub fn pcm_sample(&self, comp: usize) -> &[pel] {
        &self.pcm_sample[comp]
    }
    #[inline]
    pub fn pcm_sample_mut(&mut self, comp: usize) -> &mut [pel] {
        &mut self.pcm_sample[comp]
    }
    #[inline]
    pub fn last_intra_bc_mv(&self) -> HevcMv {
        self.last_intra_bc_mv
    }
    #[inline]
    pub fn set_last_intra_bc_mv(&mut self, mv: HevcMv) {
        self.last_intra_bc_mv = mv;
    }
    #[inline]
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }
    #[inline]
    pub fn total_distortion(&self) -> u64 {
        self.total_distortion
    }
    #[inline]
    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }
    #[inline]
    pub fn total_bins(&self) -> u32 {
        self.total_bins
    }
    #[inline]
    pub fn set_total_distortion(&mut self, dist: u64) {
        self.total_distortion = dist;
    }
    #[inline]
    pub fn slice_start_cu(&self, pos: usize) -> u32 {
        self.slice_start_cu[pos - self.abs_idx_in_lcu]
    }
    #[inline]
    pub fn slice_segment_start_cu(&self, pos: usize) -> u32 {
        self.slice_segment_start_cu[pos - self.abs_idx_in_lcu]
    }
    #[inline]
    pub fn coded_qp(&self) -> i8 {
        self.coded_qp
    }
    #[inline]
    pub fn set_coded_qp(&mut self, qp: i8) {
        self.coded_qp = qp;
    }

    /*************************************************************************
     * predicates
     *************************************************************************/
    #[inline]
    pub fn is_skipped(&self, idx: usize) -> bool {
        self.skip_flag[idx]
    }
    #[inline]
    pub fn is_bg_skipped(&self, idx: usize) -> bool {
        self.bg_skip_flag[idx]
    }
    #[inline]
    pub fn is_intra(&self, idx: usize) -> bool {
        self.pred_mode[idx] == PredMode::MODE_INTRA as u8
    }
    #[inline]
    pub fn is_inter(&self, idx: usize) -> bool {
        self.pred_mode[idx] == PredMode::MODE_INTER as u8
    }
    #[inline]
    pub fn is_intra_bc(&self, idx: usize) -> bool {
        self.pred_mode[idx] == PredMode::MODE_INTRABC as u8
    }
    #[inline]
    pub fn is_lossless_coded(&self, idx: usize, pps: &HevcPps) -> bool {
        pps.transquant_bypass_enable && self.cu_transquant_bypass[idx]
    }
    #[inline]
    pub fn qt_root_cbf(&self, idx: usize) -> bool {
        (0..self.num_comps()).any(|c| self.cbf_at_depth(idx, c, 0) != 0)
    }

    /*************************************************************************
     * span setters; depth is absolute, the span is the CU of that depth
     *************************************************************************/
    #[inline]
    fn span(&self, abs_part_idx: usize, depth: u8) -> std::ops::Range<usize> {
        let n = self.geom.num_part_at(depth);
        abs_part_idx..abs_part_idx + n
    }

    pub fn set_depth_sub_parts(&mut self, depth: u8, abs_part_idx: usize) {
        for i in self.span(abs_part_idx, depth) {
            self.depth[i] = depth;
        }
    }

    pub fn set_size_sub_parts(&mut self, width: u32, height: u32, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            self.width[i] = width as u8;
            self.height[i] = height as u8;
        }
    }

    pub fn set_part_size_sub_parts(&mut self, part_size: PartSize, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            self.part_size[i] = part_size as u8;
        }
    }

    pub fn set_pred_mode_sub_parts(&mut self, mode: PredMode, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            self.pred_mode[i] = mode as u8;
        }
    }

    pub fn set_skip_flag_sub_parts(&mut self, skip: bool, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            self.skip_flag[i] = skip;
        }
    }

    pub fn set_bg_skip_flag_sub_parts(&mut self, skip: bool, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            self.bg_skip_flag[i] = skip;
        }
    }

    pub fn set_cu_transquant_bypass_sub_parts(&mut self, flag: bool, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            self.cu_transquant_bypass[i] = flag;
        }
    }

    pub fn set_tr_idx_sub_parts(&mut self, tr_idx: u8, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            self.tr_idx[i] = tr_idx;
        }
    }

    pub fn set_ipcm_flag_sub_parts(&mut self, flag: bool, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            self.ipcm_flag[i] = flag;
        }
    }

    pub fn set_cbf_sub_parts(&mut self, cbf: u8, comp: usize, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            self.cbf[comp][i] = cbf;
        }
    }

    pub fn set_transform_skip_sub_parts(&mut self, ts: u8, comp: usize, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            self.transform_skip[comp][i] = ts;
        }
    }

    pub fn set_intra_dir_sub_parts(&mut self, ch: usize, dir: u8, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            self.intra_dir[ch][i] = dir;
        }
    }

    /* only partitions of the current slice segment take the QP */
    pub fn set_qp_sub_parts(&mut self, qp: i32, abs_part_idx: usize, depth: u8) {
        for i in self.span(abs_part_idx, depth) {
            if self.slice_segment_start_cu[i] == self.seg_cur_start {
                self.qp[i] = qp as i8;
            }
        }
    }

    /* transform unit granular updates */
    pub fn set_cbf_part_range(&mut self, cbf: u8, comp: usize, abs_part_idx: usize, covered: usize) {
        for v in &mut self.cbf[comp][abs_part_idx..abs_part_idx + covered] {
            *v = cbf;
        }
    }

    pub fn bitwise_or_cbf_part_range(&mut self, cbf: u8, comp: usize, abs_part_idx: usize, covered: usize) {
        for v in &mut self.cbf[comp][abs_part_idx..abs_part_idx + covered] {
            *v |= cbf;
        }
    }

    pub fn set_transform_skip_part_range(&mut self, ts: u8, comp: usize, abs_part_idx: usize, covered: usize) {
        for v in &mut self.transform_skip[comp][abs_part_idx..abs_part_idx + covered] {
            *v = ts;
        }
    }

    pub fn clear_cbf(&mut self, abs_part_idx: usize, comp: usize, num_parts: usize) {
        self.set_cbf_part_range(0, comp, abs_part_idx, num_parts);
    }

    /* prediction unit setters */
    pub fn set_merge_flag_sub_parts(&mut self, flag: bool, abs_part_idx: usize, pu_idx: usize, depth: u8) {
        let (ps, n) = (self.part_size(abs_part_idx), self.geom.num_part_at(depth));
        set_sub_part(&mut self.merge_flag, flag, ps, abs_part_idx, n, pu_idx);
    }

    pub fn set_merge_index_sub_parts(&mut self, merge_idx: u8, abs_part_idx: usize, pu_idx: usize, depth: u8) {
        let (ps, n) = (self.part_size(abs_part_idx), self.geom.num_part_at(depth));
        set_sub_part(&mut self.merge_index, merge_idx, ps, abs_part_idx, n, pu_idx);
    }

    pub fn set_inter_dir_sub_parts(&mut self, dir: u8, abs_part_idx: usize, pu_idx: usize, depth: u8) {
        let (ps, n) = (self.part_size(abs_part_idx), self.geom.num_part_at(depth));
        set_sub_part(&mut self.inter_dir, dir, ps, abs_part_idx, n, pu_idx);
    }

    pub fn set_mvp_idx_sub_parts(&mut self, mvp_idx: i8, list: usize, abs_part_idx: usize, pu_idx: usize, depth: u8) {
        let (ps, n) = (self.part_size(abs_part_idx), self.geom.num_part_at(depth));
        set_sub_part(&mut self.mvp_idx[list], mvp_idx, ps, abs_part_idx, n, pu_idx);
    }

    pub fn set_mvp_num_sub_parts(&mut self, mvp_num: i8, list: usize, abs_part_idx: usize, pu_idx: usize, depth: u8) {
        let (ps, n) = (self.part_size(abs_part_idx), self.geom.num_part_at(depth));
        set_sub_part(&mut self.mvp_num[list], mvp_num, ps, abs_part_idx, n, pu_idx);
    }

    /* motion of one prediction unit in list */
    pub fn set_all_mv_field(&mut self, field: HevcMvField, list: usize, abs_part_idx: usize, pu_idx: usize, depth: u8) {
        let (ps, n) = (self.part_size(abs_part_idx), self.geom.num_part_at(depth));
        set_sub_part(&mut self.mv_field[list].mv, field.mv, ps, abs_part_idx, n, pu_idx);
        set_sub_part(&mut self.mv_field[list].ref_idx, field.ref_idx, ps, abs_part_idx, n, pu_idx);
    }

    pub fn set_all_mvd(&mut self, mvd: HevcMv, list: usize, abs_part_idx: usize, pu_idx: usize, depth: u8) {
        let (ps, n) = (self.part_size(abs_part_idx), self.geom.num_part_at(depth));
        set_sub_part(&mut self.mv_field[list].mvd, mvd, ps, abs_part_idx, n, pu_idx);
    }

    /* offset, width and height of prediction unit pu_idx of the CU at abs_part_idx */
    pub fn part_index_and_size(&self, abs_part_idx: usize, pu_idx: usize) -> (usize, u32, u32) {
        use PartSize::*;
        let n = self.geom.num_part_at(self.depth[abs_part_idx]);
        let (w, h) = (self.width(abs_part_idx), self.height(abs_part_idx));
        let first = pu_idx == 0;
        match self.part_size(abs_part_idx) {
            SIZE_2NxN => (if first { 0 } else { n >> 1 }, w, h >> 1),
            SIZE_Nx2N => (if first { 0 } else { n >> 2 }, w >> 1, h),
            SIZE_NxN => ((n >> 2) * pu_idx, w >> 1, h >> 1),
            SIZE_2NxnU => (
                if first { 0 } else { n >> 3 },
                w,
                if first { h >> 2 } else { (h >> 2) + (h >> 1) },
            ),
            SIZE_2NxnD => (
                if first { 0 } else { (n >> 1) + (n >> 3) },
                w,
                if first { (h >> 2) + (h >> 1) } else { h >> 2 },
            ),
            SIZE_nLx2N => (
                if first { 0 } else { n >> 4 },
                if first { w >> 2 } else { (w >> 2) + (w >> 1) },
                h,
            ),
            SIZE_nRx2N => (
                if first { 0 } else { (n >> 2) + (n >> 4) },
                if first { (w >> 2) + (w >> 1) } else { w >> 2 },
                h,
            ),
            _ => (0, w, h),
        }
    }

    /*************************************************************************
     * QP prediction
     *************************************************************************/
    #[inline]
    fn qg_shift(&self, pps: &HevcPps) -> usize {
        (self.geom.max_total_depth.saturating_sub(pps.max_cu_dqp_depth) as usize) << 1
    }

    pub fn get_last_valid_part_idx(&self, abs_part_idx: isize) -> isize {
        let mut idx = abs_part_idx - 1;
        while idx >= 0
            && self.pred_mode[idx as usize] == PredMode::NUMBER_OF_PREDICTION_MODES as u8
        {
            let d = self.depth[idx as usize];
            idx -= self.geom.num_part_at(d).max(1) as isize;
        }
        idx
    }

    pub fn get_last_coded_qp(
        &self,
        abs_part_idx: usize,
        ctus: &[HevcCUData],
        pps: &HevcPps,
        slice: &HevcSlice,
    ) -> i8 {
        let mask = !((1usize << self.qg_shift(pps)) - 1);
        let last_valid = self.get_last_valid_part_idx((abs_part_idx & mask) as isize);

        if abs_part_idx < self.num_partition
            && (self.scu_addr() as isize + last_valid)
                < self.slice_start_cu[abs_part_idx] as isize
        {
            slice.slice_qp as i8
        } else if last_valid >= 0 {
            self.qp[last_valid as usize]
        } else if self.abs_idx_in_lcu > 0 {
            ctus[self.cu_addr].get_last_coded_qp(self.abs_idx_in_lcu, ctus, pps, slice)
        } else if self.cu_addr > 0
            && !(pps.entropy_coding_sync && self.cu_addr % self.geom.frame_width_in_ctu == 0)
        {
            ctus[self.cu_addr - 1].get_last_coded_qp(self.geom.num_part_in_ctu, ctus, pps, slice)
        } else {
            slice.slice_qp as i8
        }
    }

    /* left neighbour partition of the quantisation group, inside the CTU only */
    fn qp_min_cu_left(&self, curr_abs_idx_in_lcu: usize, pps: &HevcPps) -> Option<usize> {
        let shift = self.qg_shift(pps);
        let md = self.geom.max_total_depth;
        let raster = zscan_to_raster(md, (curr_abs_idx_in_lcu >> shift) << shift);
        if raster % self.geom.num_part_in_width() == 0 {
            None
        } else {
            Some(raster_to_zscan(md, raster - 1))
        }
    }

    fn qp_min_cu_above(&self, curr_abs_idx_in_lcu: usize, pps: &HevcPps) -> Option<usize> {
        let shift = self.qg_shift(pps);
        let md = self.geom.max_total_depth;
        let width = self.geom.num_part_in_width();
        let raster = zscan_to_raster(md, (curr_abs_idx_in_lcu >> shift) << shift);
        if raster < width {
            None
        } else {
            Some(raster_to_zscan(md, raster - width))
        }
    }

    /* predicted QP of the quantisation group holding partition idx */
    pub fn get_ref_qp(&self, idx: usize, ctus: &[HevcCUData], pps: &HevcPps, slice: &HevcSlice) -> i8 {
        let pos = self.abs_idx_in_lcu + idx;
        let ctu = &ctus[self.cu_addr];
        let last = self.get_last_coded_qp(idx, ctus, pps, slice) as i32;
        let left = self
            .qp_min_cu_left(pos, pps)
            .map_or(last, |l| ctu.qp[l] as i32);
        let above = self
            .qp_min_cu_above(pos, pps)
            .map_or(last, |a| ctu.qp[a] as i32);
        ((left + above + 1) >> 1) as i8
    }

    /* push qp into every residual-free CU under abs_part_idx until one with residual is met */
    pub fn set_qp_sub_cus(&mut self, qp: i32, abs_part_idx: usize, depth: u8, found_non_zero_cbf: &mut bool) {
        if *found_non_zero_cbf {
            return;
        }
        let q = self.geom.num_part_at(depth) >> 2;
        if self.depth[abs_part_idx] > depth {
            for part in 0..4 {
                self.set_qp_sub_cus(qp, abs_part_idx + part * q, depth + 1, found_non_zero_cbf);
            }
        } else if (0..self.num_comps()).any(|c| self.cbf[c][abs_part_idx] != 0) {
            *found_non_zero_cbf = true;
        } else {
            self.set_qp_sub_parts(qp, abs_part_idx, depth);
        }
    }
}
