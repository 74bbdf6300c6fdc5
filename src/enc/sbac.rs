use super::bsw::*;
use super::util::*;
use crate::api::*;
use crate::com::tracer::*;
use crate::com::*;

pub type HevcSbacModel = u16;

/* state 256 of 512 with mps 0 */
pub const PROB_INIT: HevcSbacModel = 512;

const NUM_CTX_SPLIT_FLAG: usize = 3;
const NUM_CTX_PART_SIZE: usize = 4;
const NUM_CTX_INTER_DIR: usize = 5;
const NUM_CTX_REF_IDX: usize = 2;
const NUM_CTX_MVD: usize = 2;
const NUM_CTX_QT_CBF: usize = 2;
const NUM_CTX_SIG: usize = 2;
const NUM_CTX_DELTA_QP: usize = 2;

/* terminating bin cost in 1/32768 bit, indexed by the bin */
const TRM_BITS: [u64; 2] = [0x0010c, 0x3bfbb];

/* context models of the CU level syntax */
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HevcSbacCtx {
    pub split_flag: [HevcSbacModel; NUM_CTX_SPLIT_FLAG],
    pub skip_flag: HevcSbacModel,
    pub bg_skip_flag: HevcSbacModel,
    pub transquant_bypass_flag: HevcSbacModel,
    pub merge_flag: HevcSbacModel,
    pub merge_idx: HevcSbacModel,
    pub part_size: [HevcSbacModel; NUM_CTX_PART_SIZE],
    pub pred_mode: HevcSbacModel,
    pub intra_bc_flag: HevcSbacModel,
    pub intra_luma_mpm: HevcSbacModel,
    pub intra_chroma: HevcSbacModel,
    pub inter_dir: [HevcSbacModel; NUM_CTX_INTER_DIR],
    pub ref_idx: [HevcSbacModel; NUM_CTX_REF_IDX],
    pub mvd: [HevcSbacModel; NUM_CTX_MVD],
    pub mvp_idx: HevcSbacModel,
    pub qt_root_cbf: HevcSbacModel,
    pub qt_cbf: [HevcSbacModel; NUM_CTX_QT_CBF],
    pub sig: [HevcSbacModel; NUM_CTX_SIG],
    pub gt1: HevcSbacModel,
    pub delta_qp: [HevcSbacModel; NUM_CTX_DELTA_QP],
}

impl Default for HevcSbacCtx {
    fn default() -> Self {
        HevcSbacCtx {
            split_flag: [PROB_INIT; NUM_CTX_SPLIT_FLAG],
            skip_flag: PROB_INIT,
            bg_skip_flag: PROB_INIT,
            transquant_bypass_flag: PROB_INIT,
            merge_flag: PROB_INIT,
            merge_idx: PROB_INIT,
            part_size: [PROB_INIT; NUM_CTX_PART_SIZE],
            pred_mode: PROB_INIT,
            intra_bc_flag: PROB_INIT,
            intra_luma_mpm: PROB_INIT,
            intra_chroma: PROB_INIT,
            inter_dir: [PROB_INIT; NUM_CTX_INTER_DIR],
            ref_idx: [PROB_INIT; NUM_CTX_REF_IDX],
            mvd: [PROB_INIT; NUM_CTX_MVD],
            mvp_idx: PROB_INIT,
            qt_root_cbf: PROB_INIT,
            qt_cbf: [PROB_INIT; NUM_CTX_QT_CBF],
            sig: [PROB_INIT; NUM_CTX_SIG],
            gt1: PROB_INIT,
            delta_qp: [PROB_INIT; NUM_CTX_DELTA_QP],
        }
    }
}

/* snapshot of an entropy coder: models plus the running bit estimate */
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HevceSbacState {
    pub ctx: HevcSbacCtx,
    frac_bits: u64,
    bin_counter: u32,
}

fn update_model(model: &mut HevcSbacModel, bin: u32) {
    let mut state = *model >> 1;
    let mut mps = *model & 1;
    if bin != mps as u32 {
        state = state + ((512 - state + 16) >> 5);
        if state > 256 {
            mps = 1 - mps;
            state = 512 - state;
        }
    } else {
        state = state - ((state + 16) >> 5);
    }
    *model = (state << 1) + mps;
}

/* binary arithmetic coder; in bit count mode only fractional bits are accumulated */
struct HevceBinCoder {
    range: u32,
    code: u32,
    code_bits: u32,
    stacked_ff: u32,
    stacked_zero: u32,
    pending_byte: u32,
    is_pending_byte: u32,
    bin_counter: u32,
    /* 1/32768 bit units */
    frac_bits: u64,
    is_bitcount: bool,
    bits_base: u32,
    bs: HevceBsw,
}

impl HevceBinCoder {
    fn new(is_bitcount: bool) -> Self {
        HevceBinCoder {
            range: 16384,
            code: 0,
            code_bits: 11,
            stacked_ff: 0,
            stacked_zero: 0,
            pending_byte: 0,
            is_pending_byte: 0,
            bin_counter: 0,
            frac_bits: 0,
            is_bitcount,
            bits_base: 0,
            bs: HevceBsw::new(),
        }
    }

    fn reset(&mut self) {
        self.range = 16384;
        self.code = 0;
        self.code_bits = 11;
        self.pending_byte = 0;
        self.is_pending_byte = 0;
        self.stacked_ff = 0;
        self.stacked_zero = 0;
    }

    fn total_bits(&self) -> u32 {
        if self.is_bitcount {
            return (self.frac_bits / BITS_SCALE) as u32;
        }
        self.bs.num_bits()
            + 8 * (self.is_pending_byte + self.stacked_ff + self.stacked_zero)
            + 11u32.saturating_sub(self.code_bits)
    }

    fn reset_bits(&mut self) {
        if self.is_bitcount {
            self.frac_bits &= BITS_SCALE - 1;
        } else {
            self.bits_base = self.total_bits();
        }
        self.bin_counter = 0;
    }

    fn num_written_bits(&self) -> u32 {
        self.total_bits().saturating_sub(self.bits_base)
    }

    fn renorm(&mut self) {
        while self.range < 8192 {
            self.range <<= 1;
            self.code <<= 1;
            self.code_bits -= 1;
            if self.code_bits == 0 {
                self.carry_propagate();
                self.code_bits = 8;
            }
        }
    }

    fn encode_bin(&mut self, model: &mut HevcSbacModel, bin: u32) {
        self.bin_counter += 1;

        if self.is_bitcount {
            self.frac_bits += biari_no_bits(bin, *model) as u64;
            update_model(model, bin);
            return;
        }

        let state = (*model >> 1) as u32;
        let mps = (*model & 1) as u32;
        let lps = ((state * self.range) >> 9).max(437);
        self.range -= lps;

        TRACE_BIN(&mut self.bs.tracer, *model, self.range, lps);

        if bin != mps {
            self.code += self.range;
            self.range = lps;
        }
        update_model(model, bin);
        self.renorm();
    }

    fn encode_bin_ep(&mut self, bin: u32) {
        self.bin_counter += 1;

        if self.is_bitcount {
            self.frac_bits += BITS_SCALE;
            return;
        }

        self.range >>= 1;
        if bin != 0 {
            self.code += self.range;
        }
        self.range <<= 1;
        self.code <<= 1;

        self.code_bits -= 1;
        if self.code_bits == 0 {
            self.carry_propagate();
            self.code_bits = 8;
        }
    }

    fn encode_bins_ep(&mut self, value: u32, num_bin: u32) {
        for b in (0..num_bin).rev() {
            self.encode_bin_ep((value >> b) & 1);
        }
    }

    fn encode_bin_trm(&mut self, bin: u32) {
        self.bin_counter += 1;

        if self.is_bitcount {
            self.frac_bits += TRM_BITS[(bin != 0) as usize];
            return;
        }

        self.range -= 1;
        if bin != 0 {
            self.code += self.range;
            self.range = 1;
        }
        self.renorm();
    }

    /* k-th order Exp-Golomb, bypass coded */
    fn encode_ep_ex_golomb(&mut self, mut symbol: u32, mut count: u32) {
        while symbol >= (1 << count) {
            self.encode_bin_ep(1);
            symbol -= 1 << count;
            count += 1;
        }
        self.encode_bin_ep(0);
        self.encode_bins_ep(symbol, count);
    }

    fn finish(&mut self) {
        if self.is_bitcount {
            return;
        }

        let mut tmp = (self.code + self.range - 1) & (0xFFFFFFFF << 14);
        if tmp < self.code {
            tmp += 8192;
        }

        self.code = tmp << self.code_bits;
        self.carry_propagate();

        self.code <<= 8;
        self.carry_propagate();

        while self.stacked_zero > 0 {
            self.bs.write(0x00, 8, None);
            self.stacked_zero -= 1;
        }

        if self.pending_byte != 0 {
            self.bs.write(self.pending_byte, 8, None);
        } else if self.code_bits < 4 {
            self.bs.write(0, 4 - self.code_bits as isize, None);
            while !self.bs.IS_BYTE_ALIGN() {
                self.bs.write1(0, None);
            }
        }
        self.is_pending_byte = 0;
        self.pending_byte = 0;
    }

    fn carry_propagate(&mut self) {
        let out_bits = self.code >> 17;

        self.code &= (1 << 17) - 1;

        if out_bits < 0xFF {
            while self.stacked_ff != 0 {
                self.put_byte(0xFF);
                self.stacked_ff -= 1;
            }
            self.put_byte(out_bits as u8);
        } else if out_bits > 0xFF {
            self.pending_byte += 1;
            while self.stacked_ff != 0 {
                self.put_byte(0x00);
                self.stacked_ff -= 1;
            }
            self.put_byte((out_bits & 0xFF) as u8);
        } else {
            self.stacked_ff += 1;
        }
    }

    fn put_byte(&mut self, writing_byte: u8) {
        if self.is_pending_byte != 0 {
            if self.pending_byte == 0 {
                self.stacked_zero += 1;
            } else {
                while self.stacked_zero > 0 {
                    self.bs.write(0x00, 8, None);
                    self.stacked_zero -= 1;
                }
                self.bs.write(self.pending_byte, 8, None);
            }
        }
        self.pending_byte = writing_byte as u32;
        self.is_pending_byte = 1;
    }

    /* raw samples after flushing the arithmetic coder, then restart it */
    fn write_pcm_samples(&mut self, samples: &[pel], bit_depth: u8) {
        if self.is_bitcount {
            self.frac_bits += samples.len() as u64 * bit_depth as u64 * BITS_SCALE;
            return;
        }
        for s in samples {
            self.bs.write(*s as u32, bit_depth as isize, None);
        }
    }
}

/* CU level syntax writer and estimator */
pub struct HevceSbac {
    core: HevceBinCoder,
    ctx: HevcSbacCtx,

    max_cu_depth: u8,
    use_amp: bool,
    max_num_merge_cand: u8,
    pcm_bit_depth: [u8; 2],
    chroma: ChromaSampling,
}

impl HevceSbac {
    fn with_mode(sps: &HevcSps, is_bitcount: bool) -> Self {
        HevceSbac {
            core: HevceBinCoder::new(is_bitcount),
            ctx: HevcSbacCtx::default(),
            max_cu_depth: sps.max_cu_depth(),
            use_amp: sps.use_amp,
            max_num_merge_cand: sps.max_num_merge_cand,
            pcm_bit_depth: [sps.pcm_bit_depth_luma, sps.pcm_bit_depth_chroma],
            chroma: sps.chroma_format,
        }
    }

    /* fractional bit estimator for RD decisions */
    pub fn new_estimator(sps: &HevcSps) -> Self {
        HevceSbac::with_mode(sps, true)
    }

    /* arithmetic coder producing bytes */
    pub fn new_writer(sps: &HevcSps) -> Self {
        let mut sbac = HevceSbac::with_mode(sps, false);
        sbac.core.bs.init();
        sbac
    }

    /* slice start: models and coder state back to initial */
    pub fn reset(&mut self) {
        self.core.reset();
        self.core.frac_bits = 0;
        self.core.bin_counter = 0;
        self.core.bits_base = 0;
        self.ctx = HevcSbacCtx::default();
    }

    pub fn is_bitcount(&self) -> bool {
        self.core.is_bitcount
    }

    pub fn ctx(&self) -> &HevcSbacCtx {
        &self.ctx
    }

    /* bytes written so far in writer mode */
    pub fn data(&self) -> &[u8] {
        self.core.bs.data()
    }

    fn code_mvd_comp(&mut self, v: i32) {
        let a = v.abs() as u32;
        if a > 1 {
            self.core.encode_ep_ex_golomb(a - 2, 1);
        }
        if a > 0 {
            self.core.encode_bin_ep((v < 0) as u32);
        }
    }

    fn comp_samples(&self, cu: &HevcCUData, abs_part_idx: usize, comp: usize) -> (usize, usize) {
        let w = cu.width(abs_part_idx) as usize;
        let h = cu.height(abs_part_idx) as usize;
        if comp == Y_C {
            (cu.coeff_offset(abs_part_idx, comp), w * h)
        } else {
            let (sx, sy) = self.chroma.shift();
            (cu.coeff_offset(abs_part_idx, comp), (w >> sx) * (h >> sy))
        }
    }
}

const INTRA_MPM: [u8; 3] = [PLANAR_IDX, DC_IDX, 26];
const CHROMA_MODES: [u8; 4] = [PLANAR_IDX, 26, 10, DC_IDX];

impl EntropyCoder for HevceSbac {
    type Context = HevceSbacState;

    fn save_context(&self) -> HevceSbacState {
        HevceSbacState {
            ctx: self.ctx,
            frac_bits: self.core.frac_bits,
            bin_counter: self.core.bin_counter,
        }
    }

    fn load_context(&mut self, state: &HevceSbacState) {
        self.ctx = state.ctx;
        if self.core.is_bitcount {
            self.core.frac_bits = state.frac_bits;
            self.core.bin_counter = state.bin_counter;
        }
    }

    fn reset_bits(&mut self) {
        self.core.reset_bits();
    }

    fn num_written_bits(&self) -> u32 {
        self.core.num_written_bits()
    }

    fn num_bins_coded(&self) -> u32 {
        self.core.bin_counter
    }

    fn encode_split_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize, depth: u8) {
        let bin = (cu.depth(abs_part_idx) > depth) as u32;
        let c = (depth as usize).min(NUM_CTX_SPLIT_FLAG - 1);
        self.core.encode_bin(&mut self.ctx.split_flag[c], bin);
    }

    fn encode_bg_skip_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let bin = cu.bg_skip_flag(abs_part_idx) as u32;
        self.core.encode_bin(&mut self.ctx.bg_skip_flag, bin);
    }

    fn encode_cu_transquant_bypass_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let bin = cu.cu_transquant_bypass(abs_part_idx) as u32;
        self.core.encode_bin(&mut self.ctx.transquant_bypass_flag, bin);
    }

    fn encode_skip_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let bin = cu.skip_flag(abs_part_idx) as u32;
        self.core.encode_bin(&mut self.ctx.skip_flag, bin);
    }

    fn encode_merge_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let bin = cu.merge_flag(abs_part_idx) as u32;
        self.core.encode_bin(&mut self.ctx.merge_flag, bin);
    }

    /* truncated unary, first bin context coded */
    fn encode_merge_index(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let num_cand = self.max_num_merge_cand as u32;
        if num_cand <= 1 {
            return;
        }
        let idx = cu.merge_index(abs_part_idx) as u32;
        for i in 0..num_cand - 1 {
            let bin = (i < idx) as u32;
            if i == 0 {
                self.core.encode_bin(&mut self.ctx.merge_idx, bin);
            } else {
                self.core.encode_bin_ep(bin);
            }
            if bin == 0 {
                break;
            }
        }
    }

    fn encode_intra_bc_flag(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let bin = cu.is_intra_bc(abs_part_idx) as u32;
        self.core.encode_bin(&mut self.ctx.intra_bc_flag, bin);
    }

    fn encode_intra_bc(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        self.encode_mvd(cu, abs_part_idx, REF_PIC_LIST_INTRABC);
    }

    fn encode_pred_mode(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let bin = cu.is_intra(abs_part_idx) as u32;
        self.core.encode_bin(&mut self.ctx.pred_mode, bin);
    }

    fn encode_part_size(&mut self, cu: &HevcCUData, abs_part_idx: usize, depth: u8) {
        use PartSize::*;
        let part_size = cu.part_size(abs_part_idx);
        let at_min = depth == self.max_cu_depth;
        let is_8x8 = cu.width(abs_part_idx) == 8 && cu.height(abs_part_idx) == 8;
        let amp = self.use_amp && depth < self.max_cu_depth;
        let HevceSbac { core, ctx, .. } = self;

        if cu.is_intra(abs_part_idx) {
            if at_min {
                core.encode_bin(&mut ctx.part_size[0], (part_size == SIZE_2Nx2N) as u32);
            }
            return;
        }

        match part_size {
            SIZE_2Nx2N => core.encode_bin(&mut ctx.part_size[0], 1),
            SIZE_2NxN | SIZE_2NxnU | SIZE_2NxnD => {
                core.encode_bin(&mut ctx.part_size[0], 0);
                core.encode_bin(&mut ctx.part_size[1], 1);
                if amp {
                    if part_size == SIZE_2NxN {
                        core.encode_bin(&mut ctx.part_size[3], 1);
                    } else {
                        core.encode_bin(&mut ctx.part_size[3], 0);
                        core.encode_bin_ep((part_size != SIZE_2NxnU) as u32);
                    }
                }
            }
            SIZE_Nx2N | SIZE_nLx2N | SIZE_nRx2N => {
                core.encode_bin(&mut ctx.part_size[0], 0);
                core.encode_bin(&mut ctx.part_size[1], 0);
                if at_min && !is_8x8 {
                    core.encode_bin(&mut ctx.part_size[2], 1);
                }
                if amp {
                    if part_size == SIZE_Nx2N {
                        core.encode_bin(&mut ctx.part_size[3], 1);
                    } else {
                        core.encode_bin(&mut ctx.part_size[3], 0);
                        core.encode_bin_ep((part_size != SIZE_nLx2N) as u32);
                    }
                }
            }
            SIZE_NxN => {
                if at_min && !is_8x8 {
                    core.encode_bin(&mut ctx.part_size[0], 0);
                    core.encode_bin(&mut ctx.part_size[1], 0);
                    core.encode_bin(&mut ctx.part_size[2], 0);
                }
            }
            NUMBER_OF_PART_SIZES => {}
        }
    }

    fn encode_ipcm_info(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let ipcm = cu.ipcm_flag(abs_part_idx);
        self.core.encode_bin_trm(ipcm as u32);
        if !ipcm {
            return;
        }

        self.core.finish();
        let num_comps = self.chroma.num_comps();
        for comp in 0..num_comps {
            let (off, n) = self.comp_samples(cu, abs_part_idx, comp);
            let depth = self.pcm_bit_depth[(comp != Y_C) as usize];
            self.core
                .write_pcm_samples(&cu.pcm_sample(comp)[off..off + n], depth);
        }
        self.core.reset();
    }

    fn encode_intra_dir_luma(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let dir = cu.intra_dir(0, abs_part_idx);
        if let Some(i) = INTRA_MPM.iter().position(|&m| m == dir) {
            self.core.encode_bin(&mut self.ctx.intra_luma_mpm, 1);
            self.core.encode_bin_ep((i > 0) as u32);
            if i > 0 {
                self.core.encode_bin_ep((i > 1) as u32);
            }
        } else {
            self.core.encode_bin(&mut self.ctx.intra_luma_mpm, 0);
            let mut sorted = INTRA_MPM;
            sorted.sort_unstable();
            let mut rem = dir;
            for m in sorted.iter().rev() {
                if rem > *m {
                    rem -= 1;
                }
            }
            self.core.encode_bins_ep(rem as u32, 5);
        }
    }

    fn encode_intra_dir_chroma(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let dir = cu.intra_dir(1, abs_part_idx);
        if dir == DM_CHROMA_IDX {
            self.core.encode_bin(&mut self.ctx.intra_chroma, 0);
        } else {
            self.core.encode_bin(&mut self.ctx.intra_chroma, 1);
            let idx = CHROMA_MODES.iter().position(|&m| m == dir).unwrap_or(0);
            self.core.encode_bins_ep(idx as u32, 2);
        }
    }

    /* 1 = L0, 2 = L1, 3 = bi */
    fn encode_inter_dir(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let dir = cu.inter_dir(abs_part_idx) as u32;
        let depth = cu.depth(abs_part_idx) as usize;
        let (_, w, h) = cu.part_index_and_size(abs_part_idx, 0);
        if w + h != 12 {
            let c = depth.min(NUM_CTX_INTER_DIR - 2);
            self.core.encode_bin(&mut self.ctx.inter_dir[c], (dir == 3) as u32);
        }
        if dir != 3 {
            self.core
                .encode_bin(&mut self.ctx.inter_dir[NUM_CTX_INTER_DIR - 1], dir - 1);
        }
    }

    fn encode_ref_frm_idx(&mut self, cu: &HevcCUData, abs_part_idx: usize, list: usize) {
        let ref_idx = cu.mv_field(list).ref_idx(abs_part_idx).max(0) as u32;
        self.core.encode_bin(&mut self.ctx.ref_idx[0], (ref_idx > 0) as u32);
        if ref_idx == 0 {
            return;
        }
        self.core.encode_bin(&mut self.ctx.ref_idx[1], (ref_idx > 1) as u32);
        if ref_idx == 1 {
            return;
        }
        for _ in 2..ref_idx {
            self.core.encode_bin_ep(1);
        }
        self.core.encode_bin_ep(0);
    }

    fn encode_mvd(&mut self, cu: &HevcCUData, abs_part_idx: usize, list: usize) {
        let mvd = cu.mv_field(list).mvd(abs_part_idx);
        let (hor, ver) = (mvd.hor as i32, mvd.ver as i32);

        self.core.encode_bin(&mut self.ctx.mvd[0], (hor != 0) as u32);
        self.core.encode_bin(&mut self.ctx.mvd[0], (ver != 0) as u32);
        if hor != 0 {
            self.core.encode_bin(&mut self.ctx.mvd[1], (hor.abs() > 1) as u32);
        }
        if ver != 0 {
            self.core.encode_bin(&mut self.ctx.mvd[1], (ver.abs() > 1) as u32);
        }
        self.code_mvd_comp(hor);
        self.code_mvd_comp(ver);
    }

    fn encode_mvp_idx(&mut self, cu: &HevcCUData, abs_part_idx: usize, list: usize) {
        let idx = cu.mvp_idx(list, abs_part_idx).max(0) as u32;
        self.core.encode_bin(&mut self.ctx.mvp_idx, (idx > 0) as u32);
    }

    fn encode_qt_root_cbf(&mut self, cu: &HevcCUData, abs_part_idx: usize) {
        let bin = cu.qt_root_cbf(abs_part_idx) as u32;
        self.core.encode_bin(&mut self.ctx.qt_root_cbf, bin);
    }

    fn encode_qt_cbf(&mut self, cu: &HevcCUData, abs_part_idx: usize, comp: usize) {
        let bin = cu.cbf_at_depth(abs_part_idx, comp, 0) as u32;
        let c = (comp == Y_C) as usize;
        self.core.encode_bin(&mut self.ctx.qt_cbf[c], bin);
    }

    fn encode_coeff_nxn(&mut self, cu: &HevcCUData, abs_part_idx: usize, comp: usize) {
        let (off, n) = self.comp_samples(cu, abs_part_idx, comp);
        let coeff = &cu.coeff(comp)[off..off + n];
        let HevceSbac { core, ctx, .. } = self;
        for (i, c) in coeff.iter().enumerate() {
            let a = c.abs() as u32;
            core.encode_bin(&mut ctx.sig[(i != 0) as usize], (a != 0) as u32);
            if a == 0 {
                continue;
            }
            core.encode_bin(&mut ctx.gt1, (a > 1) as u32);
            core.encode_bin_ep((*c < 0) as u32);
            if a > 1 {
                core.encode_ep_ex_golomb(a - 2, 0);
            }
        }
    }

    fn encode_delta_qp(&mut self, dqp: i32) {
        let abs_dqp = dqp.abs() as u32;
        let tu_value = abs_dqp.min(CU_DQP_TU_CMAX);

        /* unary capped at CU_DQP_TU_CMAX */
        self.core.encode_bin(&mut self.ctx.delta_qp[0], (tu_value != 0) as u32);
        if tu_value != 0 {
            for _ in 1..tu_value {
                self.core.encode_bin(&mut self.ctx.delta_qp[1], 1);
            }
            if tu_value < CU_DQP_TU_CMAX {
                self.core.encode_bin(&mut self.ctx.delta_qp[1], 0);
            }
        }

        if abs_dqp >= CU_DQP_TU_CMAX {
            self.core
                .encode_ep_ex_golomb(abs_dqp - CU_DQP_TU_CMAX, CU_DQP_EG_K);
        }
        if abs_dqp > 0 {
            self.core.encode_bin_ep((dqp < 0) as u32);
        }
    }

    fn encode_terminating_bit(&mut self, last: bool) {
        self.core.encode_bin_trm(last as u32);
    }

    fn encode_slice_finish(&mut self) {
        self.core.finish();
        if !self.core.is_bitcount {
            self.core.bs.flush();
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::com::cu::*;
    use pretty_assertions::assert_eq;

    fn sps() -> HevcSps {
        HevcSps::new(64, 64, 64, 4)
    }

    fn ctu(sps: &HevcSps) -> HevcCUData {
        let geom = HevcCuGeom::new(sps);
        let slice = HevcSlice::new(sps, SliceType::P_SLICE, 30, 10.0);
        let pic = HevcCUData::new(geom, 0);
        let mut cu = HevcCUData::new(geom, 0);
        cu.init_cu(&pic, &slice, 0);
        cu
    }

    #[test]
    fn bypass_bins_cost_one_bit_each() {
        let sps = sps();
        let mut sbac = HevceSbac::new_estimator(&sps);
        sbac.reset_bits();
        sbac.core.encode_bins_ep(0b10110, 5);
        assert_eq!(sbac.num_written_bits(), 5);
        assert_eq!(sbac.num_bins_coded(), 5);
    }

    #[test]
    fn fresh_context_costs_about_a_bit() {
        let sps = sps();
        let cu = ctu(&sps);
        let mut sbac = HevceSbac::new_estimator(&sps);
        sbac.reset_bits();
        for _ in 0..8 {
            sbac.encode_split_flag(&cu, 0, 0);
        }
        // adaptation makes repeated bins cheaper
        let bits = sbac.num_written_bits();
        assert!(bits >= 4 && bits <= 8, "{}", bits);
    }

    #[test]
    fn load_context_restores_estimate() {
        let sps = sps();
        let mut cu = ctu(&sps);
        cu.set_skip_flag_sub_parts(true, 0, 0);
        let mut sbac = HevceSbac::new_estimator(&sps);
        let start = sbac.save_context();

        sbac.reset_bits();
        sbac.encode_skip_flag(&cu, 0);
        sbac.encode_delta_qp(-7);
        let first = sbac.num_written_bits();
        assert!(sbac.ctx() != &start.ctx);

        sbac.load_context(&start);
        sbac.reset_bits();
        sbac.encode_skip_flag(&cu, 0);
        sbac.encode_delta_qp(-7);
        assert_eq!(sbac.num_written_bits(), first);
    }

    #[test]
    fn terminating_bin_costs() {
        let sps = sps();
        let mut sbac = HevceSbac::new_estimator(&sps);
        sbac.reset_bits();
        sbac.encode_terminating_bit(false);
        assert_eq!(sbac.num_written_bits(), 0);
        sbac.encode_terminating_bit(true);
        assert_eq!(sbac.num_written_bits(), 7);
    }

    #[test]
    fn pcm_counts_raw_samples() {
        let mut sps = sps();
        sps.chroma_format = ChromaSampling::Cs400;
        let mut cu = ctu(&sps);
        cu.set_ipcm_flag_sub_parts(true, 0, 2);
        cu.set_size_sub_parts(16, 16, 0, 2);
        let mut sbac = HevceSbac::new_estimator(&sps);
        sbac.reset_bits();
        sbac.encode_ipcm_info(&cu, 0);
        assert_eq!(sbac.num_written_bits(), 16 * 16 * 8 + 7);
    }

    #[test]
    fn writer_emits_bytes() {
        let sps = sps();
        let cu = ctu(&sps);
        let mut sbac = HevceSbac::new_writer(&sps);
        assert!(!sbac.is_bitcount());
        sbac.reset_bits();
        for _ in 0..64 {
            sbac.encode_split_flag(&cu, 0, 0);
            sbac.core.encode_bins_ep(0x5, 3);
        }
        sbac.encode_terminating_bit(true);
        sbac.encode_slice_finish();
        assert!(sbac.data().len() >= 20);
        assert!(sbac.num_written_bits() >= 20 * 8);
    }
}
