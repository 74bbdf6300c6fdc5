use super::sbac::HevcSbacModel;
use crate::api::*;
use crate::com::*;

lazy_static! {
    /* cost in 1/32768 bit of a symbol of probability i/1024 */
    pub(crate) static ref entropy_bits: Box<[i32]> = {
        let mut bits = vec![0; 1024].into_boxed_slice();
        for i in 0..1024 {
            let p = (512.0 * (i as f64 + 0.5)) / 1024.0;
            bits[i] = (-32768.0 * (p.log10() / (2.0f64).log10() - 9.0)) as i32;
        }
        bits
    };
}

pub(crate) const BITS_SCALE: u64 = 32768;

pub(crate) fn biari_no_bits(symbol: u32, cm: HevcSbacModel) -> i32 {
    let mps = (cm & 1) as u32;
    let mut state = cm >> 1;
    let sym = if symbol != 0 { 1 } else { 0 };
    state = if sym != mps { state } else { 512 - state };

    entropy_bits[((state as usize) << 1).min(1023)]
}

/* sum of absolute 8x8 Hadamard coefficients, DC excluded */
pub(crate) fn hevce_had_8x8(org: &[pel], stride: usize) -> i32 {
    let mut diff = [0i32; 64];
    let mut m1 = [[0i32; 8]; 8];
    let mut m2 = [[0i32; 8]; 8];
    let mut m3 = [[0i32; 8]; 8];

    for j in 0..8 {
        for i in 0..8 {
            diff[j * 8 + i] = org[j * stride + i] as i32;
        }
    }

    //horizontal
    for j in 0..8 {
        let jj = j << 3;
        for i in 0..4 {
            m2[j][i] = diff[jj + i] + diff[jj + i + 4];
            m2[j][i + 4] = diff[jj + i] - diff[jj + i + 4];
        }

        m1[j][0] = m2[j][0] + m2[j][2];
        m1[j][1] = m2[j][1] + m2[j][3];
        m1[j][2] = m2[j][0] - m2[j][2];
        m1[j][3] = m2[j][1] - m2[j][3];
        m1[j][4] = m2[j][4] + m2[j][6];
        m1[j][5] = m2[j][5] + m2[j][7];
        m1[j][6] = m2[j][4] - m2[j][6];
        m1[j][7] = m2[j][5] - m2[j][7];

        for i in 0..4 {
            m2[j][2 * i] = m1[j][2 * i] + m1[j][2 * i + 1];
            m2[j][2 * i + 1] = m1[j][2 * i] - m1[j][2 * i + 1];
        }
    }

    //vertical
    for i in 0..8 {
        for j in 0..4 {
            m3[j][i] = m2[j][i] + m2[j + 4][i];
            m3[j + 4][i] = m2[j][i] - m2[j + 4][i];
        }

        m1[0][i] = m3[0][i] + m3[2][i];
        m1[1][i] = m3[1][i] + m3[3][i];
        m1[2][i] = m3[0][i] - m3[2][i];
        m1[3][i] = m3[1][i] - m3[3][i];
        m1[4][i] = m3[4][i] + m3[6][i];
        m1[5][i] = m3[5][i] + m3[7][i];
        m1[6][i] = m3[4][i] - m3[6][i];
        m1[7][i] = m3[5][i] - m3[7][i];

        for j in 0..4 {
            m2[2 * j][i] = m1[2 * j][i] + m1[2 * j + 1][i];
            m2[2 * j + 1][i] = m1[2 * j][i] - m1[2 * j + 1][i];
        }
    }

    let mut sum_had: i32 = m2.iter().flatten().map(|v| v.abs()).sum();
    sum_had -= m2[0][0].abs();
    (sum_had + 2) >> 2
}

/* I-slice complexity of a w x h luma area, whole 8x8 blocks only */
pub(crate) fn hevce_lcu_intra_cost(org: &HevcYuv, width: usize, height: usize) -> i32 {
    let stride = org.width(Y_C);
    let plane = org.plane(Y_C);
    let mut sum = 0;
    let mut y = 0;
    while y + 8 <= height {
        let mut x = 0;
        while x + 8 <= width {
            sum += hevce_had_8x8(&plane[y * stride + x..], stride);
            x += 8;
        }
        y += 8;
    }
    sum
}

/* smaller of the horizontal and vertical gradient activity of a luma block */
pub(crate) fn hevce_min_hv_activity(org: &HevcYuv, width: usize, height: usize) -> i32 {
    let stride = org.width(Y_C);
    let p = org.plane(Y_C);

    let mut h_act = 0i32;
    for y in 0..height {
        for x in 1..width {
            h_act += (p[y * stride + x] as i32 - p[y * stride + x - 1] as i32).abs();
        }
    }

    let mut v_act = 0i32;
    for y in 1..height {
        for x in 0..width {
            v_act += (p[y * stride + x] as i32 - p[(y - 1) * stride + x] as i32).abs();
        }
    }

    h_act.min(v_act)
}

/* per level coefficient statistics for adaptive reconstruction levels */
#[derive(Debug, Clone)]
pub struct HevceArlStats {
    pub sum_c: [f64; LEVEL_RANGE + 1],
    pub num_samples: [u32; LEVEL_RANGE + 1],
}

impl Default for HevceArlStats {
    fn default() -> Self {
        HevceArlStats {
            sum_c: [0.0; LEVEL_RANGE + 1],
            num_samples: [0; LEVEL_RANGE + 1],
        }
    }
}

impl HevceArlStats {
    pub fn reset(&mut self) {
        *self = HevceArlStats::default();
    }

    fn collect_tu(&mut self, coeff: &[coef], arl_coeff: &[coef]) {
        for (c, absc) in coeff.iter().zip(arl_coeff.iter()) {
            let u = c.abs();
            if u == 0 {
                continue;
            }
            if (u as usize) < LEVEL_RANGE {
                self.sum_c[u as usize] += *absc as f64;
                self.num_samples[u as usize] += 1;
            } else {
                self.sum_c[LEVEL_RANGE] += *absc as f64 - (u << ARL_C_PRECISION) as f64;
                self.num_samples[LEVEL_RANGE] += 1;
            }
        }
    }

    /* luma of inter partitions with residual only */
    pub(crate) fn collect_lcu(&mut self, ctu: &HevcCUData) {
        let unit = ctu.geom().unit_size as usize;
        let n = unit * unit;
        let coeff = ctu.coeff(Y_C);
        let arl = ctu.arl_coeff(Y_C);
        for i in 0..ctu.total_num_part() {
            if ctu.is_inter(i) && ctu.cbf_at_depth(i, Y_C, ctu.transform_idx(i)) != 0 {
                self.collect_tu(&coeff[i * n..(i + 1) * n], &arl[i * n..(i + 1) * n]);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flat_block_has_no_ac_energy() {
        let blk = vec![100 as pel; 64];
        assert_eq!(hevce_had_8x8(&blk, 8), 0);
    }

    #[test]
    fn single_impulse_spreads_evenly() {
        let mut blk = vec![0 as pel; 64];
        blk[0] = 4;
        // every coefficient is +-4, 63 of them without DC
        assert_eq!(hevce_had_8x8(&blk, 8), (63 * 4 + 2) >> 2);
    }

    #[test]
    fn lcu_cost_ignores_partial_blocks() {
        let mut org = HevcYuv::new(16, 12, ChromaSampling::Cs400);
        for (i, p) in org.plane_mut(Y_C).iter_mut().enumerate() {
            *p = ((i * 7) % 13) as pel;
        }
        let two = hevce_had_8x8(org.plane(Y_C), 16) + hevce_had_8x8(&org.plane(Y_C)[8..], 16);
        assert_eq!(hevce_lcu_intra_cost(&org, 16, 12), two);
    }

    #[test]
    fn activity_of_stripes() {
        let mut org = HevcYuv::new(8, 8, ChromaSampling::Cs400);
        for y in 0..8 {
            for x in 0..8 {
                org.plane_mut(Y_C)[y * 8 + x] = if x % 2 == 0 { 10 } else { 0 };
            }
        }
        // vertical stripes are smooth along columns
        assert_eq!(hevce_min_hv_activity(&org, 8, 8), 0);
        org.plane_mut(Y_C)[63] = 3;
        assert_eq!(hevce_min_hv_activity(&org, 8, 8), 3);
    }

    #[test]
    fn symbol_cost_follows_probability() {
        // state 256, mps 0: both symbols cost one bit
        let even = (256u16 << 1) | 0;
        assert!((biari_no_bits(0, even) - 32768).abs() < 64);
        assert!((biari_no_bits(1, even) - 32768).abs() < 64);
        // skewed model, the lps is expensive
        let skew = (20u16 << 1) | 1;
        assert!(biari_no_bits(0, skew) > 4 * 32768);
        assert!(biari_no_bits(1, skew) < 32768 / 8);
    }
}
