use std::ops::{Add, Sub};

/* motion or block vector in quarter (or integer for intra block copy) pel units */
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HevcMv {
    pub hor: i16,
    pub ver: i16,
}

impl HevcMv {
    pub const fn new(hor: i16, ver: i16) -> Self {
        HevcMv { hor, ver }
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.hor == 0 && self.ver == 0
    }

    #[inline]
    pub fn abs_sum(&self) -> u32 {
        (self.hor as i32).abs() as u32 + (self.ver as i32).abs() as u32
    }
}

impl Add for HevcMv {
    type Output = HevcMv;
    fn add(self, rhs: HevcMv) -> HevcMv {
        HevcMv::new(self.hor.wrapping_add(rhs.hor), self.ver.wrapping_add(rhs.ver))
    }
}

impl Sub for HevcMv {
    type Output = HevcMv;
    fn sub(self, rhs: HevcMv) -> HevcMv {
        HevcMv::new(self.hor.wrapping_sub(rhs.hor), self.ver.wrapping_sub(rhs.ver))
    }
}

pub const NOT_VALID: i8 = -1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HevcMvField {
    pub mv: HevcMv,
    pub ref_idx: i8,
}

impl Default for HevcMvField {
    fn default() -> Self {
        HevcMvField {
            mv: HevcMv::default(),
            ref_idx: NOT_VALID,
        }
    }
}

impl HevcMvField {
    pub fn new(mv: HevcMv, ref_idx: i8) -> Self {
        HevcMvField { mv, ref_idx }
    }
}

/* one merge candidate: inter direction (1 = L0, 2 = L1, 3 = bi) with both list fields */
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct HevcMergeCand {
    pub inter_dir: u8,
    pub mv_field: [HevcMvField; 2],
}

/* per partition motion data of one reference list */
#[derive(Debug, Default, Clone)]
pub struct HevcCUMvField {
    pub(crate) mv: Vec<HevcMv>,
    pub(crate) mvd: Vec<HevcMv>,
    pub(crate) ref_idx: Vec<i8>,
}

impl HevcCUMvField {
    pub(crate) fn new(num_partition: usize) -> Self {
        HevcCUMvField {
            mv: vec![HevcMv::default(); num_partition],
            mvd: vec![HevcMv::default(); num_partition],
            ref_idx: vec![NOT_VALID; num_partition],
        }
    }

    #[inline]
    pub fn mv(&self, idx: usize) -> HevcMv {
        self.mv[idx]
    }

    #[inline]
    pub fn mvd(&self, idx: usize) -> HevcMv {
        self.mvd[idx]
    }

    #[inline]
    pub fn ref_idx(&self, idx: usize) -> i8 {
        self.ref_idx[idx]
    }

    pub(crate) fn clear_range(&mut self, start: usize, num: usize) {
        for i in start..start + num {
            self.mv[i] = HevcMv::default();
            self.mvd[i] = HevcMv::default();
            self.ref_idx[i] = NOT_VALID;
        }
    }
}
