use std::fmt;

use num_derive::FromPrimitive;
use thiserror::Error;

pub mod config;
pub mod service;

pub use crate::com::cu::HevcCUData;
pub use crate::com::mv::*;
pub use crate::com::pic::{HevcMask, HevcPic};
pub use crate::com::yuv::HevcYuv;
pub use crate::com::{HevcPps, HevcSlice, HevcSps};
pub use crate::enc::aq::HevceAqLayers;
pub use crate::enc::sbac::{HevcSbacCtx, HevceSbac, HevceSbacState};
pub use crate::enc::{HevceArlStats, HevceCu};
pub use config::*;
pub use service::*;

/*****************************************************************************
 * return values and error code
 *****************************************************************************/
#[derive(Debug, Error, PartialEq, Clone)]
pub enum HevcError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("invalid QP range [{min}, {max}]")]
    InvalidQpRange { min: i32, max: i32 },
    #[error("value out of range: {0}")]
    OutOfRange(&'static str),
    #[error("unsupported configuration: {0}")]
    Unsupported(&'static str),
    #[error("unexpected state: {0}")]
    Unexpected(&'static str),
}

impl Default for HevcError {
    fn default() -> Self {
        HevcError::Unexpected("unknown")
    }
}

#[allow(dead_code, non_camel_case_types)]
#[derive(Debug, FromPrimitive, ToPrimitive, PartialEq, PartialOrd, Clone, Copy)]
#[repr(C)]
pub enum SliceType {
    B_SLICE = 0,
    P_SLICE = 1,
    I_SLICE = 2,
}

impl fmt::Display for SliceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::SliceType::*;
        match self {
            B_SLICE => write!(f, "B"),
            P_SLICE => write!(f, "P"),
            I_SLICE => write!(f, "I"),
        }
    }
}

impl Default for SliceType {
    fn default() -> Self {
        SliceType::I_SLICE
    }
}

/* prediction unit shape of a coding unit */
#[allow(dead_code, non_camel_case_types)]
#[derive(Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum PartSize {
    SIZE_2Nx2N = 0,
    SIZE_2NxN = 1,
    SIZE_Nx2N = 2,
    SIZE_NxN = 3,
    SIZE_2NxnU = 4,
    SIZE_2NxnD = 5,
    SIZE_nLx2N = 6,
    SIZE_nRx2N = 7,
    /* not yet decided */
    NUMBER_OF_PART_SIZES = 8,
}

impl Default for PartSize {
    fn default() -> Self {
        PartSize::NUMBER_OF_PART_SIZES
    }
}

impl From<u8> for PartSize {
    fn from(val: u8) -> Self {
        num_traits::FromPrimitive::from_u8(val).unwrap_or(PartSize::NUMBER_OF_PART_SIZES)
    }
}

impl PartSize {
    /* number of prediction units */
    pub fn num_pu(self) -> usize {
        use self::PartSize::*;
        match self {
            SIZE_2Nx2N | NUMBER_OF_PART_SIZES => 1,
            SIZE_NxN => 4,
            _ => 2,
        }
    }

    pub fn is_amp(self) -> bool {
        (self as u8) >= PartSize::SIZE_2NxnU as u8 && self != PartSize::NUMBER_OF_PART_SIZES
    }
}

#[allow(dead_code, non_camel_case_types)]
#[derive(Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, Clone, Copy)]
#[repr(u8)]
pub enum PredMode {
    MODE_INTER = 0,
    MODE_INTRA = 1,
    /* not yet decided */
    NUMBER_OF_PREDICTION_MODES = 2,
    MODE_INTRABC = 127,
}

impl Default for PredMode {
    fn default() -> Self {
        PredMode::NUMBER_OF_PREDICTION_MODES
    }
}

impl From<u8> for PredMode {
    fn from(val: u8) -> Self {
        num_traits::FromPrimitive::from_u8(val).unwrap_or(PredMode::NUMBER_OF_PREDICTION_MODES)
    }
}

#[allow(dead_code, non_camel_case_types)]
#[derive(Debug, FromPrimitive, ToPrimitive, PartialEq, Eq, Clone, Copy)]
pub enum SliceConstraint {
    NO_SLICES = 0,
    FIXED_NUMBER_OF_LCU = 1,
    FIXED_NUMBER_OF_BYTES = 2,
    FIXED_NUMBER_OF_TILES = 3,
}

impl Default for SliceConstraint {
    fn default() -> Self {
        SliceConstraint::NO_SLICES
    }
}

/* how the CTU just written relates to the slice layout */
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum HevcSegmentEnd {
    /* keep going with the next CTU */
    None,
    /* byte budget exhausted, the slice segment ends here */
    SliceSegment,
    /* byte budget exhausted, the slice ends here */
    Slice,
}

impl Default for HevcSegmentEnd {
    fn default() -> Self {
        HevcSegmentEnd::None
    }
}

#[derive(Copy, Clone, Debug, PartialEq, FromPrimitive)]
#[repr(C)]
pub enum ChromaSampling {
    Cs400,
    Cs420,
    Cs422,
    Cs444,
}

impl Default for ChromaSampling {
    fn default() -> Self {
        ChromaSampling::Cs420
    }
}

impl From<u8> for ChromaSampling {
    fn from(val: u8) -> Self {
        use self::ChromaSampling::*;
        match val {
            0 => Cs400,
            1 => Cs420,
            2 => Cs422,
            _ => Cs444,
        }
    }
}

impl ChromaSampling {
    // Provides the log2 sampling period in the horizontal and vertical axes.
    pub fn shift(self) -> (usize, usize) {
        use self::ChromaSampling::*;
        match self {
            Cs420 => (1, 1),
            Cs422 => (1, 0),
            Cs444 => (0, 0),
            Cs400 => (1, 1),
        }
    }

    pub fn num_comps(self) -> usize {
        if self == ChromaSampling::Cs400 {
            1
        } else {
            3
        }
    }
}
