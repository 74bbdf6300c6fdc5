use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::Write;

use super::cu::HevcCUData;

pub(crate) type Tracer = (Box<dyn Write>, isize);

////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(feature = "trace")]
pub(crate) fn OPEN_TRACE() -> Option<Tracer> {
    let fp_trace = OpenOptions::new()
        .append(true)
        .create(true)
        .open("enc_trace.txt");
    if let Ok(fp) = fp_trace {
        Some((Box::new(fp), 0))
    } else {
        None
    }
}

#[cfg(feature = "trace")]
pub(crate) fn HEVC_TRACE_COUNTER(tracer: &mut Option<Tracer>) {
    if let Some((writer, counter)) = tracer {
        let _ = writer.write_fmt(format_args!("{} \t", *counter));
        *counter += 1;
    }
}

#[cfg(feature = "trace")]
pub(crate) fn HEVC_TRACE<T: Display>(tracer: &mut Option<Tracer>, name: T) {
    if let Some((writer, _)) = tracer {
        let _ = writer.write_fmt(format_args!("{}", name));
    }
}

#[cfg(feature = "trace_bin")]
pub(crate) fn TRACE_BIN(tracer: &mut Option<Tracer>, model: u16, range: u32, lps: u32) {
    HEVC_TRACE_COUNTER(tracer);
    HEVC_TRACE(tracer, "model ");
    HEVC_TRACE(tracer, model);
    HEVC_TRACE(tracer, " range ");
    HEVC_TRACE(tracer, range);
    HEVC_TRACE(tracer, " lps ");
    HEVC_TRACE(tracer, lps);
    HEVC_TRACE(tracer, " \n");
}

#[cfg(feature = "trace_cu")]
pub(crate) fn TRACE_CU(tracer: &mut Option<Tracer>, cu: &HevcCUData, depth: u8) {
    HEVC_TRACE_COUNTER(tracer);
    HEVC_TRACE(tracer, "cu x ");
    HEVC_TRACE(tracer, cu.cu_pel_x());
    HEVC_TRACE(tracer, " y ");
    HEVC_TRACE(tracer, cu.cu_pel_y());
    HEVC_TRACE(tracer, " depth ");
    HEVC_TRACE(tracer, depth);
    HEVC_TRACE(tracer, " part ");
    HEVC_TRACE(tracer, cu.part_size(0) as u8);
    HEVC_TRACE(tracer, " pred ");
    HEVC_TRACE(tracer, cu.pred_mode(0) as u8);
    HEVC_TRACE(tracer, " qp ");
    HEVC_TRACE(tracer, cu.qp(0));
    HEVC_TRACE(tracer, " bits ");
    HEVC_TRACE(tracer, cu.total_bits());
    HEVC_TRACE(tracer, " cost ");
    HEVC_TRACE(tracer, cu.total_cost());
    HEVC_TRACE(tracer, " \n");
}

////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(not(feature = "trace"))]
pub(crate) fn OPEN_TRACE() -> Option<Tracer> {
    None
}

#[cfg(not(feature = "trace"))]
pub(crate) fn HEVC_TRACE_COUNTER(tracer: &mut Option<Tracer>) {}

#[cfg(not(feature = "trace"))]
pub(crate) fn HEVC_TRACE<T: Display>(writer: &mut Option<Tracer>, name: T) {}

#[cfg(not(feature = "trace_bin"))]
pub(crate) fn TRACE_BIN(tracer: &mut Option<Tracer>, model: u16, range: u32, lps: u32) {}

#[cfg(not(feature = "trace_cu"))]
pub(crate) fn TRACE_CU(tracer: &mut Option<Tracer>, cu: &HevcCUData, depth: u8) {}
