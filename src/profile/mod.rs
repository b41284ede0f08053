//! Per-corridor aggregation of measured segments.

mod cross_section;
mod length;
mod metrics;
mod profile;

pub use length::MeasuredSegment;
pub use metrics::TrafficMetrics;
pub use profile::CorridorProfile;

pub(crate) use cross_section::class_column;
pub(crate) use length::measure_segments;
pub(crate) use profile::build_corridor_profiles;
