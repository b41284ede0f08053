mod registry;
mod segment;

pub use registry::{CorridorDefinition, Registry};
pub use segment::{RoadSegment, SegmentSet};
