#![doc = "Corridor profile ETL public API"]
mod common;
mod config;
mod corridor;
mod dashboard;
mod error;
mod export;
mod funding;
mod geom;
mod io;
mod pipeline;
mod profile;

#[doc(inline)]
pub use config::PipelineConfig;

#[doc(inline)]
pub use corridor::{CorridorDefinition, Registry, RoadSegment, SegmentSet};

#[doc(inline)]
pub use error::ProfileError;

#[doc(inline)]
pub use export::{export_layer_to_csv, profiles_to_table, write_profiles, CsvExport};

#[doc(inline)]
pub use funding::{BucketTotals, FundingBucket, FundingProject, FundingSummary};

#[doc(inline)]
pub use geom::{Crs, LinearUnit};

#[doc(inline)]
pub use io::{
    read_feature_table, write_feature_table, CsvWorkbook, FeatureTable, Field, FieldKind,
    MemWorkbook, SheetSource, SpatialRef,
};

#[doc(inline)]
pub use pipeline::{build_profiles, run_pipeline};

#[doc(inline)]
pub use profile::{CorridorProfile, MeasuredSegment, TrafficMetrics};

#[doc(inline)]
pub use dashboard::{validate_dashboard, DashboardReport};

/// Attribute values as stored in GeoPackage feature tables.
pub use rusqlite::types::Value;
