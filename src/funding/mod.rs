//! Funding tracker projects, grouped into status buckets per corridor.

mod bucket;
mod project;
mod summary;

pub use bucket::FundingBucket;
pub use project::FundingProject;
pub use summary::{BucketTotals, FundingSummary};

pub(crate) use project::load_funding_projects;
pub(crate) use summary::{join_funding, summarize_projects};
