mod crs;
mod dissolve;
mod proj;

pub use crs::{Crs, LinearUnit};
pub(crate) use crs::epsg_from_wkt;
pub(crate) use dissolve::dissolve_lines;
pub(crate) use proj::{Reprojector, planar_length};
