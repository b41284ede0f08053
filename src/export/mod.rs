//! Output tables: the corridor profile layer and CSV dumps of any layer.

mod csv;
mod layer;

pub use csv::{CsvExport, export_layer_to_csv};
pub use layer::{profiles_to_table, write_profiles};
