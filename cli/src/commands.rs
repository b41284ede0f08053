pub mod build;
pub mod export_csv;
pub mod validate;
