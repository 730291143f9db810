//! Record/replay infrastructure for deterministic testing.
//!
//! A cassette is a YAML file holding every port interaction of one run, in
//! call order. Outputs use the `{"Ok": value}` / `{"Err": "detail"}` shape.

pub mod config;
pub mod format;
pub mod recorder;
pub mod replayer;
