//! Adapter implementations for port traits.
//!
//! - `live/` talks to the Imagen API
//! - `recording/` wraps a live adapter and writes cassettes
//! - `replaying/` serves interactions from cassettes

pub mod live;
pub mod recording;
pub mod replaying;
