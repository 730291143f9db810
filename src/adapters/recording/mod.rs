//! Recording adapters that capture interactions to cassettes.

pub mod image_generator;

use std::sync::{Arc, Mutex};

use log::warn;
use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;
use crate::error::ImageError;

/// Record a call result using the Ok/Err JSON convention.
///
/// Errors are stored as their user-facing detail so a replay reproduces the
/// same message. Recording problems are logged and never fail the call.
pub(crate) fn record_result<T, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, ImageError>,
) where
    T: Serialize,
    I: Serialize,
{
    let output = match result {
        Ok(v) => serde_json::to_value(v).map(|inner| serde_json::json!({ "Ok": inner })),
        Err(e) => Ok(serde_json::json!({ "Err": e.detail().unwrap_or_default() })),
    };
    let (input, output) = match (serde_json::to_value(input), output) {
        (Ok(input), Ok(output)) => (input, output),
        (Err(e), _) | (_, Err(e)) => {
            warn!("Skipping {port}::{method} recording: {e}");
            return;
        }
    };

    match recorder.lock() {
        Ok(mut guard) => guard.record(port, method, input, output),
        Err(e) => warn!("Skipping {port}::{method} recording: {e}"),
    }
}
