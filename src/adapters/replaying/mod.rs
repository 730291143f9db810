//! Replaying adapters that serve recorded interactions from cassettes.

pub mod image_generator;

use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;
use crate::error::ImageError;

/// Take the next recorded output for `port`/`method`.
pub(crate) fn next_output(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
) -> Result<serde_json::Value, ImageError> {
    let mut guard =
        replayer.lock().map_err(|e| ImageError::Config(format!("Replayer lock poisoned: {e}")))?;
    guard.next_interaction(port, method).map(|i| i.output).map_err(ImageError::Config)
}

/// Turn a recorded output back into the call's result.
pub(crate) fn replay_result<T: DeserializeOwned>(
    output: serde_json::Value,
) -> Result<T, ImageError> {
    if let Some(err) = output.get("Err") {
        let detail = err.as_str().unwrap_or_default().to_string();
        return Err(if detail.is_empty() { ImageError::Unknown } else { ImageError::Replayed(detail) });
    }
    let ok = output.get("Ok").cloned().unwrap_or(output);
    serde_json::from_value(ok)
        .map_err(|e| ImageError::Decode(format!("Invalid recorded output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::ImageResponse;
    use serde_json::json;

    #[test]
    fn ok_output_deserializes() {
        let response: ImageResponse =
            replay_result(json!({"Ok": {"images": [{"data": "AAAA", "mime_type": "image/jpeg"}]}}))
                .unwrap();
        assert_eq!(response.images[0].data, vec![0, 0, 0]);
    }

    #[test]
    fn err_output_keeps_detail() {
        let err = replay_result::<ImageResponse>(json!({"Err": "quota exceeded"})).unwrap_err();
        assert_eq!(err.detail().as_deref(), Some("quota exceeded"));
    }

    #[test]
    fn empty_err_has_no_detail() {
        let err = replay_result::<ImageResponse>(json!({"Err": ""})).unwrap_err();
        assert!(err.detail().is_none());
    }
}
