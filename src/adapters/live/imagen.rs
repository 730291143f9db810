//! Live adapter for the Imagen `:predict` endpoint of the Generative Language API.

use base64::Engine;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::error::ImageError;
use crate::ports::{GenerateFuture, GeneratedImage, ImageGenerator, ImageRequest, ImageResponse};

const IMAGEN_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Live Imagen generator that calls the Google AI API.
pub struct ImagenGenerator {
    client: Client,
    api_key: String,
}

impl ImagenGenerator {
    /// Create a new Imagen generator with the given API key.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self { client: Client::new(), api_key }
    }
}

impl ImageGenerator for ImagenGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let url = format!("{IMAGEN_API_BASE}/{}:predict", request.model);
            debug!("POST {url} ({} image(s), {})", request.count, request.aspect_ratio);

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&predict_body(&request))
                .send()
                .await?;

            let status = response.status();
            let response_text = response.text().await?;

            if !status.is_success() {
                return Err(ImageError::Api {
                    status: status.as_u16(),
                    message: api_error_message(&response_text),
                });
            }

            parse_predict_response(&response_text)
        })
    }
}

/// Build the JSON body of a `:predict` call.
fn predict_body(request: &ImageRequest) -> serde_json::Value {
    serde_json::json!({
        "instances": [{ "prompt": request.prompt }],
        "parameters": {
            "sampleCount": request.count,
            "aspectRatio": request.aspect_ratio,
            "outputOptions": { "mimeType": request.mime_type },
        }
    })
}

/// Extract `error.message` from Google's error envelope, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}

/// Decode a successful `:predict` response body.
///
/// Entries without image bytes (safety-filtered results) are skipped, so the
/// returned list may be empty.
fn parse_predict_response(body: &str) -> Result<ImageResponse, ImageError> {
    let parsed: PredictResponse = serde_json::from_str(body)
        .map_err(|e| ImageError::Decode(format!("Failed to parse response: {e}")))?;

    let mut images = Vec::new();
    for prediction in parsed.predictions.unwrap_or_default() {
        let Some(encoded) = prediction.bytes_base64_encoded else {
            if let Some(reason) = prediction.rai_filtered_reason {
                warn!("Prediction filtered: {reason}");
            }
            continue;
        };
        let data = base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .map_err(|e| ImageError::Decode(format!("Failed to decode base64: {e}")))?;
        images.push(GeneratedImage { data, mime_type: prediction.mime_type });
    }

    Ok(ImageResponse { images })
}

// --- Imagen API response types ---

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Option<Vec<Prediction>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
    rai_filtered_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ImageRequest {
        ImageRequest {
            model: "imagen-3.0-generate-002".into(),
            prompt: "a red cube".into(),
            count: 1,
            mime_type: "image/jpeg".into(),
            aspect_ratio: "1:1".into(),
        }
    }

    #[test]
    fn body_carries_fixed_options() {
        let body = predict_body(&request());
        assert_eq!(body["instances"][0]["prompt"], "a red cube");
        assert_eq!(body["parameters"]["sampleCount"], 1);
        assert_eq!(body["parameters"]["aspectRatio"], "1:1");
        assert_eq!(body["parameters"]["outputOptions"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn parses_single_prediction() {
        let body = r#"{"predictions": [{"bytesBase64Encoded": "AAAA", "mimeType": "image/jpeg"}]}"#;
        let response = parse_predict_response(body).unwrap();
        assert_eq!(response.images.len(), 1);
        assert_eq!(response.images[0].data, vec![0, 0, 0]);
        assert_eq!(response.images[0].mime_type.as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn missing_predictions_is_empty() {
        let response = parse_predict_response("{}").unwrap();
        assert!(response.images.is_empty());
    }

    #[test]
    fn null_predictions_is_empty() {
        let response = parse_predict_response(r#"{"predictions": null}"#).unwrap();
        assert!(response.images.is_empty());
    }

    #[test]
    fn filtered_predictions_are_skipped() {
        let body = r#"{"predictions": [{"raiFilteredReason": "blocked"}]}"#;
        let response = parse_predict_response(body).unwrap();
        assert!(response.images.is_empty());
    }

    #[test]
    fn bad_base64_is_decode_error() {
        let body = r#"{"predictions": [{"bytesBase64Encoded": "not base64!"}]}"#;
        assert!(matches!(parse_predict_response(body), Err(ImageError::Decode(_))));
    }

    #[test]
    fn bad_json_is_decode_error() {
        assert!(matches!(parse_predict_response("<html>"), Err(ImageError::Decode(_))));
    }

    #[test]
    fn error_message_from_envelope() {
        let body = r#"{"error": {"code": 429, "message": "quota exceeded", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(api_error_message(body), "quota exceeded");
    }

    #[test]
    fn error_message_falls_back_to_body() {
        assert_eq!(api_error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
