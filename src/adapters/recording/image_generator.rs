//! Recording adapter for the `ImageGenerator` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{GenerateFuture, ImageGenerator, ImageRequest};

/// Delegates to an inner generator and records every call.
pub struct RecordingImageGenerator {
    inner: Box<dyn ImageGenerator>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingImageGenerator {
    /// Wrap `inner`, recording into `recorder`.
    pub fn new(inner: Box<dyn ImageGenerator>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl ImageGenerator for RecordingImageGenerator {
    fn generate(&self, request: &ImageRequest) -> GenerateFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let result = self.inner.generate(&request).await;
            record_result(&self.recorder, "image_generator", "generate", &request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImageError;
    use crate::ports::{GeneratedImage, ImageResponse};

    struct Fixed(Option<&'static str>);

    impl ImageGenerator for Fixed {
        fn generate(&self, _request: &ImageRequest) -> GenerateFuture<'_> {
            let failure = self.0;
            Box::pin(async move {
                match failure {
                    Some(detail) => Err(ImageError::Api { status: 429, message: detail.into() }),
                    None => Ok(ImageResponse {
                        images: vec![GeneratedImage {
                            data: vec![0, 0, 0],
                            mime_type: Some("image/jpeg".into()),
                        }],
                    }),
                }
            })
        }
    }

    fn request() -> ImageRequest {
        ImageRequest {
            model: "imagen-3.0-generate-002".into(),
            prompt: "a red cube".into(),
            count: 1,
            mime_type: "image/jpeg".into(),
            aspect_ratio: "1:1".into(),
        }
    }

    fn recorded_yaml(failure: Option<&'static str>, file: &str) -> String {
        let path = std::env::temp_dir().join(file);
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "t", "c")));
        let generator = RecordingImageGenerator::new(Box::new(Fixed(failure)), Arc::clone(&recorder));

        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let _ = runtime.block_on(generator.generate(&request()));
        drop(generator);

        let recorder = Arc::try_unwrap(recorder).unwrap().into_inner().unwrap();
        let written = recorder.finish().unwrap();
        let yaml = std::fs::read_to_string(&written).unwrap();
        let _ = std::fs::remove_file(&written);
        yaml
    }

    #[test]
    fn records_success_as_ok() {
        let yaml = recorded_yaml(None, "imagen_studio_rec_ok.cassette.yaml");
        assert!(yaml.contains("a red cube"));
        assert!(yaml.contains("Ok:"));
        assert!(yaml.contains("AAAA"));
    }

    #[test]
    fn records_failure_detail_as_err() {
        let yaml = recorded_yaml(Some("quota exceeded"), "imagen_studio_rec_err.cassette.yaml");
        assert!(yaml.contains("Err: quota exceeded"));
    }
}
