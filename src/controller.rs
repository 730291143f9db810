//! The request controller: prompt, loading flag, result and error, plus the
//! one operation that moves them, [`RequestController::generate`].
//!
//! Every call goes `Idle -> Loading -> Idle`, ending with either a result or
//! an error. At most one call is in flight; a `generate` issued while another
//! is outstanding returns without touching state.

use std::io::Cursor;
use std::sync::{Mutex, MutexGuard, PoisonError};

use base64::Engine;
use log::{debug, error};

use crate::context::ServiceContext;
use crate::error::ImageError;
use crate::model::DEFAULT_MODEL;
use crate::ports::{ImageGenerator, ImageRequest, ImageResponse};

/// Shown when the service answered but returned no image.
pub const NO_IMAGE_MESSAGE: &str = "No image was generated. Please try a different prompt or model.";

/// Fallback detail for failures that carry none.
pub const UNKNOWN_ERROR_DETAIL: &str = "An unknown error occurred.";

/// Encoded image bytes plus their MIME type, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    data: Vec<u8>,
    mime_type: String,
}

impl ImageRef {
    /// Wrap encoded image bytes.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self { data, mime_type: mime_type.into() }
    }

    /// The encoded bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The MIME type, e.g. `image/jpeg`.
    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The image as a `data:` URL resource.
    #[must_use]
    pub fn data_url(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.data);
        format!("data:{};base64,{encoded}", self.mime_type)
    }

    /// Pixel dimensions, if the bytes decode as an image.
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        image::ImageReader::new(Cursor::new(&self.data))
            .with_guessed_format()
            .ok()?
            .into_dimensions()
            .ok()
    }
}

/// Snapshot of everything the controller owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerState {
    /// User-editable prompt text.
    pub prompt: String,
    /// True while a generation call is outstanding.
    pub is_loading: bool,
    /// Image from the most recent successful call.
    pub result: Option<ImageRef>,
    /// Message from the most recent failed call.
    pub error: Option<String>,
}

/// Options sent with every generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Resolved model identifier.
    pub model: String,
    /// Number of images to request.
    pub count: u32,
    /// Requested output MIME type.
    pub mime_type: String,
    /// Requested aspect ratio.
    pub aspect_ratio: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            count: 1,
            mime_type: "image/jpeg".to_string(),
            aspect_ratio: "1:1".to_string(),
        }
    }
}

impl GenerationOptions {
    /// Default options with a different model.
    pub fn with_model(model: impl Into<String>) -> Self {
        Self { model: model.into(), ..Self::default() }
    }
}

/// Callback invoked with a state snapshot after every transition.
pub type Observer = Box<dyn Fn(&ControllerState) + Send + Sync>;

/// Owns the generation state and drives calls to the image service.
pub struct RequestController {
    generator: Option<Box<dyn ImageGenerator>>,
    options: GenerationOptions,
    state: Mutex<ControllerState>,
    observers: Mutex<Vec<Observer>>,
}

impl RequestController {
    /// Create an enabled controller backed by `generator`.
    #[must_use]
    pub fn new(generator: Box<dyn ImageGenerator>, options: GenerationOptions) -> Self {
        Self {
            generator: Some(generator),
            options,
            state: Mutex::new(ControllerState::default()),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Create a permanently disabled controller showing `reason` as its error.
    pub fn disabled(reason: impl Into<String>) -> Self {
        let state = ControllerState { error: Some(reason.into()), ..ControllerState::default() };
        Self {
            generator: None,
            options: GenerationOptions::default(),
            state: Mutex::new(state),
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Create a controller from the outcome of building a service context.
    ///
    /// A failed context (typically a missing API key) yields a disabled
    /// controller carrying the failure message.
    #[must_use]
    pub fn from_service(
        service: Result<ServiceContext, ImageError>,
        options: GenerationOptions,
    ) -> Self {
        match service {
            Ok(ctx) => Self::new(ctx.generator, options),
            Err(e) => {
                error!("Image generation disabled: {e}");
                Self::disabled(e.to_string())
            }
        }
    }

    /// Whether the controller can issue calls at all.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> ControllerState {
        self.lock_state().clone()
    }

    /// Register a callback notified after every state transition.
    ///
    /// Observers must not call [`RequestController::subscribe`] themselves.
    pub fn subscribe(&self, observer: impl Fn(&ControllerState) + Send + Sync + 'static) {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner).push(Box::new(observer));
    }

    /// Replace the prompt text.
    pub fn set_prompt(&self, prompt: impl Into<String>) {
        let snapshot = {
            let mut state = self.lock_state();
            state.prompt = prompt.into();
            state.clone()
        };
        self.notify(&snapshot);
    }

    /// Run one generation call for the current prompt.
    ///
    /// Does nothing when the prompt is blank, a call is already in flight, or
    /// the controller is disabled. Returns the state after the call.
    pub async fn generate(&self) -> ControllerState {
        let Some(generator) = self.generator.as_deref() else {
            return self.state();
        };
        let Some((request, snapshot)) = self.begin() else {
            return self.state();
        };
        debug!("Generating image with {} for prompt {:?}", request.model, request.prompt);
        self.notify(&snapshot);

        let mut guard = LoadingGuard { controller: self, armed: true };
        let outcome = generator.generate(&request).await;
        guard.armed = false;

        let snapshot = self.finish(outcome, &request.mime_type);
        self.notify(&snapshot);
        snapshot
    }

    /// Enter `Loading` if allowed, returning the request to issue.
    fn begin(&self) -> Option<(ImageRequest, ControllerState)> {
        let mut state = self.lock_state();
        if state.prompt.trim().is_empty() || state.is_loading {
            return None;
        }
        state.is_loading = true;
        state.error = None;
        state.result = None;

        let request = ImageRequest {
            model: self.options.model.clone(),
            prompt: state.prompt.clone(),
            count: self.options.count,
            mime_type: self.options.mime_type.clone(),
            aspect_ratio: self.options.aspect_ratio.clone(),
        };
        Some((request, state.clone()))
    }

    /// Apply a call outcome and leave `Loading`.
    fn finish(
        &self,
        outcome: Result<ImageResponse, ImageError>,
        requested_mime: &str,
    ) -> ControllerState {
        let (result, message) = match outcome {
            Ok(response) => match response.images.into_iter().next() {
                Some(image) => {
                    let mime = image.mime_type.unwrap_or_else(|| requested_mime.to_string());
                    (Some(ImageRef::new(image.data, mime)), None)
                }
                None => (None, Some(NO_IMAGE_MESSAGE.to_string())),
            },
            Err(e) => {
                error!("Error generating image: {e:?}");
                let detail = e.detail().unwrap_or_else(|| UNKNOWN_ERROR_DETAIL.to_string());
                (None, Some(format!("Failed to generate image: {detail}")))
            }
        };

        let mut state = self.lock_state();
        state.result = result;
        state.error = message;
        state.is_loading = false;
        state.clone()
    }

    fn lock_state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, snapshot: &ControllerState) {
        let observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer(snapshot);
        }
    }
}

/// Clears the loading flag if a call is abandoned before it completes.
struct LoadingGuard<'a> {
    controller: &'a RequestController,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let snapshot = {
            let mut state = self.controller.lock_state();
            state.is_loading = false;
            state.clone()
        };
        self.controller.notify(&snapshot);
    }
}
