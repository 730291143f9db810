//! Terminal rendering of controller state.
//!
//! Status lines go to stderr; a successful image goes to stdout as a `data:`
//! URL so it can be piped elsewhere.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use log::warn;

use crate::controller::{ControllerState, ImageRef};

/// One piece of output produced by a state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Human-facing status line (stderr).
    Status(String),
    /// Rendered image resource (stdout).
    Image(String),
}

/// Work out what to print when the state moves from `previous` to `next`.
///
/// Prompt edits print nothing.
#[must_use]
pub fn transition_output(previous: &ControllerState, next: &ControllerState) -> Vec<Output> {
    let mut out = Vec::new();
    if next.is_loading && !previous.is_loading {
        out.push(Output::Status("Generating...".to_string()));
    }
    if next.error != previous.error {
        if let Some(message) = &next.error {
            out.push(Output::Status(format!("Error: {message}")));
        }
    }
    if next.result != previous.result {
        if let Some(image) = &next.result {
            out.push(Output::Status(describe(image)));
            out.push(Output::Image(image.data_url()));
        }
    }
    out
}

fn describe(image: &ImageRef) -> String {
    let size = image.data().len();
    match image.dimensions() {
        Some((w, h)) => format!("Image: {w}x{h} {} ({size} bytes)", image.mime_type()),
        None => format!("Image: {} ({size} bytes)", image.mime_type()),
    }
}

/// Observer that prints state transitions to the terminal.
pub struct TerminalRenderer {
    last: Mutex<ControllerState>,
    output_failed: AtomicBool,
}

impl TerminalRenderer {
    /// Create a renderer that treats `initial` as already on screen.
    #[must_use]
    pub fn new(initial: ControllerState) -> Self {
        Self { last: Mutex::new(initial), output_failed: AtomicBool::new(false) }
    }

    /// Print whatever changed since the previous call.
    pub fn render(&self, state: &ControllerState) {
        self.render_to(state, &mut std::io::stdout().lock());
    }

    /// Whether writing an image to stdout ever failed.
    #[must_use]
    pub fn output_failed(&self) -> bool {
        self.output_failed.load(Ordering::Relaxed)
    }

    fn render_to(&self, state: &ControllerState, images: &mut impl Write) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        for output in transition_output(&last, state) {
            match output {
                Output::Status(line) => eprintln!("{line}"),
                Output::Image(url) => {
                    if let Err(e) = writeln!(images, "{url}").and_then(|()| images.flush()) {
                        warn!("Failed to write image to stdout: {e}");
                        self.output_failed.store(true, Ordering::Relaxed);
                    }
                }
            }
        }
        *last = state.clone();
    }
}
