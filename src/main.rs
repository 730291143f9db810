//! imagen-studio - prompt-to-image front end for Google Imagen.

mod adapters;
mod cassette;
mod cli;
mod config;
mod context;
mod controller;
mod error;
mod model;
mod ports;
mod render;

use std::io::{BufRead, IsTerminal};
use std::path::Path;
use std::process;
use std::sync::Arc;

use clap::Parser;
use log::{debug, info, warn};

use crate::cli::Cli;
use crate::config::Config;
use crate::context::{RecordingSession, ServiceContext};
use crate::controller::{ControllerState, GenerationOptions, RequestController};
use crate::error::ImageError;
use crate::model::{resolve_model, validate_model};
use crate::render::TerminalRenderer;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    pretty_env_logger::formatted_builder().filter_level(cli.log_level()).parse_default_env().init();

    match run(cli).await {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<i32, ImageError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(ImageError::Config)?;

    let model = resolve_model(cli.model.as_deref().unwrap_or(&config.defaults.model));
    validate_model(&model).map_err(ImageError::Config)?;
    debug!("Model: {model}");

    let (service, recording) = build_service(&config)?;
    let controller = RequestController::from_service(service, GenerationOptions::with_model(model));

    let renderer = Arc::new(TerminalRenderer::new(ControllerState::default()));
    renderer.render(&controller.state());
    let observer = Arc::clone(&renderer);
    controller.subscribe(move |state| observer.render(state));

    let code = match cli.prompt {
        Some(prompt) => generate_once(&controller, prompt).await,
        None => generate_from_stdin(&controller).await?,
    };

    drop(controller);
    let code = if renderer.output_failed() { 1 } else { code };
    if let Some(session) = recording {
        match session.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => warn!("Failed to save cassette: {e}"),
        }
    }

    Ok(code)
}

/// Pick live, recording or replaying mode from the environment.
///
/// A live or recording context that cannot be built is handed to the
/// controller as-is so it can show the failure; a broken cassette is fatal.
fn build_service(
    config: &Config,
) -> Result<(Result<ServiceContext, ImageError>, Option<RecordingSession>), ImageError> {
    if let Ok(cassette_path) = std::env::var("IMAGEN_STUDIO_REPLAY") {
        info!("Replaying from: {cassette_path}");
        return Ok((Ok(ServiceContext::replaying(Path::new(&cassette_path))?), None));
    }

    let is_recording = std::env::var("IMAGEN_STUDIO_REC").is_ok_and(|v| v == "true" || v == "1");
    if is_recording {
        return Ok(match ServiceContext::recording(config) {
            Ok((ctx, session)) => (Ok(ctx), Some(session)),
            Err(e) => (Err(e), None),
        });
    }

    Ok((ServiceContext::live(config), None))
}

/// Run a single generation; the exit code is 1 unless an image came back.
async fn generate_once(controller: &RequestController, prompt: String) -> i32 {
    if !controller.is_enabled() {
        return 1;
    }
    controller.set_prompt(prompt);
    let state = controller.generate().await;
    if state.result.is_some() {
        0
    } else {
        if state.error.is_none() {
            eprintln!("Nothing to generate: the prompt is empty.");
        }
        1
    }
}

/// Treat each stdin line as a form submission until EOF.
async fn generate_from_stdin(controller: &RequestController) -> Result<i32, ImageError> {
    if !controller.is_enabled() {
        return Ok(1);
    }
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Enter a prompt per line (Ctrl-D to quit).");
    }
    for line in stdin.lock().lines() {
        controller.set_prompt(line?);
        controller.generate().await;
    }
    Ok(0)
}
