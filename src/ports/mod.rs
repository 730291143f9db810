//! Port traits defining external boundaries.
//!
//! The application core only talks to the image service through
//! [`ImageGenerator`]; live, recording and replaying implementations live in
//! `src/adapters/`.

pub mod image_generator;

pub use image_generator::{
    GenerateFuture, GeneratedImage, ImageGenerator, ImageRequest, ImageResponse,
};
