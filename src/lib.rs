//! Cartoon headshot generator.
//!
//! Upload a photo, optionally describe a style, and get back a cartoon
//! headshot generated by Gemini. The UI state lives in a pure reducer
//! ([`controller::reduce`]); the browser page mirrors it and the server runs
//! one decode → generate cycle per request.
//!
//! ```no_run
//! use std::sync::Arc;
//! use cartoon_headshot::{Controller, GeminiClient};
//!
//! # async fn run() {
//! let mut controller = Controller::new(Arc::new(GeminiClient::builder().build()));
//! controller.select_file("image/png", tokio::fs::read("me.png")).await;
//! controller.set_prompt("pixar style");
//! controller.generate().await;
//! if let Some(file) = controller.download() {
//!     std::fs::write(file.filename, file.bytes).ok();
//! }
//! # }
//! ```

pub mod config;
pub mod controller;
mod error;
pub mod gemini;
pub mod generation;
pub mod image;
pub mod web;

pub use config::Config;
pub use controller::{reduce, Controller, DisplayMode, Download, Event, Phase, UiState, UiView};
pub use error::{HeadshotError, Result};
pub use gemini::{GeminiClient, GeminiClientBuilder};
pub use generation::{build_instruction, ImageGenerator};
pub use image::ImageBytes;
