//! UI state machine: a pure reducer plus the async driver around it.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::generation::ImageGenerator;
use crate::image::{self, ImageBytes};

/// Filename offered when saving the generated headshot.
pub const DOWNLOAD_FILENAME: &str = "cartoon-headshot.png";

/// Shown when generation is triggered before any photo was selected.
pub const MISSING_SOURCE_MESSAGE: &str = "Please upload an image first.";

/// Where the controller is in the upload/generate cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No source image yet.
    Idle,
    /// Source image present, nothing in flight.
    Ready,
    /// A generation request is in flight.
    Generating,
}

/// What the page shows in its result area. Exactly one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DisplayMode {
    Loading,
    Error,
    Result,
    Empty,
}

/// Everything the user can see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub source_image: Option<ImageBytes>,
    pub generated_image: Option<ImageBytes>,
    pub prompt: String,
    pub loading: bool,
    pub error: Option<String>,
}

impl UiState {
    pub fn phase(&self) -> Phase {
        match (&self.source_image, self.loading) {
            (_, true) => Phase::Generating,
            (Some(_), false) => Phase::Ready,
            (None, false) => Phase::Idle,
        }
    }

    pub fn display_mode(&self) -> DisplayMode {
        if self.loading {
            DisplayMode::Loading
        } else if self.error.is_some() {
            DisplayMode::Error
        } else if self.generated_image.is_some() {
            DisplayMode::Result
        } else {
            DisplayMode::Empty
        }
    }

    /// The serializable projection sent to the page.
    pub fn view(&self) -> UiView {
        UiView {
            generated_image: self.generated_image.as_ref().map(ImageBytes::to_data_url),
            error: self.error.clone(),
            loading: self.loading,
            mode: self.display_mode(),
        }
    }
}

/// JSON shape the page renders from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiView {
    pub generated_image: Option<String>,
    pub error: Option<String>,
    pub loading: bool,
    pub mode: DisplayMode,
}

/// Everything that can happen to the UI state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    PromptChanged(String),
    ImageDecoded(ImageBytes),
    DecodeFailed(String),
    GenerateRequested,
    GenerationSucceeded(ImageBytes),
    GenerationFailed(String),
}

/// Applies one event. Never performs I/O.
pub fn reduce(state: UiState, event: Event) -> UiState {
    match event {
        Event::PromptChanged(prompt) => UiState { prompt, ..state },

        // The upload control is disabled while a request is in flight.
        Event::ImageDecoded(_) | Event::DecodeFailed(_) if state.loading => state,

        // A new photo invalidates whatever was generated from the old one.
        Event::ImageDecoded(image) => UiState {
            source_image: Some(image),
            generated_image: None,
            error: None,
            ..state
        },

        Event::DecodeFailed(message) => UiState {
            error: Some(message),
            ..state
        },

        Event::GenerateRequested => match state.phase() {
            Phase::Idle => UiState {
                error: Some(MISSING_SOURCE_MESSAGE.to_string()),
                ..state
            },
            Phase::Generating => state,
            Phase::Ready => UiState {
                loading: true,
                error: None,
                generated_image: None,
                ..state
            },
        },

        Event::GenerationSucceeded(image) => UiState {
            generated_image: Some(image),
            error: None,
            loading: false,
            ..state
        },

        Event::GenerationFailed(message) => UiState {
            generated_image: None,
            error: Some(message),
            loading: false,
            ..state
        },
    }
}

/// A file ready to be handed to the browser's save mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: &'static str,
    pub bytes: Vec<u8>,
}

/// Drives [`reduce`] with the two suspending operations: reading the
/// selected file and calling the generator.
pub struct Controller {
    state: UiState,
    generator: Arc<dyn ImageGenerator>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Controller {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self {
            state: UiState::default(),
            generator,
        }
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn view(&self) -> UiView {
        self.state.view()
    }

    /// Applies an event directly, for failures detected outside the controller.
    pub fn dispatch(&mut self, event: Event) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, event);
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.dispatch(Event::PromptChanged(prompt.into()));
    }

    /// Decodes a selected file into the source image.
    ///
    /// Returns whether the file was accepted. A rejected file only sets the
    /// error message.
    pub async fn select_file<F, B, E>(&mut self, declared_type: &str, read: F) -> bool
    where
        F: Future<Output = Result<B, E>>,
        B: AsRef<[u8]>,
        E: fmt::Display,
    {
        match image::decode(declared_type, read).await {
            Ok(image) => {
                self.dispatch(Event::ImageDecoded(image));
                true
            }
            Err(e) => {
                self.dispatch(Event::DecodeFailed(e.to_string()));
                false
            }
        }
    }

    /// Runs one generation round trip.
    ///
    /// Loading is always cleared on return: both completion events reset it.
    pub async fn generate(&mut self) {
        self.dispatch(Event::GenerateRequested);
        if self.state.phase() != Phase::Generating {
            return;
        }

        let Some(source) = self.state.source_image.clone() else {
            return;
        };
        let prompt = self.state.prompt.clone();

        let event = match self.generator.generate(&source, &prompt).await {
            Ok(image) => Event::GenerationSucceeded(image),
            Err(e) => {
                tracing::debug!(error = %e, "generation failed");
                Event::GenerationFailed(e.to_string())
            }
        };
        self.dispatch(event);
    }

    /// The generated headshot as a file, if there is one.
    pub fn download(&self) -> Option<Download> {
        self.state.generated_image.as_ref().map(|image| Download {
            filename: DOWNLOAD_FILENAME,
            bytes: image.decode(),
        })
    }
}
