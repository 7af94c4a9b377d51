//! HTTP surface: the page and the generate endpoint.

use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controller::{Controller, Event, UiView};
use crate::error::HeadshotError;
use crate::generation::ImageGenerator;

#[derive(Clone)]
pub struct AppState {
    generator: Arc<dyn ImageGenerator>,
}

impl AppState {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self { generator }
    }
}

/// Builds the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/generate", post(generate_headshot))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

/// Runs one select → generate cycle for the uploaded `image` part and the
/// optional `style` part. Failures are reported in the view, never as an
/// HTTP error.
async fn generate_headshot(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Json<UiView> {
    let mut controller = Controller::new(state.generator.clone());
    let mut rejected = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "malformed upload");
                controller
                    .dispatch(Event::DecodeFailed(HeadshotError::read_failed().to_string()));
                return Json(controller.view());
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "style" => match field.text().await {
                Ok(style) => controller.set_prompt(style),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read style text");
                    controller
                        .dispatch(Event::DecodeFailed(HeadshotError::read_failed().to_string()));
                    return Json(controller.view());
                }
            },
            "image" => {
                let declared_type = field.content_type().unwrap_or_default().to_string();
                tracing::info!(
                    declared_type = %declared_type,
                    file_name = field.file_name().unwrap_or_default(),
                    "received upload"
                );
                rejected = !controller.select_file(&declared_type, field.bytes()).await;
            }
            other => tracing::debug!(field = other, "ignoring unknown form field"),
        }
    }

    if !rejected {
        controller.generate().await;
    }

    Json(controller.view())
}
