//! The generation seam and the instruction sent with every photo.

use async_trait::async_trait;

use crate::error::Result;
use crate::image::ImageBytes;

/// Style used when the user leaves the style text blank.
pub const DEFAULT_STYLE: &str =
    "a standard, friendly cartoon style with clean outlines and vibrant colors";

/// Turns a source photo into a cartoon headshot.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Makes one round trip to the generation service.
    ///
    /// Transport and service failures come back as
    /// [`HeadshotError::GenerationFailed`](crate::HeadshotError::GenerationFailed);
    /// an answer without image data as
    /// [`HeadshotError::NoImageInResponse`](crate::HeadshotError::NoImageInResponse).
    async fn generate(&self, image: &ImageBytes, style: &str) -> Result<ImageBytes>;
}

/// Builds the instruction that accompanies the source photo.
///
/// A non-blank `style` is embedded verbatim.
pub fn build_instruction(style: &str) -> String {
    let style = if style.trim().is_empty() {
        DEFAULT_STYLE
    } else {
        style
    };

    format!(
        "Transform the person in this photo into a cartoon headshot. \
         Keep their likeness, expression and distinctive features recognizable, \
         frame the result as a head-and-shoulders portrait on a simple background, \
         and return only the image. Style: {style}"
    )
}
