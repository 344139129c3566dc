//! Deterministic stand-ins for the external collaborators.
//!
//! [`PreviewProcessor`] fabricates rendition descriptors without touching
//! pixels: the output size comes from [`geometry`](crate::geometry), the
//! URI is `<stem>-<width>x<height>.<extension>`. Two renders with the same
//! inputs fabricate identical URIs, which makes the CLI output inspectable
//! and the integration tests exact-string assertable.
//!
//! [`PreviewRepository`] resolves a path to an [`ImageRef`] by deriving the
//! extension from the path and assuming configured source dimensions. A
//! direct handle in the arguments always wins, so callers can supply real
//! dimensions, alt text or a crop definition per image.

use crate::geometry::processed_dimensions;
use crate::processor::{
    ImageProcessor, ImageRef, ImageRepository, ProcessedImage, ProcessingInstructions,
    ProcessorError, mime_for_extension,
};

/// Processor that fabricates descriptors instead of encoding images.
#[derive(Debug, Clone, Default)]
pub struct PreviewProcessor;

impl ImageProcessor for PreviewProcessor {
    fn process(
        &self,
        image: &ImageRef,
        instructions: &ProcessingInstructions,
    ) -> Result<ProcessedImage, ProcessorError> {
        if image.width == 0 || image.height == 0 {
            return Err(ProcessorError::Unreadable(format!(
                "{}: unknown source dimensions",
                image.identifier
            )));
        }
        let (width, height) = processed_dimensions((image.width, image.height), instructions);
        let extension = instructions
            .file_extension
            .clone()
            .unwrap_or_else(|| image.extension.clone());
        let stem = image
            .identifier
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&image.identifier);
        Ok(ProcessedImage {
            width,
            height,
            uri: format!("{stem}-{width}x{height}.{extension}"),
            mime_type: mime_for_extension(&extension),
        })
    }

    fn resolve_uri(&self, processed: &ProcessedImage, absolute: bool) -> String {
        if absolute && !processed.uri.starts_with('/') {
            format!("/{}", processed.uri)
        } else {
            processed.uri.clone()
        }
    }
}

/// Repository deriving image handles from paths.
#[derive(Debug, Clone)]
pub struct PreviewRepository {
    /// Source dimensions assumed for every path-derived image.
    pub source_dimensions: (u32, u32),
}

impl Default for PreviewRepository {
    fn default() -> Self {
        Self {
            source_dimensions: (2000, 1500),
        }
    }
}

impl PreviewRepository {
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            source_dimensions: (width, height),
        }
    }
}

impl ImageRepository for PreviewRepository {
    fn get_image(
        &self,
        src: &str,
        handle: Option<&ImageRef>,
        _treat_id_as_reference: bool,
    ) -> Result<ImageRef, ProcessorError> {
        if let Some(handle) = handle {
            return Ok(handle.clone());
        }
        if src.is_empty() {
            return Err(ProcessorError::NotFound(
                "no src and no image handle given".to_string(),
            ));
        }
        let extension = src
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if extension.is_empty() {
            return Err(ProcessorError::NotFound(format!(
                "{src}: cannot derive a file extension"
            )));
        }
        Ok(ImageRef {
            identifier: src.to_string(),
            extension,
            width: self.source_dimensions.0,
            height: self.source_dimensions.1,
            ..Default::default()
        })
    }
}
