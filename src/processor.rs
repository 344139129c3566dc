//! External collaborator seams: image repository and image processor.
//!
//! The core never touches pixels. Everything that resolves a logical image
//! reference or produces a processed rendition sits behind two traits:
//!
//! - [`ImageRepository`] resolves a path/id (or direct handle) to an
//!   [`ImageRef`] carrying the properties the builder reads: native
//!   extension, pixel dimensions, stored alternative text, title and crop
//!   definition.
//! - [`ImageProcessor`] takes an [`ImageRef`] plus [`ProcessingInstructions`]
//!   and returns a [`ProcessedImage`] descriptor (final width, height, URI,
//!   mime type), synchronously. Any failure is fatal for the render call
//!   that triggered it; the core performs no retries.
//!
//! The production implementation belongs to the embedding system (a CMS
//! file-abstraction layer, an image CDN client, ...). This crate ships
//! [`PreviewProcessor`](crate::preview::PreviewProcessor) for the CLI and a
//! recording mock for tests.

use crate::args::Dimension;
use crate::crop::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessorError {
    #[error("image not found: {0}")]
    NotFound(String),
    #[error("unreadable source image: {0}")]
    Unreadable(String),
    #[error("invalid processing instructions: {0}")]
    InvalidInstructions(String),
}

/// A resolved image handle: the properties a render call reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImageRef {
    /// Repository identifier (path, uid, ...). Also the basis of fabricated
    /// preview URIs.
    pub identifier: String,
    /// Native file extension, lowercase, without the dot.
    pub extension: String,
    pub width: u32,
    pub height: u32,
    /// Stored alternative text; the `alt` fallback.
    pub alternative: Option<String>,
    /// Stored title; the `title` fallback.
    pub title: Option<String>,
    /// Stored crop definition string (JSON), if any.
    pub crop: Option<String>,
}

impl Default for ImageRef {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            extension: String::new(),
            width: 0,
            height: 0,
            alternative: None,
            title: None,
            crop: None,
        }
    }
}

impl ImageRef {
    /// Vector formats are never rasterized, retina-scaled or re-encoded.
    pub fn is_vector(&self) -> bool {
        self.extension == "svg"
    }
}

/// Encoder parameter attached when a webp rendition is produced from a
/// non-webp source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebpEncoding {
    Lossless,
    Quality(u32),
}

/// One processing request: target constraints, crop region, format.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingInstructions {
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Absolute pixel crop region, already resolved against the source.
    pub crop: Option<Rect>,
    /// Target file extension; `None` keeps the source format.
    pub file_extension: Option<String>,
    pub encoder: Option<WebpEncoding>,
}

/// Descriptor of a processed rendition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    pub width: u32,
    pub height: u32,
    pub uri: String,
    pub mime_type: String,
}

/// Produces processed renditions from an image plus instructions.
pub trait ImageProcessor {
    fn process(
        &self,
        image: &ImageRef,
        instructions: &ProcessingInstructions,
    ) -> Result<ProcessedImage, ProcessorError>;

    /// Resolve the public URI of a processed rendition.
    fn resolve_uri(&self, processed: &ProcessedImage, absolute: bool) -> String;
}

/// Resolves logical image references to concrete handles.
pub trait ImageRepository {
    /// `handle` takes precedence over `src`; `treat_id_as_reference` marks
    /// `src` as a reference-record id rather than a file path.
    fn get_image(
        &self,
        src: &str,
        handle: Option<&ImageRef>,
        treat_id_as_reference: bool,
    ) -> Result<ImageRef, ProcessorError>;
}

/// Mime type for a file extension. Unknown extensions map to `image/<ext>`.
pub fn mime_for_extension(extension: &str) -> String {
    match extension {
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        "svg" => "image/svg+xml".to_string(),
        "tif" | "tiff" => "image/tiff".to_string(),
        other => format!("image/{other}"),
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock processor that records every processing request.
    ///
    /// Renditions are fabricated from the instructions alone: the width is
    /// the requested width (falling back to max-width, then the source),
    /// likewise the height, and the URI is
    /// `<identifier stem>-<width>x<height>.<extension>`. Uses a Mutex so a
    /// shared reference can record across calls.
    #[derive(Default)]
    pub struct MockProcessor {
        pub requests: Mutex<Vec<ProcessingInstructions>>,
        pub fail: bool,
    }

    impl MockProcessor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn recorded(&self) -> Vec<ProcessingInstructions> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl ImageProcessor for MockProcessor {
        fn process(
            &self,
            image: &ImageRef,
            instructions: &ProcessingInstructions,
        ) -> Result<ProcessedImage, ProcessorError> {
            self.requests.lock().unwrap().push(instructions.clone());
            if self.fail {
                return Err(ProcessorError::Unreadable(image.identifier.clone()));
            }
            let width = instructions
                .width
                .map(|d| d.pixels)
                .or(instructions.max_width)
                .unwrap_or(image.width);
            let height = instructions
                .height
                .map(|d| d.pixels)
                .or(instructions.max_height)
                .unwrap_or(image.height);
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
            if absolute {
                format!("https://example.com/{}", processed.uri)
            } else {
                processed.uri.clone()
            }
        }
    }

    /// Repository serving a fixed set of images by identifier.
    #[derive(Default)]
    pub struct MockRepository {
        pub images: Vec<ImageRef>,
    }

    impl MockRepository {
        pub fn with(images: Vec<ImageRef>) -> Self {
            Self { images }
        }
    }

    impl ImageRepository for MockRepository {
        fn get_image(
            &self,
            src: &str,
            handle: Option<&ImageRef>,
            _treat_id_as_reference: bool,
        ) -> Result<ImageRef, ProcessorError> {
            if let Some(handle) = handle {
                return Ok(handle.clone());
            }
            self.images
                .iter()
                .find(|image| image.identifier == src)
                .cloned()
                .ok_or_else(|| ProcessorError::NotFound(src.to_string()))
        }
    }

    #[test]
    fn mock_fabricates_uri_from_instructions() {
        let processor = MockProcessor::new();
        let image = ImageRef {
            identifier: "photos/dawn.png".into(),
            extension: "png".into(),
            width: 2000,
            height: 1000,
            ..Default::default()
        };
        let processed = processor
            .process(
                &image,
                &ProcessingInstructions {
                    width: Some(Dimension::exact(400)),
                    height: Some(Dimension::exact(200)),
                    file_extension: Some("webp".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(processed.uri, "photos/dawn-400x200.webp");
        assert_eq!(processed.mime_type, "image/webp");
        assert_eq!(processor.recorded().len(), 1);
    }

    #[test]
    fn mock_falls_back_to_source_dimensions() {
        let processor = MockProcessor::new();
        let image = ImageRef {
            identifier: "logo.svg".into(),
            extension: "svg".into(),
            width: 64,
            height: 64,
            ..Default::default()
        };
        let processed = processor
            .process(&image, &ProcessingInstructions::default())
            .unwrap();
        assert_eq!((processed.width, processed.height), (64, 64));
        assert_eq!(processed.mime_type, "image/svg+xml");
    }

    #[test]
    fn repository_prefers_the_direct_handle() {
        let repository = MockRepository::default();
        let handle = ImageRef {
            identifier: "direct.png".into(),
            extension: "png".into(),
            ..Default::default()
        };
        let image = repository.get_image("ignored", Some(&handle), false).unwrap();
        assert_eq!(image.identifier, "direct.png");
    }

    #[test]
    fn repository_fails_on_unknown_identifier() {
        let repository = MockRepository::default();
        assert!(matches!(
            repository.get_image("missing.png", None, false),
            Err(ProcessorError::NotFound(_))
        ));
    }

    #[test]
    fn mime_lookup_covers_common_formats() {
        assert_eq!(mime_for_extension("png"), "image/png");
        assert_eq!(mime_for_extension("jpg"), "image/jpeg");
        assert_eq!(mime_for_extension("jpeg"), "image/jpeg");
        assert_eq!(mime_for_extension("webp"), "image/webp");
        assert_eq!(mime_for_extension("svg"), "image/svg+xml");
        assert_eq!(mime_for_extension("avif"), "image/avif");
    }
}
