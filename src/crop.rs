//! Crop variant collections.
//!
//! Images carry a stored crop definition: a JSON object mapping variant
//! names to relative crop and focus areas, e.g.
//!
//! ```json
//! {
//!   "default": {
//!     "cropArea": { "x": 0.1, "y": 0.1, "width": 0.8, "height": 0.8 },
//!     "focusArea": { "x": 0.4, "y": 0.4, "width": 0.2, "height": 0.2 }
//!   },
//!   "mobile": {
//!     "cropArea": { "x": 0.0, "y": 0.25, "width": 1.0, "height": 0.5 }
//!   }
//! }
//! ```
//!
//! All coordinates are fractions of the image size; [`Area::make_absolute`]
//! converts them to pixel rectangles against a concrete image. A crop area
//! covering the whole image is treated as "no crop".
//!
//! An empty or unparsable definition yields an empty collection — images
//! without crop data are the common case, not an error. Whether a *named*
//! variant missing from a non-empty collection is an error is the render
//! layer's call, via [`CropVariantCollection::has_variant`].

use indexmap::IndexMap;
use serde::Deserialize;
use std::fmt;

/// A rectangle in relative coordinates (fractions of the image size).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Area {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Area {
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Whether this area spans the full image.
    pub fn covers_everything(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.width == 1.0 && self.height == 1.0
    }

    /// Convert to an absolute pixel rectangle against an image size.
    pub fn make_absolute(&self, image_width: u32, image_height: u32) -> Rect {
        Rect {
            x: (self.x * image_width as f64).round() as u32,
            y: (self.y * image_height as f64).round() as u32,
            width: (self.width * image_width as f64).round() as u32,
            height: (self.height * image_height as f64).round() as u32,
        }
    }
}

/// An absolute pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Rect {
    /// JSON object form, used verbatim as the `data-focus-area` value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"{{"x":{},"y":{},"width":{},"height":{}}}"#,
            self.x, self.y, self.width, self.height
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredVariant {
    crop_area: Option<Area>,
    focus_area: Option<Area>,
}

/// Parsed crop definition: variant name -> crop/focus areas.
#[derive(Debug, Clone, Default)]
pub struct CropVariantCollection {
    variants: IndexMap<String, StoredVariant>,
}

impl CropVariantCollection {
    /// Parse a stored crop definition. Empty or unparsable input yields an
    /// empty collection.
    pub fn create(definition: &str) -> Self {
        if definition.trim().is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<IndexMap<String, StoredVariant>>(definition) {
            Ok(variants) => Self { variants },
            Err(_) => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn has_variant(&self, name: &str) -> bool {
        self.variants.contains_key(name)
    }

    /// The crop area of a variant. `None` when the variant is missing, the
    /// area is degenerate, or it covers the whole image.
    pub fn crop_area(&self, name: &str) -> Option<Area> {
        self.variants
            .get(name)
            .and_then(|variant| variant.crop_area)
            .filter(|area| !area.is_empty() && !area.covers_everything())
    }

    /// The focus area of a variant, if a non-degenerate one is defined.
    pub fn focus_area(&self, name: &str) -> Option<Area> {
        self.variants
            .get(name)
            .and_then(|variant| variant.focus_area)
            .filter(|area| !area.is_empty())
    }
}
