//! Per-call render arguments.
//!
//! [`RenderArguments`] is the full argument surface of one render call:
//! which image, target dimensions, feature flags, plus the optional
//! `sources` map of per-breakpoint override sets. It is immutable for the
//! duration of a render pass; the builder works on [`TagArguments`] copies
//! merged per tag.
//!
//! ## Dimension strings
//!
//! Width and height accept three forms, parsed into a typed [`Dimension`]:
//!
//! - `"400"` — plain target size
//! - `"400c"` — crop-forcing: fill the target exactly, cropping overflow
//! - `"400m"` — minimum-fit: scale to fit within, never upscale past it
//!
//! The sizing mode travels with the pixel value, so scaling a dimension
//! (retina multipliers, variant widths) keeps its mode.

use crate::processor::ImageRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("invalid dimension \"{0}\": expected digits with an optional 'c' or 'm' suffix")]
    InvalidDimension(String),
    #[error("invalid variants list \"{0}\": expected comma-separated pixel widths")]
    InvalidVariants(String),
}

/// How a [`Dimension`] constrains the processed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizingMode {
    /// Plain target size.
    #[default]
    Exact,
    /// `c` suffix: fill the target exactly, cropping overflow.
    Crop,
    /// `m` suffix: fit within the target, preserving ratio.
    MinFit,
}

/// A width or height argument: pixel value plus sizing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dimension {
    pub pixels: u32,
    pub mode: SizingMode,
}

impl Dimension {
    pub fn exact(pixels: u32) -> Self {
        Self {
            pixels,
            mode: SizingMode::Exact,
        }
    }

    /// Scale the pixel value, keeping the sizing mode. A crop-forcing
    /// dimension therefore stays crop-forcing after retina scaling.
    pub fn scaled(self, factor: u32) -> Self {
        Self {
            pixels: self.pixels * factor,
            ..self
        }
    }

    pub fn is_crop(self) -> bool {
        self.mode == SizingMode::Crop
    }
}

impl FromStr for Dimension {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, mode) = match s.strip_suffix('c') {
            Some(rest) => (rest, SizingMode::Crop),
            None => match s.strip_suffix('m') {
                Some(rest) => (rest, SizingMode::MinFit),
                None => (s, SizingMode::Exact),
            },
        };
        let pixels = digits
            .parse::<u32>()
            .map_err(|_| ArgumentError::InvalidDimension(s.to_string()))?;
        Ok(Self { pixels, mode })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            SizingMode::Exact => write!(f, "{}", self.pixels),
            SizingMode::Crop => write!(f, "{}c", self.pixels),
            SizingMode::MinFit => write!(f, "{}m", self.pixels),
        }
    }
}

impl TryFrom<String> for Dimension {
    type Error = ArgumentError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Dimension> for String {
    fn from(d: Dimension) -> String {
        d.to_string()
    }
}

/// Parse a `variants` list (`"310,345,400"`) into ascending pixel widths.
pub fn parse_variants(list: &str) -> Result<Vec<u32>, ArgumentError> {
    let mut widths = list
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| ArgumentError::InvalidVariants(list.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    widths.sort_unstable();
    Ok(widths)
}

/// The full argument set of one render call.
///
/// All fields are optional except the image reference (`src` or `image`).
/// `Some("")` is meaningful for `loading` and `crop`: an explicitly empty
/// `loading` suppresses the site-wide lazy-loading default, an explicitly
/// empty `crop` disables the crop stored on the image.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderArguments {
    /// Path or identifier of the image, resolved via the repository.
    pub src: String,
    /// Direct image handle; takes precedence over `src` in repositories
    /// that honor it.
    pub image: Option<ImageRef>,
    /// `src` names a reference record rather than a file.
    pub treat_id_as_reference: bool,

    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,

    /// Explicit crop definition, overriding the crop stored on the image.
    pub crop: Option<String>,
    /// Named crop variant to apply; `"default"` when absent.
    pub crop_variant: Option<String>,
    /// Target file extension, overriding the image's native one.
    pub file_extension: Option<String>,
    /// Resolve URIs as absolute.
    pub absolute: bool,
    /// Prefix prepended to every resolved URI.
    pub src_prefix: Option<String>,

    pub class: Option<String>,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub loading: Option<String>,
    pub decoding: Option<String>,
    /// `sizes` attribute value; mutually exclusive with retina scaling.
    pub sizes: Option<String>,
    /// Comma list of pixel widths for an explicit srcset.
    pub variants: Option<String>,

    pub use_retina: Option<bool>,
    pub add_webp: Option<bool>,
    pub only_webp: Option<bool>,
    pub lossless: Option<bool>,

    /// CSS class for the `<picture>` element, if one is rendered.
    pub picture_class: Option<String>,
    /// Named source override sets, emitted as `<source>` tags in insertion
    /// order.
    pub sources: Option<IndexMap<String, SourceOverrides>>,

    /// Pass-through attributes (`data-*`, `usemap`, ...). Subject to the
    /// per-tag whitelist.
    pub extra_attributes: IndexMap<String, String>,
}

/// Override set for one named `<source>` entry.
///
/// Every present field replaces the corresponding top-level argument for
/// that source tag; absent fields inherit. Overrides never merge nested
/// values.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceOverrides {
    /// Image for this source; the primary image is reused when neither
    /// `src` nor `image` is given.
    pub src: Option<String>,
    pub image: Option<ImageRef>,
    pub treat_id_as_reference: Option<bool>,

    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,

    pub crop: Option<String>,
    pub crop_variant: Option<String>,
    pub file_extension: Option<String>,
    pub sizes: Option<String>,
    pub variants: Option<String>,

    /// Media query; wrapped in parentheses on emission when bare. Replaced
    /// by a matching breakpoint name.
    pub media: Option<String>,
    /// Explicit `type` attribute value.
    #[serde(rename = "type")]
    pub type_attr: Option<String>,
}

impl SourceOverrides {
    /// Whether this source brings its own image.
    pub fn has_own_image(&self) -> bool {
        self.src.as_deref().is_some_and(|s| !s.is_empty()) || self.image.is_some()
    }
}

/// The merged, per-tag view of the arguments a single tag is built from.
///
/// For the primary `img` tag this is a copy of the top-level arguments; for
/// a `source` tag it is that copy with the source's overrides applied.
#[derive(Debug, Clone, Default)]
pub struct TagArguments {
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub min_width: Option<u32>,
    pub min_height: Option<u32>,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub crop: Option<String>,
    pub crop_variant: Option<String>,
    pub file_extension: Option<String>,
    pub sizes: Option<String>,
    pub variants: Option<String>,
    pub media: Option<String>,
    pub type_attr: Option<String>,
}

impl TagArguments {
    pub fn from_render(args: &RenderArguments) -> Self {
        Self {
            width: args.width,
            height: args.height,
            min_width: args.min_width,
            min_height: args.min_height,
            max_width: args.max_width,
            max_height: args.max_height,
            crop: args.crop.clone(),
            crop_variant: args.crop_variant.clone(),
            file_extension: args.file_extension.clone(),
            sizes: args.sizes.clone(),
            variants: args.variants.clone(),
            media: None,
            type_attr: None,
        }
    }

    /// Apply a source's overrides: present fields replace, absent inherit.
    pub fn apply(&mut self, overrides: &SourceOverrides) {
        macro_rules! replace {
            ($($field:ident),+) => {
                $(if overrides.$field.is_some() {
                    self.$field = overrides.$field.clone();
                })+
            };
        }
        replace!(
            width, height, min_width, min_height, max_width, max_height, crop, crop_variant,
            file_extension, sizes, variants, media
        );
        if overrides.type_attr.is_some() {
            self.type_attr = overrides.type_attr.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_parses_plain_value() {
        let d: Dimension = "400".parse().unwrap();
        assert_eq!(d.pixels, 400);
        assert_eq!(d.mode, SizingMode::Exact);
    }

    #[test]
    fn dimension_parses_crop_suffix() {
        let d: Dimension = "400c".parse().unwrap();
        assert_eq!(d.pixels, 400);
        assert!(d.is_crop());
    }

    #[test]
    fn dimension_parses_min_fit_suffix() {
        let d: Dimension = "250m".parse().unwrap();
        assert_eq!(d.mode, SizingMode::MinFit);
    }

    #[test]
    fn dimension_rejects_garbage() {
        assert!("".parse::<Dimension>().is_err());
        assert!("c".parse::<Dimension>().is_err());
        assert!("40x".parse::<Dimension>().is_err());
        assert!("-40".parse::<Dimension>().is_err());
        assert!("400cm".parse::<Dimension>().is_err());
    }

    #[test]
    fn dimension_round_trips_through_display() {
        for s in ["400", "400c", "250m"] {
            assert_eq!(s.parse::<Dimension>().unwrap().to_string(), s);
        }
    }

    #[test]
    fn dimension_scaling_keeps_the_mode() {
        let d = "200c".parse::<Dimension>().unwrap().scaled(2);
        assert_eq!(d.pixels, 400);
        assert!(d.is_crop());

        let d = "200".parse::<Dimension>().unwrap().scaled(3);
        assert_eq!(d.pixels, 600);
        assert!(!d.is_crop());
    }

    #[test]
    fn variants_sort_ascending() {
        assert_eq!(parse_variants("400, 310,345").unwrap(), vec![310, 345, 400]);
    }

    #[test]
    fn variants_reject_non_numeric_entries() {
        assert!(matches!(
            parse_variants("310,wide"),
            Err(ArgumentError::InvalidVariants(_))
        ));
    }

    #[test]
    fn source_overrides_replace_but_never_clear() {
        let args = RenderArguments {
            width: Some(Dimension::exact(400)),
            height: Some(Dimension::exact(200)),
            sizes: Some("100vw".into()),
            ..Default::default()
        };
        let overrides = SourceOverrides {
            width: Some(Dimension::exact(800)),
            media: Some("(min-width: 1024px)".into()),
            ..Default::default()
        };

        let mut merged = TagArguments::from_render(&args);
        merged.apply(&overrides);

        assert_eq!(merged.width, Some(Dimension::exact(800)));
        // inherited, not cleared
        assert_eq!(merged.height, Some(Dimension::exact(200)));
        assert_eq!(merged.sizes.as_deref(), Some("100vw"));
        assert_eq!(merged.media.as_deref(), Some("(min-width: 1024px)"));
    }

    #[test]
    fn top_level_media_and_type_never_leak_into_tag_arguments() {
        let args = RenderArguments::default();
        let merged = TagArguments::from_render(&args);
        assert!(merged.media.is_none());
        assert!(merged.type_attr.is_none());
    }

    #[test]
    fn arguments_deserialize_from_json() {
        let args: RenderArguments = serde_json::from_str(
            r#"{
                "src": "photos/dawn.png",
                "width": "400c",
                "height": "200c",
                "add_webp": true,
                "sources": {
                    "desktop": { "width": "800", "type": "image/png" }
                },
                "extra_attributes": { "data-album": "dawn" }
            }"#,
        )
        .unwrap();
        assert_eq!(args.src, "photos/dawn.png");
        assert!(args.width.unwrap().is_crop());
        assert_eq!(args.add_webp, Some(true));
        let sources = args.sources.unwrap();
        assert_eq!(
            sources["desktop"].type_attr.as_deref(),
            Some("image/png")
        );
        assert_eq!(args.extra_attributes["data-album"], "dawn");
    }

    #[test]
    fn unknown_argument_keys_are_rejected() {
        let result: Result<RenderArguments, _> =
            serde_json::from_str(r#"{ "src": "a.png", "widht": "400" }"#);
        assert!(result.is_err());
    }
}
