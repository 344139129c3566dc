//! Site-wide defaults.
//!
//! [`SiteDefaults`] carries the theme-level configuration a render call
//! falls back to when an argument is absent: webp/retina enablement, the
//! retina multiplier table, named breakpoints, lazy-loading and the webp
//! re-encode quality. Loaded once (typically from `defaults.toml`) and
//! read-only during render — the resolver receives it as an explicit value,
//! never from ambient state.
//!
//! ## File format
//!
//! ```toml
//! # All keys are optional - absent keys leave the feature off.
//!
//! add_webp = true           # render webp alternates by default
//! use_retina = true         # render retina srcset candidates by default
//! lossless = false          # lossless webp re-encodes
//! lazy_loading = "lazy"     # default loading attribute for img tags
//! webp_quality = 85         # quality for webp re-encodes (clamped to 10-100)
//!
//! # Retina multiplier table, in emission order. Stock table is 2 -> "2x".
//! [[retina]]
//! multiplier = 2
//! label = "2x"
//! [[retina]]
//! multiplier = 3
//! label = "3x"
//!
//! # Named breakpoints: source names matching a key get the media query
//! # (min-width: <value>px). Declaring the table (even empty) activates
//! # breakpoint matching.
//! [breakpoints]
//! desktop = 1024
//! mobile = 640
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefaultsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("defaults validation error: {0}")]
    Validation(String),
}

/// One retina srcset candidate: scale factor plus descriptor suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetinaVariant {
    /// Integer scale factor applied to every sizing field.
    pub multiplier: u32,
    /// Descriptor appended to the srcset entry, e.g. `"2x"`.
    pub label: String,
}

/// The stock retina table used when defaults don't configure one.
pub fn stock_retina_table() -> Vec<RetinaVariant> {
    vec![RetinaVariant {
        multiplier: 2,
        label: "2x".to_string(),
    }]
}

/// Quality for webp re-encodes of non-webp sources (10-100).
///
/// Clamped on construction; the site-wide default is 85.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebpQuality(u32);

impl WebpQuality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(10, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for WebpQuality {
    fn default() -> Self {
        Self(85)
    }
}

/// Site/theme-wide defaults for the configuration resolver.
///
/// Every field is optional: `None` means "no site-wide opinion", which the
/// resolver maps to the feature being off. Presence of the `breakpoints`
/// table (not its emptiness) activates breakpoint matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteDefaults {
    pub use_retina: Option<bool>,
    pub add_webp: Option<bool>,
    pub only_webp: Option<bool>,
    pub lossless: Option<bool>,
    /// Retina multiplier table in emission order; stock table when absent.
    pub retina: Option<Vec<RetinaVariant>>,
    /// Named breakpoint table: source name -> min-width pixel value.
    pub breakpoints: Option<IndexMap<String, u32>>,
    /// Default `loading` attribute value; empty means none.
    pub lazy_loading: Option<String>,
    pub webp_quality: Option<u32>,
}

impl SiteDefaults {
    /// Load defaults from a TOML file and validate them.
    pub fn load(path: &Path) -> Result<Self, DefaultsError> {
        let content = fs::read_to_string(path)?;
        let defaults: SiteDefaults = toml::from_str(&content)?;
        defaults.validate()?;
        Ok(defaults)
    }

    /// Validate values are usable before any render call sees them.
    pub fn validate(&self) -> Result<(), DefaultsError> {
        if let Some(retina) = &self.retina {
            for variant in retina {
                if variant.multiplier < 2 {
                    return Err(DefaultsError::Validation(format!(
                        "retina multiplier must be 2 or greater, got {}",
                        variant.multiplier
                    )));
                }
                if variant.label.is_empty() {
                    return Err(DefaultsError::Validation(
                        "retina label must not be empty".into(),
                    ));
                }
            }
        }
        if let Some(breakpoints) = &self.breakpoints {
            for (name, value) in breakpoints {
                if *value == 0 {
                    return Err(DefaultsError::Validation(format!(
                        "breakpoint \"{name}\" must have a non-zero min-width"
                    )));
                }
            }
        }
        Ok(())
    }

    /// The effective webp re-encode quality, clamped.
    pub fn effective_webp_quality(&self) -> WebpQuality {
        self.webp_quality.map(WebpQuality::new).unwrap_or_default()
    }
}

/// A documented stock `defaults.toml`, printed by `respic gen-defaults`.
pub fn stock_toml() -> &'static str {
    r#"# respic site-wide defaults.
# All keys are optional - absent keys leave the feature off.

# Render a webp alternate for every raster image.
add_webp = true

# Default loading attribute for img tags. Callers passing an explicit
# `loading` argument (even an empty one) override this.
lazy_loading = "lazy"

# Quality for webp re-encodes of non-webp sources, clamped to 10-100.
webp_quality = 85

# Retina srcset candidates, in emission order. Omit the whole table to use
# the stock 2 -> "2x" entry; set use_retina to enable by default.
# use_retina = true
# [[retina]]
# multiplier = 2
# label = "2x"

# Named breakpoints: a source entry whose name matches a key gets
# media="(min-width: <value>px)" injected.
# [breakpoints]
# desktop = 1024
# mobile = 640
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_defaults_have_no_opinion() {
        let defaults: SiteDefaults = toml::from_str("").unwrap();
        assert_eq!(defaults.add_webp, None);
        assert_eq!(defaults.retina, None);
        assert_eq!(defaults.breakpoints, None);
        assert_eq!(defaults.lazy_loading, None);
    }

    #[test]
    fn retina_table_preserves_declaration_order() {
        let defaults: SiteDefaults = toml::from_str(
            r#"
            [[retina]]
            multiplier = 2
            label = "2x"
            [[retina]]
            multiplier = 3
            label = "3x"
            "#,
        )
        .unwrap();
        let retina = defaults.retina.unwrap();
        assert_eq!(retina[0].multiplier, 2);
        assert_eq!(retina[1].multiplier, 3);
    }

    #[test]
    fn breakpoints_preserve_declaration_order() {
        let defaults: SiteDefaults = toml::from_str(
            r#"
            [breakpoints]
            desktop = 1024
            tablet = 768
            mobile = 640
            "#,
        )
        .unwrap();
        let names: Vec<_> = defaults.breakpoints.unwrap().into_keys().collect();
        assert_eq!(names, vec!["desktop", "tablet", "mobile"]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<SiteDefaults, _> = toml::from_str("addWebp = true");
        assert!(result.is_err());
    }

    #[test]
    fn webp_quality_clamps_to_valid_range() {
        assert_eq!(WebpQuality::new(5).value(), 10);
        assert_eq!(WebpQuality::new(85).value(), 85);
        assert_eq!(WebpQuality::new(150).value(), 100);
    }

    #[test]
    fn webp_quality_defaults_to_85() {
        assert_eq!(SiteDefaults::default().effective_webp_quality().value(), 85);
    }

    #[test]
    fn validation_rejects_multiplier_below_two() {
        let defaults = SiteDefaults {
            retina: Some(vec![RetinaVariant {
                multiplier: 1,
                label: "1x".into(),
            }]),
            ..Default::default()
        };
        assert!(defaults.validate().is_err());
    }

    #[test]
    fn validation_rejects_zero_breakpoint() {
        let defaults: SiteDefaults = toml::from_str("[breakpoints]\ndesktop = 0").unwrap();
        assert!(defaults.validate().is_err());
    }

    #[test]
    fn load_reads_and_validates_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "add_webp = true\nlazy_loading = \"lazy\"\n[breakpoints]\ndesktop = 1024\n"
        )
        .unwrap();
        let defaults = SiteDefaults::load(file.path()).unwrap();
        assert_eq!(defaults.add_webp, Some(true));
        assert_eq!(defaults.breakpoints.unwrap()["desktop"], 1024);
    }

    #[test]
    fn stock_toml_parses_and_validates() {
        let defaults: SiteDefaults = toml::from_str(stock_toml()).unwrap();
        defaults.validate().unwrap();
        assert_eq!(defaults.add_webp, Some(true));
        assert_eq!(defaults.lazy_loading.as_deref(), Some("lazy"));
    }
}
