//! Configuration resolution.
//!
//! Merges per-call [`RenderArguments`] with [`SiteDefaults`] into one
//! immutable [`ResolvedConfiguration`] answering "is feature X active, with
//! which parameters". The builder only ever reads the resolved value; it
//! never re-derives precedence.
//!
//! ## Precedence
//!
//! Every boolean feature follows `argument ?? site default ?? off`, with
//! two documented exceptions:
//!
//! - webp-adding flags (`add_webp`, `only_webp`) are forced off when the
//!   effective target extension is already webp;
//! - `use_retina` is forced off when a `sizes` value is present — letting
//!   the browser pick among width candidates makes a fixed retina
//!   multiplier meaningless.
//!
//! Each rule is its own function so it can be unit-tested without a render.
//!
//! ## Vector sources
//!
//! SVG images are never rasterized: all raster-only features (webp, retina,
//! breakpoints, lossless) resolve to off/empty. Sources, the picture class
//! and lazy-loading still resolve, so an SVG can participate in a
//! `<picture>` with art-direction sources.

use crate::args::{RenderArguments, SourceOverrides};
use crate::defaults::{RetinaVariant, SiteDefaults, WebpQuality, stock_retina_table};
use indexmap::IndexMap;

/// The immutable decision object of one render call.
#[derive(Debug, Clone)]
pub struct ResolvedConfiguration {
    pub use_retina: bool,
    pub retina_table: Vec<RetinaVariant>,
    pub add_webp: bool,
    pub only_webp: bool,
    pub lossless: bool,
    /// Breakpoint table; `Some` (even empty) activates matching.
    pub breakpoints: Option<IndexMap<String, u32>>,
    /// Source override sets; `Some` (even empty) activates the source loop.
    pub sources: Option<IndexMap<String, SourceOverrides>>,
    pub lazy_loading: Option<String>,
    pub picture_class: Option<String>,
    pub webp_quality: WebpQuality,
}

impl ResolvedConfiguration {
    /// Resolve arguments against defaults for an image of the given native
    /// format.
    pub fn resolve(args: &RenderArguments, defaults: &SiteDefaults, source_format: &str) -> Self {
        let lazy_loading =
            resolve_lazy_loading(defaults.lazy_loading.as_deref(), args.loading.as_deref());
        let picture_class = args.picture_class.clone().filter(|class| !class.is_empty());

        if source_format == "svg" {
            return Self {
                use_retina: false,
                retina_table: Vec::new(),
                add_webp: false,
                only_webp: false,
                lossless: false,
                breakpoints: None,
                sources: args.sources.clone(),
                lazy_loading,
                picture_class,
                webp_quality: defaults.effective_webp_quality(),
            };
        }

        let target_extension = args.file_extension.as_deref().unwrap_or(source_format);
        Self {
            use_retina: resolve_retina_flag(
                args.use_retina,
                defaults.use_retina,
                args.sizes.as_deref(),
            ),
            retina_table: defaults.retina.clone().unwrap_or_else(stock_retina_table),
            add_webp: resolve_webp_flag(target_extension, args.add_webp, defaults.add_webp),
            only_webp: resolve_webp_flag(target_extension, args.only_webp, defaults.only_webp),
            lossless: resolve_flag(args.lossless, defaults.lossless),
            breakpoints: defaults.breakpoints.clone(),
            sources: args.sources.clone(),
            lazy_loading,
            picture_class,
            webp_quality: defaults.effective_webp_quality(),
        }
    }

    pub fn sources_active(&self) -> bool {
        self.sources.is_some()
    }

    pub fn breakpoints_active(&self) -> bool {
        self.breakpoints.is_some()
    }

    /// Whether the emitted sequence is wrapped in a `<picture>` element.
    pub fn picture_tag_needed(&self) -> bool {
        (self.add_webp && !self.only_webp) || self.sources_active() || self.picture_class.is_some()
    }

    /// A webp `source` for the default image precedes the `img` tag when no
    /// sources are configured.
    pub fn webp_before_sources(&self) -> bool {
        self.add_webp && !self.only_webp && !self.sources_active()
    }

    /// With sources configured, the default image's webp fallback comes
    /// after the source loop instead.
    pub fn webp_after_sources(&self) -> bool {
        self.add_webp && !self.only_webp && self.sources_active()
    }
}

/// Plain `argument ?? site default ?? off` precedence.
pub fn resolve_flag(argument: Option<bool>, site_default: Option<bool>) -> bool {
    argument.or(site_default).unwrap_or(false)
}

/// Precedence for webp-adding flags: forced off when the target is already
/// webp, otherwise plain precedence.
pub fn resolve_webp_flag(
    target_extension: &str,
    argument: Option<bool>,
    site_default: Option<bool>,
) -> bool {
    if target_extension == "webp" {
        false
    } else {
        resolve_flag(argument, site_default)
    }
}

/// Retina precedence: a non-empty `sizes` argument wins over everything.
pub fn resolve_retina_flag(
    argument: Option<bool>,
    site_default: Option<bool>,
    sizes: Option<&str>,
) -> bool {
    if sizes.is_some_and(|s| !s.is_empty()) {
        false
    } else {
        resolve_flag(argument, site_default)
    }
}

/// Lazy loading applies only when the site sets a non-empty value AND the
/// caller did not pass `loading` at all. An explicit argument — including
/// an intentionally empty one — always wins.
pub fn resolve_lazy_loading(
    site_default: Option<&str>,
    loading_argument: Option<&str>,
) -> Option<String> {
    if loading_argument.is_some() {
        return None;
    }
    site_default
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
