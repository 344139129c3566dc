//! # Respic
//!
//! Responsive HTML `<img>`/`<picture>` markup rendering. Given one logical
//! image reference, a set of per-call arguments, and site-wide defaults,
//! decide exactly which tags, attributes and srcset candidates to produce —
//! breakpoint sources, retina multipliers, webp alternates, explicit width
//! variants — and serialize them as one deterministic string.
//!
//! # Architecture: Resolve, Then Build
//!
//! A render call runs through two stages with a one-directional data flow:
//!
//! ```text
//! 1. Resolve   arguments + defaults  →  ResolvedConfiguration
//! 2. Build     resolved config       →  ordered tag list  →  markup string
//! ```
//!
//! The resolver answers every "is feature X active, with which parameters"
//! question up front; the builder only reads resolved decisions and never
//! re-derives precedence. Everything that touches actual image bytes sits
//! behind two traits ([`processor::ImageProcessor`],
//! [`processor::ImageRepository`]) supplied by the embedding system — this
//! crate performs no bitmap work at all.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`args`] | Per-call arguments: dimensions, flags, per-source override sets |
//! | [`defaults`] | Site-wide defaults — `defaults.toml` loading and validation |
//! | [`resolve`] | Precedence rules merging arguments with defaults |
//! | [`crop`] | Stored crop definitions: variant collections, crop and focus areas |
//! | [`processor`] | External collaborator seams: image repository and processor traits |
//! | [`geometry`] | Pure dimension math for processed renditions |
//! | [`preview`] | Deterministic processor/repository stand-ins backing the CLI |
//! | [`tag`] | Tag descriptors: ordered attributes, whitelists, serialization |
//! | [`render`] | The builder — assembles and serializes the tag sequence |
//!
//! # Design Decisions
//!
//! ## Attribute Order Is the Contract
//!
//! Browsers don't care about attribute order, but deterministic output does:
//! snapshot tests, HTML diffing and cache keys all depend on byte-identical
//! markup for identical input. Tags therefore carry their attributes in an
//! insertion-ordered map and serialize them exactly in the order the builder
//! set them. The same applies one level up: `source` tags emit in the
//! caller's insertion order, and every synthesized webp alternate has a
//! fixed position relative to its sibling.
//!
//! ## No Bitmap Work
//!
//! Processing instructions (target box, crop rectangle, output format,
//! encoder parameters) are handed to an [`processor::ImageProcessor`]
//! implementation, which returns a rendition descriptor: final width,
//! height, URI, mime type. Production implementations wrap whatever the
//! embedding system uses — a CMS file layer, an image CDN. The bundled
//! [`preview::PreviewProcessor`] fabricates descriptors deterministically so
//! markup can be inspected and tested without touching a single pixel.
//!
//! ## Typed Dimensions
//!
//! Width and height strings (`"400"`, `"400c"`, `"400m"`) parse into an
//! [`args::Dimension`] carrying the pixel value and its sizing mode. The
//! mode travels with the value, so scaling for retina multipliers or srcset
//! variant widths keeps crop-forcing semantics without re-parsing suffixes.

pub mod args;
pub mod crop;
pub mod defaults;
pub mod geometry;
pub mod preview;
pub mod processor;
pub mod render;
pub mod resolve;
pub mod tag;
