//! Markup assembly.
//!
//! [`Renderer::render`] turns one [`RenderArguments`] + [`SiteDefaults`]
//! pair into a serialized `<img>` or `<picture>` string. The emission order
//! is contractual:
//!
//! 1. the webp alternate for the default image, when no sources are
//!    configured;
//! 2. each configured source, in caller insertion order — every non-webp
//!    source directly preceded by its synthesized webp alternate when
//!    `add_webp` is active;
//! 3. the webp fallback for the default image, when sources are configured;
//! 4. the primary `img` tag, always last;
//! 5. the whole sequence wrapped in `<picture>` only when webp alternates,
//!    sources or a picture class require it.
//!
//! Each tag is built by a pure function from the merged per-tag arguments;
//! no builder state is carried between tags. All image variants are
//! resolved through the [`ImageProcessor`] seam; a processor failure aborts
//! the render with no partial output.

use crate::args::{
    ArgumentError, Dimension, RenderArguments, SizingMode, TagArguments, parse_variants,
};
use crate::crop::{CropVariantCollection, Rect};
use crate::defaults::SiteDefaults;
use crate::processor::{
    ImageProcessor, ImageRef, ImageRepository, ProcessedImage, ProcessingInstructions,
    ProcessorError, WebpEncoding,
};
use crate::resolve::ResolvedConfiguration;
use crate::tag::{TagDescriptor, TagKind, escape_attribute};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Argument(#[from] ArgumentError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error("unknown crop variant \"{0}\"")]
    UnknownCropVariant(String),
}

/// Stateless markup renderer over the external collaborator seams.
pub struct Renderer<'a> {
    processor: &'a dyn ImageProcessor,
    repository: &'a dyn ImageRepository,
}

/// A built tag plus the rendition backing it. The builder inspects the
/// rendition's mime type to decide whether a webp sibling is needed.
struct BuiltTag {
    tag: TagDescriptor,
    processed: ProcessedImage,
}

/// Crop lookup context for one tag: parsed collection plus variant name.
struct CropContext {
    collection: CropVariantCollection,
    variant: String,
}

impl<'a> Renderer<'a> {
    pub fn new(processor: &'a dyn ImageProcessor, repository: &'a dyn ImageRepository) -> Self {
        Self {
            processor,
            repository,
        }
    }

    /// Render the markup for one call. Pure with respect to the call: the
    /// same arguments and defaults always yield the same string.
    pub fn render(
        &self,
        args: &RenderArguments,
        defaults: &SiteDefaults,
    ) -> Result<String, RenderError> {
        let image =
            self.repository
                .get_image(&args.src, args.image.as_ref(), args.treat_id_as_reference)?;
        let resolved = ResolvedConfiguration::resolve(args, defaults, &image.extension);

        let mut img_arguments = TagArguments::from_render(args);
        if resolved.only_webp {
            img_arguments.file_extension = Some("webp".to_string());
        }
        let img = self.build_tag(TagKind::Img, &img_arguments, args, &resolved, &image)?;

        let mut tags: Vec<TagDescriptor> = Vec::new();

        if resolved.webp_before_sources() {
            tags.push(self.build_webp_source(
                TagArguments::from_render(args),
                args,
                &resolved,
                &image,
            )?);
        }

        if let Some(sources) = &resolved.sources {
            for (name, overrides) in sources {
                let source_image = if overrides.has_own_image() {
                    self.repository.get_image(
                        overrides.src.as_deref().unwrap_or(""),
                        overrides.image.as_ref(),
                        overrides.treat_id_as_reference.unwrap_or(false),
                    )?
                } else {
                    image.clone()
                };

                let mut merged = TagArguments::from_render(args);
                merged.apply(overrides);
                // a matching breakpoint name replaces any explicit media
                if let Some(breakpoints) = &resolved.breakpoints {
                    if let Some(min_width) = breakpoints.get(name) {
                        merged.media = Some(format!("(min-width: {min_width}px)"));
                    }
                }
                if resolved.only_webp && !source_image.is_vector() {
                    merged.file_extension = Some("webp".to_string());
                }

                let built =
                    self.build_tag(TagKind::Source, &merged, args, &resolved, &source_image)?;
                if built.processed.mime_type != "image/webp"
                    && resolved.add_webp
                    && !source_image.is_vector()
                {
                    // the webp alternate immediately precedes its sibling
                    tags.push(self.build_webp_source(merged, args, &resolved, &source_image)?);
                }
                tags.push(built.tag);
            }
            if resolved.webp_after_sources() {
                tags.push(self.build_webp_source(
                    TagArguments::from_render(args),
                    args,
                    &resolved,
                    &image,
                )?);
            }
        }

        tags.push(img.tag);

        Ok(serialize(&tags, &resolved))
    }

    /// Build one `img` or `source` tag from merged per-tag arguments.
    fn build_tag(
        &self,
        kind: TagKind,
        arguments: &TagArguments,
        args: &RenderArguments,
        resolved: &ResolvedConfiguration,
        image: &ImageRef,
    ) -> Result<BuiltTag, RenderError> {
        let mut tag = TagDescriptor::new(kind);
        for (name, value) in &args.extra_attributes {
            tag.set_attribute(name, value.clone());
        }
        tag.retain_allowed();

        let crop = crop_context(arguments, image)?;
        let instructions = self.processing_instructions(arguments, &crop, resolved, image);
        let srcset_value = self.build_variants_srcset(arguments, &crop, args, resolved, image)?;

        // the default rendition: src fallback and width/height attributes
        let processed = self.processor.process(image, &instructions)?;
        let uri = self.image_uri(&processed, args);

        match kind {
            TagKind::Img => {
                if !tag.has_attribute("data-focus-area") {
                    if let Some(focus) = crop.collection.focus_area(&crop.variant) {
                        tag.set_attribute(
                            "data-focus-area",
                            focus.make_absolute(image.width, image.height).to_string(),
                        );
                    }
                }
                if let Some(srcset) = &srcset_value {
                    tag.set_attribute("srcset", srcset.clone());
                }
                tag.set_attribute("src", uri.clone());
                if let Some(sizes) = non_empty(arguments.sizes.as_deref()) {
                    tag.set_attribute("sizes", sizes);
                }
                tag.set_attribute("width", processed.width.to_string());
                tag.set_attribute("height", processed.height.to_string());
                if let Some(class) = non_empty(args.class.as_deref()) {
                    tag.set_attribute("class", class);
                }
                if let Some(loading) = non_empty(args.loading.as_deref()) {
                    tag.set_attribute("loading", loading);
                } else if let Some(loading) = &resolved.lazy_loading {
                    tag.set_attribute("loading", loading.clone());
                }
                if let Some(decoding) = non_empty(args.decoding.as_deref()) {
                    tag.set_attribute("decoding", decoding);
                }
                // alt is mandatory for valid markup, so it is emitted even
                // when empty
                let alt = args
                    .alt
                    .clone()
                    .or_else(|| image.alternative.clone())
                    .unwrap_or_default();
                tag.set_attribute("alt", alt);
                let title = args.title.clone().or_else(|| image.title.clone());
                if let Some(title) = title.filter(|t| !t.is_empty()) {
                    tag.set_attribute("title", title);
                }
            }
            TagKind::Source => {
                // source elements have no src; the single rendition becomes
                // the sole srcset candidate
                tag.set_attribute("srcset", srcset_value.unwrap_or_else(|| uri.clone()));
                if let Some(media) = non_empty(arguments.media.as_deref()) {
                    tag.set_attribute("media", wrap_media(media));
                }
                if let Some(sizes) = non_empty(arguments.sizes.as_deref()) {
                    tag.set_attribute("sizes", sizes);
                }
                if let Some(explicit) = non_empty(arguments.type_attr.as_deref()) {
                    tag.set_attribute("type", explicit);
                } else if arguments.media.as_deref().unwrap_or("").is_empty() {
                    // distinguishes same-media alternates
                    tag.set_attribute("type", processed.mime_type.clone());
                }
            }
        }

        if resolved.use_retina && !image.is_vector() {
            self.add_retina(&instructions, &mut tag, &uri, args, resolved, image)?;
        }

        Ok(BuiltTag { tag, processed })
    }

    /// Build a webp `source` tag from the given argument set.
    fn build_webp_source(
        &self,
        mut arguments: TagArguments,
        args: &RenderArguments,
        resolved: &ResolvedConfiguration,
        image: &ImageRef,
    ) -> Result<TagDescriptor, RenderError> {
        arguments.file_extension = Some("webp".to_string());
        let mut built = self.build_tag(TagKind::Source, &arguments, args, resolved, image)?;
        built.tag.set_attribute("type", "image/webp");
        Ok(built.tag)
    }

    /// The processing request for a tag's default rendition.
    fn processing_instructions(
        &self,
        arguments: &TagArguments,
        crop: &CropContext,
        resolved: &ResolvedConfiguration,
        image: &ImageRef,
    ) -> ProcessingInstructions {
        let mut instructions = ProcessingInstructions {
            width: arguments.width,
            height: arguments.height,
            min_width: arguments.min_width,
            min_height: arguments.min_height,
            max_width: arguments.max_width,
            max_height: arguments.max_height,
            crop: crop_rect(crop, image),
            file_extension: arguments.file_extension.clone().filter(|e| !e.is_empty()),
            encoder: None,
        };
        attach_webp_encoder(&mut instructions, resolved, image);
        instructions
    }

    /// The explicit `variants` srcset, when one is requested.
    fn build_variants_srcset(
        &self,
        arguments: &TagArguments,
        crop: &CropContext,
        args: &RenderArguments,
        resolved: &ResolvedConfiguration,
        image: &ImageRef,
    ) -> Result<Option<String>, RenderError> {
        let list = match non_empty(arguments.variants.as_deref()) {
            Some(list) => list,
            None => return Ok(None),
        };
        let widths = parse_variants(list)?;
        if widths.is_empty() {
            return Ok(None);
        }

        let ratio = match (arguments.width, arguments.height) {
            (Some(w), Some(h)) if w.pixels > 0 && h.pixels > 0 => {
                Some(w.pixels as f64 / h.pixels as f64)
            }
            _ => None,
        };
        let use_width_height = ratio.is_some() || arguments.max_width.is_none();
        let width_mode = mode_for_variant(arguments.width);
        let height_mode = mode_for_variant(arguments.height);
        let crop = crop_rect(crop, image);

        let mut entries = Vec::with_capacity(widths.len());
        for target in widths {
            let mut instructions = ProcessingInstructions {
                width: use_width_height.then_some(Dimension {
                    pixels: target,
                    mode: width_mode,
                }),
                height: if use_width_height {
                    ratio.map(|ratio| Dimension {
                        pixels: (target as f64 / ratio).round() as u32,
                        mode: height_mode,
                    })
                } else {
                    None
                },
                max_width: arguments.max_width.is_some().then_some(target),
                crop,
                file_extension: arguments.file_extension.clone().filter(|e| !e.is_empty()),
                ..Default::default()
            };
            attach_webp_encoder(&mut instructions, resolved, image);
            let processed = self.processor.process(image, &instructions)?;
            entries.push(format!("{} {target}w", self.image_uri(&processed, args)));
        }
        Ok(Some(entries.join(", ")))
    }

    /// Append retina candidates to the tag's srcset. The already-resolved
    /// srcset (or the default rendition's URI) is the bare 1x candidate;
    /// multipliers follow in table order.
    fn add_retina(
        &self,
        instructions: &ProcessingInstructions,
        tag: &mut TagDescriptor,
        default_uri: &str,
        args: &RenderArguments,
        resolved: &ResolvedConfiguration,
        image: &ImageRef,
    ) -> Result<(), RenderError> {
        // an existing srcset (variants, or the mandatory source value) is the
        // 1x candidate; replacing it keeps its attribute position
        let mut srcset = match tag.attribute("srcset") {
            Some(value) => value.to_string(),
            None => default_uri.to_string(),
        };

        for variant in &resolved.retina_table {
            let factor = variant.multiplier;
            let mut scaled = instructions.clone();
            scaled.width = scaled.width.map(|d| d.scaled(factor));
            scaled.height = scaled.height.map(|d| d.scaled(factor));
            scaled.min_width = scaled.min_width.map(|v| v * factor);
            scaled.min_height = scaled.min_height.map(|v| v * factor);
            scaled.max_width = scaled.max_width.map(|v| v * factor);
            scaled.max_height = scaled.max_height.map(|v| v * factor);

            let processed = self.processor.process(image, &scaled)?;
            srcset.push_str(", ");
            srcset.push_str(&self.image_uri(&processed, args));
            srcset.push(' ');
            srcset.push_str(&variant.label);
        }

        tag.set_attribute("srcset", srcset);
        Ok(())
    }

    fn image_uri(&self, processed: &ProcessedImage, args: &RenderArguments) -> String {
        let uri = self.processor.resolve_uri(processed, args.absolute);
        match non_empty(args.src_prefix.as_deref()) {
            Some(prefix) => format!("{prefix}{uri}"),
            None => uri,
        }
    }
}

/// Resolve the crop collection and variant name for one tag.
///
/// An explicitly named variant missing from a non-empty collection is an
/// error; the implicit `"default"` variant being absent just means no crop.
fn crop_context(arguments: &TagArguments, image: &ImageRef) -> Result<CropContext, RenderError> {
    let definition = arguments
        .crop
        .as_deref()
        .or(image.crop.as_deref())
        .unwrap_or("");
    let collection = CropVariantCollection::create(definition);
    let named = arguments.crop_variant.clone().filter(|name| !name.is_empty());
    if let Some(name) = &named {
        if !collection.is_empty() && !collection.has_variant(name) {
            return Err(RenderError::UnknownCropVariant(name.clone()));
        }
    }
    Ok(CropContext {
        collection,
        variant: named.unwrap_or_else(|| "default".to_string()),
    })
}

fn crop_rect(crop: &CropContext, image: &ImageRef) -> Option<Rect> {
    crop.collection
        .crop_area(&crop.variant)
        .map(|area| area.make_absolute(image.width, image.height))
}

/// WebP renditions of non-webp sources carry an encoder parameter:
/// lossless when configured, else the site-wide quality.
fn attach_webp_encoder(
    instructions: &mut ProcessingInstructions,
    resolved: &ResolvedConfiguration,
    image: &ImageRef,
) {
    if instructions.file_extension.as_deref() == Some("webp") && image.extension != "webp" {
        instructions.encoder = Some(if resolved.lossless {
            WebpEncoding::Lossless
        } else {
            WebpEncoding::Quality(resolved.webp_quality.value())
        });
    }
}

/// Variant widths carry the crop-forcing suffix of the original dimension,
/// but never min-fit (a fixed srcset width is a concrete target).
fn mode_for_variant(dimension: Option<Dimension>) -> SizingMode {
    if dimension.is_some_and(|d| d.is_crop()) {
        SizingMode::Crop
    } else {
        SizingMode::Exact
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Auto-wrap a bare media expression in parentheses.
fn wrap_media(media: &str) -> String {
    if media.starts_with('(') {
        media.to_string()
    } else {
        format!("({media})")
    }
}

fn serialize(tags: &[TagDescriptor], resolved: &ResolvedConfiguration) -> String {
    let body: String = tags.iter().map(TagDescriptor::render).collect();
    if resolved.picture_tag_needed() {
        match &resolved.picture_class {
            Some(class) => format!(
                "<picture class=\"{}\">{body}</picture>",
                escape_attribute(class)
            ),
            None => format!("<picture>{body}</picture>"),
        }
    } else {
        body
    }
}
