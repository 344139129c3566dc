//! Pure dimension math for processed renditions.
//!
//! Given a source image size and a set of [`ProcessingInstructions`], these
//! functions compute the resulting output size without touching pixels.
//! Real processors do their own math; this module backs the deterministic
//! [`preview`](crate::preview) processor and is testable without any I/O.
//!
//! Rules, applied in order:
//!
//! 1. A crop region replaces the source size as the scaling base.
//! 2. Width and height targets: both set means the target box exactly
//!    (plain and crop-forcing modes alike — the crop suffix changes *how*
//!    the processor fills the box, not its size); a min-fit mode on either
//!    axis scales to fit within the box preserving ratio; a single set axis
//!    derives the other from the base ratio.
//! 3. `max_width`/`max_height` scale the result down preserving ratio;
//!    `min_width`/`min_height` scale it up.

use crate::args::SizingMode;
use crate::processor::ProcessingInstructions;

/// Resulting output size for instructions against a source image size.
pub fn processed_dimensions(source: (u32, u32), instructions: &ProcessingInstructions) -> (u32, u32) {
    let base = match instructions.crop {
        Some(rect) => (rect.width.max(1), rect.height.max(1)),
        None => (source.0.max(1), source.1.max(1)),
    };

    let targeted = match (instructions.width, instructions.height) {
        (Some(w), Some(h)) => {
            if w.mode == SizingMode::MinFit || h.mode == SizingMode::MinFit {
                fit_within(base, (w.pixels, h.pixels))
            } else {
                (w.pixels, h.pixels)
            }
        }
        (Some(w), None) => {
            let height = scale(base.1, w.pixels, base.0);
            (w.pixels, height)
        }
        (None, Some(h)) => {
            let width = scale(base.0, h.pixels, base.1);
            (width, h.pixels)
        }
        (None, None) => base,
    };

    apply_bounds(targeted, instructions)
}

/// Scale `value` by `numerator / denominator`, rounding to pixels.
fn scale(value: u32, numerator: u32, denominator: u32) -> u32 {
    (value as f64 * numerator as f64 / denominator as f64).round() as u32
}

/// Fit `base` inside `bounds` preserving ratio.
fn fit_within(base: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let scale_w = bounds.0 as f64 / base.0 as f64;
    let scale_h = bounds.1 as f64 / base.1 as f64;
    let factor = scale_w.min(scale_h);
    (
        (base.0 as f64 * factor).round() as u32,
        (base.1 as f64 * factor).round() as u32,
    )
}

fn apply_bounds(mut dims: (u32, u32), instructions: &ProcessingInstructions) -> (u32, u32) {
    if let Some(max_width) = instructions.max_width {
        if dims.0 > max_width {
            dims = (max_width, scale(dims.1, max_width, dims.0));
        }
    }
    if let Some(max_height) = instructions.max_height {
        if dims.1 > max_height {
            dims = (scale(dims.0, max_height, dims.1), max_height);
        }
    }
    if let Some(min_width) = instructions.min_width {
        if dims.0 < min_width {
            dims = (min_width, scale(dims.1, min_width, dims.0));
        }
    }
    if let Some(min_height) = instructions.min_height {
        if dims.1 < min_height {
            dims = (scale(dims.0, min_height, dims.1), min_height);
        }
    }
    dims
}
