use crate::constants::{DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH};
use crate::error::{CompressionError, Result};
use std::fmt;
use std::str::FromStr;

/// The (max_width, max_height) pair constraining output dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub max_width: u32,
    pub max_height: u32,
}

impl Bounds {
    pub fn new(max_width: u32, max_height: u32) -> Result<Self> {
        if max_width == 0 || max_height == 0 {
            return Err(CompressionError::InvalidBounds(max_width, max_height));
        }
        Ok(Self {
            max_width,
            max_height,
        })
    }

    pub fn contains(&self, width: u32, height: u32) -> bool {
        width <= self.max_width && height <= self.max_height
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

/// How source dimensions are brought inside the bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClampStrategy {
    /// One scale factor, `min(1, max_w / w, max_h / h)`, applied to both sides.
    #[default]
    Fit,
    /// Clamp width first, then re-check height against the already scaled
    /// size. Rounding after each step can leave one side a pixel off the
    /// exact ratio for extreme aspect ratios.
    Sequential,
}

impl FromStr for ClampStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fit" => Ok(ClampStrategy::Fit),
            "sequential" | "seq" => Ok(ClampStrategy::Sequential),
            other => Err(format!(
                "unknown clamp strategy '{}', expected 'fit' or 'sequential'",
                other
            )),
        }
    }
}

impl fmt::Display for ClampStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClampStrategy::Fit => f.write_str("fit"),
            ClampStrategy::Sequential => f.write_str("sequential"),
        }
    }
}

/// Computes the output size for a `width x height` source. Never upscales and
/// never returns a zero side for a non-empty source.
pub fn target_dimensions(
    width: u32,
    height: u32,
    bounds: Bounds,
    strategy: ClampStrategy,
) -> (u32, u32) {
    if width == 0 || height == 0 || bounds.contains(width, height) {
        return (width, height);
    }

    match strategy {
        ClampStrategy::Fit => fit_within(width, height, bounds),
        ClampStrategy::Sequential => sequential_clamp(width, height, bounds),
    }
}

fn fit_within(width: u32, height: u32, bounds: Bounds) -> (u32, u32) {
    let scale_w = bounds.max_width as f64 / width as f64;
    let scale_h = bounds.max_height as f64 / height as f64;
    let scale = scale_w.min(scale_h).min(1.0);

    if scale >= 1.0 {
        return (width, height);
    }

    let new_w = scale_side(width, scale).min(bounds.max_width);
    let new_h = scale_side(height, scale).min(bounds.max_height);
    (new_w, new_h)
}

fn sequential_clamp(width: u32, height: u32, bounds: Bounds) -> (u32, u32) {
    let (mut w, mut h) = (width, height);

    if w > bounds.max_width {
        h = scale_side(h, bounds.max_width as f64 / w as f64);
        w = bounds.max_width;
    }

    if h > bounds.max_height {
        w = scale_side(w, bounds.max_height as f64 / h as f64);
        h = bounds.max_height;
    }

    (w, h)
}

fn scale_side(side: u32, scale: f64) -> u32 {
    ((side as f64 * scale).round() as u32).max(1)
}
