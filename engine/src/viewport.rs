//! Viewport sizing for the drawable surface

use tracing::{debug, info};

/// Upper bound applied to the host pixel ratio
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Result of a successful resize
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOutcome {
    /// Width divided by height
    pub aspect_ratio: f32,
    /// Pixel ratio after clamping
    pub pixel_ratio: f64,
    /// Drawable width in physical pixels
    pub drawable_width: u32,
    /// Drawable height in physical pixels
    pub drawable_height: u32,
}

/// Logical window size and the drawable size derived from it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    logical_width: f64,
    logical_height: f64,
    pixel_ratio: f64,
    aspect_ratio: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            logical_width: 1.0,
            logical_height: 1.0,
            pixel_ratio: 1.0,
            aspect_ratio: 1.0,
        }
    }
}

impl Viewport {
    /// Create a viewport for an initial window size
    pub fn new(logical_width: f64, logical_height: f64, host_pixel_ratio: f64) -> Self {
        let mut viewport = Self::default();
        viewport.resize(logical_width, logical_height, host_pixel_ratio);
        viewport
    }

    /// Recompute aspect ratio and drawable size.
    ///
    /// A zero width or height (minimized window) leaves the viewport
    /// untouched and returns `None`.
    pub fn resize(
        &mut self,
        logical_width: f64,
        logical_height: f64,
        host_pixel_ratio: f64,
    ) -> Option<ResizeOutcome> {
        if logical_width <= 0.0 || logical_height <= 0.0 {
            debug!(logical_width, logical_height, "Ignoring degenerate resize");
            return None;
        }

        self.logical_width = logical_width;
        self.logical_height = logical_height;
        self.pixel_ratio = clamp_pixel_ratio(host_pixel_ratio);
        self.aspect_ratio = (logical_width / logical_height) as f32;

        let outcome = self.current();
        info!(
            width = outcome.drawable_width,
            height = outcome.drawable_height,
            pixel_ratio = outcome.pixel_ratio,
            "Viewport resized"
        );
        Some(outcome)
    }

    /// Resize from a physical size reported by the window system
    pub fn resize_physical(
        &mut self,
        physical_width: u32,
        physical_height: u32,
        scale_factor: f64,
    ) -> Option<ResizeOutcome> {
        let scale = if scale_factor > 0.0 { scale_factor } else { 1.0 };
        self.resize(
            f64::from(physical_width) / scale,
            f64::from(physical_height) / scale,
            scale,
        )
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Window size in logical pixels
    pub fn logical_size(&self) -> (f64, f64) {
        (self.logical_width, self.logical_height)
    }

    /// Current drawable size in physical pixels
    pub fn drawable_size(&self) -> (u32, u32) {
        let outcome = self.current();
        (outcome.drawable_width, outcome.drawable_height)
    }

    /// Sizes from the last accepted resize
    pub fn current(&self) -> ResizeOutcome {
        ResizeOutcome {
            aspect_ratio: self.aspect_ratio,
            pixel_ratio: self.pixel_ratio,
            drawable_width: ((self.logical_width * self.pixel_ratio).round() as u32).max(1),
            drawable_height: ((self.logical_height * self.pixel_ratio).round() as u32).max(1),
        }
    }
}

/// Clamp a host pixel ratio to `(0, MAX_PIXEL_RATIO]`
pub fn clamp_pixel_ratio(host_pixel_ratio: f64) -> f64 {
    if host_pixel_ratio.is_finite() && host_pixel_ratio > 0.0 {
        host_pixel_ratio.min(MAX_PIXEL_RATIO)
    } else {
        1.0
    }
}
