//! Source-over compositing of a layer stack.
//!
//! Layers are painted bottom to top onto an initially transparent canvas.
//! Each pixel of each layer is combined with the accumulated canvas using
//! straight (non-premultiplied) alpha:
//!
//! ```text
//! dst_contrib = dst.a * (1 - src.a)
//! out.a       = src.a + dst_contrib
//! out.rgb     = (src.rgb * src.a + dst.rgb * dst_contrib) / out.a   if out.a > 0
//! ```
//!
//! A pixel whose resulting alpha is zero is left untouched, so it stays fully
//! transparent.
//!
//! Rows are independent, so each layer is blended across rows with rayon.
//! The per-pixel result is identical to a sequential scan.

use crate::types::PartImage;
use image::{DynamicImage, Rgba32FImage, RgbaImage};
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlendError {
    #[error(
        "layer {index} ('{name}') is {found_w}x{found_h}, expected {expected_w}x{expected_h} like the first layer"
    )]
    DimensionMismatch {
        index: usize,
        name: String,
        expected_w: u32,
        expected_h: u32,
        found_w: u32,
        found_h: u32,
    },
}

/// The finished portrait.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeImage {
    pixels: Rgba32FImage,
    layers: usize,
}

impl CompositeImage {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Number of layers that were painted.
    pub fn layer_count(&self) -> usize {
        self.layers
    }

    /// RGBA at `(x, y)`. Panics if out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [f32; 4] {
        self.pixels.get_pixel(x, y).0
    }

    pub fn pixels(&self) -> &Rgba32FImage {
        &self.pixels
    }

    /// Quantize to 8-bit RGBA for encoding.
    pub fn to_rgba8(&self) -> RgbaImage {
        DynamicImage::ImageRgba32F(self.pixels.clone()).to_rgba8()
    }
}

/// Composite `stack` bottom to top.
///
/// Returns `Ok(None)` for an empty stack. All layers must match the first
/// layer's dimensions; a mismatch is reported before any pixel is touched.
pub fn composite(stack: &[&PartImage]) -> Result<Option<CompositeImage>, BlendError> {
    let Some(first) = stack.first() else {
        return Ok(None);
    };
    let (width, height) = first.dimensions();

    for (index, layer) in stack.iter().enumerate() {
        let (found_w, found_h) = layer.dimensions();
        if (found_w, found_h) != (width, height) {
            return Err(BlendError::DimensionMismatch {
                index,
                name: layer.name().to_string(),
                expected_w: width,
                expected_h: height,
                found_w,
                found_h,
            });
        }
    }

    // Zero-initialized: every channel, alpha included, starts at 0.
    let mut canvas = Rgba32FImage::new(width, height);
    for layer in stack {
        blend_layer(&mut canvas, layer.pixels());
    }

    Ok(Some(CompositeImage {
        pixels: canvas,
        layers: stack.len(),
    }))
}

fn blend_layer(canvas: &mut Rgba32FImage, layer: &Rgba32FImage) {
    let row_len = canvas.width() as usize * 4;
    if row_len == 0 {
        return;
    }

    let dst: &mut [f32] = canvas;
    let src: &[f32] = layer;
    dst.par_chunks_mut(row_len)
        .zip(src.par_chunks(row_len))
        .for_each(|(dst_row, src_row)| {
            for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                if let Some(out) = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]) {
                    d.copy_from_slice(&out);
                }
            }
        });
}

/// Blend one straight-alpha `src` pixel over `dst`.
///
/// Returns `None` when the result is fully transparent; the caller keeps `dst`.
pub fn over(dst: [f32; 4], src: [f32; 4]) -> Option<[f32; 4]> {
    let src_a = src[3];
    let dst_contrib = dst[3] * (1.0 - src_a);
    let out_a = src_a + dst_contrib;
    if out_a <= 0.0 {
        return None;
    }

    let mut out = [0.0; 4];
    for i in 0..3 {
        out[i] = (src[i] * src_a + dst[i] * dst_contrib) / out_a;
    }
    out[3] = out_a;
    Some(out)
}
