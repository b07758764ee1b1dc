//! Letterbox preprocessing for YOLO inference.
//!
//! YOLO models expect a square input. The frame is scaled to fit while
//! keeping its aspect ratio and the remainder is padded with gray (114),
//! matching how the models were trained. [`LetterboxMeta`] maps model
//! coordinates back into the original frame.

use image::imageops::FilterType;
use image::{Rgb, RgbImage};

/// Padding fill used by Ultralytics letterboxing.
pub const LETTERBOX_FILL: u8 = 114;

/// Mapping from letterboxed model space back into the source frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LetterboxMeta {
    /// Source pixels -> model pixels
    pub scale: f64,
    /// Horizontal padding (model pixels)
    pub pad_x: f64,
    /// Vertical padding (model pixels)
    pub pad_y: f64,
}

impl LetterboxMeta {
    /// Map a model-space point into source pixels.
    pub fn to_source(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }

    /// Map a model-space length into source pixels.
    pub fn length_to_source(&self, len: f64) -> f64 {
        len / self.scale
    }
}

/// Letterbox `image` onto a `size` x `size` canvas.
pub fn letterbox(image: &RgbImage, size: u32) -> (RgbImage, LetterboxMeta) {
    let (w, h) = image.dimensions();
    let scale = (size as f64 / w as f64).min(size as f64 / h as f64);
    let new_w = ((w as f64 * scale).round() as u32).clamp(1, size);
    let new_h = ((h as f64 * scale).round() as u32).clamp(1, size);

    let pad_x = (size - new_w) / 2;
    let pad_y = (size - new_h) / 2;

    let mut canvas = RgbImage::from_pixel(size, size, Rgb([LETTERBOX_FILL; 3]));
    if (new_w, new_h) == (w, h) {
        image::imageops::replace(&mut canvas, image, pad_x as i64, pad_y as i64);
    } else {
        let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);
        image::imageops::replace(&mut canvas, &resized, pad_x as i64, pad_y as i64);
    }

    (
        canvas,
        LetterboxMeta {
            scale,
            pad_x: pad_x as f64,
            pad_y: pad_y as f64,
        },
    )
}

/// Convert an RGB image to NCHW `f32` data normalized to [0, 1].
pub fn to_nchw(image: &RgbImage) -> (Vec<usize>, Vec<f32>) {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let plane = w * h;
    let mut chw = vec![0.0f32; 3 * plane];

    for (i, pixel) in image.pixels().enumerate() {
        chw[i] = pixel[0] as f32 / 255.0;
        chw[plane + i] = pixel[1] as f32 / 255.0;
        chw[2 * plane + i] = pixel[2] as f32 / 255.0;
    }

    (vec![1, 3, h, w], chw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_landscape() {
        let image = RgbImage::from_pixel(1280, 640, Rgb([10, 20, 30]));
        let (canvas, meta) = letterbox(&image, 640);

        assert_eq!(canvas.dimensions(), (640, 640));
        assert!((meta.scale - 0.5).abs() < 1e-9);
        assert_eq!(meta.pad_x, 0.0);
        assert_eq!(meta.pad_y, 160.0);
        assert_eq!(canvas.get_pixel(0, 0), &Rgb([LETTERBOX_FILL; 3]));
        assert_eq!(canvas.get_pixel(320, 320), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_meta_round_trip_point() {
        let meta = LetterboxMeta {
            scale: 0.5,
            pad_x: 0.0,
            pad_y: 160.0,
        };
        let (x, y) = meta.to_source(320.0, 320.0);
        assert!((x - 640.0).abs() < 1e-9);
        assert!((y - 320.0).abs() < 1e-9);
        assert!((meta.length_to_source(10.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_to_nchw_layout() {
        let mut image = RgbImage::new(2, 1);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        image.put_pixel(1, 0, Rgb([0, 255, 51]));

        let (shape, data) = to_nchw(&image);
        assert_eq!(shape, vec![1, 3, 1, 2]);
        assert_eq!(data.len(), 6);
        assert_eq!(data[0], 1.0);
        assert_eq!(data[1], 0.0);
        assert_eq!(data[3], 1.0);
        assert!((data[5] - 0.2).abs() < 1e-6);
    }
}
