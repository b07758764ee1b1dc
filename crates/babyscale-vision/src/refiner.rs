//! Coin diameter refinement.
//!
//! The detector box is only a rough estimate of the coin's size. The crop
//! under the box is searched for a circle; when one is found its diameter is
//! used, otherwise the box's shorter side stands in for it.

use babyscale_models::{BoundingBox, Circle, Detection, DetectionSet};
use image::RgbImage;
use tracing::debug;

use crate::hough::{hough_circles, HoughParams};

/// Physical diameter of the reference coin in centimetres.
pub const COIN_DIAMETER_CM: f64 = 2.7;

/// Sigma equivalent to a 15x15 Gaussian kernel with automatic sigma.
pub const DEFAULT_BLUR_SIGMA: f32 = 2.6;

/// How the coin's pixel diameter was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiameterEstimate {
    /// A circle was fitted inside the coin box. `circle` is in image pixels.
    Detected { diameter_px: f64, circle: Circle },
    /// No circle was found; the shorter box side is used.
    Fallback { diameter_px: f64 },
}

impl DiameterEstimate {
    pub fn diameter_px(&self) -> f64 {
        match self {
            Self::Detected { diameter_px, .. } | Self::Fallback { diameter_px } => *diameter_px,
        }
    }

    pub fn circle(&self) -> Option<&Circle> {
        match self {
            Self::Detected { circle, .. } => Some(circle),
            Self::Fallback { .. } => None,
        }
    }

    /// Label for logs and metrics.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Detected { .. } => "detected",
            Self::Fallback { .. } => "fallback",
        }
    }
}

/// Pick the reference coin out of a detection set.
///
/// The coin is expected to be the smallest detected object.
pub fn locate_coin(detections: &DetectionSet) -> Option<&Detection> {
    detections.smallest()
}

/// Circle refinement over a coin crop.
#[derive(Debug, Clone)]
pub struct CircleRefiner {
    pub params: HoughParams,
    pub blur_sigma: f32,
}

impl Default for CircleRefiner {
    fn default() -> Self {
        Self {
            params: HoughParams::default(),
            blur_sigma: DEFAULT_BLUR_SIGMA,
        }
    }
}

impl CircleRefiner {
    pub fn new(params: HoughParams, blur_sigma: f32) -> Self {
        Self { params, blur_sigma }
    }

    /// Estimate the coin's pixel diameter inside `bbox`.
    ///
    /// Radii are whole pixels. The blur pulls edges of small coins inward,
    /// so a coin a few pixels across can read up to one pixel short in radius.
    pub fn refine(&self, image: &RgbImage, bbox: &BoundingBox) -> DiameterEstimate {
        let fallback = DiameterEstimate::Fallback {
            diameter_px: bbox.min_side(),
        };

        let Some(rect) = bbox.clip_to(image.width(), image.height()) else {
            debug!(?bbox, "Coin box outside image, using box size");
            return fallback;
        };

        let crop = image::imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image();
        let gray = image::imageops::grayscale(&crop);
        let blurred = imageproc::filter::gaussian_blur_f32(&gray, self.blur_sigma);

        match hough_circles(&blurred, &self.params).first() {
            Some(found) => {
                let circle = found.offset(rect.x as f64, rect.y as f64);
                debug!(
                    center_x = circle.center_x,
                    center_y = circle.center_y,
                    radius = circle.radius,
                    "Coin circle detected"
                );
                DiameterEstimate::Detected {
                    diameter_px: circle.diameter(),
                    circle,
                }
            }
            None => {
                debug!(diameter_px = bbox.min_side(), "No coin circle found, using box size");
                fallback
            }
        }
    }
}
