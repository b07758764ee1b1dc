//! Pixel-to-centimetre calibration.

/// Centimetres per pixel, derived from a reference object of known size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactor(f64);

impl ScaleFactor {
    /// Wrap a known centimetres-per-pixel ratio. Must be finite and positive.
    pub fn new(cm_per_px: f64) -> Option<Self> {
        (cm_per_px.is_finite() && cm_per_px > 0.0).then_some(Self(cm_per_px))
    }

    pub fn cm_per_px(&self) -> f64 {
        self.0
    }

    /// Convert a pixel length to centimetres.
    pub fn to_cm(&self, pixels: f64) -> f64 {
        pixels * self.0
    }
}

/// `known_diameter_cm / diameter_px`.
///
/// Returns `None` for a non-positive or non-finite pixel diameter.
pub fn scale_factor(known_diameter_cm: f64, diameter_px: f64) -> Option<ScaleFactor> {
    if !diameter_px.is_finite() || diameter_px <= 0.0 {
        return None;
    }
    ScaleFactor::new(known_diameter_cm / diameter_px)
}
