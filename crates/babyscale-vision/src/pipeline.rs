//! End-to-end measurement: coin → scale → pose → length.
//!
//! Each stage gates the next. A photo that fails a stage produces
//! [`MeasurementOutcome::NoResult`]; only inference and file I/O problems
//! surface as errors.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{DynamicImage, ImageFormat};
use metrics::{counter, histogram};
use tracing::{debug, info, warn};

use crate::annotate::{draw_box, draw_coin_circle, draw_measurement, draw_pose, BOX_COLOR};
use crate::detector::ObjectDetector;
use crate::error::VisionResult;
use crate::length::{body_length_cm, LengthKeypoints};
use crate::pose::PoseEstimator;
use crate::refiner::{locate_coin, CircleRefiner, DiameterEstimate, COIN_DIAMETER_CM};
use crate::scale::{scale_factor, ScaleFactor};

const MEASUREMENTS_TOTAL: &str = "babyscale_measurements_total";
const MEASUREMENT_DURATION: &str = "babyscale_measurement_duration_seconds";
const COIN_DIAMETER_PATH_TOTAL: &str = "babyscale_coin_diameter_path_total";

/// Measurement settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementConfig {
    /// Physical diameter of the reference coin
    pub coin_diameter_cm: f64,
    pub keypoints: LengthKeypoints,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            coin_diameter_cm: COIN_DIAMETER_CM,
            keypoints: LengthKeypoints::default(),
        }
    }
}

/// Why a photo could not be measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoResultReason {
    /// Content is not a decodable image
    UnreadableImage,
    /// Decoded image does not have exactly three channels
    InvalidChannels(u8),
    NoCoin,
    /// Coin diameter was degenerate
    NoScale,
    NoPerson,
    /// Nose, shoulder or ankle was not localized
    MissingKeypoints,
}

impl NoResultReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnreadableImage => "unreadable_image",
            Self::InvalidChannels(_) => "invalid_channels",
            Self::NoCoin => "no_coin",
            Self::NoScale => "no_scale",
            Self::NoPerson => "no_person",
            Self::MissingKeypoints => "missing_keypoints",
        }
    }
}

impl std::fmt::Display for NoResultReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidChannels(n) => write!(f, "invalid_channels ({} channels)", n),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A completed measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub length_cm: f64,
    pub scale: ScaleFactor,
    pub diameter: DiameterEstimate,
    /// Where the annotated JPEG was written
    pub output_path: PathBuf,
}

/// Result of [`MeasurementPipeline::measure_all`].
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurementOutcome {
    Measured(Measurement),
    NoResult(NoResultReason),
}

impl MeasurementOutcome {
    pub fn measurement(&self) -> Option<&Measurement> {
        match self {
            Self::Measured(m) => Some(m),
            Self::NoResult(_) => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Measured(_) => "measured",
            Self::NoResult(reason) => reason.as_str(),
        }
    }
}

/// The measurement pipeline.
///
/// Stateless between calls; detectors are shared and may serve concurrent
/// requests.
pub struct MeasurementPipeline {
    coin_detector: Arc<dyn ObjectDetector>,
    pose_estimator: Arc<dyn PoseEstimator>,
    refiner: CircleRefiner,
    config: MeasurementConfig,
}

impl MeasurementPipeline {
    pub fn new(
        coin_detector: Arc<dyn ObjectDetector>,
        pose_estimator: Arc<dyn PoseEstimator>,
        config: MeasurementConfig,
    ) -> Self {
        Self {
            coin_detector,
            pose_estimator,
            refiner: CircleRefiner::default(),
            config,
        }
    }

    /// Replace the circle refiner.
    pub fn with_refiner(mut self, refiner: CircleRefiner) -> Self {
        self.refiner = refiner;
        self
    }

    pub fn config(&self) -> &MeasurementConfig {
        &self.config
    }

    /// Measure the infant in the photo at `input`.
    ///
    /// On success the annotated image is written to `output` as JPEG. Nothing
    /// is written when the outcome is [`MeasurementOutcome::NoResult`].
    pub fn measure_all(&self, input: &Path, output: &Path) -> VisionResult<MeasurementOutcome> {
        let started = Instant::now();
        let result = self.run(input, output);
        record_outcome(&result, started.elapsed());

        match &result {
            Ok(MeasurementOutcome::Measured(m)) => info!(
                length_cm = m.length_cm,
                cm_per_px = m.scale.cm_per_px(),
                diameter_path = m.diameter.path(),
                output = %m.output_path.display(),
                "Measurement completed"
            ),
            Ok(MeasurementOutcome::NoResult(reason)) => {
                info!(reason = %reason, input = %input.display(), "No measurement result")
            }
            Err(e) => warn!(error = %e, input = %input.display(), "Measurement failed"),
        }

        result
    }

    fn run(&self, input: &Path, output: &Path) -> VisionResult<MeasurementOutcome> {
        use MeasurementOutcome::NoResult;

        // Stage 1: load and validate
        let decoded = image::io::Reader::open(input)?.with_guessed_format()?.decode();
        let image = match decoded {
            Ok(img) => img,
            Err(e) => {
                debug!(error = %e, "Image could not be decoded");
                return Ok(NoResult(NoResultReason::UnreadableImage));
            }
        };
        let channels = image.color().channel_count();
        if channels != 3 {
            return Ok(NoResult(NoResultReason::InvalidChannels(channels)));
        }
        let image = match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => other.to_rgb8(),
        };

        // Stage 2: coin
        let detections = self.coin_detector.detect(&image)?;
        let Some(coin) = locate_coin(&detections) else {
            return Ok(NoResult(NoResultReason::NoCoin));
        };
        debug!(
            candidates = detections.len(),
            confidence = coin.confidence,
            "Coin located"
        );

        // Stage 3: scale
        let diameter = self.refiner.refine(&image, &coin.bbox);
        let Some(scale) = scale_factor(self.config.coin_diameter_cm, diameter.diameter_px()) else {
            return Ok(NoResult(NoResultReason::NoScale));
        };

        // Stage 4: pose and length
        let Some(pose) = self.pose_estimator.estimate(&image)? else {
            return Ok(NoResult(NoResultReason::NoPerson));
        };
        let Some(length_cm) = body_length_cm(&pose.keypoints, &self.config.keypoints, scale) else {
            return Ok(NoResult(NoResultReason::MissingKeypoints));
        };

        let mut annotated = image;
        draw_box(&mut annotated, &coin.bbox, BOX_COLOR);
        if let Some(circle) = diameter.circle() {
            draw_coin_circle(&mut annotated, circle);
        }
        draw_pose(&mut annotated, &pose);
        draw_measurement(
            &mut annotated,
            pose.get(self.config.keypoints.head),
            pose.get(self.config.keypoints.foot),
        );
        annotated.save_with_format(output, ImageFormat::Jpeg)?;

        Ok(MeasurementOutcome::Measured(Measurement {
            length_cm,
            scale,
            diameter,
            output_path: output.to_path_buf(),
        }))
    }
}

fn record_outcome(result: &VisionResult<MeasurementOutcome>, elapsed: Duration) {
    let outcome = match result {
        Ok(outcome) => outcome.label(),
        Err(_) => "error",
    };
    counter!(MEASUREMENTS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(MEASUREMENT_DURATION).record(elapsed.as_secs_f64());

    if let Ok(MeasurementOutcome::Measured(m)) = result {
        counter!(COIN_DIAMETER_PATH_TOTAL, "path" => m.diameter.path()).increment(1);
    }
}
