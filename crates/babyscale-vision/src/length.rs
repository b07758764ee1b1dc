//! Body length from pose keypoints.
//!
//! Length is the straight nose-to-ankle distance, an approximation of
//! crown-to-heel length rather than a sum of body segments.

use babyscale_models::{CocoKeypoint, Keypoint};

use crate::scale::ScaleFactor;

/// Keypoints that must be localized for a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthKeypoints {
    /// Top end of the measured segment
    pub head: CocoKeypoint,
    /// Required for a plausible pose, not measured
    pub torso: CocoKeypoint,
    /// Bottom end of the measured segment
    pub foot: CocoKeypoint,
}

impl Default for LengthKeypoints {
    fn default() -> Self {
        Self {
            head: CocoKeypoint::Nose,
            torso: CocoKeypoint::LeftShoulder,
            foot: CocoKeypoint::LeftAnkle,
        }
    }
}

impl LengthKeypoints {
    pub fn required(&self) -> [CocoKeypoint; 3] {
        [self.head, self.torso, self.foot]
    }
}

/// Pixel distance between the head and foot keypoints.
///
/// Returns `None` when any required keypoint is missing or undefined.
pub fn length_px(keypoints: &[Keypoint], selection: &LengthKeypoints) -> Option<f64> {
    let mut selected = [Keypoint::undefined(); 3];
    for (slot, which) in selected.iter_mut().zip(selection.required()) {
        let kp = keypoints.get(which.index())?;
        if !kp.is_defined() {
            return None;
        }
        *slot = *kp;
    }

    let [head, _, foot] = selected;
    Some(head.distance_to(&foot))
}

/// Body length in centimetres.
pub fn body_length_cm(keypoints: &[Keypoint], selection: &LengthKeypoints, scale: ScaleFactor) -> Option<f64> {
    length_px(keypoints, selection).map(|px| scale.to_cm(px))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::{scale_factor, ScaleFactor};
    use babyscale_models::COCO_KEYPOINT_COUNT;

    fn keypoints(nose: (f64, f64), shoulder: (f64, f64), ankle: (f64, f64)) -> [Keypoint; COCO_KEYPOINT_COUNT] {
        let mut kps = [Keypoint::undefined(); COCO_KEYPOINT_COUNT];
        kps[0] = Keypoint::new(nose.0, nose.1, 0.9);
        kps[5] = Keypoint::new(shoulder.0, shoulder.1, 0.9);
        kps[15] = Keypoint::new(ankle.0, ankle.1, 0.9);
        kps
    }

    #[test]
    fn test_vertical_length_exact() {
        let kps = keypoints((0.0, 0.0), (5.0, 20.0), (0.0, 100.0));
        let scale = ScaleFactor::new(0.1).unwrap();

        let length = body_length_cm(&kps, &LengthKeypoints::default(), scale).unwrap();
        assert_eq!(length, 10.0);
    }

    #[test]
    fn test_diagonal_length() {
        let kps = keypoints((10.0, 10.0), (12.0, 30.0), (40.0, 50.0));
        let px = length_px(&kps, &LengthKeypoints::default()).unwrap();
        assert!((px - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_missing_keypoint_is_no_result() {
        let scale = scale_factor(2.7, 27.0).unwrap();
        let selection = LengthKeypoints::default();

        let mut kps = keypoints((0.0, 0.0), (5.0, 20.0), (0.0, 100.0));
        kps[0].x = f64::NAN;
        assert!(body_length_cm(&kps, &selection, scale).is_none());

        let mut kps = keypoints((0.0, 0.0), (5.0, 20.0), (0.0, 100.0));
        kps[5].y = f64::NAN;
        assert!(body_length_cm(&kps, &selection, scale).is_none());

        let mut kps = keypoints((0.0, 0.0), (5.0, 20.0), (0.0, 100.0));
        kps[15] = Keypoint::undefined();
        assert!(body_length_cm(&kps, &selection, scale).is_none());
    }

    #[test]
    fn test_short_keypoint_slice() {
        let kps = [Keypoint::new(0.0, 0.0, 1.0); 6];
        assert!(length_px(&kps, &LengthKeypoints::default()).is_none());
    }
}
