//! Result image overlays.

use babyscale_models::{BoundingBox, Circle, Keypoint, Pose};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

/// Coin circle marker (blue).
pub const COIN_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
/// Coin detector box.
pub const BOX_COLOR: Rgb<u8> = Rgb([255, 200, 0]);
/// Pose limbs.
pub const LIMB_COLOR: Rgb<u8> = Rgb([51, 153, 255]);
/// Pose joints.
pub const JOINT_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
/// The measured nose-to-ankle segment.
pub const MEASURE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// COCO limb connections as keypoint index pairs.
pub const SKELETON: [(usize, usize); 19] = [
    (15, 13),
    (13, 11),
    (16, 14),
    (14, 12),
    (11, 12),
    (5, 11),
    (6, 12),
    (5, 6),
    (5, 7),
    (6, 8),
    (7, 9),
    (8, 10),
    (1, 2),
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    (3, 5),
    (4, 6),
];

/// Draw a 2 px circle outline around the refined coin.
pub fn draw_coin_circle(image: &mut RgbImage, circle: &Circle) {
    let center = (circle.center_x.round() as i32, circle.center_y.round() as i32);
    let radius = circle.radius.round() as i32;
    draw_hollow_circle_mut(image, center, radius, COIN_COLOR);
    draw_hollow_circle_mut(image, center, radius + 1, COIN_COLOR);
}

/// Draw a detector box outline.
pub fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    let (x1, y1, x2, y2) = bbox.corners();
    let rect = Rect::at(x1 as i32, y1 as i32).of_size((x2 - x1).max(1) as u32, (y2 - y1).max(1) as u32);
    draw_hollow_rect_mut(image, rect, color);
}

/// Draw the pose skeleton. Undefined keypoints and their limbs are skipped.
pub fn draw_pose(image: &mut RgbImage, pose: &Pose) {
    for &(a, b) in SKELETON.iter() {
        let (ka, kb) = (&pose.keypoints[a], &pose.keypoints[b]);
        if ka.is_defined() && kb.is_defined() {
            draw_line_segment_mut(image, point(ka), point(kb), LIMB_COLOR);
        }
    }

    let radius = joint_radius(image);
    for kp in pose.keypoints.iter().filter(|kp| kp.is_defined()) {
        draw_filled_circle_mut(image, (kp.x.round() as i32, kp.y.round() as i32), radius, JOINT_COLOR);
    }
}

/// Draw the measured segment between two keypoints.
pub fn draw_measurement(image: &mut RgbImage, from: &Keypoint, to: &Keypoint) {
    if from.is_defined() && to.is_defined() {
        draw_line_segment_mut(image, point(from), point(to), MEASURE_COLOR);
    }
}

fn point(kp: &Keypoint) -> (f32, f32) {
    (kp.x as f32, kp.y as f32)
}

/// Joint markers scale with the image so they stay visible on phone photos.
fn joint_radius(image: &RgbImage) -> i32 {
    (image.width().max(image.height()) / 200).clamp(2, 8) as i32
}
