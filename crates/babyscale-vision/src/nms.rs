//! Non-maximum suppression over YOLO candidates.

use babyscale_models::BoundingBox;

/// Intersection over Union of two center-format boxes.
pub fn iou(a: &BoundingBox, b: &BoundingBox) -> f64 {
    let (ax1, ay1) = (a.center_x - a.width / 2.0, a.center_y - a.height / 2.0);
    let (bx1, by1) = (b.center_x - b.width / 2.0, b.center_y - b.height / 2.0);

    let x1 = ax1.max(bx1);
    let y1 = ay1.max(by1);
    let x2 = (ax1 + a.width).min(bx1 + b.width);
    let y2 = (ay1 + a.height).min(by1 + b.height);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.area() + b.area() - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

/// A candidate box before suppression.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub bbox: BoundingBox,
    pub class_id: usize,
    pub score: f32,
}

/// Greedy per-class NMS.
///
/// Returns indices into `candidates` of the kept boxes, highest score first.
/// Equal scores keep input order.
pub fn non_maximum_suppression(candidates: &[Candidate], iou_threshold: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| candidates[b].score.total_cmp(&candidates[a].score));

    let mut keep = Vec::new();
    let mut suppressed = vec![false; candidates.len()];

    for (pos, &i) in order.iter().enumerate() {
        if suppressed[i] {
            continue;
        }
        keep.push(i);

        for &j in &order[pos + 1..] {
            if suppressed[j] || candidates[i].class_id != candidates[j].class_id {
                continue;
            }
            if iou(&candidates[i].bbox, &candidates[j].bbox) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}
