//! Post-processing of raw model output.
//!
//! Confidence filtering, rescaling to the original frame and class-aware non-maximum
//! suppression.

use ndarray::{Array2, Axis};

use crate::detect::bounds::{BoundingBox, Detection};

/// Decode candidates laid out one per row as `[cx, cy, w, h, score_0, .., score_n]`.
///
/// # Arguments
/// * `output` - candidates, as returned by [`run_inference`](crate::detect::run_inference)
/// * `frame_size` - original frame `(width, height)`
/// * `input_size` - model input `(width, height)` the boxes are expressed in
/// * `classes` - class names in model output order
/// * `confidence_threshold` - candidates scoring below this are dropped
/// * `nms_threshold` - IoU above which a lower-scoring box of the same class is suppressed
///
/// # Returns
/// Detections sorted by descending confidence.
pub fn decode_detections(
    output: &Array2<f32>,
    frame_size: (f32, f32),
    input_size: (usize, usize),
    classes: &[String],
    confidence_threshold: f32,
    nms_threshold: f32,
) -> Vec<Detection> {
    let mut detections = Vec::new();
    if output.ncols() < 5 {
        return detections;
    }

    let scale_x = frame_size.0 / input_size.0 as f32;
    let scale_y = frame_size.1 / input_size.1 as f32;

    for row in output.axis_iter(Axis(0)) {
        let Some((class_id, confidence)) = row
            .iter()
            .skip(4)
            .copied()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(&b.1))
        else {
            continue;
        };
        if confidence < confidence_threshold {
            continue;
        }

        let bbox = BoundingBox::from_center(row[0], row[1], row[2], row[3])
            .scale(scale_x, scale_y)
            .clamp(frame_size.0, frame_size.1);
        if !bbox.is_valid() {
            continue;
        }

        detections.push(Detection {
            bbox,
            class_id,
            class_name: class_name(classes, class_id),
            confidence,
        });
    }

    // total order, equal scores keep no particular order
    detections.sort_unstable_by(|a, b| b.confidence.total_cmp(&a.confidence));

    apply_nms(detections, nms_threshold)
}

fn class_name(classes: &[String], class_id: usize) -> String {
    classes
        .get(class_id)
        .cloned()
        .unwrap_or_else(|| format!("class_{class_id}"))
}

/// Keep the highest-scoring box of each overlapping same-class cluster.
///
/// `detections` must already be sorted by descending confidence.
pub fn apply_nms(detections: Vec<Detection>, nms_threshold: f32) -> Vec<Detection> {
    let mut suppressed = vec![false; detections.len()];
    let mut result = Vec::with_capacity(detections.len());

    for i in 0..detections.len() {
        if suppressed[i] {
            continue;
        }
        for j in (i + 1)..detections.len() {
            if suppressed[j] || detections[j].class_id != detections[i].class_id {
                continue;
            }
            if detections[i].bbox.iou(&detections[j].bbox) > nms_threshold {
                suppressed[j] = true;
            }
        }
        result.push(detections[i].clone());
    }

    result
}
