use ndarray::{Array2, Array4};
use ort::{inputs, session::Session, value::Tensor};

use crate::config::MODEL_INPUT_NAME;
use crate::error::{Result, WatchError};

/// Run the model and return one candidate per row: `[cx, cy, w, h, score_0, .., score_n]`.
///
/// Ultralytics exports emit `[1, 4 + classes, anchors]`; that layout is transposed here.
/// Outputs already shaped `[1, anchors, 4 + classes]` are passed through.
pub fn run_inference(model: &mut Session, input: &Array4<f32>) -> Result<Array2<f32>> {
    let shape: Vec<usize> = input.shape().to_vec();
    let (data, _offset) = input.clone().into_raw_vec_and_offset();
    let input_tensor = Tensor::from_array(([shape[0], shape[1], shape[2], shape[3]], data))?;
    let outputs = model.run(inputs![MODEL_INPUT_NAME => input_tensor])?;

    let output = outputs[0].try_extract_tensor::<f32>()?;
    let shape = output.0.clone();
    if shape.len() != 3 || shape[0] != 1 {
        return Err(WatchError::inference(format!(
            "unexpected model output shape {:?}",
            &shape[..]
        )));
    }

    let (rows, cols) = (shape[1] as usize, shape[2] as usize);
    let array = Array2::from_shape_vec((rows, cols), output.1.to_vec())?;
    Ok(candidates_by_row(array))
}

/// Anchors always outnumber the `4 + classes` attributes.
pub(crate) fn candidates_by_row(array: Array2<f32>) -> Array2<f32> {
    if array.nrows() < array.ncols() {
        array.reversed_axes().as_standard_layout().to_owned()
    } else {
        array
    }
}
