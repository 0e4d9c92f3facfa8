use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;

use crate::error::{Result, WatchError};

/// Load a YOLO ONNX export with graph optimizations enabled.
///
/// # Errors
/// `ModelNotFound` when the file is missing, a runtime error when the session cannot be built.
pub fn load_model(model_path: impl AsRef<Path>) -> Result<Session> {
    let model_path = model_path.as_ref();
    if !model_path.exists() {
        return Err(WatchError::ModelNotFound(model_path.to_path_buf()));
    }
    Ok(build_session(model_path)?)
}

fn build_session(model_path: &Path) -> std::result::Result<Session, ort::Error> {
    let model = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(4)?
        .commit_from_file(model_path)?;
    Ok(model)
}
