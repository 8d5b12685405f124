use crate::canvas::surface::Snapshot;
use crate::inference::client::PredictError;
use base64::{engine::general_purpose, Engine as _};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};

/// Serialize a canvas snapshot into a base64-encoded lossless PNG for
/// transport. The snapshot carries the pixels exactly as visible, grid
/// included.
pub fn snapshot_to_base64_png(snapshot: &Snapshot) -> Result<String, PredictError> {
    let expected = (snapshot.side as usize) * (snapshot.side as usize) * 4;
    if snapshot.side == 0 || snapshot.rgba.len() != expected {
        return Err(PredictError::SurfaceUnavailable);
    }
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(&snapshot.rgba, snapshot.side, snapshot.side, ColorType::Rgba8)
        .map_err(|err| {
            tracing::error!("png encode failed: {err}");
            PredictError::SurfaceUnavailable
        })?;
    Ok(general_purpose::STANDARD.encode(&png))
}
