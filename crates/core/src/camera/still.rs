//! Camera backend that serves a still image from disk.
//!
//! The target is a path to a PNG or JPEG file. It stands in for a live device
//! on headless machines and in the CLI: every frame is the same decoded image,
//! downscaled to fit the requested ideal resolution.

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use image::imageops::FilterType;
use tracing::debug;

use super::{CameraBackend, RawFrame, StreamConstraints, VideoStream};
use crate::error::CameraError;

#[derive(Debug, Clone, Copy, Default)]
pub struct StillImageBackend;

impl StillImageBackend {
	fn load(target: &str, constraints: &StreamConstraints) -> Result<RawFrame, CameraError> {
		let path = Path::new(target);
		if !path.exists() {
			return Err(CameraError::TargetNotFound(target.to_string()));
		}

		let image = image::open(path).map_err(|err| match err {
			image::ImageError::IoError(io) if io.kind() == ErrorKind::PermissionDenied => CameraError::AccessDenied(io.to_string()),
			other => CameraError::Unavailable(other.to_string()),
		})?;

		let image = if image.width() > constraints.ideal_width || image.height() > constraints.ideal_height {
			image.resize(constraints.ideal_width, constraints.ideal_height, FilterType::Triangle)
		} else {
			image
		};
		let rgb = image.to_rgb8();
		Ok(RawFrame {
			width: rgb.width(),
			height: rgb.height(),
			rgb: rgb.into_raw(),
		})
	}
}

#[async_trait]
impl CameraBackend for StillImageBackend {
	async fn open(&self, target: &str, constraints: &StreamConstraints) -> Result<Box<dyn VideoStream>, CameraError> {
		let owned_target = target.to_string();
		let constraints = constraints.clone();
		let frame = tokio::task::spawn_blocking(move || Self::load(&owned_target, &constraints))
			.await
			.map_err(|err| CameraError::Unavailable(err.to_string()))??;

		debug!(target: "facegate.camera", path = target, width = frame.width, height = frame.height, "still image opened");
		Ok(Box::new(StillStream { frame: Some(frame) }))
	}
}

struct StillStream {
	frame: Option<RawFrame>,
}

impl VideoStream for StillStream {
	fn current_frame(&mut self) -> Option<RawFrame> {
		self.frame.clone()
	}

	fn stop_tracks(&mut self) {
		self.frame = None;
	}
}
