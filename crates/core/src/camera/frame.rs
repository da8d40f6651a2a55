use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;

pub const JPEG_MIME: &str = "image/jpeg";

/// Uncompressed frame as produced by a [`super::VideoStream`]: packed RGB8 rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
	pub width: u32,
	pub height: u32,
	pub rgb: Vec<u8>,
}

impl RawFrame {
	/// Solid-colour frame, handy for backends that have nothing better to show.
	pub fn solid(width: u32, height: u32, pixel: [u8; 3]) -> Self {
		let len = width as usize * height as usize;
		let mut rgb = Vec::with_capacity(len * 3);
		for _ in 0..len {
			rgb.extend_from_slice(&pixel);
		}
		Self { width, height, rgb }
	}

	pub fn is_empty(&self) -> bool {
		self.width == 0 || self.height == 0
	}
}

/// A still image ready to ship to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
	pub mime: &'static str,
	pub width: u32,
	pub height: u32,
	pub bytes: Vec<u8>,
}

impl EncodedFrame {
	/// `data:image/jpeg;base64,...`
	pub fn to_data_url(&self) -> String {
		format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
	}
}

/// Encodes `frame` as JPEG. Returns `None` for zero-sized frames or when the
/// pixel buffer does not match the dimensions.
pub fn encode_jpeg(frame: &RawFrame, quality: u8) -> Option<EncodedFrame> {
	if frame.is_empty() {
		return None;
	}
	let image = RgbImage::from_raw(frame.width, frame.height, frame.rgb.clone())?;

	let mut bytes = Cursor::new(Vec::new());
	let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
	if let Err(err) = encoder.encode_image(&image) {
		tracing::debug!(target: "facegate.camera", error = %err, "jpeg encoding failed");
		return None;
	}

	Some(EncodedFrame {
		mime: JPEG_MIME,
		width: frame.width,
		height: frame.height,
		bytes: bytes.into_inner(),
	})
}
