//! Camera-backed server sessions.
//!
//! - [`CaptureSession`] collects training images for one user.
//! - [`RecognitionSession`] runs continuous recognition.
//! - [`SessionRegistry`] keeps at most one capture session active.

mod capture;
mod recognition;
mod registry;

pub use capture::{CaptureProgress, CaptureSession, CaptureState, CapturedImage};
pub use recognition::{RecognitionSession, RecognitionState};
pub use registry::{ActiveCapture, SessionRegistry};
