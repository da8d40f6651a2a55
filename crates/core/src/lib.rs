//! facegate: client layer for a face-recognition service.
//!
//! The crate is organised around a handful of collaborators:
//!
//! - [`transport`]: authenticated REST calls ([`ApiClient`], [`Transport`])
//! - [`store`]: persisted session token ([`FileTokenStore`])
//! - [`camera`]: device access and JPEG stills ([`CameraSource`])
//! - [`channel`]: reconnecting WebSocket pub/sub ([`EventChannel`])
//! - [`session`]: capture and recognition lifecycles
//! - [`notifier`]: user-facing reporting
//!
//! [`Facegate`] wires them together from a [`ClientConfig`].
//!
//! # Example
//!
//! ```ignore
//! let client = Facegate::new(ClientConfig::default())?;
//! if let LoginOutcome::Failure { error } = client.auth().login("admin", "secret").await {
//!     anyhow::bail!(error);
//! }
//!
//! let mut capture = client.capture_session(7, "Ada Lovelace");
//! capture.start("/srv/frames/ada.png").await?;
//! capture.capture_until_full(client.config().capture_interval()).await?;
//! capture.complete().await?;
//! ```

pub mod auth;
pub mod camera;
pub mod channel;
pub mod client;
pub mod config;
pub mod error;
pub mod notifier;
pub mod session;
pub mod store;
pub mod testing;
pub mod transport;

pub use auth::{AuthManager, LoginOutcome};
pub use camera::{CameraBackend, CameraSource, EncodedFrame, FrameHandler, StillImageBackend, StreamConstraints};
pub use channel::{ChannelState, EventChannel, EventHandler, ReconnectPolicy};
pub use client::Facegate;
pub use config::ClientConfig;
pub use error::{CameraError, Error, Result};
pub use notifier::{LogNotifier, Notifier, Severity};
pub use session::{CaptureProgress, CaptureSession, CaptureState, RecognitionSession, RecognitionState, SessionRegistry};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use transport::{ApiClient, Method, Transport};

pub use facegate_protocol as protocol;
