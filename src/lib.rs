//! Client core of a remote spectrogram viewer.
//!
//! Frames from the analysis server are decoded in [`protocol`], loaded into
//! a [`session::Session`], cut into GPU-sized textures by [`graphics`], and
//! explored through the extents in [`view`].

pub mod client;
pub mod config;
pub mod error;
pub mod graphics;
pub mod protocol;
pub mod session;
pub mod view;

pub use config::ViewerConfig;
pub use error::{ProtocolError, Result, ViewerError};
pub use session::{EventLoop, LogObserver, Session, SessionEvent, SessionObserver};
