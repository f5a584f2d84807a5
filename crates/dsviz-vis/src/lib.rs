//! Data-structure visualizer host
//!
//! Serves one simulation session over HTTP and WebSocket, with playback
//! controls over the last operation's step timeline.
//!
//! # Architecture
//!
//! - **Session**: owns one engine and refuses commands while an animation plays
//! - **Animator**: paces step events onto a broadcast channel
//! - **Playback**: scrub through the last timeline at any speed
//! - **Server**: REST control plus a WebSocket frame stream
//!
//! # Usage
//!
//! ```ignore
//! let config = VisConfig::from_env()?;
//! let server = VisServer::new(&config);
//! server.serve(config.port).await?;
//! ```

mod animator;
mod config;
mod error;
mod playback;
mod server;
mod session;

pub use animator::{Animator, Frame};
pub use config::{VisConfig, PORT_ENV, SPEED_ENV};
pub use error::{Error, Result};
pub use playback::{Playback, PlaybackSpeed, PlaybackState, PlaybackStatus};
pub use server::{AppState, VisServer};
pub use session::{Command, CommandReport, Session, SessionView, ToneView};
