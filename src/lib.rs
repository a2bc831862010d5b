//! Mute and nick-color filters for a chat client's incoming message events.
//!
//! Two filters share one [`filter::FilterChain`]: the [`colorizer::NickColorizer`]
//! re-emits each message with a stable per-nick color, and the
//! [`interceptor::MuteInterceptor`] prints messages from muted senders as a
//! dim single-color line instead of the normal rendering.

pub mod colorizer;
pub mod command;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod interceptor;
pub mod plugin;
pub mod protocol;
pub mod registry;
pub mod store;
pub mod types;

pub use error::FilterError;
pub use plugin::Plugin;
