//! Production I/O for the deskchat widget.
//!
//! Everything that touches the network, the clock or the filesystem lives
//! here. The widget itself stays pure; [`Runtime`] carries out its actions.
//!
//! # Components
//!
//! - [`ChatApi`]: HTTP endpoints over `reqwest`
//! - [`transport`]: WebSocket tasks over `tokio-tungstenite`
//! - [`Cancelable`]: Replaceable one-shot reconnect timer
//! - [`FilePreferenceStore`]: JSON-file preferences
//! - [`MediaUrls`]: Attachment and avatar URL normalizer
//! - [`Runtime`]: `tokio::select!` loop tying it together

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod media_url;
pub mod prefs;
pub mod runtime;
pub mod system_env;
pub mod timer;
pub mod transport;

pub use api::ChatApi;
pub use config::{ClientConfig, PREFERENCES_FILE, REQUEST_TIMEOUT};
pub use error::{ApiError, ConfigError, RuntimeError, TransportError};
pub use media_url::MediaUrls;
pub use prefs::FilePreferenceStore;
pub use runtime::{Runtime, UserInput};
pub use system_env::SystemEnv;
pub use timer::Cancelable;
pub use transport::{SocketEvent, SocketHandle};
