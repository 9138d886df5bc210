//! Application layer for deskchat.
//!
//! Pure orchestration of the core components behind a single widget state
//! machine. The same code runs under the production runtime and in tests.
//!
//! # Components
//!
//! - [`ChatWidget`]: Widget state machine (events in, actions out)
//! - [`ComposeBuffer`]: Outbound text buffer with a cursor
//! - [`ChatView`]: Read-only snapshot handed to a [`View`]
//! - [`View`]: Trait for platform-specific rendering

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod compose;
mod event;
mod input;
mod view;
mod widget;

pub use action::{ChatAction, SendId};
pub use compose::ComposeBuffer;
pub use event::ChatEvent;
pub use input::KeyInput;
pub use view::{ChatView, View};
pub use widget::ChatWidget;
