//! Terminal frontend for deskchat.
//!
//! # Components
//!
//! - [`command`]: Parses input lines into runtime inputs
//! - [`view`]: Prints widget changes as a scrolling transcript

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;
pub mod view;

pub use command::{CommandError, parse_line};
pub use view::{TerminalBell, TerminalView};
