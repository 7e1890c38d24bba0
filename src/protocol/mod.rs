// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! # Command Protocol
//!
//! - [`messages`] - wire codes and the decoded [`Command`] enum.
//! - [`parser`] - framed reception (`START_BYTE`, code, checksum).
//! - [`mailbox`] - most-recent-wins slot between transport and motion tick.
//! - [`dispatcher`] - maps the latest code onto motion state and wheel commands.

pub mod dispatcher;
pub mod mailbox;
pub mod messages;
pub mod parser;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use mailbox::CommandMailbox;
pub use messages::Command;
pub use parser::Parser;
