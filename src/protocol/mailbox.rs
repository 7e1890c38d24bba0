// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Latest-command slot between the command transport and the motion tick.
//!
//! Not a queue: a newer code overwrites an unread older one. Reading does not clear the slot, so
//! a code stays in force until the operator sends another.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::protocol::messages::CMD_NONE;

pub struct CommandMailbox {
    code: AtomicU8,
}

impl CommandMailbox {
    pub const fn new() -> Self {
        Self {
            code: AtomicU8::new(CMD_NONE),
        }
    }

    /// Replace the pending code.
    #[inline]
    pub fn post(&self, code: u8) {
        self.code.store(code, Ordering::Relaxed);
    }

    /// Most recent code, [`CMD_NONE`] if nothing has been received.
    #[inline]
    pub fn latest(&self) -> u8 {
        self.code.load(Ordering::Relaxed)
    }
}

impl Default for CommandMailbox {
    fn default() -> Self {
        Self::new()
    }
}
