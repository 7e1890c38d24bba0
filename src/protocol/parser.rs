// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Frame parser for the command channel.
//!
//! A frame is `START_BYTE, code, checksum` where the checksum is the wrapping sum of the bytes
//! after the start byte (i.e. the code itself). Unknown codes are still delivered; deciding what
//! an unknown code means is the dispatcher's job.

use crate::protocol::messages::START_BYTE;

enum State {
    WaitStart,
    WaitCode,
    WaitChecksum { code: u8 },
}

pub struct Parser {
    state: State,
    checksum: u8,
    rejected: u32,
}

impl Parser {
    pub const fn new() -> Self {
        Self {
            state: State::WaitStart,
            checksum: 0,
            rejected: 0,
        }
    }

    /// Frames dropped for a bad checksum since boot.
    #[inline]
    pub fn rejected(&self) -> u32 {
        self.rejected
    }

    /// Process a single incoming byte. Returns `Some(code)` once a complete frame is received.
    pub fn push(&mut self, byte: u8) -> Option<u8> {
        match self.state {
            State::WaitStart => {
                if byte == START_BYTE {
                    self.state = State::WaitCode;
                    self.checksum = 0;
                }
            }
            State::WaitCode => {
                self.checksum = self.checksum.wrapping_add(byte);
                self.state = State::WaitChecksum { code: byte };
            }
            State::WaitChecksum { code } => {
                let valid = byte == self.checksum;
                self.state = State::WaitStart;

                if valid {
                    return Some(code);
                }
                self.rejected = self.rejected.wrapping_add(1);
                log::debug!("dropped frame {:#04x}: bad checksum {:#04x}", code, byte);
            }
        }
        None
    }

    /// Encode a frame for `code`.
    pub fn frame(code: u8) -> [u8; 3] {
        [START_BYTE, code, code]
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
