// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! RDP (Reality Display Processor) emulation
//!
//! The RDP consumes the command stream a graphics task leaves in RAM and
//! rasterizes it into a fixed 640×480 RGBA8 frame buffer (row-major, origin
//! top-left).
//!
//! # Command Stream
//!
//! Commands are 64-bit (two big-endian words) unless noted. The command id is
//! bits 24..30 of the first word.
//!
//! | Id   | Command         | Words | Operands                                   |
//! |------|-----------------|-------|--------------------------------------------|
//! | 0x00 | NOP             | 2     |                                            |
//! | 0x08 | Fill triangle   | 4     | three 12-bit signed (x, y) pairs, RGBA8888 |
//! | 0x26 | Sync load       | 2     |                                            |
//! | 0x27 | Sync pipe       | 2     |                                            |
//! | 0x28 | Sync tile       | 2     |                                            |
//! | 0x29 | Sync full       | 2     | marks the end of a frame                   |
//! | 0x2D | Set scissor     | 2     | w0: XH, YH; w1: XL, YL (10.2 fixed point)  |
//! | 0x36 | Fill rectangle  | 2     | w0: XL, YL; w1: XH, YH (10.2 fixed point)  |
//! | 0x37 | Set fill color  | 2     | w1: RGBA8888                               |
//!
//! Fixed point coordinates are 12 bits each, X in bits 12..23 and Y in bits
//! 0..11. Rectangles exclude their lower-right edge. Unknown commands are
//! skipped as 2 words.

use crate::core::error::Result;
use crate::core::memory::Bus;
use crate::core::save_state::{RdpState, StateSave};

mod rasterizer;
#[cfg(test)]
mod tests;

pub use rasterizer::Rasterizer;

/// Frame buffer width in pixels
pub const FRAME_WIDTH: usize = 640;

/// Frame buffer height in pixels
pub const FRAME_HEIGHT: usize = 480;

/// Frame buffer size in bytes (RGBA8)
pub const PIXEL_BUFFER_SIZE: usize = FRAME_WIDTH * FRAME_HEIGHT * 4;

pub const CMD_NOP: u8 = 0x00;
pub const CMD_FILL_TRIANGLE: u8 = 0x08;
pub const CMD_SYNC_LOAD: u8 = 0x26;
pub const CMD_SYNC_PIPE: u8 = 0x27;
pub const CMD_SYNC_TILE: u8 = 0x28;
pub const CMD_SYNC_FULL: u8 = 0x29;
pub const CMD_SET_SCISSOR: u8 = 0x2D;
pub const CMD_FILL_RECTANGLE: u8 = 0x36;
pub const CMD_SET_FILL_COLOR: u8 = 0x37;

/// Pending command range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CommandRange {
    start: u32,
    end: u32,
}

/// Reality Display Processor
pub struct RDP {
    /// Commands submitted but not yet rendered
    pending: Option<CommandRange>,

    /// Fill color (RGBA8888)
    fill_color: u32,

    /// Scissor and clipping state
    rasterizer: Rasterizer,

    /// SYNC_FULL commands processed since reset
    frame_count: u64,

    /// RGBA8 frame buffer
    pixels: Vec<u8>,
}

impl RDP {
    pub fn new() -> Self {
        Self {
            pending: None,
            fill_color: 0,
            rasterizer: Rasterizer::new(),
            frame_count: 0,
            pixels: vec![0u8; PIXEL_BUFFER_SIZE],
        }
    }

    /// Reset to power-on state; the frame buffer is cleared
    pub fn reset(&mut self) {
        self.pending = None;
        self.fill_color = 0;
        self.rasterizer = Rasterizer::new();
        self.frame_count = 0;
        self.pixels.fill(0);
    }

    /// Queue the command range `[start, end)` for the next render
    ///
    /// A range submitted before the previous one was rendered replaces it.
    pub fn submit(&mut self, start: u32, end: u32) {
        if let Some(previous) = self.pending {
            log::warn!(
                "RDP: unrendered commands 0x{:08X}..0x{:08X} replaced",
                previous.start,
                previous.end
            );
        }
        self.pending = Some(CommandRange { start, end });
    }

    /// Render pending commands, if any
    ///
    /// Returns `Ok(false)` without touching anything when nothing is pending,
    /// so calling it repeatedly is harmless.
    ///
    /// # Example
    ///
    /// ```
    /// use n64rx::core::memory::Bus;
    /// use n64rx::core::rdp::RDP;
    ///
    /// let mut bus = Bus::new(64 * 1024);
    /// // Set fill color, fill rectangle (0,0)-(4,4)
    /// bus.write32(0x100, 0x3700_0000).unwrap();
    /// bus.write32(0x104, 0xFF00_00FF).unwrap();
    /// bus.write32(0x108, 0x3601_0010).unwrap();
    /// bus.write32(0x10C, 0x0000_0000).unwrap();
    ///
    /// let mut rdp = RDP::new();
    /// rdp.submit(0x100, 0x110);
    /// assert!(rdp.render_if_ready(&bus).unwrap());
    /// assert!(!rdp.render_if_ready(&bus).unwrap());
    /// assert_eq!(&rdp.pixels()[..4], &[0xFF, 0x00, 0x00, 0xFF]);
    /// ```
    pub fn render_if_ready(&mut self, bus: &Bus) -> Result<bool> {
        let Some(range) = self.pending.take() else {
            return Ok(false);
        };

        let mut addr = range.start;
        while addr < range.end {
            let w0 = bus.read32(addr)?;
            let id = ((w0 >> 24) & 0x3F) as u8;
            let words = if id == CMD_FILL_TRIANGLE { 4 } else { 2 };

            if range.end - addr < words * 4 {
                log::warn!(
                    "RDP: command 0x{:02X} at 0x{:08X} truncated by end of range",
                    id,
                    addr
                );
                break;
            }

            let mut operands = [0u32; 3];
            for (i, operand) in operands.iter_mut().take(words as usize - 1).enumerate() {
                *operand = bus.read32(addr.wrapping_add(4 + i as u32 * 4))?;
            }

            self.execute(id, w0, &operands, addr);
            addr = addr.wrapping_add(words * 4);
        }

        Ok(true)
    }

    fn execute(&mut self, id: u8, w0: u32, operands: &[u32; 3], addr: u32) {
        let w1 = operands[0];
        match id {
            CMD_NOP | CMD_SYNC_LOAD | CMD_SYNC_PIPE | CMD_SYNC_TILE => {}
            CMD_SYNC_FULL => {
                self.frame_count += 1;
            }
            CMD_SET_SCISSOR => {
                let (left, top) = fixed_point_pair(w0);
                let (right, bottom) = fixed_point_pair(w1);
                self.rasterizer.set_clip_rect(left, top, right, bottom);
            }
            CMD_FILL_RECTANGLE => {
                let (right, bottom) = fixed_point_pair(w0);
                let (left, top) = fixed_point_pair(w1);
                self.rasterizer
                    .fill_rect(&mut self.pixels, left, top, right, bottom, self.fill_color);
            }
            CMD_SET_FILL_COLOR => {
                self.fill_color = w1;
            }
            CMD_FILL_TRIANGLE => {
                let v0 = signed_pair(w0);
                let v1 = signed_pair(operands[0]);
                let v2 = signed_pair(operands[1]);
                self.rasterizer
                    .draw_triangle(&mut self.pixels, v0, v1, v2, operands[2]);
            }
            _ => {
                log::warn!(
                    "RDP: unknown command 0x{:02X} at 0x{:08X}, skipped",
                    id,
                    addr
                );
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// RGBA8 frame buffer, row-major, origin top-left
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fill_color(&self) -> u32 {
        self.fill_color
    }

    /// Scissor rectangle: left, top, right, bottom (exclusive)
    pub fn scissor(&self) -> (i32, i32, i32, i32) {
        self.rasterizer.clip_rect()
    }
}

impl Default for RDP {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a 10.2 fixed point (x, y) pair to whole pixels
fn fixed_point_pair(word: u32) -> (i32, i32) {
    (((word >> 12) & 0xFFF) as i32 >> 2, (word & 0xFFF) as i32 >> 2)
}

/// Decode a 12-bit signed integer (x, y) pair
fn signed_pair(word: u32) -> (i32, i32) {
    let sign_extend = |v: u32| ((v << 20) as i32) >> 20;
    (sign_extend((word >> 12) & 0xFFF), sign_extend(word & 0xFFF))
}

impl StateSave for RDP {
    type State = RdpState;

    fn to_state(&self) -> RdpState {
        let (start, end) = self
            .pending
            .map(|range| (range.start, range.end))
            .unwrap_or((0, 0));
        let (left, top, right, bottom) = self.rasterizer.clip_rect();
        RdpState {
            pending: self.pending.is_some(),
            start,
            end,
            fill_color: self.fill_color,
            scissor: [left as u16, top as u16, right as u16, bottom as u16],
            frame_count: self.frame_count,
            pixels: Some(self.pixels.clone()),
        }
    }

    /// A state without pixels clears the frame buffer
    fn restore_from_state(&mut self, state: &RdpState) {
        self.pending = state.pending.then_some(CommandRange {
            start: state.start,
            end: state.end,
        });
        self.fill_color = state.fill_color;
        let [left, top, right, bottom] = state.scissor.map(i32::from);
        self.rasterizer.set_clip_rect(left, top, right, bottom);
        self.frame_count = state.frame_count;
        match &state.pixels {
            Some(pixels) if pixels.len() == PIXEL_BUFFER_SIZE => {
                self.pixels.copy_from_slice(pixels);
            }
            _ => self.pixels.fill(0),
        }
    }
}
