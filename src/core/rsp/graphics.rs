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

//! Graphics task (HLE display list processing)
//!
//! A display list is a sequence of 64-bit commands (two big-endian words).
//! The top byte of the first word selects the command:
//!
//! | Opcode      | Command     | Effect                                         |
//! |-------------|-------------|------------------------------------------------|
//! | 0x00        | G_SPNOOP    | nothing                                        |
//! | 0x01        | G_VTX       | load `n` vertices from `w1` into the buffer    |
//! | 0x03        | G_SETOFFSET | screen offset, `w1 = x << 16 \| y` (signed)    |
//! | 0x05        | G_TRI1      | emit an RDP fill triangle                      |
//! | 0xDE        | G_DL        | call the display list at `w1`                  |
//! | 0xDF        | G_ENDDL     | return from the current list                   |
//! | 0xE4..=0xFF | RDP command | forwarded with opcode `op & 0x3F`              |
//!
//! G_VTX: `w0 = 0x01 << 24 | n << 12 | first << 1`. Each vertex record is 8
//! bytes: x (i16), y (i16), color (RGBA8888).
//!
//! G_TRI1: `w0 = 0x05 << 24 | a << 17 | b << 9 | c << 1`, vertex indices.
//!
//! The top-level list spans the task's data buffer and also ends at
//! G_ENDDL. Output is RDP command words written to the task's output buffer.

use super::RSP;
use crate::core::error::Result;
use crate::core::mailbox::TaskDescriptor;
use crate::core::memory::Bus;
use crate::core::rdp;
use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub const G_SPNOOP: u8 = 0x00;
pub const G_VTX: u8 = 0x01;
pub const G_SETOFFSET: u8 = 0x03;
pub const G_TRI1: u8 = 0x05;
pub const G_DL: u8 = 0xDE;
pub const G_ENDDL: u8 = 0xDF;

/// Vertices held by the microcode
pub const VERTEX_BUFFER_SIZE: usize = 32;

/// Deepest nesting of G_DL calls
pub const MAX_DISPLAY_LIST_DEPTH: usize = 10;

/// Bytes per vertex record in RAM
const VERTEX_RECORD_SIZE: u32 = 8;

/// Commands processed per task before the list is abandoned
const MAX_COMMANDS: usize = 1 << 16;

/// Screen-space vertex
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode,
)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
    /// RGBA8888
    pub color: u32,
}

/// Bounded buffer of RDP command words
///
/// Nothing reaches RAM until the whole list has been walked.
struct CommandBuffer {
    words: Vec<u32>,
    capacity: u32,
    overflowed: bool,
}

impl CommandBuffer {
    fn new(capacity: u32) -> Self {
        Self {
            words: Vec::new(),
            capacity,
            overflowed: false,
        }
    }

    fn len_bytes(&self) -> u32 {
        self.words.len() as u32 * 4
    }

    /// Append a whole command; dropped if it does not fit
    fn push(&mut self, words: &[u32]) {
        let size = words.len() as u32 * 4;
        if self.len_bytes() + size > self.capacity {
            if !self.overflowed {
                log::warn!(
                    "RSP: RDP output buffer full ({} bytes), dropping commands",
                    self.capacity
                );
                self.overflowed = true;
            }
            return;
        }
        self.words.extend_from_slice(words);
    }
}

/// Display list walk state
///
/// Works on copies of the vertex buffer and screen offset so a failed task
/// leaves the RSP untouched.
struct ListWalker {
    output: CommandBuffer,
    commands: usize,
    vertices: [Vertex; VERTEX_BUFFER_SIZE],
    offset: (i16, i16),
}

impl RSP {
    /// Run a graphics task, returning the number of output bytes
    ///
    /// The output buffer and the RSP state are only updated once the whole
    /// display list has been processed and the output range checked.
    pub(super) fn run_graphics_task(
        &mut self,
        bus: &mut Bus,
        task: &TaskDescriptor,
    ) -> Result<u32> {
        let mut walker = ListWalker {
            output: CommandBuffer::new(task.output_cap & !0x3),
            commands: 0,
            vertices: self.vertices,
            offset: self.offset,
        };

        let end = task.data_ptr.wrapping_add(task.data_len & !0x7);
        walker.walk(bus, task.data_ptr, Some(end), 0)?;

        let len = walker.output.len_bytes();
        bus.check_write_range(task.output_ptr, len, 4)?;
        for (i, &word) in walker.output.words.iter().enumerate() {
            bus.write32(task.output_ptr.wrapping_add(i as u32 * 4), word)?;
        }

        self.vertices = walker.vertices;
        self.offset = walker.offset;
        Ok(len)
    }
}

impl ListWalker {
    /// Process one display list
    ///
    /// `end` bounds the top-level list; nested lists run until G_ENDDL.
    fn walk(&mut self, bus: &Bus, start: u32, end: Option<u32>, depth: usize) -> Result<()> {
        let mut addr = start;

        loop {
            if end.is_some_and(|end| addr >= end) {
                return Ok(());
            }
            if self.commands >= MAX_COMMANDS {
                log::warn!(
                    "RSP: display list exceeded {} commands, abandoned",
                    MAX_COMMANDS
                );
                return Ok(());
            }
            self.commands += 1;

            let w0 = bus.read32(addr)?;
            let w1 = bus.read32(addr.wrapping_add(4))?;
            addr = addr.wrapping_add(8);

            let op = (w0 >> 24) as u8;
            match op {
                G_SPNOOP => {}
                G_VTX => self.load_vertices(bus, w0, w1)?,
                G_SETOFFSET => {
                    self.offset = ((w1 >> 16) as i16, w1 as i16);
                }
                G_TRI1 => self.emit_triangle(w0),
                G_DL => {
                    if depth + 1 >= MAX_DISPLAY_LIST_DEPTH {
                        log::warn!(
                            "RSP: G_DL to 0x{:08X} exceeds nesting depth {}, skipped",
                            w1,
                            MAX_DISPLAY_LIST_DEPTH
                        );
                    } else {
                        self.walk(bus, w1, None, depth + 1)?;
                    }
                }
                G_ENDDL => return Ok(()),
                0xE4..=0xFF => {
                    let rdp_op = (op & 0x3F) as u32;
                    self.output
                        .push(&[(w0 & 0x00FF_FFFF) | (rdp_op << 24), w1]);
                }
                _ => {
                    log::warn!(
                        "RSP: unknown display list command 0x{:02X} at 0x{:08X}, skipped",
                        op,
                        addr.wrapping_sub(8)
                    );
                }
            }
        }
    }

    /// G_VTX: copy vertex records into the vertex buffer
    fn load_vertices(&mut self, bus: &Bus, w0: u32, w1: u32) -> Result<()> {
        let count = ((w0 >> 12) & 0xFF) as usize;
        let first = ((w0 >> 1) & 0x7F) as usize;

        if first + count > VERTEX_BUFFER_SIZE {
            log::warn!(
                "RSP: G_VTX {}..{} exceeds vertex buffer, truncated",
                first,
                first + count
            );
        }

        for (i, slot) in (first..VERTEX_BUFFER_SIZE).take(count).enumerate() {
            let record = w1.wrapping_add(i as u32 * VERTEX_RECORD_SIZE);
            let xy = bus.read32(record)?;
            let color = bus.read32(record.wrapping_add(4))?;
            self.vertices[slot] = Vertex {
                x: (xy >> 16) as i16,
                y: xy as i16,
                color,
            };
        }
        Ok(())
    }

    /// G_TRI1: translate three buffered vertices and emit an RDP triangle
    fn emit_triangle(&mut self, w0: u32) {
        let indices = [(w0 >> 17) & 0x7F, (w0 >> 9) & 0x7F, (w0 >> 1) & 0x7F];

        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= VERTEX_BUFFER_SIZE) {
            log::warn!("RSP: G_TRI1 vertex index {} out of range, skipped", bad);
            return;
        }

        let [a, b, c] = indices.map(|i| self.vertices[i as usize]);
        let (dx, dy) = self.offset;
        let point = |v: Vertex| {
            (
                v.x.wrapping_add(dx) as u32 & 0xFFF,
                v.y.wrapping_add(dy) as u32 & 0xFFF,
            )
        };

        let (x0, y0) = point(a);
        let (x1, y1) = point(b);
        let (x2, y2) = point(c);

        self.output.push(&[
            ((rdp::CMD_FILL_TRIANGLE as u32) << 24) | (x0 << 12) | y0,
            (x1 << 12) | y1,
            (x2 << 12) | y2,
            a.color,
        ]);
    }
}
