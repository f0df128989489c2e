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

//! RDP test modules
//!
//! - `commands`: command stream parsing and rendering
//! - `state`: idempotence, reset and save state



use super::*;

/// Address command streams are placed at
pub(super) const STREAM: u32 = 0x1000;

/// Write `words` at `STREAM` and submit them to a fresh RDP
pub(super) fn submit_stream(words: &[u32]) -> (RDP, Bus) {
    let mut bus = Bus::new(64 * 1024);
    for (i, &word) in words.iter().enumerate() {
        bus.write32(STREAM + i as u32 * 4, word).unwrap();
    }

    let mut rdp = RDP::new();
    rdp.submit(STREAM, STREAM + words.len() as u32 * 4);
    (rdp, bus)
}

/// Pack a 10.2 fixed point coordinate pair from whole pixels
pub(super) fn fixed(x: u32, y: u32) -> u32 {
    ((x * 4) << 12) | (y * 4)
}

pub(super) fn command(id: u8, low: u32) -> u32 {
    ((id as u32) << 24) | (low & 0x00FF_FFFF)
}

pub(super) fn pixel(rdp: &RDP, x: usize, y: usize) -> u32 {
    let i = (y * FRAME_WIDTH + x) * 4;
    let p = &rdp.pixels()[i..i + 4];
    u32::from_be_bytes([p[0], p[1], p[2], p[3]])
}
