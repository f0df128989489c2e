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

//! Audio task (HLE voice mixer)
//!
//! The task's data buffer holds a voice list, 16 bytes per voice:
//!
//! ```text
//! +0x00  sample address (mono i16, big-endian)
//! +0x04  sample count
//! +0x08  left volume  (low 16 bits, Q1.15)
//! +0x0C  right volume (low 16 bits, Q1.15)
//! ```
//!
//! All voices are mixed with saturation into interleaved stereo frames
//! (left i16, right i16, big-endian) written to the output buffer. The frame
//! count is the longest voice, cut down to what fits in the output capacity.

use super::RSP;
use crate::core::error::Result;
use crate::core::mailbox::TaskDescriptor;
use crate::core::memory::Bus;

/// Bytes per voice descriptor
pub const VOICE_SIZE: u32 = 16;

/// Bytes per output frame (two i16 channels)
pub const FRAME_SIZE: u32 = 4;

#[derive(Debug, Clone, Copy)]
struct Voice {
    sample_addr: u32,
    sample_count: u32,
    volume_left: i16,
    volume_right: i16,
}

impl Voice {
    fn read(bus: &Bus, addr: u32) -> Result<Self> {
        Ok(Self {
            sample_addr: bus.read32(addr)?,
            sample_count: bus.read32(addr.wrapping_add(4))?,
            volume_left: bus.read32(addr.wrapping_add(8))? as i16,
            volume_right: bus.read32(addr.wrapping_add(12))? as i16,
        })
    }
}

/// Scale a sample by a Q1.15 volume
#[inline(always)]
fn apply_volume(sample: i16, volume: i16) -> i32 {
    (sample as i32 * volume as i32) >> 15
}

#[inline(always)]
fn saturate(value: i32) -> i16 {
    value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

impl RSP {
    /// Run an audio task, returning the number of output bytes
    ///
    /// The output buffer is written only after every sample has been read.
    pub(super) fn run_audio_task(
        &mut self,
        bus: &mut Bus,
        task: &TaskDescriptor,
    ) -> Result<u32> {
        let voice_count = task.data_len / VOICE_SIZE;
        let voices = (0..voice_count)
            .map(|i| Voice::read(bus, task.data_ptr.wrapping_add(i * VOICE_SIZE)))
            .collect::<Result<Vec<_>>>()?;

        let longest = voices.iter().map(|v| v.sample_count).max().unwrap_or(0);
        let frames = longest.min(task.output_cap / FRAME_SIZE);
        if frames < longest {
            log::warn!(
                "RSP: audio output holds {} of {} frames, truncated",
                frames,
                longest
            );
        }

        // Bounds `frames` by the output region before anything is mixed
        bus.check_write_range(task.output_ptr, frames * FRAME_SIZE, 2)?;

        let mut mixed = Vec::new();
        for frame in 0..frames {
            let mut left = 0i32;
            let mut right = 0i32;
            for voice in voices.iter().filter(|v| frame < v.sample_count) {
                let sample = bus.read16(voice.sample_addr.wrapping_add(frame * 2))? as i16;
                left += apply_volume(sample, voice.volume_left);
                right += apply_volume(sample, voice.volume_right);
            }
            mixed.push((saturate(left), saturate(right)));
        }

        for (i, &(left, right)) in mixed.iter().enumerate() {
            let out = task.output_ptr.wrapping_add(i as u32 * FRAME_SIZE);
            bus.write16(out, left as u16)?;
            bus.write16(out.wrapping_add(2), right as u16)?;
        }

        log::debug!("RSP: mixed {} voices into {} frames", voice_count, frames);

        self.pending_audio.extend_from_slice(&mixed);
        Ok(frames * FRAME_SIZE)
    }
}
