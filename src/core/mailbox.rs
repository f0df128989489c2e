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

//! Reserved RAM locations shared between the CPU and the coprocessors
//!
//! Coprocessor hand-off is message passing through main RAM. The CPU fills a
//! task descriptor and sets `READY`; the RSP picks it up on its next poll,
//! writes the result length, clears `READY` and sets `DONE`. `DONE` stays set
//! (and the RSP interrupt line stays raised) until software clears it.
//!
//! # Task Mailbox (`TASK_MAILBOX`)
//!
//! ```text
//! Offset | Field
//! -------|-------------------------------------------
//! +0x00  | Status (bit 0 READY, bit 1 DONE)
//! +0x04  | Task type (1 = graphics, 2 = audio)
//! +0x08  | Data pointer
//! +0x0C  | Data length in bytes
//! +0x10  | Output pointer
//! +0x14  | Output capacity in bytes
//! +0x18  | Result length in bytes (written by the RSP)
//! ```
//!
//! # Controller Mailbox (`CONTROLLER_MAILBOX`)
//!
//! Four 8-byte entries, one per port, refreshed once per macro-step:
//! word 0 = `buttons << 16 | (stick_x as u8) << 8 | (stick_y as u8)`,
//! word 1 = connected flag.

use crate::core::error::Result;
use crate::core::memory::Bus;
use bitflags::bitflags;

/// Physical address of the RSP task descriptor
pub const TASK_MAILBOX: u32 = 0x0000_0FC0;

/// Physical address of the controller state mirror
pub const CONTROLLER_MAILBOX: u32 = 0x0000_0F80;

/// Bytes per controller mailbox entry
pub const CONTROLLER_ENTRY_SIZE: u32 = 8;

pub const TASK_STATUS: u32 = TASK_MAILBOX;
pub const TASK_TYPE: u32 = TASK_MAILBOX + 0x04;
pub const TASK_DATA_PTR: u32 = TASK_MAILBOX + 0x08;
pub const TASK_DATA_LEN: u32 = TASK_MAILBOX + 0x0C;
pub const TASK_OUTPUT_PTR: u32 = TASK_MAILBOX + 0x10;
pub const TASK_OUTPUT_CAP: u32 = TASK_MAILBOX + 0x14;
pub const TASK_RESULT_LEN: u32 = TASK_MAILBOX + 0x18;

bitflags! {
    /// Task mailbox status word
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TaskStatus: u32 {
        /// Descriptor is filled in and waiting for the RSP
        const READY = 1 << 0;
        /// RSP finished the task; cleared by software to acknowledge
        const DONE = 1 << 1;
    }
}

/// Task kinds understood by the RSP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TaskType {
    Graphics = 1,
    Audio = 2,
}

impl TaskType {
    pub fn from_word(word: u32) -> Option<Self> {
        match word {
            1 => Some(TaskType::Graphics),
            2 => Some(TaskType::Audio),
            _ => None,
        }
    }
}

/// Task descriptor as laid out in the mailbox
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub task_type: u32,
    pub data_ptr: u32,
    pub data_len: u32,
    pub output_ptr: u32,
    pub output_cap: u32,
}

impl TaskDescriptor {
    /// Read the descriptor fields from the mailbox
    pub fn read(bus: &Bus) -> Result<Self> {
        Ok(Self {
            task_type: bus.read32(TASK_TYPE)?,
            data_ptr: bus.read32(TASK_DATA_PTR)?,
            data_len: bus.read32(TASK_DATA_LEN)?,
            output_ptr: bus.read32(TASK_OUTPUT_PTR)?,
            output_cap: bus.read32(TASK_OUTPUT_CAP)?,
        })
    }

    /// Fill the mailbox and raise `READY`, as CPU software would
    ///
    /// # Example
    /// ```
    /// use n64rx::core::mailbox::{self, TaskDescriptor, TaskStatus};
    /// use n64rx::core::memory::Bus;
    ///
    /// let mut bus = Bus::new(8 * 1024 * 1024);
    /// let task = TaskDescriptor {
    ///     task_type: 1,
    ///     data_ptr: 0x1000,
    ///     data_len: 8,
    ///     output_ptr: 0x2000,
    ///     output_cap: 0x100,
    /// };
    /// task.post(&mut bus).unwrap();
    /// assert!(mailbox::task_status(&bus).unwrap().contains(TaskStatus::READY));
    /// ```
    pub fn post(&self, bus: &mut Bus) -> Result<()> {
        bus.write32(TASK_TYPE, self.task_type)?;
        bus.write32(TASK_DATA_PTR, self.data_ptr)?;
        bus.write32(TASK_DATA_LEN, self.data_len)?;
        bus.write32(TASK_OUTPUT_PTR, self.output_ptr)?;
        bus.write32(TASK_OUTPUT_CAP, self.output_cap)?;
        bus.write32(TASK_RESULT_LEN, 0)?;
        bus.write32(TASK_STATUS, TaskStatus::READY.bits())
    }
}

/// Current mailbox status (unknown bits are dropped)
pub fn task_status(bus: &Bus) -> Result<TaskStatus> {
    Ok(TaskStatus::from_bits_truncate(bus.read32(TASK_STATUS)?))
}

pub fn set_task_status(bus: &mut Bus, status: TaskStatus) -> Result<()> {
    bus.write32(TASK_STATUS, status.bits())
}

/// Address of a port's entry in the controller mailbox
pub fn controller_entry(port: usize) -> u32 {
    CONTROLLER_MAILBOX + port as u32 * CONTROLLER_ENTRY_SIZE
}
