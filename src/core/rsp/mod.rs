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

//! RSP (Reality Signal Processor) emulation
//!
//! The RSP is modeled at task level (HLE): instead of executing microcode it
//! recognizes the two task kinds games hand it and performs their effect
//! directly.
//!
//! # Task Protocol
//!
//! 1. The CPU fills the task descriptor in the mailbox and sets `READY`
//! 2. On its next poll ([`RSP::step`]) the RSP reads the descriptor and runs
//!    the task, writing output to the task's output buffer
//! 3. The RSP writes the result length, clears `READY` and sets `DONE`
//! 4. The machine drives the CPU's RSP interrupt line while `DONE` is set
//!
//! See [`crate::core::mailbox`] for the descriptor layout.

use crate::core::error::Result;
use crate::core::mailbox::{self, TaskDescriptor, TaskStatus, TaskType};
use crate::core::memory::Bus;
use crate::core::save_state::{RspState, StateSave};

mod audio;
mod graphics;
#[cfg(test)]
mod tests;

pub use graphics::{
    Vertex, G_DL, G_ENDDL, G_SETOFFSET, G_SPNOOP, G_TRI1, G_VTX, MAX_DISPLAY_LIST_DEPTH,
    VERTEX_BUFFER_SIZE,
};

/// Scalar registers the task descriptor is loaded into
const REG_TASK_TYPE: usize = 1;
const REG_DATA_PTR: usize = 2;
const REG_DATA_LEN: usize = 3;
const REG_OUTPUT_PTR: usize = 4;
const REG_OUTPUT_CAP: usize = 5;
const REG_RESULT_LEN: usize = 6;

/// Result of one RSP poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RspOutcome {
    /// No task was waiting
    Idle,
    /// A task ran to completion
    Completed(TaskReport),
}

/// Summary of a completed task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskReport {
    /// Raw task type word from the descriptor
    pub task_type: u32,
    /// Bytes written to the output buffer
    pub result_len: u32,
    /// RDP command range `[start, end)` produced by a graphics task
    pub rdp_commands: Option<(u32, u32)>,
}

/// Reality Signal Processor
pub struct RSP {
    /// Scalar unit registers
    scalar_regs: [u32; 32],

    /// READY as seen on the last poll
    task_ready: bool,

    /// Vertex buffer filled by G_VTX
    vertices: [Vertex; VERTEX_BUFFER_SIZE],

    /// Screen offset applied to triangle vertices
    offset: (i16, i16),

    /// Tasks completed since reset
    tasks_completed: u64,

    /// Stereo frames mixed by audio tasks, not yet delivered to the host
    pending_audio: Vec<(i16, i16)>,
}

impl RSP {
    pub fn new() -> Self {
        Self {
            scalar_regs: [0; 32],
            task_ready: false,
            vertices: [Vertex::default(); VERTEX_BUFFER_SIZE],
            offset: (0, 0),
            tasks_completed: 0,
            pending_audio: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Poll the task mailbox and run a waiting task
    ///
    /// A no-op returning [`RspOutcome::Idle`] when `READY` is clear.
    ///
    /// # Errors
    ///
    /// Bus errors raised while reading the task's input or checking its
    /// output range. The mailbox, the output buffer and the RSP state are
    /// left untouched in that case.
    ///
    /// # Example
    ///
    /// ```
    /// use n64rx::core::mailbox::{self, TaskDescriptor, TaskStatus};
    /// use n64rx::core::memory::Bus;
    /// use n64rx::core::rsp::{RspOutcome, RSP};
    ///
    /// let mut bus = Bus::new(1024 * 1024);
    /// let mut rsp = RSP::new();
    /// assert_eq!(rsp.step(&mut bus).unwrap(), RspOutcome::Idle);
    ///
    /// // Task type 9 is unknown: completed with no output
    /// TaskDescriptor { task_type: 9, data_ptr: 0, data_len: 0, output_ptr: 0, output_cap: 0 }
    ///     .post(&mut bus)
    ///     .unwrap();
    /// assert!(matches!(rsp.step(&mut bus).unwrap(), RspOutcome::Completed(_)));
    /// assert_eq!(mailbox::task_status(&bus).unwrap(), TaskStatus::DONE);
    /// ```
    pub fn step(&mut self, bus: &mut Bus) -> Result<RspOutcome> {
        let status = mailbox::task_status(bus)?;
        if !status.contains(TaskStatus::READY) {
            self.task_ready = false;
            return Ok(RspOutcome::Idle);
        }

        let task = TaskDescriptor::read(bus)?;

        log::debug!(
            "RSP: task type {} data=0x{:08X}+{} output=0x{:08X} cap={}",
            task.task_type,
            task.data_ptr,
            task.data_len,
            task.output_ptr,
            task.output_cap
        );

        let (result_len, rdp_commands) = match TaskType::from_word(task.task_type) {
            Some(TaskType::Graphics) => {
                let len = self.run_graphics_task(bus, &task)?;
                let range = (len > 0).then(|| {
                    (task.output_ptr, task.output_ptr.wrapping_add(len))
                });
                (len, range)
            }
            Some(TaskType::Audio) => (self.run_audio_task(bus, &task)?, None),
            None => {
                log::warn!(
                    "RSP: unknown task type {}, completing with no output",
                    task.task_type
                );
                (0, None)
            }
        };

        bus.write32(mailbox::TASK_RESULT_LEN, result_len)?;
        mailbox::set_task_status(bus, (status - TaskStatus::READY) | TaskStatus::DONE)?;

        self.load_descriptor(&task);
        self.scalar_regs[REG_RESULT_LEN] = result_len;
        self.task_ready = false;
        self.tasks_completed += 1;

        Ok(RspOutcome::Completed(TaskReport {
            task_type: task.task_type,
            result_len,
            rdp_commands,
        }))
    }

    /// Task setup performed by the boot microcode
    fn load_descriptor(&mut self, task: &TaskDescriptor) {
        self.scalar_regs[REG_TASK_TYPE] = task.task_type;
        self.scalar_regs[REG_DATA_PTR] = task.data_ptr;
        self.scalar_regs[REG_DATA_LEN] = task.data_len;
        self.scalar_regs[REG_OUTPUT_PTR] = task.output_ptr;
        self.scalar_regs[REG_OUTPUT_CAP] = task.output_cap;
        self.scalar_regs[REG_RESULT_LEN] = 0;
    }

    /// Take the audio frames mixed since the last call
    pub fn take_audio(&mut self) -> Vec<(i16, i16)> {
        std::mem::take(&mut self.pending_audio)
    }

    pub fn task_ready(&self) -> bool {
        self.task_ready
    }

    pub fn tasks_completed(&self) -> u64 {
        self.tasks_completed
    }

    pub fn scalar_reg(&self, index: usize) -> u32 {
        self.scalar_regs[index & 0x1F]
    }

    pub fn vertex(&self, index: usize) -> Option<Vertex> {
        self.vertices.get(index).copied()
    }

    pub fn offset(&self) -> (i16, i16) {
        self.offset
    }
}

impl Default for RSP {
    fn default() -> Self {
        Self::new()
    }
}

impl StateSave for RSP {
    type State = RspState;

    fn to_state(&self) -> RspState {
        RspState {
            scalar_regs: self.scalar_regs,
            task_ready: self.task_ready,
            vertices: self.vertices.to_vec(),
            offset_x: self.offset.0,
            offset_y: self.offset.1,
            tasks_completed: self.tasks_completed,
        }
    }

    fn restore_from_state(&mut self, state: &RspState) {
        self.scalar_regs = state.scalar_regs;
        self.task_ready = state.task_ready;
        self.vertices = [Vertex::default(); VERTEX_BUFFER_SIZE];
        for (slot, vertex) in self.vertices.iter_mut().zip(&state.vertices) {
            *slot = *vertex;
        }
        self.offset = (state.offset_x, state.offset_y);
        self.tasks_completed = state.tasks_completed;
        self.pending_audio.clear();
    }
}
