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

//! System module tests
//!
//! - `basic`: construction, reset, cartridge load, tracing
//! - `execution`: macro-steps, faults, coprocessor hand-off, host yield
//! - `snapshot`: save/load and all-or-nothing restore
//! - `step_loop`: run/pause/resume/stop
//! - `cheats`: direct RAM writes






use super::*;
use crate::core::peripherals::ControllerInput;
use std::sync::{Arc, Mutex};

/// Where test programs are placed and started
pub(super) const BASE: u32 = 0x8000_1000;

/// Instructions per macro-step in test machines
pub(super) const BUDGET: u32 = 16;

pub(super) fn test_config() -> MachineConfig {
    MachineConfig {
        ram_size: 1024 * 1024,
        entry_point: BASE,
        instruction_budget: BUDGET,
        ..Default::default()
    }
}

/// Build a 1MiB machine running `program` from `BASE`
pub(super) fn create_test_system(program: &[u32]) -> System {
    let mut system = System::with_config(test_config()).unwrap();
    write_program(&mut system, BASE, program);
    system
}

pub(super) fn write_program(system: &mut System, addr: u32, program: &[u32]) {
    for (i, &word) in program.iter().enumerate() {
        system.bus_mut().write32(addr + i as u32 * 4, word).unwrap();
    }
}

pub(super) const NOP: u32 = 0;

pub(super) fn addiu(rt: u32, rs: u32, imm: u16) -> u32 {
    (0x09 << 26) | (rs << 21) | (rt << 16) | imm as u32
}

pub(super) fn lui(rt: u32, imm: u16) -> u32 {
    (0x0F << 26) | (rt << 16) | imm as u32
}

pub(super) fn sw(rt: u32, offset: u16, base: u32) -> u32 {
    (0x2B << 26) | (base << 21) | (rt << 16) | offset as u32
}

pub(super) fn lw(rt: u32, offset: u16, base: u32) -> u32 {
    (0x23 << 26) | (base << 21) | (rt << 16) | offset as u32
}

pub(super) fn j(target: u32) -> u32 {
    (0x02 << 26) | ((target >> 2) & 0x03FF_FFFF)
}

pub(super) fn mtc0(rt: u32, rd: u32) -> u32 {
    (0x10 << 26) | (0x04 << 21) | (rt << 16) | (rd << 11)
}

pub(super) const ERET: u32 = 0x4200_0018;

/// `loop: addiu r1, r1, 1; sw r1, 0x100(r0); j loop; nop`
pub(super) fn counter_program() -> Vec<u32> {
    vec![addiu(1, 1, 1), sw(1, 0x100, 0), j(BASE), NOP]
}

/// `loop: j loop; nop`
pub(super) fn idle_program() -> Vec<u32> {
    vec![j(BASE), NOP]
}

/// Video sink that records presented frames
#[derive(Clone, Default)]
pub(super) struct RecordingVideo {
    pub frames: Arc<Mutex<Vec<(usize, usize, Vec<u8>)>>>,
}

impl VideoSink for RecordingVideo {
    fn present(&mut self, pixels: &[u8], width: usize, height: usize) {
        self.frames
            .lock()
            .unwrap()
            .push((width, height, pixels.to_vec()));
    }
}

/// Audio sink that records queued frames
#[derive(Clone, Default)]
pub(super) struct RecordingAudio {
    pub samples: Arc<Mutex<Vec<(i16, i16)>>>,
}

impl AudioSink for RecordingAudio {
    fn queue_samples(&mut self, frames: &[(i16, i16)]) {
        self.samples.lock().unwrap().extend_from_slice(frames);
    }
}

/// Input provider with a fixed state on port 0
pub(super) struct PortZero(pub ControllerInput);

impl InputProvider for PortZero {
    fn poll(&mut self, port: usize) -> ControllerInput {
        if port == 0 {
            self.0
        } else {
            ControllerInput::default()
        }
    }
}
