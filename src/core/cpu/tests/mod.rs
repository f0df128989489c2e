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

//! CPU test modules
//!
//! - `basic`: initialization, reset, register access, fetch faults
//! - `instructions`: ALU, shift, multiply/divide, load/store semantics
//! - `delay_slot`: branch/jump delay slots and branch-likely nullification
//! - `exceptions`: overflow trap, syscall/break, unsupported opcodes, interrupts
//! - `cop0`: MFC0/MTC0 side effects and ERET





#[cfg(test)]
mod cop0;

use super::CPU;
use crate::core::memory::Bus;

/// Load address of test programs (KSEG0 view of RAM)
pub(super) const BASE: u32 = 0x8000_1000;

/// Place `program` at `BASE` and point the CPU at it
pub(super) fn setup(program: &[u32]) -> (CPU, Bus) {
    let mut bus = Bus::new(1024 * 1024);
    for (i, &word) in program.iter().enumerate() {
        bus.write32(BASE + (i as u32) * 4, word).unwrap();
    }

    let mut cpu = CPU::new();
    cpu.set_entry_point(BASE);
    cpu.reset();
    (cpu, bus)
}

pub(super) fn run(cpu: &mut CPU, bus: &mut Bus, steps: usize) {
    for _ in 0..steps {
        cpu.step(bus).unwrap();
    }
}

// --- Instruction encoders ---

pub(super) fn r_type(funct: u32, rs: u32, rt: u32, rd: u32, shamt: u32) -> u32 {
    (rs << 21) | (rt << 16) | (rd << 11) | (shamt << 6) | funct
}

pub(super) fn i_type(op: u32, rs: u32, rt: u32, imm: u16) -> u32 {
    (op << 26) | (rs << 21) | (rt << 16) | imm as u32
}

pub(super) fn j_type(op: u32, target: u32) -> u32 {
    (op << 26) | (target & 0x03FF_FFFF)
}

pub(super) const NOP: u32 = 0;

pub(super) fn addiu(rt: u32, rs: u32, imm: i16) -> u32 {
    i_type(0x09, rs, rt, imm as u16)
}

pub(super) fn addi(rt: u32, rs: u32, imm: i16) -> u32 {
    i_type(0x08, rs, rt, imm as u16)
}

pub(super) fn lui(rt: u32, imm: u16) -> u32 {
    i_type(0x0F, 0, rt, imm)
}

pub(super) fn ori(rt: u32, rs: u32, imm: u16) -> u32 {
    i_type(0x0D, rs, rt, imm)
}

pub(super) fn add(rd: u32, rs: u32, rt: u32) -> u32 {
    r_type(0x20, rs, rt, rd, 0)
}

pub(super) fn beq(rs: u32, rt: u32, offset: i16) -> u32 {
    i_type(0x04, rs, rt, offset as u16)
}

pub(super) fn bne(rs: u32, rt: u32, offset: i16) -> u32 {
    i_type(0x05, rs, rt, offset as u16)
}

pub(super) fn mtc0(rt: u32, rd: u32) -> u32 {
    0x4080_0000 | (rt << 16) | (rd << 11)
}

pub(super) fn mfc0(rt: u32, rd: u32) -> u32 {
    0x4000_0000 | (rt << 16) | (rd << 11)
}

pub(super) const ERET: u32 = 0x4200_0018;
