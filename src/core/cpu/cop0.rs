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

/// Coprocessor 0 (System Control)
///
/// The VR4300 keeps exception state, the interrupt mask and the Count/Compare
/// timer here. No TLB is modeled, so Index/EntryHi/Random are plain storage.
pub struct COP0 {
    /// COP0 registers (32 registers)
    pub(super) regs: [u32; 32],
}

impl COP0 {
    /// TLB index
    pub const INDEX: usize = 0;
    /// TLB random index
    pub const RANDOM: usize = 1;
    /// Bad Virtual Address
    pub const BADVADDR: usize = 8;
    /// Timer counter, incremented once per instruction
    pub const COUNT: usize = 9;
    /// TLB entry high
    pub const ENTRYHI: usize = 10;
    /// Timer compare value
    pub const COMPARE: usize = 11;
    /// Status Register
    pub const STATUS: usize = 12;
    /// Cause Register
    pub const CAUSE: usize = 13;
    /// Exception PC
    pub const EPC: usize = 14;
    /// Processor ID
    pub const PRID: usize = 15;
    /// Configuration
    pub const CONFIG: usize = 16;
    /// Error Exception PC
    pub const ERROREPC: usize = 30;

    /// Status.IE: global interrupt enable
    pub const STATUS_IE: u32 = 1 << 0;
    /// Status.EXL: exception level
    pub const STATUS_EXL: u32 = 1 << 1;
    /// Status.ERL: error level (set on reset)
    pub const STATUS_ERL: u32 = 1 << 2;

    /// Cause.BD: last exception was taken in a branch delay slot
    pub const CAUSE_BD: u32 = 1 << 31;
    /// Cause.ExcCode field
    pub const CAUSE_EXCCODE_MASK: u32 = 0x7C;
    /// Cause bits writable by MTC0 (software interrupts IP0/IP1)
    pub const CAUSE_SW_MASK: u32 = 0x0300;

    // CU0 | CU1 | FR | ERL
    const RESET_STATUS: u32 = 0x3400_0004;
    // VR4300 implementation/revision
    const RESET_PRID: u32 = 0x0000_0B22;
    const RESET_CONFIG: u32 = 0x7006_E463;

    pub(super) fn new() -> Self {
        let mut cop0 = Self { regs: [0u32; 32] };
        cop0.reset();
        cop0
    }

    /// Reset COP0 registers to power-on values
    pub(super) fn reset(&mut self) {
        self.regs = [0u32; 32];
        self.regs[Self::RANDOM] = 31;
        self.regs[Self::STATUS] = Self::RESET_STATUS;
        self.regs[Self::PRID] = Self::RESET_PRID;
        self.regs[Self::CONFIG] = Self::RESET_CONFIG;
    }

    /// Interrupts are taken only with IE set and both EXL and ERL clear
    #[inline]
    pub(super) fn interrupts_enabled(&self) -> bool {
        let status = self.regs[Self::STATUS];
        status & Self::STATUS_IE != 0 && status & (Self::STATUS_EXL | Self::STATUS_ERL) == 0
    }

    /// Pending interrupt lines that are also unmasked (IP & IM)
    #[inline]
    pub(super) fn pending_interrupts(&self) -> u32 {
        let ip = (self.regs[Self::CAUSE] >> 8) & 0xFF;
        let im = (self.regs[Self::STATUS] >> 8) & 0xFF;
        ip & im
    }
}

/// Exception cause codes for the VR4300
///
/// These are the ExcCode values stored in Cause bits 6:2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ExceptionCause {
    /// Interrupt (external, RSP completion or timer)
    Interrupt = 0,
    /// Instruction fetch from a misaligned address (AdEL)
    AddressErrorLoad = 4,
    /// Syscall instruction executed
    Syscall = 8,
    /// Breakpoint instruction executed
    Breakpoint = 9,
    /// Signed arithmetic overflow (ADD, ADDI, SUB)
    Overflow = 12,
}
