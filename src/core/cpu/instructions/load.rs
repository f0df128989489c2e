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

use super::super::decode::Instruction;
use super::super::CPU;
use crate::core::error::Result;
use crate::core::memory::Bus;

impl CPU {
    // === Load Instructions ===
    //
    // Effective address = rs + sign_extend(offset). Misaligned or unmapped
    // addresses fail the step with the bus error; rt is only written after
    // a successful read.

    #[inline]
    pub(in crate::core::cpu) fn effective_address(&self, instr: Instruction) -> u32 {
        self.reg(instr.rs()).wrapping_add(instr.imm_se())
    }

    /// LW: Load Word (32-bit)
    ///
    /// Format: lw rt, offset(rs)
    pub(crate) fn op_lw(&mut self, instr: Instruction, bus: &mut Bus) -> Result<()> {
        let value = bus.read32(self.effective_address(instr))?;
        self.set_reg(instr.rt(), value);
        Ok(())
    }

    /// LH: Load Halfword (sign-extended)
    pub(crate) fn op_lh(&mut self, instr: Instruction, bus: &mut Bus) -> Result<()> {
        let value = bus.read16(self.effective_address(instr))? as i16 as i32 as u32;
        self.set_reg(instr.rt(), value);
        Ok(())
    }

    /// LHU: Load Halfword Unsigned (zero-extended)
    pub(crate) fn op_lhu(&mut self, instr: Instruction, bus: &mut Bus) -> Result<()> {
        let value = bus.read16(self.effective_address(instr))? as u32;
        self.set_reg(instr.rt(), value);
        Ok(())
    }

    /// LB: Load Byte (sign-extended)
    pub(crate) fn op_lb(&mut self, instr: Instruction, bus: &mut Bus) -> Result<()> {
        let value = bus.read8(self.effective_address(instr))? as i8 as i32 as u32;
        self.set_reg(instr.rt(), value);
        Ok(())
    }

    /// LBU: Load Byte Unsigned (zero-extended)
    pub(crate) fn op_lbu(&mut self, instr: Instruction, bus: &mut Bus) -> Result<()> {
        let value = bus.read8(self.effective_address(instr))? as u32;
        self.set_reg(instr.rt(), value);
        Ok(())
    }
}
