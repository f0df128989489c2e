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
    // === Store Instructions ===

    /// SW: Store Word (32-bit)
    ///
    /// Format: sw rt, offset(rs)
    /// Operation: memory[rs + sign_extend(offset)] = rt
    pub(crate) fn op_sw(&mut self, instr: Instruction, bus: &mut Bus) -> Result<()> {
        bus.write32(self.effective_address(instr), self.reg(instr.rt()))
    }

    /// SH: Store Halfword (low 16 bits of rt)
    pub(crate) fn op_sh(&mut self, instr: Instruction, bus: &mut Bus) -> Result<()> {
        bus.write16(self.effective_address(instr), self.reg(instr.rt()) as u16)
    }

    /// SB: Store Byte (low 8 bits of rt)
    pub(crate) fn op_sb(&mut self, instr: Instruction, bus: &mut Bus) -> Result<()> {
        bus.write8(self.effective_address(instr), self.reg(instr.rt()) as u8)
    }
}
