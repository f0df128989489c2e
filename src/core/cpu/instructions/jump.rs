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

impl CPU {
    // === Jump Instructions ===
    //
    // While a jump executes, `self.pc` holds the delay slot address and
    // `self.next_pc` the address after it (the link value).

    /// J: Jump
    ///
    /// Format: j target
    /// Operation: PC = (PC & 0xF0000000) | (target << 2)
    pub(crate) fn op_j(&mut self, instr: Instruction) -> Result<()> {
        self.jump((self.pc & 0xF000_0000) | (instr.target() << 2));
        Ok(())
    }

    /// JAL: Jump and Link
    ///
    /// Operation: r31 = PC + 8; PC = (PC & 0xF0000000) | (target << 2)
    pub(crate) fn op_jal(&mut self, instr: Instruction) -> Result<()> {
        self.set_reg(31, self.next_pc);
        self.op_j(instr)
    }

    /// JR: Jump Register
    pub(crate) fn op_jr(&mut self, rs: u8) -> Result<()> {
        self.jump(self.reg(rs));
        Ok(())
    }

    /// JALR: Jump And Link Register
    ///
    /// Format: jalr rd, rs
    /// The target is read before rd is written, so `jalr r1, r1` jumps to
    /// the old r1.
    pub(crate) fn op_jalr(&mut self, rs: u8, rd: u8) -> Result<()> {
        let target = self.reg(rs);
        self.set_reg(rd, self.next_pc);
        self.jump(target);
        Ok(())
    }

    fn jump(&mut self, target: u32) {
        self.next_pc = target;
        self.delay_slot_pending = true;
    }
}
