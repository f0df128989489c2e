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
    // === Branch Instructions ===

    /// Resolve a conditional branch
    ///
    /// The delay slot always executes. When taken, the target is computed
    /// relative to the delay slot address, which `self.pc` holds while the
    /// branch executes: target = (B + 4) + offset.
    pub(in crate::core::cpu) fn branch(&mut self, taken: bool, offset: u32) {
        if taken {
            self.next_pc = self.pc.wrapping_add(offset);
        }
        self.delay_slot_pending = true;
    }

    /// Resolve a branch-likely
    ///
    /// Same as `branch` when taken. When not taken the delay slot is
    /// nullified: execution continues after it.
    pub(in crate::core::cpu) fn branch_likely(&mut self, taken: bool, offset: u32) {
        if taken {
            self.branch(true, offset);
        } else {
            self.pc = self.next_pc;
            self.next_pc = self.next_pc.wrapping_add(4);
        }
    }

    /// Signed comparison of rs against zero used by the REGIMM/BLEZ/BGTZ group
    #[inline]
    fn rs_signed(&self, instr: Instruction) -> i32 {
        self.reg(instr.rs()) as i32
    }

    /// BEQ: Branch on Equal
    ///
    /// Format: beq rs, rt, offset
    /// Operation: if (rs == rt) PC = PC + 4 + (sign_extend(offset) << 2)
    pub(in crate::core::cpu) fn op_beq(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.reg(instr.rs()) == self.reg(instr.rt());
        self.branch(taken, instr.branch_offset());
        Ok(())
    }

    /// BNE: Branch on Not Equal
    pub(in crate::core::cpu) fn op_bne(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.reg(instr.rs()) != self.reg(instr.rt());
        self.branch(taken, instr.branch_offset());
        Ok(())
    }

    /// BLEZ: Branch on Less Than or Equal to Zero
    pub(in crate::core::cpu) fn op_blez(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.rs_signed(instr) <= 0;
        self.branch(taken, instr.branch_offset());
        Ok(())
    }

    /// BGTZ: Branch on Greater Than Zero
    pub(in crate::core::cpu) fn op_bgtz(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.rs_signed(instr) > 0;
        self.branch(taken, instr.branch_offset());
        Ok(())
    }

    pub(in crate::core::cpu) fn op_beql(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.reg(instr.rs()) == self.reg(instr.rt());
        self.branch_likely(taken, instr.branch_offset());
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bnel(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.reg(instr.rs()) != self.reg(instr.rt());
        self.branch_likely(taken, instr.branch_offset());
        Ok(())
    }

    pub(in crate::core::cpu) fn op_blezl(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.rs_signed(instr) <= 0;
        self.branch_likely(taken, instr.branch_offset());
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bgtzl(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.rs_signed(instr) > 0;
        self.branch_likely(taken, instr.branch_offset());
        Ok(())
    }

    // --- REGIMM (opcode 0x01) ---

    pub(in crate::core::cpu) fn op_bltz(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.rs_signed(instr) < 0;
        self.branch(taken, instr.branch_offset());
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bgez(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.rs_signed(instr) >= 0;
        self.branch(taken, instr.branch_offset());
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bltzl(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.rs_signed(instr) < 0;
        self.branch_likely(taken, instr.branch_offset());
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bgezl(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.rs_signed(instr) >= 0;
        self.branch_likely(taken, instr.branch_offset());
        Ok(())
    }

    /// BLTZAL: Branch on Less Than Zero And Link
    ///
    /// r31 receives the address after the delay slot whether or not the
    /// branch is taken. The condition is evaluated before the link write.
    pub(in crate::core::cpu) fn op_bltzal(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.rs_signed(instr) < 0;
        self.set_reg(31, self.next_pc);
        self.branch(taken, instr.branch_offset());
        Ok(())
    }

    pub(in crate::core::cpu) fn op_bgezal(&mut self, instr: Instruction) -> Result<()> {
        let taken = self.rs_signed(instr) >= 0;
        self.set_reg(31, self.next_pc);
        self.branch(taken, instr.branch_offset());
        Ok(())
    }
}
