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

//! CPU instruction implementations
//!
//! Instructions are grouped by type. Dispatch is a match over the primary
//! opcode, then over the SPECIAL function, REGIMM rt or COP0 rs field.
//! Anything not listed falls through to `CPU::unsupported`.

use super::decode::Instruction;
use super::CPU;
use crate::core::error::Result;
use crate::core::memory::Bus;

mod arithmetic;
mod branch;
mod cop0;
mod exception;
mod jump;
mod load;
mod logical;
mod multiply;
mod shift;
mod store;

impl CPU {
    /// Decode and execute the current instruction
    pub(super) fn execute_instruction(&mut self, bus: &mut Bus) -> Result<()> {
        let instr = Instruction(self.current_instruction);

        match instr.opcode() {
            0x00 => self.execute_special(instr),
            0x01 => self.execute_regimm(instr),
            0x02 => self.op_j(instr),
            0x03 => self.op_jal(instr),
            0x04 => self.op_beq(instr),
            0x05 => self.op_bne(instr),
            0x06 => self.op_blez(instr),
            0x07 => self.op_bgtz(instr),
            0x08 => self.op_addi(instr),
            0x09 => self.op_addiu(instr),
            0x0A => self.op_slti(instr),
            0x0B => self.op_sltiu(instr),
            0x0C => self.op_andi(instr),
            0x0D => self.op_ori(instr),
            0x0E => self.op_xori(instr),
            0x0F => self.op_lui(instr),
            0x10 => self.execute_cop0(instr),
            0x14 => self.op_beql(instr),
            0x15 => self.op_bnel(instr),
            0x16 => self.op_blezl(instr),
            0x17 => self.op_bgtzl(instr),
            0x20 => self.op_lb(instr, bus),
            0x21 => self.op_lh(instr, bus),
            0x23 => self.op_lw(instr, bus),
            0x24 => self.op_lbu(instr, bus),
            0x25 => self.op_lhu(instr, bus),
            0x28 => self.op_sb(instr, bus),
            0x29 => self.op_sh(instr, bus),
            0x2B => self.op_sw(instr, bus),
            // CACHE: no caches are modeled
            0x2F => Ok(()),
            _ => self.unsupported(),
        }
    }

    /// Handle SPECIAL instructions (opcode 0x00)
    fn execute_special(&mut self, instr: Instruction) -> Result<()> {
        let (rs, rt, rd) = (instr.rs(), instr.rt(), instr.rd());

        match instr.funct() {
            0x00 => self.op_sll(rt, rd, instr.shamt()),
            0x02 => self.op_srl(rt, rd, instr.shamt()),
            0x03 => self.op_sra(rt, rd, instr.shamt()),
            0x04 => self.op_sllv(rs, rt, rd),
            0x06 => self.op_srlv(rs, rt, rd),
            0x07 => self.op_srav(rs, rt, rd),
            0x08 => self.op_jr(rs),
            0x09 => self.op_jalr(rs, rd),
            0x0C => self.op_syscall(),
            0x0D => self.op_break(),
            // SYNC
            0x0F => Ok(()),
            0x10 => self.op_mfhi(rd),
            0x11 => self.op_mthi(rs),
            0x12 => self.op_mflo(rd),
            0x13 => self.op_mtlo(rs),
            0x18 => self.op_mult(rs, rt),
            0x19 => self.op_multu(rs, rt),
            0x1A => self.op_div(rs, rt),
            0x1B => self.op_divu(rs, rt),
            0x20 => self.op_add(rs, rt, rd),
            0x21 => self.op_addu(rs, rt, rd),
            0x22 => self.op_sub(rs, rt, rd),
            0x23 => self.op_subu(rs, rt, rd),
            0x24 => self.op_and(rs, rt, rd),
            0x25 => self.op_or(rs, rt, rd),
            0x26 => self.op_xor(rs, rt, rd),
            0x27 => self.op_nor(rs, rt, rd),
            0x2A => self.op_slt(rs, rt, rd),
            0x2B => self.op_sltu(rs, rt, rd),
            _ => self.unsupported(),
        }
    }

    /// Handle REGIMM instructions (opcode 0x01), selected by the rt field
    fn execute_regimm(&mut self, instr: Instruction) -> Result<()> {
        match instr.rt() {
            0x00 => self.op_bltz(instr),
            0x01 => self.op_bgez(instr),
            0x02 => self.op_bltzl(instr),
            0x03 => self.op_bgezl(instr),
            0x10 => self.op_bltzal(instr),
            0x11 => self.op_bgezal(instr),
            _ => self.unsupported(),
        }
    }

    /// Handle COP0 instructions (opcode 0x10)
    fn execute_cop0(&mut self, instr: Instruction) -> Result<()> {
        match instr.rs() {
            0x00 => self.op_mfc0(instr),
            0x04 => self.op_mtc0(instr),
            0x10 => match instr.funct() {
                0x18 => self.op_eret(),
                _ => self.unsupported(),
            },
            _ => self.unsupported(),
        }
    }
}
