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

//! MIPS instruction disassembler for debugging
//!
//! Produces assembler-style text with ABI register names. Only the
//! instructions the interpreter executes are named; everything else is
//! rendered as `??? 0xXXXXXXXX`.

use super::decode::Instruction;

/// ABI names for r0-r31
const REG_NAMES: [&str; 32] = [
    "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
    "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
    "fp", "ra",
];

/// Instruction disassembler
///
/// # Example
/// ```
/// use n64rx::core::cpu::Disassembler;
///
/// assert_eq!(Disassembler::disassemble(0x00000000, 0xB0001000), "nop");
/// assert_eq!(Disassembler::disassemble(0x3C011234, 0xB0001000), "lui at, 0x1234");
/// ```
pub struct Disassembler;

impl Disassembler {
    /// Disassemble a single instruction
    ///
    /// `pc` is the address of the instruction; it is used to resolve jump and
    /// branch targets.
    pub fn disassemble(instruction: u32, pc: u32) -> String {
        let instr = Instruction(instruction);
        let rs = REG_NAMES[instr.rs() as usize];
        let rt = REG_NAMES[instr.rt() as usize];
        let imm = instr.imm_se() as i32;
        let branch_target = pc.wrapping_add(4).wrapping_add(instr.branch_offset());

        match instr.opcode() {
            0x00 => Self::disasm_special(instr),
            0x01 => Self::disasm_regimm(instr, branch_target),
            0x02 | 0x03 => {
                let target = (pc.wrapping_add(4) & 0xF000_0000) | (instr.target() << 2);
                let name = if instr.opcode() == 0x02 { "j" } else { "jal" };
                format!("{} 0x{:08X}", name, target)
            }
            op @ (0x04 | 0x05 | 0x14 | 0x15) => {
                let name = match op {
                    0x04 => "beq",
                    0x05 => "bne",
                    0x14 => "beql",
                    _ => "bnel",
                };
                format!("{} {}, {}, 0x{:08X}", name, rs, rt, branch_target)
            }
            op @ (0x06 | 0x07 | 0x16 | 0x17) => {
                let name = match op {
                    0x06 => "blez",
                    0x07 => "bgtz",
                    0x16 => "blezl",
                    _ => "bgtzl",
                };
                format!("{} {}, 0x{:08X}", name, rs, branch_target)
            }
            0x08 => format!("addi {}, {}, {}", rt, rs, imm),
            0x09 => format!("addiu {}, {}, {}", rt, rs, imm),
            0x0A => format!("slti {}, {}, {}", rt, rs, imm),
            0x0B => format!("sltiu {}, {}, {}", rt, rs, imm),
            0x0C => format!("andi {}, {}, 0x{:04X}", rt, rs, instr.imm()),
            0x0D => format!("ori {}, {}, 0x{:04X}", rt, rs, instr.imm()),
            0x0E => format!("xori {}, {}, 0x{:04X}", rt, rs, instr.imm()),
            0x0F => format!("lui {}, 0x{:04X}", rt, instr.imm()),
            0x10 => Self::disasm_cop0(instr),
            op @ (0x20 | 0x21 | 0x23 | 0x24 | 0x25 | 0x28 | 0x29 | 0x2B) => {
                let name = match op {
                    0x20 => "lb",
                    0x21 => "lh",
                    0x23 => "lw",
                    0x24 => "lbu",
                    0x25 => "lhu",
                    0x28 => "sb",
                    0x29 => "sh",
                    _ => "sw",
                };
                format!("{} {}, {}({})", name, rt, imm, rs)
            }
            0x2F => format!("cache 0x{:02X}, {}({})", instr.rt(), imm, rs),
            _ => format!("??? 0x{:08X}", instruction),
        }
    }

    fn disasm_special(instr: Instruction) -> String {
        let rs = REG_NAMES[instr.rs() as usize];
        let rt = REG_NAMES[instr.rt() as usize];
        let rd = REG_NAMES[instr.rd() as usize];
        let shamt = instr.shamt();

        let three_reg = |name: &str| format!("{} {}, {}, {}", name, rd, rs, rt);

        match instr.funct() {
            0x00 if instr.0 == 0 => "nop".to_string(),
            0x00 => format!("sll {}, {}, {}", rd, rt, shamt),
            0x02 => format!("srl {}, {}, {}", rd, rt, shamt),
            0x03 => format!("sra {}, {}, {}", rd, rt, shamt),
            0x04 => format!("sllv {}, {}, {}", rd, rt, rs),
            0x06 => format!("srlv {}, {}, {}", rd, rt, rs),
            0x07 => format!("srav {}, {}, {}", rd, rt, rs),
            0x08 => format!("jr {}", rs),
            0x09 if instr.rd() == 31 => format!("jalr {}", rs),
            0x09 => format!("jalr {}, {}", rd, rs),
            0x0C => "syscall".to_string(),
            0x0D => "break".to_string(),
            0x0F => "sync".to_string(),
            0x10 => format!("mfhi {}", rd),
            0x11 => format!("mthi {}", rs),
            0x12 => format!("mflo {}", rd),
            0x13 => format!("mtlo {}", rs),
            0x18 => format!("mult {}, {}", rs, rt),
            0x19 => format!("multu {}, {}", rs, rt),
            0x1A => format!("div {}, {}", rs, rt),
            0x1B => format!("divu {}, {}", rs, rt),
            0x20 => three_reg("add"),
            0x21 => three_reg("addu"),
            0x22 => three_reg("sub"),
            0x23 => three_reg("subu"),
            0x24 => three_reg("and"),
            0x25 => three_reg("or"),
            0x26 => three_reg("xor"),
            0x27 => three_reg("nor"),
            0x2A => three_reg("slt"),
            0x2B => three_reg("sltu"),
            _ => format!("??? 0x{:08X}", instr.0),
        }
    }

    fn disasm_regimm(instr: Instruction, target: u32) -> String {
        let name = match instr.rt() {
            0x00 => "bltz",
            0x01 => "bgez",
            0x02 => "bltzl",
            0x03 => "bgezl",
            0x10 => "bltzal",
            0x11 => "bgezal",
            _ => return format!("??? 0x{:08X}", instr.0),
        };
        format!("{} {}, 0x{:08X}", name, REG_NAMES[instr.rs() as usize], target)
    }

    fn disasm_cop0(instr: Instruction) -> String {
        let rt = REG_NAMES[instr.rt() as usize];
        match (instr.rs(), instr.funct()) {
            (0x00, _) => format!("mfc0 {}, cop0r{}", rt, instr.rd()),
            (0x04, _) => format!("mtc0 {}, cop0r{}", rt, instr.rd()),
            (0x10, 0x18) => "eret".to_string(),
            _ => format!("??? 0x{:08X}", instr.0),
        }
    }
}
