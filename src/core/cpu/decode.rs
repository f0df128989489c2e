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

//! Instruction field decoding
//!
//! ```text
//! R-type: | op (6) | rs (5) | rt (5) | rd (5) | shamt (5) | funct (6) |
//! I-type: | op (6) | rs (5) | rt (5) |        immediate (16)          |
//! J-type: | op (6) |                 target (26)                      |
//! ```

/// A raw 32-bit instruction word with field accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction(pub u32);

impl Instruction {
    /// Primary opcode (bits 31:26)
    #[inline(always)]
    pub fn opcode(self) -> u32 {
        self.0 >> 26
    }

    #[inline(always)]
    pub fn rs(self) -> u8 {
        ((self.0 >> 21) & 0x1F) as u8
    }

    #[inline(always)]
    pub fn rt(self) -> u8 {
        ((self.0 >> 16) & 0x1F) as u8
    }

    #[inline(always)]
    pub fn rd(self) -> u8 {
        ((self.0 >> 11) & 0x1F) as u8
    }

    #[inline(always)]
    pub fn shamt(self) -> u32 {
        (self.0 >> 6) & 0x1F
    }

    /// SPECIAL function field (bits 5:0)
    #[inline(always)]
    pub fn funct(self) -> u32 {
        self.0 & 0x3F
    }

    /// Zero-extended 16-bit immediate
    #[inline(always)]
    pub fn imm(self) -> u32 {
        self.0 & 0xFFFF
    }

    /// Sign-extended 16-bit immediate
    #[inline(always)]
    pub fn imm_se(self) -> u32 {
        (self.0 as u16) as i16 as i32 as u32
    }

    /// Branch displacement in bytes (sign-extended immediate << 2)
    #[inline(always)]
    pub fn branch_offset(self) -> u32 {
        self.imm_se() << 2
    }

    /// 26-bit jump target field
    #[inline(always)]
    pub fn target(self) -> u32 {
        self.0 & 0x03FF_FFFF
    }
}
