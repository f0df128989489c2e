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

use super::super::CPU;
use crate::core::error::Result;

impl CPU {
    // === Multiply/Divide Instructions ===

    /// MULT: Multiply (signed)
    ///
    /// Format: mult rs, rt
    /// Operation: (HI, LO) = rs * rt (signed 64-bit result)
    pub(crate) fn op_mult(&mut self, rs: u8, rt: u8) -> Result<()> {
        let result = (self.reg(rs) as i32 as i64) * (self.reg(rt) as i32 as i64);
        self.lo = result as u32;
        self.hi = (result >> 32) as u32;
        Ok(())
    }

    /// MULTU: Multiply Unsigned
    pub(crate) fn op_multu(&mut self, rs: u8, rt: u8) -> Result<()> {
        let result = (self.reg(rs) as u64) * (self.reg(rt) as u64);
        self.lo = result as u32;
        self.hi = (result >> 32) as u32;
        Ok(())
    }

    /// DIV: Divide (signed)
    ///
    /// LO = quotient, HI = remainder. Division never traps:
    ///
    /// * Division by zero: LO = -1 (or 1 for a negative dividend), HI = dividend
    /// * i32::MIN / -1: LO = i32::MIN, HI = 0
    pub(crate) fn op_div(&mut self, rs: u8, rt: u8) -> Result<()> {
        let numerator = self.reg(rs) as i32;
        let denominator = self.reg(rt) as i32;

        if denominator == 0 {
            self.lo = if numerator >= 0 { 0xFFFF_FFFF } else { 1 };
            self.hi = numerator as u32;
        } else {
            self.lo = numerator.wrapping_div(denominator) as u32;
            self.hi = numerator.wrapping_rem(denominator) as u32;
        }
        Ok(())
    }

    /// DIVU: Divide Unsigned
    pub(crate) fn op_divu(&mut self, rs: u8, rt: u8) -> Result<()> {
        let numerator = self.reg(rs);
        let denominator = self.reg(rt);

        match (numerator.checked_div(denominator), numerator.checked_rem(denominator)) {
            (Some(quotient), Some(remainder)) => {
                self.lo = quotient;
                self.hi = remainder;
            }
            _ => {
                self.lo = 0xFFFF_FFFF;
                self.hi = numerator;
            }
        }
        Ok(())
    }

    pub(crate) fn op_mfhi(&mut self, rd: u8) -> Result<()> {
        self.set_reg(rd, self.hi);
        Ok(())
    }

    pub(crate) fn op_mflo(&mut self, rd: u8) -> Result<()> {
        self.set_reg(rd, self.lo);
        Ok(())
    }

    pub(crate) fn op_mthi(&mut self, rs: u8) -> Result<()> {
        self.hi = self.reg(rs);
        Ok(())
    }

    pub(crate) fn op_mtlo(&mut self, rs: u8) -> Result<()> {
        self.lo = self.reg(rs);
        Ok(())
    }
}
