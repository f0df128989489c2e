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

//! Coprocessor 0 (System Control) instructions

use super::super::cop0::COP0;
use super::super::decode::Instruction;
use super::super::INTERRUPT_TIMER;
use super::CPU;
use crate::core::error::Result;

impl CPU {
    /// MFC0: Move From Coprocessor 0
    ///
    /// ```text
    /// MFC0 $t0, $12  # Move Status Register to $t0
    /// ```
    pub(in crate::core::cpu) fn op_mfc0(&mut self, instr: Instruction) -> Result<()> {
        let value = self.cop0.regs[instr.rd() as usize];
        self.set_reg(instr.rt(), value);
        Ok(())
    }

    /// MTC0: Move To Coprocessor 0
    ///
    /// Side effects:
    /// - Compare: acknowledges the timer interrupt (clears IP7)
    /// - Cause: only the software interrupt bits IP0/IP1 are writable
    /// - PRId: read-only
    pub(in crate::core::cpu) fn op_mtc0(&mut self, instr: Instruction) -> Result<()> {
        let value = self.reg(instr.rt());
        let index = instr.rd() as usize;

        match index {
            COP0::COMPARE => {
                self.cop0.regs[COP0::COMPARE] = value;
                self.clear_interrupt(INTERRUPT_TIMER);
            }
            COP0::CAUSE => {
                let cause = self.cop0.regs[COP0::CAUSE];
                self.cop0.regs[COP0::CAUSE] =
                    (cause & !COP0::CAUSE_SW_MASK) | (value & COP0::CAUSE_SW_MASK);
            }
            COP0::PRID => {}
            _ => self.cop0.regs[index] = value,
        }
        Ok(())
    }

    /// ERET: Return From Exception
    ///
    /// With ERL set, returns to ErrorEPC and clears ERL; otherwise returns
    /// to EPC and clears EXL. ERET has no delay slot.
    pub(in crate::core::cpu) fn op_eret(&mut self) -> Result<()> {
        let status = self.cop0.regs[COP0::STATUS];

        let target = if status & COP0::STATUS_ERL != 0 {
            self.cop0.regs[COP0::STATUS] = status & !COP0::STATUS_ERL;
            self.cop0.regs[COP0::ERROREPC]
        } else {
            self.cop0.regs[COP0::STATUS] = status & !COP0::STATUS_EXL;
            self.cop0.regs[COP0::EPC]
        };

        self.set_pc(target);
        Ok(())
    }
}
