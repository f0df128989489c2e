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

//! CPU execution tracer for debugging
//!
//! Writes one line per executed instruction:
//!
//! ```text
//! PC=0xB0001000 [0x3C088000] lui t0, 0x8000                | r1=00000000 r2=00000000 r3=00000000
//! ```

use super::{Disassembler, CPU};
use crate::core::error::Result;
use crate::core::memory::Bus;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// CPU execution tracer
///
/// # Example
/// ```no_run
/// use n64rx::core::cpu::{CPU, CpuTracer};
/// use n64rx::core::memory::Bus;
///
/// let mut cpu = CPU::new();
/// let mut bus = Bus::new(8 * 1024 * 1024);
/// let mut tracer = CpuTracer::new("trace.log").unwrap();
///
/// tracer.trace(&cpu, &bus).unwrap();
/// cpu.step(&mut bus).unwrap();
/// ```
pub struct CpuTracer {
    enabled: bool,
    output: BufWriter<Box<dyn Write + Send>>,
    /// Lines written so far
    lines: u64,
    /// Stop writing after this many lines
    limit: Option<u64>,
}

impl CpuTracer {
    /// Create a tracer writing to a file (truncated if it exists)
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(Box::new(file)))
    }

    /// Create a tracer writing to any sink
    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            enabled: true,
            output: BufWriter::new(writer),
            lines: 0,
            limit: None,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cap the number of lines written; `None` removes the cap
    pub fn set_limit(&mut self, limit: Option<u64>) {
        self.limit = limit;
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    /// Render the trace line for the instruction at the CPU's current PC
    pub fn format_line(cpu: &CPU, bus: &Bus, regs: &[u8]) -> Result<String> {
        let pc = cpu.pc();
        let instruction = bus.read32(pc)?;
        let disasm = Disassembler::disassemble(instruction, pc);

        let mut line = format!("PC=0x{:08X} [0x{:08X}] {:30} |", pc, instruction, disasm);
        for &reg in regs.iter().take(8) {
            line.push_str(&format!(" r{}={:08X}", reg, cpu.reg(reg)));
        }
        Ok(line)
    }

    /// Trace current CPU state with r1-r3
    pub fn trace(&mut self, cpu: &CPU, bus: &Bus) -> Result<()> {
        self.trace_with_regs(cpu, bus, &[1, 2, 3])
    }

    /// Trace current CPU state with a custom register selection (up to 8)
    pub fn trace_with_regs(&mut self, cpu: &CPU, bus: &Bus, regs: &[u8]) -> Result<()> {
        if !self.enabled || self.limit.is_some_and(|limit| self.lines >= limit) {
            return Ok(());
        }

        let line = Self::format_line(cpu, bus, regs)?;
        writeln!(self.output, "{}", line)?;
        self.lines += 1;
        Ok(())
    }

    /// Flush buffered trace data
    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }
}
