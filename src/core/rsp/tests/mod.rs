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

//! RSP test modules
//!
//! - `handshake`: READY/DONE protocol and unknown task types
//! - `graphics`: display list processing
//! - `audio`: voice mixing

#[cfg(test)]
mod handshake;



use super::*;

pub(super) const DATA: u32 = 0x1_0000;
pub(super) const OUTPUT: u32 = 0x2_0000;
pub(super) const OUTPUT_CAP: u32 = 0x1000;

pub(super) fn create_test_bus() -> Bus {
    Bus::new(1024 * 1024)
}

pub(super) fn write_words(bus: &mut Bus, addr: u32, words: &[u32]) {
    for (i, &word) in words.iter().enumerate() {
        bus.write32(addr + i as u32 * 4, word).unwrap();
    }
}

pub(super) fn read_words(bus: &Bus, addr: u32, count: usize) -> Vec<u32> {
    (0..count)
        .map(|i| bus.read32(addr + i as u32 * 4).unwrap())
        .collect()
}

/// Post a task whose input is `data` placed at `DATA`
pub(super) fn post_task(bus: &mut Bus, task_type: TaskType, data: &[u32]) {
    write_words(bus, DATA, data);
    TaskDescriptor {
        task_type: task_type as u32,
        data_ptr: DATA,
        data_len: data.len() as u32 * 4,
        output_ptr: OUTPUT,
        output_cap: OUTPUT_CAP,
    }
    .post(bus)
    .unwrap();
}

pub(super) fn completed(outcome: RspOutcome) -> TaskReport {
    match outcome {
        RspOutcome::Completed(report) => report,
        RspOutcome::Idle => panic!("expected a completed task"),
    }
}
