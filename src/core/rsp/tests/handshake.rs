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

use super::super::*;
use super::*;
use crate::core::error::EmulatorError;

#[test]
fn test_idle_without_ready() {
    let mut bus = create_test_bus();
    let mut rsp = RSP::new();

    assert_eq!(rsp.step(&mut bus).unwrap(), RspOutcome::Idle);
    assert!(!rsp.task_ready());
    assert_eq!(rsp.tasks_completed(), 0);
    assert_eq!(mailbox::task_status(&bus).unwrap(), TaskStatus::empty());
}

#[test]
fn test_done_without_ready_is_idle() {
    let mut bus = create_test_bus();
    mailbox::set_task_status(&mut bus, TaskStatus::DONE).unwrap();

    let mut rsp = RSP::new();
    assert_eq!(rsp.step(&mut bus).unwrap(), RspOutcome::Idle);
    assert_eq!(mailbox::task_status(&bus).unwrap(), TaskStatus::DONE);
}

#[test]
fn test_ready_to_done_handshake() {
    let mut bus = create_test_bus();
    let mut rsp = RSP::new();
    post_task(&mut bus, TaskType::Graphics, &[0xDF00_0000, 0]);

    let report = completed(rsp.step(&mut bus).unwrap());

    assert_eq!(report.task_type, 1);
    assert_eq!(report.result_len, 0);
    assert_eq!(report.rdp_commands, None);
    assert_eq!(mailbox::task_status(&bus).unwrap(), TaskStatus::DONE);
    assert_eq!(bus.read32(mailbox::TASK_RESULT_LEN).unwrap(), 0);
    assert_eq!(rsp.tasks_completed(), 1);

    // Nothing new until software posts another task
    assert_eq!(rsp.step(&mut bus).unwrap(), RspOutcome::Idle);
}

#[test]
fn test_descriptor_loaded_into_scalar_registers() {
    let mut bus = create_test_bus();
    let mut rsp = RSP::new();
    post_task(&mut bus, TaskType::Audio, &[]);

    rsp.step(&mut bus).unwrap();

    assert_eq!(rsp.scalar_reg(1), 2);
    assert_eq!(rsp.scalar_reg(2), DATA);
    assert_eq!(rsp.scalar_reg(3), 0);
    assert_eq!(rsp.scalar_reg(4), OUTPUT);
    assert_eq!(rsp.scalar_reg(5), OUTPUT_CAP);
}

#[test]
fn test_unknown_task_type_completes_empty() {
    let mut bus = create_test_bus();
    let mut rsp = RSP::new();
    TaskDescriptor {
        task_type: 7,
        data_ptr: DATA,
        data_len: 64,
        output_ptr: OUTPUT,
        output_cap: OUTPUT_CAP,
    }
    .post(&mut bus)
    .unwrap();
    bus.write32(OUTPUT, 0xAAAA_AAAA).unwrap();

    let report = completed(rsp.step(&mut bus).unwrap());

    assert_eq!(report.task_type, 7);
    assert_eq!(report.result_len, 0);
    assert_eq!(mailbox::task_status(&bus).unwrap(), TaskStatus::DONE);
    assert_eq!(bus.read32(OUTPUT).unwrap(), 0xAAAA_AAAA);
}

#[test]
fn test_bad_input_pointer_fails_without_completing() {
    let mut bus = create_test_bus();
    let mut rsp = RSP::new();
    post_task(&mut bus, TaskType::Graphics, &[0x0300_0000, 0x0002_0003]);
    rsp.step(&mut bus).unwrap();
    let state = rsp.to_state();

    // fill color ; set offset ; call a list in unmapped space
    post_task(
        &mut bus,
        TaskType::Graphics,
        &[
            0xF700_0000,
            0xFF00_00FF,
            0x0300_0000,
            0x0005_0007,
            0xDE00_0000,
            0x0F00_0000,
        ],
    );

    assert!(matches!(
        rsp.step(&mut bus),
        Err(EmulatorError::AddressError { .. })
    ));
    assert_eq!(mailbox::task_status(&bus).unwrap(), TaskStatus::READY);
    assert_eq!(read_words(&bus, OUTPUT, 2), vec![0, 0]);
    assert_eq!(rsp.offset(), (2, 3));
    assert_eq!(rsp.to_state(), state);
}

#[test]
fn test_unmapped_descriptor_data_fails_without_completing() {
    let mut bus = create_test_bus();
    let mut rsp = RSP::new();
    TaskDescriptor {
        task_type: TaskType::Graphics as u32,
        data_ptr: 0x0400_0000,
        data_len: 8,
        output_ptr: OUTPUT,
        output_cap: OUTPUT_CAP,
    }
    .post(&mut bus)
    .unwrap();

    assert!(rsp.step(&mut bus).is_err());
    assert_eq!(mailbox::task_status(&bus).unwrap(), TaskStatus::READY);
    assert_eq!(rsp.scalar_reg(2), 0);
    assert_eq!(rsp.tasks_completed(), 0);
}

#[test]
fn test_unwritable_output_fails_without_completing() {
    let mut bus = create_test_bus();
    let mut rsp = RSP::new();
    write_words(&mut bus, DATA, &[0xF700_0000, 0x1234_5678]);
    TaskDescriptor {
        task_type: TaskType::Graphics as u32,
        data_ptr: DATA,
        data_len: 8,
        output_ptr: 0x0800_0000,
        output_cap: OUTPUT_CAP,
    }
    .post(&mut bus)
    .unwrap();

    assert!(matches!(
        rsp.step(&mut bus),
        Err(EmulatorError::AddressError { address: 0x0800_0000 })
    ));
    assert_eq!(mailbox::task_status(&bus).unwrap(), TaskStatus::READY);
    assert_eq!(rsp.tasks_completed(), 0);
}

#[test]
fn test_reset() {
    let mut bus = create_test_bus();
    let mut rsp = RSP::new();
    post_task(&mut bus, TaskType::Graphics, &[0x0300_0000, 0x0005_0006]);
    rsp.step(&mut bus).unwrap();
    assert_eq!(rsp.offset(), (5, 6));

    rsp.reset();

    assert_eq!(rsp.offset(), (0, 0));
    assert_eq!(rsp.tasks_completed(), 0);
    assert_eq!(rsp.scalar_reg(1), 0);
}

#[test]
fn test_state_round_trip() {
    let mut bus = create_test_bus();
    let mut rsp = RSP::new();
    write_words(&mut bus, 0x3000, &[0x0001_0002, 0x1122_3344]);
    post_task(
        &mut bus,
        TaskType::Graphics,
        &[0x0100_1000 | (4 << 1), 0x3000, 0x0300_0000, 0xFFFF_0010],
    );
    rsp.step(&mut bus).unwrap();

    let state = rsp.to_state();
    assert_eq!(state.vertices.len(), VERTEX_BUFFER_SIZE);

    let mut restored = RSP::new();
    restored.restore_from_state(&state);

    assert_eq!(restored.offset(), (-1, 16));
    assert_eq!(restored.tasks_completed(), 1);
    assert_eq!(
        restored.vertex(4),
        Some(Vertex {
            x: 1,
            y: 2,
            color: 0x1122_3344
        })
    );
    assert_eq!(restored.to_state(), state);
}
