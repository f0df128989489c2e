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

//! Test cartridge images and small test programs
//!
//! Programs are placed at ROM offset 0x1000, where the default entry point
//! (0xB0001000) fetches from.

/// ROM offset of the program
pub const PROGRAM_OFFSET: usize = 0x1000;

/// ROM offset of the display list used by `program_frame_loop`
pub const DISPLAY_LIST_OFFSET: usize = 0x2000;

/// RAM word the frame loop publishes its acknowledged-task count to
pub const FRAME_COUNTER: u32 = 0x100;

/// RAM word the counter loop stores to
pub const COUNTER: u32 = 0x100;

/// Build a cartridge image with `program` at the entry point
#[allow(dead_code)]
pub fn build_cartridge(program: &[u32]) -> Vec<u8> {
    build_cartridge_with_data(program, &[])
}

/// Build a cartridge image with `program` and a display list
#[allow(dead_code)]
pub fn build_cartridge_with_data(program: &[u32], display_list: &[u32]) -> Vec<u8> {
    let mut image = vec![0u8; 0x4000];
    image[0x00..0x04].copy_from_slice(&0x8037_1240u32.to_be_bytes());
    image[0x08..0x0C].copy_from_slice(&0x8000_0400u32.to_be_bytes());
    image[0x20..0x2A].copy_from_slice(b"N64RX TEST");
    image[0x3B..0x3F].copy_from_slice(b"NTST");

    write_words(&mut image, PROGRAM_OFFSET, program);
    write_words(&mut image, DISPLAY_LIST_OFFSET, display_list);
    image
}

fn write_words(image: &mut [u8], offset: usize, words: &[u32]) {
    for (i, word) in words.iter().enumerate() {
        let at = offset + i * 4;
        image[at..at + 4].copy_from_slice(&word.to_be_bytes());
    }
}

/// Test program: counter loop
#[allow(dead_code)]
pub fn program_counter_loop() -> Vec<u32> {
    vec![
        0x24210001, // ADDIU $1, $1, 1      ; $1 += 1
        0xAC010100, // SW    $1, 0x100($0)  ; publish
        0x08000400, // J     0xB0001000
        0x00000000, // NOP (delay slot)
    ]
}

/// Test program: post a graphics task, wait for DONE, acknowledge, repeat
///
/// Every acknowledged task bumps `$16`, which is published at `FRAME_COUNTER`.
#[allow(dead_code)]
pub fn program_frame_loop(display_list_len: u32) -> Vec<u32> {
    vec![
        0x3C088000,                      // LUI   $8, 0x8000
        0x35080FC0,                      // ORI   $8, $8, 0x0FC0   ; task mailbox
        0x24090001,                      // ADDIU $9, $0, 1        ; graphics / READY
        0x3C0A1000,                      // LUI   $10, 0x1000
        0x354A2000,                      // ORI   $10, $10, 0x2000 ; display list in ROM
        0x240B0000 | display_list_len,   // ADDIU $11, $0, len
        0x3C0C0002,                      // LUI   $12, 0x0002      ; output buffer
        0x240D1000,                      // ADDIU $13, $0, 0x1000  ; output capacity
        // post:
        0xAD090004,                      // SW    $9, 4($8)        ; type
        0xAD0A0008,                      // SW    $10, 8($8)       ; data pointer
        0xAD0B000C,                      // SW    $11, 12($8)      ; data length
        0xAD0C0010,                      // SW    $12, 16($8)      ; output pointer
        0xAD0D0014,                      // SW    $13, 20($8)      ; output capacity
        0xAD090000,                      // SW    $9, 0($8)        ; READY
        // wait:
        0x8D0E0000,                      // LW    $14, 0($8)
        0x31CF0002,                      // ANDI  $15, $14, 2      ; DONE
        0x11E0FFFD,                      // BEQ   $15, $0, wait
        0x00000000,                      // NOP (delay slot)
        0xAD000000,                      // SW    $0, 0($8)        ; acknowledge
        0x26100001,                      // ADDIU $16, $16, 1
        0xAC100100,                      // SW    $16, 0x100($0)
        0x0800_0408,                     // J     post
        0x00000000,                      // NOP (delay slot)
    ]
}

/// Display list: clear a 32x16 rectangle to `color`, then end the frame
#[allow(dead_code)]
pub fn display_list_fill(color: u32) -> Vec<u32> {
    vec![
        0xF7000000, // set fill color
        color,
        0xF6000000 | ((32 * 4) << 12) | (16 * 4), // fill rect, lower right (32, 16)
        0x00000000,                               // upper left (0, 0)
        0xE9000000, // sync full
        0x00000000,
        0xDF000000, // end display list
        0x00000000,
    ]
}
