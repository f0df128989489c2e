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

//! Host-facing boundaries of the machine
//!
//! The core never talks to real devices. At every macro-step boundary it polls
//! an [`InputProvider`] for each controller port, hands finished audio frames
//! to an [`AudioSink`] and presents completed frames through a [`VideoSink`].
//! The `Null*` implementations are used when no host is attached.

use bincode::{Decode, Encode};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Number of controller ports
pub const MAX_PORTS: usize = 4;

bitflags! {
    /// Controller button bitmask
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Buttons: u16 {
        const A = 1 << 15;
        const B = 1 << 14;
        const Z = 1 << 13;
        const START = 1 << 12;
        const D_UP = 1 << 11;
        const D_DOWN = 1 << 10;
        const D_LEFT = 1 << 9;
        const D_RIGHT = 1 << 8;
        const L = 1 << 5;
        const R = 1 << 4;
        const C_UP = 1 << 3;
        const C_DOWN = 1 << 2;
        const C_LEFT = 1 << 1;
        const C_RIGHT = 1 << 0;
    }
}

/// State of one controller port
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Encode, Decode,
)]
pub struct ControllerInput {
    /// Pressed buttons (see [`Buttons`])
    pub buttons: u16,
    /// Analog stick X, -128 (left) to 127 (right)
    pub stick_x: i8,
    /// Analog stick Y, -128 (down) to 127 (up)
    pub stick_y: i8,
    /// Whether a controller is plugged into the port
    pub connected: bool,
}

impl ControllerInput {
    /// A connected controller with the given buttons held and the stick centered
    ///
    /// # Example
    /// ```
    /// use n64rx::core::peripherals::{Buttons, ControllerInput};
    ///
    /// let input = ControllerInput::pressed(Buttons::A | Buttons::START);
    /// assert!(input.connected);
    /// assert!(input.buttons().contains(Buttons::START));
    /// ```
    pub fn pressed(buttons: Buttons) -> Self {
        Self {
            buttons: buttons.bits(),
            stick_x: 0,
            stick_y: 0,
            connected: true,
        }
    }

    pub fn buttons(&self) -> Buttons {
        Buttons::from_bits_truncate(self.buttons)
    }

    /// First word of the controller mailbox entry
    pub fn mailbox_word(&self) -> u32 {
        ((self.buttons as u32) << 16)
            | ((self.stick_x as u8 as u32) << 8)
            | self.stick_y as u8 as u32
    }
}

/// Source of controller state, polled once per macro-step
pub trait InputProvider: Send {
    fn poll(&mut self, port: usize) -> ControllerInput;
}

/// Destination for mixed stereo frames produced by audio tasks
pub trait AudioSink: Send {
    fn queue_samples(&mut self, frames: &[(i16, i16)]);
}

/// Destination for completed frames
///
/// `pixels` is RGBA8, row-major, origin top-left.
pub trait VideoSink: Send {
    fn present(&mut self, pixels: &[u8], width: usize, height: usize);
}

/// No controllers attached
#[derive(Debug, Default)]
pub struct NullInput;

impl InputProvider for NullInput {
    fn poll(&mut self, _port: usize) -> ControllerInput {
        ControllerInput::default()
    }
}

/// Discards audio
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn queue_samples(&mut self, _frames: &[(i16, i16)]) {}
}

/// Discards frames
#[derive(Debug, Default)]
pub struct NullVideo;

impl VideoSink for NullVideo {
    fn present(&mut self, _pixels: &[u8], _width: usize, _height: usize) {}
}

/// Host collaborators attached to a machine
pub struct Peripherals {
    pub input: Box<dyn InputProvider>,
    pub audio: Box<dyn AudioSink>,
    pub video: Box<dyn VideoSink>,
}

impl Default for Peripherals {
    fn default() -> Self {
        Self {
            input: Box::new(NullInput),
            audio: Box::new(NullAudio),
            video: Box::new(NullVideo),
        }
    }
}
