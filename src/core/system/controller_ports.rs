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

//! Controller ports
//!
//! Holds the last polled state of each port and mirrors it into the
//! controller mailbox in RAM, where game code reads it.

use crate::core::error::Result;
use crate::core::mailbox;
use crate::core::memory::Bus;
use crate::core::peripherals::{ControllerInput, InputProvider, MAX_PORTS};
use crate::core::save_state::{ControllerState, StateSave};

/// The four controller ports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerPorts {
    ports: [ControllerInput; MAX_PORTS],
}

impl ControllerPorts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Disconnect every port
    pub fn reset(&mut self) {
        self.ports = [ControllerInput::default(); MAX_PORTS];
    }

    /// Refresh every port from the input provider
    pub fn poll(&mut self, input: &mut dyn InputProvider) {
        for (port, state) in self.ports.iter_mut().enumerate() {
            *state = input.poll(port);
        }
    }

    /// Write every port into the controller mailbox
    ///
    /// Entry layout: word 0 = buttons/stick, word 1 = connected flag.
    pub fn mirror(&self, bus: &mut Bus) -> Result<()> {
        for (port, state) in self.ports.iter().enumerate() {
            let entry = mailbox::controller_entry(port);
            bus.write32(entry, state.mailbox_word())?;
            bus.write32(entry + 4, state.connected as u32)?;
        }
        Ok(())
    }

    pub fn get(&self, port: usize) -> Option<&ControllerInput> {
        self.ports.get(port)
    }

    /// Override a port's state until the next poll
    pub fn set(&mut self, port: usize, input: ControllerInput) {
        if let Some(slot) = self.ports.get_mut(port) {
            *slot = input;
        }
    }
}

impl StateSave for ControllerPorts {
    type State = ControllerState;

    fn to_state(&self) -> ControllerState {
        ControllerState {
            ports: self.ports.to_vec(),
        }
    }

    fn restore_from_state(&mut self, state: &ControllerState) {
        self.reset();
        for (slot, input) in self.ports.iter_mut().zip(&state.ports) {
            *slot = *input;
        }
    }
}
