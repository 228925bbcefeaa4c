// Copyright 2025 eraflo
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

//! Turns runtime session events into render-loop signals.

use std::collections::VecDeque;

use super::SessionState;
use crate::error::XrResult;

/// An event reported by the runtime's event queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The runtime instance is about to be lost.
    InstanceLossPending,
    /// The session moved to a new state.
    StateChanged(SessionState),
    /// Any other event kind, identified by its raw type code. Ignored.
    Other(u32),
}

/// The two booleans a render loop must act on after draining events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSignals {
    /// The session is over; stop requesting frames from it.
    pub end_session: bool,
    /// A new session should be created in its place.
    pub restart_session: bool,
}

impl SessionSignals {
    const EXIT: Self = Self {
        end_session: true,
        restart_session: false,
    };
    const RESTART: Self = Self {
        end_session: true,
        restart_session: true,
    };
}

/// Native begin/end hooks invoked by the [`EventProcessor`].
pub trait SessionControl {
    /// Begins the native session. Called when the runtime reports `Ready`.
    fn begin_session(&mut self) -> XrResult<()>;
    /// Ends the native session. Called when the runtime reports `Stopping`.
    fn end_session(&mut self) -> XrResult<()>;
}

/// Drains runtime events once per frame and tracks the session state.
///
/// Once the processor has reported `end_session`, it keeps reporting the same
/// signals on every later call without polling the runtime again.
#[derive(Debug, Default)]
pub struct EventProcessor {
    state: SessionState,
    latched: Option<SessionSignals>,
}

impl EventProcessor {
    /// Creates a processor for a session that has not reported any state yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The last state reported by the runtime or set by the backend.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Overrides the state for backends without a runtime event queue.
    pub fn set_state(&mut self, state: SessionState) {
        if self.state != state {
            log::info!("Session state: {} -> {}", self.state, state);
            self.state = state;
        }
    }

    /// Whether the end signal has been latched.
    pub fn is_ended(&self) -> bool {
        self.latched.is_some()
    }

    /// Latches the end signal without consulting the runtime.
    pub fn end(&mut self, restart: bool) {
        if self.latched.is_none() {
            self.latched = Some(if restart {
                SessionSignals::RESTART
            } else {
                SessionSignals::EXIT
            });
            self.set_state(SessionState::Ended);
        }
    }

    /// Polls every pending event and applies it.
    ///
    /// `poll` returns `Ok(None)` once the queue is empty. `Ready` begins the
    /// session through `control` and `Stopping` ends it. `Exiting` and
    /// `LossPending` request the end of the render loop; instance loss does too
    /// and returns immediately, leaving any remaining events in the queue.
    pub fn process<P, C>(&mut self, mut poll: P, control: &mut C) -> XrResult<SessionSignals>
    where
        P: FnMut() -> XrResult<Option<SessionEvent>>,
        C: SessionControl + ?Sized,
    {
        if let Some(signals) = self.latched {
            return Ok(signals);
        }

        let mut signals = SessionSignals::default();
        while let Some(event) = poll()? {
            match event {
                SessionEvent::InstanceLossPending => {
                    log::warn!("XR instance loss pending; ending the session.");
                    self.latched = Some(SessionSignals::EXIT);
                    return Ok(SessionSignals::EXIT);
                }
                SessionEvent::StateChanged(state) => {
                    self.set_state(state);
                    match state {
                        SessionState::Ready => control.begin_session()?,
                        SessionState::Stopping => control.end_session()?,
                        SessionState::Exiting => signals = SessionSignals::EXIT,
                        SessionState::LossPending => signals = SessionSignals::RESTART,
                        _ => {}
                    }
                }
                SessionEvent::Other(kind) => {
                    log::trace!("Ignoring runtime event of type {kind}.");
                }
            }
        }

        if signals.end_session {
            self.latched = Some(signals);
        }
        Ok(signals)
    }

    /// Convenience wrapper around [`EventProcessor::process`] for a queue that
    /// has already been collected.
    pub fn process_queue<C>(
        &mut self,
        queue: &mut VecDeque<SessionEvent>,
        control: &mut C,
    ) -> XrResult<SessionSignals>
    where
        C: SessionControl + ?Sized,
    {
        self.process(|| Ok(queue.pop_front()), control)
    }
}
