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

//! Session lifecycle types shared by every backend.
//!
//! A session moves through [`SessionState`]s as the runtime reports them. The
//! [`EventProcessor`] turns those reports into the two signals a render loop
//! acts on, carried by [`NextFrame::Ended`].

mod depth;
mod events;

pub use self::depth::{DepthRange, DepthRangeTracker, DEFAULT_DEPTH_FAR_Z, DEFAULT_DEPTH_NEAR_Z};
pub use self::events::{EventProcessor, SessionControl, SessionEvent, SessionSignals};

use std::fmt;

/// The kind of session an application asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionType {
    /// Fully immersive rendering on a head-mounted display.
    ImmersiveVr,
    /// Rendering composited over the camera feed.
    ImmersiveAr,
    /// Non-immersive rendering inside a page or window.
    Inline,
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// The native session exists but no state has been reported yet.
    #[default]
    Uninitialized,
    /// The runtime knows the session but is not ready for it.
    Idle,
    /// The runtime is ready; the session has been begun.
    Ready,
    /// Frames are synchronized with the display.
    Synchronized,
    /// Submitted frames are visible.
    Visible,
    /// The application has input focus.
    Focused,
    /// The application is paused; frames are produced but not rendered.
    Paused,
    /// The runtime asked the application to stop; the session has been ended.
    Stopping,
    /// The runtime is about to lose the session; it may be recreated.
    LossPending,
    /// The application should exit the session for good.
    Exiting,
    /// The session was ended at the application's request.
    Ended,
}

impl SessionState {
    /// Whether frames submitted in this state can reach the display.
    pub fn is_running(self) -> bool {
        matches!(
            self,
            SessionState::Ready
                | SessionState::Synchronized
                | SessionState::Visible
                | SessionState::Focused
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome of asking a session for its next frame.
#[derive(Debug)]
pub enum NextFrame<F> {
    /// A frame for this render tick.
    Frame(F),
    /// The session has ended. No frame is produced, now or on any later call.
    Ended {
        /// Whether a fresh session should be created to replace this one.
        restart: bool,
    },
}

impl<F> NextFrame<F> {
    /// Returns the frame, or `None` when the session has ended.
    pub fn into_frame(self) -> Option<F> {
        match self {
            NextFrame::Frame(frame) => Some(frame),
            NextFrame::Ended { .. } => None,
        }
    }

    /// Whether the session has ended.
    pub fn is_ended(&self) -> bool {
        matches!(self, NextFrame::Ended { .. })
    }

    /// Whether the caller should restart the session.
    pub fn should_restart(&self) -> bool {
        matches!(self, NextFrame::Ended { restart: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_states() {
        assert!(SessionState::Ready.is_running());
        assert!(SessionState::Focused.is_running());
        assert!(!SessionState::Idle.is_running());
        assert!(!SessionState::Paused.is_running());
        assert!(!SessionState::Stopping.is_running());
    }

    #[test]
    fn next_frame_accessors() {
        let frame: NextFrame<u32> = NextFrame::Frame(7);
        assert!(!frame.is_ended());
        assert_eq!(frame.into_frame(), Some(7));

        let ended: NextFrame<u32> = NextFrame::Ended { restart: true };
        assert!(ended.is_ended());
        assert!(ended.should_restart());
        assert_eq!(ended.into_frame(), None);
    }
}
