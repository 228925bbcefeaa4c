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

//! The contract every XR backend implements.
//!
//! A backend provides three cooperating types:
//!
//! - an [`XrSystem`], the process-wide runtime handle, initialized lazily and
//!   able to create sessions;
//! - an [`XrSession`], one continuous tracked run, which hands out frames;
//! - an [`XrFrame`], one render tick, which borrows its session and presents
//!   on drop.
//!
//! Backends are selected statically; nothing here requires dynamic dispatch.

use std::iter::FusedIterator;

use crate::capability::CapabilityGate;
use crate::error::XrResult;
use crate::math::Extent2D;
use crate::session::{NextFrame, SessionState};
use crate::space::{Pose, Ray};
use crate::view::{InputSource, View};

/// Optional runtime features discovered once at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemCapabilities {
    /// Depth buffers can be submitted alongside color for composition.
    pub depth_composition: bool,
    /// An unbounded reference space is available.
    pub unbounded_space: bool,
    /// Persistent spatial anchors are available.
    pub spatial_anchors: bool,
}

/// The process-wide handle to an XR runtime.
pub trait XrSystem {
    /// The graphics handle sessions are bound to.
    type GraphicsContext;
    /// The session type this system creates.
    type Session: XrSession;
    /// The install/permission gate for this runtime.
    type Gate: CapabilityGate;

    /// `true` once both initialization phases have succeeded.
    fn is_initialized(&self) -> bool;

    /// Initializes the runtime if it is not already.
    ///
    /// Instance creation runs once and its failure is an error. Device
    /// acquisition is retried on every call until it succeeds; while no
    /// compatible device is available this returns `Ok(false)`.
    fn try_initialize(&mut self) -> XrResult<bool>;

    /// Forgets the acquired device so the next [`XrSystem::try_initialize`]
    /// queries the runtime for it again. The instance is kept.
    ///
    /// Called after a session reported a pending loss, before recreating it.
    fn invalidate_system(&mut self);

    /// Features discovered at initialization. All `false` before that.
    fn capabilities(&self) -> SystemCapabilities;

    /// The gate to pass before creating sessions.
    fn capability_gate(&self) -> &Self::Gate;

    /// Creates a session bound to `graphics`. Requires an initialized system.
    fn create_session(&self, graphics: Self::GraphicsContext) -> XrResult<Self::Session>;
}

/// One continuous tracked run of the runtime.
pub trait XrSession {
    /// The frame type, borrowing the session for its lifetime.
    type Frame<'a>: XrFrame
    where
        Self: 'a;

    /// Processes pending runtime events and, unless the session has ended,
    /// waits for and begins the next frame.
    ///
    /// Once this returns [`NextFrame::Ended`] it keeps doing so.
    fn next_frame(&mut self) -> XrResult<NextFrame<Self::Frame<'_>>>;

    /// Asks for the session to end. Idempotent; observed at the next frame.
    fn request_end_session(&mut self) -> XrResult<()>;

    /// Number of views each frame carries.
    fn view_count(&self) -> usize;

    /// Pixel size of the render targets of view `index`.
    fn view_size(&self, index: usize) -> XrResult<Extent2D>;

    /// Sets the clip distances used by subsequently produced frames.
    fn set_depth_range(&mut self, near: f32, far: f32);

    /// The current lifecycle state.
    fn state(&self) -> SessionState;
}

/// One render tick's views and targets.
///
/// Dropping a frame releases everything it acquired and presents to the
/// runtime; errors during that are logged. Call [`XrFrame::end`] to observe
/// them instead.
pub trait XrFrame {
    /// The views to render, in runtime order. Empty when not rendering.
    fn views(&self) -> &[View];

    /// Tracked controllers for this frame.
    fn input_sources(&self) -> &[InputSource];

    /// Whether the runtime will display what is rendered this frame.
    fn should_render(&self) -> bool;

    /// Casts `ray`, given in the primary view's space, against the environment.
    fn hit_test(&self, ray: &Ray) -> XrResult<HitTestResults>;

    /// Releases and presents the frame, reporting any failure.
    fn end(self) -> XrResult<()>
    where
        Self: Sized;
}

/// Hit-test poses in runtime order.
#[derive(Debug, Clone)]
pub struct HitTestResults {
    poses: std::vec::IntoIter<Pose>,
}

impl HitTestResults {
    /// No hits.
    pub fn empty() -> Self {
        Self::from(Vec::new())
    }
}

impl From<Vec<Pose>> for HitTestResults {
    fn from(poses: Vec<Pose>) -> Self {
        Self {
            poses: poses.into_iter(),
        }
    }
}

impl Iterator for HitTestResults {
    type Item = Pose;

    fn next(&mut self) -> Option<Pose> {
        self.poses.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.poses.size_hint()
    }
}

impl ExactSizeIterator for HitTestResults {}
impl FusedIterator for HitTestResults {}
