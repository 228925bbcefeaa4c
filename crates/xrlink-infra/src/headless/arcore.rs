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

//! A simulated camera-AR runtime.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;

use xrlink_core::math::{Extent2D, Mat4, Vec2};
use xrlink_core::platform::{LifecycleEvent, LifecycleHub};
use xrlink_core::view::TextureHandle;
use xrlink_core::{Pose, Ray, RuntimeStatus};

use crate::arcore::{
    ArRuntime, ArSessionHandle, Availability, InstallStatus, RawHit, TrackingState,
};

/// Vertical field of view of the simulated camera.
const CAMERA_FOV_Y: f32 = 1.0;
/// Camera image period, in nanoseconds.
const CAMERA_PERIOD_NS: i64 = 33_333_333;

/// What the simulated device reports.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessArCoreConfig {
    /// Answers of successive availability checks. The last one repeats.
    pub availability: Vec<Availability>,
    /// Whether the runtime package is installed.
    pub installed: bool,
    /// Whether a user-requested install succeeds.
    pub install_succeeds: bool,
    /// Camera tracking state.
    pub tracking: TrackingState,
    /// Camera pose.
    pub camera_pose: Pose,
    /// Number of updates before the camera produces its first image.
    pub first_image_after: u32,
    /// Hits reported by every hit test, in runtime order.
    pub hits: Vec<RawHit>,
}

impl Default for HeadlessArCoreConfig {
    /// A supported, installed device that tracks from the first update.
    fn default() -> Self {
        Self {
            availability: vec![Availability::SupportedInstalled],
            installed: true,
            install_succeeds: true,
            tracking: TrackingState::Tracking,
            camera_pose: Pose::IDENTITY,
            first_image_after: 1,
            hits: Vec::new(),
        }
    }
}

/// Counters and records of every native call made so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArCoreCallLog {
    /// Availability checks.
    pub availability_checks: u32,
    /// The `user_requested` flag of every install request.
    pub install_requests: Vec<bool>,
    /// Sessions created.
    pub sessions_created: u32,
    /// Sessions destroyed.
    pub sessions_destroyed: u32,
    /// Resume calls.
    pub resumes: u32,
    /// Pause calls.
    pub pauses: u32,
    /// Update calls.
    pub updates: u32,
    /// Every display size set, in order.
    pub display_geometry: Vec<Extent2D>,
    /// Near/far of every projection query, in order.
    pub projection_queries: Vec<(f32, f32)>,
    /// Camera UV remaps computed.
    pub uv_transforms: u32,
    /// Every ray hit-tested, in tracking space.
    pub hit_tests: Vec<Ray>,
}

#[derive(Debug, Default)]
struct State {
    next_handle: u64,
    checks_answered: usize,
    installed: bool,
    tracking: Option<TrackingState>,
    camera_pose: Pose,
    hits: Vec<RawHit>,
    display_size: Extent2D,
    geometry_pending: bool,
    geometry_changed: bool,
    camera_texture: Option<TextureHandle>,
    calls: ArCoreCallLog,
}

/// An in-memory [`ArRuntime`].
///
/// When attached to a lifecycle hub, a user-requested install pauses and then
/// resumes the application from another thread, as the store flow does.
#[derive(Debug)]
pub struct HeadlessArCore {
    config: HeadlessArCoreConfig,
    install_flow: Option<LifecycleHub>,
    state: Mutex<State>,
}

impl HeadlessArCore {
    /// Creates a runtime behaving as `config` describes.
    pub fn new(config: HeadlessArCoreConfig) -> Self {
        let state = State {
            installed: config.installed,
            tracking: Some(config.tracking),
            camera_pose: config.camera_pose,
            hits: config.hits.clone(),
            ..State::default()
        };
        Self {
            config,
            install_flow: None,
            state: Mutex::new(state),
        }
    }

    /// Drives `hub` through a pause/resume cycle whenever an install is requested.
    pub fn with_install_flow(mut self, hub: LifecycleHub) -> Self {
        self.install_flow = Some(hub);
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the call log.
    pub fn calls(&self) -> ArCoreCallLog {
        self.state().calls.clone()
    }

    /// Moves the camera.
    pub fn set_camera_pose(&self, pose: Pose) {
        self.state().camera_pose = pose;
    }

    /// Changes the camera tracking state.
    pub fn set_tracking(&self, tracking: TrackingState) {
        self.state().tracking = Some(tracking);
    }

    /// Replaces the hits reported by subsequent hit tests.
    pub fn set_hits(&self, hits: Vec<RawHit>) {
        self.state().hits = hits;
    }

    /// The texture camera images are currently streamed into.
    pub fn camera_texture(&self) -> Option<TextureHandle> {
        self.state().camera_texture
    }
}

impl ArRuntime for HeadlessArCore {
    fn check_availability(&self) -> Availability {
        let mut state = self.state();
        state.calls.availability_checks += 1;
        let answer = self
            .config
            .availability
            .get(state.checks_answered)
            .or(self.config.availability.last())
            .copied()
            .unwrap_or(Availability::UnknownError);
        state.checks_answered += 1;
        answer
    }

    fn request_install(&self, user_requested: bool) -> Result<InstallStatus, RuntimeStatus> {
        let mut state = self.state();
        state.calls.install_requests.push(user_requested);
        if state.installed {
            return Ok(InstallStatus::Installed);
        }
        if user_requested {
            state.installed = self.config.install_succeeds;
            if let Some(hub) = self.install_flow.clone() {
                thread::spawn(move || {
                    hub.emit(&LifecycleEvent::Paused);
                    hub.emit(&LifecycleEvent::Resumed);
                });
            }
        }
        Ok(InstallStatus::InstallRequested)
    }

    fn create_session(&self) -> Result<ArSessionHandle, RuntimeStatus> {
        let mut state = self.state();
        if !state.installed {
            return Err(RuntimeStatus::RuntimeUnavailable);
        }
        state.next_handle += 1;
        state.calls.sessions_created += 1;
        Ok(ArSessionHandle(state.next_handle))
    }

    fn destroy_session(&self, _session: ArSessionHandle) {
        self.state().calls.sessions_destroyed += 1;
    }

    fn resume(&self, _session: ArSessionHandle) -> Result<(), RuntimeStatus> {
        self.state().calls.resumes += 1;
        Ok(())
    }

    fn pause(&self, _session: ArSessionHandle) -> Result<(), RuntimeStatus> {
        self.state().calls.pauses += 1;
        Ok(())
    }

    fn set_display_geometry(&self, _session: ArSessionHandle, _rotation: u32, size: Extent2D) {
        let mut state = self.state();
        state.display_size = size;
        state.geometry_pending = true;
        state.calls.display_geometry.push(size);
    }

    fn set_camera_texture(&self, _session: ArSessionHandle, texture: TextureHandle) {
        self.state().camera_texture = Some(texture);
    }

    fn update(&self, _session: ArSessionHandle) -> Result<(), RuntimeStatus> {
        let mut state = self.state();
        state.calls.updates += 1;
        state.geometry_changed = std::mem::take(&mut state.geometry_pending);
        Ok(())
    }

    fn camera_pose(&self, _session: ArSessionHandle) -> [f32; 7] {
        self.state().camera_pose.to_raw()
    }

    fn camera_projection(&self, _session: ArSessionHandle, near: f32, far: f32) -> [f32; 16] {
        let mut state = self.state();
        state.calls.projection_queries.push((near, far));
        let aspect = match state.display_size.aspect_ratio() {
            ratio if ratio > 0.0 => ratio,
            _ => 1.0,
        };
        Mat4::perspective_rh_zo(CAMERA_FOV_Y, aspect, near, far).to_cols_array()
    }

    fn camera_tracking_state(&self, _session: ArSessionHandle) -> TrackingState {
        self.state().tracking.unwrap_or(TrackingState::Stopped)
    }

    fn display_geometry_changed(&self, _session: ArSessionHandle) -> bool {
        self.state().geometry_changed
    }

    fn transform_ndc_to_texture(&self, _session: ArSessionHandle, ndc: &[Vec2; 4]) -> [Vec2; 4] {
        self.state().calls.uv_transforms += 1;
        ndc.map(|p| Vec2::new((p.x + 1.0) * 0.5, (1.0 - p.y) * 0.5))
    }

    fn frame_timestamp(&self, _session: ArSessionHandle) -> i64 {
        let updates = self.state().calls.updates;
        if updates < self.config.first_image_after.max(1) {
            0
        } else {
            i64::from(updates) * CAMERA_PERIOD_NS
        }
    }

    fn hit_test(&self, _session: ArSessionHandle, ray: &Ray) -> Result<Vec<RawHit>, RuntimeStatus> {
        let mut state = self.state();
        state.calls.hit_tests.push(*ray);
        Ok(state.hits.clone())
    }
}
