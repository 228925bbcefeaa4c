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

//! A simulated stereo runtime.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use xrlink_core::config::ViewConfiguration;
use xrlink_core::math::{Extent2D, Quaternion, Vec3, FRAC_PI_4};
use xrlink_core::resources::{NativeFormat, SwapchainHandle};
use xrlink_core::session::{SessionEvent, SessionState};
use xrlink_core::view::{FieldOfView, Handedness, TextureHandle};
use xrlink_core::{Pose, RuntimeStatus};

use crate::openxr::{
    BlendMode, ControllerPose, FormFactor, FrameEndInfo, FrameState, GraphicsBinding,
    InstanceHandle, LocatedView, OpenXrRuntime, ReferenceSpaceType, SessionHandle, SpaceHandle,
    SpaceLocation, SwapchainCreateInfo, SystemId, ViewConfigurationView,
};

/// Half the distance between the simulated eyes, in meters.
const HALF_IPD: f32 = 0.032;
/// Display period of the simulated headset, in nanoseconds.
const FRAME_PERIOD_NS: i64 = 11_111_111;

/// What the simulated runtime offers.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessOpenXrConfig {
    /// Extensions offered at instance creation.
    pub extensions: Vec<String>,
    /// Whether a headset is connected. While `false`, system queries fail benignly.
    pub headset_connected: bool,
    /// Environment blend modes, most preferred first.
    pub blend_modes: Vec<BlendMode>,
    /// Recommended per-view size.
    pub view_size: Extent2D,
    /// Swapchain formats, most preferred first.
    pub swapchain_formats: Vec<NativeFormat>,
    /// Images in every swapchain ring.
    pub images_per_swapchain: u32,
    /// Whether frames should be rendered.
    pub should_render: bool,
    /// Whether controllers are tracked.
    pub controllers_tracked: bool,
}

impl Default for HeadlessOpenXrConfig {
    /// A connected headset offering every optional extension and GL formats.
    fn default() -> Self {
        Self {
            extensions: vec![
                "XR_KHR_opengl_es_enable".to_string(),
                "XR_KHR_D3D11_enable".to_string(),
                crate::openxr::extensions::COMPOSITION_LAYER_DEPTH.to_string(),
                crate::openxr::extensions::UNBOUNDED_REFERENCE_SPACE.to_string(),
            ],
            headset_connected: true,
            blend_modes: vec![BlendMode::Opaque, BlendMode::AlphaBlend],
            view_size: Extent2D::new(1440, 1600),
            // GL_SRGB8_ALPHA8, GL_DEPTH24_STENCIL8
            swapchain_formats: vec![0x8C43, 0x88F0],
            images_per_swapchain: 3,
            should_render: true,
            controllers_tracked: true,
        }
    }
}

/// Counters and records of every native call made so far.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpenXrCallLog {
    /// Instances created.
    pub instances_created: u32,
    /// Instances destroyed.
    pub instances_destroyed: u32,
    /// Extensions enabled on the last instance.
    pub enabled_extensions: Vec<String>,
    /// System queries, successful or not.
    pub system_queries: u32,
    /// Sessions created.
    pub sessions_created: u32,
    /// Sessions destroyed.
    pub sessions_destroyed: u32,
    /// Native begin-session calls.
    pub sessions_begun: u32,
    /// Native end-session calls.
    pub sessions_ended: u32,
    /// Exit requests.
    pub exit_requests: u32,
    /// Kind of the last reference space created.
    pub reference_space: Option<ReferenceSpaceType>,
    /// Reference spaces destroyed.
    pub spaces_destroyed: u32,
    /// Every swapchain created.
    pub swapchains_created: Vec<SwapchainCreateInfo>,
    /// Swapchains destroyed.
    pub swapchains_destroyed: u32,
    /// Images acquired.
    pub images_acquired: u32,
    /// Images released.
    pub images_released: u32,
    /// Frames waited for.
    pub frames_waited: u32,
    /// Frames begun.
    pub frames_begun: u32,
    /// Every frame submission, in order.
    pub frames_ended: Vec<FrameEndInfo>,
}

impl OpenXrCallLog {
    /// Layer count of each frame submission, in order.
    pub fn layer_counts(&self) -> Vec<usize> {
        self.frames_ended.iter().map(|info| info.layers.len()).collect()
    }
}

#[derive(Debug)]
struct Ring {
    images: Vec<TextureHandle>,
    next: usize,
    acquired: Option<u32>,
}

#[derive(Debug, Default)]
struct State {
    next_handle: u64,
    headset_connected: bool,
    should_render: bool,
    events: VecDeque<SessionEvent>,
    running: HashMap<SessionHandle, bool>,
    exit_requested: HashSet<SessionHandle>,
    rings: HashMap<SwapchainHandle, Ring>,
    view_count: usize,
    display_time: i64,
    frame_in_flight: bool,
    calls: OpenXrCallLog,
}

impl State {
    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn is_running(&self, session: SessionHandle) -> bool {
        self.running.get(&session).copied().unwrap_or(false)
    }
}

/// An in-memory [`OpenXrRuntime`].
///
/// Swapchain acquisition behaves like a real runtime's: acquiring from a ring
/// whose image is still out blocks until it is released, from any thread.
#[derive(Debug)]
pub struct HeadlessOpenXr {
    config: HeadlessOpenXrConfig,
    state: Mutex<State>,
    released: Condvar,
}

impl HeadlessOpenXr {
    /// Creates a runtime offering what `config` describes.
    pub fn new(config: HeadlessOpenXrConfig) -> Self {
        let state = State {
            headset_connected: config.headset_connected,
            should_render: config.should_render,
            ..State::default()
        };
        Self {
            config,
            state: Mutex::new(state),
            released: Condvar::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A copy of the call log.
    pub fn calls(&self) -> OpenXrCallLog {
        self.state().calls.clone()
    }

    /// Queues an event for the next poll.
    pub fn push_event(&self, event: SessionEvent) {
        self.state().events.push_back(event);
    }

    /// Plugs or unplugs the headset.
    pub fn set_headset_connected(&self, connected: bool) {
        self.state().headset_connected = connected;
    }

    /// Sets whether subsequent frames should be rendered.
    pub fn set_should_render(&self, should_render: bool) {
        self.state().should_render = should_render;
    }

    /// Number of swapchains with an image currently acquired.
    pub fn outstanding_images(&self) -> usize {
        self.state()
            .rings
            .values()
            .filter(|ring| ring.acquired.is_some())
            .count()
    }
}

impl OpenXrRuntime for HeadlessOpenXr {
    fn available_extensions(&self) -> Result<Vec<String>, RuntimeStatus> {
        Ok(self.config.extensions.clone())
    }

    fn create_instance(
        &self,
        _application_name: &str,
        extensions: &[&str],
    ) -> Result<InstanceHandle, RuntimeStatus> {
        let mut state = self.state();
        if let Some(missing) = extensions
            .iter()
            .find(|name| !self.config.extensions.iter().any(|e| e == *name))
        {
            log::warn!("Headless runtime does not offer {missing}.");
            return Err(RuntimeStatus::ExtensionNotPresent);
        }
        state.calls.instances_created += 1;
        state.calls.enabled_extensions = extensions.iter().map(|e| e.to_string()).collect();
        Ok(InstanceHandle(state.handle()))
    }

    fn destroy_instance(&self, _instance: InstanceHandle) {
        self.state().calls.instances_destroyed += 1;
    }

    fn system(
        &self,
        _instance: InstanceHandle,
        form_factor: FormFactor,
    ) -> Result<SystemId, RuntimeStatus> {
        let mut state = self.state();
        state.calls.system_queries += 1;
        if form_factor != FormFactor::HeadMountedDisplay || !state.headset_connected {
            return Err(RuntimeStatus::FormFactorUnavailable);
        }
        Ok(SystemId(1))
    }

    fn environment_blend_modes(
        &self,
        _instance: InstanceHandle,
        _system: SystemId,
        _configuration: ViewConfiguration,
    ) -> Result<Vec<BlendMode>, RuntimeStatus> {
        Ok(self.config.blend_modes.clone())
    }

    fn view_configuration_views(
        &self,
        _instance: InstanceHandle,
        _system: SystemId,
        configuration: ViewConfiguration,
    ) -> Result<Vec<ViewConfigurationView>, RuntimeStatus> {
        self.state().view_count = configuration.view_count();
        let view = ViewConfigurationView {
            recommended_size: self.config.view_size,
            max_size: Extent2D::new(
                self.config.view_size.width * 2,
                self.config.view_size.height * 2,
            ),
            recommended_samples: 1,
        };
        Ok(vec![view; configuration.view_count()])
    }

    fn poll_event(&self, _instance: InstanceHandle) -> Result<Option<SessionEvent>, RuntimeStatus> {
        Ok(self.state().events.pop_front())
    }

    fn create_session(
        &self,
        _instance: InstanceHandle,
        _system: SystemId,
        _binding: &GraphicsBinding,
    ) -> Result<SessionHandle, RuntimeStatus> {
        let mut state = self.state();
        let session = SessionHandle(state.handle());
        state.calls.sessions_created += 1;
        state.running.insert(session, false);
        state
            .events
            .push_back(SessionEvent::StateChanged(SessionState::Idle));
        state
            .events
            .push_back(SessionEvent::StateChanged(SessionState::Ready));
        Ok(session)
    }

    fn destroy_session(&self, session: SessionHandle) {
        let mut state = self.state();
        state.running.remove(&session);
        state.exit_requested.remove(&session);
        state.calls.sessions_destroyed += 1;
    }

    fn begin_session(
        &self,
        session: SessionHandle,
        _configuration: ViewConfiguration,
    ) -> Result<(), RuntimeStatus> {
        let mut state = self.state();
        if state.is_running(session) {
            return Err(RuntimeStatus::CallOrderInvalid);
        }
        state.running.insert(session, true);
        state.calls.sessions_begun += 1;
        state
            .events
            .push_back(SessionEvent::StateChanged(SessionState::Synchronized));
        state
            .events
            .push_back(SessionEvent::StateChanged(SessionState::Visible));
        state
            .events
            .push_back(SessionEvent::StateChanged(SessionState::Focused));
        Ok(())
    }

    fn end_session(&self, session: SessionHandle) -> Result<(), RuntimeStatus> {
        let mut state = self.state();
        if !state.is_running(session) {
            return Err(RuntimeStatus::SessionNotRunning);
        }
        state.running.insert(session, false);
        state.calls.sessions_ended += 1;
        state
            .events
            .push_back(SessionEvent::StateChanged(SessionState::Idle));
        // Without an exit request the runtime keeps the session around idle.
        if state.exit_requested.remove(&session) {
            state
                .events
                .push_back(SessionEvent::StateChanged(SessionState::Exiting));
        }
        Ok(())
    }

    fn request_exit_session(&self, session: SessionHandle) -> Result<(), RuntimeStatus> {
        let mut state = self.state();
        if !state.is_running(session) {
            return Err(RuntimeStatus::SessionNotRunning);
        }
        state.calls.exit_requests += 1;
        state.exit_requested.insert(session);
        state
            .events
            .push_back(SessionEvent::StateChanged(SessionState::Stopping));
        Ok(())
    }

    fn create_reference_space(
        &self,
        _session: SessionHandle,
        kind: ReferenceSpaceType,
    ) -> Result<SpaceHandle, RuntimeStatus> {
        let mut state = self.state();
        state.calls.reference_space = Some(kind);
        Ok(SpaceHandle(state.handle()))
    }

    fn destroy_space(&self, _space: SpaceHandle) {
        self.state().calls.spaces_destroyed += 1;
    }

    fn swapchain_formats(
        &self,
        _session: SessionHandle,
    ) -> Result<Vec<NativeFormat>, RuntimeStatus> {
        Ok(self.config.swapchain_formats.clone())
    }

    fn create_swapchain(
        &self,
        _session: SessionHandle,
        info: &SwapchainCreateInfo,
    ) -> Result<SwapchainHandle, RuntimeStatus> {
        if !self.config.swapchain_formats.contains(&info.format) {
            return Err(RuntimeStatus::ValidationFailure);
        }
        let mut state = self.state();
        let handle = SwapchainHandle(state.handle());
        let images = (0..self.config.images_per_swapchain)
            .map(|_| TextureHandle(state.handle()))
            .collect();
        state.rings.insert(
            handle,
            Ring {
                images,
                next: 0,
                acquired: None,
            },
        );
        state.calls.swapchains_created.push(*info);
        Ok(handle)
    }

    fn swapchain_images(
        &self,
        swapchain: SwapchainHandle,
    ) -> Result<Vec<TextureHandle>, RuntimeStatus> {
        self.state()
            .rings
            .get(&swapchain)
            .map(|ring| ring.images.clone())
            .ok_or(RuntimeStatus::ValidationFailure)
    }

    fn destroy_swapchain(&self, swapchain: SwapchainHandle) {
        let mut state = self.state();
        state.rings.remove(&swapchain);
        state.calls.swapchains_destroyed += 1;
        self.released.notify_all();
    }

    fn acquire_swapchain_image(&self, swapchain: SwapchainHandle) -> Result<u32, RuntimeStatus> {
        let mut state = self.state();
        loop {
            let busy = match state.rings.get(&swapchain) {
                Some(ring) => ring.acquired.is_some(),
                None => return Err(RuntimeStatus::ValidationFailure),
            };
            if !busy {
                break;
            }
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        let ring = state
            .rings
            .get_mut(&swapchain)
            .ok_or(RuntimeStatus::ValidationFailure)?;
        let index = ring.next as u32;
        ring.next = (ring.next + 1) % ring.images.len().max(1);
        ring.acquired = Some(index);
        state.calls.images_acquired += 1;
        Ok(index)
    }

    fn wait_swapchain_image(
        &self,
        swapchain: SwapchainHandle,
        _timeout: Duration,
    ) -> Result<(), RuntimeStatus> {
        match self.state().rings.get(&swapchain) {
            Some(ring) if ring.acquired.is_some() => Ok(()),
            Some(_) => Err(RuntimeStatus::CallOrderInvalid),
            None => Err(RuntimeStatus::ValidationFailure),
        }
    }

    fn release_swapchain_image(&self, swapchain: SwapchainHandle) -> Result<(), RuntimeStatus> {
        let mut state = self.state();
        let ring = state
            .rings
            .get_mut(&swapchain)
            .ok_or(RuntimeStatus::ValidationFailure)?;
        if ring.acquired.take().is_none() {
            return Err(RuntimeStatus::CallOrderInvalid);
        }
        state.calls.images_released += 1;
        self.released.notify_all();
        Ok(())
    }

    fn wait_frame(
        &self,
        session: SessionHandle,
        _timeout: Duration,
    ) -> Result<FrameState, RuntimeStatus> {
        let mut state = self.state();
        if !state.is_running(session) {
            return Err(RuntimeStatus::SessionNotRunning);
        }
        state.display_time += FRAME_PERIOD_NS;
        state.calls.frames_waited += 1;
        Ok(FrameState {
            predicted_display_time: state.display_time,
            should_render: state.should_render,
        })
    }

    fn begin_frame(&self, session: SessionHandle) -> Result<(), RuntimeStatus> {
        let mut state = self.state();
        if !state.is_running(session) {
            return Err(RuntimeStatus::SessionNotRunning);
        }
        if state.frame_in_flight {
            return Err(RuntimeStatus::CallOrderInvalid);
        }
        state.frame_in_flight = true;
        state.calls.frames_begun += 1;
        Ok(())
    }

    fn end_frame(&self, _session: SessionHandle, info: &FrameEndInfo) -> Result<(), RuntimeStatus> {
        let mut state = self.state();
        if !state.frame_in_flight {
            return Err(RuntimeStatus::CallOrderInvalid);
        }
        state.frame_in_flight = false;
        state.calls.frames_ended.push(info.clone());
        Ok(())
    }

    fn locate_views(
        &self,
        _session: SessionHandle,
        _space: SpaceHandle,
        _display_time: i64,
    ) -> Result<Vec<LocatedView>, RuntimeStatus> {
        let field_of_view = FieldOfView {
            angle_up: FRAC_PI_4,
            angle_down: -FRAC_PI_4,
            angle_left: -FRAC_PI_4,
            angle_right: FRAC_PI_4,
        };
        let eye = |x: f32| LocatedView {
            pose: Pose::new(Vec3::new(x, 1.6, 0.0), Quaternion::IDENTITY),
            field_of_view,
        };
        match self.state().view_count {
            1 => Ok(vec![eye(0.0)]),
            _ => Ok(vec![eye(-HALF_IPD), eye(HALF_IPD)]),
        }
    }

    fn sync_actions(&self, _session: SessionHandle) -> Result<(), RuntimeStatus> {
        Ok(())
    }

    fn locate_controller(
        &self,
        _session: SessionHandle,
        _space: SpaceHandle,
        hand: Handedness,
        pose: ControllerPose,
        _display_time: i64,
    ) -> Result<SpaceLocation, RuntimeStatus> {
        let tracked = self.config.controllers_tracked;
        let x = match hand {
            Handedness::Left => -0.2,
            Handedness::Right => 0.2,
            Handedness::None => 0.0,
        };
        let z = match pose {
            ControllerPose::Grip => -0.3,
            ControllerPose::Aim => -0.35,
        };
        Ok(SpaceLocation {
            pose: Pose::new(Vec3::new(x, 1.2, z), Quaternion::IDENTITY),
            position_valid: tracked,
            orientation_valid: tracked,
            position_tracked: tracked,
            orientation_tracked: tracked,
        })
    }
}
