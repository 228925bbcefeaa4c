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

//! The native interface a generalized stereo runtime exposes.
//!
//! The trait mirrors the runtime's C API one call per method, with handles as
//! newtypes and statuses as [`RuntimeStatus`]. A binding crate implements it
//! over the real loader; the `headless` feature's `HeadlessOpenXr`
//! implements it in memory.

use std::time::Duration;

use xrlink_core::config::ViewConfiguration;
use xrlink_core::graphics::GraphicsApiKind;
use xrlink_core::math::Extent2D;
use xrlink_core::resources::{NativeFormat, SwapchainHandle};
use xrlink_core::session::SessionEvent;
use xrlink_core::view::{FieldOfView, Handedness, TextureHandle};
use xrlink_core::{Pose, RuntimeStatus};

/// Names of the optional runtime extensions the backend enables when offered.
pub mod extensions {
    /// Submitting depth buffers alongside projection layers.
    pub const COMPOSITION_LAYER_DEPTH: &str = "XR_KHR_composition_layer_depth";
    /// A reference space with no tracking-volume bounds.
    pub const UNBOUNDED_REFERENCE_SPACE: &str = "XR_MSFT_unbounded_reference_space";
    /// Persistent spatial anchors.
    pub const SPATIAL_ANCHOR: &str = "XR_MSFT_spatial_anchor";
}

/// A runtime instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(pub u64);

/// A device (system) exposed by an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SystemId(pub u64);

/// A native session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

/// A reference space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceHandle(pub u64);

/// The class of device to acquire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFactor {
    /// A head-mounted display.
    HeadMountedDisplay,
    /// A handheld display.
    HandheldDisplay,
}

/// How rendered content is combined with the real world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendMode {
    /// Content replaces the world.
    Opaque,
    /// Content is added to the world (see-through displays).
    Additive,
    /// Content is alpha-blended over the world (passthrough).
    AlphaBlend,
}

/// Reference space kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSpaceType {
    /// Head-locked.
    View,
    /// World-locked around the starting position.
    Local,
    /// Floor-level, bounded.
    Stage,
    /// World-locked with no bounds.
    Unbounded,
}

/// Per-view sizing recommended by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfigurationView {
    /// Recommended render-target size.
    pub recommended_size: Extent2D,
    /// Largest supported render-target size.
    pub max_size: Extent2D,
    /// Recommended MSAA sample count.
    pub recommended_samples: u32,
}

/// What a swapchain's images are rendered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainUsage {
    /// Color attachment.
    Color,
    /// Depth/stencil attachment.
    DepthStencil,
}

/// Parameters of a swapchain to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapchainCreateInfo {
    /// Native pixel format.
    pub format: NativeFormat,
    /// Image size.
    pub size: Extent2D,
    /// Array layers per image.
    pub array_size: u32,
    /// MSAA sample count.
    pub sample_count: u32,
    /// Attachment kind.
    pub usage: SwapchainUsage,
}

/// Result of waiting for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameState {
    /// When the frame is expected to be displayed, in runtime time units.
    pub predicted_display_time: i64,
    /// Whether the runtime will display this frame.
    pub should_render: bool,
}

/// A view's pose and frustum at a display time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatedView {
    /// Pose in the reference space.
    pub pose: Pose,
    /// Frustum half-angles.
    pub field_of_view: FieldOfView,
}

/// Result of locating a space, with per-component validity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpaceLocation {
    /// The pose, meaningful only where flagged valid.
    pub pose: Pose,
    /// Position is valid.
    pub position_valid: bool,
    /// Orientation is valid.
    pub orientation_valid: bool,
    /// Position is actively tracked rather than inferred.
    pub position_tracked: bool,
    /// Orientation is actively tracked rather than inferred.
    pub orientation_tracked: bool,
}

impl SpaceLocation {
    /// Both position and orientation are valid and tracked.
    pub fn is_tracked(&self) -> bool {
        self.position_valid
            && self.orientation_valid
            && self.position_tracked
            && self.orientation_tracked
    }
}

/// Which pose of a controller to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPose {
    /// Where the controller is held.
    Grip,
    /// Where the controller points.
    Aim,
}

/// Depth submitted with a projection view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthInfo {
    /// Depth swapchain holding the submitted image.
    pub swapchain: SwapchainHandle,
    /// Region of the image to use.
    pub image_rect: Extent2D,
    /// Smallest depth value in the image.
    pub min_depth: f32,
    /// Largest depth value in the image.
    pub max_depth: f32,
    /// Near clip distance used when rendering.
    pub near_z: f32,
    /// Far clip distance used when rendering.
    pub far_z: f32,
}

/// One view of a projection layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionView {
    /// Pose the view was rendered from.
    pub pose: Pose,
    /// Frustum the view was rendered with.
    pub field_of_view: FieldOfView,
    /// Color swapchain holding the submitted image.
    pub swapchain: SwapchainHandle,
    /// Region of the image to use.
    pub image_rect: Extent2D,
    /// Depth, when depth composition is enabled.
    pub depth: Option<DepthInfo>,
}

/// A stereo projection layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionLayer {
    /// Space the view poses are expressed in.
    pub space: SpaceHandle,
    /// Blend using the source alpha channel.
    pub blend_source_alpha: bool,
    /// One entry per view.
    pub views: Vec<ProjectionView>,
}

/// Everything submitted when ending a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEndInfo {
    /// Display time returned by the matching wait.
    pub display_time: i64,
    /// Environment blend mode.
    pub blend_mode: BlendMode,
    /// Composition layers. Empty when nothing was rendered.
    pub layers: Vec<ProjectionLayer>,
}

/// The graphics device a session renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphicsBinding {
    /// API family of the device.
    pub api: GraphicsApiKind,
    /// Native device (or display) handle.
    pub device: u64,
    /// Native context handle, where the API has one.
    pub context: u64,
}

/// A generalized stereo XR runtime.
///
/// All methods take `&self`: the runtime is shared by the system and every
/// session created from it.
pub trait OpenXrRuntime: Send + Sync {
    /// Extensions the runtime offers.
    fn available_extensions(&self) -> Result<Vec<String>, RuntimeStatus>;
    /// Creates an instance with the given extensions enabled.
    fn create_instance(
        &self,
        application_name: &str,
        extensions: &[&str],
    ) -> Result<InstanceHandle, RuntimeStatus>;
    /// Destroys an instance.
    fn destroy_instance(&self, instance: InstanceHandle);
    /// Acquires the device of a form factor.
    fn system(
        &self,
        instance: InstanceHandle,
        form_factor: FormFactor,
    ) -> Result<SystemId, RuntimeStatus>;
    /// Blend modes supported by a system, most preferred first.
    fn environment_blend_modes(
        &self,
        instance: InstanceHandle,
        system: SystemId,
        configuration: ViewConfiguration,
    ) -> Result<Vec<BlendMode>, RuntimeStatus>;
    /// Per-view sizing for a view configuration.
    fn view_configuration_views(
        &self,
        instance: InstanceHandle,
        system: SystemId,
        configuration: ViewConfiguration,
    ) -> Result<Vec<ViewConfigurationView>, RuntimeStatus>;
    /// Pops the next event, if any. Never blocks.
    fn poll_event(&self, instance: InstanceHandle) -> Result<Option<SessionEvent>, RuntimeStatus>;

    /// Creates a session bound to a graphics device.
    fn create_session(
        &self,
        instance: InstanceHandle,
        system: SystemId,
        binding: &GraphicsBinding,
    ) -> Result<SessionHandle, RuntimeStatus>;
    /// Destroys a session.
    fn destroy_session(&self, session: SessionHandle);
    /// Begins a session once the runtime reports it ready.
    fn begin_session(
        &self,
        session: SessionHandle,
        configuration: ViewConfiguration,
    ) -> Result<(), RuntimeStatus>;
    /// Ends a session once the runtime reports it stopping.
    fn end_session(&self, session: SessionHandle) -> Result<(), RuntimeStatus>;
    /// Asks the runtime to wind the session down.
    fn request_exit_session(&self, session: SessionHandle) -> Result<(), RuntimeStatus>;

    /// Creates a reference space.
    fn create_reference_space(
        &self,
        session: SessionHandle,
        kind: ReferenceSpaceType,
    ) -> Result<SpaceHandle, RuntimeStatus>;
    /// Destroys a reference space.
    fn destroy_space(&self, space: SpaceHandle);

    /// Swapchain formats the runtime offers, most preferred first.
    fn swapchain_formats(&self, session: SessionHandle) -> Result<Vec<NativeFormat>, RuntimeStatus>;
    /// Creates a swapchain.
    fn create_swapchain(
        &self,
        session: SessionHandle,
        info: &SwapchainCreateInfo,
    ) -> Result<SwapchainHandle, RuntimeStatus>;
    /// The images of a swapchain, in ring order.
    fn swapchain_images(&self, swapchain: SwapchainHandle)
        -> Result<Vec<TextureHandle>, RuntimeStatus>;
    /// Destroys a swapchain.
    fn destroy_swapchain(&self, swapchain: SwapchainHandle);
    /// Takes the next image of the ring. Blocks while an image is outstanding.
    fn acquire_swapchain_image(&self, swapchain: SwapchainHandle) -> Result<u32, RuntimeStatus>;
    /// Waits until the acquired image can be written.
    fn wait_swapchain_image(
        &self,
        swapchain: SwapchainHandle,
        timeout: Duration,
    ) -> Result<(), RuntimeStatus>;
    /// Hands the acquired image back.
    fn release_swapchain_image(&self, swapchain: SwapchainHandle) -> Result<(), RuntimeStatus>;

    /// Waits until the runtime is ready for a new frame.
    fn wait_frame(
        &self,
        session: SessionHandle,
        timeout: Duration,
    ) -> Result<FrameState, RuntimeStatus>;
    /// Marks the start of rendering.
    fn begin_frame(&self, session: SessionHandle) -> Result<(), RuntimeStatus>;
    /// Submits composition layers.
    fn end_frame(&self, session: SessionHandle, info: &FrameEndInfo) -> Result<(), RuntimeStatus>;
    /// Locates every view at a display time.
    fn locate_views(
        &self,
        session: SessionHandle,
        space: SpaceHandle,
        display_time: i64,
    ) -> Result<Vec<LocatedView>, RuntimeStatus>;

    /// Updates action state for this frame.
    fn sync_actions(&self, session: SessionHandle) -> Result<(), RuntimeStatus>;
    /// Locates one pose of a hand's controller.
    fn locate_controller(
        &self,
        session: SessionHandle,
        space: SpaceHandle,
        hand: Handedness,
        pose: ControllerPose,
        display_time: i64,
    ) -> Result<SpaceLocation, RuntimeStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracked_requires_all_flags() {
        let mut location = SpaceLocation {
            position_valid: true,
            orientation_valid: true,
            position_tracked: true,
            orientation_tracked: true,
            ..Default::default()
        };
        assert!(location.is_tracked());

        location.orientation_tracked = false;
        assert!(!location.is_tracked());
    }
}
