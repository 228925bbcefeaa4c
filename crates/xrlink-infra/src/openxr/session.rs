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

use std::sync::Arc;
use std::time::Duration;

use xrlink_core::config::{ViewConfiguration, XrConfig};
use xrlink_core::error::{StatusExt, XrError, XrResult};
use xrlink_core::graphics::GraphicsApiKind;
use xrlink_core::math::Extent2D;
use xrlink_core::resources::{negotiate_format, NativeFormat, Swapchain};
use xrlink_core::session::{
    DepthRange, EventProcessor, NextFrame, SessionControl, SessionSignals, SessionState,
};
use xrlink_core::system::XrSession;
use xrlink_core::view::{Handedness, InputSource, TextureFormat, TextureFormatKind, View};
use xrlink_core::RuntimeStatus;

use super::frame::OpenXrFrame;
use super::runtime::{
    BlendMode, DepthInfo, GraphicsBinding, OpenXrRuntime, ProjectionLayer, ProjectionView,
    ReferenceSpaceType, SessionHandle, SpaceHandle, SwapchainCreateInfo, SwapchainUsage,
};
use super::system::{InstanceContext, SystemInfo};

/// One running session on a stereo runtime.
///
/// Owns one color and one depth swapchain per view, sized to the runtime's
/// recommendation, and the reference space every pose is reported in.
pub struct OpenXrSession<R: OpenXrRuntime> {
    pub(super) instance: Arc<InstanceContext<R>>,
    pub(super) handle: SessionHandle,
    pub(super) space: SpaceHandle,
    view_configuration: ViewConfiguration,
    blend_mode: BlendMode,
    pub(super) color_swapchains: Vec<Swapchain>,
    pub(super) depth_swapchains: Vec<Swapchain>,
    pub(super) input_sources: Vec<InputSource>,
    pub(super) events: EventProcessor,
    pub(super) depth_range: DepthRange,
    exit_requested: bool,
    pub(super) frame_wait_timeout: Duration,
    pub(super) image_wait_timeout: Duration,
}

/// Begins and ends the native session on behalf of the event processor.
struct NativeControl<'a, R: OpenXrRuntime> {
    runtime: &'a R,
    session: SessionHandle,
    view_configuration: ViewConfiguration,
}

impl<R: OpenXrRuntime> SessionControl for NativeControl<'_, R> {
    fn begin_session(&mut self) -> XrResult<()> {
        log::info!("Beginning XR session {:?}.", self.session);
        self.runtime
            .begin_session(self.session, self.view_configuration)
            .check("xrBeginSession")
    }

    fn end_session(&mut self) -> XrResult<()> {
        log::info!("Ending XR session {:?}.", self.session);
        self.runtime.end_session(self.session).check("xrEndSession")
    }
}

impl<R: OpenXrRuntime> OpenXrSession<R> {
    pub(super) fn new(
        instance: Arc<InstanceContext<R>>,
        system: SystemInfo,
        config: &XrConfig,
        binding: GraphicsBinding,
    ) -> XrResult<Self> {
        let runtime = Arc::clone(&instance.runtime);
        let handle = runtime
            .create_session(instance.handle, system.id, &binding)
            .map_err(|status| XrError::SessionCreation(status.to_string()))?;

        let space_type = if instance.capabilities.unbounded_space {
            ReferenceSpaceType::Unbounded
        } else {
            ReferenceSpaceType::Local
        };
        let space = match runtime.create_reference_space(handle, space_type) {
            Ok(space) => space,
            Err(status) => {
                runtime.destroy_session(handle);
                return Err(XrError::Runtime {
                    call: "xrCreateReferenceSpace",
                    status,
                });
            }
        };
        log::info!("XR session {handle:?} created with a {space_type:?} reference space.");

        // From here on, Drop cleans up whatever has been created.
        let mut session = Self {
            instance,
            handle,
            space,
            view_configuration: config.view_configuration,
            blend_mode: system.blend_mode,
            color_swapchains: Vec::new(),
            depth_swapchains: Vec::new(),
            input_sources: vec![
                InputSource::new(Handedness::Left),
                InputSource::new(Handedness::Right),
            ],
            events: EventProcessor::new(),
            depth_range: config.depth_range,
            exit_requested: false,
            frame_wait_timeout: config.frame_wait_timeout(),
            image_wait_timeout: config.image_wait_timeout(),
        };
        session.create_swapchains(system, config, binding.api)?;
        Ok(session)
    }

    fn create_swapchains(
        &mut self,
        system: SystemInfo,
        config: &XrConfig,
        api: GraphicsApiKind,
    ) -> XrResult<()> {
        let runtime = &*self.instance.runtime;
        let offered = runtime
            .swapchain_formats(self.handle)
            .check("xrEnumerateSwapchainFormats")?;
        let table = api.format_table();

        let (color_format, color_native) = negotiate_format(&offered, &config.color_formats, table)
            .ok_or(XrError::NoSupportedFormat {
                kind: TextureFormatKind::Color,
            })?;
        let (depth_format, depth_native) = negotiate_format(&offered, &config.depth_formats, table)
            .ok_or(XrError::NoSupportedFormat {
                kind: TextureFormatKind::Depth,
            })?;
        log::info!("Negotiated swapchain formats: color {color_format:?}, depth {depth_format:?}.");

        let views = runtime
            .view_configuration_views(self.instance.handle, system.id, self.view_configuration)
            .check("xrEnumerateViewConfigurationViews")?;
        let expected = self.view_configuration.view_count();
        if views.len() != expected {
            return Err(XrError::SessionCreation(format!(
                "runtime reported {} views for a {:?} configuration",
                views.len(),
                self.view_configuration
            )));
        }

        for view in &views {
            let size = view.recommended_size;
            let color = create_swapchain(
                runtime,
                self.handle,
                (color_format, color_native),
                size,
                SwapchainUsage::Color,
            )?;
            self.color_swapchains.push(color);
            let depth = create_swapchain(
                runtime,
                self.handle,
                (depth_format, depth_native),
                size,
                SwapchainUsage::DepthStencil,
            )?;
            self.depth_swapchains.push(depth);
            log::debug!("Created swapchains of {}x{}.", size.width, size.height);
        }
        Ok(())
    }

    fn process_events(&mut self) -> XrResult<SessionSignals> {
        let runtime = &*self.instance.runtime;
        let instance = self.instance.handle;
        let mut control = NativeControl {
            runtime,
            session: self.handle,
            view_configuration: self.view_configuration,
        };
        self.events
            .process(|| runtime.poll_event(instance).check("xrPollEvent"), &mut control)
    }

    /// The environment blend mode submitted with every frame.
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// The reference space poses are reported in.
    pub fn space(&self) -> SpaceHandle {
        self.space
    }

    /// The color and depth swapchains of every view, in view order.
    pub fn swapchains(&self) -> impl Iterator<Item = (&Swapchain, &Swapchain)> {
        self.color_swapchains.iter().zip(self.depth_swapchains.iter())
    }

    /// Builds the projection layer for a fully populated frame.
    pub(super) fn projection_layer(&self, views: &[View]) -> ProjectionLayer {
        let with_depth = self.instance.capabilities.depth_composition;
        let views = views
            .iter()
            .zip(self.swapchains())
            .map(|(view, (color, depth))| ProjectionView {
                pose: view.space,
                field_of_view: view.field_of_view,
                swapchain: color.handle(),
                image_rect: color.size(),
                depth: with_depth.then(|| DepthInfo {
                    swapchain: depth.handle(),
                    image_rect: depth.size(),
                    min_depth: 0.0,
                    max_depth: 1.0,
                    near_z: view.depth_near_z,
                    far_z: view.depth_far_z,
                }),
            })
            .collect();

        ProjectionLayer {
            space: self.space,
            blend_source_alpha: true,
            views,
        }
    }
}

fn create_swapchain<R: OpenXrRuntime + ?Sized>(
    runtime: &R,
    session: SessionHandle,
    (format, native): (TextureFormat, NativeFormat),
    size: Extent2D,
    usage: SwapchainUsage,
) -> XrResult<Swapchain> {
    let info = SwapchainCreateInfo {
        format: native,
        size,
        array_size: 1,
        sample_count: 1,
        usage,
    };
    let handle = runtime
        .create_swapchain(session, &info)
        .check("xrCreateSwapchain")?;
    match runtime.swapchain_images(handle) {
        Ok(images) if !images.is_empty() => Ok(Swapchain::new(handle, format, native, size, images)),
        Ok(_) => {
            runtime.destroy_swapchain(handle);
            Err(XrError::Runtime {
                call: "xrEnumerateSwapchainImages",
                status: RuntimeStatus::ValidationFailure,
            })
        }
        Err(status) => {
            runtime.destroy_swapchain(handle);
            Err(XrError::Runtime {
                call: "xrEnumerateSwapchainImages",
                status,
            })
        }
    }
}

impl<R: OpenXrRuntime> XrSession for OpenXrSession<R> {
    type Frame<'a>
        = OpenXrFrame<'a, R>
    where
        Self: 'a;

    fn next_frame(&mut self) -> XrResult<NextFrame<OpenXrFrame<'_, R>>> {
        let signals = self.process_events()?;
        if signals.end_session {
            return Ok(NextFrame::Ended {
                restart: signals.restart_session,
            });
        }
        OpenXrFrame::acquire(self).map(NextFrame::Frame)
    }

    fn request_end_session(&mut self) -> XrResult<()> {
        if self.events.is_ended() || self.exit_requested {
            return Ok(());
        }
        if self.events.state().is_running() {
            log::info!("Requesting exit of XR session {:?}.", self.handle);
            self.instance
                .runtime
                .request_exit_session(self.handle)
                .check("xrRequestExitSession")?;
            self.exit_requested = true;
        } else {
            self.events.end(false);
        }
        Ok(())
    }

    fn view_count(&self) -> usize {
        self.color_swapchains.len()
    }

    fn view_size(&self, index: usize) -> XrResult<Extent2D> {
        self.color_swapchains
            .get(index)
            .map(Swapchain::size)
            .ok_or(XrError::InvalidViewIndex {
                index,
                count: self.color_swapchains.len(),
            })
    }

    fn set_depth_range(&mut self, near: f32, far: f32) {
        self.depth_range = DepthRange::new(near, far);
    }

    fn state(&self) -> SessionState {
        self.events.state()
    }
}

impl<R: OpenXrRuntime> Drop for OpenXrSession<R> {
    fn drop(&mut self) {
        let runtime = &*self.instance.runtime;
        for swapchain in self.color_swapchains.drain(..).chain(self.depth_swapchains.drain(..)) {
            runtime.destroy_swapchain(swapchain.handle());
        }
        runtime.destroy_space(self.space);
        runtime.destroy_session(self.handle);
        log::info!("XR session {:?} destroyed.", self.handle);
    }
}
