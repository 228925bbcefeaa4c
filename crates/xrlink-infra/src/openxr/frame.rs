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

use std::time::Duration;

use xrlink_core::error::{StatusExt, XrError, XrResult};
use xrlink_core::resources::Swapchain;
use xrlink_core::system::{HitTestResults, XrFrame};
use xrlink_core::view::{InputSource, TextureTarget, View};
use xrlink_core::{Ray, RuntimeStatus};

use super::runtime::{ControllerPose, FrameEndInfo, OpenXrRuntime};
use super::session::OpenXrSession;

/// One frame of a stereo session.
///
/// Holds every swapchain image it acquired. Releasing the images and ending the
/// native frame happens exactly once, in [`XrFrame::end`] or on drop.
pub struct OpenXrFrame<'s, R: OpenXrRuntime> {
    session: &'s mut OpenXrSession<R>,
    views: Vec<View>,
    display_time: i64,
    should_render: bool,
    begun: bool,
    finished: bool,
}

impl<'s, R: OpenXrRuntime> OpenXrFrame<'s, R> {
    pub(super) fn acquire(session: &'s mut OpenXrSession<R>) -> XrResult<Self> {
        if !session.events.state().is_running() {
            log::trace!("Session not running; producing an idle frame.");
            return Ok(Self {
                session,
                views: Vec::new(),
                display_time: 0,
                should_render: false,
                begun: false,
                finished: false,
            });
        }

        let runtime = &*session.instance.runtime;
        let state = runtime
            .wait_frame(session.handle, session.frame_wait_timeout)
            .check("xrWaitFrame")?;
        runtime.begin_frame(session.handle).check("xrBeginFrame")?;

        let mut frame = Self {
            session,
            views: Vec::new(),
            display_time: state.predicted_display_time,
            should_render: state.should_render,
            begun: true,
            finished: false,
        };
        if frame.should_render {
            // On error the frame is dropped, which releases what was acquired.
            frame.populate()?;
        }
        log::trace!(
            "Frame at {} begun, rendering {}.",
            frame.display_time,
            frame.should_render
        );
        Ok(frame)
    }

    fn populate(&mut self) -> XrResult<()> {
        let session = &mut *self.session;
        let runtime = &*session.instance.runtime;

        let located = runtime
            .locate_views(session.handle, session.space, self.display_time)
            .check("xrLocateViews")?;
        if located.len() != session.color_swapchains.len() {
            return Err(XrError::Runtime {
                call: "xrLocateViews",
                status: RuntimeStatus::ValidationFailure,
            });
        }

        let timeout = session.image_wait_timeout;
        let targets = session
            .color_swapchains
            .iter_mut()
            .zip(session.depth_swapchains.iter_mut());
        for (located, (color, depth)) in located.iter().zip(targets) {
            let color = acquire_image(runtime, color, timeout)?;
            let depth = acquire_image(runtime, depth, timeout)?;
            let mut view = View::new(color, depth);
            view.space = located.pose;
            view.field_of_view = located.field_of_view;
            view.depth_near_z = session.depth_range.near;
            view.depth_far_z = session.depth_range.far;
            self.views.push(view);
        }

        runtime.sync_actions(session.handle).check("xrSyncActions")?;
        for source in session.input_sources.iter_mut() {
            let grip = runtime
                .locate_controller(
                    session.handle,
                    session.space,
                    source.handedness,
                    ControllerPose::Grip,
                    self.display_time,
                )
                .check("xrLocateSpace")?;
            let aim = runtime
                .locate_controller(
                    session.handle,
                    session.space,
                    source.handedness,
                    ControllerPose::Aim,
                    self.display_time,
                )
                .check("xrLocateSpace")?;

            source.tracked_this_frame = grip.is_tracked();
            if grip.is_tracked() {
                source.grip_space = grip.pose;
            }
            if aim.is_tracked() {
                source.aim_space = aim.pose;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> XrResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let session = &mut *self.session;
        let runtime = &*session.instance.runtime;
        let mut first_error = None;

        let swapchains = session
            .color_swapchains
            .iter_mut()
            .chain(session.depth_swapchains.iter_mut());
        for swapchain in swapchains {
            if swapchain.mark_released() {
                if let Err(status) = runtime.release_swapchain_image(swapchain.handle()) {
                    first_error.get_or_insert(XrError::Runtime {
                        call: "xrReleaseSwapchainImage",
                        status,
                    });
                }
            }
        }

        if self.begun {
            let complete = !self.views.is_empty()
                && self.views.len() == session.color_swapchains.len();
            let layers = if self.should_render && complete {
                vec![session.projection_layer(&self.views)]
            } else {
                Vec::new()
            };
            let info = FrameEndInfo {
                display_time: self.display_time,
                blend_mode: session.blend_mode(),
                layers,
            };
            if let Err(status) = runtime.end_frame(session.handle, &info) {
                first_error.get_or_insert(XrError::Runtime {
                    call: "xrEndFrame",
                    status,
                });
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

/// Acquires the next image of `swapchain` and waits until it is writable.
fn acquire_image<R: OpenXrRuntime + ?Sized>(
    runtime: &R,
    swapchain: &mut Swapchain,
    timeout: Duration,
) -> XrResult<TextureTarget> {
    let handle = swapchain.handle();
    let index = runtime
        .acquire_swapchain_image(handle)
        .check("xrAcquireSwapchainImage")?;
    let target = swapchain.mark_acquired(index).map_err(|err| {
        if let Err(status) = runtime.release_swapchain_image(handle) {
            log::error!("Failed to hand back swapchain image {index}: {status}");
        }
        err
    })?;
    runtime
        .wait_swapchain_image(handle, timeout)
        .check("xrWaitSwapchainImage")?;
    Ok(target)
}

impl<R: OpenXrRuntime> XrFrame for OpenXrFrame<'_, R> {
    fn views(&self) -> &[View] {
        &self.views
    }

    fn input_sources(&self) -> &[InputSource] {
        &self.session.input_sources
    }

    fn should_render(&self) -> bool {
        self.should_render
    }

    fn hit_test(&self, _ray: &Ray) -> XrResult<HitTestResults> {
        // Stereo runtimes expose no environment hit testing.
        Ok(HitTestResults::empty())
    }

    fn end(mut self) -> XrResult<()> {
        self.finish()
    }
}

impl<R: OpenXrRuntime> Drop for OpenXrFrame<'_, R> {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            log::error!("Failed to end XR frame: {err}");
        }
    }
}
