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

use xrlink_core::error::{StatusExt, XrError, XrResult};
use xrlink_core::graphics::{
    BlendFunc, Capability, CompositePass, FramebufferHandle, GraphicsApi, StateGuard,
};
use xrlink_core::math::{Mat4, Vec2};
use xrlink_core::system::{HitTestResults, XrFrame};
use xrlink_core::view::{FieldOfView, InputSource, View};
use xrlink_core::{Pose, Ray};

use super::runtime::{ArRuntime, HitKind, TrackingState};
use super::session::ArCoreSession;

/// Corners of the full-screen quad, as a triangle strip in NDC.
pub const QUAD_POSITIONS: [Vec2; 4] = [
    Vec2::new(-1.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(-1.0, 1.0),
    Vec2::new(1.0, 1.0),
];

/// One frame of a camera-AR session.
///
/// Ending the frame composites the camera image under the rendered scene into
/// the presentable surface and swaps buffers, unless nothing should be shown.
pub struct ArCoreFrame<'s, R: ArRuntime, G: GraphicsApi> {
    session: &'s mut ArCoreSession<R, G>,
    views: Vec<View>,
    should_render: bool,
    finished: bool,
}

impl<'s, R: ArRuntime, G: GraphicsApi> ArCoreFrame<'s, R, G> {
    /// A frame with nothing to render, used while the session is paused.
    pub(super) fn idle(session: &'s mut ArCoreSession<R, G>) -> Self {
        Self {
            session,
            views: Vec::new(),
            should_render: false,
            finished: false,
        }
    }

    pub(super) fn acquire(session: &'s mut ArCoreSession<R, G>) -> XrResult<Self> {
        let surface = session.graphics.surface_size();
        if surface.is_empty() {
            log::trace!("Display surface has no area; skipping the frame.");
            return Ok(Self::idle(session));
        }

        let geometry_changed = session.targets.size() != Some(surface);
        if geometry_changed {
            log::debug!(
                "Display surface is now {}x{}.",
                surface.width,
                surface.height
            );
            session.apply_display_geometry(surface)?;
        }

        let runtime = &*session.runtime;
        let handle = session.handle;
        let pose = Pose::from_raw(runtime.camera_pose(handle));

        if let Some(range) = session.depth_range.take_update(geometry_changed) {
            let projection =
                Mat4::from_cols_array(&runtime.camera_projection(handle, range.near, range.far));
            session.field_of_view = FieldOfView::from_projection(&projection);
            log::debug!(
                "Camera projection refreshed for depth range [{}, {}].",
                range.near,
                range.far
            );
        }

        if runtime.camera_tracking_state(handle) == TrackingState::Tracking {
            let runtime_changed = runtime.display_geometry_changed(handle);
            if geometry_changed || runtime_changed || !session.uvs_initialized {
                session.camera_uvs = runtime.transform_ndc_to_texture(handle, &QUAD_POSITIONS);
                session.uvs_initialized = true;
            }
        }

        let (Some(color), Some(depth)) = (session.targets.color(), session.targets.depth()) else {
            return Err(XrError::Graphics(
                "render targets are not allocated".to_string(),
            ));
        };
        let range = session.depth_range.current();
        let mut view = View::new(color, depth);
        view.space = pose;
        view.field_of_view = session.field_of_view;
        view.depth_near_z = range.near;
        view.depth_far_z = range.far;

        Ok(Self {
            session,
            views: vec![view],
            should_render: true,
            finished: false,
        })
    }

    fn finish(&mut self) -> XrResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;

        let Some(view) = self.views.first().filter(|_| self.should_render) else {
            return Ok(());
        };
        let session = &*self.session;
        // Until the camera produces its first image the texture may hold stale data.
        if session.runtime.frame_timestamp(session.handle) == 0 {
            log::trace!("No camera image yet; skipping present.");
            return Ok(());
        }

        let graphics = session.graphics.as_ref();
        {
            let _framebuffer = StateGuard::framebuffer(graphics, FramebufferHandle::DEFAULT);
            let _cull_face = StateGuard::capability(graphics, Capability::CullFace, false);
            let _depth_test = StateGuard::capability(graphics, Capability::DepthTest, false);
            let _blend = StateGuard::capability(graphics, Capability::Blend, false);
            let _depth_mask = StateGuard::depth_mask(graphics, false);
            let _blend_func = StateGuard::blend_func(graphics, BlendFunc::ALPHA);

            graphics.draw_camera_composite(&CompositePass {
                viewport: view.color.size,
                quad_positions: QUAD_POSITIONS,
                camera_texture: session.camera_texture,
                camera_uvs: session.camera_uvs,
                scene_texture: view.color.handle,
            })?;
        }
        graphics.swap_buffers()
    }
}

impl<R: ArRuntime, G: GraphicsApi> XrFrame for ArCoreFrame<'_, R, G> {
    fn views(&self) -> &[View] {
        &self.views
    }

    fn input_sources(&self) -> &[InputSource] {
        &[]
    }

    fn should_render(&self) -> bool {
        self.should_render
    }

    fn hit_test(&self, ray: &Ray) -> XrResult<HitTestResults> {
        let Some(primary) = self.views.first() else {
            return Ok(HitTestResults::empty());
        };
        let ray = ray.transformed(&primary.space);
        let hits = self
            .session
            .runtime
            .hit_test(self.session.handle, &ray)
            .check("ArFrame_hitTest")?;

        let poses: Vec<Pose> = hits
            .into_iter()
            .filter(|hit| matches!(hit.kind, HitKind::Plane { inside_polygon: true }))
            .map(|hit| hit.pose)
            .collect();
        Ok(HitTestResults::from(poses))
    }

    fn end(mut self) -> XrResult<()> {
        self.finish()
    }
}

impl<R: ArRuntime, G: GraphicsApi> Drop for ArCoreFrame<'_, R, G> {
    fn drop(&mut self) {
        if let Err(err) = self.finish() {
            log::error!("Failed to present AR frame: {err}");
        }
    }
}
