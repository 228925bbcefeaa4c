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

use xrlink_core::config::XrConfig;
use xrlink_core::error::{StatusExt, XrError, XrResult};
use xrlink_core::event::EventBus;
use xrlink_core::graphics::{GraphicsApi, GraphicsApiKind};
use xrlink_core::math::{Extent2D, Vec2};
use xrlink_core::platform::{LifecycleEvent, PlatformServices, Ticket};
use xrlink_core::resources::{
    negotiate_format, GlFormats, NativeFormatTable, RenderTargetPair, TextureDescriptor,
    TextureUsage,
};
use xrlink_core::session::{
    DepthRange, DepthRangeTracker, EventProcessor, NextFrame, SessionState,
};
use xrlink_core::system::XrSession;
use xrlink_core::view::{FieldOfView, TextureFormat, TextureFormatKind, TextureHandle};

use super::frame::ArCoreFrame;
use super::runtime::{ArRuntime, ArSessionHandle};

/// Formats the camera-AR runtime composites from, most preferred first.
const OFFERED_FORMATS: [TextureFormat; 2] = [TextureFormat::Rgba8Srgb, TextureFormat::D24S8];

/// One running camera-AR session.
///
/// There is a single view backed by one persistent color/depth texture pair
/// sized to the display surface. Camera images stream into an external texture
/// that is composited under the rendered scene when each frame ends.
pub struct ArCoreSession<R: ArRuntime, G: GraphicsApi> {
    pub(super) runtime: Arc<R>,
    pub(super) graphics: Arc<G>,
    pub(super) handle: ArSessionHandle,
    pub(super) camera_texture: TextureHandle,
    pub(super) targets: RenderTargetPair,
    pub(super) depth_range: DepthRangeTracker,
    pub(super) field_of_view: FieldOfView,
    pub(super) camera_uvs: [Vec2; 4],
    pub(super) uvs_initialized: bool,
    events: EventProcessor,
    tracking: bool,
    lifecycle: EventBus<LifecycleEvent>,
    _lifecycle_ticket: Ticket,
}

impl<R: ArRuntime, G: GraphicsApi> ArCoreSession<R, G> {
    pub(super) fn new<P: PlatformServices + ?Sized>(
        runtime: Arc<R>,
        platform: &P,
        graphics: Arc<G>,
        config: &XrConfig,
    ) -> XrResult<Self> {
        if graphics.kind() != GraphicsApiKind::OpenGlEs {
            return Err(XrError::UnsupportedGraphics(format!(
                "camera AR needs OpenGL ES, got {:?}",
                graphics.kind()
            )));
        }

        let table = GlFormats;
        let offered: Vec<_> = OFFERED_FORMATS
            .iter()
            .filter_map(|&format| table.native_format(format))
            .collect();
        let (color_format, _) = negotiate_format(&offered, &config.color_formats, &table).ok_or(
            XrError::NoSupportedFormat {
                kind: TextureFormatKind::Color,
            },
        )?;
        let (depth_format, _) = negotiate_format(&offered, &config.depth_formats, &table).ok_or(
            XrError::NoSupportedFormat {
                kind: TextureFormatKind::Depth,
            },
        )?;

        let camera_texture = graphics.create_texture(&TextureDescriptor {
            format: color_format,
            size: Extent2D::default(),
            usage: TextureUsage::ExternalCamera,
        })?;
        let handle = match runtime.create_session() {
            Ok(handle) => handle,
            Err(status) => {
                graphics.destroy_texture(camera_texture);
                return Err(XrError::SessionCreation(status.to_string()));
            }
        };
        log::info!("AR session {handle:?} created.");

        let lifecycle = EventBus::new();
        let sender = lifecycle.sender();
        let ticket = platform.lifecycle().subscribe(move |event| {
            // The session is gone once the receiver is; nothing left to notify.
            let _ = sender.send(*event);
        });

        // From here on, Drop cleans up whatever has been created.
        let mut session = Self {
            runtime,
            graphics,
            handle,
            camera_texture,
            targets: RenderTargetPair::new(color_format, depth_format),
            depth_range: DepthRangeTracker::new(config.depth_range),
            field_of_view: FieldOfView::default(),
            camera_uvs: [Vec2::ZERO; 4],
            uvs_initialized: false,
            events: EventProcessor::new(),
            tracking: false,
            lifecycle,
            _lifecycle_ticket: ticket,
        };

        let surface = session.graphics.surface_size();
        if !surface.is_empty() {
            session.apply_display_geometry(surface)?;
        }
        session.resume()?;
        Ok(session)
    }

    /// Tells the runtime about a new surface size and reallocates the
    /// persistent targets to match it.
    pub(super) fn apply_display_geometry(&mut self, surface: Extent2D) -> XrResult<()> {
        self.runtime.set_display_geometry(self.handle, 0, surface);
        self.targets.ensure_size(self.graphics.as_ref(), surface)?;
        Ok(())
    }

    fn resume(&mut self) -> XrResult<()> {
        self.runtime.resume(self.handle).check("ArSession_resume")?;
        self.tracking = true;
        self.events.set_state(SessionState::Ready);
        Ok(())
    }

    fn pause(&mut self) -> XrResult<()> {
        self.runtime.pause(self.handle).check("ArSession_pause")?;
        self.tracking = false;
        self.events.set_state(SessionState::Paused);
        Ok(())
    }

    fn apply_lifecycle(&mut self) -> XrResult<()> {
        let pending: Vec<LifecycleEvent> = self.lifecycle.drain().collect();
        for event in pending {
            if self.events.is_ended() {
                break;
            }
            match (event, self.events.state()) {
                (LifecycleEvent::Paused, SessionState::Paused)
                | (LifecycleEvent::Resumed, SessionState::Ready) => {}
                (LifecycleEvent::Paused, _) => self.pause()?,
                (LifecycleEvent::Resumed, _) => self.resume()?,
            }
        }
        Ok(())
    }

    /// The texture camera images are streamed into.
    pub fn camera_texture(&self) -> TextureHandle {
        self.camera_texture
    }

    /// The depth range requested for upcoming frames.
    pub fn depth_range(&self) -> DepthRange {
        self.depth_range.current()
    }
}

impl<R: ArRuntime, G: GraphicsApi> XrSession for ArCoreSession<R, G> {
    type Frame<'a>
        = ArCoreFrame<'a, R, G>
    where
        Self: 'a;

    fn next_frame(&mut self) -> XrResult<NextFrame<ArCoreFrame<'_, R, G>>> {
        self.apply_lifecycle()?;
        if self.events.is_ended() {
            return Ok(NextFrame::Ended { restart: false });
        }
        if self.events.state() == SessionState::Paused {
            return Ok(NextFrame::Frame(ArCoreFrame::idle(self)));
        }

        self.runtime
            .set_camera_texture(self.handle, self.camera_texture);
        self.runtime.update(self.handle).check("ArSession_update")?;
        ArCoreFrame::acquire(self).map(NextFrame::Frame)
    }

    fn request_end_session(&mut self) -> XrResult<()> {
        self.events.end(false);
        Ok(())
    }

    fn view_count(&self) -> usize {
        1
    }

    fn view_size(&self, index: usize) -> XrResult<Extent2D> {
        if index != 0 {
            return Err(XrError::InvalidViewIndex { index, count: 1 });
        }
        Ok(self
            .targets
            .size()
            .unwrap_or_else(|| self.graphics.surface_size()))
    }

    fn set_depth_range(&mut self, near: f32, far: f32) {
        self.depth_range.request(DepthRange::new(near, far));
    }

    fn state(&self) -> SessionState {
        self.events.state()
    }
}

impl<R: ArRuntime, G: GraphicsApi> Drop for ArCoreSession<R, G> {
    fn drop(&mut self) {
        self.targets.release(self.graphics.as_ref());
        self.graphics.destroy_texture(self.camera_texture);
        if self.tracking {
            if let Err(status) = self.runtime.pause(self.handle) {
                log::error!("Failed to pause AR session {:?}: {status}", self.handle);
            }
        }
        self.runtime.destroy_session(self.handle);
        log::info!("AR session {:?} destroyed.", self.handle);
    }
}
