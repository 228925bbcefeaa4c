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

//! A graphics API that records what the XR layer asks of it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use xrlink_core::error::{XrError, XrResult};
use xrlink_core::graphics::{
    BlendFunc, Capability, CompositePass, FramebufferHandle, GraphicsApi, GraphicsApiKind,
};
use xrlink_core::math::Extent2D;
use xrlink_core::resources::{TextureAllocator, TextureDescriptor};
use xrlink_core::view::TextureHandle;

/// A snapshot of the pipeline state the XR layer touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    /// Face culling enabled.
    pub cull_face: bool,
    /// Depth testing enabled.
    pub depth_test: bool,
    /// Blending enabled.
    pub blend: bool,
    /// Depth writes enabled.
    pub depth_mask: bool,
    /// Blend function.
    pub blend_func: BlendFunc,
    /// Bound framebuffer.
    pub framebuffer: FramebufferHandle,
}

impl Default for PipelineState {
    /// The state a typical scene renderer leaves behind: everything on, drawing
    /// into an offscreen framebuffer.
    fn default() -> Self {
        Self {
            cull_face: true,
            depth_test: true,
            blend: true,
            depth_mask: true,
            blend_func: BlendFunc::REPLACE,
            framebuffer: FramebufferHandle(7),
        }
    }
}

/// A recorded composite draw and the pipeline state it ran under.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeRecord {
    /// What was drawn.
    pub pass: CompositePass,
    /// Pipeline state at draw time.
    pub state: PipelineState,
}

#[derive(Debug, Default)]
struct Recorder {
    next_texture: u64,
    live: HashMap<TextureHandle, TextureDescriptor>,
    created: Vec<TextureDescriptor>,
    destroyed: usize,
    state: PipelineState,
    composites: Vec<CompositeRecord>,
    swaps: usize,
    fail_draws: bool,
}

/// An in-memory [`GraphicsApi`] that records every call.
#[derive(Debug)]
pub struct RecordingGraphics {
    kind: GraphicsApiKind,
    surface: Mutex<Extent2D>,
    recorder: Mutex<Recorder>,
}

impl RecordingGraphics {
    /// Creates a recorder of API `kind` with a surface of `surface` pixels.
    pub fn new(kind: GraphicsApiKind, surface: Extent2D) -> Self {
        Self {
            kind,
            surface: Mutex::new(surface),
            recorder: Mutex::new(Recorder::default()),
        }
    }

    fn recorder(&self) -> MutexGuard<'_, Recorder> {
        self.recorder.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resizes the presentable surface, as a window resize would.
    pub fn set_surface_size(&self, size: Extent2D) {
        *self.surface.lock().unwrap_or_else(PoisonError::into_inner) = size;
    }

    /// Makes subsequent composite draws fail.
    pub fn fail_draws(&self, fail: bool) {
        self.recorder().fail_draws = fail;
    }

    /// Every texture ever created, in creation order.
    pub fn created_textures(&self) -> Vec<TextureDescriptor> {
        self.recorder().created.clone()
    }

    /// Number of textures created and not yet destroyed.
    pub fn live_textures(&self) -> usize {
        self.recorder().live.len()
    }

    /// Number of textures destroyed.
    pub fn destroyed_textures(&self) -> usize {
        self.recorder().destroyed
    }

    /// The current pipeline state.
    pub fn pipeline_state(&self) -> PipelineState {
        self.recorder().state
    }

    /// Every composite drawn so far.
    pub fn composites(&self) -> Vec<CompositeRecord> {
        self.recorder().composites.clone()
    }

    /// Number of buffer swaps.
    pub fn swap_count(&self) -> usize {
        self.recorder().swaps
    }
}

impl TextureAllocator for RecordingGraphics {
    fn create_texture(&self, descriptor: &TextureDescriptor) -> XrResult<TextureHandle> {
        let mut recorder = self.recorder();
        recorder.next_texture += 1;
        let handle = TextureHandle(recorder.next_texture);
        recorder.live.insert(handle, *descriptor);
        recorder.created.push(*descriptor);
        Ok(handle)
    }

    fn destroy_texture(&self, handle: TextureHandle) {
        let mut recorder = self.recorder();
        if recorder.live.remove(&handle).is_some() {
            recorder.destroyed += 1;
        } else {
            log::warn!("Destroying unknown texture {handle:?}.");
        }
    }
}

impl GraphicsApi for RecordingGraphics {
    fn kind(&self) -> GraphicsApiKind {
        self.kind
    }

    fn surface_size(&self) -> Extent2D {
        *self.surface.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_enabled(&self, capability: Capability) -> bool {
        let state = self.recorder().state;
        match capability {
            Capability::CullFace => state.cull_face,
            Capability::DepthTest => state.depth_test,
            Capability::Blend => state.blend,
        }
    }

    fn set_enabled(&self, capability: Capability, enabled: bool) {
        let mut recorder = self.recorder();
        match capability {
            Capability::CullFace => recorder.state.cull_face = enabled,
            Capability::DepthTest => recorder.state.depth_test = enabled,
            Capability::Blend => recorder.state.blend = enabled,
        }
    }

    fn depth_mask(&self) -> bool {
        self.recorder().state.depth_mask
    }

    fn set_depth_mask(&self, enabled: bool) {
        self.recorder().state.depth_mask = enabled;
    }

    fn blend_func(&self) -> BlendFunc {
        self.recorder().state.blend_func
    }

    fn set_blend_func(&self, func: BlendFunc) {
        self.recorder().state.blend_func = func;
    }

    fn bound_framebuffer(&self) -> FramebufferHandle {
        self.recorder().state.framebuffer
    }

    fn bind_framebuffer(&self, framebuffer: FramebufferHandle) {
        self.recorder().state.framebuffer = framebuffer;
    }

    fn draw_camera_composite(&self, pass: &CompositePass) -> XrResult<()> {
        let mut recorder = self.recorder();
        if recorder.fail_draws {
            return Err(XrError::Graphics("composite draw rejected".to_string()));
        }
        let state = recorder.state;
        recorder.composites.push(CompositeRecord {
            pass: pass.clone(),
            state,
        });
        Ok(())
    }

    fn swap_buffers(&self) -> XrResult<()> {
        self.recorder().swaps += 1;
        Ok(())
    }
}
