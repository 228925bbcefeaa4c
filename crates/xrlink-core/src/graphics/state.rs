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

//! Scoped pipeline-state changes.

use super::{BlendFunc, Capability, FramebufferHandle, GraphicsApi};

#[derive(Debug, Clone, Copy)]
enum Saved {
    Capability(Capability, bool),
    DepthMask(bool),
    BlendFunc(BlendFunc),
    Framebuffer(FramebufferHandle),
}

/// Applies one piece of pipeline state and restores the previous value when
/// dropped.
///
/// Guards nest: drop them in reverse order of creation (which is what scope
/// exit does) and the API ends up exactly as it was.
#[must_use = "the previous state is restored as soon as the guard is dropped"]
pub struct StateGuard<'g, G: GraphicsApi + ?Sized> {
    api: &'g G,
    saved: Saved,
}

impl<'g, G: GraphicsApi + ?Sized> StateGuard<'g, G> {
    /// Enables or disables `capability` for the guard's lifetime.
    pub fn capability(api: &'g G, capability: Capability, enabled: bool) -> Self {
        let saved = Saved::Capability(capability, api.is_enabled(capability));
        api.set_enabled(capability, enabled);
        Self { api, saved }
    }

    /// Sets the depth write mask for the guard's lifetime.
    pub fn depth_mask(api: &'g G, enabled: bool) -> Self {
        let saved = Saved::DepthMask(api.depth_mask());
        api.set_depth_mask(enabled);
        Self { api, saved }
    }

    /// Sets the blend function for the guard's lifetime.
    pub fn blend_func(api: &'g G, func: BlendFunc) -> Self {
        let saved = Saved::BlendFunc(api.blend_func());
        api.set_blend_func(func);
        Self { api, saved }
    }

    /// Binds `framebuffer` for the guard's lifetime.
    pub fn framebuffer(api: &'g G, framebuffer: FramebufferHandle) -> Self {
        let saved = Saved::Framebuffer(api.bound_framebuffer());
        api.bind_framebuffer(framebuffer);
        Self { api, saved }
    }
}

impl<G: GraphicsApi + ?Sized> Drop for StateGuard<'_, G> {
    fn drop(&mut self) {
        match self.saved {
            Saved::Capability(capability, enabled) => self.api.set_enabled(capability, enabled),
            Saved::DepthMask(enabled) => self.api.set_depth_mask(enabled),
            Saved::BlendFunc(func) => self.api.set_blend_func(func),
            Saved::Framebuffer(framebuffer) => self.api.bind_framebuffer(framebuffer),
        }
    }
}
