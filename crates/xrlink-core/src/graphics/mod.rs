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

//! The boundary between the XR layer and the application's graphics API.
//!
//! The XR layer never draws scene content. It needs to create a handful of
//! textures, flip a few pieces of pipeline state around the camera composite,
//! and ask for that composite to be drawn. [`GraphicsApi`] is that whole surface.

mod state;

pub use self::state::StateGuard;

use crate::error::XrResult;
use crate::math::{Extent2D, Vec2};
use crate::resources::{DxgiFormats, GlFormats, NativeFormatTable, TextureAllocator};
use crate::view::TextureHandle;

/// The family of graphics API a session is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicsApiKind {
    /// OpenGL ES.
    OpenGlEs,
    /// Direct3D 11.
    D3D11,
}

impl GraphicsApiKind {
    /// The table used to translate texture formats for this API.
    pub fn format_table(self) -> &'static dyn NativeFormatTable {
        match self {
            GraphicsApiKind::OpenGlEs => &GlFormats,
            GraphicsApiKind::D3D11 => &DxgiFormats,
        }
    }

    /// The runtime extension that binds sessions to this API.
    pub fn binding_extension(self) -> &'static str {
        match self {
            GraphicsApiKind::OpenGlEs => "XR_KHR_opengl_es_enable",
            GraphicsApiKind::D3D11 => "XR_KHR_D3D11_enable",
        }
    }
}

/// A toggleable pipeline capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Back/front face culling.
    CullFace,
    /// Depth testing.
    DepthTest,
    /// Color blending.
    Blend,
}

/// A blend factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `0`.
    Zero,
    /// `1`.
    One,
    /// Source alpha.
    SrcAlpha,
    /// One minus source alpha.
    OneMinusSrcAlpha,
}

/// Source and destination blend factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendFunc {
    /// Factor applied to the incoming fragment.
    pub src: BlendFactor,
    /// Factor applied to the framebuffer contents.
    pub dst: BlendFactor,
}

impl BlendFunc {
    /// Classic "over" alpha blending.
    pub const ALPHA: BlendFunc = BlendFunc {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };
    /// Blending disabled in effect.
    pub const REPLACE: BlendFunc = BlendFunc {
        src: BlendFactor::One,
        dst: BlendFactor::Zero,
    };
}

/// A framebuffer object. `FramebufferHandle::DEFAULT` is the presentable surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FramebufferHandle(pub u32);

impl FramebufferHandle {
    /// The window-system framebuffer.
    pub const DEFAULT: FramebufferHandle = FramebufferHandle(0);
}

/// Everything needed to draw the camera image with the rendered scene over it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositePass {
    /// Viewport size in pixels.
    pub viewport: Extent2D,
    /// Full-screen quad corners in normalized device coordinates.
    pub quad_positions: [Vec2; 4],
    /// The external texture the runtime streams camera images into.
    pub camera_texture: TextureHandle,
    /// Camera texture coordinates for each quad corner.
    pub camera_uvs: [Vec2; 4],
    /// The color target the renderer drew the scene into.
    pub scene_texture: TextureHandle,
}

/// The graphics API as seen by the XR layer.
///
/// Methods take `&self`: implementations wrap a context that is current on the
/// render thread and manage their own interior state.
pub trait GraphicsApi: TextureAllocator + Send + Sync {
    /// Which API family this is.
    fn kind(&self) -> GraphicsApiKind;

    /// Pixel size of the presentable surface.
    fn surface_size(&self) -> Extent2D;

    /// Whether `capability` is enabled.
    fn is_enabled(&self, capability: Capability) -> bool;
    /// Enables or disables `capability`.
    fn set_enabled(&self, capability: Capability, enabled: bool);

    /// Whether depth writes are enabled.
    fn depth_mask(&self) -> bool;
    /// Enables or disables depth writes.
    fn set_depth_mask(&self, enabled: bool);

    /// The current blend function.
    fn blend_func(&self) -> BlendFunc;
    /// Sets the blend function.
    fn set_blend_func(&self, func: BlendFunc);

    /// The framebuffer currently bound for drawing.
    fn bound_framebuffer(&self) -> FramebufferHandle;
    /// Binds a framebuffer for drawing.
    fn bind_framebuffer(&self, framebuffer: FramebufferHandle);

    /// Draws the camera composite into the bound framebuffer.
    fn draw_camera_composite(&self, pass: &CompositePass) -> XrResult<()>;

    /// Presents the surface.
    fn swap_buffers(&self) -> XrResult<()>;
}
