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

//! Bookkeeping for runtime-managed image rings.

use crate::error::{RuntimeStatus, XrError, XrResult};
use crate::math::Extent2D;
use crate::resources::NativeFormat;
use crate::view::{TextureFormat, TextureHandle, TextureTarget};

/// An opaque runtime swapchain handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapchainHandle(pub u64);

/// A ring of render-target images owned by a session.
///
/// At most one image is acquired at a time. A frame marks an image acquired
/// once the runtime hands it out and must mark it released before it ends.
#[derive(Debug)]
pub struct Swapchain {
    handle: SwapchainHandle,
    format: TextureFormat,
    native_format: NativeFormat,
    size: Extent2D,
    array_size: u32,
    images: Vec<TextureHandle>,
    acquired: Option<u32>,
}

impl Swapchain {
    /// Wraps a runtime swapchain and its enumerated images.
    pub fn new(
        handle: SwapchainHandle,
        format: TextureFormat,
        native_format: NativeFormat,
        size: Extent2D,
        images: Vec<TextureHandle>,
    ) -> Self {
        Self {
            handle,
            format,
            native_format,
            size,
            array_size: 1,
            images,
            acquired: None,
        }
    }

    /// The runtime handle.
    pub fn handle(&self) -> SwapchainHandle {
        self.handle
    }

    /// The negotiated format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The native code of the negotiated format.
    pub fn native_format(&self) -> NativeFormat {
        self.native_format
    }

    /// Pixel dimensions of every image.
    pub fn size(&self) -> Extent2D {
        self.size
    }

    /// Number of array layers per image.
    pub fn array_size(&self) -> u32 {
        self.array_size
    }

    /// The images in ring order.
    pub fn images(&self) -> &[TextureHandle] {
        &self.images
    }

    /// Whether an image is currently acquired.
    pub fn is_acquired(&self) -> bool {
        self.acquired.is_some()
    }

    /// Records that the runtime handed out image `index`.
    pub fn mark_acquired(&mut self, index: u32) -> XrResult<TextureTarget> {
        if self.acquired.is_some() {
            return Err(XrError::Runtime {
                call: "xrAcquireSwapchainImage",
                status: RuntimeStatus::CallOrderInvalid,
            });
        }
        let handle = *self
            .images
            .get(index as usize)
            .ok_or(XrError::Runtime {
                call: "xrAcquireSwapchainImage",
                status: RuntimeStatus::ValidationFailure,
            })?;
        self.acquired = Some(index);
        Ok(TextureTarget {
            handle,
            format: self.format,
            size: self.size,
        })
    }

    /// Records that the acquired image went back to the runtime. Returns whether
    /// an image was acquired.
    pub fn mark_released(&mut self) -> bool {
        self.acquired.take().is_some()
    }
}
