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

//! Persistent color/depth texture pairs sized to a display surface.

use crate::error::XrResult;
use crate::math::Extent2D;
use crate::view::{TextureFormat, TextureHandle, TextureTarget};

/// How a texture will be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    /// The renderer draws into it.
    RenderTarget,
    /// The runtime streams camera images into it.
    ExternalCamera,
}

/// Parameters for creating a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDescriptor {
    /// Pixel format.
    pub format: TextureFormat,
    /// Pixel dimensions.
    pub size: Extent2D,
    /// Intended use.
    pub usage: TextureUsage,
}

/// Creates and destroys textures on behalf of the XR layer.
pub trait TextureAllocator {
    /// Creates a texture and returns its handle.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> XrResult<TextureHandle>;
    /// Destroys a texture created by [`TextureAllocator::create_texture`].
    fn destroy_texture(&self, handle: TextureHandle);
}

/// One color and one depth target that always share pixel dimensions.
///
/// Textures are created lazily by [`RenderTargetPair::ensure_size`] and only
/// recreated when the requested size differs from the current one.
#[derive(Debug)]
pub struct RenderTargetPair {
    color_format: TextureFormat,
    depth_format: TextureFormat,
    targets: Option<(TextureTarget, TextureTarget)>,
}

impl RenderTargetPair {
    /// Creates an empty pair that will allocate with the given formats.
    pub fn new(color_format: TextureFormat, depth_format: TextureFormat) -> Self {
        Self {
            color_format,
            depth_format,
            targets: None,
        }
    }

    /// The color target, once allocated.
    pub fn color(&self) -> Option<TextureTarget> {
        self.targets.map(|(color, _)| color)
    }

    /// The depth target, once allocated.
    pub fn depth(&self) -> Option<TextureTarget> {
        self.targets.map(|(_, depth)| depth)
    }

    /// The current pixel size, once allocated.
    pub fn size(&self) -> Option<Extent2D> {
        self.targets.map(|(color, _)| color.size)
    }

    /// Makes sure both targets exist at `size`. Returns `true` when textures
    /// were (re)allocated.
    pub fn ensure_size<A>(&mut self, allocator: &A, size: Extent2D) -> XrResult<bool>
    where
        A: TextureAllocator + ?Sized,
    {
        if self.size() == Some(size) {
            return Ok(false);
        }

        self.release(allocator);

        let color = allocator.create_texture(&TextureDescriptor {
            format: self.color_format,
            size,
            usage: TextureUsage::RenderTarget,
        })?;
        let depth = match allocator.create_texture(&TextureDescriptor {
            format: self.depth_format,
            size,
            usage: TextureUsage::RenderTarget,
        }) {
            Ok(depth) => depth,
            Err(e) => {
                allocator.destroy_texture(color);
                return Err(e);
            }
        };

        log::info!(
            "Allocated {}x{} render targets ({:?}, {:?}).",
            size.width,
            size.height,
            self.color_format,
            self.depth_format
        );
        self.targets = Some((
            TextureTarget {
                handle: color,
                format: self.color_format,
                size,
            },
            TextureTarget {
                handle: depth,
                format: self.depth_format,
                size,
            },
        ));
        Ok(true)
    }

    /// Destroys both targets, if allocated.
    pub fn release<A>(&mut self, allocator: &A)
    where
        A: TextureAllocator + ?Sized,
    {
        if let Some((color, depth)) = self.targets.take() {
            allocator.destroy_texture(color.handle);
            allocator.destroy_texture(depth.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XrError;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct CountingAllocator {
        next: Cell<u64>,
        created: RefCell<Vec<TextureDescriptor>>,
        destroyed: RefCell<Vec<TextureHandle>>,
        fail_depth: bool,
    }

    impl TextureAllocator for CountingAllocator {
        fn create_texture(&self, descriptor: &TextureDescriptor) -> XrResult<TextureHandle> {
            if self.fail_depth && descriptor.format == TextureFormat::D24S8 {
                return Err(XrError::Graphics("out of memory".into()));
            }
            self.created.borrow_mut().push(*descriptor);
            let id = self.next.get() + 1;
            self.next.set(id);
            Ok(TextureHandle(id))
        }

        fn destroy_texture(&self, handle: TextureHandle) {
            self.destroyed.borrow_mut().push(handle);
        }
    }

    fn pair() -> RenderTargetPair {
        RenderTargetPair::new(TextureFormat::Rgba8Srgb, TextureFormat::D24S8)
    }

    #[test]
    fn allocation_reports_requested_size() {
        let allocator = CountingAllocator::default();
        let mut targets = pair();

        assert!(targets.ensure_size(&allocator, Extent2D::new(1080, 2340)).unwrap());
        assert_eq!(targets.color().unwrap().size, Extent2D::new(1080, 2340));
        assert_eq!(targets.depth().unwrap().size, Extent2D::new(1080, 2340));
        assert_eq!(targets.depth().unwrap().format, TextureFormat::D24S8);
    }

    #[test]
    fn reallocates_only_when_size_changes() {
        let allocator = CountingAllocator::default();
        let mut targets = pair();

        assert!(targets.ensure_size(&allocator, Extent2D::new(800, 600)).unwrap());
        assert!(!targets.ensure_size(&allocator, Extent2D::new(800, 600)).unwrap());
        assert_eq!(allocator.created.borrow().len(), 2);

        assert!(targets.ensure_size(&allocator, Extent2D::new(600, 800)).unwrap());
        assert_eq!(allocator.created.borrow().len(), 4);
        assert_eq!(
            *allocator.destroyed.borrow(),
            vec![TextureHandle(1), TextureHandle(2)]
        );
    }

    #[test]
    fn failed_depth_allocation_frees_color() {
        let allocator = CountingAllocator {
            fail_depth: true,
            ..Default::default()
        };
        let mut targets = pair();

        assert!(targets.ensure_size(&allocator, Extent2D::new(4, 4)).is_err());
        assert_eq!(targets.size(), None);
        assert_eq!(*allocator.destroyed.borrow(), vec![TextureHandle(1)]);
    }
}
