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

//! Per-frame view data handed to the renderer.
//!
//! A [`View`] describes one eye or one camera for a single frame: where it is,
//! what it sees, and which textures to draw into. An [`InputSource`] describes a
//! tracked controller for the same frame.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::math::{Extent2D, Mat4};
use crate::session::{DEFAULT_DEPTH_FAR_Z, DEFAULT_DEPTH_NEAR_Z};
use crate::space::Pose;

/// Pixel formats the XR layer knows how to negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8-bit RGBA, sRGB encoded.
    Rgba8Srgb,
    /// 8-bit BGRA, sRGB encoded.
    Bgra8Srgb,
    /// 24-bit depth with 8-bit stencil.
    D24S8,
}

impl TextureFormat {
    /// Whether this is a color or a depth/stencil format.
    pub fn kind(self) -> TextureFormatKind {
        match self {
            TextureFormat::Rgba8Srgb | TextureFormat::Bgra8Srgb => TextureFormatKind::Color,
            TextureFormat::D24S8 => TextureFormatKind::Depth,
        }
    }
}

/// Distinguishes color targets from depth targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormatKind {
    /// A color render target.
    Color,
    /// A depth/stencil render target.
    Depth,
}

impl fmt::Display for TextureFormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureFormatKind::Color => write!(f, "color"),
            TextureFormatKind::Depth => write!(f, "depth"),
        }
    }
}

/// An opaque handle to a texture owned by the runtime or the graphics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureHandle(pub u64);

/// A texture the renderer draws into, with its format and pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureTarget {
    /// The native texture.
    pub handle: TextureHandle,
    /// The negotiated pixel format.
    pub format: TextureFormat,
    /// The pixel dimensions.
    pub size: Extent2D,
}

/// The four half-angles of a view frustum, in radians.
///
/// `angle_left` and `angle_down` are negative for a frustum that contains the
/// view direction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldOfView {
    /// Angle between the view direction and the top plane.
    pub angle_up: f32,
    /// Angle between the view direction and the bottom plane.
    pub angle_down: f32,
    /// Angle between the view direction and the left plane.
    pub angle_left: f32,
    /// Angle between the view direction and the right plane.
    pub angle_right: f32,
}

impl FieldOfView {
    /// Derives a symmetric field of view from a column-major projection matrix.
    ///
    /// The vertical half-angle is `atan(1 / m[1][1])`; the horizontal one is the
    /// vertical half-angle scaled by the aspect ratio `m[1][1] / m[0][0]`.
    pub fn from_projection(projection: &Mat4) -> Self {
        let a = projection.cols[0].x;
        let b = projection.cols[1].y;
        let aspect_ratio = b / a;
        let vertical = (1.0 / b).atan();
        let horizontal = vertical * aspect_ratio;
        Self {
            angle_up: vertical,
            angle_down: -vertical,
            angle_left: -horizontal,
            angle_right: horizontal,
        }
    }

    /// Builds the right-handed projection matrix for this frustum with a `[0, 1]`
    /// depth range.
    pub fn projection_matrix(&self, near: f32, far: f32) -> Mat4 {
        Mat4::from_fov_rh_zo(
            self.angle_left,
            self.angle_right,
            self.angle_up,
            self.angle_down,
            near,
            far,
        )
    }
}

/// One eye's or one camera's rendering parameters for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// Pose of the view in the session's reference space.
    pub space: Pose,
    /// Field of view of the view frustum.
    pub field_of_view: FieldOfView,
    /// Color target to render into.
    pub color: TextureTarget,
    /// Depth target to render into. Same pixel size as `color`.
    pub depth: TextureTarget,
    /// Near clip distance.
    pub depth_near_z: f32,
    /// Far clip distance.
    pub depth_far_z: f32,
}

impl View {
    /// Creates a view at the origin with the given targets and default depth range.
    pub fn new(color: TextureTarget, depth: TextureTarget) -> Self {
        Self {
            space: Pose::IDENTITY,
            field_of_view: FieldOfView::default(),
            color,
            depth,
            depth_near_z: DEFAULT_DEPTH_NEAR_Z,
            depth_far_z: DEFAULT_DEPTH_FAR_Z,
        }
    }

    /// The projection matrix for this view's frustum and depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        self.field_of_view
            .projection_matrix(self.depth_near_z, self.depth_far_z)
    }
}

/// Which hand a controller is held in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    /// Not associated with a hand.
    None,
    /// The left hand.
    Left,
    /// The right hand.
    Right,
}

/// Process-unique identifier of an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputSourceId(pub u32);

static NEXT_INPUT_SOURCE_ID: AtomicU32 = AtomicU32::new(0);

impl InputSourceId {
    /// Allocates the next identifier.
    pub fn next() -> Self {
        Self(NEXT_INPUT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A tracked controller for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct InputSource {
    /// Stable identifier, unique within the process.
    pub id: InputSourceId,
    /// The hand this source belongs to.
    pub handedness: Handedness,
    /// `true` only when both position and orientation were valid and tracked.
    pub tracked_this_frame: bool,
    /// Pose of the grip.
    pub grip_space: Pose,
    /// Pose of the pointing ray.
    pub aim_space: Pose,
}

impl InputSource {
    /// Creates an untracked input source with a fresh identifier.
    pub fn new(handedness: Handedness) -> Self {
        Self {
            id: InputSourceId::next(),
            handedness,
            tracked_this_frame: false,
            grip_space: Pose::IDENTITY,
            aim_space: Pose::IDENTITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Vec4, FRAC_PI_4};
    use approx::assert_relative_eq;

    #[test]
    fn fov_from_square_projection() {
        // 90 degree vertical FOV, aspect 1.
        let projection = Mat4::perspective_rh_zo(2.0 * FRAC_PI_4, 1.0, 0.5, 1000.0);
        let fov = FieldOfView::from_projection(&projection);

        assert_relative_eq!(fov.angle_up, FRAC_PI_4, epsilon = 1e-5);
        assert_relative_eq!(fov.angle_down, -FRAC_PI_4, epsilon = 1e-5);
        assert_relative_eq!(fov.angle_right, FRAC_PI_4, epsilon = 1e-5);
        assert_relative_eq!(fov.angle_left, -FRAC_PI_4, epsilon = 1e-5);
    }

    #[test]
    fn fov_scales_horizontal_by_aspect() {
        let projection = Mat4::from_cols(
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, -1.0, -1.0),
            Vec4::new(0.0, 0.0, -0.5, 0.0),
        );
        let fov = FieldOfView::from_projection(&projection);
        let vertical = 0.5f32.atan();

        assert_relative_eq!(fov.angle_up, vertical, epsilon = 1e-6);
        assert_relative_eq!(fov.angle_right, vertical * 2.0, epsilon = 1e-6);
        assert_relative_eq!(fov.angle_left, -fov.angle_right, epsilon = 1e-6);
    }

    #[test]
    fn input_source_ids_are_unique() {
        let left = InputSource::new(Handedness::Left);
        let right = InputSource::new(Handedness::Right);
        assert_ne!(left.id, right.id);
        assert!(right.id > left.id);
        assert!(!left.tracked_this_frame);
    }

    #[test]
    fn format_kinds() {
        assert_eq!(TextureFormat::Rgba8Srgb.kind(), TextureFormatKind::Color);
        assert_eq!(TextureFormat::D24S8.kind(), TextureFormatKind::Depth);
        assert_eq!(TextureFormatKind::Depth.to_string(), "depth");
    }
}
