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

//! Rigid poses and rays in a tracking space.

use serde::{Deserialize, Serialize};

use crate::math::{Quaternion, Vec3};

/// A position plus an orientation, as reported by the tracking runtime.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// Position in meters.
    pub position: Vec3,
    /// Orientation as a unit quaternion.
    pub orientation: Quaternion,
}

impl Pose {
    /// The pose at the origin with no rotation.
    pub const IDENTITY: Pose = Pose {
        position: Vec3::ZERO,
        orientation: Quaternion::IDENTITY,
    };

    /// Creates a pose from a position and an orientation.
    pub const fn new(position: Vec3, orientation: Quaternion) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Reads a raw runtime pose: the orientation quaternion `(x, y, z, w)`
    /// followed by the position `(x, y, z)`.
    pub fn from_raw(raw: [f32; 7]) -> Self {
        Self {
            orientation: Quaternion::new(raw[0], raw[1], raw[2], raw[3]),
            position: Vec3::new(raw[4], raw[5], raw[6]),
        }
    }

    /// Writes this pose in the raw runtime layout accepted by [`Pose::from_raw`].
    pub fn to_raw(&self) -> [f32; 7] {
        let q = self.orientation;
        let p = self.position;
        [q.x, q.y, q.z, q.w, p.x, p.y, p.z]
    }

    /// Rotates a direction by this pose's orientation.
    pub fn rotate(&self, direction: Vec3) -> Vec3 {
        self.orientation * direction
    }

    /// Maps a point from this pose's local space into the parent space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotate(point) + self.position
    }
}

/// A ray with an origin and a direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    /// Where the ray starts.
    pub origin: Vec3,
    /// Where the ray points. Not required to be normalized.
    pub direction: Vec3,
}

impl Default for Ray {
    /// The viewer's forward ray: from the origin along `-Z`.
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::NEG_Z,
        }
    }
}

impl Ray {
    /// Creates a ray from an origin and a direction.
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Expresses a ray given in `pose`'s local space in the parent space.
    pub fn transformed(&self, pose: &Pose) -> Ray {
        Ray {
            origin: pose.transform_point(self.origin),
            direction: pose.rotate(self.direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FRAC_PI_2;
    use approx::assert_relative_eq;

    #[test]
    fn raw_pose_is_orientation_then_position() {
        let pose = Pose::from_raw([0.0, 0.0, 0.0, 1.0, 1.0, 2.0, 3.0]);
        assert_eq!(pose.orientation, Quaternion::IDENTITY);
        assert_eq!(pose.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(pose.to_raw(), [0.0, 0.0, 0.0, 1.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn default_ray_points_forward() {
        let ray = Ray::default();
        assert_eq!(ray.origin, Vec3::ZERO);
        assert_eq!(ray.direction, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn ray_follows_viewer_pose() {
        // Viewer at (0, 1.6, 0) turned 90 degrees to the left.
        let pose = Pose::new(
            Vec3::new(0.0, 1.6, 0.0),
            Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2),
        );
        let ray = Ray::default().transformed(&pose);

        assert_relative_eq!(ray.origin.y, 1.6, epsilon = 1e-6);
        assert_relative_eq!(ray.direction.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(ray.direction.z, 0.0, epsilon = 1e-5);
    }
}
