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

//! Defines the `Mat4` type used for view projection matrices.

use super::Vec4;
use std::ops::{Index, Mul};

/// A 4x4 column-major matrix.
///
/// Runtimes hand projection matrices over as 16 column-major floats; this type
/// stores them the same way so that `cols[0].x` is element `[0][0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[0]` is the first column, and so on.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        ],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Creates a matrix from 16 column-major floats.
    #[inline]
    pub fn from_cols_array(m: &[f32; 16]) -> Self {
        Self::from_cols(
            Vec4::new(m[0], m[1], m[2], m[3]),
            Vec4::new(m[4], m[5], m[6], m[7]),
            Vec4::new(m[8], m[9], m[10], m[11]),
            Vec4::new(m[12], m[13], m[14], m[15]),
        )
    }

    /// Returns the 16 floats of the matrix in column-major order.
    pub fn to_cols_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        for (i, col) in self.cols.iter().enumerate() {
            out[i * 4..i * 4 + 4].copy_from_slice(&[col.x, col.y, col.z, col.w]);
        }
        out
    }

    /// Creates a right-handed perspective projection matrix with a [0, 1] depth range (ZO).
    ///
    /// * `fov_y_radians`: Vertical field of view in radians.
    /// * `aspect_ratio`: Width divided by height of the viewport.
    /// * `z_near`: Distance to the near clipping plane (must be positive).
    /// * `z_far`: Distance to the far clipping plane (must be > `z_near`).
    #[inline]
    pub fn perspective_rh_zo(fov_y_radians: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        debug_assert!(z_near > 0.0 && z_far > z_near);
        let f = 1.0 / (fov_y_radians / 2.0).tan();
        let cc = z_far / (z_near - z_far);
        let dd = (z_near * z_far) / (z_near - z_far);

        Self::from_cols(
            Vec4::new(f / aspect_ratio, 0.0, 0.0, 0.0),
            Vec4::new(0.0, f, 0.0, 0.0),
            Vec4::new(0.0, 0.0, cc, -1.0),
            Vec4::new(0.0, 0.0, dd, 0.0),
        )
    }

    /// Creates a right-handed asymmetric projection matrix with a [0, 1] depth range
    /// from the four half-angles of a view frustum.
    ///
    /// `angle_left` and `angle_down` are usually negative.
    pub fn from_fov_rh_zo(
        angle_left: f32,
        angle_right: f32,
        angle_up: f32,
        angle_down: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        debug_assert!(z_near > 0.0 && z_far > z_near);
        let tan_left = angle_left.tan();
        let tan_right = angle_right.tan();
        let tan_up = angle_up.tan();
        let tan_down = angle_down.tan();
        let width = tan_right - tan_left;
        let height = tan_up - tan_down;
        let cc = z_far / (z_near - z_far);
        let dd = (z_near * z_far) / (z_near - z_far);

        Self::from_cols(
            Vec4::new(2.0 / width, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 2.0 / height, 0.0, 0.0),
            Vec4::new(
                (tan_right + tan_left) / width,
                (tan_up + tan_down) / height,
                cc,
                -1.0,
            ),
            Vec4::new(0.0, 0.0, dd, 0.0),
        )
    }
}

impl Default for Mat4 {
    /// Returns the 4x4 identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    /// Transforms a `Vec4` by this matrix.
    #[inline]
    fn mul(self, rhs: Vec4) -> Self::Output {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

impl Index<usize> for Mat4 {
    type Output = Vec4;
    /// Returns a column of the matrix.
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.cols[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{FRAC_PI_2, FRAC_PI_4};
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_keeps_vector() {
        let v = Vec4::new(1.0, -2.0, 3.0, 1.0);
        assert_eq!(Mat4::IDENTITY * v, v);
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
    }

    #[test]
    fn test_from_cols_array_is_column_major() {
        let m: [f32; 16] = std::array::from_fn(|i| i as f32);
        let mat = Mat4::from_cols_array(&m);
        assert_eq!(mat[1].x, 4.0);
        assert_eq!(mat[0].y, 1.0);
        assert_eq!(mat.to_cols_array(), m);
    }

    #[test]
    fn test_symmetric_fov_matches_perspective() {
        let aspect = 1.0;
        let sym = Mat4::from_fov_rh_zo(-FRAC_PI_4, FRAC_PI_4, FRAC_PI_4, -FRAC_PI_4, 0.5, 1000.0);
        let persp = Mat4::perspective_rh_zo(FRAC_PI_2, aspect, 0.5, 1000.0);
        for c in 0..4 {
            assert_relative_eq!(sym[c].x, persp[c].x, epsilon = 1e-5);
            assert_relative_eq!(sym[c].y, persp[c].y, epsilon = 1e-5);
            assert_relative_eq!(sym[c].z, persp[c].z, epsilon = 1e-5);
            assert_relative_eq!(sym[c].w, persp[c].w, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_near_plane_maps_to_zero_depth() {
        let p = Mat4::perspective_rh_zo(FRAC_PI_2, 1.0, 0.5, 10.0);
        let clip = p * Vec4::new(0.0, 0.0, -0.5, 1.0);
        assert_relative_eq!(clip.z / clip.w, 0.0, epsilon = 1e-6);
        let clip = p * Vec4::new(0.0, 0.0, -10.0, 1.0);
        assert_relative_eq!(clip.z / clip.w, 1.0, epsilon = 1e-5);
    }
}
