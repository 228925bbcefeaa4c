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

//! The native interface a camera-AR runtime exposes.
//!
//! Unlike stereo runtimes there are no swapchains and no event queue: the
//! runtime streams camera images into one external texture, reports a single
//! camera pose per update, and is driven by the application lifecycle.

use xrlink_core::math::{Extent2D, Vec2};
use xrlink_core::view::TextureHandle;
use xrlink_core::{Pose, Ray, RuntimeStatus};

/// Result of asking whether the runtime can run on this device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// The check failed for an unknown reason.
    UnknownError,
    /// The check is still running; ask again later.
    UnknownChecking,
    /// The check timed out.
    UnknownTimedOut,
    /// The device cannot run the runtime.
    UnsupportedDeviceNotCapable,
    /// Supported, but the runtime package is missing.
    SupportedNotInstalled,
    /// Supported, but the installed package must be updated.
    SupportedApkTooOld,
    /// Supported and ready.
    SupportedInstalled,
}

impl Availability {
    /// Whether the device supports the runtime, or `None` while undecided.
    pub fn is_supported(self) -> Option<bool> {
        match self {
            Availability::UnknownChecking => None,
            Availability::SupportedInstalled
            | Availability::SupportedNotInstalled
            | Availability::SupportedApkTooOld => Some(true),
            Availability::UnknownError
            | Availability::UnknownTimedOut
            | Availability::UnsupportedDeviceNotCapable => Some(false),
        }
    }
}

/// Outcome of an install request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStatus {
    /// The runtime is installed.
    Installed,
    /// An install flow was started; the application will be paused and resumed.
    InstallRequested,
}

/// Tracking quality of the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    /// Poses are valid.
    Tracking,
    /// Tracking is temporarily lost.
    Paused,
    /// Tracking has stopped for good.
    Stopped,
}

/// What a raw hit landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitKind {
    /// A detected plane. `inside_polygon` tells whether the hit lies within
    /// the plane's detected extent rather than its infinite extension.
    Plane {
        /// The hit is inside the plane's polygon.
        inside_polygon: bool,
    },
    /// A feature point.
    Point,
    /// Anything else.
    Other,
}

/// One hit reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawHit {
    /// Pose of the hit in tracking space.
    pub pose: Pose,
    /// What was hit.
    pub kind: HitKind,
}

/// A native camera-AR session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArSessionHandle(pub u64);

/// A camera-AR runtime.
pub trait ArRuntime: Send + Sync {
    /// Checks whether the runtime can run here. May answer
    /// [`Availability::UnknownChecking`] while a background check runs.
    fn check_availability(&self) -> Availability;
    /// Checks the install and, if `user_requested`, starts an install flow.
    fn request_install(&self, user_requested: bool) -> Result<InstallStatus, RuntimeStatus>;

    /// Creates a session.
    fn create_session(&self) -> Result<ArSessionHandle, RuntimeStatus>;
    /// Destroys a session.
    fn destroy_session(&self, session: ArSessionHandle);
    /// Starts or restarts camera tracking.
    fn resume(&self, session: ArSessionHandle) -> Result<(), RuntimeStatus>;
    /// Stops camera tracking.
    fn pause(&self, session: ArSessionHandle) -> Result<(), RuntimeStatus>;

    /// Tells the runtime the surface rotation and pixel size.
    fn set_display_geometry(&self, session: ArSessionHandle, rotation: u32, size: Extent2D);
    /// Sets the external texture camera images are streamed into.
    fn set_camera_texture(&self, session: ArSessionHandle, texture: TextureHandle);
    /// Latches the newest camera image and tracking state.
    fn update(&self, session: ArSessionHandle) -> Result<(), RuntimeStatus>;

    /// Camera pose as `[qx, qy, qz, qw, px, py, pz]`.
    fn camera_pose(&self, session: ArSessionHandle) -> [f32; 7];
    /// Column-major camera projection for the given clip distances.
    fn camera_projection(&self, session: ArSessionHandle, near: f32, far: f32) -> [f32; 16];
    /// Camera tracking state at the last update.
    fn camera_tracking_state(&self, session: ArSessionHandle) -> TrackingState;
    /// Whether the display geometry changed since the last update.
    fn display_geometry_changed(&self, session: ArSessionHandle) -> bool;
    /// Maps normalized device coordinates to camera texture coordinates.
    fn transform_ndc_to_texture(&self, session: ArSessionHandle, ndc: &[Vec2; 4]) -> [Vec2; 4];
    /// Timestamp of the latched camera image. Zero until the first image.
    fn frame_timestamp(&self, session: ArSessionHandle) -> i64;

    /// Casts a ray given in tracking space. Results are in runtime order.
    fn hit_test(&self, session: ArSessionHandle, ray: &Ray) -> Result<Vec<RawHit>, RuntimeStatus>;
}
