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

//! Provides abstractions over the host platform's application lifecycle and
//! permission system.
//!
//! Both arrive as callbacks on threads the XR layer does not control. They are
//! fanned out through [`CallbackHub`]s; subscribers hold a [`Ticket`] and are
//! removed when it is dropped.

mod hub;

pub use self::hub::{CallbackHub, Ticket};

use crate::capability::Permission;

/// An application lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The application moved to the background.
    Paused,
    /// The application returned to the foreground.
    Resumed,
}

/// The outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PermissionResult {
    /// The permission that was requested.
    pub permission: Permission,
    /// Whether it was granted.
    pub granted: bool,
}

/// Hub for application lifecycle callbacks.
pub type LifecycleHub = CallbackHub<LifecycleEvent>;
/// Hub for permission-result callbacks.
pub type PermissionHub = CallbackHub<PermissionResult>;

/// Platform facilities used to gate and drive camera-based sessions.
pub trait PlatformServices: Send + Sync {
    /// Lifecycle callbacks. The platform glue emits into this hub.
    fn lifecycle(&self) -> &LifecycleHub;
    /// Permission-result callbacks. The platform glue emits into this hub.
    fn permissions(&self) -> &PermissionHub;
    /// Whether `permission` is currently granted.
    fn has_permission(&self, permission: Permission) -> bool;
    /// Asks the platform to prompt for `permission`. The answer arrives later
    /// through [`PlatformServices::permissions`].
    fn request_permission(&self, permission: Permission);
}
