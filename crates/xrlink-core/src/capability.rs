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

//! Runtime availability and device-permission gating.

use std::fmt;

use async_trait::async_trait;

use crate::error::CapabilityError;
use crate::session::SessionType;

/// A device permission a runtime may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Access to the device camera.
    Camera,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Camera => write!(f, "camera"),
        }
    }
}

/// Checks, and where possible remedies, what a runtime needs before a session
/// can be created.
///
/// Both methods may suspend for a long time: the availability oracle can take
/// seconds to converge, and remediation waits on the user.
#[async_trait]
pub trait CapabilityGate: Send + Sync {
    /// Whether the runtime can provide a session of `session_type` on this
    /// device. Never fails; an undecidable answer is `false`.
    async fn is_session_supported(&self, session_type: SessionType) -> bool;

    /// Makes sure the runtime is installed and its permissions are granted,
    /// requesting each if missing. Installation is checked first and a failure
    /// there short-circuits the permission check. A no-op when both already hold.
    async fn ensure_capability(&self) -> Result<(), CapabilityError>;
}
