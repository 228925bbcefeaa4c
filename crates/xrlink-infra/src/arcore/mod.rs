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

//! Camera-based AR backend.
//!
//! A single view follows the device camera. Rendering goes into one persistent
//! texture pair, and presenting composites the camera image underneath it.
//! Sessions are gated on the runtime being installed and the camera permission
//! being granted.

mod frame;
mod gate;
mod runtime;
mod session;
mod system;

pub use self::frame::{ArCoreFrame, QUAD_POSITIONS};
pub use self::gate::{poll_availability, ArCoreCapabilityGate};
pub use self::runtime::{
    ArRuntime, ArSessionHandle, Availability, HitKind, InstallStatus, RawHit, TrackingState,
};
pub use self::session::ArCoreSession;
pub use self::system::ArCoreSystem;
