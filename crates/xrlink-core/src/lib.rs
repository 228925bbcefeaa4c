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

//! # xrlink Core
//!
//! Foundational crate containing the session/frame contract, data model, and
//! core types shared by every XR backend.

#![warn(missing_docs)]

pub mod capability;
pub mod config;
pub mod error;
pub mod event;
pub mod graphics;
pub mod math;
pub mod platform;
pub mod resources;
pub mod session;
pub mod space;
pub mod system;
pub mod view;

pub use capability::{CapabilityGate, Permission};
pub use config::{PollPolicy, XrConfig};
pub use error::{CapabilityError, RuntimeStatus, XrError, XrResult};
pub use session::{NextFrame, SessionState, SessionType};
pub use space::{Pose, Ray};
pub use system::{HitTestResults, SystemCapabilities, XrFrame, XrSession, XrSystem};
pub use view::{FieldOfView, InputSource, TextureFormat, View};
