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

//! # xrlink Infra
//!
//! Concrete implementations of the XR contract defined in `xrlink-core`.
//!
//! - [`openxr`]: a generalized stereo runtime with explicit swapchains.
//! - [`arcore`]: a camera-based AR runtime with a single persistent texture pair,
//!   passthrough compositing, hit testing, and install/permission gating.
//! - `headless` (feature `headless`): deterministic simulated runtimes and a
//!   recording graphics API, for tests and demos that run without a device.
//!
//! Each backend binds to a native runtime through a trait of its own
//! ([`openxr::OpenXrRuntime`], [`arcore::ArRuntime`]) so that bindings can be
//! swapped without touching the session logic.

#![warn(missing_docs)]

#[cfg(feature = "arcore")]
pub mod arcore;
#[cfg(any(test, feature = "headless"))]
pub mod headless;
#[cfg(feature = "openxr")]
pub mod openxr;
