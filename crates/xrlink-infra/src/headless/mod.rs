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

//! Deterministic simulated runtimes.
//!
//! These stand in for device runtimes in tests and demos. Each records the
//! native calls it receives so that callers can assert on what a session did.

#[cfg(feature = "arcore")]
mod arcore;
mod graphics;
#[cfg(feature = "openxr")]
mod openxr;
mod platform;

#[cfg(feature = "arcore")]
pub use self::arcore::{ArCoreCallLog, HeadlessArCore, HeadlessArCoreConfig};
pub use self::graphics::{CompositeRecord, PipelineState, RecordingGraphics};
#[cfg(feature = "openxr")]
pub use self::openxr::{HeadlessOpenXr, HeadlessOpenXrConfig, OpenXrCallLog};
pub use self::platform::{HeadlessPlatform, PromptAnswer};
