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

//! The public-facing driver for xrlink.
//!
//! Embedders create a backend system from `xrlink-infra`, hand it to an
//! [`XrRunner`] together with their graphics context, and call
//! [`XrRunner::do_frame`] once per tick.

mod runner;

pub use runner::{FrameOutcome, XrRunner};

pub mod prelude {
    //! Everything a typical render loop needs.
    pub use crate::{FrameOutcome, XrRunner};
    pub use xrlink_core::{
        HitTestResults, InputSource, Pose, Ray, SessionType, View, XrConfig, XrFrame, XrSession,
        XrSystem,
    };
}
