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

//! Backend for generalized stereo XR runtimes.
//!
//! Sessions render into runtime-owned swapchains, one color and one depth ring
//! per view, and learn about lifecycle changes from the runtime's event queue.

mod frame;
mod gate;
mod runtime;
mod session;
mod system;

pub use self::frame::OpenXrFrame;
pub use self::gate::OpenXrCapabilityGate;
pub use self::runtime::{
    extensions, BlendMode, ControllerPose, DepthInfo, FormFactor, FrameEndInfo, FrameState,
    GraphicsBinding, InstanceHandle, LocatedView, OpenXrRuntime, ProjectionLayer, ProjectionView,
    ReferenceSpaceType, SessionHandle, SpaceHandle, SpaceLocation, SwapchainCreateInfo,
    SwapchainUsage, SystemId, ViewConfigurationView,
};
pub use self::session::OpenXrSession;
pub use self::system::OpenXrSystem;
