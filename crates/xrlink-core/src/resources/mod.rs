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

//! View resource bookkeeping: format negotiation, swapchains, and persistent
//! render-target pairs.
//!
//! These types record which native textures exist and who holds them. They do
//! not draw into anything.

mod format;
mod swapchain;
mod target;

pub use self::format::{negotiate_format, DxgiFormats, GlFormats, NativeFormat, NativeFormatTable};
pub use self::swapchain::{Swapchain, SwapchainHandle};
pub use self::target::{RenderTargetPair, TextureAllocator, TextureDescriptor, TextureUsage};
