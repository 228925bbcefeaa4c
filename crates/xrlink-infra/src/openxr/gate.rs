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

use async_trait::async_trait;
use xrlink_core::capability::CapabilityGate;
use xrlink_core::error::CapabilityError;
use xrlink_core::session::SessionType;

/// Capability gate for stereo runtimes.
///
/// These runtimes are installed system-wide and need no runtime permission, so
/// the only question is the session type, answered immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenXrCapabilityGate;

#[async_trait]
impl CapabilityGate for OpenXrCapabilityGate {
    async fn is_session_supported(&self, session_type: SessionType) -> bool {
        session_type == SessionType::ImmersiveVr
    }

    async fn ensure_capability(&self) -> Result<(), CapabilityError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn only_immersive_vr_is_supported() {
        let gate = OpenXrCapabilityGate;
        assert!(gate.is_session_supported(SessionType::ImmersiveVr).await);
        assert!(!gate.is_session_supported(SessionType::ImmersiveAr).await);
        assert!(!gate.is_session_supported(SessionType::Inline).await);
        assert!(gate.ensure_capability().await.is_ok());
    }
}
