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

use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use tokio::sync::{oneshot, OnceCell};
use xrlink_core::capability::{CapabilityGate, Permission};
use xrlink_core::config::PollPolicy;
use xrlink_core::error::CapabilityError;
use xrlink_core::platform::{LifecycleEvent, PlatformServices};
use xrlink_core::session::SessionType;
use xrlink_core::RuntimeStatus;

use super::runtime::{ArRuntime, InstallStatus};

/// Install and permission gate for camera-AR runtimes.
///
/// Device support is decided once per gate by polling the runtime's
/// availability oracle on a dedicated thread; every caller awaits the same
/// answer.
pub struct ArCoreCapabilityGate<R: ArRuntime, P: PlatformServices> {
    runtime: Arc<R>,
    platform: Arc<P>,
    poll: PollPolicy,
    supported: OnceCell<bool>,
}

impl<R, P> ArCoreCapabilityGate<R, P>
where
    R: ArRuntime + 'static,
    P: PlatformServices,
{
    /// Creates a gate that polls availability under `poll`.
    pub fn new(runtime: Arc<R>, platform: Arc<P>, poll: PollPolicy) -> Self {
        Self {
            runtime,
            platform,
            poll,
            supported: OnceCell::new(),
        }
    }

    async fn device_supported(&self) -> bool {
        *self
            .supported
            .get_or_init(|| async {
                let (sender, receiver) = oneshot::channel();
                let runtime = Arc::clone(&self.runtime);
                let policy = self.poll;
                let spawned = thread::Builder::new()
                    .name("xr-availability".into())
                    .spawn(move || {
                        // The gate may have been dropped in the meantime.
                        let _ = sender.send(poll_availability(runtime.as_ref(), policy));
                    });
                if let Err(err) = spawned {
                    log::error!("Failed to spawn the availability poll thread: {err}");
                    return false;
                }
                receiver.await.unwrap_or(false)
            })
            .await
    }

    async fn ensure_installed(&self) -> Result<(), CapabilityError> {
        // Subscribe before asking so a resume fired by the install flow is never missed.
        let (_ticket, resumed) = self
            .platform
            .lifecycle()
            .next_matching(|event| *event == LifecycleEvent::Resumed);

        match self.runtime.request_install(true).map_err(install_failed)? {
            InstallStatus::Installed => return Ok(()),
            InstallStatus::InstallRequested => {
                log::info!("AR runtime install requested; waiting for the application to resume.");
            }
        }

        resumed.await.map_err(|_| CapabilityError::Cancelled)?;

        match self.runtime.request_install(false).map_err(install_failed)? {
            InstallStatus::Installed => {
                log::info!("AR runtime installed.");
                Ok(())
            }
            InstallStatus::InstallRequested => {
                log::warn!("AR runtime still not installed after resuming.");
                Err(CapabilityError::RuntimeNotInstalled)
            }
        }
    }

    async fn ensure_permission(&self, permission: Permission) -> Result<(), CapabilityError> {
        if self.platform.has_permission(permission) {
            return Ok(());
        }

        let (_ticket, answer) = self
            .platform
            .permissions()
            .next_matching(move |result| result.permission == permission);
        log::info!("Requesting {permission} permission.");
        self.platform.request_permission(permission);

        let result = answer.await.map_err(|_| CapabilityError::Cancelled)?;
        if result.granted {
            Ok(())
        } else {
            log::warn!("{permission} permission denied.");
            Err(CapabilityError::PermissionDenied { permission })
        }
    }
}

fn install_failed(status: RuntimeStatus) -> CapabilityError {
    CapabilityError::InstallRequestFailed(status.to_string())
}

/// Polls `runtime` until it gives a definite answer or `policy` runs out.
pub fn poll_availability<R: ArRuntime + ?Sized>(runtime: &R, policy: PollPolicy) -> bool {
    for attempt in 1..=policy.attempts {
        let availability = runtime.check_availability();
        match availability.is_supported() {
            Some(supported) => {
                log::info!("AR availability: {availability:?} after {attempt} attempt(s).");
                return supported;
            }
            None if attempt < policy.attempts => thread::sleep(policy.interval()),
            None => {}
        }
    }
    log::warn!(
        "AR availability still undecided after {} attempts; assuming unsupported.",
        policy.attempts
    );
    false
}

#[async_trait]
impl<R, P> CapabilityGate for ArCoreCapabilityGate<R, P>
where
    R: ArRuntime + 'static,
    P: PlatformServices,
{
    async fn is_session_supported(&self, session_type: SessionType) -> bool {
        match session_type {
            SessionType::ImmersiveAr => self.device_supported().await,
            SessionType::ImmersiveVr | SessionType::Inline => false,
        }
    }

    async fn ensure_capability(&self) -> Result<(), CapabilityError> {
        self.ensure_installed().await?;
        self.ensure_permission(Permission::Camera).await
    }
}
