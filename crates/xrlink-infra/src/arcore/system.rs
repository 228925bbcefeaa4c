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

use std::marker::PhantomData;
use std::sync::Arc;

use xrlink_core::config::XrConfig;
use xrlink_core::error::{XrError, XrResult};
use xrlink_core::graphics::GraphicsApi;
use xrlink_core::platform::PlatformServices;
use xrlink_core::system::{SystemCapabilities, XrSystem};

use super::gate::ArCoreCapabilityGate;
use super::runtime::ArRuntime;
use super::session::ArCoreSession;

/// Process-wide handle to a camera-AR runtime.
///
/// The runtime needs no instance, so initialization only waits for the
/// availability oracle to report the device as supported.
pub struct ArCoreSystem<R, P, G>
where
    R: ArRuntime + 'static,
    P: PlatformServices,
    G: GraphicsApi,
{
    runtime: Arc<R>,
    platform: Arc<P>,
    config: XrConfig,
    initialized: bool,
    gate: ArCoreCapabilityGate<R, P>,
    _graphics: PhantomData<fn() -> G>,
}

impl<R, P, G> ArCoreSystem<R, P, G>
where
    R: ArRuntime + 'static,
    P: PlatformServices,
    G: GraphicsApi,
{
    /// Creates an uninitialized system.
    pub fn new(runtime: Arc<R>, platform: Arc<P>, config: XrConfig) -> Self {
        let gate = ArCoreCapabilityGate::new(
            Arc::clone(&runtime),
            Arc::clone(&platform),
            config.availability_poll,
        );
        Self {
            runtime,
            platform,
            config,
            initialized: false,
            gate,
            _graphics: PhantomData,
        }
    }

    /// The platform services sessions subscribe to.
    pub fn platform(&self) -> &Arc<P> {
        &self.platform
    }
}

impl<R, P, G> XrSystem for ArCoreSystem<R, P, G>
where
    R: ArRuntime + 'static,
    P: PlatformServices,
    G: GraphicsApi,
{
    type GraphicsContext = Arc<G>;
    type Session = ArCoreSession<R, G>;
    type Gate = ArCoreCapabilityGate<R, P>;

    fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn try_initialize(&mut self) -> XrResult<bool> {
        if self.initialized {
            return Ok(true);
        }
        let availability = self.runtime.check_availability();
        match availability.is_supported() {
            Some(true) => {
                log::info!("AR runtime available ({availability:?}).");
                self.initialized = true;
            }
            Some(false) => log::warn!("AR runtime unavailable on this device ({availability:?})."),
            None => log::debug!("AR availability check still running."),
        }
        Ok(self.initialized)
    }

    fn invalidate_system(&mut self) {
        self.initialized = false;
    }

    fn capabilities(&self) -> SystemCapabilities {
        SystemCapabilities::default()
    }

    fn capability_gate(&self) -> &Self::Gate {
        &self.gate
    }

    fn create_session(&self, graphics: Arc<G>) -> XrResult<ArCoreSession<R, G>> {
        if !self.initialized {
            return Err(XrError::NotInitialized);
        }
        ArCoreSession::new(
            Arc::clone(&self.runtime),
            self.platform.as_ref(),
            graphics,
            &self.config,
        )
    }
}
