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

use xrlink_core::config::XrConfig;
use xrlink_core::error::{StatusExt, XrError, XrResult};
use xrlink_core::graphics::GraphicsApiKind;
use xrlink_core::system::{SystemCapabilities, XrSystem};

use super::gate::OpenXrCapabilityGate;
use super::runtime::{
    extensions, BlendMode, FormFactor, GraphicsBinding, InstanceHandle, OpenXrRuntime, SystemId,
};
use super::session::OpenXrSession;

/// A live runtime instance shared by the system and its sessions.
///
/// The instance is destroyed when the last holder drops it, so sessions can
/// safely outlive the [`OpenXrSystem`] that created them.
pub(crate) struct InstanceContext<R: OpenXrRuntime> {
    pub(crate) runtime: Arc<R>,
    pub(crate) handle: InstanceHandle,
    pub(crate) capabilities: SystemCapabilities,
}

impl<R: OpenXrRuntime> Drop for InstanceContext<R> {
    fn drop(&mut self) {
        log::debug!("Destroying XR instance {:?}.", self.handle);
        self.runtime.destroy_instance(self.handle);
    }
}

/// The device acquired in phase two of initialization.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SystemInfo {
    pub(crate) id: SystemId,
    pub(crate) blend_mode: BlendMode,
}

/// Process-wide handle to a generalized stereo runtime.
pub struct OpenXrSystem<R: OpenXrRuntime> {
    runtime: Arc<R>,
    config: XrConfig,
    graphics_api: GraphicsApiKind,
    instance: Option<Arc<InstanceContext<R>>>,
    system: Option<SystemInfo>,
    gate: OpenXrCapabilityGate,
}

impl<R: OpenXrRuntime> OpenXrSystem<R> {
    /// Creates an uninitialized system. Nothing is sent to the runtime until
    /// [`XrSystem::try_initialize`].
    pub fn new(runtime: Arc<R>, config: XrConfig, graphics_api: GraphicsApiKind) -> Self {
        Self {
            runtime,
            config,
            graphics_api,
            instance: None,
            system: None,
            gate: OpenXrCapabilityGate,
        }
    }

    /// The configuration sessions are created with.
    pub fn config(&self) -> &XrConfig {
        &self.config
    }

    fn create_instance(&self) -> XrResult<InstanceContext<R>> {
        let available = self
            .runtime
            .available_extensions()
            .map_err(|status| XrError::InstanceCreation(format!("enumerating extensions: {status}")))?;
        let offered = |name: &str| available.iter().any(|e| e == name);

        let binding = self.graphics_api.binding_extension();
        if !offered(binding) {
            return Err(XrError::UnsupportedGraphics(format!(
                "the runtime does not offer {binding}"
            )));
        }

        let mut enabled = vec![binding];
        for optional in [
            extensions::COMPOSITION_LAYER_DEPTH,
            extensions::UNBOUNDED_REFERENCE_SPACE,
            extensions::SPATIAL_ANCHOR,
        ] {
            if offered(optional) {
                enabled.push(optional);
            }
        }

        let handle = self
            .runtime
            .create_instance(&self.config.application_name, &enabled)
            .map_err(|status| XrError::InstanceCreation(status.to_string()))?;

        let capabilities = SystemCapabilities {
            depth_composition: enabled.contains(&extensions::COMPOSITION_LAYER_DEPTH),
            unbounded_space: enabled.contains(&extensions::UNBOUNDED_REFERENCE_SPACE),
            spatial_anchors: enabled.contains(&extensions::SPATIAL_ANCHOR),
        };
        log::info!(
            "XR instance created for \"{}\" with extensions {:?}.",
            self.config.application_name,
            enabled
        );

        Ok(InstanceContext {
            runtime: Arc::clone(&self.runtime),
            handle,
            capabilities,
        })
    }

    fn acquire_system(&self, instance: &InstanceContext<R>) -> XrResult<Option<SystemInfo>> {
        let id = match self
            .runtime
            .system(instance.handle, FormFactor::HeadMountedDisplay)
        {
            Ok(id) => id,
            Err(status) if status.is_benign() => {
                log::warn!("No head-mounted display available yet ({status}).");
                return Ok(None);
            }
            Err(status) => {
                return Err(XrError::Runtime {
                    call: "xrGetSystem",
                    status,
                })
            }
        };

        let blend_mode = self
            .runtime
            .environment_blend_modes(instance.handle, id, self.config.view_configuration)
            .check("xrEnumerateEnvironmentBlendModes")?
            .first()
            .copied()
            .ok_or(XrError::Runtime {
                call: "xrEnumerateEnvironmentBlendModes",
                status: xrlink_core::RuntimeStatus::ValidationFailure,
            })?;

        log::info!("XR system {id:?} acquired, blend mode {blend_mode:?}.");
        Ok(Some(SystemInfo { id, blend_mode }))
    }
}

impl<R: OpenXrRuntime> XrSystem for OpenXrSystem<R> {
    type GraphicsContext = GraphicsBinding;
    type Session = OpenXrSession<R>;
    type Gate = OpenXrCapabilityGate;

    fn is_initialized(&self) -> bool {
        self.instance.is_some() && self.system.is_some()
    }

    fn try_initialize(&mut self) -> XrResult<bool> {
        if self.is_initialized() {
            return Ok(true);
        }

        let instance = match &self.instance {
            Some(instance) => Arc::clone(instance),
            None => {
                let instance = Arc::new(self.create_instance()?);
                self.instance = Some(Arc::clone(&instance));
                instance
            }
        };

        self.system = self.acquire_system(&instance)?;
        Ok(self.system.is_some())
    }

    fn invalidate_system(&mut self) {
        if let Some(system) = self.system.take() {
            log::info!("Dropping XR system {:?}; it will be queried again.", system.id);
        }
    }

    fn capabilities(&self) -> SystemCapabilities {
        self.instance
            .as_ref()
            .map(|instance| instance.capabilities)
            .unwrap_or_default()
    }

    fn capability_gate(&self) -> &OpenXrCapabilityGate {
        &self.gate
    }

    fn create_session(&self, graphics: GraphicsBinding) -> XrResult<OpenXrSession<R>> {
        let (Some(instance), Some(system)) = (&self.instance, self.system) else {
            return Err(XrError::NotInitialized);
        };
        if graphics.api != self.graphics_api {
            return Err(XrError::UnsupportedGraphics(format!(
                "system was initialized for {:?}, session requested {:?}",
                self.graphics_api, graphics.api
            )));
        }
        OpenXrSession::new(Arc::clone(instance), system, &self.config, graphics)
    }
}
