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

//! Defines the error types shared by every XR backend.
//!
//! Native runtime calls report a [`RuntimeStatus`]. Call sites turn a failing
//! status into an [`XrError::Runtime`] with [`StatusExt::check`], except where
//! the status is benign and the caller is a capability query, in which case it
//! is translated into a plain `false`.

use crate::view::TextureFormatKind;

/// Convenience result type used across the XR contract.
pub type XrResult<T> = Result<T, XrError>;

/// A non-success result code reported by a native XR runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeStatus {
    /// No device of the requested form factor is currently connected.
    FormFactorUnavailable,
    /// The runtime has no system available right now.
    SystemUnavailable,
    /// The runtime service itself is not reachable.
    RuntimeUnavailable,
    /// The runtime instance was lost and must be recreated.
    InstanceLost,
    /// The session was lost and must be recreated.
    SessionLost,
    /// The session is not running (begin has not been called).
    SessionNotRunning,
    /// A call is not valid in the current call order.
    CallOrderInvalid,
    /// A required extension is not supported by the runtime.
    ExtensionNotPresent,
    /// The graphics binding is not usable with this runtime.
    GraphicsDeviceInvalid,
    /// A bounded wait expired.
    TimeoutExpired,
    /// The runtime rejected an argument.
    ValidationFailure,
    /// Any other native failure, carrying the raw code.
    Other(i32),
}

impl RuntimeStatus {
    /// Returns `true` for statuses that mean "not available yet" rather than
    /// "broken": callers may retry later without recreating anything.
    pub fn is_benign(self) -> bool {
        matches!(
            self,
            RuntimeStatus::FormFactorUnavailable
                | RuntimeStatus::SystemUnavailable
                | RuntimeStatus::RuntimeUnavailable
        )
    }
}

impl std::fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeStatus::FormFactorUnavailable => write!(f, "form factor unavailable"),
            RuntimeStatus::SystemUnavailable => write!(f, "system unavailable"),
            RuntimeStatus::RuntimeUnavailable => write!(f, "runtime unavailable"),
            RuntimeStatus::InstanceLost => write!(f, "instance lost"),
            RuntimeStatus::SessionLost => write!(f, "session lost"),
            RuntimeStatus::SessionNotRunning => write!(f, "session not running"),
            RuntimeStatus::CallOrderInvalid => write!(f, "call order invalid"),
            RuntimeStatus::ExtensionNotPresent => write!(f, "extension not present"),
            RuntimeStatus::GraphicsDeviceInvalid => write!(f, "graphics device invalid"),
            RuntimeStatus::TimeoutExpired => write!(f, "timeout expired"),
            RuntimeStatus::ValidationFailure => write!(f, "validation failure"),
            RuntimeStatus::Other(code) => write!(f, "native error {code}"),
        }
    }
}

/// Fatal or propagating errors raised while driving an XR runtime.
#[derive(thiserror::Error, Debug)]
pub enum XrError {
    /// The runtime instance could not be created. Never retried.
    #[error("failed to create the XR instance: {0}")]
    InstanceCreation(String),

    /// A native runtime call returned an unexpected status.
    #[error("runtime call `{call}` failed: {status}")]
    Runtime {
        /// Name of the native call.
        call: &'static str,
        /// The status it returned.
        status: RuntimeStatus,
    },

    /// None of the formats offered by the runtime is acceptable.
    #[error("no supported {kind} swapchain format offered by the runtime")]
    NoSupportedFormat {
        /// Whether the color or the depth format could not be negotiated.
        kind: TextureFormatKind,
    },

    /// The graphics context cannot be used with this runtime.
    #[error("unsupported graphics configuration: {0}")]
    UnsupportedGraphics(String),

    /// An operation needed an initialized system.
    #[error("the XR system is not initialized")]
    NotInitialized,

    /// A view index was out of range.
    #[error("view index {index} out of range ({count} views)")]
    InvalidViewIndex {
        /// The requested index.
        index: usize,
        /// The number of views the session has.
        count: usize,
    },

    /// A bounded wait on the runtime expired.
    #[error("timed out waiting for `{0}`")]
    Timeout(&'static str),

    /// The native session could not be created.
    #[error("failed to create the XR session: {0}")]
    SessionCreation(String),

    /// The graphics boundary reported a failure.
    #[error("graphics error: {0}")]
    Graphics(String),

    /// The configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl XrError {
    /// Returns the runtime status carried by this error, if any.
    pub fn status(&self) -> Option<RuntimeStatus> {
        match self {
            XrError::Runtime { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Converts native call results into [`XrError`]s at the call site.
pub trait StatusExt<T> {
    /// Maps a failing status into [`XrError::Runtime`] tagged with `call`.
    fn check(self, call: &'static str) -> XrResult<T>;
}

impl<T> StatusExt<T> for Result<T, RuntimeStatus> {
    fn check(self, call: &'static str) -> XrResult<T> {
        self.map_err(|status| match status {
            RuntimeStatus::TimeoutExpired => XrError::Timeout(call),
            status => XrError::Runtime { call, status },
        })
    }
}

/// Failure outcomes of the install/permission capability gate.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The runtime package is still not installed after the install flow.
    #[error("the XR runtime is not installed")]
    RuntimeNotInstalled,

    /// The install request itself could not be issued.
    #[error("the XR runtime install request failed: {0}")]
    InstallRequestFailed(String),

    /// The user or platform denied a required permission.
    #[error("permission `{permission}` was denied")]
    PermissionDenied {
        /// The denied permission.
        permission: crate::capability::Permission,
    },

    /// The platform callback source went away before answering.
    #[error("capability check was cancelled")]
    Cancelled,

    /// The runtime cannot provide the requested session type.
    #[error("the requested session type is not supported")]
    Unsupported,
}
