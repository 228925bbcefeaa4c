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

//! Integration tests for the camera-AR install and permission gate.

#![cfg(feature = "arcore")]

use std::sync::Arc;

use xrlink_core::capability::{CapabilityGate, Permission};
use xrlink_core::error::CapabilityError;
use xrlink_core::platform::PlatformServices;
use xrlink_core::session::SessionType;
use xrlink_core::PollPolicy;
use xrlink_infra::arcore::{poll_availability, ArCoreCapabilityGate, Availability};
use xrlink_infra::headless::{HeadlessArCore, HeadlessArCoreConfig, HeadlessPlatform, PromptAnswer};

const FAST_POLL: PollPolicy = PollPolicy::new(10, 1);

/// Helper: a gate over a runtime whose install flow drives `platform`.
fn gate(
    config: HeadlessArCoreConfig,
    platform: HeadlessPlatform,
) -> (
    Arc<HeadlessArCore>,
    Arc<HeadlessPlatform>,
    ArCoreCapabilityGate<HeadlessArCore, HeadlessPlatform>,
) {
    let platform = Arc::new(platform);
    let runtime =
        Arc::new(HeadlessArCore::new(config).with_install_flow(platform.lifecycle().clone()));
    let gate = ArCoreCapabilityGate::new(Arc::clone(&runtime), Arc::clone(&platform), FAST_POLL);
    (runtime, platform, gate)
}

// ─────────────────────────────────────────────────────────────────────────────
// Install
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_failed_install_stops_before_permission() {
    let (runtime, platform, gate) = gate(
        HeadlessArCoreConfig {
            installed: false,
            install_succeeds: false,
            ..Default::default()
        },
        HeadlessPlatform::new(&[Permission::Camera], PromptAnswer::Grant),
    );

    let result = gate.ensure_capability().await;

    assert!(matches!(result, Err(CapabilityError::RuntimeNotInstalled)), "got {result:?}");
    assert_eq!(runtime.calls().install_requests, vec![true, false]);
    assert_eq!(
        platform.permission_requests(),
        0,
        "permission must not be requested without the runtime"
    );
}

#[tokio::test]
async fn test_install_completes_after_resume() {
    let (runtime, platform, gate) = gate(
        HeadlessArCoreConfig {
            installed: false,
            ..Default::default()
        },
        HeadlessPlatform::permissive(),
    );

    gate.ensure_capability().await.unwrap();

    assert_eq!(runtime.calls().install_requests, vec![true, false]);
    assert_eq!(platform.permission_requests(), 0);
}

#[tokio::test]
async fn test_installed_runtime_asks_once() {
    let (runtime, _platform, gate) = gate(HeadlessArCoreConfig::default(), HeadlessPlatform::permissive());

    gate.ensure_capability().await.unwrap();

    assert_eq!(runtime.calls().install_requests, vec![true]);
}

// ─────────────────────────────────────────────────────────────────────────────
// Permission
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_denied_camera_permission() {
    let (_runtime, platform, gate) = gate(
        HeadlessArCoreConfig::default(),
        HeadlessPlatform::new(&[], PromptAnswer::Deny),
    );

    let result = gate.ensure_capability().await;

    assert!(matches!(
        result,
        Err(CapabilityError::PermissionDenied {
            permission: Permission::Camera
        })
    ));
    assert_eq!(platform.permission_requests(), 1);
    assert!(!platform.has_permission(Permission::Camera));
}

#[tokio::test]
async fn test_granted_camera_permission() {
    let (_runtime, platform, gate) = gate(
        HeadlessArCoreConfig::default(),
        HeadlessPlatform::new(&[], PromptAnswer::Grant),
    );

    gate.ensure_capability().await.unwrap();

    assert_eq!(platform.permission_requests(), 1);
    assert!(platform.has_permission(Permission::Camera));

    // Already held: no second prompt.
    gate.ensure_capability().await.unwrap();
    assert_eq!(platform.permission_requests(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Device support
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_support_is_polled_once_and_cached() {
    let (runtime, _platform, gate) = gate(
        HeadlessArCoreConfig {
            availability: vec![
                Availability::UnknownChecking,
                Availability::UnknownChecking,
                Availability::SupportedNotInstalled,
            ],
            ..Default::default()
        },
        HeadlessPlatform::permissive(),
    );

    assert!(gate.is_session_supported(SessionType::ImmersiveAr).await);
    assert!(gate.is_session_supported(SessionType::ImmersiveAr).await);
    assert_eq!(runtime.calls().availability_checks, 3);

    assert!(!gate.is_session_supported(SessionType::ImmersiveVr).await);
    assert!(!gate.is_session_supported(SessionType::Inline).await);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_poll() {
    let (runtime, _platform, gate) = gate(
        HeadlessArCoreConfig {
            availability: vec![Availability::UnknownChecking, Availability::SupportedInstalled],
            ..Default::default()
        },
        HeadlessPlatform::permissive(),
    );

    let (a, b) = tokio::join!(
        gate.is_session_supported(SessionType::ImmersiveAr),
        gate.is_session_supported(SessionType::ImmersiveAr)
    );

    assert!(a && b);
    assert_eq!(runtime.calls().availability_checks, 2);
}

#[tokio::test]
async fn test_unsupported_device_is_cached_too() {
    let (runtime, _platform, gate) = gate(
        HeadlessArCoreConfig {
            availability: vec![Availability::UnsupportedDeviceNotCapable],
            ..Default::default()
        },
        HeadlessPlatform::permissive(),
    );

    assert!(!gate.is_session_supported(SessionType::ImmersiveAr).await);
    assert!(!gate.is_session_supported(SessionType::ImmersiveAr).await);
    assert_eq!(runtime.calls().availability_checks, 1);
}

#[test]
fn test_poll_budget_exhausted_is_unsupported() {
    let runtime = HeadlessArCore::new(HeadlessArCoreConfig {
        availability: vec![Availability::UnknownChecking],
        ..Default::default()
    });

    assert!(!poll_availability(&runtime, PollPolicy::new(3, 1)));
    assert_eq!(runtime.calls().availability_checks, 3);
}
