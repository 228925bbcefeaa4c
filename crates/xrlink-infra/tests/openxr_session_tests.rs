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

//! Integration tests for the stereo backend against the headless runtime.
//!
//! Each test drives a real `OpenXrSystem`/`OpenXrSession` pair and asserts on
//! the native calls the headless runtime recorded.

#![cfg(feature = "openxr")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use approx::assert_relative_eq;
use xrlink_core::config::ViewConfiguration;
use xrlink_core::graphics::GraphicsApiKind;
use xrlink_core::session::SessionEvent;
use xrlink_core::view::{Handedness, TextureFormatKind};
use xrlink_core::{SessionState, XrConfig, XrError, XrFrame, XrSession, XrSystem};
use xrlink_infra::headless::{HeadlessOpenXr, HeadlessOpenXrConfig};
use xrlink_infra::openxr::{
    BlendMode, GraphicsBinding, OpenXrRuntime, OpenXrSession, OpenXrSystem, ReferenceSpaceType,
};

fn binding() -> GraphicsBinding {
    GraphicsBinding {
        api: GraphicsApiKind::OpenGlEs,
        device: 1,
        context: 2,
    }
}

fn system_with(
    runtime_config: HeadlessOpenXrConfig,
    config: XrConfig,
) -> (Arc<HeadlessOpenXr>, OpenXrSystem<HeadlessOpenXr>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let runtime = Arc::new(HeadlessOpenXr::new(runtime_config));
    let system = OpenXrSystem::new(Arc::clone(&runtime), config, GraphicsApiKind::OpenGlEs);
    (runtime, system)
}

/// Helper: an initialized system and a freshly created session.
fn session_with(
    runtime_config: HeadlessOpenXrConfig,
) -> (
    Arc<HeadlessOpenXr>,
    OpenXrSystem<HeadlessOpenXr>,
    OpenXrSession<HeadlessOpenXr>,
) {
    let (runtime, mut system) = system_with(runtime_config, XrConfig::default());
    assert!(system.try_initialize().unwrap());
    let session = system.create_session(binding()).unwrap();
    (runtime, system, session)
}

// ─────────────────────────────────────────────────────────────────────────────
// System initialization
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_try_initialize_is_benign_until_headset_connects() {
    let (runtime, mut system) = system_with(
        HeadlessOpenXrConfig {
            headset_connected: false,
            ..Default::default()
        },
        XrConfig::default(),
    );

    assert!(!system.try_initialize().unwrap());
    assert!(!system.is_initialized());

    runtime.set_headset_connected(true);
    assert!(system.try_initialize().unwrap());
    assert!(system.is_initialized());

    let calls = runtime.calls();
    assert_eq!(calls.instances_created, 1, "the instance is created only once");
    assert_eq!(calls.system_queries, 2);

    // Idempotent once initialized.
    assert!(system.try_initialize().unwrap());
    assert_eq!(runtime.calls().system_queries, 2);
}

#[test]
fn test_invalidated_system_is_queried_again() {
    let (runtime, mut system) = system_with(HeadlessOpenXrConfig::default(), XrConfig::default());
    assert!(system.try_initialize().unwrap());

    runtime.set_headset_connected(false);
    system.invalidate_system();

    assert!(!system.is_initialized());
    assert!(matches!(
        system.create_session(binding()),
        Err(XrError::NotInitialized)
    ));
    assert!(!system.try_initialize().unwrap());

    runtime.set_headset_connected(true);
    assert!(system.try_initialize().unwrap());

    let calls = runtime.calls();
    assert_eq!(calls.system_queries, 3);
    assert_eq!(calls.instances_created, 1, "the instance is kept");
    assert_eq!(calls.instances_destroyed, 0);
    assert!(system.capabilities().depth_composition);
}

#[test]
fn test_missing_binding_extension_is_fatal() {
    let (runtime, mut system) = system_with(
        HeadlessOpenXrConfig {
            extensions: vec!["XR_KHR_D3D11_enable".to_string()],
            ..Default::default()
        },
        XrConfig::default(),
    );

    let err = system.try_initialize().unwrap_err();
    assert!(matches!(err, XrError::UnsupportedGraphics(_)), "got {err:?}");
    assert_eq!(runtime.calls().instances_created, 0);
}

#[test]
fn test_optional_extensions_become_capabilities() {
    let (runtime, mut system) = system_with(HeadlessOpenXrConfig::default(), XrConfig::default());
    assert!(!system.capabilities().depth_composition);

    system.try_initialize().unwrap();

    let capabilities = system.capabilities();
    assert!(capabilities.depth_composition);
    assert!(capabilities.unbounded_space);
    assert!(!capabilities.spatial_anchors);
    assert_eq!(runtime.calls().enabled_extensions.len(), 3);
}

#[test]
fn test_create_session_requires_initialization() {
    let (_runtime, system) = system_with(HeadlessOpenXrConfig::default(), XrConfig::default());
    let err = system.create_session(binding()).err().unwrap();
    assert!(matches!(err, XrError::NotInitialized));
}

#[test]
fn test_create_session_rejects_other_graphics_api() {
    let (_runtime, mut system) =
        system_with(HeadlessOpenXrConfig::default(), XrConfig::default());
    system.try_initialize().unwrap();

    let d3d = GraphicsBinding {
        api: GraphicsApiKind::D3D11,
        ..binding()
    };
    let err = system.create_session(d3d).err().unwrap();
    assert!(matches!(err, XrError::UnsupportedGraphics(_)));
}

// ─────────────────────────────────────────────────────────────────────────────
// Session construction
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_session_uses_unbounded_space_when_available() {
    let (runtime, _system, _session) = session_with(HeadlessOpenXrConfig::default());
    assert_eq!(
        runtime.calls().reference_space,
        Some(ReferenceSpaceType::Unbounded)
    );
}

#[test]
fn test_session_falls_back_to_local_space() {
    let (runtime, _system, _session) = session_with(HeadlessOpenXrConfig {
        extensions: vec!["XR_KHR_opengl_es_enable".to_string()],
        ..Default::default()
    });
    assert_eq!(runtime.calls().reference_space, Some(ReferenceSpaceType::Local));
}

#[test]
fn test_swapchains_sized_to_recommendation() {
    let runtime_config = HeadlessOpenXrConfig::default();
    let view_size = runtime_config.view_size;
    let (runtime, _system, session) = session_with(runtime_config);

    assert_eq!(session.view_count(), 2);
    assert_eq!(session.view_size(0).unwrap(), view_size);
    assert_eq!(session.view_size(1).unwrap(), view_size);
    assert!(matches!(
        session.view_size(2),
        Err(XrError::InvalidViewIndex { index: 2, count: 2 })
    ));

    let created = runtime.calls().swapchains_created;
    assert_eq!(created.len(), 4, "one color and one depth swapchain per view");
    assert!(created.iter().all(|info| info.size == view_size));
}

#[test]
fn test_runtime_format_order_wins() {
    let (runtime, mut system) = system_with(
        HeadlessOpenXrConfig {
            // The runtime prefers depth first; only the color order matters.
            swapchain_formats: vec![0x88F0, 0x8C43],
            ..Default::default()
        },
        XrConfig::default(),
    );
    system.try_initialize().unwrap();
    let session = system.create_session(binding()).unwrap();

    let (color, depth) = session.swapchains().next().unwrap();
    assert_eq!(color.native_format(), 0x8C43);
    assert_eq!(depth.native_format(), 0x88F0);
    assert_eq!(runtime.calls().swapchains_created.len(), 4);
}

#[test]
fn test_no_overlapping_depth_format_fails_and_cleans_up() {
    let (runtime, mut system) = system_with(
        HeadlessOpenXrConfig {
            swapchain_formats: vec![0x8C43],
            ..Default::default()
        },
        XrConfig::default(),
    );
    system.try_initialize().unwrap();

    let err = system.create_session(binding()).err().unwrap();
    assert!(matches!(
        err,
        XrError::NoSupportedFormat {
            kind: TextureFormatKind::Depth
        }
    ));

    let calls = runtime.calls();
    assert_eq!(calls.sessions_created, 1);
    assert_eq!(calls.sessions_destroyed, 1);
    assert_eq!(calls.spaces_destroyed, 1);
}

#[test]
fn test_mono_configuration_has_one_view() {
    let config = XrConfig {
        view_configuration: ViewConfiguration::Mono,
        ..XrConfig::default()
    };
    let (_runtime, mut system) = system_with(HeadlessOpenXrConfig::default(), config);
    system.try_initialize().unwrap();
    let mut session = system.create_session(binding()).unwrap();

    assert_eq!(session.view_count(), 1);
    let frame = session.next_frame().unwrap().into_frame().unwrap();
    assert_eq!(frame.views().len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Event processing
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_ready_begins_and_stopping_ends_without_signalling() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());

    // The runtime reports Idle then Ready after creation.
    let next = session.next_frame().unwrap();
    assert!(!next.is_ended());
    drop(next);
    assert_eq!(runtime.calls().sessions_begun, 1);
    assert!(session.state().is_running());

    runtime.push_event(SessionEvent::StateChanged(SessionState::Stopping));
    let next = session.next_frame().unwrap();
    assert!(!next.is_ended(), "stopping alone never ends the session");
    drop(next);
    assert_eq!(runtime.calls().sessions_ended, 1);
    assert!(!session.state().is_running());

    runtime.push_event(SessionEvent::StateChanged(SessionState::Exiting));
    let next = session.next_frame().unwrap();
    assert!(next.is_ended());
    assert!(!next.should_restart());
}

#[test]
fn test_end_signal_is_latched() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());
    session.next_frame().unwrap();

    runtime.push_event(SessionEvent::StateChanged(SessionState::Exiting));
    assert!(session.next_frame().unwrap().is_ended());

    runtime.push_event(SessionEvent::StateChanged(SessionState::Ready));
    for _ in 0..3 {
        assert!(session.next_frame().unwrap().is_ended());
    }
    assert_eq!(runtime.calls().sessions_begun, 1);
}

#[test]
fn test_loss_pending_requests_restart() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());
    session.next_frame().unwrap();

    runtime.push_event(SessionEvent::StateChanged(SessionState::LossPending));
    let next = session.next_frame().unwrap();
    assert!(next.is_ended());
    assert!(next.should_restart());
}

#[test]
fn test_instance_loss_ends_without_restart() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());
    session.next_frame().unwrap();

    runtime.push_event(SessionEvent::InstanceLossPending);
    let next = session.next_frame().unwrap();
    assert!(next.is_ended());
    assert!(!next.should_restart());
}

#[test]
fn test_request_end_session_winds_down() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());
    session.next_frame().unwrap();

    session.request_end_session().unwrap();
    session.request_end_session().unwrap();
    assert_eq!(runtime.calls().exit_requests, 1);

    // Stopping -> native end -> Idle -> Exiting, all in one drain.
    let next = session.next_frame().unwrap();
    assert!(next.is_ended());
    assert_eq!(runtime.calls().sessions_ended, 1);
}

#[test]
fn test_request_end_before_running_ends_immediately() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());

    session.request_end_session().unwrap();

    assert!(session.next_frame().unwrap().is_ended());
    assert_eq!(runtime.calls().exit_requests, 0);
    assert_eq!(session.state(), SessionState::Ended);
}

// ─────────────────────────────────────────────────────────────────────────────
// Frames
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_frame_releases_every_image_and_submits_one_layer() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());

    let frame = session.next_frame().unwrap().into_frame().unwrap();
    assert!(frame.should_render());
    assert_eq!(frame.views().len(), 2);
    assert_eq!(runtime.outstanding_images(), 4);
    frame.end().unwrap();

    assert_eq!(runtime.outstanding_images(), 0);
    let calls = runtime.calls();
    assert_eq!(calls.images_acquired, 4);
    assert_eq!(calls.images_released, 4);
    assert_eq!(calls.layer_counts(), vec![1]);

    let layer = &calls.frames_ended[0].layers[0];
    assert!(layer.blend_source_alpha);
    assert_eq!(layer.views.len(), 2);
    let depth = layer.views[0].depth.expect("depth composition is enabled");
    assert_relative_eq!(depth.min_depth, 0.0);
    assert_relative_eq!(depth.max_depth, 1.0);
}

#[test]
fn test_dropped_frame_releases_too() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());

    {
        let _frame = session.next_frame().unwrap();
    }

    assert_eq!(runtime.outstanding_images(), 0);
    assert_eq!(runtime.calls().layer_counts(), vec![1]);
}

#[test]
fn test_should_render_false_submits_zero_layers() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());
    runtime.set_should_render(false);

    let frame = session.next_frame().unwrap().into_frame().unwrap();
    assert!(!frame.should_render());
    assert!(frame.views().is_empty());
    frame.end().unwrap();

    let calls = runtime.calls();
    assert_eq!(calls.layer_counts(), vec![0]);
    assert_eq!(calls.images_acquired, 0);
    assert_eq!(runtime.outstanding_images(), 0);
}

#[test]
fn test_no_depth_info_without_depth_extension() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig {
        extensions: vec!["XR_KHR_opengl_es_enable".to_string()],
        ..Default::default()
    });

    session.next_frame().unwrap();

    let calls = runtime.calls();
    let layer = &calls.frames_ended[0].layers[0];
    assert!(layer.views.iter().all(|view| view.depth.is_none()));
}

#[test]
fn test_acquire_blocks_until_previous_release() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig {
        images_per_swapchain: 1,
        ..Default::default()
    });
    let color = session.swapchains().next().unwrap().0.handle();

    let frame = session.next_frame().unwrap().into_frame().unwrap();

    let acquired = Arc::new(AtomicBool::new(false));
    let waiter = {
        let runtime = Arc::clone(&runtime);
        let acquired = Arc::clone(&acquired);
        thread::spawn(move || {
            runtime.acquire_swapchain_image(color).unwrap();
            acquired.store(true, Ordering::SeqCst);
            runtime.release_swapchain_image(color).unwrap();
        })
    };

    thread::sleep(Duration::from_millis(100));
    assert!(
        !acquired.load(Ordering::SeqCst),
        "a single-image ring must block while its image is out"
    );

    frame.end().unwrap();
    waiter.join().unwrap();
    assert!(acquired.load(Ordering::SeqCst));

    // The ring is free again for the next frame.
    let frame = session.next_frame().unwrap().into_frame().unwrap();
    assert_eq!(frame.views().len(), 2);
}

#[test]
fn test_depth_range_flows_into_views_and_layer() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());
    session.set_depth_range(0.1, 100.0);

    let frame = session.next_frame().unwrap().into_frame().unwrap();
    assert_relative_eq!(frame.views()[0].depth_near_z, 0.1);
    assert_relative_eq!(frame.views()[1].depth_far_z, 100.0);
    frame.end().unwrap();

    let calls = runtime.calls();
    let depth = calls.frames_ended[0].layers[0].views[1].depth.unwrap();
    assert_relative_eq!(depth.near_z, 0.1);
    assert_relative_eq!(depth.far_z, 100.0);
}

#[test]
fn test_input_sources_follow_controller_tracking() {
    let (_runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());

    let frame = session.next_frame().unwrap().into_frame().unwrap();
    let sources = frame.input_sources();
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0].handedness, Handedness::Left);
    assert_eq!(sources[1].handedness, Handedness::Right);
    assert!(sources.iter().all(|source| source.tracked_this_frame));
    assert_relative_eq!(sources[0].grip_space.position.x, -0.2);
    assert_ne!(sources[0].id, sources[1].id);
}

#[test]
fn test_untracked_controllers_are_flagged() {
    let (_runtime, _system, mut session) = session_with(HeadlessOpenXrConfig {
        controllers_tracked: false,
        ..Default::default()
    });

    let frame = session.next_frame().unwrap().into_frame().unwrap();
    assert!(frame
        .input_sources()
        .iter()
        .all(|source| !source.tracked_this_frame));
}

#[test]
fn test_first_blend_mode_is_submitted() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig {
        blend_modes: vec![BlendMode::AlphaBlend, BlendMode::Opaque],
        ..Default::default()
    });
    assert_eq!(session.blend_mode(), BlendMode::AlphaBlend);

    session.next_frame().unwrap();

    assert_eq!(runtime.calls().frames_ended[0].blend_mode, BlendMode::AlphaBlend);
}

#[test]
fn test_hit_test_is_empty_on_stereo_runtimes() {
    let (_runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());
    let frame = session.next_frame().unwrap().into_frame().unwrap();
    assert_eq!(frame.hit_test(&Default::default()).unwrap().count(), 0);
}

#[test]
fn test_teardown_destroys_native_objects() {
    let (runtime, system, session) = session_with(HeadlessOpenXrConfig::default());

    drop(system);
    assert_eq!(
        runtime.calls().instances_destroyed,
        0,
        "the session keeps the instance alive"
    );

    drop(session);
    let calls = runtime.calls();
    assert_eq!(calls.swapchains_destroyed, 4);
    assert_eq!(calls.spaces_destroyed, 1);
    assert_eq!(calls.sessions_destroyed, 1);
    assert_eq!(calls.instances_destroyed, 1);
}

#[test]
fn test_stopped_session_gives_idle_frames_without_frame_calls() {
    let (runtime, _system, mut session) = session_with(HeadlessOpenXrConfig::default());
    // Drain Idle and Ready so the session runs, then stop it.
    session.next_frame().unwrap();
    runtime.push_event(SessionEvent::StateChanged(SessionState::Stopping));

    let frame = session.next_frame().unwrap().into_frame().unwrap();
    assert!(!frame.should_render());
    frame.end().unwrap();

    let calls = runtime.calls();
    assert_eq!(calls.frames_waited, 1);
    assert_eq!(calls.layer_counts(), vec![1]);
}
