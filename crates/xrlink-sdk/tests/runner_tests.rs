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

//! Integration tests for `XrRunner` driving both backends against the
//! headless runtimes.

use std::sync::Arc;

use approx::assert_relative_eq;
use xrlink_core::error::CapabilityError;
use xrlink_core::graphics::GraphicsApiKind;
use xrlink_core::math::Extent2D;
use xrlink_core::session::SessionEvent;
use xrlink_core::{PollPolicy, SessionState, SessionType, XrConfig, XrSession};
use xrlink_infra::arcore::ArCoreSystem;
use xrlink_infra::headless::{
    HeadlessArCore, HeadlessArCoreConfig, HeadlessOpenXr, HeadlessOpenXrConfig, HeadlessPlatform,
    PromptAnswer, RecordingGraphics,
};
use xrlink_infra::openxr::{GraphicsBinding, OpenXrSystem};
use xrlink_sdk::{FrameOutcome, XrRunner};

const FAST_RETRY: PollPolicy = PollPolicy::new(3, 1);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn stereo_runner(
    config: HeadlessOpenXrConfig,
) -> (Arc<HeadlessOpenXr>, XrRunner<OpenXrSystem<HeadlessOpenXr>>) {
    init_logging();
    let runtime = Arc::new(HeadlessOpenXr::new(config));
    let system = OpenXrSystem::new(
        Arc::clone(&runtime),
        XrConfig::default(),
        GraphicsApiKind::OpenGlEs,
    );
    let binding = GraphicsBinding {
        api: GraphicsApiKind::OpenGlEs,
        device: 1,
        context: 2,
    };
    (runtime, XrRunner::new(system, binding, FAST_RETRY))
}

type ArRunner = XrRunner<ArCoreSystem<HeadlessArCore, HeadlessPlatform, RecordingGraphics>>;

fn ar_runner(
    platform: HeadlessPlatform,
) -> (Arc<HeadlessArCore>, Arc<RecordingGraphics>, ArRunner) {
    init_logging();
    let platform = Arc::new(platform);
    let runtime = Arc::new(HeadlessArCore::new(HeadlessArCoreConfig::default()));
    let graphics = Arc::new(RecordingGraphics::new(
        GraphicsApiKind::OpenGlEs,
        Extent2D::new(720, 1280),
    ));
    let config = XrConfig {
        availability_poll: PollPolicy::new(5, 1),
        ..XrConfig::default()
    };
    let system = ArCoreSystem::new(Arc::clone(&runtime), platform, config);
    let runner = XrRunner::new(system, Arc::clone(&graphics), FAST_RETRY);
    (runtime, graphics, runner)
}

// ─────────────────────────────────────────────────────────────────────────────
// Stereo backend
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_begin_session_gives_up_after_retry_budget() {
    let (runtime, mut runner) = stereo_runner(HeadlessOpenXrConfig {
        headset_connected: false,
        ..Default::default()
    });

    let result = runner.begin_session(SessionType::ImmersiveVr).await;

    assert!(result.is_err());
    assert!(!runner.has_session());
    let calls = runtime.calls();
    assert_eq!(calls.system_queries, 3, "one query per retry attempt");
    assert_eq!(calls.instances_created, 1);
    assert_eq!(calls.sessions_created, 0);
}

#[tokio::test]
async fn test_unsupported_session_type_is_rejected() {
    let (runtime, mut runner) = stereo_runner(HeadlessOpenXrConfig::default());

    let err = runner
        .begin_session(SessionType::ImmersiveAr)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CapabilityError>(),
        Some(CapabilityError::Unsupported)
    ));
    assert_eq!(runtime.calls().instances_created, 0);
}

#[tokio::test]
async fn test_frames_render_and_present() {
    let (runtime, mut runner) = stereo_runner(HeadlessOpenXrConfig::default());
    runner.begin_session(SessionType::ImmersiveVr).await.unwrap();
    runner.begin_session(SessionType::ImmersiveVr).await.unwrap();
    assert_eq!(runtime.calls().sessions_created, 1, "begin is a no-op when running");

    let mut seen_views = 0;
    for _ in 0..3 {
        let outcome = runner
            .do_frame(|frame| {
                seen_views = frame.views().len();
                assert!(frame.should_render());
                Ok(())
            })
            .unwrap();
        assert_eq!(outcome, FrameOutcome::Rendered);
    }

    assert_eq!(seen_views, 2);
    assert_eq!(runtime.calls().layer_counts(), vec![1, 1, 1]);
    assert_eq!(runtime.outstanding_images(), 0);
}

#[tokio::test]
async fn test_render_error_still_releases_frame() {
    let (runtime, mut runner) = stereo_runner(HeadlessOpenXrConfig::default());
    runner.begin_session(SessionType::ImmersiveVr).await.unwrap();

    let result = runner.do_frame(|_| anyhow::bail!("scene failed to draw"));

    assert!(result.is_err());
    assert_eq!(runtime.outstanding_images(), 0);
    assert_eq!(runtime.calls().layer_counts(), vec![1]);
    assert!(runner.has_session());
}

#[tokio::test]
async fn test_end_session_waits_for_runtime() {
    let (runtime, mut runner) = stereo_runner(HeadlessOpenXrConfig::default());
    runner.begin_session(SessionType::ImmersiveVr).await.unwrap();
    runner.do_frame(|_| Ok(())).unwrap();

    runner.end_session().unwrap();

    assert!(!runner.has_session());
    let calls = runtime.calls();
    assert_eq!(calls.exit_requests, 1);
    assert_eq!(calls.sessions_ended, 1);
    assert_eq!(calls.sessions_destroyed, 1);
    assert_eq!(runner.do_frame(|_| Ok(())).unwrap(), FrameOutcome::NoSession);

    // Ending twice is harmless.
    runner.end_session().unwrap();
}

#[tokio::test]
async fn test_runtime_exit_ends_session() {
    let (runtime, mut runner) = stereo_runner(HeadlessOpenXrConfig::default());
    runner.begin_session(SessionType::ImmersiveVr).await.unwrap();
    runner.do_frame(|_| Ok(())).unwrap();

    runtime.push_event(SessionEvent::StateChanged(SessionState::Exiting));

    assert_eq!(runner.do_frame(|_| Ok(())).unwrap(), FrameOutcome::Ended);
    assert!(!runner.has_session());
    assert_eq!(runtime.calls().sessions_destroyed, 1);
}

#[tokio::test]
async fn test_loss_pending_restarts_session() {
    let (runtime, mut runner) = stereo_runner(HeadlessOpenXrConfig::default());
    runner.begin_session(SessionType::ImmersiveVr).await.unwrap();
    runner.do_frame(|_| Ok(())).unwrap();

    runtime.push_event(SessionEvent::StateChanged(SessionState::LossPending));

    assert_eq!(runner.do_frame(|_| Ok(())).unwrap(), FrameOutcome::Restarted);
    assert!(runner.has_session());
    assert_eq!(runner.do_frame(|_| Ok(())).unwrap(), FrameOutcome::Rendered);

    let calls = runtime.calls();
    assert_eq!(calls.sessions_created, 2);
    assert_eq!(calls.sessions_destroyed, 1);
    assert_eq!(calls.sessions_begun, 2);
    assert_eq!(calls.system_queries, 2, "the device is queried again after a loss");
}

#[tokio::test]
async fn test_loss_pending_waits_for_headset_before_restarting() {
    let (runtime, mut runner) = stereo_runner(HeadlessOpenXrConfig::default());
    runner.begin_session(SessionType::ImmersiveVr).await.unwrap();
    runner.do_frame(|_| Ok(())).unwrap();
    assert_eq!(runtime.calls().system_queries, 1);

    // --- ACT: the headset disappears along with the session ---
    runtime.set_headset_connected(false);
    runtime.push_event(SessionEvent::StateChanged(SessionState::LossPending));

    assert_eq!(runner.do_frame(|_| Ok(())).unwrap(), FrameOutcome::AwaitingSystem);
    assert_eq!(runner.do_frame(|_| Ok(())).unwrap(), FrameOutcome::AwaitingSystem);

    // --- ASSERT: no session is created without a device ---
    assert!(!runner.has_session());
    let calls = runtime.calls();
    assert_eq!(calls.system_queries, 3, "one device query per waiting tick");
    assert_eq!(calls.sessions_created, 1);
    assert_eq!(calls.sessions_destroyed, 1);

    // --- ACT: the headset comes back ---
    runtime.set_headset_connected(true);

    assert_eq!(runner.do_frame(|_| Ok(())).unwrap(), FrameOutcome::Restarted);
    assert_eq!(runner.do_frame(|_| Ok(())).unwrap(), FrameOutcome::Rendered);
    let calls = runtime.calls();
    assert_eq!(calls.system_queries, 4);
    assert_eq!(calls.sessions_created, 2);
    assert_eq!(calls.instances_created, 1, "the instance survives the loss");
}

#[tokio::test]
async fn test_end_session_cancels_pending_restart() {
    let (runtime, mut runner) = stereo_runner(HeadlessOpenXrConfig::default());
    runner.begin_session(SessionType::ImmersiveVr).await.unwrap();
    runtime.set_headset_connected(false);
    runtime.push_event(SessionEvent::StateChanged(SessionState::LossPending));
    assert_eq!(runner.do_frame(|_| Ok(())).unwrap(), FrameOutcome::AwaitingSystem);

    runner.end_session().unwrap();
    runtime.set_headset_connected(true);

    assert_eq!(runner.do_frame(|_| Ok(())).unwrap(), FrameOutcome::NoSession);
    assert_eq!(runtime.calls().sessions_created, 1);
}

#[tokio::test]
async fn test_drop_tears_down_session() {
    let (runtime, mut runner) = stereo_runner(HeadlessOpenXrConfig::default());
    runner.begin_session(SessionType::ImmersiveVr).await.unwrap();
    runner.do_frame(|_| Ok(())).unwrap();

    drop(runner);

    let calls = runtime.calls();
    assert_eq!(calls.sessions_ended, 1);
    assert_eq!(calls.sessions_destroyed, 1);
    assert_eq!(calls.instances_destroyed, 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Camera-AR backend
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ar_session_composites_camera() {
    let (runtime, graphics, mut runner) = ar_runner(HeadlessPlatform::permissive());
    runner.begin_session(SessionType::ImmersiveAr).await.unwrap();
    runner
        .session_mut()
        .expect("session is running")
        .set_depth_range(0.1, 50.0);

    let outcome = runner
        .do_frame(|frame| {
            assert_eq!(frame.views().len(), 1);
            assert_relative_eq!(frame.views()[0].depth_near_z, 0.1);
            let hits = frame.hit_test(&Default::default())?;
            assert_eq!(hits.len(), 0);
            Ok(())
        })
        .unwrap();

    assert_eq!(outcome, FrameOutcome::Rendered);
    assert_eq!(graphics.composites().len(), 1);
    assert_eq!(graphics.swap_count(), 1);
    assert_eq!(runtime.calls().projection_queries, vec![(0.1, 50.0)]);
}

#[tokio::test]
async fn test_ar_permission_denied_blocks_session() {
    let (runtime, _graphics, mut runner) =
        ar_runner(HeadlessPlatform::new(&[], PromptAnswer::Deny));

    let err = runner
        .begin_session(SessionType::ImmersiveAr)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<CapabilityError>(),
        Some(CapabilityError::PermissionDenied { .. })
    ));
    assert_eq!(runtime.calls().sessions_created, 0);
}

#[tokio::test]
async fn test_ar_end_and_drop_release_textures() {
    let (runtime, graphics, mut runner) = ar_runner(HeadlessPlatform::permissive());
    runner.begin_session(SessionType::ImmersiveAr).await.unwrap();
    runner.do_frame(|_| Ok(())).unwrap();
    assert_eq!(
        runner.session().map(|session| session.view_count()),
        Some(1)
    );

    runner.end_session().unwrap();
    assert_eq!(graphics.live_textures(), 0);
    assert_eq!(runtime.calls().sessions_destroyed, 1);

    drop(runner);
    assert_eq!(runtime.calls().sessions_destroyed, 1);
}
