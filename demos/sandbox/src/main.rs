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

// xrlink Sandbox
// Drives a stereo headset session and a camera-AR session end to end against
// the simulated runtimes. Pass a JSON config path to override the defaults.

use std::sync::Arc;

use anyhow::{Context, Result};
use xrlink_core::graphics::GraphicsApiKind;
use xrlink_core::math::{Extent2D, Quaternion, Vec3};
use xrlink_core::session::SessionEvent;
use xrlink_core::SessionState;
use xrlink_infra::arcore::{ArCoreSystem, Availability, HitKind, RawHit};
use xrlink_infra::headless::{
    HeadlessArCore, HeadlessArCoreConfig, HeadlessOpenXr, HeadlessOpenXrConfig, HeadlessPlatform,
    RecordingGraphics,
};
use xrlink_infra::openxr::{GraphicsBinding, OpenXrSystem};
use xrlink_sdk::prelude::*;

const STEREO_FRAMES: u32 = 90;
const HEADSET_OFFLINE_TICKS: u32 = 5;
const AR_FRAMES: u32 = 60;

fn load_config() -> Result<XrConfig> {
    let config = match std::env::args().nth(1) {
        Some(path) => XrConfig::from_json_file(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => XrConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

async fn run_stereo(config: &XrConfig) -> Result<()> {
    log::info!("--- Stereo headset ---");
    let runtime = Arc::new(HeadlessOpenXr::new(HeadlessOpenXrConfig::default()));
    let system = OpenXrSystem::new(Arc::clone(&runtime), config.clone(), GraphicsApiKind::OpenGlEs);
    let binding = GraphicsBinding {
        api: GraphicsApiKind::OpenGlEs,
        device: 1,
        context: 1,
    };
    let mut runner = XrRunner::new(system, binding, config.initialize_retry);
    runner.begin_session(SessionType::ImmersiveVr).await?;

    let loss_tick = STEREO_FRAMES / 2;
    for tick in 0..STEREO_FRAMES {
        if tick == loss_tick {
            // Simulate the headset dropping out mid-run.
            runtime.set_headset_connected(false);
            runtime.push_event(SessionEvent::StateChanged(SessionState::LossPending));
        }
        if tick == loss_tick + HEADSET_OFFLINE_TICKS {
            runtime.set_headset_connected(true);
        }
        let outcome = runner.do_frame(|frame| {
            for (index, view) in frame.views().iter().enumerate() {
                let projection = view.projection_matrix().to_cols_array();
                log::trace!(
                    "View {index}: {}x{} color target, projection {projection:?}",
                    view.color.size.width,
                    view.color.size.height
                );
            }
            for source in frame.input_sources().iter().filter(|s| s.tracked_this_frame) {
                log::trace!(
                    "{:?} controller at {:?}",
                    source.handedness,
                    source.grip_space.position
                );
            }
            Ok(())
        })?;
        if outcome != FrameOutcome::Rendered {
            log::info!("Tick {tick}: {outcome:?}");
        }
    }

    runner.end_session()?;
    let calls = runtime.calls();
    log::info!(
        "Stereo run: {} frames presented, {} sessions created.",
        calls.frames_ended.len(),
        calls.sessions_created
    );
    Ok(())
}

async fn run_camera_ar(config: &XrConfig) -> Result<()> {
    log::info!("--- Camera AR ---");
    let floor = RawHit {
        pose: Pose::new(Vec3::new(0.0, 0.0, -1.5), Quaternion::IDENTITY),
        kind: HitKind::Plane {
            inside_polygon: true,
        },
    };
    let runtime = Arc::new(HeadlessArCore::new(HeadlessArCoreConfig {
        availability: vec![Availability::UnknownChecking, Availability::SupportedInstalled],
        first_image_after: 3,
        hits: vec![floor],
        ..Default::default()
    }));
    let platform = Arc::new(HeadlessPlatform::permissive());
    let graphics = Arc::new(RecordingGraphics::new(
        GraphicsApiKind::OpenGlEs,
        Extent2D::new(1080, 2340),
    ));
    let system = ArCoreSystem::new(Arc::clone(&runtime), Arc::clone(&platform), config.clone());
    let mut runner = XrRunner::new(system, Arc::clone(&graphics), config.initialize_retry);
    runner.begin_session(SessionType::ImmersiveAr).await?;

    for tick in 0..AR_FRAMES {
        match tick {
            20 => graphics.set_surface_size(Extent2D::new(2340, 1080)),
            30 => platform.pause(),
            35 => platform.resume(),
            _ => {}
        }
        runner.do_frame(|frame| {
            if let Some(hit) = frame.hit_test(&Ray::default())?.next() {
                log::trace!("Placing content at {:?}", hit.position);
            }
            Ok(())
        })?;
    }

    runner.end_session()?;
    log::info!(
        "Camera AR run: {} composites, {} buffer swaps, {} textures still live.",
        graphics.composites().len(),
        graphics.swap_count(),
        graphics.live_textures()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    run_stereo(&config).await?;
    run_camera_ar(&config).await?;
    Ok(())
}
