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

//! Drives one backend's session through begin, per-tick frames, and end.

use anyhow::{bail, Context, Result};
use xrlink_core::capability::CapabilityGate;
use xrlink_core::error::CapabilityError;
use xrlink_core::{NextFrame, PollPolicy, SessionType, XrFrame, XrResult, XrSession, XrSystem};

/// What a call to [`XrRunner::do_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was produced, handed to the callback, and presented.
    Rendered,
    /// The session ended; the runner no longer holds one.
    Ended,
    /// The session was lost and a new one was created in its place.
    Restarted,
    /// The session was lost and no compatible device is available yet. The
    /// runner queries again on the next call.
    AwaitingSystem,
    /// There was no session to drive.
    NoSession,
}

/// Owns a system and at most one session created from it.
pub struct XrRunner<S: XrSystem> {
    system: S,
    graphics: S::GraphicsContext,
    initialize_retry: PollPolicy,
    session: Option<S::Session>,
    restart_pending: bool,
}

impl<S> XrRunner<S>
where
    S: XrSystem,
    S::GraphicsContext: Clone,
{
    /// Creates a runner. `initialize_retry` bounds how long
    /// [`XrRunner::begin_session`] waits for the runtime to become available.
    pub fn new(system: S, graphics: S::GraphicsContext, initialize_retry: PollPolicy) -> Self {
        Self {
            system,
            graphics,
            initialize_retry,
            session: None,
            restart_pending: false,
        }
    }

    /// The underlying system.
    pub fn system(&self) -> &S {
        &self.system
    }

    /// The current session, if any.
    pub fn session(&self) -> Option<&S::Session> {
        self.session.as_ref()
    }

    /// The current session, if any.
    pub fn session_mut(&mut self) -> Option<&mut S::Session> {
        self.session.as_mut()
    }

    /// Whether a session is currently held.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Starts a session of `session_type`.
    ///
    /// Passes the capability gate, retries initialization under the runner's
    /// retry policy, then creates the session. Does nothing when a session is
    /// already running.
    pub async fn begin_session(&mut self, session_type: SessionType) -> Result<()> {
        if self.session.is_some() {
            log::debug!("begin_session called with a session already running.");
            return Ok(());
        }

        let gate = self.system.capability_gate();
        if !gate.is_session_supported(session_type).await {
            return Err(CapabilityError::Unsupported)
                .with_context(|| format!("{session_type:?} sessions are not supported"));
        }
        gate.ensure_capability()
            .await
            .context("the runtime is not ready for a session")?;

        self.initialize().await?;

        let session = self
            .system
            .create_session(self.graphics.clone())
            .context("failed to create the XR session")?;
        log::info!("{session_type:?} session started.");
        self.session = Some(session);
        self.restart_pending = false;
        Ok(())
    }

    async fn initialize(&mut self) -> Result<()> {
        let policy = self.initialize_retry;
        for attempt in 1..=policy.attempts {
            if self
                .system
                .try_initialize()
                .context("XR system initialization failed")?
            {
                return Ok(());
            }
            if attempt < policy.attempts {
                log::debug!(
                    "XR system not available yet (attempt {attempt}/{}).",
                    policy.attempts
                );
                tokio::time::sleep(policy.interval()).await;
            }
        }
        bail!(
            "XR system still unavailable after {} attempts",
            policy.attempts
        )
    }

    /// Runs one tick: gets the next frame, lets `render` fill it, presents it.
    ///
    /// When the session reports its end, the runner drops it. If the runtime
    /// asked for a restart, the device is queried again and a fresh session is
    /// created once one is available; until then each call reports
    /// [`FrameOutcome::AwaitingSystem`]. A failing `render` still releases and
    /// presents the frame.
    pub fn do_frame<F>(&mut self, render: F) -> Result<FrameOutcome>
    where
        F: FnOnce(&dyn XrFrame) -> Result<()>,
    {
        let Some(session) = self.session.as_mut() else {
            if self.restart_pending {
                return self.recreate_after_loss();
            }
            return Ok(FrameOutcome::NoSession);
        };

        let restart = match session.next_frame()? {
            NextFrame::Frame(frame) => {
                render(&frame)?;
                frame.end()?;
                return Ok(FrameOutcome::Rendered);
            }
            NextFrame::Ended { restart } => restart,
        };

        self.session = None;
        if !restart {
            log::info!("XR session ended.");
            return Ok(FrameOutcome::Ended);
        }

        log::warn!("XR session lost; looking for a new system.");
        self.system.invalidate_system();
        self.restart_pending = true;
        self.recreate_after_loss()
    }

    fn recreate_after_loss(&mut self) -> Result<FrameOutcome> {
        if !self
            .system
            .try_initialize()
            .context("XR system initialization failed")?
        {
            return Ok(FrameOutcome::AwaitingSystem);
        }

        let session = self
            .system
            .create_session(self.graphics.clone())
            .context("failed to recreate the XR session")?;
        log::info!("XR session recreated after loss.");
        self.session = Some(session);
        self.restart_pending = false;
        Ok(FrameOutcome::Restarted)
    }

    /// Ends the current session and waits for the runtime to confirm it,
    /// presenting empty frames in the meantime.
    pub fn end_session(&mut self) -> Result<()> {
        self.restart_pending = false;
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        let burned = wind_down(&mut session)?;
        log::info!("XR session ended after {burned} wind-down frame(s).");
        Ok(())
    }
}

impl<S: XrSystem> Drop for XrRunner<S> {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            if let Err(err) = wind_down(&mut session) {
                log::error!("XR session teardown failed: {err}");
            }
        }
    }
}

/// Requests the end of `session` and presents frames until it reports the end.
/// Returns how many frames that took.
fn wind_down<T: XrSession>(session: &mut T) -> XrResult<u32> {
    session.request_end_session()?;
    let mut burned = 0;
    loop {
        match session.next_frame()? {
            NextFrame::Frame(frame) => {
                frame.end()?;
                burned += 1;
            }
            NextFrame::Ended { .. } => return Ok(burned),
        }
    }
}
