//! [`PollingScheduler`] – the actuator polling loop.
//!
//! `Idle → Running → Idle`.  While running, each tick:
//!
//! 1. **Wait** – sleep for the poll interval (skipped on the first tick,
//!    floored at [`MIN_POLL_INTERVAL`]).
//! 2. **Observe** – sample the [`VehicleState`] and build an
//!    [`Observation`], estimating velocity from the previous sample.
//! 3. **Request** – send the observation through the [`ChatTransport`]
//!    under a [`Deadline`] linked to the loop's stop token.
//! 4. **Decode** – extract and parse the reply into a clamped
//!    [`ActuatorCommand`].
//! 5. **Publish** – write the command into the [`CommandSlot`].
//!
//! Any failure inside a tick is logged and the loop moves on; the vehicle
//! keeps acting on the last published command.  Only [`PollingScheduler::stop`]
//! ends the loop.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use aerollm_hal::{CommandSlot, SimVehicle};
//! use aerollm_runtime::chat_client::EndpointConfig;
//! use aerollm_runtime::scheduler::{PollingScheduler, SchedulerConfig};
//!
//! # async fn demo() {
//! let slot = CommandSlot::new();
//! let mut scheduler = PollingScheduler::with_endpoint(
//!     SchedulerConfig::default(),
//!     EndpointConfig::new("http://localhost:11434/v1"),
//!     Arc::new(SimVehicle::default()),
//!     slot.clone(),
//! );
//! scheduler.start().expect("model configured");
//! // ... the motion integrator reads `slot.current()` every frame ...
//! scheduler.shutdown().await;
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use aerollm_hal::{CommandSlot, CommandSource, VehicleState};
use aerollm_types::observation::estimate_velocity;
use aerollm_types::{ActuatorCommand, CancelReason, Observation, PilotError, Vec3};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::chat_client::{ChatClient, ChatTransport, CompletionRequest, EndpointConfig, Sampling};
use crate::command_parser::parse_reply;
use crate::deadline::Deadline;
use crate::prompt;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Shortest wait between ticks, whatever the configured interval.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`PollingScheduler`].  Supplied once at
/// construction and never changed by the loop.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Model identifier; the loop refuses to start when empty.
    pub model: String,
    pub sampling: Sampling,
    /// Wait between the end of one tick and the start of the next.
    pub poll_interval: Duration,
    /// Per-request timeout, independent of the poll interval.
    pub request_timeout: Duration,
    /// Replaces [`prompt::default_system_prompt`] when set.
    pub system_prompt: Option<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            model: "llama3".to_string(),
            sampling: Sampling::default(),
            poll_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(5),
            system_prompt: None,
        }
    }
}

/// Lifecycle state of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Counters read while the loop runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Ticks that got as far as sampling the vehicle.
    pub ticks: u64,
    /// Ticks that published a command.
    pub published: u64,
    /// Ticks that failed for any reason other than Stop.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct SchedulerStats {
    ticks: AtomicU64,
    published: AtomicU64,
    failed: AtomicU64,
}

impl SchedulerStats {
    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            published: self.published.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tick pipeline
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct PositionSample {
    position: Vec3,
    at: Instant,
}

/// Everything a tick needs, shared between the scheduler handle and the
/// background task.
struct Pipeline {
    config: SchedulerConfig,
    system_prompt: String,
    transport: Arc<dyn ChatTransport>,
    vehicle: Arc<dyn VehicleState>,
    slot: CommandSlot,
    stats: SchedulerStats,
    /// Held for the whole tick, so ticks never overlap.
    last_sample: Mutex<Option<PositionSample>>,
}

impl Pipeline {
    async fn tick(&self, stop: &CancellationToken) -> Result<ActuatorCommand, PilotError> {
        let mut last_sample = self.last_sample.lock().await;
        self.stats.ticks.fetch_add(1, Ordering::Relaxed);

        let result = self.run_tick(&mut last_sample, stop).await;
        match &result {
            Ok(_) => {
                self.stats.published.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) if e.is_stop() => {}
            Err(_) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    async fn run_tick(
        &self,
        last_sample: &mut Option<PositionSample>,
        stop: &CancellationToken,
    ) -> Result<ActuatorCommand, PilotError> {
        // ── Observe ───────────────────────────────────────────────────────────
        let observation = self.observe(last_sample);
        debug!(?observation, "observation built");

        // ── Request ───────────────────────────────────────────────────────────
        let messages = prompt::build_conversation(&self.system_prompt, &observation);
        let request = CompletionRequest {
            model: &self.config.model,
            messages: &messages,
            sampling: self.config.sampling,
        };
        let deadline = Deadline::new(self.config.request_timeout, stop);
        // Enforced here as well: Stop must not wait on a transport that
        // ignores its deadline.
        let reply = deadline
            .run(self.transport.send(&request, &deadline))
            .await?;
        debug!(%reply, "model reply");

        // ── Decode & publish ──────────────────────────────────────────────────
        let command = parse_reply(&reply)?;
        self.slot.publish(command, CommandSource::Model);
        Ok(command)
    }

    fn observe(&self, last_sample: &mut Option<PositionSample>) -> Observation {
        let pose = self.vehicle.pose();
        let now = Instant::now();
        let velocity = match *last_sample {
            Some(prev) => {
                estimate_velocity(prev.position, pose.position, now.duration_since(prev.at))
            }
            None => Vec3::ZERO,
        };
        *last_sample = Some(PositionSample {
            position: pose.position,
            at: now,
        });
        Observation {
            position: pose.position,
            forward: pose.forward,
            up: pose.up,
            velocity,
            last_command: self.slot.current(),
        }
    }
}

async fn run_loop(pipeline: Arc<Pipeline>, stop: CancellationToken) {
    let interval = pipeline.config.poll_interval.max(MIN_POLL_INTERVAL);
    info!(
        model = %pipeline.config.model,
        interval_ms = interval.as_millis() as u64,
        timeout_ms = pipeline.config.request_timeout.as_millis() as u64,
        "polling loop started"
    );

    let mut tick_no: u64 = 0;
    loop {
        if tick_no > 0 {
            tokio::select! {
                () = stop.cancelled() => break,
                () = tokio::time::sleep(interval) => {}
            }
        }
        tick_no += 1;

        let span = info_span!("tick", n = tick_no);
        match pipeline.tick(&stop).instrument(span).await {
            Ok(command) => info!(tick = tick_no, ?command, "command applied"),
            Err(e) if e.is_stop() => break,
            Err(PilotError::Cancelled(CancelReason::Timeout)) => warn!(
                tick = tick_no,
                timeout_ms = pipeline.config.request_timeout.as_millis() as u64,
                "request timed out; keeping previous command"
            ),
            Err(e) => warn!(tick = tick_no, error = %e, "tick failed; keeping previous command"),
        }
    }

    info!(ticks = tick_no, "polling loop stopped");
}

// ─────────────────────────────────────────────────────────────────────────────
// PollingScheduler
// ─────────────────────────────────────────────────────────────────────────────

struct RunningLoop {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the background polling task for one vehicle.
pub struct PollingScheduler {
    pipeline: Arc<Pipeline>,
    running: Option<RunningLoop>,
}

impl PollingScheduler {
    /// Build a scheduler around any [`ChatTransport`].
    pub fn new(
        config: SchedulerConfig,
        transport: Arc<dyn ChatTransport>,
        vehicle: Arc<dyn VehicleState>,
        slot: CommandSlot,
    ) -> Self {
        let system_prompt = config
            .system_prompt
            .clone()
            .unwrap_or_else(prompt::default_system_prompt);
        Self {
            pipeline: Arc::new(Pipeline {
                config,
                system_prompt,
                transport,
                vehicle,
                slot,
                stats: SchedulerStats::default(),
                last_sample: Mutex::new(None),
            }),
            running: None,
        }
    }

    /// Build a scheduler that talks to `endpoint` through a [`ChatClient`].
    pub fn with_endpoint(
        config: SchedulerConfig,
        endpoint: EndpointConfig,
        vehicle: Arc<dyn VehicleState>,
        slot: CommandSlot,
    ) -> Self {
        Self::new(config, Arc::new(ChatClient::new(endpoint)), vehicle, slot)
    }

    /// Start the background loop.  The first tick fires immediately.
    ///
    /// Calling `start` while already running is a no-op.  Must be called
    /// from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PilotError::Configuration`] (and stays idle) when the model
    /// identifier is empty.
    pub fn start(&mut self) -> Result<(), PilotError> {
        if self.state() == SchedulerState::Running {
            debug!("start ignored: polling loop already running");
            return Ok(());
        }
        if self.pipeline.config.model.trim().is_empty() {
            warn!("polling loop not started: model identifier is empty");
            return Err(PilotError::Configuration(
                "model identifier is empty".to_string(),
            ));
        }

        let stop = CancellationToken::new();
        let handle = tokio::spawn(run_loop(Arc::clone(&self.pipeline), stop.clone()));
        self.running = Some(RunningLoop { stop, handle });
        Ok(())
    }

    /// Signal the loop to stop and return immediately.
    ///
    /// Any in-flight request and the inter-tick wait are cancelled; the task
    /// winds down in the background.  Idempotent.
    pub fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.stop.cancel();
            info!("polling loop stop requested");
        }
    }

    /// Stop the loop and wait for the background task to finish.
    pub async fn shutdown(&mut self) {
        if let Some(running) = self.running.take() {
            running.stop.cancel();
            if let Err(e) = running.handle.await {
                warn!(error = %e, "polling task ended abnormally");
            }
        }
    }

    pub fn state(&self) -> SchedulerState {
        match &self.running {
            Some(running) if !running.handle.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Idle,
        }
    }

    /// Run a single tick right now, outside the background loop.
    ///
    /// Waits for any tick already in progress.  Only the request timeout
    /// applies; [`stop`][Self::stop] does not cancel it.  While it runs the
    /// background loop cannot start its next tick, so [`shutdown`][Self::shutdown]
    /// may wait up to `request_timeout` for it to finish.
    ///
    /// # Errors
    ///
    /// Any tick failure; the command slot is left untouched on error.
    pub async fn tick(&self) -> Result<ActuatorCommand, PilotError> {
        if self.pipeline.config.model.trim().is_empty() {
            return Err(PilotError::Configuration(
                "model identifier is empty".to_string(),
            ));
        }
        self.pipeline.tick(&CancellationToken::new()).await
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.pipeline.stats.snapshot()
    }

    /// The slot this scheduler publishes into.
    pub fn slot(&self) -> &CommandSlot {
        &self.pipeline.slot
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.pipeline.config
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
