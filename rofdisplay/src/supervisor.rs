//! Scheduler supervisor
//!
//! Owns the single background task and its Idle → Running → Stopping state
//! machine. The task is started lazily on the first client connection and
//! guarded so at most one instance runs per process. Once the stop signal
//! fires the task exits and is NOT restarted automatically: only the next
//! new client connection starts it again. That leaves a frame with no
//! connected browser unscheduled — a known operational gap, kept as-is.

use crate::controller::DisplayPower;
use crate::window::should_display;
use async_trait::async_trait;
use chrono::Timelike;
use rofroon::PlaybackState;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Scheduler tick period
pub const TICK_PERIOD: Duration = Duration::from_secs(600);

/// Where the scheduler reads the current playback state from
///
/// Implementations fold query failures into [`PlaybackState::Unknown`];
/// a tick never fails.
#[async_trait]
pub trait PlaybackSource: Send + Sync {
    async fn playback_state(&self) -> PlaybackState;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorPhase {
    Idle,
    Running,
    Stopping,
}

struct Inner {
    phase: SupervisorPhase,
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// Supervisor for the display scheduler task
#[derive(Clone)]
pub struct DisplaySupervisor {
    inner: Arc<Mutex<Inner>>,
    source: Arc<dyn PlaybackSource>,
    power: Arc<DisplayPower>,
    on_hour: u32,
    off_hour: u32,
    period: Duration,
}

impl DisplaySupervisor {
    pub fn new(
        source: Arc<dyn PlaybackSource>,
        power: Arc<DisplayPower>,
        on_hour: u32,
        off_hour: u32,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                phase: SupervisorPhase::Idle,
                token: CancellationToken::new(),
                handle: None,
            })),
            source,
            power,
            on_hour,
            off_hour,
            period: TICK_PERIOD,
        }
    }

    /// Overrides the tick period (tests)
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn phase(&self) -> SupervisorPhase {
        self.inner.lock().unwrap().phase
    }

    /// Starts the scheduler task if it is not already running
    ///
    /// Returns `true` when a new task was spawned. Called from the push
    /// channel on every client connection; the lock closes the
    /// check-then-start race of the original.
    pub fn ensure_started(&self) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.phase {
            SupervisorPhase::Running | SupervisorPhase::Stopping => false,
            SupervisorPhase::Idle => {
                let token = CancellationToken::new();
                inner.phase = SupervisorPhase::Running;
                inner.token = token.clone();
                inner.handle = Some(tokio::spawn(run_schedule(self.clone(), token)));
                info!("Display scheduler started");
                true
            }
        }
    }

    /// Signals the running task to stop after its current tick
    pub fn stop(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.phase == SupervisorPhase::Running {
            inner.phase = SupervisorPhase::Stopping;
            inner.token.cancel();
        }
    }

    fn mark_idle(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.phase = SupervisorPhase::Idle;
        inner.handle = None;
    }

    async fn tick(&self) {
        let state = self.source.playback_state().await;
        let hour = chrono::Local::now().hour();
        let on = should_display(state, hour, self.on_hour, self.off_hour);
        debug!(state = %state, hour, should_display = on, "scheduler tick");
        self.power.set(on);
    }
}

async fn run_schedule(supervisor: DisplaySupervisor, token: CancellationToken) {
    loop {
        supervisor.tick().await;

        // Stop signal is checked at the top of each wait
        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(supervisor.period) => {}
        }
    }

    supervisor.mark_idle();
    info!("Display scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::NoopDisplay;

    struct FixedSource(PlaybackState);

    #[async_trait]
    impl PlaybackSource for FixedSource {
        async fn playback_state(&self) -> PlaybackState {
            self.0
        }
    }

    fn supervisor(state: PlaybackState, on_hour: u32, off_hour: u32) -> DisplaySupervisor {
        DisplaySupervisor::new(
            Arc::new(FixedSource(state)),
            Arc::new(DisplayPower::new(false, Box::new(NoopDisplay))),
            on_hour,
            off_hour,
        )
        .with_period(Duration::from_millis(20))
    }

    #[tokio::test]
    async fn test_single_instance_guard() {
        let sup = supervisor(PlaybackState::Stopped, 0, 0);
        assert!(sup.ensure_started());
        assert!(!sup.ensure_started());
        assert_eq!(sup.phase(), SupervisorPhase::Running);
        sup.stop();
    }

    #[tokio::test]
    async fn test_stop_then_restart_on_new_connection() {
        let sup = supervisor(PlaybackState::Stopped, 0, 0);
        assert!(sup.ensure_started());
        sup.stop();

        // The task notices the token at its next wait and parks itself
        for _ in 0..50 {
            if sup.phase() == SupervisorPhase::Idle {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sup.phase(), SupervisorPhase::Idle);

        // A fresh client connection may start it again
        assert!(sup.ensure_started());
        sup.stop();
    }

    #[tokio::test]
    async fn test_playing_turns_display_on() {
        let power = Arc::new(DisplayPower::new(false, Box::new(NoopDisplay)));
        // degenerate window: without playback the display would stay off
        let sup = DisplaySupervisor::new(
            Arc::new(FixedSource(PlaybackState::Playing)),
            power.clone(),
            9,
            9,
        )
        .with_period(Duration::from_millis(20));

        sup.ensure_started();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(power.is_on());
        sup.stop();
    }

    #[tokio::test]
    async fn test_stopped_with_degenerate_window_turns_display_off() {
        let power = Arc::new(DisplayPower::new(false, Box::new(NoopDisplay)));
        power.set(true);

        let sup = DisplaySupervisor::new(
            Arc::new(FixedSource(PlaybackState::Stopped)),
            power.clone(),
            9,
            9,
        )
        .with_period(Duration::from_millis(20));

        sup.ensure_started();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!power.is_on());
        sup.stop();
    }
}
