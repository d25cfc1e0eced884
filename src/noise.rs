//! Classroom noise monitor.
//!
//! Microphone capture lives in the browser; clients push the raw analyser
//! average (0..255) over the WebSocket. The server side owns the long-lived
//! evaluation loop: on every tick it reads the *current* sensitivity (never a
//! value captured when the loop started), normalizes the latest sample to a
//! 0..100 level, and publishes `{is_loud, level}` on a watch channel that WS
//! handlers forward to their clients.
//!
//! Threshold = 100 - sensitivity, sensitivity clamped to [1, 95].
//! Stopping resets the published state to quiet and drops the buffered
//! sample; capture/permission errors are the client's to report and only get
//! logged here.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// Evaluation cadence. Mirrors a display-refresh interval (~60 Hz).
const TICK: Duration = Duration::from_millis(16);

pub const MIN_SENSITIVITY: u8 = 1;
pub const MAX_SENSITIVITY: u8 = 95;

/// What subscribers see on every change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NoiseStatus {
  #[serde(rename = "isLoud")]
  pub is_loud: bool,
  /// Normalized loudness in 0..=100.
  pub level: u8,
}

/// Normalize a raw analyser average (0..255) to a 0..100 level.
/// Scaled by 2 to match typical mic input, capped at 100.
pub fn normalize_level(raw_average: f32) -> u8 {
  let scaled = (raw_average / 255.0) * 200.0;
  scaled.round().clamp(0.0, 100.0) as u8
}

/// Loudness verdict for a normalized level under the given sensitivity.
pub fn evaluate(level: u8, sensitivity: u8) -> NoiseStatus {
  let threshold = 100u8.saturating_sub(sensitivity);
  NoiseStatus { is_loud: level > threshold, level }
}

pub fn clamp_sensitivity(value: u8) -> u8 {
  value.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY)
}

/// Shared monitor handle. Cheap to clone; the evaluation task runs for the
/// lifetime of the process and idles when no sample is buffered.
#[derive(Clone)]
pub struct NoiseMonitor {
  sensitivity: Arc<AtomicU8>,
  latest: Arc<Mutex<Option<f32>>>,
  status_tx: watch::Sender<NoiseStatus>,
}

impl NoiseMonitor {
  /// Spawn the evaluation loop and return the handle.
  pub fn spawn(default_sensitivity: u8) -> Self {
    let (status_tx, _) = watch::channel(NoiseStatus::default());
    let monitor = Self {
      sensitivity: Arc::new(AtomicU8::new(clamp_sensitivity(default_sensitivity))),
      latest: Arc::new(Mutex::new(None)),
      status_tx,
    };

    let loop_handle = monitor.clone();
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(TICK);
      loop {
        ticker.tick().await;
        loop_handle.evaluate_tick();
      }
    });

    info!(target: "noise", sensitivity = monitor.sensitivity(), "Noise monitor running");
    monitor
  }

  /// One evaluation step: latest sample + current sensitivity -> status.
  /// Reading the sensitivity here (not at loop start) is what keeps a
  /// mid-flight slider change effective on the very next tick.
  fn evaluate_tick(&self) {
    // Publishing under the sample lock keeps ticks ordered w.r.t. stop().
    let guard = self.latest.lock().unwrap_or_else(|e| e.into_inner());
    let Some(raw) = *guard else { return };
    let sensitivity = self.sensitivity.load(Ordering::Relaxed);
    let status = evaluate(normalize_level(raw), sensitivity);
    // send_if_modified keeps the channel quiet while the level is stable.
    self.status_tx.send_if_modified(|current| {
      if *current == status {
        false
      } else {
        *current = status;
        true
      }
    });
  }

  /// Buffer the newest raw sample; the next tick evaluates it.
  pub fn ingest_sample(&self, raw_average: f32) {
    if !raw_average.is_finite() || raw_average < 0.0 {
      warn!(target: "noise", raw_average, "Discarding invalid noise sample");
      return;
    }
    *self.latest.lock().unwrap_or_else(|e| e.into_inner()) = Some(raw_average);
  }

  /// Update sensitivity (clamped). Takes effect on the next tick.
  #[instrument(level = "debug", skip(self))]
  pub fn set_sensitivity(&self, value: u8) {
    let clamped = clamp_sensitivity(value);
    if clamped != value {
      debug!(target: "noise", value, clamped, "Sensitivity clamped");
    }
    self.sensitivity.store(clamped, Ordering::Relaxed);
  }

  pub fn sensitivity(&self) -> u8 {
    self.sensitivity.load(Ordering::Relaxed)
  }

  /// Stop sampling: drop the buffered sample and publish quiet. The client
  /// releases the microphone on its side; this resets ours deterministically.
  #[instrument(level = "info", skip(self))]
  pub fn stop(&self) {
    let mut guard = self.latest.lock().unwrap_or_else(|e| e.into_inner());
    *guard = None;
    let _ = self.status_tx.send(NoiseStatus::default());
    drop(guard);
    info!(target: "noise", "Noise monitor stopped; state reset to quiet");
  }

  pub fn subscribe(&self) -> watch::Receiver<NoiseStatus> {
    self.status_tx.subscribe()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn threshold_is_one_hundred_minus_sensitivity() {
    // Sensitivity 65 => threshold 35.
    assert!(evaluate(40, 65).is_loud);
    assert!(!evaluate(30, 65).is_loud);
    assert!(!evaluate(35, 65).is_loud, "level must exceed the threshold");
  }

  #[test]
  fn normalization_caps_at_one_hundred() {
    assert_eq!(normalize_level(0.0), 0);
    assert_eq!(normalize_level(255.0), 100);
    assert_eq!(normalize_level(51.0), 40);
    assert_eq!(normalize_level(200.0), 100);
  }

  #[test]
  fn sensitivity_is_clamped_to_valid_range() {
    assert_eq!(clamp_sensitivity(0), 1);
    assert_eq!(clamp_sensitivity(100), 95);
    assert_eq!(clamp_sensitivity(65), 65);
  }

  #[tokio::test]
  async fn loop_reads_latest_sensitivity_each_tick() {
    let monitor = NoiseMonitor::spawn(65);
    let mut status = monitor.subscribe();

    // 51 raw -> level 40 -> loud at threshold 35.
    monitor.ingest_sample(51.0);
    loop {
      status.changed().await.unwrap();
      let s = *status.borrow();
      if s.is_loud {
        assert_eq!(s.level, 40);
        break;
      }
    }

    // Dropping sensitivity mid-run must quiet the very same level.
    monitor.set_sensitivity(40); // threshold 60 > 40
    monitor.ingest_sample(51.5); // nudge so the status changes
    loop {
      status.changed().await.unwrap();
      if !status.borrow().is_loud {
        break;
      }
    }
  }

  #[tokio::test]
  async fn stop_resets_to_quiet() {
    let monitor = NoiseMonitor::spawn(90);
    let mut status = monitor.subscribe();
    monitor.ingest_sample(200.0);
    loop {
      status.changed().await.unwrap();
      if status.borrow().is_loud {
        break;
      }
    }
    monitor.stop();
    loop {
      status.changed().await.unwrap();
      let s = *status.borrow();
      if !s.is_loud {
        assert_eq!(s.level, 0);
        break;
      }
    }
  }
}
