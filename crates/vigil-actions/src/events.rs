//! Run events and notifiers.
//!
//! Events are emitted while a run executes so callers can show progress,
//! record what was skipped, or forward them elsewhere.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted by the run pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
  /// A validation was suppressed by the skip list.
  ValidationSkipped {
    validation: String,
    hosts: String,
    reason: Option<String>,
    lp: Option<String>,
  },

  /// A validation was handed to the runner.
  ValidationStarted {
    validation: String,
    uuid: String,
    limit_hosts: Option<String>,
  },

  /// The runner returned for a validation.
  ValidationCompleted {
    validation: String,
    uuid: String,
    rc_code: Option<i32>,
    status: String,
  },

  /// Every selected validation was executed or skipped.
  RunCompleted { executed: usize, skipped: usize },
}

/// Receives run events.
pub trait RunNotifier: Send + Sync {
  fn notify(&self, event: RunEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl RunNotifier for NoopNotifier {
  fn notify(&self, _event: RunEvent) {}
}

/// Sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<RunEvent>) -> Self {
    Self { sender }
  }
}

impl RunNotifier for ChannelNotifier {
  fn notify(&self, event: RunEvent) {
    // Receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
