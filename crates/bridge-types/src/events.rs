//! Status events and transfer counters for the display collaborator.
//!
//! The executor and scheduler report progress through a [`StatusSink`]
//! rather than rendering anything themselves; the service binary decides
//! how events are presented. Counters are atomic so the background refresh
//! task can read them while a transfer is in flight.

use std::sync::atomic::{AtomicU64, Ordering};

/// Classification of a status event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
	/// A transfer is starting.
	Send,
	/// General progress information.
	Info,
	/// Fee and transaction-value details.
	Gas,
	/// A transaction was submitted and is awaiting inclusion.
	Pending,
	/// A transfer step succeeded.
	Success,
	/// A non-fatal advisory condition.
	Warning,
	/// A transfer failed.
	Error,
	/// A whole run finished.
	Completed,
}

/// One structured status event.
#[derive(Debug, Clone)]
pub struct StatusEvent {
	pub kind: StatusKind,
	pub message: String,
}

impl StatusEvent {
	pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
		}
	}
}

/// Receiver of status events.
///
/// Implemented by the service binary; library crates only emit.
pub trait StatusSink: Send + Sync {
	fn emit(&self, event: StatusEvent);
}

/// Pending/completed/failed transfer counters.
///
/// Shared between the executor and the display collaborator.
#[derive(Debug, Default)]
pub struct TransferStats {
	pending: AtomicU64,
	completed: AtomicU64,
	failed: AtomicU64,
}

impl TransferStats {
	pub fn new() -> Self {
		Self::default()
	}

	/// Marks a transfer as submitted and awaiting confirmation.
	pub fn begin_pending(&self) {
		self.pending.fetch_add(1, Ordering::Relaxed);
	}

	/// Marks a pending transfer as confirmed.
	pub fn record_completed(&self) {
		let _ = self
			.pending
			.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |p| {
				Some(p.saturating_sub(1))
			});
		self.completed.fetch_add(1, Ordering::Relaxed);
	}

	/// Marks a transfer as failed. Clears any pending mark it held.
	pub fn record_failed(&self) {
		let _ = self
			.pending
			.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |p| {
				Some(p.saturating_sub(1))
			});
		self.failed.fetch_add(1, Ordering::Relaxed);
	}

	pub fn pending(&self) -> u64 {
		self.pending.load(Ordering::Relaxed)
	}

	pub fn completed(&self) -> u64 {
		self.completed.load(Ordering::Relaxed)
	}

	pub fn failed(&self) -> u64 {
		self.failed.load(Ordering::Relaxed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn pending_never_underflows() {
		let stats = TransferStats::new();
		stats.record_failed();
		assert_eq!(stats.pending(), 0);
		assert_eq!(stats.failed(), 1);
	}

	#[test]
	fn completed_clears_pending() {
		let stats = TransferStats::new();
		stats.begin_pending();
		assert_eq!(stats.pending(), 1);
		stats.record_completed();
		assert_eq!(stats.pending(), 0);
		assert_eq!(stats.completed(), 1);
	}
}
