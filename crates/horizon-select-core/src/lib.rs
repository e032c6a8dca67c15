//! Core systems for Horizon Select.
//!
//! This crate provides the foundational pieces the selection engine is built on:
//!
//! - **Signal/Slot System**: Type-safe publish/subscribe notification
//! - **Timer Queue**: One-shot deadlines with cancellation, driven by explicit time
//! - **Logging**: `tracing` target names for every subsystem
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_select_core::Signal;
//!
//! // Create a signal that notifies when a term changes
//! let term_changed = Signal::<String>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = term_changed.connect(|term| {
//!     println!("Searching for: {}", term);
//! });
//!
//! // Emit the signal
//! term_changed.emit("caf".to_string());
//!
//! // Disconnect when done
//! term_changed.disconnect(conn_id);
//! ```
//!
//! # Timer Example
//!
//! ```
//! use horizon_select_core::TimerQueue;
//! use std::time::{Duration, Instant};
//!
//! let mut timers = TimerQueue::new();
//! let start = Instant::now();
//! let id = timers.schedule(start, Duration::from_secs(3), "dismiss");
//!
//! assert!(timers.expire(start + Duration::from_secs(1)).is_empty());
//! let fired = timers.expire(start + Duration::from_secs(3));
//! assert_eq!(fired, vec![(id, "dismiss")]);
//! ```

mod error;
pub mod logging;
pub mod signal;
mod timer;

pub use error::{CoreError, Result, TimerError};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use timer::{TimerId, TimerQueue};
