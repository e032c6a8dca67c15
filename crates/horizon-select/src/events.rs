//! Widget notifications.
//!
//! Every notification is a [`SelectEvent`] published on one shared
//! [`Signal`]. Components emit through an [`EventSink`], which either invokes
//! the slots immediately or queues the event until the owner calls
//! [`EventSink::flush`]. The [`Select`](crate::Select) facade uses the queued
//! mode and flushes once its internal lock is released, so slots are free to
//! call back into the widget.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use horizon_select_core::Signal;
use horizon_select_core::logging::targets;
use parking_lot::Mutex;

use crate::error::SelectError;
use crate::item::{Entry, Item};
use crate::remote::RequestParams;

/// A notification emitted by the widget.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectEvent {
    /// An item was added to the selection.
    Select {
        /// The selected item.
        item: Item,
    },
    /// An item was removed from the selection.
    Unselect {
        /// The removed item.
        item: Item,
    },
    /// The selection changed; carries the full selection afterwards.
    Change {
        /// Current selection, in order.
        selection: Vec<Item>,
    },
    /// The selection was cleared as a whole.
    Clear,
    /// A multi-selection attempt hit `maximumSelectionLength`.
    SelectionLimitReached {
        /// The configured maximum.
        maximum: usize,
        /// Human-readable message from the language table.
        message: String,
    },
    /// A search was started for `term`.
    Query {
        /// The search term.
        term: String,
    },
    /// A new result list is ready for display.
    Results {
        /// Group-preserving result list.
        results: Vec<Entry>,
    },
    /// The item collection was replaced through `set_data`.
    DataLoaded {
        /// The normalized collection.
        data: Vec<Entry>,
    },
    /// A remote request is about to be dispatched.
    AjaxLoading {
        /// Request parameters.
        params: RequestParams,
    },
    /// A remote request succeeded.
    AjaxSuccess {
        /// Normalized results of the page.
        results: Vec<Entry>,
        /// Request parameters.
        params: RequestParams,
    },
    /// A remote request failed for a reason other than cancellation.
    AjaxError {
        /// The failure.
        error: SelectError,
        /// Request parameters.
        params: RequestParams,
    },
    /// The dropdown opened.
    Open,
    /// The dropdown closed.
    Close,
}

/// Publishing end of the widget's event channel.
#[derive(Clone, Debug)]
pub struct EventSink {
    signal: Arc<Signal<SelectEvent>>,
    queue: Option<Arc<EventQueue>>,
}

#[derive(Debug, Default)]
struct EventQueue {
    pending: Mutex<Vec<SelectEvent>>,
    flushing: AtomicBool,
}

/// Clears the flushing flag however the flush ends.
struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A batch being delivered. Whatever a panicking slot leaves undelivered
/// goes back to the front of the queue.
struct Undelivered<'a> {
    queue: &'a EventQueue,
    rest: std::vec::IntoIter<SelectEvent>,
}

impl Drop for Undelivered<'_> {
    fn drop(&mut self) {
        if self.rest.as_slice().is_empty() {
            return;
        }
        let mut pending = self.queue.pending.lock();
        let queued_later = std::mem::take(&mut *pending);
        pending.extend(self.rest.by_ref());
        pending.extend(queued_later);
    }
}

impl EventSink {
    /// A sink that invokes slots as soon as an event is emitted.
    pub fn direct(signal: Arc<Signal<SelectEvent>>) -> Self {
        Self {
            signal,
            queue: None,
        }
    }

    /// A sink that holds events until [`flush`](Self::flush) is called.
    pub fn queued(signal: Arc<Signal<SelectEvent>>) -> Self {
        Self {
            signal,
            queue: Some(Arc::new(EventQueue::default())),
        }
    }

    /// The underlying signal.
    pub fn signal(&self) -> &Arc<Signal<SelectEvent>> {
        &self.signal
    }

    /// Publish an event.
    pub fn emit(&self, event: SelectEvent) {
        match &self.queue {
            Some(queue) => queue.pending.lock().push(event),
            None => self.signal.emit(event),
        }
    }

    /// Deliver queued events in emission order.
    ///
    /// Events queued by slots while a flush is running are delivered by that
    /// same flush, after the events already pending. A panicking slot
    /// unwinds out of `flush` without disabling later flushes; the events
    /// behind it stay queued for the next one.
    pub fn flush(&self) {
        let Some(queue) = &self.queue else {
            return;
        };

        loop {
            if queue.flushing.swap(true, Ordering::AcqRel) {
                return;
            }
            {
                let _flushing = FlushGuard(&queue.flushing);
                loop {
                    let batch = std::mem::take(&mut *queue.pending.lock());
                    if batch.is_empty() {
                        break;
                    }
                    tracing::trace!(target: targets::SELECT, count = batch.len(), "flushing events");
                    let mut batch = Undelivered {
                        queue,
                        rest: batch.into_iter(),
                    };
                    while let Some(event) = batch.rest.next() {
                        self.signal.emit(event);
                    }
                }
            }

            // Another thread may have queued after the last empty take and
            // backed off because the flag was still set.
            if queue.pending.lock().is_empty() {
                return;
            }
        }
    }

    /// Drop queued events without delivering them.
    pub fn discard(&self) {
        if let Some(queue) = &self.queue {
            queue.pending.lock().clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(signal: &Signal<SelectEvent>) -> Arc<Mutex<Vec<SelectEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        signal.connect(move |event: &SelectEvent| sink.lock().push(event.clone()));
        seen
    }

    #[test]
    fn test_direct_sink_emits_immediately() {
        let signal = Arc::new(Signal::new());
        let seen = recorder(&signal);
        let sink = EventSink::direct(signal);

        sink.emit(SelectEvent::Clear);
        assert_eq!(*seen.lock(), vec![SelectEvent::Clear]);
    }

    #[test]
    fn test_queued_sink_waits_for_flush() {
        let signal = Arc::new(Signal::new());
        let seen = recorder(&signal);
        let sink = EventSink::queued(signal);

        sink.emit(SelectEvent::Open);
        sink.emit(SelectEvent::Clear);
        assert!(seen.lock().is_empty());

        sink.flush();
        assert_eq!(*seen.lock(), vec![SelectEvent::Open, SelectEvent::Clear]);
    }

    #[test]
    fn test_events_queued_during_flush_keep_order() {
        let signal = Arc::new(Signal::new());
        let sink = EventSink::queued(signal.clone());
        let seen = recorder(&signal);

        let reentrant = sink.clone();
        signal.connect(move |event: &SelectEvent| {
            if *event == SelectEvent::Open {
                reentrant.emit(SelectEvent::Close);
                reentrant.flush();
            }
        });

        sink.emit(SelectEvent::Open);
        sink.emit(SelectEvent::Clear);
        sink.flush();

        assert_eq!(
            *seen.lock(),
            vec![SelectEvent::Open, SelectEvent::Clear, SelectEvent::Close]
        );
    }

    #[test]
    fn test_panicking_slot_does_not_mute_later_flushes() {
        let signal = Arc::new(Signal::new());
        let seen = recorder(&signal);
        let sink = EventSink::queued(signal.clone());

        let panicked = Arc::new(AtomicBool::new(false));
        let once = panicked.clone();
        signal.connect(move |event: &SelectEvent| {
            if *event == SelectEvent::Open && !once.swap(true, Ordering::SeqCst) {
                panic!("slot bug");
            }
        });

        sink.emit(SelectEvent::Open);
        sink.emit(SelectEvent::Clear);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.flush()));
        assert!(result.is_err());
        assert_eq!(*seen.lock(), vec![SelectEvent::Open]);

        sink.emit(SelectEvent::Close);
        sink.flush();
        assert_eq!(
            *seen.lock(),
            vec![SelectEvent::Open, SelectEvent::Clear, SelectEvent::Close]
        );
    }

    #[test]
    fn test_flush_from_many_threads_strands_nothing() {
        let signal = Arc::new(Signal::new());
        let seen = recorder(&signal);
        let sink = EventSink::queued(signal);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let sink = sink.clone();
                scope.spawn(move || {
                    for _ in 0..50 {
                        sink.emit(SelectEvent::Clear);
                        sink.flush();
                    }
                });
            }
        });

        assert_eq!(seen.lock().len(), 400);
    }

    #[test]
    fn test_discard() {
        let signal = Arc::new(Signal::new());
        let seen = recorder(&signal);
        let sink = EventSink::queued(signal);

        sink.emit(SelectEvent::Open);
        sink.discard();
        sink.flush();
        assert!(seen.lock().is_empty());
    }
}
