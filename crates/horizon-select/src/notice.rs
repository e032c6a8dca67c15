//! Inline status messages.
//!
//! The dropdown shows short messages next to the result list: the selection
//! limit, a failed request, a "loading more" indicator, and static states
//! such as "no results". Timed messages are driven by a [`TimerQueue`]; the
//! board never reads the clock, so callers pass `now` to every operation.
//!
//! # Example
//!
//! ```
//! use std::time::{Duration, Instant};
//! use horizon_select::notice::{NoticeBoard, NoticeKind};
//!
//! let mut board = NoticeBoard::new();
//! let start = Instant::now();
//!
//! board.post(NoticeKind::SelectionLimit, "You can only select 2 items", start);
//! assert_eq!(board.active().len(), 1);
//!
//! board.tick(start + Duration::from_secs(3));
//! assert!(board.active().is_empty());
//! ```

use std::time::{Duration, Instant};

use horizon_select_core::logging::targets;
use horizon_select_core::{TimerId, TimerQueue};

/// What a notice reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    /// The selection limit was hit.
    SelectionLimit,
    /// A remote request failed.
    Error,
    /// Another page is being fetched.
    LoadingMore,
    /// The search produced nothing.
    NoResults,
    /// The term is shorter than the minimum.
    InputTooShort,
    /// The term is longer than the maximum.
    InputTooLong,
    /// A remote search is in flight.
    Searching,
}

impl NoticeKind {
    /// How long the notice stays before dismissing itself.
    pub fn lifetime(self) -> Option<Duration> {
        match self {
            Self::SelectionLimit => Some(Duration::from_secs(3)),
            Self::Error => Some(Duration::from_secs(5)),
            _ => None,
        }
    }

    /// Minimum time the notice stays visible once posted.
    pub fn minimum_visible(self) -> Option<Duration> {
        match self {
            Self::LoadingMore => Some(Duration::from_millis(500)),
            _ => None,
        }
    }
}

/// A message on display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    /// What the message reports.
    pub kind: NoticeKind,
    /// Text from the language table.
    pub message: String,
}

#[derive(Debug)]
struct Posted {
    notice: Notice,
    posted_at: Instant,
    timer: Option<TimerId>,
}

/// The set of messages currently on display, at most one per kind.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    posted: Vec<Posted>,
    timers: TimerQueue<NoticeKind>,
}

impl NoticeBoard {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `message` for `kind`.
    ///
    /// A kind that is already showing gets the new message and a fresh timer.
    pub fn post(&mut self, kind: NoticeKind, message: impl Into<String>, now: Instant) {
        self.remove(kind);

        let timer = kind
            .lifetime()
            .map(|lifetime| self.timers.schedule(now, lifetime, kind));
        let message = message.into();
        tracing::debug!(target: targets::SELECT, ?kind, %message, "notice posted");
        self.posted.push(Posted {
            notice: Notice { kind, message },
            posted_at: now,
            timer,
        });
    }

    /// Take down `kind`.
    ///
    /// A notice with a minimum visible time that has not elapsed yet stays up
    /// until the window closes.
    pub fn dismiss(&mut self, kind: NoticeKind, now: Instant) {
        let Some(posted) = self.posted.iter_mut().find(|p| p.notice.kind == kind) else {
            return;
        };

        if let Some(minimum) = kind.minimum_visible() {
            let visible_until = posted.posted_at + minimum;
            if now < visible_until {
                if posted.timer.is_none() {
                    posted.timer =
                        Some(self.timers.schedule(now, visible_until - now, kind));
                }
                return;
            }
        }

        self.remove(kind);
    }

    /// Fire due timers, removing their notices.
    pub fn tick(&mut self, now: Instant) {
        for (id, kind) in self.timers.expire(now) {
            if let Some(index) = self.posted.iter().position(|p| p.timer == Some(id)) {
                self.posted.remove(index);
                tracing::debug!(target: targets::SELECT, ?kind, "notice expired");
            }
        }
    }

    /// Earliest pending deadline, for hosts that schedule their own wake-ups.
    pub fn next_deadline(&mut self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Whether `kind` is on display.
    pub fn is_active(&self, kind: NoticeKind) -> bool {
        self.posted.iter().any(|p| p.notice.kind == kind)
    }

    /// Messages on display, oldest first.
    pub fn active(&self) -> Vec<Notice> {
        self.posted.iter().map(|p| p.notice.clone()).collect()
    }

    /// Take down everything and cancel every timer.
    pub fn clear(&mut self) {
        self.posted.clear();
        self.timers.clear();
    }

    fn remove(&mut self, kind: NoticeKind) {
        if let Some(index) = self.posted.iter().position(|p| p.notice.kind == kind) {
            let posted = self.posted.remove(index);
            if let Some(timer) = posted.timer {
                let _ = self.timers.cancel(timer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(board: &NoticeBoard) -> Vec<NoticeKind> {
        board.active().into_iter().map(|n| n.kind).collect()
    }

    #[test]
    fn test_limit_dismisses_after_three_seconds() {
        let mut board = NoticeBoard::new();
        let start = Instant::now();
        board.post(NoticeKind::SelectionLimit, "limit", start);

        board.tick(start + Duration::from_millis(2999));
        assert!(board.is_active(NoticeKind::SelectionLimit));

        board.tick(start + Duration::from_secs(3));
        assert!(!board.is_active(NoticeKind::SelectionLimit));
    }

    #[test]
    fn test_error_dismisses_after_five_seconds() {
        let mut board = NoticeBoard::new();
        let start = Instant::now();
        board.post(NoticeKind::Error, "failed", start);

        board.tick(start + Duration::from_secs(4));
        assert!(board.is_active(NoticeKind::Error));
        board.tick(start + Duration::from_secs(5));
        assert!(board.active().is_empty());
    }

    #[test]
    fn test_repost_restarts_timer() {
        let mut board = NoticeBoard::new();
        let start = Instant::now();
        board.post(NoticeKind::SelectionLimit, "first", start);
        board.post(
            NoticeKind::SelectionLimit,
            "second",
            start + Duration::from_secs(2),
        );

        board.tick(start + Duration::from_secs(3));
        assert_eq!(board.active()[0].message, "second");

        board.tick(start + Duration::from_secs(5));
        assert!(board.active().is_empty());
    }

    #[test]
    fn test_loading_more_minimum_visible() {
        let mut board = NoticeBoard::new();
        let start = Instant::now();
        board.post(NoticeKind::LoadingMore, "Loading more results…", start);

        board.dismiss(NoticeKind::LoadingMore, start + Duration::from_millis(100));
        assert!(board.is_active(NoticeKind::LoadingMore));

        board.tick(start + Duration::from_millis(499));
        assert!(board.is_active(NoticeKind::LoadingMore));
        board.tick(start + Duration::from_millis(500));
        assert!(!board.is_active(NoticeKind::LoadingMore));
    }

    #[test]
    fn test_loading_more_late_dismiss_is_immediate() {
        let mut board = NoticeBoard::new();
        let start = Instant::now();
        board.post(NoticeKind::LoadingMore, "Loading", start);
        board.dismiss(NoticeKind::LoadingMore, start + Duration::from_secs(1));
        assert!(board.active().is_empty());
    }

    #[test]
    fn test_static_notices_stay() {
        let mut board = NoticeBoard::new();
        let start = Instant::now();
        board.post(NoticeKind::NoResults, "No results found", start);
        board.post(NoticeKind::Searching, "Searching…", start);

        board.tick(start + Duration::from_secs(60));
        assert_eq!(kinds(&board), vec![NoticeKind::NoResults, NoticeKind::Searching]);

        board.dismiss(NoticeKind::Searching, start);
        assert_eq!(kinds(&board), vec![NoticeKind::NoResults]);
    }

    #[test]
    fn test_clear_cancels_timers() {
        let mut board = NoticeBoard::new();
        let start = Instant::now();
        board.post(NoticeKind::Error, "failed", start);
        board.clear();

        assert!(board.active().is_empty());
        assert_eq!(board.next_deadline(), None);
    }
}
