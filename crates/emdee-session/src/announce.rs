//! Screen reader announcements.

use std::sync::{Mutex, PoisonError};

/// Receiver of short status messages for assistive technology.
///
/// Hosts forward these to a live region. Repeated identical messages are
/// delivered every time.
pub trait Announcer: Send + Sync {
    fn announce(&self, message: &str);
}

/// Announcer that drops every message.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAnnouncer;

impl Announcer for SilentAnnouncer {
    fn announce(&self, _message: &str) {}
}

/// Announcer that keeps messages in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    messages: Mutex<Vec<String>>,
}

impl RecordingAnnouncer {
    /// Messages announced so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Announcer for RecordingAnnouncer {
    fn announce(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
    }
}

impl<A: Announcer + ?Sized> Announcer for std::sync::Arc<A> {
    fn announce(&self, message: &str) {
        (**self).announce(message);
    }
}

pub(crate) fn opened(name: &str) -> String {
    format!("Opened: {name}")
}

pub(crate) fn toc_toggled(open: bool) -> &'static str {
    if open {
        "Table of contents opened"
    } else {
        "Table of contents closed"
    }
}
