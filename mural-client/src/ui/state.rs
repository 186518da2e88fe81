use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Local};

use crate::common::Message;
use crate::error::ApiError;
use crate::status::{self, HealthChange, NodeReport};

const MAX_NOTICES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

/// A line of feedback shown to the user.
#[derive(Debug, Clone)]
pub struct Notice {
    pub timestamp: DateTime<Local>,
    pub kind: NoticeKind,
    pub text: String,
}

/// What the terminal has shown so far: the latest sweep, the messages
/// already printed and recent notices.
#[derive(Debug, Default)]
pub struct ViewState {
    pub reports: Vec<NodeReport>,
    pub last_sweep: Option<DateTime<Local>>,
    pub notices: VecDeque<Notice>,
    seen: HashSet<String>,
    last_refresh_error: Option<String>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the previous sweep and returns the nodes whose health changed.
    pub fn apply_sweep(&mut self, reports: Vec<NodeReport>) -> Vec<HealthChange> {
        let changes = status::transitions(&self.reports, &reports);
        self.reports = reports;
        self.last_sweep = Some(Local::now());
        changes
    }

    /// Messages not shown before, in wall order. They count as shown from
    /// now on.
    pub fn unseen(&mut self, messages: &[Message]) -> Vec<Message> {
        messages
            .iter()
            .filter(|message| self.seen.insert(message.key()))
            .cloned()
            .collect()
    }

    pub fn mark_seen(&mut self, messages: &[Message]) {
        self.seen
            .extend(messages.iter().map(|message| message.key()));
    }

    /// Called when the watched node changes.
    pub fn forget_seen(&mut self) {
        self.seen.clear();
        self.last_refresh_error = None;
    }

    /// Records a failed auto-refresh. Returns `false` when it repeats the
    /// previous failure.
    pub fn refresh_failed(&mut self, err: &ApiError) -> bool {
        let text = err.to_string();
        if self.last_refresh_error.as_deref() == Some(text.as_str()) {
            return false;
        }
        self.last_refresh_error = Some(text);
        true
    }

    pub fn refresh_succeeded(&mut self) {
        self.last_refresh_error = None;
    }

    pub fn push_notice(&mut self, kind: NoticeKind, text: impl Into<String>) -> Notice {
        let notice = Notice {
            timestamp: Local::now(),
            kind,
            text: text.into(),
        };
        self.notices.push_back(notice.clone());
        while self.notices.len() > MAX_NOTICES {
            self.notices.pop_front();
        }
        notice
    }
}
