// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

impl NoticeLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "ok",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Sink for short-lived, non-blocking user messages.
pub trait Notifier {
    fn notify(&mut self, notice: Notice);

    fn info(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.notify(Notice::new(NoticeLevel::Info, message));
    }

    fn success(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.notify(Notice::new(NoticeLevel::Success, message));
    }

    fn error(&mut self, message: impl Into<String>)
    where
        Self: Sized,
    {
        self.notify(Notice::new(NoticeLevel::Error, message));
    }
}

/// Bounded in-memory notice history. The newest notice is the one on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeLog {
    notices: Vec<Notice>,
    capacity: usize,
}

impl Default for NoticeLog {
    fn default() -> Self {
        Self::with_capacity(NoticeLog::DEFAULT_CAPACITY)
    }
}

impl NoticeLog {
    pub const DEFAULT_CAPACITY: usize = 32;

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            notices: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.last()
    }

    pub fn all(&self) -> &[Notice] {
        &self.notices
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices
            .iter()
            .filter(|notice| notice.level == level)
            .count()
    }

    pub fn clear(&mut self) {
        self.notices.clear();
    }
}

impl Notifier for NoticeLog {
    fn notify(&mut self, notice: Notice) {
        if self.notices.len() == self.capacity {
            self.notices.remove(0);
        }
        self.notices.push(notice);
    }
}
