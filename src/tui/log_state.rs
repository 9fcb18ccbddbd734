use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use log::Level;
use parking_lot::Mutex;

const MAX_LOG_ENTRIES: usize = 1000;

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
    pub timestamp: Instant,
}

/// Thread-safe ring buffer for log entries.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    start: Instant,
}

impl LogBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_ENTRIES))),
            start: Instant::now(),
        }
    }

    #[must_use]
    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn push(&self, entry: LogEntry) {
        let mut entries = self.entries.lock();
        if entries.len() >= MAX_LOG_ENTRIES {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Entries visible in a panel of `height` rows, `scroll` rows up from the
    /// newest entry. Oldest first.
    #[must_use]
    pub fn window(&self, height: usize, scroll: usize) -> Vec<LogEntry> {
        let entries = self.entries.lock();
        let count = entries.len();
        let scroll = scroll.min(count.saturating_sub(height));
        let start = count.saturating_sub(height + scroll);
        let end = count.saturating_sub(scroll);
        entries.range(start..end).cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_n(buffer: &LogBuffer, n: usize) {
        for i in 0..n {
            buffer.push(LogEntry {
                level: Level::Info,
                target: "test".into(),
                message: i.to_string(),
                timestamp: Instant::now(),
            });
        }
    }

    #[test]
    fn test_ring_drops_oldest() {
        let buffer = LogBuffer::new();
        push_n(&buffer, MAX_LOG_ENTRIES + 5);
        assert_eq!(buffer.len(), MAX_LOG_ENTRIES);
        assert_eq!(buffer.window(1, MAX_LOG_ENTRIES)[0].message, "5");
    }

    #[test]
    fn test_window_scrolls_from_bottom() {
        let buffer = LogBuffer::new();
        push_n(&buffer, 10);
        let newest: Vec<_> = buffer.window(3, 0).into_iter().map(|e| e.message).collect();
        assert_eq!(newest, ["7", "8", "9"]);
        let scrolled: Vec<_> = buffer.window(3, 2).into_iter().map(|e| e.message).collect();
        assert_eq!(scrolled, ["5", "6", "7"]);
        // Scrolling past the top clamps
        assert_eq!(buffer.window(3, 100)[0].message, "0");
    }
}
