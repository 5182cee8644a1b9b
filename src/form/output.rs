use std::collections::VecDeque;

pub const DEFAULT_LOG_CAPACITY: usize = 1_000;

/// Append-only text log shown under the form. Oldest lines fall off past `capacity`.
#[derive(Debug, Clone)]
pub struct OutputLog {
    lines: VecDeque<String>,
    capacity: usize,
    /// Lines scrolled up from the bottom; 0 follows new output.
    scroll_back: usize,
}

impl Default for OutputLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }
}

impl OutputLog {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { lines: VecDeque::new(), capacity: capacity.max(1), scroll_back: 0 }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
        self.scroll_back = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.scroll_back = 0;
    }

    pub fn scroll_up(&mut self, n: usize) {
        self.scroll_back = (self.scroll_back + n).min(self.lines.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(n);
    }

    #[must_use]
    pub const fn scroll_back(&self) -> usize {
        self.scroll_back
    }

    /// The `height` lines visible in a pane of that height, honouring the scroll position.
    #[must_use]
    pub fn window(&self, height: usize) -> Vec<&str> {
        let end = self.lines.len().saturating_sub(self.scroll_back);
        let start = end.saturating_sub(height);
        self.lines.range(start..end).map(String::as_str).collect()
    }
}
