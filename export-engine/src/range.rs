// Copyright (c) James Kassemi, SC, US. All rights reserved.
use core_types::DataFileKey;

/// Inclusive `[start, end]` block window; a `None` side is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockWindow {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

/// Where a block sequence number falls relative to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockPlacement {
    Before,
    InRange,
    After,
}

impl BlockWindow {
    pub fn new(start: Option<u64>, end: Option<u64>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_bounded(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// False only when the key's encoded range provably misses the window.
    /// Keys without a parseable range are always fetched.
    pub fn file_in_range(&self, key: &DataFileKey) -> bool {
        if !self.is_bounded() {
            return true;
        }
        let Some(range) = key.block_range() else {
            return true;
        };
        if self.end.is_some_and(|end| range.first > end) {
            return false;
        }
        !self.start.is_some_and(|start| range.last < start)
    }

    pub fn place(&self, seq: u64) -> BlockPlacement {
        if self.start.is_some_and(|start| seq < start) {
            BlockPlacement::Before
        } else if self.end.is_some_and(|end| seq > end) {
            BlockPlacement::After
        } else {
            BlockPlacement::InRange
        }
    }

    pub fn contains(&self, seq: u64) -> bool {
        self.place(seq) == BlockPlacement::InRange
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DataFileKey {
        DataFileKey::new(s)
    }

    #[test]
    fn unbounded_window_keeps_everything() {
        let window = BlockWindow::unbounded();
        assert!(window.file_in_range(&key("s.100-200.ion")));
        assert_eq!(window.place(0), BlockPlacement::InRange);
        assert_eq!(window.place(u64::MAX), BlockPlacement::InRange);
    }

    #[test]
    fn files_outside_window_are_skipped() {
        let window = BlockWindow::new(Some(5), Some(10));
        assert!(!window.file_in_range(&key("s.0-4.ion")));
        assert!(window.file_in_range(&key("s.0-5.ion")));
        assert!(window.file_in_range(&key("s.6-8.ion")));
        assert!(window.file_in_range(&key("s.10-20.ion")));
        assert!(!window.file_in_range(&key("s.11-20.ion")));
    }

    #[test]
    fn half_open_windows() {
        let from = BlockWindow::new(Some(50), None);
        assert!(!from.file_in_range(&key("s.0-49.ion")));
        assert!(from.file_in_range(&key("s.1000-2000.ion")));
        let until = BlockWindow::new(None, Some(50));
        assert!(until.file_in_range(&key("s.0-49.ion")));
        assert!(!until.file_in_range(&key("s.51-60.ion")));
    }

    #[test]
    fn unparseable_keys_are_never_skipped() {
        let window = BlockWindow::new(Some(5), Some(10));
        assert!(window.file_in_range(&key("no-range-here")));
        assert!(window.file_in_range(&key("s.x-y.ion")));
    }

    #[test]
    fn block_placement() {
        let window = BlockWindow::new(Some(5), Some(10));
        assert_eq!(window.place(4), BlockPlacement::Before);
        assert_eq!(window.place(5), BlockPlacement::InRange);
        assert_eq!(window.place(10), BlockPlacement::InRange);
        assert_eq!(window.place(11), BlockPlacement::After);
        assert!(window.contains(7));
    }
}
