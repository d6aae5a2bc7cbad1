//! Scroll state for the analysis panes and the chat transcript.
//!
//! Each pane keeps its own [`Viewport`] so switching tabs preserves the
//! position the user left it at.

use std::ops::Range;

/// Visible window over a list of wrapped lines.
///
/// # Example
///
/// ```
/// use scanlens::ui::viewport::Viewport;
///
/// let mut pane = Viewport::new(60, 10, 42);
/// pane.page_down();
/// assert_eq!(pane.visible_range(), 10..20);
///
/// pane.go_to_bottom();
/// assert_eq!(pane.visible_range(), 32..42);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewport {
    width: u16,
    height: u16,
    offset: usize,
    total_lines: usize,
}

impl Viewport {
    /// Create a viewport `height` rows tall over `total_lines` lines.
    pub const fn new(width: u16, height: u16, total_lines: usize) -> Self {
        Self {
            width,
            height,
            offset: 0,
            total_lines,
        }
    }

    /// Index of the first visible line.
    pub const fn offset(&self) -> usize {
        self.offset
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }

    pub const fn total_lines(&self) -> usize {
        self.total_lines
    }

    /// Line indices currently on screen.
    pub fn visible_range(&self) -> Range<usize> {
        let end = (self.offset + self.height as usize).min(self.total_lines);
        self.offset.min(end)..end
    }

    /// How far through the content the bottom edge is, 0-100.
    ///
    /// Content that fits on one screen reports 100.
    pub fn scroll_percent(&self) -> u8 {
        let max = self.max_offset();
        if max == 0 {
            return 100;
        }
        let percent = self.offset.saturating_mul(100) / max;
        u8::try_from(percent.min(100)).unwrap_or(100)
    }

    pub const fn can_scroll_up(&self) -> bool {
        self.offset > 0
    }

    pub const fn can_scroll_down(&self) -> bool {
        self.offset < self.max_offset()
    }

    pub const fn scroll_up(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }

    pub fn scroll_down(&mut self, n: usize) {
        self.offset = self.offset.saturating_add(n).min(self.max_offset());
    }

    pub const fn page_up(&mut self) {
        self.scroll_up(self.height as usize);
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.height as usize);
    }

    pub const fn go_to_top(&mut self) {
        self.offset = 0;
    }

    pub const fn go_to_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    /// Change the window size, keeping the offset valid.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.offset = self.offset.min(self.max_offset());
    }

    /// Change the content length, keeping the offset valid.
    pub fn set_total_lines(&mut self, total: usize) {
        self.total_lines = total;
        self.offset = self.offset.min(self.max_offset());
    }

    const fn max_offset(&self) -> usize {
        self.total_lines.saturating_sub(self.height as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_pane_shows_everything() {
        let pane = Viewport::new(60, 20, 3);
        assert_eq!(pane.visible_range(), 0..3);
        assert!(!pane.can_scroll_down());
        assert_eq!(pane.scroll_percent(), 100);
    }

    #[test]
    fn test_empty_pane_has_empty_range() {
        let pane = Viewport::new(60, 20, 0);
        assert_eq!(pane.visible_range(), 0..0);
    }

    #[test]
    fn test_scroll_down_stops_at_last_page() {
        let mut pane = Viewport::new(60, 10, 25);
        pane.scroll_down(100);
        assert_eq!(pane.offset(), 15);
        assert_eq!(pane.visible_range(), 15..25);
        assert_eq!(pane.scroll_percent(), 100);
    }

    #[test]
    fn test_scroll_up_stops_at_top() {
        let mut pane = Viewport::new(60, 10, 25);
        pane.scroll_down(4);
        pane.scroll_up(9);
        assert_eq!(pane.offset(), 0);
        assert!(!pane.can_scroll_up());
    }

    #[test]
    fn test_paging_moves_by_height() {
        let mut pane = Viewport::new(60, 8, 40);
        pane.page_down();
        pane.page_down();
        assert_eq!(pane.offset(), 16);
        pane.page_up();
        assert_eq!(pane.offset(), 8);
    }

    #[test]
    fn test_top_and_bottom() {
        let mut pane = Viewport::new(60, 8, 40);
        pane.go_to_bottom();
        assert_eq!(pane.offset(), 32);
        pane.go_to_top();
        assert_eq!(pane.offset(), 0);
    }

    #[test]
    fn test_scroll_percent_halfway() {
        let mut pane = Viewport::new(60, 10, 30);
        pane.scroll_down(10);
        assert_eq!(pane.scroll_percent(), 50);
    }

    #[test]
    fn test_taller_window_clamps_offset() {
        let mut pane = Viewport::new(60, 10, 30);
        pane.go_to_bottom();
        pane.resize(40, 25);
        assert_eq!(pane.offset(), 5);
        assert_eq!(pane.width(), 40);
    }

    #[test]
    fn test_shorter_content_clamps_offset() {
        let mut chat = Viewport::new(30, 5, 50);
        chat.go_to_bottom();
        chat.set_total_lines(7);
        assert_eq!(chat.offset(), 2);
        assert_eq!(chat.total_lines(), 7);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn range_stays_inside_content(
                total_lines in 0..5000usize,
                height in 1..80u16,
                moves in proptest::collection::vec((any::<bool>(), 0..200usize), 0..20),
            ) {
                let mut pane = Viewport::new(60, height, total_lines);
                for (down, n) in moves {
                    if down {
                        pane.scroll_down(n);
                    } else {
                        pane.scroll_up(n);
                    }
                }
                let range = pane.visible_range();
                prop_assert!(range.start <= range.end);
                prop_assert!(range.end <= total_lines);
                prop_assert!(pane.scroll_percent() <= 100);
            }
        }
    }
}
