/// Scrollable text buffer behind one content tab.
#[derive(Debug, Clone)]
pub struct ContentViewport {
    content: String,
    line_count: usize,
    offset: usize,
    height: usize,
    auto_follow: bool,
}

impl ContentViewport {
    pub fn new(auto_follow: bool) -> Self {
        Self {
            content: String::new(),
            line_count: 0,
            offset: 0,
            height: 1,
            auto_follow,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn auto_follow(&self) -> bool {
        self.auto_follow
    }

    /// Replaces the buffer. A following viewport jumps to the last line,
    /// otherwise the current offset is kept within the new bounds.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.line_count = self.content.lines().count();
        self.settle();
    }

    /// Replaces the buffer and scrolls back to the first line.
    pub fn reset(&mut self, content: impl Into<String>) {
        self.offset = 0;
        self.set_content(content);
    }

    pub fn append_content(&mut self, more: &str) {
        if !self.content.is_empty() {
            self.content.push('\n');
        }
        self.content.push_str(more);
        self.line_count = self.content.lines().count();
        self.settle();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.line_count = 0;
        self.offset = 0;
    }

    pub fn set_height(&mut self, height: u16) {
        self.height = usize::from(height.max(1));
        self.settle();
    }

    pub fn max_offset(&self) -> usize {
        self.line_count.saturating_sub(self.height)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.offset >= self.max_offset()
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = self.offset.saturating_add(lines).min(self.max_offset());
    }

    pub fn half_page(&self) -> usize {
        (self.height / 2).max(1)
    }

    pub fn goto_bottom(&mut self) {
        self.offset = self.max_offset();
    }

    pub fn toggle_auto_follow(&mut self) -> bool {
        self.auto_follow = !self.auto_follow;
        if self.auto_follow {
            self.goto_bottom();
        }
        self.auto_follow
    }

    pub fn scroll_percent(&self) -> usize {
        let max = self.max_offset();
        if max == 0 {
            100
        } else {
            self.offset * 100 / max
        }
    }

    pub fn status_line(&self) -> String {
        let mode = if self.auto_follow { "AUTO" } else { "MANUAL" };
        format!(
            "[{mode}] {}% ({} lines)",
            self.scroll_percent(),
            self.line_count
        )
    }

    fn settle(&mut self) {
        if self.auto_follow {
            self.goto_bottom();
        } else {
            self.offset = self.offset.min(self.max_offset());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ContentViewport;

    fn numbered(lines: usize) -> String {
        (1..=lines)
            .map(|line| format!("line {line}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn content_reads_back_unchanged() {
        let mut viewport = ContentViewport::new(false);
        let text = "first\n  second\n\nfourth\n";
        viewport.set_content(text);
        assert_eq!(viewport.content(), text);
    }

    #[test]
    fn append_keeps_prior_content_with_separator() {
        let mut viewport = ContentViewport::new(false);
        viewport.append_content("alpha");
        viewport.append_content("beta");
        assert_eq!(viewport.content(), "alpha\nbeta");
        assert_eq!(viewport.line_count(), 2);
    }

    #[test]
    fn following_viewport_sticks_to_bottom() {
        let mut viewport = ContentViewport::new(true);
        viewport.set_height(5);
        viewport.set_content(numbered(20));
        assert_eq!(viewport.offset(), 15);
        assert!(viewport.is_at_bottom());

        viewport.append_content("line 21");
        assert_eq!(viewport.offset(), 16);
        assert_eq!(viewport.status_line(), "[AUTO] 100% (21 lines)");
    }

    #[test]
    fn manual_viewport_clamps_offset_on_shorter_content() {
        let mut viewport = ContentViewport::new(false);
        viewport.set_height(5);
        viewport.set_content(numbered(30));
        assert_eq!(viewport.offset(), 0);
        viewport.scroll_down(100);
        assert_eq!(viewport.offset(), 25);
        viewport.set_content(numbered(8));
        assert_eq!(viewport.offset(), 3);
        viewport.reset("placeholder");
        assert_eq!(viewport.offset(), 0);
    }

    #[test]
    fn toggling_follow_jumps_to_bottom() {
        let mut viewport = ContentViewport::new(false);
        viewport.set_height(4);
        viewport.set_content(numbered(10));
        assert!(viewport.toggle_auto_follow());
        assert_eq!(viewport.offset(), 6);
        assert!(!viewport.toggle_auto_follow());
        viewport.scroll_up(6);
        assert_eq!(viewport.scroll_percent(), 0);
        assert_eq!(viewport.status_line(), "[MANUAL] 0% (10 lines)");
    }

    #[test]
    fn clear_empties_buffer() {
        let mut viewport = ContentViewport::new(true);
        viewport.set_content(numbered(3));
        viewport.clear();
        assert!(viewport.content().is_empty());
        assert_eq!(viewport.line_count(), 0);
    }
}
