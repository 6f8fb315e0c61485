/// Rows reserved outside the list panes: title, status, help and slack.
pub const LEFT_CHROME_ROWS: u16 = 6;
/// Rows reserved outside a content viewport: title, status and help bars,
/// the right pane border and padding, the tab header and its spacer, and
/// the scroll status line under the content.
pub const VIEWPORT_CHROME_ROWS: u16 = 10;
/// Columns the right pane loses to its border and horizontal padding.
pub const VIEWPORT_CHROME_COLS: u16 = 4;
pub const SECTION_COUNT: u16 = 4;
pub const MIN_SECTION_ROWS: u16 = 3;
pub const PANE_GUTTER: u16 = 1;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Geometry {
    pub width: u16,
    pub height: u16,
    pub left_width: u16,
    pub right_width: u16,
    /// Visible item rows inside each list pane.
    pub section_rows: u16,
    /// Outer height of each list pane, borders included.
    pub pane_height: u16,
    pub viewport_width: u16,
    pub viewport_height: u16,
}

impl Geometry {
    pub fn compute(width: u16, height: u16) -> Self {
        let left_width = width / 3;
        let right_width = width.saturating_sub(left_width).saturating_sub(PANE_GUTTER);

        let available = height.saturating_sub(LEFT_CHROME_ROWS);
        let section_rows = (available / SECTION_COUNT)
            .saturating_sub(2)
            .max(MIN_SECTION_ROWS);

        Self {
            width,
            height,
            left_width,
            right_width,
            section_rows,
            pane_height: section_rows + 2,
            viewport_width: right_width.saturating_sub(VIEWPORT_CHROME_COLS),
            viewport_height: height.saturating_sub(VIEWPORT_CHROME_ROWS),
        }
    }

    /// Width available to a list row inside a pane border.
    pub fn pane_inner_width(&self) -> usize {
        usize::from(self.left_width.saturating_sub(2))
    }
}
