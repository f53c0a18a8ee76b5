use campground_model::{CampsiteId, MonthRange, Placement, add_days, days_between};
use chrono::NaiveDate;
use serde::Serialize;

/// One row of the grid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "campsite_id", rename_all = "snake_case")]
pub enum RowKey {
    /// Reservations without a campsite
    Unassigned,
    /// A campsite row
    Site(CampsiteId),
}

impl RowKey {
    /// Placement of a block dropped on this row
    pub fn placement(&self) -> Placement {
        match self {
            RowKey::Unassigned => Placement::Unassigned,
            RowKey::Site(id) => Placement::Site(id.clone()),
        }
    }

    /// Whether a block with `placement` is drawn on this row
    pub fn shows(&self, placement: &Placement) -> bool {
        match (self, placement) {
            (RowKey::Unassigned, Placement::Unassigned) => true,
            (RowKey::Site(row), Placement::Site(site)) => row == site,
            (RowKey::Site(_), Placement::AllSites) => true,
            _ => false,
        }
    }

    /// Campsite id of a site row
    pub fn campsite_id(&self) -> Option<&str> {
        match self {
            RowKey::Site(id) => Some(id),
            RowKey::Unassigned => None,
        }
    }
}

/// A day cell: one row, one date
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    /// Row of the cell
    pub row: RowKey,
    /// Date of the cell's column
    pub date: NaiveDate,
}

/// Axis-aligned rectangle in viewport pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub left: f64,
    /// Top edge
    pub top: f64,
    /// Width
    pub width: f64,
    /// Height
    pub height: f64,
}

impl Rect {
    /// Rectangle from its top-left corner and size
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether the point lies inside the rectangle
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    /// Overlap of two rectangles; empty rectangles have zero width or height
    pub fn intersect(&self, other: &Rect) -> Rect {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        Rect {
            left,
            top,
            width: (right - left).max(0.0),
            height: (bottom - top).max(0.0),
        }
    }
}

/// Rendered sizes of the grid, in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    /// Width of the sticky campsite label column
    pub label_width: f64,
    /// Height of the day header
    pub header_height: f64,
    /// Width of one day column
    pub day_width: f64,
    /// Height of one campsite row
    pub row_height: f64,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            label_width: 160.0,
            header_height: 48.0,
            day_width: 40.0,
            row_height: 44.0,
        }
    }
}

/// Horizontal placement of a block as a percentage of the month's width
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpanLayout {
    /// Offset of the block's left edge
    pub left_percent: f64,
    /// Width of the block
    pub width_percent: f64,
    /// The block starts before the month
    pub clipped_start: bool,
    /// The block continues after the month
    pub clipped_end: bool,
}

/// Lay out the half-open interval `[start, end)` on a month grid.
///
/// The interval is clipped to the month and always spans at least one day.
pub fn span_layout(start: NaiveDate, end: NaiveDate, month: &MonthRange) -> SpanLayout {
    let total_days = month.total_days().max(1) as f64;
    let clipped_start = start < month.first();
    let clipped_end = end > month.end_exclusive();

    let visible_start = start.max(month.first());
    let visible_end = end.min(month.end_exclusive());
    let span_days = days_between(visible_start, visible_end).max(1) as f64;
    let offset_days = days_between(month.first(), visible_start) as f64;

    SpanLayout {
        left_percent: offset_days / total_days * 100.0,
        width_percent: span_days / total_days * 100.0,
        clipped_start,
        clipped_end,
    }
}

/// Move the end of `[old_start, old_end]` along with its start, keeping the duration
pub fn shift_end_preserving_duration(
    old_start: NaiveDate,
    old_end: NaiveDate,
    new_start: NaiveDate,
) -> NaiveDate {
    add_days(new_start, days_between(old_start, old_end))
}

/// Part of a block under the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockZone {
    /// The block's body, grabbed for a move
    Body,
    /// Handle on the start edge
    StartHandle,
    /// Handle on the end edge
    EndHandle,
}

/// Classify a pointer `x` against a block spanning `[left, left + width)`.
///
/// Handles exist only on resizable blocks and never take more than a third of
/// the block each, so narrow blocks keep a grabbable body.
pub fn classify_block_hit(
    x: f64,
    left: f64,
    width: f64,
    handle_width: f64,
    resizable: bool,
) -> Option<BlockZone> {
    if x < left || x >= left + width {
        return None;
    }

    if !resizable {
        return Some(BlockZone::Body);
    }

    let handle = handle_width.min(width / 3.0);
    if x < left + handle {
        Some(BlockZone::StartHandle)
    } else if x >= left + width - handle {
        Some(BlockZone::EndHandle)
    } else {
        Some(BlockZone::Body)
    }
}

/// Geometry of the rendered month grid inside its scroll container
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    /// Viewport x of the scroll container's left edge
    pub origin_x: f64,
    /// Viewport y of the scroll container's top edge
    pub origin_y: f64,
    /// Visible width of the scroll container
    pub visible_width: f64,
    /// Current horizontal scroll offset of the day columns
    pub scroll_left: f64,
    /// Rendered sizes
    pub metrics: GridMetrics,
    /// Displayed month
    pub month: MonthRange,
    /// Rows from top to bottom
    pub rows: Vec<RowKey>,
}

impl GridLayout {
    /// Layout anchored at the viewport origin with no scroll
    pub fn new(month: MonthRange, rows: Vec<RowKey>, metrics: GridMetrics) -> Self {
        let visible_width = metrics.label_width + month.total_days() as f64 * metrics.day_width;

        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            visible_width,
            scroll_left: 0.0,
            metrics,
            month,
            rows,
        }
    }

    /// Width of every day column together
    pub fn content_width(&self) -> f64 {
        self.month.total_days() as f64 * self.metrics.day_width
    }

    /// Largest scroll offset that still shows content
    pub fn max_scroll_left(&self) -> f64 {
        let viewport = (self.visible_width - self.metrics.label_width).max(0.0);
        (self.content_width() - viewport).max(0.0)
    }

    /// Viewport rectangle of the day header strip
    pub fn header_rect(&self) -> Rect {
        Rect::new(
            self.origin_x + self.metrics.label_width,
            self.origin_y,
            (self.visible_width - self.metrics.label_width).max(0.0),
            self.metrics.header_height,
        )
    }

    /// Whether the point lies over the day header strip
    pub fn is_over_header(&self, x: f64, y: f64) -> bool {
        self.header_rect().contains(x, y)
    }

    /// Row under a viewport y coordinate
    pub fn row_at(&self, y: f64) -> Option<&RowKey> {
        let local_y = y - self.origin_y - self.metrics.header_height;
        if local_y < 0.0 || self.metrics.row_height <= 0.0 {
            return None;
        }

        self.rows.get((local_y / self.metrics.row_height).floor() as usize)
    }

    /// Day cell under a viewport point.
    ///
    /// Returns `None` over the label gutter, the header, or anywhere outside the
    /// grid's visible area.
    pub fn cell_for_pointer(&self, x: f64, y: f64) -> Option<CellRef> {
        let local_x = x - self.origin_x;
        if local_x < self.metrics.label_width || local_x >= self.visible_width {
            return None;
        }
        if self.metrics.day_width <= 0.0 {
            return None;
        }

        let content_x = local_x - self.metrics.label_width + self.scroll_left;
        let column = (content_x / self.metrics.day_width).floor();
        if column < 0.0 {
            return None;
        }

        let date = self.month.date_at(column as usize)?;
        let row = self.row_at(y)?.clone();

        Some(CellRef { row, date })
    }

    /// Signed day distance between the cell under the pointer and `item_start`
    pub fn drag_offset_days(&self, x: f64, y: f64, item_start: NaiveDate) -> Option<i64> {
        self.cell_for_pointer(x, y)
            .map(|cell| days_between(item_start, cell.date))
    }

    /// Viewport x and pixel width of a laid-out span
    pub fn span_px(&self, span: &SpanLayout) -> (f64, f64) {
        let content_width = self.content_width();
        let left = self.origin_x + self.metrics.label_width + span.left_percent / 100.0 * content_width
            - self.scroll_left;

        (left, span.width_percent / 100.0 * content_width)
    }
}
