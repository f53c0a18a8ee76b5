use campground_model::{
    CampsiteType, MonthRange, ReservationStatus, is_weekend, nights,
};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{
    BlockZone, DragItem, Ghost, GhostMode, GridLayout, OccupancyIndex, RowKey, SelectionRange,
    SpanLayout, classify_block_hit, span_layout,
};

/// Column header for one day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayHeader {
    /// The day
    pub date: NaiveDate,
    /// Day of the month
    pub day: u32,
    /// Short weekday name
    pub weekday: String,
    /// Saturday or Sunday
    pub is_weekend: bool,
}

/// A positioned reservation or blackout block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockView {
    /// The entity drawn
    pub item: DragItem,
    /// Horizontal placement within the month
    pub layout: SpanLayout,
    /// Guest name or blackout reason
    pub label: String,
    /// Reservation status
    pub status: Option<ReservationStatus>,
    /// Nights booked
    pub nights: Option<i64>,
    /// Blackout covering every campsite
    pub global: bool,
    /// Accepts move gestures
    pub interactive: bool,
    /// Shows resize handles
    pub resizable: bool,
    /// An optimistic change awaits the server
    pub saving: bool,
}

impl BlockView {
    /// Block for `item` laid out on `month`
    pub fn new(item: DragItem, month: &MonthRange) -> Self {
        let layout = span_layout(item.start(), item.end_exclusive(), month);
        let interactive = item.is_interactive();

        let (label, nights, global) = match &item {
            DragItem::Reservation(r) => (r.guest_name(), Some(nights(r.check_in, r.check_out)), false),
            DragItem::Blackout(b) => (b.reason.clone(), None, b.is_global()),
        };

        Self {
            status: item.status(),
            saving: item.is_saving(),
            item,
            layout,
            label,
            nights,
            global,
            interactive,
            resizable: interactive,
        }
    }
}

/// Ghost preview as drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GhostView {
    /// Gesture that produced it
    pub mode: GhostMode,
    /// Candidate start
    pub start: NaiveDate,
    /// Candidate end in the item's own convention
    pub end: NaiveDate,
    /// Passed validation
    pub valid: bool,
    /// Inline error when it did not
    pub error: Option<String>,
    /// Horizontal placement within the month
    pub layout: SpanLayout,
}

impl GhostView {
    /// Drawable form of `ghost`
    pub fn new(ghost: &Ghost, month: &MonthRange) -> Self {
        Self {
            mode: ghost.mode,
            start: ghost.start,
            end: ghost.end,
            valid: ghost.is_valid(),
            error: ghost.error_message(),
            layout: span_layout(ghost.start, ghost.end_exclusive(), month),
        }
    }
}

/// One row of the grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    /// Row key
    pub key: RowKey,
    /// Label code, empty for the unassigned row
    pub code: String,
    /// Label name
    pub name: String,
    /// Campsite category
    pub campsite_type: Option<CampsiteType>,
    /// Accepts new bookings
    pub is_active: bool,
    /// Blocks, blackouts first so reservations draw on top
    pub blocks: Vec<BlockView>,
    /// Ghost preview targeting the row
    pub ghost: Option<GhostView>,
    /// Highlighted selection on the row
    pub selection: Option<SpanLayout>,
}

/// Everything a renderer needs to draw one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthView {
    /// Displayed month
    pub month: MonthRange,
    /// Column headers
    pub days: Vec<DayHeader>,
    /// Rows, unassigned first
    pub rows: Vec<RowView>,
}

impl MonthView {
    /// Compose the month from the indexed snapshot and the current gesture state
    pub fn compose<F>(
        index: &OccupancyIndex,
        month: &MonthRange,
        ghost_for_row: F,
        selection: Option<&SelectionRange>,
    ) -> Self
    where
        F: Fn(&RowKey) -> Option<Ghost>,
    {
        let days = month
            .days()
            .map(|date| DayHeader {
                date,
                day: date.day(),
                weekday: date.format("%a").to_string(),
                is_weekend: is_weekend(date),
            })
            .collect();

        let rows = row_keys(index)
            .into_iter()
            .map(|key| {
                let (code, name, campsite_type, is_active) = match &key {
                    RowKey::Unassigned => (String::new(), "Unassigned".to_string(), None, true),
                    RowKey::Site(id) => match index.campsite(id) {
                        Some(site) => (
                            site.code.clone(),
                            site.name.clone(),
                            Some(site.campsite_type),
                            site.is_active,
                        ),
                        None => (id.clone(), id.clone(), None, false),
                    },
                };

                let selection = selection
                    .filter(|range| range.row == key)
                    .map(|range| {
                        let (start, end) = range.booking_range();
                        span_layout(start, end, month)
                    });

                RowView {
                    blocks: blocks_for_row(index, &key, month),
                    ghost: ghost_for_row(&key).map(|ghost| GhostView::new(&ghost, month)),
                    selection,
                    key,
                    code,
                    name,
                    campsite_type,
                    is_active,
                }
            })
            .collect();

        Self {
            month: *month,
            days,
            rows,
        }
    }

    /// Row by key
    pub fn row(&self, key: &RowKey) -> Option<&RowView> {
        self.rows.iter().find(|row| &row.key == key)
    }
}

/// Grid rows: the unassigned row, then campsites by sort order and code
pub fn row_keys(index: &OccupancyIndex) -> Vec<RowKey> {
    std::iter::once(RowKey::Unassigned)
        .chain(
            index
                .sorted_campsites()
                .into_iter()
                .map(|site| RowKey::Site(site.id.clone())),
        )
        .collect()
}

/// Blocks drawn on `row` during `month`.
///
/// Site rows show their own blackouts, every global blackout and their
/// reservations. The unassigned row shows reservations without a campsite.
pub fn blocks_for_row(index: &OccupancyIndex, row: &RowKey, month: &MonthRange) -> Vec<BlockView> {
    let snapshot = index.snapshot();
    let visible = month.span();

    let mut blackouts: Vec<BlockView> = match row {
        RowKey::Unassigned => Vec::new(),
        RowKey::Site(site_id) => snapshot
            .blackouts
            .iter()
            .filter(|b| b.applies_to(site_id) && b.days().overlaps(&visible))
            .map(|b| BlockView::new(DragItem::Blackout(b.clone()), month))
            .collect(),
    };
    blackouts.sort_by_key(|block| block.item.start());

    let mut reservations: Vec<BlockView> = snapshot
        .reservations
        .iter()
        .filter(|r| r.campsite_id.as_deref() == row.campsite_id() && r.days().overlaps(&visible))
        .map(|r| BlockView::new(DragItem::Reservation(r.clone()), month))
        .collect();
    reservations.sort_by_key(|block| block.item.start());

    blackouts.extend(reservations);
    blackouts
}

/// Top-most block under `x` among `blocks`, with the zone that was hit
pub fn block_hit<'a>(
    x: f64,
    layout: &GridLayout,
    blocks: &'a [BlockView],
    handle_width: f64,
) -> Option<(&'a BlockView, BlockZone)> {
    blocks.iter().rev().find_map(|block| {
        let (left, width) = layout.span_px(&block.layout);
        classify_block_hit(x, left, width, handle_width, block.resizable).map(|zone| (block, zone))
    })
}
