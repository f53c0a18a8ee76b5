use campground_model::add_days;
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::{CellRef, Candidate, Ghost, GhostMode, ItemKind, OccupancyIndex, RowKey};

/// A range of days picked on one campsite row.
///
/// The anchor is the first cell clicked; the active date follows the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionRange {
    /// Row the selection lives on
    pub row: RowKey,
    /// First cell clicked
    pub anchor: NaiveDate,
    /// Last valid cell reached
    pub active: NaiveDate,
}

impl SelectionRange {
    /// Zero-length range at `date`
    pub fn at(row: RowKey, date: NaiveDate) -> Self {
        Self {
            row,
            anchor: date,
            active: date,
        }
    }

    /// Earlier selected day
    pub fn start(&self) -> NaiveDate {
        self.anchor.min(self.active)
    }

    /// Later selected day, inclusive
    pub fn end(&self) -> NaiveDate {
        self.anchor.max(self.active)
    }

    /// Nights `[start, end)` for a new booking
    pub fn booking_range(&self) -> (NaiveDate, NaiveDate) {
        (self.start(), add_days(self.end(), 1))
    }

    /// Days `[start, end]` for a new blackout
    pub fn blackout_range(&self) -> (NaiveDate, NaiveDate) {
        (self.start(), self.end())
    }

    /// Campsite the range was drawn on
    pub fn campsite_id(&self) -> Option<&str> {
        self.row.campsite_id()
    }

    /// Whether `date` is highlighted
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end()
    }

    fn anchor_is_endpoint(&self) -> bool {
        self.anchor == self.start() || self.anchor == self.end()
    }
}

/// Observable phase of the selection machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    /// Nothing selected
    Idle,
    /// Anchor set, pointer has not reached another cell yet
    Anchoring,
    /// Range spans more than the anchor, gesture still open
    Extending,
    /// Range committed, waiting for the creation prompt to close
    Finalized,
}

#[derive(Debug, Clone, PartialEq)]
enum SelectionState {
    Idle,
    Selecting {
        range: SelectionRange,
        pointer_held: bool,
    },
    Finalized(SelectionRange),
}

/// Click-drag and click-click range selection over empty cells
#[derive(Debug, Clone)]
pub struct SelectionMachine {
    state: SelectionState,
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionMachine {
    /// Machine with nothing selected
    pub fn new() -> Self {
        Self {
            state: SelectionState::Idle,
        }
    }

    /// Current phase
    pub fn phase(&self) -> SelectionPhase {
        match &self.state {
            SelectionState::Idle => SelectionPhase::Idle,
            SelectionState::Selecting { range, .. } if range.anchor == range.active => {
                SelectionPhase::Anchoring
            }
            SelectionState::Selecting { .. } => SelectionPhase::Extending,
            SelectionState::Finalized(_) => SelectionPhase::Finalized,
        }
    }

    /// Range being selected or awaiting the creation prompt
    pub fn range(&self) -> Option<&SelectionRange> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::Selecting { range, .. } | SelectionState::Finalized(range) => Some(range),
        }
    }

    /// Whether a selection gesture is open
    pub fn is_selecting(&self) -> bool {
        matches!(self.state, SelectionState::Selecting { .. })
    }

    /// Whether the selection awaits a second click
    pub fn awaits_second_click(&self) -> bool {
        matches!(
            self.state,
            SelectionState::Selecting {
                pointer_held: false,
                ..
            }
        )
    }

    /// Pointer pressed over `cell`. Returns the range when a second click finalizes it.
    pub fn pointer_down(&mut self, cell: &CellRef, index: &OccupancyIndex) -> Option<SelectionRange> {
        match &mut self.state {
            SelectionState::Idle => {
                if index.is_cell_selectable(&cell.row, cell.date) {
                    debug!("Selection anchored on {:?} at {}", cell.row, cell.date);
                    self.state = SelectionState::Selecting {
                        range: SelectionRange::at(cell.row.clone(), cell.date),
                        pointer_held: true,
                    };
                }
                None
            }
            SelectionState::Selecting {
                range,
                pointer_held: false,
            } => {
                if cell.row != range.row {
                    if index.is_cell_selectable(&cell.row, cell.date) {
                        debug!("Selection restarted on {:?} at {}", cell.row, cell.date);
                        self.state = SelectionState::Selecting {
                            range: SelectionRange::at(cell.row.clone(), cell.date),
                            pointer_held: true,
                        };
                    }
                    return None;
                }

                if cell.date == range.anchor {
                    debug!("Selection cancelled by clicking its anchor");
                    self.state = SelectionState::Idle;
                    return None;
                }

                range.active = Self::reachable(range, cell.date, index);
                self.finalize()
            }
            SelectionState::Selecting { .. } | SelectionState::Finalized(_) => None,
        }
    }

    /// Pointer entered `cell`
    pub fn pointer_move(&mut self, cell: &CellRef, index: &OccupancyIndex) -> bool {
        let SelectionState::Selecting { range, .. } = &mut self.state else {
            return false;
        };

        if cell.row != range.row {
            return false;
        }
        let reached = Self::reachable(range, cell.date, index);
        if reached == range.active {
            return false;
        }

        range.active = reached;
        Self::check_anchor(range);
        true
    }

    /// Pointer released. Returns the range when releasing away from the anchor finalizes it.
    pub fn pointer_up(&mut self) -> Option<SelectionRange> {
        let SelectionState::Selecting {
            range,
            pointer_held,
        } = &mut self.state
        else {
            return None;
        };

        if !*pointer_held {
            return None;
        }

        if range.active != range.anchor {
            return self.finalize();
        }

        // Released on the anchor: wait for a second click while hover keeps extending.
        *pointer_held = false;
        None
    }

    /// Discard an open selection. A finalized range is kept for its prompt.
    pub fn cancel(&mut self) -> bool {
        if self.is_selecting() {
            debug!("Selection cancelled");
            self.state = SelectionState::Idle;
            return true;
        }
        false
    }

    /// Close the creation prompt
    pub fn dismiss(&mut self) -> Option<SelectionRange> {
        match std::mem::replace(&mut self.state, SelectionState::Idle) {
            SelectionState::Finalized(range) => Some(range),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Create ghost for the current range, validated as a new booking
    pub fn ghost(&self, index: &OccupancyIndex) -> Option<Ghost> {
        let range = self.range()?;
        let placement = range.row.placement();
        let (start, end) = range.booking_range();
        let error = index
            .validate(&Candidate {
                kind: ItemKind::Reservation,
                exclude_id: None,
                placement: &placement,
                start,
                end,
            })
            .err();

        Some(Ghost {
            mode: GhostMode::Create,
            kind: ItemKind::Reservation,
            placement,
            start,
            end,
            error,
        })
    }

    fn finalize(&mut self) -> Option<SelectionRange> {
        let SelectionState::Selecting { range, .. } = &self.state else {
            return None;
        };

        let range = range.clone();
        Self::check_anchor(&range);
        debug!(
            "Selection finalized on {:?}: {} to {}",
            range.row,
            range.start(),
            range.end()
        );
        self.state = SelectionState::Finalized(range.clone());
        Some(range)
    }

    /// Last day from the anchor toward `target` before an unselectable cell
    fn reachable(range: &SelectionRange, target: NaiveDate, index: &OccupancyIndex) -> NaiveDate {
        let step = if target < range.anchor { -1 } else { 1 };
        let mut reached = range.anchor;
        while reached != target {
            let next = add_days(reached, step);
            if !index.is_cell_selectable(&range.row, next) {
                break;
            }
            reached = next;
        }
        reached
    }

    fn check_anchor(range: &SelectionRange) {
        if cfg!(debug_assertions) && !range.anchor_is_endpoint() {
            warn!(
                "Selection anchor {} is not an endpoint of {} to {}",
                range.anchor,
                range.start(),
                range.end()
            );
        }
    }
}
