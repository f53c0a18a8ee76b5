use campground_model::{
    Blackout, BlackoutDraft, EntityKey, Placement, Reservation, ReservationStatus,
};
use chrono::NaiveDate;
use serde::Serialize;

use crate::{Candidate, ItemKind, RowKey, ValidationError};

/// A block captured by value when a gesture starts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "item", rename_all = "snake_case")]
pub enum DragItem {
    /// A guest reservation
    Reservation(Reservation),
    /// A blackout period
    Blackout(Blackout),
}

impl DragItem {
    /// Identifier of the underlying entity
    pub fn id(&self) -> &str {
        match self {
            DragItem::Reservation(r) => &r.id,
            DragItem::Blackout(b) => &b.id,
        }
    }

    /// Kind of the underlying entity
    pub fn kind(&self) -> ItemKind {
        match self {
            DragItem::Reservation(_) => ItemKind::Reservation,
            DragItem::Blackout(_) => ItemKind::Blackout,
        }
    }

    /// Snapshot key of the underlying entity
    pub fn key(&self) -> EntityKey {
        match self {
            DragItem::Reservation(r) => EntityKey::Reservation(r.id.clone()),
            DragItem::Blackout(b) => EntityKey::Blackout(b.id.clone()),
        }
    }

    /// Check-in for reservations, first day for blackouts
    pub fn start(&self) -> NaiveDate {
        match self {
            DragItem::Reservation(r) => r.check_in,
            DragItem::Blackout(b) => b.start_date,
        }
    }

    /// Check-out (exclusive) for reservations, last day (inclusive) for blackouts
    pub fn end(&self) -> NaiveDate {
        match self {
            DragItem::Reservation(r) => r.check_out,
            DragItem::Blackout(b) => b.end_date,
        }
    }

    /// End as an exclusive date, for layout
    pub fn end_exclusive(&self) -> NaiveDate {
        match self {
            DragItem::Reservation(r) => r.check_out,
            DragItem::Blackout(b) => campground_model::add_days(b.end_date, 1),
        }
    }

    /// Current placement of the block
    pub fn placement(&self) -> Placement {
        match self {
            DragItem::Reservation(r) => r.placement(),
            DragItem::Blackout(b) => b.placement(),
        }
    }

    /// Reservation status, `None` for blackouts
    pub fn status(&self) -> Option<ReservationStatus> {
        match self {
            DragItem::Reservation(r) => Some(r.status),
            DragItem::Blackout(_) => None,
        }
    }

    /// Whether an optimistic change to the entity awaits the server
    pub fn is_saving(&self) -> bool {
        match self {
            DragItem::Reservation(r) => r.saving,
            DragItem::Blackout(b) => b.saving,
        }
    }

    /// Whether the block accepts move and resize gestures
    pub fn is_interactive(&self) -> bool {
        if self.is_saving() {
            return false;
        }
        match self {
            DragItem::Reservation(r) => r.is_interactive(),
            DragItem::Blackout(_) => true,
        }
    }

    /// Placement the block takes when dropped on `row`.
    ///
    /// Global blackouts stay global wherever they are dropped. Site blackouts have
    /// no home on the unassigned row.
    pub fn placement_on(&self, row: &RowKey) -> Option<Placement> {
        match (self, row) {
            (DragItem::Blackout(b), _) if b.is_global() => Some(Placement::AllSites),
            (DragItem::Blackout(_), RowKey::Unassigned) => None,
            _ => Some(row.placement()),
        }
    }

    /// Candidate for placing this item at `placement` over `[start, end]` in its own convention
    pub fn candidate<'a>(
        &'a self,
        placement: &'a Placement,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Candidate<'a> {
        Candidate {
            kind: self.kind(),
            exclude_id: Some(self.id()),
            placement,
            start,
            end,
        }
    }
}

/// What a ghost preview represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostMode {
    /// Whole-block move
    Move,
    /// Start edge resize
    ResizeStart,
    /// End edge resize
    ResizeEnd,
    /// New range from a selection
    Create,
}

/// Translucent preview of where a gesture would put a block
#[derive(Debug, Clone, PartialEq)]
pub struct Ghost {
    /// Gesture that produced the ghost
    pub mode: GhostMode,
    /// Kind of entity previewed; selections preview reservations
    pub kind: ItemKind,
    /// Target placement
    pub placement: Placement,
    /// Candidate start
    pub start: NaiveDate,
    /// Candidate end, using the convention of `kind`
    pub end: NaiveDate,
    /// Why the candidate cannot be placed
    pub error: Option<ValidationError>,
}

impl Ghost {
    /// Whether the candidate passed validation
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }

    /// Inline message for an invalid ghost
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// Whether the ghost is drawn on `row`
    pub fn targets_row(&self, row: &RowKey) -> bool {
        row.shows(&self.placement)
    }

    /// End as an exclusive date, for layout
    pub fn end_exclusive(&self) -> NaiveDate {
        match self.kind {
            ItemKind::Reservation => self.end,
            ItemKind::Blackout => campground_model::add_days(self.end, 1),
        }
    }
}

/// A move or resize the user released over a valid, different position
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeProposal {
    /// The item as it was when the gesture started
    pub item: DragItem,
    /// Proposed placement
    pub placement: Placement,
    /// Proposed start
    pub start: NaiveDate,
    /// Proposed end, using the convention of the item's kind
    pub end: NaiveDate,
}

impl ChangeProposal {
    /// Whether the proposal differs from the item's current position
    pub fn changed(&self) -> bool {
        self.placement != self.item.placement()
            || self.start != self.item.start()
            || self.end != self.item.end()
    }

    /// Campsite the item lands on, `None` for unassigned or global targets
    pub fn campsite_id(&self) -> Option<String> {
        self.placement.campsite_id().map(str::to_string)
    }

    /// Blackout draft for a blackout proposal, keeping its reason
    pub fn blackout_draft(&self) -> Option<BlackoutDraft> {
        let DragItem::Blackout(blackout) = &self.item else {
            return None;
        };

        Some(BlackoutDraft {
            campsite_id: self.campsite_id(),
            start_date: self.start,
            end_date: self.end,
            reason: blackout.reason.clone(),
        })
    }
}
