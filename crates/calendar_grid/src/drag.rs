use campground_model::{add_days, days_between};
use tracing::debug;

use crate::{
    CellRef, ChangeProposal, DragItem, Ghost, GhostMode, ItemKind, OccupancyIndex, RowKey,
    shift_end_preserving_duration,
};

/// Edge of a block being resized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeSide {
    /// Start edge; the end stays pinned
    Start,
    /// End edge; the start stays pinned
    End,
}

/// Reasons a gesture cannot start
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GestureError {
    /// The block's status or saving marker forbids manipulation
    #[error("Item {0} cannot be moved")]
    NotInteractive(String),

    /// Another move or resize already owns the pointer
    #[error("Another gesture is in progress")]
    Busy,
}

/// How a released gesture ended
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Valid, changed position to hand to the caller
    Commit(ChangeProposal),
    /// The pointer never left the block's origin cell
    Clicked(DragItem),
    /// Invalid or unchanged position, the block returns to where it was
    SnapBack,
}

#[derive(Debug, Clone)]
struct MoveGesture {
    pointer_id: u32,
    item: DragItem,
    offset_days: i64,
    origin: CellRef,
    left_origin: bool,
    ghost: Option<Ghost>,
}

#[derive(Debug, Clone)]
struct ResizeGesture {
    pointer_id: u32,
    item: DragItem,
    side: ResizeSide,
    ghost: Option<Ghost>,
}

#[derive(Debug, Clone, Default)]
enum Gesture {
    #[default]
    Idle,
    Moving(MoveGesture),
    Resizing(ResizeGesture),
}

/// Move and edge-resize of existing blocks.
///
/// Only one gesture runs at a time and it is bound to the pointer that started it.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    gesture: Gesture,
}

impl DragController {
    /// Controller with no gesture running
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a move or resize is running
    pub fn is_active(&self) -> bool {
        !matches!(self.gesture, Gesture::Idle)
    }

    /// Whether a whole-block move is running
    pub fn is_moving(&self) -> bool {
        matches!(self.gesture, Gesture::Moving(_))
    }

    /// Whether an edge resize is running
    pub fn is_resizing(&self) -> bool {
        matches!(self.gesture, Gesture::Resizing(_))
    }

    /// Pointer that owns the running gesture
    pub fn pointer_id(&self) -> Option<u32> {
        match &self.gesture {
            Gesture::Idle => None,
            Gesture::Moving(g) => Some(g.pointer_id),
            Gesture::Resizing(g) => Some(g.pointer_id),
        }
    }

    /// Item captured when the running gesture started
    pub fn item(&self) -> Option<&DragItem> {
        match &self.gesture {
            Gesture::Idle => None,
            Gesture::Moving(g) => Some(&g.item),
            Gesture::Resizing(g) => Some(&g.item),
        }
    }

    /// Current preview of the running gesture
    pub fn ghost(&self) -> Option<&Ghost> {
        match &self.gesture {
            Gesture::Idle => None,
            Gesture::Moving(g) => g.ghost.as_ref(),
            Gesture::Resizing(g) => g.ghost.as_ref(),
        }
    }

    /// Preview drawn on `row`, if the running gesture targets it
    pub fn ghost_for_row(&self, row: &RowKey) -> Option<&Ghost> {
        self.ghost().filter(|ghost| ghost.targets_row(row))
    }

    /// Start moving `item`, grabbed over `origin` by `pointer_id`
    pub fn begin_move(
        &mut self,
        pointer_id: u32,
        item: DragItem,
        origin: CellRef,
    ) -> Result<(), GestureError> {
        self.ensure_can_begin(&item)?;

        let offset_days = days_between(item.start(), origin.date);
        debug!(
            "Move started for {} with day offset {}",
            item.id(),
            offset_days
        );

        self.gesture = Gesture::Moving(MoveGesture {
            pointer_id,
            item,
            offset_days,
            origin,
            left_origin: false,
            ghost: None,
        });
        Ok(())
    }

    /// Start resizing one edge of `item`
    pub fn begin_resize(
        &mut self,
        pointer_id: u32,
        item: DragItem,
        side: ResizeSide,
    ) -> Result<(), GestureError> {
        self.ensure_can_begin(&item)?;
        debug!("Resize of {:?} edge started for {}", side, item.id());

        self.gesture = Gesture::Resizing(ResizeGesture {
            pointer_id,
            item,
            side,
            ghost: None,
        });
        Ok(())
    }

    fn ensure_can_begin(&self, item: &DragItem) -> Result<(), GestureError> {
        if self.is_active() {
            return Err(GestureError::Busy);
        }
        if !item.is_interactive() {
            return Err(GestureError::NotInteractive(item.id().to_string()));
        }
        Ok(())
    }

    /// Recompute the preview for the pointer over `cell`. Returns whether the ghost changed.
    pub fn update(&mut self, pointer_id: u32, cell: &CellRef, index: &OccupancyIndex) -> bool {
        match &mut self.gesture {
            Gesture::Idle => false,
            Gesture::Moving(g) => {
                if g.pointer_id != pointer_id {
                    return false;
                }
                if *cell != g.origin {
                    g.left_origin = true;
                }

                // A row the item cannot live on keeps the previous preview.
                let Some(placement) = g.item.placement_on(&cell.row) else {
                    return false;
                };

                let start = add_days(cell.date, -g.offset_days);
                let end = shift_end_preserving_duration(g.item.start(), g.item.end(), start);
                let error = index
                    .validate(&g.item.candidate(&placement, start, end))
                    .err();

                let ghost = Ghost {
                    mode: GhostMode::Move,
                    kind: g.item.kind(),
                    placement,
                    start,
                    end,
                    error,
                };
                replace_ghost(&mut g.ghost, ghost)
            }
            Gesture::Resizing(g) => {
                if g.pointer_id != pointer_id {
                    return false;
                }

                let placement = g.item.placement();
                let (mode, start, end) = match g.side {
                    ResizeSide::Start => (GhostMode::ResizeStart, cell.date, g.item.end()),
                    ResizeSide::End => {
                        let end = match g.item.kind() {
                            ItemKind::Reservation => add_days(cell.date, 1),
                            ItemKind::Blackout => cell.date,
                        };
                        (GhostMode::ResizeEnd, g.item.start(), end)
                    }
                };
                let error = index
                    .validate_resize(&g.item.candidate(&placement, start, end))
                    .err();

                let ghost = Ghost {
                    mode,
                    kind: g.item.kind(),
                    placement,
                    start,
                    end,
                    error,
                };
                replace_ghost(&mut g.ghost, ghost)
            }
        }
    }

    /// Revalidate the current ghost against a new snapshot without moving it
    pub fn revalidate(&mut self, index: &OccupancyIndex) {
        let (item, ghost, resize) = match &mut self.gesture {
            Gesture::Idle => return,
            Gesture::Moving(g) => (&g.item, &mut g.ghost, false),
            Gesture::Resizing(g) => (&g.item, &mut g.ghost, true),
        };
        let Some(ghost) = ghost else {
            return;
        };

        let candidate = item.candidate(&ghost.placement, ghost.start, ghost.end);
        ghost.error = if resize {
            index.validate_resize(&candidate).err()
        } else {
            index.validate(&candidate).err()
        };
    }

    /// Release `pointer_id`. Returns `None` when that pointer owns no gesture.
    pub fn finish(&mut self, pointer_id: u32) -> Option<DragOutcome> {
        if self.pointer_id() != Some(pointer_id) {
            return None;
        }

        let outcome = match std::mem::take(&mut self.gesture) {
            Gesture::Idle => return None,
            Gesture::Moving(g) if !g.left_origin => DragOutcome::Clicked(g.item),
            Gesture::Moving(MoveGesture { item, ghost, .. })
            | Gesture::Resizing(ResizeGesture { item, ghost, .. }) => proposal(item, ghost),
        };

        match &outcome {
            DragOutcome::Commit(p) => debug!(
                "Gesture on {} released at {:?} {} to {}",
                p.item.id(),
                p.placement,
                p.start,
                p.end
            ),
            DragOutcome::Clicked(item) => debug!("Block {} clicked", item.id()),
            DragOutcome::SnapBack => debug!("Gesture released without a change"),
        }
        Some(outcome)
    }

    /// Abort the running gesture. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        debug!("Gesture cancelled");
        self.gesture = Gesture::Idle;
        true
    }
}

fn replace_ghost(slot: &mut Option<Ghost>, ghost: Ghost) -> bool {
    if slot.as_ref() == Some(&ghost) {
        return false;
    }
    *slot = Some(ghost);
    true
}

fn proposal(item: DragItem, ghost: Option<Ghost>) -> DragOutcome {
    let Some(ghost) = ghost.filter(Ghost::is_valid) else {
        return DragOutcome::SnapBack;
    };

    let proposal = ChangeProposal {
        item,
        placement: ghost.placement,
        start: ghost.start,
        end: ghost.end,
    };
    if proposal.changed() {
        DragOutcome::Commit(proposal)
    } else {
        DragOutcome::SnapBack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campground_model::{
        Blackout, CalendarSnapshot, CampingUnit, Campsite, CampsiteType, MonthRange, Placement,
        Reservation, ReservationStatus,
    };
    use chrono::NaiveDate;

    use crate::ValidationError;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn site(id: &str) -> Campsite {
        Campsite {
            id: id.to_string(),
            code: id.to_uppercase(),
            name: id.to_string(),
            campsite_type: CampsiteType::Rv,
            max_guests: 6,
            sort_order: 0,
            notes: None,
            is_active: true,
        }
    }

    fn booking(id: &str, site: Option<&str>, start: &str, end: &str) -> Reservation {
        Reservation {
            id: id.to_string(),
            campsite_id: site.map(str::to_string),
            check_in: date(start),
            check_out: date(end),
            status: ReservationStatus::Confirmed,
            first_name: "Guest".to_string(),
            last_name: id.to_string(),
            email: None,
            phone: None,
            contact_method: None,
            adults: 2,
            children: 0,
            camping_unit: CampingUnit::Motorhome,
            rv_length: None,
            rv_year: None,
            saving: false,
        }
    }

    fn blackout(id: &str, site: Option<&str>, start: &str, end: &str) -> Blackout {
        Blackout {
            id: id.to_string(),
            campsite_id: site.map(str::to_string),
            start_date: date(start),
            end_date: date(end),
            reason: "Repairs".to_string(),
            saving: false,
        }
    }

    fn cell(row: &str, day: &str) -> CellRef {
        let row = match row {
            "unassigned" => RowKey::Unassigned,
            id => RowKey::Site(id.to_string()),
        };
        CellRef {
            row,
            date: date(day),
        }
    }

    fn index(snapshot: CalendarSnapshot) -> OccupancyIndex {
        OccupancyIndex::from_snapshot(snapshot)
    }

    #[test]
    fn test_move_preserves_duration_and_commits() {
        let a = booking("a", Some("s1"), "2024-06-01", "2024-06-05");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1"), site("s2")],
            reservations: vec![a.clone()],
            blackouts: vec![],
        });
        let mut drag = DragController::new();

        // grabbed on its third night
        drag.begin_move(1, DragItem::Reservation(a), cell("s1", "2024-06-03"))
            .unwrap();
        assert!(drag.update(1, &cell("s2", "2024-06-12"), &index));

        let ghost = drag.ghost().unwrap();
        assert_eq!(ghost.start, date("2024-06-10"));
        assert_eq!(ghost.end, date("2024-06-14"));
        assert!(ghost.is_valid());
        assert!(drag.ghost_for_row(&RowKey::Site("s2".to_string())).is_some());
        assert!(drag.ghost_for_row(&RowKey::Site("s1".to_string())).is_none());

        let Some(DragOutcome::Commit(proposal)) = drag.finish(1) else {
            panic!("expected a commit");
        };
        assert_eq!(proposal.placement, Placement::Site("s2".to_string()));
        assert_eq!(
            days_between(proposal.start, proposal.end),
            days_between(date("2024-06-01"), date("2024-06-05"))
        );
        assert!(!drag.is_active());
    }

    #[test]
    fn test_release_without_leaving_origin_is_a_click() {
        let a = booking("a", Some("s1"), "2024-06-01", "2024-06-05");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1")],
            reservations: vec![a.clone()],
            blackouts: vec![],
        });
        let mut drag = DragController::new();

        drag.begin_move(1, DragItem::Reservation(a), cell("s1", "2024-06-02"))
            .unwrap();
        drag.update(1, &cell("s1", "2024-06-02"), &index);
        assert!(matches!(drag.finish(1), Some(DragOutcome::Clicked(_))));
    }

    #[test]
    fn test_drag_away_and_back_snaps_back() {
        let a = booking("a", Some("s1"), "2024-06-01", "2024-06-05");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1")],
            reservations: vec![a.clone()],
            blackouts: vec![],
        });
        let mut drag = DragController::new();

        drag.begin_move(1, DragItem::Reservation(a), cell("s1", "2024-06-02"))
            .unwrap();
        drag.update(1, &cell("s1", "2024-06-09"), &index);
        drag.update(1, &cell("s1", "2024-06-02"), &index);
        assert_eq!(drag.finish(1), Some(DragOutcome::SnapBack));
    }

    #[test]
    fn test_invalid_drop_snaps_back() {
        let a = booking("a", Some("s1"), "2024-06-01", "2024-06-03");
        let b = booking("b", Some("s2"), "2024-06-01", "2024-06-10");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1"), site("s2")],
            reservations: vec![a.clone(), b],
            blackouts: vec![],
        });
        let mut drag = DragController::new();

        drag.begin_move(1, DragItem::Reservation(a), cell("s1", "2024-06-01"))
            .unwrap();
        drag.update(1, &cell("s2", "2024-06-04"), &index);
        assert!(!drag.ghost().unwrap().is_valid());
        assert_eq!(drag.finish(1), Some(DragOutcome::SnapBack));
    }

    #[test]
    fn test_other_pointers_are_ignored() {
        let a = booking("a", Some("s1"), "2024-06-01", "2024-06-03");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1")],
            reservations: vec![a.clone()],
            blackouts: vec![],
        });
        let mut drag = DragController::new();

        drag.begin_move(7, DragItem::Reservation(a.clone()), cell("s1", "2024-06-01"))
            .unwrap();
        assert!(!drag.update(8, &cell("s1", "2024-06-10"), &index));
        assert_eq!(drag.finish(8), None);
        assert!(drag.is_active());
        assert_eq!(
            drag.begin_move(8, DragItem::Reservation(a), cell("s1", "2024-06-01")),
            Err(GestureError::Busy)
        );
    }

    #[test]
    fn test_non_interactive_items_cannot_be_grabbed() {
        let mut checked_out = booking("a", Some("s1"), "2024-06-01", "2024-06-03");
        checked_out.status = ReservationStatus::CheckedOut;
        let mut drag = DragController::new();

        assert!(matches!(
            drag.begin_move(1, DragItem::Reservation(checked_out), cell("s1", "2024-06-01")),
            Err(GestureError::NotInteractive(_))
        ));

        let mut saving = blackout("x", Some("s1"), "2024-06-05", "2024-06-06");
        saving.saving = true;
        assert!(matches!(
            drag.begin_resize(1, DragItem::Blackout(saving), ResizeSide::End),
            Err(GestureError::NotInteractive(_))
        ));
    }

    #[test]
    fn test_resize_end_of_reservation_includes_hovered_night() {
        let a = booking("a", Some("s1"), "2024-06-01", "2024-06-03");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1")],
            reservations: vec![a.clone()],
            blackouts: vec![],
        });
        let mut drag = DragController::new();

        drag.begin_resize(1, DragItem::Reservation(a), ResizeSide::End)
            .unwrap();
        drag.update(1, &cell("s1", "2024-06-06"), &index);
        let ghost = drag.ghost().unwrap();
        assert_eq!(ghost.mode, GhostMode::ResizeEnd);
        assert_eq!(ghost.start, date("2024-06-01"));
        assert_eq!(ghost.end, date("2024-06-07"));

        let Some(DragOutcome::Commit(proposal)) = drag.finish(1) else {
            panic!("expected a commit");
        };
        assert_eq!(proposal.end, date("2024-06-07"));
    }

    #[test]
    fn test_resize_start_past_end_is_rejected() {
        let a = booking("a", Some("s1"), "2024-06-10", "2024-06-12");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1")],
            reservations: vec![a.clone()],
            blackouts: vec![],
        });
        let mut drag = DragController::new();

        drag.begin_resize(1, DragItem::Reservation(a), ResizeSide::Start)
            .unwrap();
        drag.update(1, &cell("s1", "2024-06-12"), &index);
        let ghost = drag.ghost().unwrap();
        assert_eq!(ghost.error, Some(ValidationError::MinimumDuration));
        assert_eq!(ghost.error_message().unwrap(), "Minimum 1 night required");
        assert_eq!(drag.finish(1), Some(DragOutcome::SnapBack));
    }

    #[test]
    fn test_resize_end_of_blackout_uses_hovered_day() {
        let x = blackout("x", Some("s1"), "2024-07-01", "2024-07-02");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1")],
            reservations: vec![],
            blackouts: vec![x.clone()],
        });
        let mut drag = DragController::new();

        drag.begin_resize(1, DragItem::Blackout(x), ResizeSide::End)
            .unwrap();
        drag.update(1, &cell("s1", "2024-07-01"), &index);
        let ghost = drag.ghost().unwrap();
        assert_eq!(ghost.end, date("2024-07-01"));
        assert!(ghost.is_valid());
    }

    #[test]
    fn test_blackout_dropped_next_to_booking_checkout() {
        let b1 = booking("b1", Some("s1"), "2024-07-10", "2024-07-12");
        let x = blackout("x", Some("s1"), "2024-07-01", "2024-07-03");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1")],
            reservations: vec![b1],
            blackouts: vec![x.clone()],
        });
        let mut drag = DragController::new();

        drag.begin_move(1, DragItem::Blackout(x.clone()), cell("s1", "2024-07-01"))
            .unwrap();
        drag.update(1, &cell("s1", "2024-07-11"), &index);
        let message = drag.ghost().unwrap().error_message().unwrap();
        assert!(message.contains("conflict"));

        drag.update(1, &cell("s1", "2024-07-12"), &index);
        assert!(drag.ghost().unwrap().is_valid());
        assert!(matches!(drag.finish(1), Some(DragOutcome::Commit(_))));
    }

    #[test]
    fn test_site_blackout_keeps_ghost_over_unassigned_row() {
        let x = blackout("x", Some("s1"), "2024-07-01", "2024-07-01");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1")],
            reservations: vec![],
            blackouts: vec![x.clone()],
        });
        let mut drag = DragController::new();

        drag.begin_move(1, DragItem::Blackout(x), cell("s1", "2024-07-01"))
            .unwrap();
        drag.update(1, &cell("s1", "2024-07-04"), &index);
        assert!(!drag.update(1, &cell("unassigned", "2024-07-06"), &index));
        assert_eq!(drag.ghost().unwrap().start, date("2024-07-04"));
    }

    #[test]
    fn test_global_blackout_moves_across_every_site() {
        let xmas = blackout("xmas", None, "2024-12-24", "2024-12-26");
        let late = booking("late", Some("s2"), "2024-12-27", "2024-12-29");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1"), site("s2")],
            reservations: vec![late],
            blackouts: vec![xmas.clone()],
        })
        .with_display_window(MonthRange::new(2024, 12).unwrap());
        let mut drag = DragController::new();

        drag.begin_move(1, DragItem::Blackout(xmas), cell("s1", "2024-12-24"))
            .unwrap();
        drag.update(1, &cell("s1", "2024-12-26"), &index);
        let ghost = drag.ghost().unwrap();
        assert_eq!(ghost.placement, Placement::AllSites);
        assert!(matches!(
            ghost.error,
            Some(ValidationError::ReservationConflict { .. })
        ));
        assert!(drag.ghost_for_row(&RowKey::Site("s1".to_string())).is_some());
        assert!(drag.ghost_for_row(&RowKey::Unassigned).is_none());

        drag.update(1, &cell("s2", "2024-12-17"), &index);
        assert!(drag.ghost().unwrap().is_valid());
        let Some(DragOutcome::Commit(proposal)) = drag.finish(1) else {
            panic!("expected a commit");
        };
        assert_eq!(proposal.blackout_draft().unwrap().campsite_id, None);
    }

    #[test]
    fn test_unassigned_reservation_moves_onto_a_site() {
        let a = booking("a", None, "2024-06-01", "2024-06-03");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1")],
            reservations: vec![a.clone()],
            blackouts: vec![],
        });
        let mut drag = DragController::new();

        drag.begin_move(1, DragItem::Reservation(a), cell("unassigned", "2024-06-01"))
            .unwrap();
        drag.update(1, &cell("s1", "2024-06-01"), &index);
        let Some(DragOutcome::Commit(proposal)) = drag.finish(1) else {
            panic!("expected a commit");
        };
        assert_eq!(proposal.campsite_id().as_deref(), Some("s1"));
        assert_eq!(proposal.start, date("2024-06-01"));
    }

    #[test]
    fn test_cancel_leaves_no_state() {
        let a = booking("a", Some("s1"), "2024-06-01", "2024-06-03");
        let index = index(CalendarSnapshot {
            campsites: vec![site("s1")],
            reservations: vec![a.clone()],
            blackouts: vec![],
        });
        let mut drag = DragController::new();

        drag.begin_move(1, DragItem::Reservation(a), cell("s1", "2024-06-01"))
            .unwrap();
        drag.update(1, &cell("s1", "2024-06-20"), &index);
        assert!(drag.cancel());
        assert!(!drag.is_active());
        assert!(drag.ghost().is_none());
        assert_eq!(drag.finish(1), None);
    }
}
