use std::sync::Arc;
use std::time::Duration;

use campground_model::{Blackout, CalendarSnapshot, MonthRange, Reservation};
use tracing::{debug, info, warn};

use crate::{
    AutoScroll, BlockZone, ChangeProposal, DragController, DragItem, DragOutcome, FrameGate,
    FrameHandle, Ghost, GridHost, GridLayout, InteractionConfig, MonthView, OccupancyIndex,
    PanController, ResizeSide, RowKey, SelectionMachine, SelectionRange, block_hit,
    blocks_for_row, row_keys,
};

/// Mouse button or touch contact behind a pointer event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button, touch or pen contact
    Primary,
    /// Middle button
    Auxiliary,
    /// Right button
    Secondary,
}

/// A pointer sample in viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Identifier of the pointer
    pub pointer_id: u32,
    /// Viewport x
    pub x: f64,
    /// Viewport y
    pub y: f64,
    /// Button pressed
    pub button: PointerButton,
    /// Event time since an arbitrary origin
    pub timestamp: Duration,
}

/// Keys the grid reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Cancels any gesture
    Escape,
    /// Held to pan
    Space,
    /// Modifier for wheel panning
    Shift,
    /// Anything else
    Other,
}

/// Raw input delivered by the host
#[derive(Debug, Clone, PartialEq)]
pub enum GridInput {
    /// Pointer pressed
    PointerDown(PointerEvent),
    /// Pointer moved
    PointerMove(PointerEvent),
    /// Pointer released
    PointerUp(PointerEvent),
    /// The platform took the pointer away
    PointerCancel {
        /// Pointer that was cancelled
        pointer_id: u32,
    },
    /// Pointer left the scrollable region
    PointerLeave,
    /// Key pressed
    KeyDown(Key),
    /// Key released
    KeyUp(Key),
    /// Wheel notch
    Wheel {
        /// Vertical wheel delta
        delta_y: f64,
        /// Shift held during the notch
        shift: bool,
    },
    /// Window lost focus
    Blur,
    /// An animation frame requested through [`GridHost::request_frame`] fired
    Frame(FrameHandle),
}

/// What a finished gesture asks the caller to do
#[derive(Debug, Clone, PartialEq)]
pub enum GridEvent {
    /// Open the details of a reservation
    ReservationClicked(Reservation),
    /// Open the details of a blackout
    BlackoutClicked(Blackout),
    /// Confirm and apply a move or resize
    MoveRequested(ChangeProposal),
    /// Offer a new booking or blackout over the selected range
    CreateRequested(SelectionRange),
}

impl GridEvent {
    fn clicked(item: DragItem) -> Self {
        match item {
            DragItem::Reservation(r) => GridEvent::ReservationClicked(r),
            DragItem::Blackout(b) => GridEvent::BlackoutClicked(b),
        }
    }
}

/// One scheduling grid and every gesture running on it.
///
/// The session owns the indexed snapshot, the layout and the gesture machines.
/// At most one of selection, move, resize and pan runs at a time.
pub struct InteractionSession<H: GridHost> {
    host: H,
    config: InteractionConfig,
    index: OccupancyIndex,
    layout: GridLayout,
    selection: SelectionMachine,
    drag: DragController,
    auto_scroll: AutoScroll,
    pan: PanController,
    gate: FrameGate,
    pending_move: Option<PointerEvent>,
    last_pointer: Option<PointerEvent>,
    pressed_block: Option<(u32, DragItem)>,
}

impl<H: GridHost> InteractionSession<H> {
    /// Session showing `month` of `snapshot` inside `host`
    pub fn new(
        host: H,
        snapshot: Arc<CalendarSnapshot>,
        month: MonthRange,
        config: Option<InteractionConfig>,
    ) -> Self {
        let config = config.unwrap_or_default();
        let index = OccupancyIndex::new(snapshot).with_display_window(month);
        let layout = GridLayout::new(month, row_keys(&index), config.metrics);

        let mut session = Self {
            auto_scroll: AutoScroll::new(&config),
            pan: PanController::new(config.metrics.day_width),
            gate: FrameGate::new(config.frame_interval),
            host,
            config,
            index,
            layout,
            selection: SelectionMachine::new(),
            drag: DragController::new(),
            pending_move: None,
            last_pointer: None,
            pressed_block: None,
        };
        session.sync_layout();
        session
    }

    /// The embedding host
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The embedding host, mutably
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Indexed snapshot the grid validates against
    pub fn index(&self) -> &OccupancyIndex {
        &self.index
    }

    /// Layout as of the last event
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Range selection state
    pub fn selection(&self) -> &SelectionMachine {
        &self.selection
    }

    /// Move and resize state
    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Whether the auto-scroll loop has a frame pending
    pub fn is_auto_scrolling(&self) -> bool {
        self.auto_scroll.is_running()
    }

    /// Whether no gesture is running and no prompt is open
    pub fn is_idle(&self) -> bool {
        !self.drag.is_active()
            && !self.pan.is_panning()
            && self.selection.range().is_none()
            && self.pressed_block.is_none()
    }

    /// Replace the snapshot. A running gesture keeps its captured item and its
    /// ghost is revalidated against the new data.
    pub fn set_snapshot(&mut self, snapshot: Arc<CalendarSnapshot>) {
        self.index = OccupancyIndex::new(snapshot).with_display_window(self.layout.month);
        self.layout.rows = row_keys(&self.index);
        self.drag.revalidate(&self.index);
    }

    /// Show another month. Any gesture or open prompt is discarded.
    pub fn set_month(&mut self, month: MonthRange) {
        self.cancel_all();
        self.selection.dismiss();
        self.index.set_display_window(Some(month));
        self.layout.month = month;
        self.layout.rows = row_keys(&self.index);
        self.host.set_scroll_left(0.0);
        self.sync_layout();
    }

    /// Close the creation prompt opened by [`GridEvent::CreateRequested`]
    pub fn dismiss_creation(&mut self) -> Option<SelectionRange> {
        self.selection.dismiss()
    }

    /// Ghost drawn on `row`: move, then resize, then selection
    pub fn ghost_for_row(&self, row: &RowKey) -> Option<Ghost> {
        if let Some(ghost) = self.drag.ghost_for_row(row) {
            return Some(ghost.clone());
        }
        if self.drag.is_active() {
            return None;
        }
        self.selection
            .ghost(&self.index)
            .filter(|ghost| ghost.targets_row(row))
    }

    /// Compose the month as it should be drawn now
    pub fn compose_view(&self) -> MonthView {
        let drag_ghost = self.drag.ghost().cloned();
        let selection_ghost = if self.drag.is_active() {
            None
        } else {
            self.selection.ghost(&self.index)
        };

        MonthView::compose(
            &self.index,
            &self.layout.month,
            |row| {
                drag_ghost
                    .as_ref()
                    .or(selection_ghost.as_ref())
                    .filter(|ghost| ghost.targets_row(row))
                    .cloned()
            },
            self.selection.range(),
        )
    }

    /// Feed one input event. Returns the event a finished gesture produced.
    pub fn handle(&mut self, input: GridInput) -> Option<GridEvent> {
        self.sync_layout();

        match input {
            GridInput::PointerDown(event) => self.pointer_down(event),
            GridInput::PointerMove(event) => {
                self.pointer_move(event);
                None
            }
            GridInput::PointerUp(event) => self.pointer_up(event),
            GridInput::PointerCancel { pointer_id } => {
                debug!("Pointer {} cancelled", pointer_id);
                self.cancel_all();
                None
            }
            GridInput::PointerLeave => {
                self.pan.set_hovering(false);
                if self.selection.cancel() {
                    self.end_pointer_tracking();
                }
                None
            }
            GridInput::KeyDown(Key::Escape) | GridInput::Blur => {
                self.cancel_all();
                None
            }
            GridInput::KeyDown(Key::Space) => {
                self.pan.set_space_held(true);
                None
            }
            GridInput::KeyUp(Key::Space) => {
                self.pan.set_space_held(false);
                None
            }
            GridInput::KeyDown(_) | GridInput::KeyUp(_) => None,
            GridInput::Wheel { delta_y, shift } => {
                let max = self.layout.max_scroll_left();
                if let Some(scroll) = self.pan.wheel(delta_y, shift, self.layout.scroll_left, max) {
                    self.scroll_to(scroll);
                }
                None
            }
            GridInput::Frame(handle) => {
                self.frame(handle);
                None
            }
        }
    }

    fn pointer_down(&mut self, event: PointerEvent) -> Option<GridEvent> {
        if event.button != PointerButton::Primary {
            return None;
        }
        if self.drag.is_active() || self.pan.is_panning() || self.pressed_block.is_some() {
            return None;
        }

        let over_header = self.layout.is_over_header(event.x, event.y);
        if self
            .pan
            .try_begin(event.pointer_id, event.x, over_header, self.layout.scroll_left)
        {
            return None;
        }

        let cell = self.layout.cell_for_pointer(event.x, event.y)?;

        // A pending second click belongs to the selection, whatever lies under it.
        if self.selection.is_selecting() {
            let range = self.selection.pointer_down(&cell, &self.index);
            return self.finish_selection(range);
        }
        if self.selection.range().is_some() {
            return None;
        }

        let blocks = blocks_for_row(&self.index, &cell.row, &self.layout.month);
        if let Some((block, zone)) = block_hit(event.x, &self.layout, &blocks, self.config.handle_width_px) {
            let item = block.item.clone();
            if !block.interactive {
                // Blocks that do not occupy their days (cancelled, no-show) let a selection start.
                if !self.index.is_cell_selectable(&cell.row, cell.date) {
                    self.pressed_block = Some((event.pointer_id, item));
                    return None;
                }
                self.selection.pointer_down(&cell, &self.index);
                self.gate.reset();
                return None;
            }

            let started = match zone {
                BlockZone::Body => self.drag.begin_move(event.pointer_id, item, cell),
                BlockZone::StartHandle => {
                    self.drag.begin_resize(event.pointer_id, item, ResizeSide::Start)
                }
                BlockZone::EndHandle => self.drag.begin_resize(event.pointer_id, item, ResizeSide::End),
            };
            if let Err(e) = started {
                debug!("Gesture not started: {}", e);
            }
            self.gate.reset();
            return None;
        }

        self.selection.pointer_down(&cell, &self.index);
        self.gate.reset();
        None
    }

    fn pointer_move(&mut self, event: PointerEvent) {
        let container = self.host.container_rect();
        self.pan.set_hovering(container.contains(event.x, event.y));

        if self.pan.is_panning() {
            let max = self.layout.max_scroll_left();
            if let Some(scroll) = self.pan.update(event.pointer_id, event.x, max) {
                self.scroll_to(scroll);
            }
            return;
        }

        let dragging = self.drag.pointer_id() == Some(event.pointer_id);
        if !dragging && !self.selection.is_selecting() {
            return;
        }

        if dragging || self.selection.is_selecting() {
            self.last_pointer = Some(event);
            self.auto_scroll
                .update_scroll_direction(&mut self.host, event.x, event.y);
        }

        if self.gate.ready(event.timestamp) {
            self.pending_move = None;
            self.apply_pointer(&event);
        } else {
            self.pending_move = Some(event);
        }
    }

    fn pointer_up(&mut self, event: PointerEvent) -> Option<GridEvent> {
        if self.pan.finish(event.pointer_id) {
            return None;
        }

        if let Some((pointer_id, item)) = self.pressed_block.take() {
            if pointer_id == event.pointer_id {
                return Some(GridEvent::clicked(item));
            }
            self.pressed_block = Some((pointer_id, item));
            return None;
        }

        if self.drag.pointer_id() == Some(event.pointer_id) {
            self.flush_pending_move();
            let outcome = self.drag.finish(event.pointer_id);
            self.end_pointer_tracking();

            return match outcome? {
                DragOutcome::Commit(proposal) => {
                    info!(
                        "Change requested for {}: {:?} {} to {}",
                        proposal.item.id(),
                        proposal.placement,
                        proposal.start,
                        proposal.end
                    );
                    Some(GridEvent::MoveRequested(proposal))
                }
                DragOutcome::Clicked(item) => Some(GridEvent::clicked(item)),
                DragOutcome::SnapBack => None,
            };
        }

        if self.selection.is_selecting() {
            self.flush_pending_move();
            let range = self.selection.pointer_up();
            return self.finish_selection(range);
        }

        None
    }

    fn finish_selection(&mut self, range: Option<SelectionRange>) -> Option<GridEvent> {
        if !self.selection.is_selecting() {
            self.end_pointer_tracking();
        }
        let range = range?;

        if let Some(error) = self.selection.ghost(&self.index).and_then(|ghost| ghost.error) {
            warn!("Selection {} to {} dropped: {}", range.start(), range.end(), error);
            self.selection.dismiss();
            return None;
        }
        Some(GridEvent::CreateRequested(range))
    }

    fn frame(&mut self, handle: FrameHandle) {
        let max = self.layout.max_scroll_left();
        if !self.auto_scroll.on_frame(&mut self.host, handle, max) {
            return;
        }

        self.layout.scroll_left = self.host.scroll_left();
        // Content moved under a still pointer: the hovered cell changed.
        if let Some(event) = self.last_pointer {
            self.apply_pointer(&event);
        }
    }

    fn apply_pointer(&mut self, event: &PointerEvent) {
        let Some(cell) = self.layout.cell_for_pointer(event.x, event.y) else {
            return;
        };

        if self.drag.is_active() {
            self.drag.update(event.pointer_id, &cell, &self.index);
        } else if self.selection.is_selecting() {
            self.selection.pointer_move(&cell, &self.index);
        }
    }

    fn flush_pending_move(&mut self) {
        if let Some(event) = self.pending_move.take() {
            self.apply_pointer(&event);
        }
    }

    fn scroll_to(&mut self, scroll: f64) {
        self.host.set_scroll_left(scroll);
        self.layout.scroll_left = scroll;
    }

    fn end_pointer_tracking(&mut self) {
        self.auto_scroll.stop(&mut self.host);
        self.pending_move = None;
        self.last_pointer = None;
        self.gate.reset();
    }

    fn cancel_all(&mut self) {
        self.drag.cancel();
        self.selection.cancel();
        self.pan.cancel();
        self.pressed_block = None;
        self.end_pointer_tracking();
    }

    fn sync_layout(&mut self) {
        let container = self.host.container_rect();
        self.layout.origin_x = container.left;
        self.layout.origin_y = container.top;
        self.layout.visible_width = container.width;
        self.layout.scroll_left = self.host.scroll_left();
    }
}

impl<H: GridHost> Drop for InteractionSession<H> {
    fn drop(&mut self) {
        self.auto_scroll.stop(&mut self.host);
    }
}
