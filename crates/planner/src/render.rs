use calendar_grid::{BlockView, DayHeader, DragItem, FrameHandle, GridHost, MonthView, Rect, RowKey, RowView};
use std::fmt::Write;

const LABEL_WIDTH: usize = 18;

/// Host for a session that is only ever composed, never scrolled by a pointer
#[derive(Debug, Default)]
pub struct HeadlessHost {
    next_frame: u64,
    scroll_left: f64,
}

impl GridHost for HeadlessHost {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_frame += 1;
        FrameHandle(self.next_frame)
    }

    fn cancel_frame(&mut self, _handle: FrameHandle) {}

    fn scroll_left(&self) -> f64 {
        self.scroll_left
    }

    fn set_scroll_left(&mut self, value: f64) {
        self.scroll_left = value;
    }

    fn container_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, 1280.0, 720.0)
    }

    fn window_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, 1280.0, 720.0)
    }
}

fn block_char(block: &BlockView) -> char {
    if block.saving {
        return '~';
    }
    match &block.item {
        DragItem::Reservation(_) if block.interactive => 'R',
        DragItem::Reservation(_) => 'r',
        DragItem::Blackout(_) if block.global => '=',
        DragItem::Blackout(_) => 'x',
    }
}

/// One character per day: the top-most block covering it, or `.` when free
pub fn row_cells(row: &RowView, days: &[DayHeader]) -> String {
    days.iter()
        .map(|day| {
            row.blocks
                .iter()
                .rev()
                .find(|b| b.item.start() <= day.date && day.date < b.item.end_exclusive())
                .map(block_char)
                .unwrap_or(if row.is_active { '.' } else { '-' })
        })
        .collect()
}

fn label(row: &RowView) -> String {
    let text = match row.key {
        RowKey::Unassigned => row.name.clone(),
        RowKey::Site(_) => format!("{} {}", row.code, row.name),
    };
    let mut text: String = text.chars().take(LABEL_WIDTH - 1).collect();
    while text.chars().count() < LABEL_WIDTH {
        text.push(' ');
    }
    text
}

/// Draw the month as a fixed-width text grid
pub fn render_month(view: &MonthView) -> String {
    let mut out = String::new();
    let pad = " ".repeat(LABEL_WIDTH);

    let _ = writeln!(out, "{}{}", pad, view.month);

    out.push_str(&pad);
    for day in &view.days {
        let initial = day.weekday.chars().next().unwrap_or(' ');
        let mark = if day.is_weekend { '*' } else { ' ' };
        let _ = write!(out, " {}{}", initial, mark);
    }
    out.push('\n');

    out.push_str(&pad);
    for day in &view.days {
        let _ = write!(out, "{:>3}", day.day);
    }
    out.push('\n');

    for row in &view.rows {
        out.push_str(&label(row));
        for cell in row_cells(row, &view.days).chars() {
            let _ = write!(out, "  {}", cell);
        }
        out.push('\n');
    }

    out.push_str("\nR reservation  r closed  x blackout  = all-sites blackout  ~ saving  - inactive\n");
    out
}

/// One line per reservation in row order
pub fn render_agenda(view: &MonthView) -> Vec<String> {
    let mut lines = Vec::new();

    for row in &view.rows {
        for block in &row.blocks {
            let DragItem::Reservation(reservation) = &block.item else {
                continue;
            };
            let site = if row.code.is_empty() { "--" } else { &row.code };
            lines.push(format!(
                "{:<4} {:<24} {} -> {} ({} nights) {}",
                site,
                block.label,
                reservation.check_in,
                reservation.check_out,
                block.nights.unwrap_or_default(),
                reservation.status.as_str()
            ));
        }
    }

    lines
}
