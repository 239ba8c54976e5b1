use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Cards wider than this are centered in a fixed-width column.
pub const MAX_CARD_WIDTH: u16 = 100;

pub struct AppLayout {
    pub header: Rect,
    pub card: Rect,
    pub status: Rect,
    pub footer: Rect,
}

impl AppLayout {
    pub fn new(area: Rect) -> Self {
        let column = centered_column(area, MAX_CARD_WIDTH);

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(5),
                Constraint::Length(1),
            ])
            .split(column);

        Self {
            header: vertical[0],
            card: vertical[1],
            status: vertical[2],
            footer: vertical[3],
        }
    }
}

pub fn centered_column(area: Rect, max_width: u16) -> Rect {
    if area.width <= max_width {
        return area;
    }
    let margin = (area.width - max_width) / 2;
    Rect::new(area.x + margin, area.y, max_width, area.height)
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
