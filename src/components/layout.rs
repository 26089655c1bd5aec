//! Layout calculations for the UI

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Report screen areas
pub struct ReportLayout {
    /// Title line with row counts
    pub header: Rect,
    pub grid: Rect,
    pub status: Option<Rect>,
    pub help: Rect,
}

/// Calculate centered popup area
pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let popup_x = area.x + (area.width.saturating_sub(width)) / 2;
    let popup_y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(
        popup_x,
        popup_y,
        width.min(area.width),
        height.min(area.height),
    )
}

/// Popup covering `percent` of the area in both directions
pub fn proportional_popup(area: Rect, percent: u16) -> Rect {
    let percent = percent.min(100);
    let width = (area.width as u32 * percent as u32 / 100) as u16;
    let height = (area.height as u32 * percent as u32 / 100) as u16;
    centered_popup(area, width, height)
}

/// Calculate the report screen layout
pub fn calculate_report_layout(area: Rect, has_status: bool) -> ReportLayout {
    let chunks = if has_status {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area)
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area)
    };

    if has_status {
        ReportLayout {
            header: chunks[0],
            grid: chunks[1],
            status: Some(chunks[2]),
            help: chunks[3],
        }
    } else {
        ReportLayout {
            header: chunks[0],
            grid: chunks[1],
            status: None,
            help: chunks[2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_popup_is_clamped() {
        let area = Rect::new(0, 0, 30, 10);
        let popup = centered_popup(area, 40, 7);
        assert_eq!(popup, Rect::new(0, 1, 30, 7));
    }

    #[test]
    fn test_report_layout_with_status() {
        let layout = calculate_report_layout(Rect::new(0, 0, 80, 24), true);
        assert_eq!(layout.header.height, 1);
        assert_eq!(layout.grid.height, 21);
        assert!(layout.status.is_some());
        assert_eq!(layout.help.y, 23);
    }

    #[test]
    fn test_proportional_popup() {
        let popup = proportional_popup(Rect::new(0, 0, 100, 40), 80);
        assert_eq!(popup, Rect::new(10, 4, 80, 32));
    }
}
