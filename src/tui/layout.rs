//! Dashboard layout and widget rendering.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::Frame;

use super::runtime::{App, Panel};
use super::style;

/// Renders the full dashboard frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(5),    // active panel
            Constraint::Length(1), // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    match app.panel {
        Panel::Sizing => render_sizing(frame, app, chunks[1]),
        Panel::Layout => render_layout(frame, app, chunks[1]),
        Panel::Events => render_events(frame, app, chunks[1]),
    }
    render_footer(frame, chunks[2]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let header = Line::from(vec![
        Span::styled(
            " DEPOT-SIM ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(app.panel.title(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(" │ period={}s", app.state.bundle.period)),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn render_sizing(frame: &mut Frame, app: &App, area: Rect) {
    let rows: Vec<Row> = app
        .state
        .sizes
        .iter()
        .flat_map(|s| s.areas.iter().map(move |a| (s, a)))
        .skip(app.scroll)
        .map(|(s, a)| {
            Row::new(vec![
                s.vehicle_type.0.to_string(),
                format!("{:?}", a.area_type),
                a.capacity.to_string(),
                s.fleet_size.to_string(),
                format!("{:.1}x{:.1}", a.width_m, a.height_m),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(14),
            Constraint::Length(10),
            Constraint::Length(12),
            Constraint::Length(14),
        ],
    )
    .header(Row::new(vec!["type", "area", "capacity", "fleet_size", "footprint (m)"]))
    .block(Block::default().title(" Fleet Sizing ").borders(Borders::ALL));

    frame.render_widget(table, area);
}

fn render_layout(frame: &mut Frame, app: &App, area: Rect) {
    let rows: Vec<Row> = app
        .state
        .layout
        .placements
        .iter()
        .skip(app.scroll)
        .map(|p| {
            let style = if p.is_driveway {
                Style::default().fg(style::DRIVEWAY_FG)
            } else {
                Style::default().fg(style::AREA_FG)
            };
            Row::new(vec![
                p.area.0.to_string(),
                format!("{:.1}", p.rect.x),
                format!("{:.1}", p.rect.y),
                format!("{:.1}", p.rect.w),
                format!("{:.1}", p.rect.h),
                p.is_driveway.to_string(),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(10),
        ],
    )
    .header(Row::new(vec!["area", "x", "y", "w", "h", "driveway"]))
    .block(Block::default().title(format!(
        " Depot Layout — footprint {:.1}x{:.1}m ",
        app.state.layout.footprint.w, app.state.layout.footprint.h
    )).borders(Borders::ALL));

    frame.render_widget(table, area);
}

fn render_events(frame: &mut Frame, app: &App, area: Rect) {
    let rows: Vec<Row> = app
        .state
        .bundle
        .events
        .iter()
        .skip(app.scroll)
        .map(|e| {
            Row::new(vec![
                e.vehicle.0.to_string(),
                format!("{:?}", e.kind),
                e.area.map_or(String::new(), |a| a.0.to_string()),
                e.time_start.to_string(),
                e.time_end.to_string(),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(18),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(Row::new(vec!["vehicle", "kind", "area", "start", "end"]))
    .block(Block::default().title(" Event Log ").borders(Borders::ALL));

    frame.render_widget(table, area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Tab/shift-Tab:Panel  j/k:Scroll",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
