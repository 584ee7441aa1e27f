//! TUI rendering: live training dashboard.
//!
//! ┌──────────────────────────────────────────────┐
//! │  🚴 Trainerlink   SIMULATED   03:12  192 ticks│
//! ├───────────┬───────────┬───────────┬──────────┤
//! │ Power     │ Heart Rate│ Cadence   │ Speed    │
//! │ 212 W     │ 141 bpm   │ 88 rpm    │ 31.4 km/h│
//! ├───────────┴───────────┴───────────┴──────────┤
//! │  ╭ power (W)                                 │
//! │  │  ~~~ real   ~~~ simulated                 │
//! │  ╰────────────────────────────────────────── │
//! ├──────────────────────────────────────────────┤
//! │  avg 205 W  max 287 W  ↑ rising   devices…   │
//! ├──────────────────────────────────────────────┤
//! │  t: toggle real/simulated   q: quit          │
//! └──────────────────────────────────────────────┘

use super::app::{App, chart_bounds, format_metric};
use ratatui::{prelude::*, widgets::*};
use trainerlink_core::{MetricKind, SeriesSummary, format_elapsed};

const REAL_COLOR: Color = Color::Cyan;
const SIM_COLOR: Color = Color::Magenta;

pub fn draw(f: &mut Frame, app: &App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Length(4), // metric cards
            Constraint::Min(10),   // chart
            Constraint::Length(5), // stats + devices
            Constraint::Length(1), // keys
        ])
        .split(f.area());

    draw_title(f, rows[0], app);
    draw_cards(f, rows[1], app);
    draw_chart(f, rows[2], app);
    draw_status(f, rows[3], app);
    draw_keys(f, rows[4]);
}

fn draw_title(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.stats();
    let (badge, color) = if app.is_simulated() {
        (" SIMULATED ", SIM_COLOR)
    } else {
        (" REAL ", REAL_COLOR)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" 🚴 Trainerlink ", Style::default().bold().fg(Color::Cyan)),
            Span::styled(badge, Style::default().bold().fg(Color::Black).bg(color)),
            Span::styled(
                format!(
                    "  {}  {} ticks ",
                    format_elapsed(stats.elapsed),
                    stats.elapsed_ticks
                ),
                Style::default().fg(Color::DarkGray),
            ),
        ]));

    f.render_widget(block, area);
}

fn draw_cards(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let values = app.state().displayed_values();
    let color = if app.is_simulated() { SIM_COLOR } else { REAL_COLOR };

    for (i, kind) in MetricKind::ALL.into_iter().enumerate() {
        let text = vec![Line::from(vec![
            Span::styled(
                format_metric(kind, values.get(kind)),
                Style::default().bold().fg(color),
            ),
            Span::raw(format!(" {}", kind.unit())),
        ])];
        let p = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} ", kind.label())),
            );
        f.render_widget(p, cols[i]);
    }
}

fn draw_chart(f: &mut Frame, area: Rect, app: &App) {
    let state = app.state();
    let real = state.power_history.to_xy();
    let simulated = state.simulated_power_history.to_xy();

    if real.is_empty() && simulated.is_empty() {
        let block = Block::default().borders(Borders::ALL).title(" Power ");
        let p = Paragraph::new("Waiting for data…")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    // The active series is drawn last so it sits on top.
    let real_set = Dataset::default()
        .name("real")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(REAL_COLOR))
        .data(&real);
    let sim_set = Dataset::default()
        .name("simulated")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(SIM_COLOR))
        .data(&simulated);
    let datasets = if app.is_simulated() {
        vec![real_set, sim_set]
    } else {
        vec![sim_set, real_set]
    };

    let ([x_min, x_max], [y_min, y_max]) =
        chart_bounds(&state.power_history, &state.simulated_power_history);

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(" Power (W) "))
        .x_axis(
            Axis::default()
                .title("min")
                .bounds([x_min, x_max])
                .labels(vec![
                    Line::from(format!("{x_min:.1}")),
                    Line::from(format!("{x_max:.1}")),
                ]),
        )
        .y_axis(Axis::default().bounds([y_min, y_max]).labels(vec![
            Line::from(format!("{y_min:.0}")),
            Line::from(format!("{y_max:.0}")),
        ]));

    f.render_widget(chart, area);
}

fn summary_spans(label: &str, s: &SeriesSummary, color: Color) -> Vec<Span<'static>> {
    let body = match (s.average, s.max) {
        (Some(avg), Some(max)) => format!(
            "avg {avg:.0} W  max {max:.0} W  {} {}",
            s.trend.arrow(),
            s.trend
        ),
        _ => "no data".to_string(),
    };
    vec![
        Span::styled(format!("{label:<10}"), Style::default().bold().fg(color)),
        Span::raw(body),
    ]
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.stats();
    let mut lines = vec![
        Line::from(summary_spans("real", &stats.real_power, REAL_COLOR)),
        Line::from(summary_spans("simulated", &stats.simulated_power, SIM_COLOR)),
    ];

    let devices = app
        .bound()
        .iter()
        .map(|d| format!("{}: {}", d.role.label(), d.name))
        .collect::<Vec<_>>()
        .join("  ");
    let mut footer = vec![Span::styled(devices, Style::default().fg(Color::DarkGray))];
    if let Some(drift) = stats.clock_drift_secs() {
        footer.push(Span::styled(
            format!("  drift {drift:+.0}s"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if let Some(notice) = app.notice() {
        footer.push(Span::styled(
            format!("  ⚠ {notice}"),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(err) = app.error() {
        footer.push(Span::styled(
            format!("  {err}"),
            Style::default().fg(Color::Red),
        ));
    }
    lines.push(Line::from(footer));

    let block = Block::default().borders(Borders::ALL).title(" Session ");
    let p = Paragraph::new(lines).wrap(Wrap { trim: true }).block(block);
    f.render_widget(p, area);
}

fn draw_keys(f: &mut Frame, area: Rect) {
    let bar = Paragraph::new(" t/space: toggle real/simulated   q: quit")
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}
