//! TUI application state and event loop.
//!
//! The session runs on the tokio runtime; the dashboard only reads published
//! state versions and enqueues toggle events, so drawing never blocks a feed.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use trainerlink_core::{
    ActiveSource, Device, Event as SessionEvent, History, MetricKind, SessionHandle, SessionState,
    SessionStats,
};

/// Redraw cadence. State versions arrive at most once per reading anyway.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Pure view helpers
// ---------------------------------------------------------------------------

/// Format a metric value the way the dashboard cards show it.
pub fn format_metric(kind: MetricKind, value: f64) -> String {
    match kind {
        MetricKind::Speed => format!("{value:.1}"),
        _ => format!("{value:.0}"),
    }
}

/// Axis bounds covering both power series, padded so lines never touch the frame.
pub fn chart_bounds(real: &History, simulated: &History) -> ([f64; 2], [f64; 2]) {
    let points: Vec<(f64, f64)> = real
        .iter()
        .chain(simulated.iter())
        .map(|p| (p.time_offset_minutes, p.value))
        .collect();
    if points.is_empty() {
        return ([0.0, 1.0], [0.0, 400.0]);
    }

    let x_min = points.iter().map(|p| p.0).fold(f64::MAX, f64::min);
    let x_max = points.iter().map(|p| p.0).fold(f64::MIN, f64::max);
    let y_min = points.iter().map(|p| p.1).fold(f64::MAX, f64::min);
    let y_max = points.iter().map(|p| p.1).fold(f64::MIN, f64::max);

    let x_max = if x_max - x_min < 1.0 / 60.0 { x_min + 1.0 / 60.0 } else { x_max };
    let pad = ((y_max - y_min) * 0.1).max(10.0);
    ([x_min, x_max], [(y_min - pad).max(0.0), y_max + pad])
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    handle: SessionHandle,
    state: Arc<SessionState>,
    bound: Vec<Device>,
    notice: Option<String>,
    error: Option<String>,
    running: bool,
}

impl App {
    pub fn new(handle: SessionHandle, bound: Vec<Device>, notice: Option<String>) -> Self {
        let state = handle.snapshot();
        Self {
            handle,
            state,
            bound,
            notice,
            error: None,
            running: true,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Restore the terminal before a panic message is printed.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        let _ = std::panic::take_hook();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            self.state = self.handle.snapshot();
            terminal.draw(|f| super::ui::draw(f, self))?;

            if event::poll(FRAME_INTERVAL)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('t') | KeyCode::Char(' ') => {
                // Keep drawing so the error is visible until the user quits.
                if let Err(e) = self.handle.dispatch_blocking(SessionEvent::ToggleSimulation) {
                    self.error = Some(e.to_string());
                }
            }
            _ => {}
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats::from_state(&self.state)
    }

    pub fn is_simulated(&self) -> bool {
        self.state.active_source == ActiveSource::Simulated
    }

    pub fn bound(&self) -> &[Device] {
        &self.bound
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainerlink_core::{HistoryPoint, SessionRuntime, TrainerConfig};

    fn history(points: &[(f64, f64)]) -> History {
        points.iter().fold(History::with_capacity(50), |h, &(t, v)| {
            h.appended(HistoryPoint {
                time_offset_minutes: t,
                value: v,
            })
        })
    }

    #[test]
    fn format_metric_rounds_like_cards() {
        assert_eq!(format_metric(MetricKind::Power, 201.6), "202");
        assert_eq!(format_metric(MetricKind::HeartRate, 140.0), "140");
        assert_eq!(format_metric(MetricKind::Speed, 31.26), "31.3");
        assert_eq!(format_metric(MetricKind::Speed, 0.0), "0.0");
    }

    #[test]
    fn chart_bounds_empty_uses_defaults() {
        let empty = History::with_capacity(50);
        assert_eq!(chart_bounds(&empty, &empty), ([0.0, 1.0], [0.0, 400.0]));
    }

    #[test]
    fn chart_bounds_cover_both_series() {
        let real = history(&[(0.0, 150.0), (0.5, 250.0)]);
        let sim = history(&[(0.25, 120.0), (1.0, 200.0)]);
        let ([x0, x1], [y0, y1]) = chart_bounds(&real, &sim);
        assert_eq!(x0, 0.0);
        assert_eq!(x1, 1.0);
        assert!(y0 <= 120.0 && y0 >= 0.0);
        assert!(y1 >= 250.0);
    }

    #[test]
    fn failed_toggle_is_shown_until_quit() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let runtime = {
            let _guard = rt.enter();
            SessionRuntime::start(&TrainerConfig::default())
        };
        let mut app = App::new(runtime.handle(), Vec::new(), None);
        rt.block_on(runtime.shutdown()).unwrap();

        app.handle_key(KeyCode::Char('t'));
        assert!(app.error().is_some());
        assert!(app.running);

        app.handle_key(KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn toggle_key_switches_source() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let runtime = {
            let _guard = rt.enter();
            SessionRuntime::start(&TrainerConfig::default())
        };
        let mut app = App::new(runtime.handle(), Vec::new(), None);
        assert!(app.is_simulated());

        app.handle_key(KeyCode::Char(' '));
        let state = rt.block_on(runtime.shutdown()).unwrap();
        assert_eq!(state.active_source, ActiveSource::Real);
        assert!(app.error().is_none());
    }

    #[test]
    fn chart_bounds_single_point_has_width() {
        let real = history(&[(0.0, 180.0)]);
        let ([x0, x1], [y0, y1]) = chart_bounds(&real, &History::with_capacity(50));
        assert!(x1 > x0);
        assert!(y1 > y0);
    }
}
