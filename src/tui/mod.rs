//! Ratatui-based terminal dashboard.
//!
//! Layout:
//! - header: the three metric cards, with the visible range as caption
//! - body: trend chart, optional YoY chart, optional merged-data table, and a
//!   settings panel (year range, scale, YoY toggle, series multi-select)
//! - footer: key help and status line
//!
//! Every settings change triggers one `render_pass` over the cached merged table.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Datelike;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table},
};

use crate::app::TITLE;
use crate::app::pipeline::{DashboardView, render_pass};
use crate::data::MergedCache;
use crate::domain::{Derived, MergedTable, Metric, Selection, ViewPoint, YearRange};
use crate::error::{AppError, EXIT_TERMINAL};
use crate::report::{MetricSummary, fmt_derived, fmt_thousands, format_caption, format_card};

mod plotters_chart;

use plotters_chart::{LineSeriesData, TrendPlottersChart};

/// Settings rows: From, To, Scale, YoY, then one row per metric.
const FIELD_COUNT: usize = 4 + Metric::ALL.len();

/// Start the TUI on an already-loaded merged table.
pub fn run(table: Arc<MergedTable>, selection: Selection, data_dir: PathBuf) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(EXIT_TERMINAL, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(table, selection, data_dir);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(EXIT_TERMINAL, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(EXIT_TERMINAL, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    table: Arc<MergedTable>,
    data_dir: PathBuf,
    selection: Selection,
    view: DashboardView,
    selected_field: usize,
    show_table: bool,
    table_scroll: usize,
    status: String,
}

impl App {
    fn new(table: Arc<MergedTable>, selection: Selection, data_dir: PathBuf) -> Self {
        let view = render_pass(&table, &selection);
        let status = format!("{} common years loaded from {}", table.len(), data_dir.display());
        Self {
            selection: view.selection.clone(),
            table,
            data_dir,
            view,
            selected_field: 0,
            show_table: false,
            table_scroll: 0,
            status,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(EXIT_TERMINAL, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(EXIT_TERMINAL, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(EXIT_TERMINAL, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < FIELD_COUNT {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                // Year fields move with ←/→ only.
                if self.selected_field >= 2 {
                    self.adjust_field(1);
                }
            }
            KeyCode::Char('t') => {
                self.show_table = !self.show_table;
                self.status = format!("table: {}", on_off(self.show_table));
            }
            KeyCode::PageDown => {
                let max = self.view.rows.len().saturating_sub(1);
                self.table_scroll = (self.table_scroll + 5).min(max);
            }
            KeyCode::PageUp => {
                self.table_scroll = self.table_scroll.saturating_sub(5);
            }
            KeyCode::Char('e') => self.export_view(),
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            0 | 1 => {
                let Some(bounds) = self.table.bounds() else {
                    self.status = "No merged years to select from.".to_string();
                    return;
                };
                let range = &mut self.selection.range;
                if self.selected_field == 0 {
                    range.lo = (range.lo + delta).clamp(bounds.min, range.hi);
                } else {
                    range.hi = (range.hi + delta).clamp(range.lo, bounds.max);
                }
                self.status = format!("range: {}–{}", range.lo, range.hi);
            }
            2 => {
                self.selection.scale = self.selection.scale.toggle();
                self.status = format!("scale: {}", self.selection.scale.display_name());
            }
            3 => {
                self.selection.show_yoy = !self.selection.show_yoy;
                self.status = format!("YoY chart: {}", on_off(self.selection.show_yoy));
            }
            field => {
                let Some(&metric) = Metric::ALL.get(field - 4) else {
                    return;
                };
                self.selection.toggle_metric(metric);
                self.status = format!(
                    "{}: {}",
                    metric.label(),
                    on_off(self.selection.is_selected(metric))
                );
            }
        }
        self.refresh();
    }

    fn refresh(&mut self) {
        self.view = render_pass(&self.table, &self.selection);
        self.selection = self.view.selection.clone();
        self.table_scroll = self.table_scroll.min(self.view.rows.len().saturating_sub(1));
    }

    fn export_view(&mut self) {
        let range = self.selection.range;
        let path = PathBuf::from(format!("trends_{}_{}.csv", range.lo, range.hi));
        self.status = match crate::io::export::write_table_csv(&path, &self.view.rows) {
            Ok(()) => format!("Wrote {} rows to {}", self.view.rows.len(), path.display()),
            Err(err) => format!("Export failed: {err}"),
        };
    }

    /// Re-read the sources; the cache only recomputes if a file changed.
    fn reload(&mut self) {
        match MergedCache::global().get_or_load(&self.data_dir) {
            Ok(table) => {
                self.status = if Arc::ptr_eq(&table, &self.table) {
                    "Sources unchanged.".to_string()
                } else {
                    format!("Reloaded: {} common years.", table.len())
                };
                self.table = table;
                self.refresh();
            }
            Err(err) => {
                log::warn!("reload failed: {err}");
                self.status = format!("Reload failed: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(6), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                TITLE,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))
            .title_bottom(Line::from(Span::styled(
                format_caption(self.selection.range, &self.view.summary),
                Style::default().fg(Color::Gray),
            )));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match &self.view.summary {
            Ok(summary) => {
                let columns = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
                    .split(inner);
                for (card, rect) in summary.metrics.iter().zip(columns.iter()) {
                    draw_card(frame, card, *rect);
                }
            }
            Err(err) => {
                let msg = Paragraph::new(format!("{err}. Widen the year range."))
                    .style(Style::default().fg(Color::Yellow));
                frame.render_widget(msg, inner);
            }
        }
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(30)])
            .split(area);

        let mut constraints = vec![Constraint::Min(8)];
        if self.view.yoy.is_some() {
            constraints.push(Constraint::Min(8));
        }
        if self.show_table {
            let height = (self.view.rows.len() as u16).saturating_add(3).min(14);
            constraints.push(Constraint::Length(height));
        }
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(columns[0]);

        let trend_title = format!("Trend ({})", self.selection.scale.display_name());
        self.draw_chart(frame, rows[0], &trend_title, &self.view.trend, fmt_axis_value);

        let mut next = 1;
        if let Some(yoy) = &self.view.yoy {
            self.draw_chart(frame, rows[next], "Year-over-Year % Change", yoy, fmt_axis_pct);
            next += 1;
        }
        if self.show_table {
            self.draw_table(frame, rows[next]);
        }

        self.draw_settings(frame, columns[1]);
    }

    fn draw_chart(
        &self,
        frame: &mut ratatui::Frame<'_>,
        area: Rect,
        title: &str,
        points: &[ViewPoint],
        fmt_y: fn(f64) -> String,
    ) {
        let mut title_spans = vec![Span::raw(format!("{title} "))];
        for &metric in &self.selection.metrics {
            title_spans.push(Span::styled(
                format!("■ {} ", metric.label()),
                Style::default().fg(metric_color(metric)),
            ));
        }
        let block = Block::default().title(Line::from(title_spans)).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let placeholder = if self.selection.metrics.is_empty() {
            Some("No series selected.")
        } else if self.view.rows.is_empty() {
            Some("No data in range.")
        } else {
            None
        };

        let data = match placeholder {
            Some(_) => None,
            None => chart_series(points, &self.selection.metrics, self.selection.range),
        };

        let Some(data) = data else {
            let msg = Paragraph::new(placeholder.unwrap_or("No defined values in range."))
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let widget = TrendPlottersChart {
            series: &data.series,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            fmt_x: fmt_axis_year,
            fmt_y,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let header_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

        let mut header = vec![Cell::from("year")];
        header.extend(Metric::ALL.iter().map(|m| Cell::from(m.column())));
        header.extend(Metric::ALL.iter().map(|m| Cell::from(m.index_column())));
        header.extend(Metric::ALL.iter().map(|m| Cell::from(m.yoy_column())));

        let rows = self.view.rows.iter().skip(self.table_scroll).map(|row| {
            let mut cells = vec![
                Cell::from(row.year.to_string()),
                Cell::from(format!("{:.2}", row.raw.housing)),
                Cell::from(fmt_thousands(row.raw.income)),
                Cell::from(fmt_thousands(row.raw.population)),
            ];
            cells.extend(Metric::ALL.iter().map(|&m| Cell::from(fmt_derived(*row.index.get(m), 2))));
            cells.extend(Metric::ALL.iter().map(|&m| Cell::from(fmt_derived(*row.yoy.get(m), 2))));
            Row::new(cells)
        });

        let widths = [
            Constraint::Length(6),
            Constraint::Length(19),
            Constraint::Length(13),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(11),
            Constraint::Length(14),
            Constraint::Length(11),
        ];

        let table = Table::new(rows, widths)
            .header(Row::new(header).style(header_style))
            .block(
                Block::default()
                    .title(format!("Merged data ({} rows, PgUp/PgDn to scroll)", self.view.rows.len()))
                    .borders(Borders::ALL),
            );
        frame.render_widget(table, area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let range = self.selection.range;
        let mut items = vec![
            ListItem::new(format!("From: {}", range.lo)),
            ListItem::new(format!("To:   {}", range.hi)),
            ListItem::new(format!("Scale: {}", scale_short(&self.selection))),
            ListItem::new(format!("YoY chart: {}", on_off(self.selection.show_yoy))),
        ];
        for metric in Metric::ALL {
            let mark = if self.selection.is_selected(metric) { "[x]" } else { "[ ]" };
            items.push(ListItem::new(Line::from(vec![
                Span::raw(format!("{mark} ")),
                Span::styled(metric.label(), Style::default().fg(metric_color(metric))),
            ])));
        }

        let bounds = self
            .table
            .bounds()
            .map(|b| format!("Controls ({}–{})", b.min, b.max))
            .unwrap_or_else(|| "Controls".to_string());

        let list = List::new(items)
            .block(Block::default().title(bounds).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  space toggle  t table  e export  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(Text::from(line)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_card(frame: &mut ratatui::Frame<'_>, card: &MetricSummary, area: Rect) {
    let (title, value, delta) = format_card(card);
    let delta_color = match card.delta_pct.and_then(Derived::value) {
        Some(v) if v >= 0.0 => Color::Green,
        Some(_) => Color::Red,
        None => Color::Gray,
    };
    let lines = vec![
        Line::from(Span::styled(title, Style::default().fg(Color::Gray))),
        Line::from(Span::styled(
            value,
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(delta.unwrap_or_default(), Style::default().fg(delta_color))),
    ];
    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

/// Chart-ready series plus bounds.
struct ChartData {
    series: Vec<LineSeriesData>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Group long-form points by metric into line segments.
///
/// Returns `None` when no point has a defined value.
fn chart_series(points: &[ViewPoint], metrics: &[Metric], range: YearRange) -> Option<ChartData> {
    let mut series = Vec::with_capacity(metrics.len());
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);

    for &metric in metrics {
        let mut segments: Vec<Vec<(f64, f64)>> = Vec::new();
        let mut current: Vec<(f64, f64)> = Vec::new();
        for p in points.iter().filter(|p| p.series == metric) {
            match p.value.value() {
                Some(y) => {
                    y_min = y_min.min(y);
                    y_max = y_max.max(y);
                    current.push((p.time.year() as f64, y));
                }
                None => {
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        series.push(LineSeriesData {
            color: metric_rgb(metric),
            segments,
        });
    }

    if !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }

    let pad = if y_max > y_min {
        (y_max - y_min) * 0.05
    } else {
        (y_max.abs() * 0.05).max(1.0)
    };

    let x_bounds = if range.hi > range.lo {
        [range.lo as f64, range.hi as f64]
    } else {
        [range.lo as f64 - 0.5, range.hi as f64 + 0.5]
    };

    Some(ChartData {
        series,
        x_bounds,
        y_bounds: [y_min - pad, y_max + pad],
    })
}

fn metric_color(metric: Metric) -> Color {
    match metric {
        Metric::Housing => Color::Cyan,
        Metric::Income => Color::Green,
        Metric::Population => Color::Magenta,
    }
}

fn metric_rgb(metric: Metric) -> RGBColor {
    match metric {
        Metric::Housing => RGBColor(0, 255, 255),
        Metric::Income => RGBColor(0, 255, 0),
        Metric::Population => RGBColor(255, 0, 255),
    }
}

fn scale_short(selection: &Selection) -> &'static str {
    match selection.scale {
        crate::domain::ValueScale::Raw => "raw",
        crate::domain::ValueScale::Indexed => "indexed",
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

fn fmt_axis_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_value(v: f64) -> String {
    if v.abs() >= 10_000.0 {
        format!("{:.0}k", v / 1_000.0)
    } else if v.abs() >= 100.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

fn fmt_axis_pct(v: f64) -> String {
    format!("{v:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::data::{default_selection, merge};
    use crate::domain::{PerMetric, SeriesPoint, SeriesTable};

    fn point(metric: Metric, year: i32, value: Derived) -> ViewPoint {
        ViewPoint {
            time: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
            value,
            series: metric,
        }
    }

    #[test]
    fn undefined_values_split_segments() {
        let points = vec![
            point(Metric::Housing, 2019, Derived::FirstYear),
            point(Metric::Housing, 2020, Derived::Value(1.0)),
            point(Metric::Housing, 2021, Derived::DivisionEdgeCase),
            point(Metric::Housing, 2022, Derived::Value(3.0)),
            point(Metric::Housing, 2023, Derived::Value(4.0)),
        ];
        let data = chart_series(&points, &[Metric::Housing], YearRange::new(2019, 2023)).unwrap();
        assert_eq!(data.series.len(), 1);
        assert_eq!(
            data.series[0].segments,
            vec![vec![(2020.0, 1.0)], vec![(2022.0, 3.0), (2023.0, 4.0)]]
        );
        assert_eq!(data.x_bounds, [2019.0, 2023.0]);
        assert!(data.y_bounds[0] < 1.0 && data.y_bounds[1] > 4.0);
    }

    #[test]
    fn single_year_gets_padded_bounds() {
        let points = vec![point(Metric::Income, 2020, Derived::Value(50_000.0))];
        let data = chart_series(&points, &[Metric::Income], YearRange::new(2020, 2020)).unwrap();
        assert_eq!(data.x_bounds, [2019.5, 2020.5]);
        assert!(data.y_bounds[1] > data.y_bounds[0]);
    }

    #[test]
    fn all_undefined_yields_nothing_to_chart() {
        let points = vec![point(Metric::Population, 2020, Derived::FirstYear)];
        assert!(chart_series(&points, &[Metric::Population], YearRange::new(2020, 2020)).is_none());
        assert!(chart_series(&[], &[], YearRange::new(2020, 2021)).is_none());
    }

    fn app() -> App {
        let points: Vec<SeriesPoint> = (2018..=2022)
            .map(|year| SeriesPoint {
                year,
                value: 100.0 + (year - 2018) as f64,
            })
            .collect();
        let table = Arc::new(merge(&PerMetric::from_fn(|metric| SeriesTable {
            metric,
            points: points.clone(),
        })));
        let selection = default_selection(&table);
        App::new(table, selection, PathBuf::from("data"))
    }

    #[test]
    fn year_fields_stay_ordered_and_in_bounds() {
        let mut app = app();
        assert_eq!(app.selection.range, YearRange::new(2018, 2022));

        // From cannot pass To.
        app.selected_field = 0;
        for _ in 0..10 {
            app.handle_key(KeyCode::Right);
        }
        assert_eq!(app.selection.range, YearRange::new(2022, 2022));
        assert_eq!(app.view.rows.len(), 1);

        // To cannot drop below From or rise past the data.
        app.selected_field = 1;
        app.handle_key(KeyCode::Left);
        assert_eq!(app.selection.range, YearRange::new(2022, 2022));
        app.handle_key(KeyCode::Right);
        assert_eq!(app.selection.range.hi, 2022);

        // From cannot drop below the earliest year.
        app.selected_field = 0;
        for _ in 0..10 {
            app.handle_key(KeyCode::Left);
        }
        assert_eq!(app.selection.range, YearRange::new(2018, 2022));
        assert_eq!(app.view.rows.len(), 5);
    }

    #[test]
    fn series_rows_toggle_metrics() {
        let mut app = app();
        app.selected_field = 4;
        app.handle_key(KeyCode::Enter);
        assert!(!app.selection.is_selected(Metric::Housing));
        assert!(app.view.trend.iter().all(|p| p.series != Metric::Housing));

        app.handle_key(KeyCode::Char(' '));
        assert!(app.selection.is_selected(Metric::Housing));
        assert!(app.view.trend.iter().any(|p| p.series == Metric::Housing));
    }

    #[test]
    fn axis_labels_compact_large_values() {
        assert_eq!(fmt_axis_value(446_475.0), "446k");
        assert_eq!(fmt_axis_value(312.4), "312");
        assert_eq!(fmt_axis_value(4.24), "4.2");
        assert_eq!(fmt_axis_pct(-1.24), "-1.2%");
    }
}
