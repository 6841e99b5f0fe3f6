use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, StatefulWidget, Wrap};

pub mod chart_data;
pub mod chart_export;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod error_display;
pub mod ingest;
pub mod session;
pub mod widgets;

pub use chart_data::{chart_input, ChartInput, CHART_RECORD_LIMIT};
pub use classify::{classify, FieldClassification};
pub use cli::{Args, ChartKind, CompressionFormat, FileFormat};
pub use config::{AppConfig, ConfigManager};
pub use error::ParseError;
pub use ingest::{load_path, parse_text, Dataset, Record};
pub use session::{Upload, UploadSession};

use widgets::controls::Controls;
use widgets::datatable::{DataTable, DataTableState};
use widgets::debug::DebugState;
use widgets::fields::FieldsView;

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "viztab";

const HELP_TEXT: &str = "\
viztab keys

  arrows     scroll the table
  PgUp/PgDn  scroll the table by page
  Home/End   jump to first/last visible record
  f          toggle the classified-fields panel
  c          cycle the chart category field (categorical columns)
  v          cycle the chart value field (numeric columns)
  k          cycle the chart kind (bar, line, pie)
  e          export chart input JSON for the external renderer
  R          reload the current file
  h          toggle this help
  q          quit
";

/// Options resolved from CLI arguments and config before opening a file.
#[derive(Clone, Debug, Default)]
pub struct OpenOptions {
    pub format: Option<FileFormat>,
    pub compression: Option<CompressionFormat>,
    pub category_field: Option<String>,
    pub value_field: Option<String>,
    pub chart_kind: Option<ChartKind>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_compression(mut self, compression: CompressionFormat) -> Self {
        self.compression = Some(compression);
        self
    }

    pub fn with_category_field(mut self, field: impl Into<String>) -> Self {
        self.category_field = Some(field.into());
        self
    }

    pub fn with_value_field(mut self, field: impl Into<String>) -> Self {
        self.value_field = Some(field.into());
        self
    }

    pub fn with_chart_kind(mut self, kind: ChartKind) -> Self {
        self.chart_kind = Some(kind);
        self
    }

    /// Create OpenOptions from CLI args and config, with CLI args taking precedence
    pub fn from_args_and_config(args: &cli::Args, config: &AppConfig) -> Self {
        let mut opts = OpenOptions::new();

        opts.format = args.format.or_else(|| {
            config
                .file_loading
                .format
                .as_deref()
                .and_then(FileFormat::from_extension)
        });

        opts.compression = args.compression.or_else(|| {
            config
                .file_loading
                .compression
                .as_ref()
                .and_then(|s| match s.as_str() {
                    "gzip" => Some(CompressionFormat::Gzip),
                    "zstd" => Some(CompressionFormat::Zstd),
                    "bzip2" => Some(CompressionFormat::Bzip2),
                    "xz" => Some(CompressionFormat::Xz),
                    _ => None,
                })
        });

        opts.category_field = args.category_field.clone();
        opts.value_field = args.value_field.clone();
        opts.chart_kind = args
            .chart_kind
            .or_else(|| ChartKind::from_name(&config.chart.default_kind));

        opts
    }
}

impl From<&cli::Args> for OpenOptions {
    fn from(args: &cli::Args) -> Self {
        // Use default config if creating from args alone
        let config = AppConfig::default();
        Self::from_args_and_config(args, &config)
    }
}

pub enum AppEvent {
    Key(KeyEvent),
    Open(PathBuf, OpenOptions),
    /// Internal event to actually perform loading after the UI has rendered
    /// the loading gauge. Tagged with the upload generation it belongs to.
    DoLoad(PathBuf, OpenOptions, u64),
    Export,
    Exit,
    Crash(String),
    Resize(u16, u16),
}

#[derive(Default)]
pub struct ErrorModal {
    pub active: bool,
    pub message: String,
}

impl ErrorModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: String) {
        self.active = true;
        self.message = message;
    }

    pub fn hide(&mut self) {
        self.active = false;
        self.message.clear();
    }
}

#[derive(Clone, Debug, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    Loading {
        file_path: PathBuf,
        file_size: u64,
        current_phase: String,
        progress_percent: u16,
    },
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading { .. })
    }
}

pub struct App {
    pub session: UploadSession,
    events: Sender<AppEvent>,
    path: Option<PathBuf>,
    open_options: OpenOptions,
    pub table_state: DataTableState,
    chart_kind: ChartKind,
    show_fields: bool,
    show_help: bool,
    error_modal: ErrorModal,
    loading_state: LoadingState,
    status: Option<String>,
    debug: DebugState,
}

impl App {
    pub fn new(events: Sender<AppEvent>) -> App {
        Self::new_with_config(events, AppConfig::default())
    }

    pub fn new_with_config(events: Sender<AppEvent>, config: AppConfig) -> App {
        App {
            session: UploadSession::new(),
            events,
            path: None,
            open_options: OpenOptions::new(),
            table_state: DataTableState::new(
                config.display.max_table_rows,
                config.display.row_numbers,
                config.display.row_start_index,
            ),
            chart_kind: ChartKind::from_name(&config.chart.default_kind).unwrap_or(ChartKind::Bar),
            show_fields: false,
            show_help: false,
            error_modal: ErrorModal::new(),
            loading_state: LoadingState::default(),
            status: None,
            debug: DebugState {
                enabled: config.debug.enabled,
                ..DebugState::default()
            },
        }
    }

    pub fn enable_debug(&mut self) {
        self.debug.enabled = true;
    }

    pub fn send_event(&mut self, event: AppEvent) -> Result<()> {
        self.events.send(event)?;
        Ok(())
    }

    pub fn error_message(&self) -> Option<&str> {
        if self.error_modal.active {
            Some(self.error_modal.message.as_str())
        } else {
            None
        }
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Dispatch one event; may return a follow-up event for the main loop to
    /// feed back into the channel.
    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::Open(path, options) => {
                // A new upload supersedes any in-flight one: bump the
                // generation first, then let the UI render the gauge before
                // the blocking load.
                let generation = self.session.begin();
                let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

                self.status = None;
                self.path = Some(path.clone());
                self.open_options = options.clone();
                if let Some(kind) = options.chart_kind {
                    self.chart_kind = kind;
                }
                self.loading_state = LoadingState::Loading {
                    file_path: path.clone(),
                    file_size,
                    current_phase: "Opening file".to_string(),
                    progress_percent: 10,
                };

                Some(AppEvent::DoLoad(path.clone(), options.clone(), generation))
            }
            AppEvent::DoLoad(path, options, generation) => {
                self.load(path, options, *generation);
                None
            }
            AppEvent::Export => {
                self.export_chart();
                None
            }
            AppEvent::Resize(_cols, _rows) => None,
            // Exit and Crash are handled by the main loop.
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    /// Perform the blocking read and parse for one upload attempt. A result
    /// whose generation has been superseded is discarded without touching
    /// the session.
    fn load(&mut self, path: &Path, options: &OpenOptions, generation: u64) {
        let result = ingest::load_path(path, options.format, options.compression);

        if !self.session.is_current(generation) {
            return;
        }
        self.loading_state = LoadingState::Idle;

        match result {
            Ok((format, dataset)) => {
                if dataset.is_empty() {
                    // The dataset invariant is non-empty; an empty parse is an
                    // invalid upload, surfaced like any other failure.
                    self.session.reset();
                    self.error_modal
                        .show(format!("{} contained no records.", path.display()));
                    return;
                }

                let mut upload = Upload::new(path.to_path_buf(), format, dataset);
                if let Some(name) = &options.category_field {
                    if upload.fields.categorical.iter().any(|f| f == name) {
                        upload.category_field = Some(name.clone());
                    }
                }
                if let Some(name) = &options.value_field {
                    if upload.fields.numeric.iter().any(|f| f == name) {
                        upload.value_field = Some(name.clone());
                    }
                }

                if self.session.apply(generation, upload) {
                    self.table_state.scroll_top();
                    self.table_state.start_col = 0;
                    self.error_modal.hide();
                }
            }
            Err(e) => {
                // Terminal for this upload attempt: never leave a partially
                // populated dataset behind.
                self.session.reset();
                self.error_modal
                    .show(error_display::user_message_from_parse(&e));
            }
        }
    }

    /// Write the chart input for the current selection to a timestamped file
    /// in the working directory.
    fn export_chart(&mut self) {
        let Some(upload) = self.session.current() else {
            self.error_modal.show("No data loaded.".to_string());
            return;
        };

        let (Some(category_field), Some(value_field)) =
            (upload.category_field.as_deref(), upload.value_field.as_deref())
        else {
            self.error_modal.show(format!(
                "Cannot create {} chart. Need at least one numeric and one categorical field.",
                self.chart_kind.as_str()
            ));
            return;
        };

        let input = chart_data::chart_input(&upload.dataset, category_field, value_field, self.chart_kind);
        let filename = chart_export::default_export_filename(self.chart_kind);
        match chart_export::write_chart_json(Path::new(&filename), &input) {
            Ok(()) => {
                self.status = Some(format!("Chart input written to {}", filename));
                self.debug.last_action = "export_chart".to_string();
            }
            Err(e) => self
                .error_modal
                .show(error_display::user_message_from_report(&e, None)),
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        if self.error_modal.active {
            if matches!(event.code, KeyCode::Esc | KeyCode::Enter) {
                self.error_modal.hide();
            }
            return None;
        }

        if self.show_help {
            if matches!(event.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('h')) {
                self.show_help = false;
            }
            return None;
        }

        let mut action = "";
        let follow_up = match event.code {
            KeyCode::Char('q') => Some(AppEvent::Exit),
            KeyCode::Char('h') => {
                self.show_help = true;
                action = "show_help";
                None
            }
            KeyCode::Char('f') => {
                self.show_fields = !self.show_fields;
                action = "toggle_fields";
                None
            }
            KeyCode::Char('c') => {
                self.session.cycle_category();
                action = "cycle_category";
                None
            }
            KeyCode::Char('v') => {
                self.session.cycle_value();
                action = "cycle_value";
                None
            }
            KeyCode::Char('k') => {
                self.chart_kind = match self.chart_kind {
                    ChartKind::Bar => ChartKind::Line,
                    ChartKind::Line => ChartKind::Pie,
                    ChartKind::Pie => ChartKind::Bar,
                };
                action = "cycle_chart_kind";
                None
            }
            KeyCode::Char('e') => Some(AppEvent::Export),
            KeyCode::Char('R') => {
                action = "reload";
                self.path
                    .clone()
                    .map(|path| AppEvent::Open(path, self.open_options.clone()))
            }
            KeyCode::Up => {
                self.table_state.scroll_up(1);
                None
            }
            KeyCode::Down => {
                if let Some(upload) = self.session.current() {
                    self.table_state.scroll_down(&upload.dataset, 1);
                }
                None
            }
            KeyCode::PageUp => {
                let page = self.table_state.visible_rows.max(1);
                self.table_state.scroll_up(page);
                None
            }
            KeyCode::PageDown => {
                if let Some(upload) = self.session.current() {
                    let page = self.table_state.visible_rows.max(1);
                    self.table_state.scroll_down(&upload.dataset, page);
                }
                None
            }
            KeyCode::Home => {
                self.table_state.scroll_top();
                None
            }
            KeyCode::End => {
                if let Some(upload) = self.session.current() {
                    self.table_state.scroll_bottom(&upload.dataset);
                }
                None
            }
            KeyCode::Left => {
                self.table_state.scroll_left();
                None
            }
            KeyCode::Right => {
                if let Some(upload) = self.session.current() {
                    self.table_state.scroll_right(&upload.dataset);
                }
                None
            }
            _ => None,
        };

        if !action.is_empty() {
            self.debug.last_action = action.to_string();
        }
        follow_up
    }

    fn render_loading_gauge(loading_state: &LoadingState, area: Rect, buf: &mut Buffer) {
        if let LoadingState::Loading {
            current_phase,
            progress_percent,
            ..
        } = loading_state
        {
            let gauge_width = (area.width as f64 * 0.33) as u16;
            let gauge_height = 5u16;

            let center_layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Fill(1),
                    Constraint::Length(gauge_height),
                    Constraint::Fill(1),
                ])
                .split(area);

            let gauge_area_layout = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Fill(1),
                    Constraint::Length(gauge_width),
                    Constraint::Fill(1),
                ])
                .split(center_layout[1]);

            let gauge = Gauge::default()
                .block(Block::default().borders(Borders::ALL).title("Loading"))
                .percent(*progress_percent)
                .label(current_phase.clone());

            gauge.render(gauge_area_layout[1], buf);
        }
    }

    fn render_error_modal(message: &str, area: Rect, buf: &mut Buffer) {
        let width = (area.width / 2).max(30).min(area.width);
        let height = 7u16.min(area.height);
        let modal = Rect::new(
            area.x + (area.width.saturating_sub(width)) / 2,
            area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        );

        Clear.render(modal, buf);
        Paragraph::new(message.to_string())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title("Error (Esc to dismiss)")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red)),
            )
            .render(modal, buf);
    }

    fn header_line(&self) -> String {
        match self.session.current() {
            Some(upload) => {
                let charted = match (&upload.category_field, &upload.value_field) {
                    (Some(c), Some(v)) => format!("{} by {}", v, c),
                    _ => "not chartable".to_string(),
                };
                format!(
                    "{} | {} records found | {} chart: {}",
                    upload.path.display(),
                    upload.dataset.len(),
                    self.chart_kind.as_str(),
                    charted
                )
            }
            None => "No data loaded.".to_string(),
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;
        self.debug.generation = self.session.generation();

        let mut constraints = vec![Constraint::Length(1), Constraint::Fill(1)];
        if self.status.is_some() {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(1)); // Controls
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        Paragraph::new(self.header_line())
            .style(Style::default().add_modifier(Modifier::BOLD))
            .render(layout[0], buf);

        let main_area = layout[1];
        let mut data_area = main_area;
        let mut fields_area = Rect::default();
        if self.show_fields && self.session.current().is_some() {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(0), Constraint::Length(45)])
                .split(main_area);
            data_area = chunks[0];
            fields_area = chunks[1];
        }

        match self.session.current() {
            Some(upload) => {
                DataTable::new(&upload.dataset).render(data_area, buf, &mut self.table_state);
                if self.show_fields {
                    FieldsView::new(
                        &upload.fields,
                        upload.category_field.as_deref(),
                        upload.value_field.as_deref(),
                    )
                    .render(fields_area, buf);
                }
            }
            None => {
                Paragraph::new("No data loaded. Pass a JSON or CSV file path on the command line.")
                    .centered()
                    .block(Block::default().borders(Borders::ALL))
                    .render(data_area, buf);
            }
        }

        let mut next = 2;
        if let Some(status) = &self.status {
            Paragraph::new(status.clone())
                .style(Style::default().fg(Color::Green))
                .render(layout[next], buf);
            next += 1;
        }

        let record_count = self.session.current().map(|u| u.dataset.len());
        let controls = match record_count {
            Some(count) => Controls::with_record_count(count),
            None => Controls::new(),
        };
        controls
            .with_dimmed(self.loading_state.is_loading())
            .render(layout[next], buf);
        next += 1;

        if self.debug.enabled {
            (&self.debug).render(layout[next], buf);
        }

        if self.show_help {
            let width = area.width.min(64);
            let height = area.height.min(16);
            let modal = Rect::new(
                area.x + (area.width.saturating_sub(width)) / 2,
                area.y + (area.height.saturating_sub(height)) / 2,
                width,
                height,
            );
            Clear.render(modal, buf);
            Paragraph::new(HELP_TEXT)
                .block(Block::default().title("Help").borders(Borders::ALL))
                .render(modal, buf);
        }

        App::render_loading_gauge(&self.loading_state, area, buf);

        if self.error_modal.active {
            App::render_error_modal(&self.error_modal.message, area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::mpsc::channel;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn open(app: &mut App, path: &Path, options: OpenOptions) {
        let event = AppEvent::Open(path.to_path_buf(), options);
        let follow_up = app.event(&event).expect("Open yields DoLoad");
        assert!(app.event(&follow_up).is_none());
    }

    #[test]
    fn open_applies_dataset_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "sales.csv", "region,revenue\neast,100\nwest,250\n");
        let (tx, _rx) = channel::<AppEvent>();
        let mut app = App::new(tx);

        open(&mut app, &path, OpenOptions::new());

        let upload = app.session.current().expect("upload applied");
        assert_eq!(upload.dataset.len(), 2);
        assert_eq!(upload.category_field.as_deref(), Some("region"));
        assert_eq!(upload.value_field.as_deref(), Some("revenue"));
        assert!(app.error_message().is_none());
    }

    #[test]
    fn parse_failure_clears_session_and_shows_message() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(&dir, "ok.csv", "a,b\n1,2\n");
        let bad = write_file(&dir, "notes.txt", "hello");
        let (tx, _rx) = channel::<AppEvent>();
        let mut app = App::new(tx);

        open(&mut app, &good, OpenOptions::new());
        assert!(app.session.current().is_some());

        open(&mut app, &bad, OpenOptions::new());
        assert!(app.session.current().is_none());
        assert!(app
            .error_message()
            .expect("error shown")
            .contains("Unsupported file format"));
    }

    #[test]
    fn empty_parse_is_invalid_upload() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.csv", "a,b\n");
        let (tx, _rx) = channel::<AppEvent>();
        let mut app = App::new(tx);

        open(&mut app, &path, OpenOptions::new());
        assert!(app.session.current().is_none());
        assert!(app.error_message().expect("error shown").contains("no records"));
    }

    #[test]
    fn superseded_load_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_file(&dir, "first.csv", "a\nold\n");
        let second = write_file(&dir, "second.csv", "a\nnew\n");
        let (tx, _rx) = channel::<AppEvent>();
        let mut app = App::new(tx);

        // Both uploads start before either load runs; the first result
        // arrives after the second upload began, so it must be discarded.
        let stale = app
            .event(&AppEvent::Open(first, OpenOptions::new()))
            .expect("DoLoad");
        let current = app
            .event(&AppEvent::Open(second, OpenOptions::new()))
            .expect("DoLoad");

        assert!(app.event(&stale).is_none());
        assert!(app.session.current().is_none());

        assert!(app.event(&current).is_none());
        let upload = app.session.current().expect("latest upload wins");
        assert_eq!(
            upload.dataset.records()[0].get("a"),
            Some(&serde_json::json!("new"))
        );
    }

    #[test]
    fn field_overrides_must_match_partition() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "sales.csv", "region,market,revenue\neast,emea,1\n");
        let (tx, _rx) = channel::<AppEvent>();
        let mut app = App::new(tx);

        let options = OpenOptions::new()
            .with_category_field("market")
            .with_value_field("region"); // wrong partition; ignored
        open(&mut app, &path, options);

        let upload = app.session.current().unwrap();
        assert_eq!(upload.category_field.as_deref(), Some("market"));
        assert_eq!(upload.value_field.as_deref(), Some("revenue"));
    }

    #[test]
    fn open_options_precedence() {
        let mut config = AppConfig::default();
        config.chart.default_kind = "pie".to_string();
        config.file_loading.compression = Some("gzip".to_string());

        let args = Args {
            path: None,
            format: Some(FileFormat::Json),
            compression: None,
            category_field: None,
            value_field: None,
            chart_kind: None,
            export_chart: None,
            generate_config: false,
            force: false,
            debug: false,
        };

        let opts = OpenOptions::from_args_and_config(&args, &config);
        assert_eq!(opts.format, Some(FileFormat::Json));
        assert_eq!(opts.compression, Some(CompressionFormat::Gzip));
        assert_eq!(opts.chart_kind, Some(ChartKind::Pie));
    }

    #[test]
    fn quit_key_exits() {
        let (tx, _rx) = channel::<AppEvent>();
        let mut app = App::new(tx);
        let key = KeyEvent::new(KeyCode::Char('q'), crossterm::event::KeyModifiers::NONE);
        assert!(matches!(app.event(&AppEvent::Key(key)), Some(AppEvent::Exit)));
    }
}
