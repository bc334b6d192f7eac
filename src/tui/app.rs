use crate::config::Config;
use crate::core::Dataset;
use crate::error::{self, Operation, PrepError};
use crate::services::api_client::{ApiClient, DownloadedFile};
use crate::services::intake;
use crate::services::session::{Session, Ticket};
use crate::tui::components::{ColumnList, MessageDialog, PreviewTable, PromptTarget, TextPrompt};
use crate::tui::{Action, ActionCategory, Component, KeyBindings, Theme};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use std::path::{Path, PathBuf};
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Completion of a request running on the runtime
#[derive(Debug)]
pub enum TaskEvent {
    UploadFinished {
        ticket: Ticket,
        result: error::Result<Dataset>,
    },
    DownloadFinished {
        ticket: Ticket,
        result: error::Result<DownloadedFile>,
    },
}

/// Application state
///
/// Owns the session and routes key events, pastes and request completions
/// to it. Network calls are spawned on the runtime and report back over a
/// channel drained by the event loop.
pub struct App {
    session: Session,
    client: ApiClient,
    output_dir: PathBuf,
    runtime: Handle,
    events_tx: UnboundedSender<TaskEvent>,
    events_rx: UnboundedReceiver<TaskEvent>,

    column_list: ColumnList,
    preview_table: PreviewTable,
    prompt: Option<TextPrompt>,
    alert: Option<MessageDialog>,
    /// Last success message, e.g. where a download was saved
    notice: Option<String>,

    keybindings: KeyBindings,
    theme: Theme,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, runtime: Handle) -> Result<Self> {
        let client = ApiClient::new(&config.api)?;
        let theme = Theme::default();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let keybindings = KeyBindings::with_overrides(&config.keybindings);
        for warning in keybindings.validate() {
            warn!("Keybindings: {}", warning);
        }

        Ok(Self {
            session: Session::new(config.download.options()),
            client,
            output_dir: config.download.output_dir.clone(),
            runtime,
            events_tx,
            events_rx,
            column_list: ColumnList::new(theme.clone()),
            preview_table: PreviewTable::new(theme.clone()),
            prompt: None,
            alert: None,
            notice: None,
            keybindings,
            theme,
            should_quit: false,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Text of the alert currently shown, if any
    pub fn alert_message(&self) -> Option<&str> {
        self.alert.as_ref().map(|a| a.message())
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Validate a picked or dropped file and start its upload.
    pub fn open_file(&mut self, path: &Path) {
        let file = match intake::accept(path) {
            Ok(file) => file,
            Err(e) => return self.show_failure(Operation::Upload, &e),
        };
        let ticket = match self.session.begin_upload(&file) {
            Ok(ticket) => ticket,
            Err(e) => return self.show_failure(Operation::Upload, &e),
        };
        self.notice = None;

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = client.upload(&file).await;
            let _ = tx.send(TaskEvent::UploadFinished { ticket, result });
        });
    }

    /// Snapshot the configuration and start a download.
    pub fn start_download(&mut self) {
        let (ticket, request) = match self.session.begin_download() {
            Ok(started) => started,
            Err(e) => return self.show_failure(Operation::Download, &e),
        };
        self.notice = None;

        let client = self.client.clone();
        let tx = self.events_tx.clone();
        self.runtime.spawn(async move {
            let result = client.download(&request).await;
            let _ = tx.send(TaskEvent::DownloadFinished { ticket, result });
        });
    }

    /// Apply every finished request. Returns true if anything changed.
    pub fn drain_task_events(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_event(event);
            changed = true;
        }
        changed
    }

    pub fn apply_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::UploadFinished { ticket, result } => {
                match self.session.complete_upload(ticket, result) {
                    Ok(()) => {
                        self.column_list.reset(self.session.columns());
                        self.refresh();
                    }
                    Err(e) => self.show_failure(Operation::Upload, &e),
                }
            }
            TaskEvent::DownloadFinished { ticket, result } => {
                let saved = self
                    .session
                    .complete_download(ticket, result)
                    .and_then(|file| file.save_into(&self.output_dir));
                match saved {
                    Ok(path) => {
                        info!("Download saved to {}", path.display());
                        self.notice = Some(format!("Saved {}", path.display()));
                    }
                    Err(e) => self.show_failure(Operation::Download, &e),
                }
            }
        }
    }

    fn show_failure(&mut self, operation: Operation, err: &PrepError) {
        debug!("{} failed: {}", operation, err);
        let title = match operation {
            Operation::Upload => "Upload",
            Operation::Download => "Download",
        };
        self.alert = Some(
            MessageDialog::with_title(operation.alert(err), title)
                .with_border_style(self.theme.error_style()),
        );
    }

    fn after_column_edit<T>(&mut self, result: error::Result<T>) {
        match result {
            Ok(_) => self.refresh(),
            Err(e) => {
                self.alert = Some(
                    MessageDialog::with_title(e.to_string(), "Columns")
                        .with_border_style(self.theme.error_style()),
                )
            }
        }
    }

    /// Push session state into the components
    fn refresh(&mut self) {
        self.column_list.set_columns(self.session.columns());
        self.preview_table.set_grid(self.session.preview());
    }

    /// Handle a key event
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        // An open prompt takes raw text input; alerts still sit above it
        if self.alert.is_none() && self.prompt.is_some() {
            match key.code {
                KeyCode::Enter => self.submit_prompt(),
                KeyCode::Esc => self.prompt = None,
                _ => {
                    if let Some(prompt) = self.prompt.as_mut() {
                        prompt.handle_key(key);
                    }
                }
            }
            return Ok(());
        }

        if let Some(action) = self.keybindings.get_action(&key) {
            self.handle_action(action)?;
        }
        Ok(())
    }

    /// Handle bracketed paste. Outside a prompt a pasted path is a file drop.
    pub fn handle_paste(&mut self, text: &str) {
        if self.alert.is_some() {
            return;
        }
        if let Some(prompt) = self.prompt.as_mut() {
            prompt.insert_str(text);
            return;
        }
        if let Some(path) = intake::parse_dropped_path(text) {
            self.open_file(&path);
        }
    }

    fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        let value = prompt.value().to_string();
        match prompt.target() {
            PromptTarget::RenameColumn(id) => {
                let name = value.trim();
                if !name.is_empty() {
                    let result = self.session.set_display_name(id, name);
                    self.after_column_edit(result);
                }
            }
            PromptTarget::TagName => self.session.options_mut().tag_name = value,
            PromptTarget::TagValue => self.session.options_mut().tag_value = value,
            PromptTarget::OpenFile => {
                if let Some(path) = intake::parse_dropped_path(&value) {
                    self.open_file(&path);
                }
            }
        }
    }

    fn handle_action(&mut self, action: Action) -> Result<()> {
        if let Some(alert) = &mut self.alert {
            if alert.handle_action(action)? {
                self.alert = None;
            } else if action == Action::Quit {
                self.should_quit = true;
            }
            return Ok(());
        }

        let selected = self.column_list.selected().cloned();
        match action {
            Action::Quit => self.should_quit = true,
            Action::OpenFile => {
                self.prompt = Some(TextPrompt::new(PromptTarget::OpenFile, ""));
            }
            Action::Download => self.start_download(),
            Action::ToggleColumn => {
                if let Some(entry) = selected {
                    let result = self.session.toggle_included(entry.id);
                    self.after_column_edit(result);
                }
            }
            Action::RenameColumn => {
                if let Some(entry) = selected {
                    if entry.locked {
                        self.after_column_edit::<()>(Err(PrepError::MandatoryColumn(
                            entry.original_name,
                        )));
                    } else {
                        self.prompt = Some(TextPrompt::new(
                            PromptTarget::RenameColumn(entry.id),
                            entry.display_name,
                        ));
                    }
                }
            }
            Action::MoveColumnUp | Action::MoveColumnDown => {
                if let Some(entry) = selected {
                    let delta = if action == Action::MoveColumnUp { -1 } else { 1 };
                    let result = self.session.move_column(entry.id, delta);
                    self.after_column_edit(result);
                }
            }
            Action::EditTagName => {
                let current = self.session.options().tag_name.clone();
                self.prompt = Some(TextPrompt::new(PromptTarget::TagName, current));
            }
            Action::EditTagValue => {
                let current = self.session.options().tag_value.clone();
                self.prompt = Some(TextPrompt::new(PromptTarget::TagValue, current));
            }
            Action::ToggleRemoveDuplicates => {
                let options = self.session.options_mut();
                options.remove_duplicates = !options.remove_duplicates;
            }
            Action::ToggleRemoveEmpty => {
                let options = self.session.options_mut();
                options.remove_empty = !options.remove_empty;
            }
            Action::Confirm | Action::Cancel => self.notice = None,
            Action::MoveUp | Action::MoveDown => {
                self.column_list.handle_action(action)?;
            }
            Action::ScrollLeft | Action::ScrollRight => {
                self.preview_table.handle_action(action)?;
            }
        }
        Ok(())
    }

    fn status_line(&self) -> Line<'static> {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let file = self.session.source_name().unwrap_or("no file loaded").to_string();
        let mut spans = vec![
            Span::styled(env!("CARGO_PKG_NAME"), bold),
            Span::raw(format!("  file: {file}  server: {}  ", self.client.base_url())),
        ];
        match self.session.busy() {
            Some(Operation::Upload) => {
                spans.push(Span::styled("Uploading...", self.theme.busy_style()));
            }
            Some(Operation::Download) => {
                spans.push(Span::styled("Downloading...", self.theme.busy_style()));
            }
            None => {
                if let Some(notice) = &self.notice {
                    spans.push(Span::styled(notice.clone(), self.theme.success_style()));
                }
            }
        }
        Line::from(spans)
    }

    fn options_line(&self) -> Line<'static> {
        let options = self.session.options();
        let flag = |on: bool| if on { "[x]" } else { "[ ]" };
        Line::from(format!(
            "Tag: {} = {}   {} Remove duplicates   {} Remove empty rows",
            options.tag_name,
            options.tag_value,
            flag(options.remove_duplicates),
            flag(options.remove_empty)
        ))
    }

    fn hint_line(&self) -> String {
        let mut actions: Vec<Action> = self
            .column_list
            .supported_actions()
            .iter()
            .copied()
            .filter(|a| a.category() != ActionCategory::Navigation)
            .collect();
        actions.extend([
            Action::EditTagName,
            Action::EditTagValue,
            Action::ToggleRemoveDuplicates,
            Action::ToggleRemoveEmpty,
            Action::OpenFile,
            Action::Download,
            Action::Quit,
        ]);
        self.keybindings.hints(&actions)
    }

    /// Render the app
    pub fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Status
                Constraint::Min(3),    // Columns + preview
                Constraint::Length(1), // Download options
                Constraint::Length(1), // Key hints
            ])
            .split(area);

        frame.render_widget(Paragraph::new(self.status_line()), chunks[0]);

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(chunks[1]);
        self.column_list.render(frame, main[0]);
        self.preview_table.render(frame, main[1]);

        frame.render_widget(Paragraph::new(self.options_line()), chunks[2]);
        frame.render_widget(
            Paragraph::new(self.hint_line()).style(self.theme.alt_row_style()),
            chunks[3],
        );

        if let Some(prompt) = &self.prompt {
            prompt.render(frame, area);
        }
        if let Some(alert) = &mut self.alert {
            alert.render(frame, area);
        }
    }
}
