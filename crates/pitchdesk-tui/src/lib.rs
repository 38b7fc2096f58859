// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use pitchdesk_app::{
    FormField, ListCommand, ListMode, ListPhase, ListState, Notice, NoticeLevel, NoticeLog,
    Notifier, Proposal, ProposalFormInput, ProposalId, ProposalSource,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use ratatui::{Frame, Terminal};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const TABLE_COLUMNS: [&str; 8] = [
    " ", "id", "client", "email", "title", "tags", "status", "amount",
];
const SELECTED_MARK: &str = "*";
const EMPTY_STATE_TEXT: &str = "no proposals yet\n\npress a to create your first proposal";
const LOADING_TEXT: &str = "loading proposals...";

/// Everything the list view needs from the outside world.
pub trait AppRuntime: ProposalSource {
    /// Validates the create form and stores the proposal.
    fn submit_proposal(&mut self, input: &ProposalFormInput) -> Result<ProposalId>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiOptions {
    pub contact_email: String,
    pub notice_duration: Duration,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            contact_email: "proposals@pitchdesk.example".to_owned(),
            notice_duration: Duration::from_secs(4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalEvent {
    ClearNotice { token: u64 },
}

/// Notice history plus the one currently shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct NoticeBoard {
    log: NoticeLog,
    current: Option<Notice>,
    token: u64,
}

impl NoticeBoard {
    fn clear_if_current(&mut self, token: u64) {
        if token == self.token {
            self.current = None;
        }
    }
}

impl Notifier for NoticeBoard {
    fn notify(&mut self, notice: Notice) {
        tracing::debug!(
            level = notice.level.as_str(),
            message = %notice.message,
            "notice"
        );
        self.log.notify(notice.clone());
        self.current = Some(notice);
        self.token = self.token.saturating_add(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct FormUiState {
    input: ProposalFormInput,
    field_index: usize,
}

impl FormUiState {
    fn field(&self) -> FormField {
        FormField::ALL[self.field_index % FormField::ALL.len()]
    }

    fn move_field(&mut self, delta: isize) {
        let len = FormField::ALL.len() as isize;
        self.field_index = (self.field_index as isize + delta).rem_euclid(len) as usize;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    notices: NoticeBoard,
    form: Option<FormUiState>,
    help_visible: bool,
    contact_email: String,
}

impl ViewData {
    fn new(options: &UiOptions) -> Self {
        Self {
            contact_email: options.contact_email.clone(),
            ..Self::default()
        }
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut ListState,
    runtime: &mut R,
    options: &UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let result = match Terminal::new(backend).context("create terminal") {
        Ok(mut terminal) => event_loop(&mut terminal, state, runtime, options),
        Err(error) => Err(error),
    };

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<B: Backend, R: AppRuntime>(
    terminal: &mut Terminal<B>,
    state: &mut ListState,
    runtime: &mut R,
    options: &UiOptions,
) -> Result<()> {
    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();
    let mut scheduled_token = view_data.notices.token;

    state.begin_load();
    terminal
        .draw(|frame| render(frame, state, &view_data))
        .context("draw loading frame")?;
    state.load(runtime, &mut view_data.notices);

    loop {
        if view_data.notices.token != scheduled_token {
            scheduled_token = view_data.notices.token;
            schedule_notice_clear(&internal_tx, scheduled_token, options.notice_duration);
        }
        process_internal_events(&mut view_data, &internal_rx);

        terminal
            .draw(|frame| render(frame, state, &view_data))
            .context("draw frame")?;

        if !event::poll(Duration::from_millis(120)).context("poll event")? {
            continue;
        }
        if let Event::Key(key) = event::read().context("read event")?
            && key.kind != KeyEventKind::Release
            && handle_key_event(state, runtime, &mut view_data, key)
        {
            return Ok(());
        }
    }
}

fn process_internal_events(view_data: &mut ViewData, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearNotice { token } => view_data.notices.clear_if_current(token),
        }
    }
}

fn schedule_notice_clear(internal_tx: &Sender<InternalEvent>, token: u64, delay: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(InternalEvent::ClearNotice { token });
    });
}

/// Returns true when the app should quit.
fn handle_key_event<R: AppRuntime>(
    state: &mut ListState,
    runtime: &mut R,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
            view_data.help_visible = false;
        }
        return false;
    }

    match state.mode {
        ListMode::Form => {
            handle_form_key(state, runtime, view_data, key);
            false
        }
        ListMode::Search => {
            handle_search_key(state, key);
            false
        }
        ListMode::Browse => handle_browse_key(state, runtime, view_data, key),
    }
}

fn handle_browse_key<R: AppRuntime>(
    state: &mut ListState,
    runtime: &mut R,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('j') | KeyCode::Down => {
            state.dispatch(ListCommand::MoveCursor(1));
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.dispatch(ListCommand::MoveCursor(-1));
        }
        KeyCode::Char('g') | KeyCode::Home => {
            state.dispatch(ListCommand::CursorFirst);
        }
        KeyCode::Char('G') | KeyCode::End => {
            state.dispatch(ListCommand::CursorLast);
        }
        KeyCode::Char(' ') | KeyCode::Enter => {
            state.dispatch(ListCommand::ToggleSelectAtCursor);
        }
        KeyCode::Char('/') | KeyCode::Char('f') if state.phase() != ListPhase::Populated => {
            view_data.notices.info("nothing to search yet");
        }
        KeyCode::Char('/') => {
            state.dispatch(ListCommand::EnterSearch);
        }
        KeyCode::Char('f') => {
            state.dispatch(ListCommand::ToggleSearchBy);
        }
        KeyCode::Char('t') => {
            state.dispatch(ListCommand::NextTemplate);
        }
        KeyCode::Char('T') => {
            state.dispatch(ListCommand::PrevTemplate);
        }
        KeyCode::Char('m') => {
            if let Ok(dispatch) = state.send_email(&mut view_data.notices) {
                tracing::debug!(recipient = %dispatch.recipient, "send handled");
            }
        }
        KeyCode::Char('d') => match state.cursor_proposal() {
            Some(proposal) => {
                let proposal_id = proposal.id;
                state.delete(proposal_id, runtime, &mut view_data.notices);
            }
            None => view_data.notices.info("nothing to delete"),
        },
        KeyCode::Char('a') => {
            view_data.form = Some(FormUiState::default());
            state.dispatch(ListCommand::EnterForm);
        }
        KeyCode::Char('r') => {
            if state.load(runtime, &mut view_data.notices) {
                view_data
                    .notices
                    .info(format!("loaded {} proposals", state.proposals().len()));
            }
        }
        KeyCode::Char('?') => view_data.help_visible = true,
        _ => {}
    }
    false
}

fn handle_search_key(state: &mut ListState, key: KeyEvent) {
    match (key.code, key.modifiers) {
        (KeyCode::Esc | KeyCode::Enter, _) => {
            state.dispatch(ListCommand::ExitToBrowse);
        }
        (KeyCode::Backspace, _) => {
            state.dispatch(ListCommand::PopQueryChar);
        }
        (KeyCode::Char('u'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            state.dispatch(ListCommand::ClearQuery);
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            state.dispatch(ListCommand::PushQueryChar(ch));
        }
        _ => {}
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut ListState,
    runtime: &mut R,
    view_data: &mut ViewData,
    key: KeyEvent,
) {
    let Some(form) = view_data.form.as_mut() else {
        state.dispatch(ListCommand::ExitToBrowse);
        return;
    };

    match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => {
            close_form(state, view_data);
            view_data.notices.info("create canceled");
        }
        (KeyCode::Tab, _) => form.move_field(1),
        (KeyCode::BackTab, _) => form.move_field(-1),
        (KeyCode::Backspace, _) => {
            let field = form.field();
            form.input.field_mut(field).pop();
        }
        (KeyCode::Enter, _) => submit_form(state, runtime, view_data),
        (KeyCode::Char('s'), modifiers) if modifiers.contains(KeyModifiers::CONTROL) => {
            submit_form(state, runtime, view_data);
        }
        (KeyCode::Char(ch), modifiers) if !modifiers.contains(KeyModifiers::CONTROL) => {
            let field = form.field();
            form.input.field_mut(field).push(ch);
        }
        _ => {}
    }
}

fn submit_form<R: AppRuntime>(state: &mut ListState, runtime: &mut R, view_data: &mut ViewData) {
    let Some(form) = view_data.form.as_ref() else {
        return;
    };

    match runtime.submit_proposal(&form.input) {
        Ok(proposal_id) => {
            close_form(state, view_data);
            view_data
                .notices
                .success(format!("proposal {proposal_id} created"));
            state.load(runtime, &mut view_data.notices);
        }
        Err(error) => {
            tracing::warn!(error = %format!("{error:#}"), "create proposal failed");
            view_data.notices.error(format!("create failed: {error:#}"));
        }
    }
}

fn close_form(state: &mut ListState, view_data: &mut ViewData) {
    view_data.form = None;
    state.dispatch(ListCommand::ExitToBrowse);
}

fn render(frame: &mut Frame<'_>, state: &ListState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let phase = state.phase();
    let header_text = if phase == ListPhase::Populated {
        controls_text(state)
    } else {
        String::new()
    };
    let header = Paragraph::new(header_text)
        .block(Block::default().title("pitchdesk").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    match phase {
        ListPhase::Loading => {
            let loading = Paragraph::new(LOADING_TEXT)
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default().title("proposals").borders(Borders::ALL));
            frame.render_widget(loading, layout[1]);
        }
        ListPhase::Empty => {
            let empty = Paragraph::new(EMPTY_STATE_TEXT)
                .block(Block::default().title("proposals").borders(Borders::ALL));
            frame.render_widget(empty, layout[1]);
        }
        ListPhase::Populated => render_table(frame, layout[1], state),
    }

    let footer = Paragraph::new(format!(
        "{}\ncontact: {}",
        status_text(state, view_data),
        view_data.contact_email
    ))
    .style(status_style(view_data))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, layout[2]);

    if let Some(form) = &view_data.form {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let overlay = Paragraph::new(form_overlay_text(form)).block(
            Block::default()
                .title("new proposal")
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(overlay, area);
    }

    if view_data.help_visible {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_table(frame: &mut Frame<'_>, area: Rect, state: &ListState) {
    let header = Row::new(TABLE_COLUMNS.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let selected = state.selected();
    let rows = state
        .filtered()
        .iter()
        .enumerate()
        .map(|(index, proposal)| {
            let is_selected = selected == Some(proposal.id);
            let mut style = Style::default();
            if is_selected {
                style = style.fg(Color::Green).add_modifier(Modifier::BOLD);
            }
            if index == state.cursor() {
                style = style.bg(Color::DarkGray);
            }
            Row::new(proposal_row_cells(proposal, is_selected)).style(style)
        });

    let widths = [
        Constraint::Length(1),
        Constraint::Length(4),
        Constraint::Min(12),
        Constraint::Min(16),
        Constraint::Min(16),
        Constraint::Min(10),
        Constraint::Length(8),
        Constraint::Length(14),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(state))
                .borders(Borders::ALL),
        );
    // offset scrolls so the cursor row stays on screen
    let mut table_state = TableState::default().with_selected(Some(state.cursor()));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn table_title(state: &ListState) -> String {
    if state.query().trim().is_empty() {
        return format!("proposals ({})", state.proposals().len());
    }
    format!(
        "proposals ({} of {})",
        state.filtered().len(),
        state.proposals().len()
    )
}

fn proposal_row_cells(proposal: &Proposal, selected: bool) -> Vec<String> {
    vec![
        if selected { SELECTED_MARK } else { " " }.to_owned(),
        proposal.id.to_string(),
        proposal.client_name.clone(),
        proposal.recipient().unwrap_or("-").to_owned(),
        proposal.title.clone(),
        proposal.tags.join(", "),
        proposal.status.as_str().to_owned(),
        proposal.amount_cents.map(format_money).unwrap_or_default(),
    ]
}

fn controls_text(state: &ListState) -> String {
    let cursor = if state.mode == ListMode::Search {
        "_"
    } else {
        ""
    };
    let selected = match state.selected_proposal() {
        Some(proposal) => format!("#{} {}", proposal.id, proposal.client_name),
        None => match state.selected() {
            Some(proposal_id) => format!("#{proposal_id} (missing)"),
            None => "none".to_owned(),
        },
    };
    format!(
        "search by {} (f): {}{cursor} | template (t/T): {} | selected: {selected}",
        state.search_by().label(),
        state.query(),
        state.template.label(),
    )
}

fn status_text(state: &ListState, view_data: &ViewData) -> String {
    if let Some(notice) = &view_data.notices.current {
        return format!("{} | {}", notice.level.as_str(), notice.message);
    }

    let (mode, hints) = match state.mode {
        ListMode::Browse => (
            "BROWSE",
            "j/k move | space select | / search | f field | t/T template | m send | a new | d delete | r reload | ? help | q quit",
        ),
        ListMode::Search => (
            "SEARCH",
            "type to filter | backspace delete | ctrl+u clear | enter/esc done",
        ),
        ListMode::Form => ("FORM", "tab/shift+tab field | enter or ctrl+s save | esc cancel"),
    };
    format!("{mode} | {hints}")
}

fn status_style(view_data: &ViewData) -> Style {
    let color = match view_data.notices.current.as_ref().map(|notice| notice.level) {
        Some(NoticeLevel::Info) => Color::Yellow,
        Some(NoticeLevel::Success) => Color::Green,
        Some(NoticeLevel::Error) => Color::Red,
        None => Color::Gray,
    };
    Style::default().fg(color)
}

fn form_overlay_text(form: &FormUiState) -> String {
    let mut lines = Vec::with_capacity(FormField::ALL.len() + 2);
    for (index, field) in FormField::ALL.iter().copied().enumerate() {
        let active = index == form.field_index;
        lines.push(format!(
            "{} {}{}: {}{}",
            if active { ">" } else { " " },
            field.label(),
            if field.required() { "*" } else { "" },
            form.input.field(field),
            if active { "_" } else { "" },
        ));
    }
    lines.push(String::new());
    lines.push("* required | tab/shift+tab field | enter or ctrl+s save | esc cancel".to_owned());
    lines.join("\n")
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit\n\
browse: j/k or up/down move | g/G first/last | space/enter select | q quit\n\
browse: / search | f switch search field | t/T next/prev template\n\
browse: m send to selected | a new proposal | d delete row | r reload | ? help\n\
search: type to filter | backspace delete | ctrl+u clear | enter/esc done\n\
form: tab/shift+tab field | enter or ctrl+s save | esc cancel"
}

fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let absolute = cents.unsigned_abs();
    let dollars = group_thousands(absolute / 100);
    let cents_component = absolute % 100;
    format!("{sign}${dollars}.{cents_component:02}")
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
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
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, FormUiState, InternalEvent, ViewData, controls_text, form_overlay_text,
        format_money, handle_key_event, process_internal_events, render, status_text,
        table_title,
    };
    use anyhow::{Result, anyhow};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use pitchdesk_app::{
        EmailTemplate, ListMode, ListState, NoticeLevel, Notifier, Proposal, ProposalFormInput,
        ProposalId, ProposalSource, ProposalStatus, SearchField,
    };
    use pitchdesk_testkit::ProposalFaker;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;

    #[derive(Debug, Default)]
    struct TestRuntime {
        proposals: Vec<Proposal>,
        fetch_error: Option<String>,
        deleted: Vec<ProposalId>,
        submitted: Vec<ProposalFormInput>,
    }

    impl TestRuntime {
        fn with_proposals(proposals: Vec<Proposal>) -> Self {
            Self {
                proposals,
                ..Self::default()
            }
        }

        fn sample_proposal(id: i64, client_name: &str, email: Option<&str>) -> Proposal {
            let mut proposal = ProposalFaker::new(id as u64).proposal().into_proposal(id);
            proposal.client_name = client_name.to_owned();
            proposal.client_email = email.map(str::to_owned);
            proposal.tags = vec!["web".to_owned()];
            proposal.status = ProposalStatus::Draft;
            proposal.amount_cents = Some(1_250_050);
            proposal
        }
    }

    impl ProposalSource for TestRuntime {
        fn fetch_proposals(&mut self) -> Result<Vec<Proposal>> {
            if let Some(message) = self.fetch_error.take() {
                return Err(anyhow!(message));
            }
            Ok(self.proposals.clone())
        }

        fn delete_proposal(&mut self, proposal_id: ProposalId) -> Result<()> {
            self.deleted.push(proposal_id);
            self.proposals.retain(|proposal| proposal.id != proposal_id);
            Ok(())
        }
    }

    impl AppRuntime for TestRuntime {
        fn submit_proposal(&mut self, input: &ProposalFormInput) -> Result<ProposalId> {
            let draft = input.validate()?;
            self.submitted.push(input.clone());
            let id = ProposalId::new(self.proposals.len() as i64 + 100);
            let mut proposal = Self::sample_proposal(id.get(), &draft.client_name, None);
            proposal.client_email = draft.client_email;
            proposal.title = draft.title;
            proposal.tags = draft.tags;
            proposal.amount_cents = draft.amount_cents;
            self.proposals.insert(0, proposal);
            Ok(id)
        }
    }

    fn sample_runtime() -> TestRuntime {
        TestRuntime::with_proposals(vec![
            TestRuntime::sample_proposal(1, "Acme Corp", Some("a@b.com")),
            TestRuntime::sample_proposal(2, "Globex", None),
            TestRuntime::sample_proposal(3, "Initech", Some("pm@initech.example")),
        ])
    }

    fn loaded(runtime: &mut TestRuntime) -> (ListState, ViewData) {
        let mut state = ListState::default();
        let mut view_data = ViewData {
            contact_email: "sales@pitchdesk.example".to_owned(),
            ..ViewData::default()
        };
        assert!(state.load(runtime, &mut view_data.notices));
        (state, view_data)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn press(
        state: &mut ListState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        keys: &[KeyEvent],
    ) -> bool {
        let mut quit = false;
        for key in keys {
            quit = handle_key_event(state, runtime, view_data, *key);
        }
        quit
    }

    fn type_text(
        state: &mut ListState,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        text: &str,
    ) {
        for ch in text.chars() {
            handle_key_event(state, runtime, view_data, key(KeyCode::Char(ch)));
        }
    }

    fn render_to_string(state: &ListState, view_data: &ViewData) -> String {
        let backend = TestBackend::new(120, 24);
        let mut terminal = Terminal::new(backend).expect("test terminal");
        terminal
            .draw(|frame| render(frame, state, view_data))
            .expect("draw");
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn latest_notice(view_data: &ViewData) -> Option<(NoticeLevel, String)> {
        view_data
            .notices
            .current
            .as_ref()
            .map(|notice| (notice.level, notice.message.clone()))
    }

    #[test]
    fn empty_collection_renders_empty_state_not_table() {
        let mut runtime = TestRuntime::default();
        let (state, view_data) = loaded(&mut runtime);

        let screen = render_to_string(&state, &view_data);
        assert!(screen.contains("no proposals yet"));
        assert!(screen.contains("press a to create"));
        assert!(!screen.contains("client"));
        assert!(!screen.contains("template (t/T)"));
    }

    #[test]
    fn loading_state_renders_indicator_only() {
        let mut runtime = sample_runtime();
        let (mut state, view_data) = loaded(&mut runtime);
        state.begin_load();

        let screen = render_to_string(&state, &view_data);
        assert!(screen.contains("loading proposals"));
        assert!(!screen.contains("Acme Corp"));
        assert!(!screen.contains("no proposals yet"));
    }

    #[test]
    fn populated_state_renders_controls_table_and_contact() {
        let mut runtime = sample_runtime();
        let (mut state, view_data) = loaded(&mut runtime);
        state.dispatch(pitchdesk_app::ListCommand::ToggleSelect(ProposalId::new(1)));

        let screen = render_to_string(&state, &view_data);
        assert!(screen.contains("search by client name"));
        assert!(screen.contains("Standard Proposal"));
        assert!(screen.contains("client"));
        assert!(screen.contains("Acme Corp"));
        assert!(screen.contains("Globex"));
        assert!(screen.contains("$12,500.50"));
        assert!(screen.contains("contact: sales@pitchdesk.example"));
        assert!(screen.contains("selected: #1 Acme Corp"));
        assert!(!screen.contains("no proposals yet"));
    }

    #[test]
    fn filtered_out_rows_are_not_rendered() {
        let mut runtime = sample_runtime();
        let (mut state, mut view_data) = loaded(&mut runtime);
        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('/'))],
        );
        type_text(&mut state, &mut runtime, &mut view_data, "glo");

        let screen = render_to_string(&state, &view_data);
        assert!(screen.contains("Globex"));
        assert!(!screen.contains("Acme Corp"));
        assert_eq!(table_title(&state), "proposals (1 of 3)");
    }

    #[test]
    fn search_mode_edits_query_and_q_does_not_quit() {
        let mut runtime = sample_runtime();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('/'))],
        );
        assert_eq!(state.mode, ListMode::Search);
        let quit = press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('q'))],
        );
        assert!(!quit);
        assert_eq!(state.query(), "q");

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Backspace)],
        );
        type_text(&mut state, &mut runtime, &mut view_data, "acme");
        assert_eq!(state.query(), "acme");
        assert!(controls_text(&state).contains("acme_"));

        press(&mut state, &mut runtime, &mut view_data, &[ctrl('u')]);
        assert_eq!(state.query(), "");

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Esc)]);
        assert_eq!(state.mode, ListMode::Browse);
    }

    #[test]
    fn field_and_template_keys_cycle() {
        let mut runtime = sample_runtime();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('f')), key(KeyCode::Char('t'))],
        );
        assert_eq!(state.search_by(), SearchField::Tags);
        assert_eq!(state.template, EmailTemplate::Detailed);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[
                KeyEvent::new(KeyCode::Char('T'), KeyModifiers::SHIFT),
                KeyEvent::new(KeyCode::Char('T'), KeyModifiers::SHIFT),
            ],
        );
        assert_eq!(state.template, EmailTemplate::Formal);
    }

    #[test]
    fn cursor_select_and_send_reports_missing_email() {
        let mut runtime = sample_runtime();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[
                key(KeyCode::Char('j')),
                key(KeyCode::Char(' ')),
                key(KeyCode::Char('m')),
            ],
        );
        assert_eq!(state.selected(), Some(ProposalId::new(2)));
        let (level, message) = latest_notice(&view_data).expect("notice");
        assert_eq!(level, NoticeLevel::Error);
        assert!(message.contains("no email address"));
        assert!(status_text(&state, &view_data).starts_with("error | "));
    }

    #[test]
    fn send_with_selection_reports_recipient() {
        let mut runtime = sample_runtime();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[
                key(KeyCode::Enter),
                key(KeyCode::Char('t')),
                key(KeyCode::Char('m')),
            ],
        );
        let (level, message) = latest_notice(&view_data).expect("notice");
        assert_eq!(level, NoticeLevel::Success);
        assert!(message.contains("a@b.com"));
        assert!(message.contains("Detailed Breakdown"));
    }

    #[test]
    fn send_without_selection_is_info() {
        let mut runtime = sample_runtime();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('m'))],
        );
        let (level, _) = latest_notice(&view_data).expect("notice");
        assert_eq!(level, NoticeLevel::Info);
        assert_eq!(view_data.notices.log.count(NoticeLevel::Success), 0);
    }

    #[test]
    fn delete_removes_cursor_row_and_reloads() {
        let mut runtime = sample_runtime();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('G')), key(KeyCode::Char('d'))],
        );
        assert_eq!(runtime.deleted, vec![ProposalId::new(3)]);
        assert_eq!(state.proposals().len(), 2);
        assert_eq!(state.cursor(), 1);
        let (level, message) = latest_notice(&view_data).expect("notice");
        assert_eq!(level, NoticeLevel::Success);
        assert!(message.contains("deleted"));
    }

    #[test]
    fn delete_with_no_rows_is_informational() {
        let mut runtime = TestRuntime::default();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('d'))],
        );
        assert!(runtime.deleted.is_empty());
        assert_eq!(
            latest_notice(&view_data),
            Some((NoticeLevel::Info, "nothing to delete".to_owned()))
        );
    }

    #[test]
    fn reload_failure_keeps_rows_and_shows_error() {
        let mut runtime = sample_runtime();
        let (mut state, mut view_data) = loaded(&mut runtime);
        runtime.fetch_error = Some("database is locked".to_owned());

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('r'))],
        );
        assert_eq!(state.proposals().len(), 3);
        let (level, message) = latest_notice(&view_data).expect("notice");
        assert_eq!(level, NoticeLevel::Error);
        assert!(message.contains("database is locked"));
    }

    #[test]
    fn create_form_submits_and_reloads() {
        let mut runtime = TestRuntime::default();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('a'))],
        );
        assert_eq!(state.mode, ListMode::Form);
        type_text(&mut state, &mut runtime, &mut view_data, "Hooli");
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Tab)]);
        type_text(&mut state, &mut runtime, &mut view_data, "gavin@hooli.example");
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Tab)]);
        type_text(&mut state, &mut runtime, &mut view_data, "Search revamp");
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Tab)]);
        type_text(&mut state, &mut runtime, &mut view_data, "search, data");
        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Tab)]);
        type_text(&mut state, &mut runtime, &mut view_data, "9,000");
        press(&mut state, &mut runtime, &mut view_data, &[ctrl('s')]);

        assert_eq!(runtime.submitted.len(), 1);
        assert_eq!(state.mode, ListMode::Browse);
        assert!(view_data.form.is_none());
        assert_eq!(state.proposals().len(), 1);
        let created = &state.proposals()[0];
        assert_eq!(created.client_name, "Hooli");
        assert_eq!(created.tags, vec!["search", "data"]);
        assert_eq!(created.amount_cents, Some(900_000));
        assert_eq!(view_data.notices.log.count(NoticeLevel::Success), 1);
    }

    #[test]
    fn invalid_form_keeps_form_open_with_error() {
        let mut runtime = TestRuntime::default();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('a')), key(KeyCode::Enter)],
        );
        assert_eq!(state.mode, ListMode::Form);
        assert!(view_data.form.is_some());
        assert!(runtime.submitted.is_empty());
        let (level, message) = latest_notice(&view_data).expect("notice");
        assert_eq!(level, NoticeLevel::Error);
        assert!(message.contains("client name is required"));
    }

    #[test]
    fn form_escape_cancels_and_backtab_wraps() {
        let mut runtime = TestRuntime::default();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('a')), key(KeyCode::BackTab)],
        );
        let form = view_data.form.clone().expect("form open");
        assert_eq!(form.field_index, 4);
        assert!(form_overlay_text(&form).contains("> amount ($): _"));

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Esc)]);
        assert_eq!(state.mode, ListMode::Browse);
        assert!(view_data.form.is_none());
    }

    #[test]
    fn form_overlay_marks_required_fields() {
        let form = FormUiState::default();
        let text = form_overlay_text(&form);
        assert!(text.contains("> client name*: _"));
        assert!(text.contains("  title*: "));
        assert!(text.contains("  client email: "));
    }

    #[test]
    fn quit_keys() {
        let mut runtime = sample_runtime();
        let (mut state, mut view_data) = loaded(&mut runtime);
        assert!(press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('q'))]
        ));

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('a'))],
        );
        assert!(press(&mut state, &mut runtime, &mut view_data, &[ctrl('q')]));
    }

    #[test]
    fn help_overlay_swallows_keys_until_closed() {
        let mut runtime = sample_runtime();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('?')), key(KeyCode::Char('j'))],
        );
        assert!(view_data.help_visible);
        assert_eq!(state.cursor(), 0);
        assert!(render_to_string(&state, &view_data).contains("help"));

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Esc)]);
        assert!(!view_data.help_visible);
    }

    #[test]
    fn stale_clear_token_keeps_newer_notice() {
        let mut view_data = ViewData::default();
        let (tx, rx) = mpsc::channel();

        view_data.notices.info("first");
        let first_token = view_data.notices.token;
        view_data.notices.error("second");

        tx.send(InternalEvent::ClearNotice { token: first_token })
            .expect("send");
        process_internal_events(&mut view_data, &rx);
        assert_eq!(
            latest_notice(&view_data),
            Some((NoticeLevel::Error, "second".to_owned()))
        );

        tx.send(InternalEvent::ClearNotice {
            token: view_data.notices.token,
        })
        .expect("send");
        process_internal_events(&mut view_data, &rx);
        assert_eq!(latest_notice(&view_data), None);
        assert_eq!(view_data.notices.log.len(), 2);
    }

    #[test]
    fn status_text_shows_mode_hints_without_notice() {
        let state = ListState::default();
        let view_data = ViewData::default();
        assert!(status_text(&state, &view_data).starts_with("BROWSE | "));
    }

    #[test]
    fn money_formatting_groups_thousands() {
        assert_eq!(format_money(0), "$0.00");
        assert_eq!(format_money(99), "$0.99");
        assert_eq!(format_money(123_456_789), "$1,234,567.89");
        assert_eq!(format_money(-100_000), "-$1,000.00");
    }

    #[test]
    fn cursor_row_stays_visible_when_rows_overflow_the_screen() {
        let mut runtime = TestRuntime::with_proposals(
            (1..=40)
                .map(|id| TestRuntime::sample_proposal(id, &format!("Client{id:02}"), None))
                .collect(),
        );
        let (mut state, mut view_data) = loaded(&mut runtime);

        let screen = render_to_string(&state, &view_data);
        assert!(screen.contains("Client01"));
        assert!(!screen.contains("Client40"));

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Char('G'))]);
        assert_eq!(state.cursor(), 39);
        let screen = render_to_string(&state, &view_data);
        assert!(screen.contains("Client40"));
        assert!(!screen.contains("Client01"));

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Char('d'))]);
        assert_eq!(runtime.deleted, vec![ProposalId::new(40)]);

        press(&mut state, &mut runtime, &mut view_data, &[key(KeyCode::Char('g'))]);
        let screen = render_to_string(&state, &view_data);
        assert!(screen.contains("Client01"));
    }

    #[test]
    fn search_keys_are_ignored_without_proposals() {
        let mut runtime = TestRuntime::default();
        let (mut state, mut view_data) = loaded(&mut runtime);

        press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('/')), key(KeyCode::Char('f'))],
        );
        assert_eq!(state.mode, ListMode::Browse);
        assert_eq!(state.search_by(), SearchField::Name);
        let (level, message) = latest_notice(&view_data).expect("notice");
        assert_eq!(level, NoticeLevel::Info);
        assert!(message.contains("nothing to search"));

        assert!(press(
            &mut state,
            &mut runtime,
            &mut view_data,
            &[key(KeyCode::Char('q'))]
        ));
    }
}
