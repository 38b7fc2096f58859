// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::fmt;

use crate::{EmailTemplate, Notifier, Proposal, ProposalId, SearchField, filter_proposals};

/// Where proposals come from and where deletions go.
pub trait ProposalSource {
    fn fetch_proposals(&mut self) -> Result<Vec<Proposal>>;
    fn delete_proposal(&mut self, proposal_id: ProposalId) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Browse,
    Search,
    Form,
}

/// Which body the list view shows. Checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPhase {
    Loading,
    Empty,
    Populated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState {
    pub mode: ListMode,
    pub template: EmailTemplate,
    proposals: Vec<Proposal>,
    filtered: Vec<Proposal>,
    loading: bool,
    selected: Option<ProposalId>,
    query: String,
    search_by: SearchField,
    cursor: usize,
}

impl Default for ListState {
    fn default() -> Self {
        Self {
            mode: ListMode::Browse,
            template: EmailTemplate::default(),
            proposals: Vec::new(),
            filtered: Vec::new(),
            loading: false,
            selected: None,
            query: String::new(),
            search_by: SearchField::default(),
            cursor: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    MoveCursor(isize),
    CursorFirst,
    CursorLast,
    ToggleSelect(ProposalId),
    ToggleSelectAtCursor,
    SetQuery(String),
    PushQueryChar(char),
    PopQueryChar,
    ClearQuery,
    SetSearchBy(SearchField),
    ToggleSearchBy,
    SetTemplate(EmailTemplate),
    NextTemplate,
    PrevTemplate,
    EnterSearch,
    EnterForm,
    ExitToBrowse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    CursorMoved(usize),
    SelectionChanged(Option<ProposalId>),
    FilterChanged { visible: usize, total: usize },
    TemplateChanged(EmailTemplate),
    ModeChanged(ListMode),
}

/// A simulated outgoing email. Nothing leaves the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailDispatch {
    pub proposal_id: ProposalId,
    pub recipient: String,
    pub template: EmailTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendEmailError {
    NothingSelected,
    NotFound(ProposalId),
    MissingEmail { client_name: String },
}

impl fmt::Display for SendEmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NothingSelected => write!(f, "select a proposal first -- press space on a row"),
            Self::NotFound(proposal_id) => write!(
                f,
                "proposal {proposal_id} not found -- it may have been deleted; reload and retry"
            ),
            Self::MissingEmail { client_name } => write!(
                f,
                "{client_name} has no email address -- add one before sending"
            ),
        }
    }
}

impl std::error::Error for SendEmailError {}

impl ListState {
    pub fn with_preferences(template: EmailTemplate, search_by: SearchField) -> Self {
        Self {
            template,
            search_by,
            ..Self::default()
        }
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn filtered(&self) -> &[Proposal] {
        &self.filtered
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn selected(&self) -> Option<ProposalId> {
        self.selected
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn search_by(&self) -> SearchField {
        self.search_by
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn phase(&self) -> ListPhase {
        if self.loading {
            ListPhase::Loading
        } else if self.proposals.is_empty() {
            ListPhase::Empty
        } else {
            ListPhase::Populated
        }
    }

    pub fn cursor_proposal(&self) -> Option<&Proposal> {
        self.filtered.get(self.cursor)
    }

    pub fn selected_proposal(&self) -> Option<&Proposal> {
        let selected = self.selected?;
        self.proposals
            .iter()
            .find(|proposal| proposal.id == selected)
    }

    pub fn dispatch(&mut self, command: ListCommand) -> Vec<ListEvent> {
        match command {
            ListCommand::MoveCursor(delta) => self.move_cursor(delta),
            ListCommand::CursorFirst => self.set_cursor(0),
            ListCommand::CursorLast => self.set_cursor(self.filtered.len().saturating_sub(1)),
            ListCommand::ToggleSelect(proposal_id) => self.toggle_select(proposal_id),
            ListCommand::ToggleSelectAtCursor => match self.cursor_proposal() {
                Some(proposal) => {
                    let proposal_id = proposal.id;
                    self.toggle_select(proposal_id)
                }
                None => Vec::new(),
            },
            ListCommand::SetQuery(query) => {
                self.query = query;
                self.recompute()
            }
            ListCommand::PushQueryChar(ch) => {
                self.query.push(ch);
                self.recompute()
            }
            ListCommand::PopQueryChar => {
                if self.query.pop().is_none() {
                    return Vec::new();
                }
                self.recompute()
            }
            ListCommand::ClearQuery => {
                if self.query.is_empty() {
                    return Vec::new();
                }
                self.query.clear();
                self.recompute()
            }
            ListCommand::SetSearchBy(field) => {
                self.search_by = field;
                self.recompute()
            }
            ListCommand::ToggleSearchBy => {
                self.search_by = self.search_by.toggled();
                self.recompute()
            }
            ListCommand::SetTemplate(template) => {
                self.template = template;
                vec![ListEvent::TemplateChanged(self.template)]
            }
            ListCommand::NextTemplate => {
                self.template = self.template.rotate(1);
                vec![ListEvent::TemplateChanged(self.template)]
            }
            ListCommand::PrevTemplate => {
                self.template = self.template.rotate(-1);
                vec![ListEvent::TemplateChanged(self.template)]
            }
            ListCommand::EnterSearch => self.set_mode(ListMode::Search),
            ListCommand::EnterForm => self.set_mode(ListMode::Form),
            ListCommand::ExitToBrowse => self.set_mode(ListMode::Browse),
        }
    }

    /// Replaces the full collection and recomputes the filtered view.
    pub fn replace_proposals(&mut self, proposals: Vec<Proposal>) -> Vec<ListEvent> {
        self.proposals = proposals;
        self.recompute()
    }

    /// Marks a fetch as in flight so the next frame shows the loading state.
    pub fn begin_load(&mut self) {
        self.loading = true;
    }

    /// Fetches the full collection. On failure the current collection is kept
    /// (empty on first load), the error is logged and an error notice raised.
    pub fn load<S, N>(&mut self, source: &mut S, notifier: &mut N) -> bool
    where
        S: ProposalSource,
        N: Notifier,
    {
        self.begin_load();
        let loaded = match source.fetch_proposals() {
            Ok(proposals) => {
                tracing::debug!(count = proposals.len(), "loaded proposals");
                self.replace_proposals(proposals);
                true
            }
            Err(error) => {
                tracing::warn!(error = %format!("{error:#}"), "load proposals failed");
                notifier.error(format!("load failed: {error:#}"));
                false
            }
        };
        self.loading = false;
        loaded
    }

    /// Deletes through `source`, then reloads the whole collection.
    pub fn delete<S, N>(&mut self, proposal_id: ProposalId, source: &mut S, notifier: &mut N) -> bool
    where
        S: ProposalSource,
        N: Notifier,
    {
        if let Err(error) = source.delete_proposal(proposal_id) {
            tracing::warn!(
                proposal_id = proposal_id.get(),
                error = %format!("{error:#}"),
                "delete proposal failed"
            );
            notifier.error(format!("delete failed: {error:#}"));
            return false;
        }

        match source.fetch_proposals() {
            Ok(proposals) => {
                tracing::info!(proposal_id = proposal_id.get(), "deleted proposal");
                self.replace_proposals(proposals);
                notifier.success(format!("proposal {proposal_id} deleted"));
                true
            }
            Err(error) => {
                tracing::warn!(
                    proposal_id = proposal_id.get(),
                    error = %format!("{error:#}"),
                    "reload after delete failed"
                );
                notifier.error(format!("deleted, but reload failed: {error:#}"));
                false
            }
        }
    }

    /// Validates the selection and simulates sending it with the chosen template.
    pub fn send_email<N: Notifier>(
        &self,
        notifier: &mut N,
    ) -> Result<EmailDispatch, SendEmailError> {
        let result = self.prepare_email();
        match &result {
            Ok(dispatch) => {
                tracing::info!(
                    proposal_id = dispatch.proposal_id.get(),
                    template = dispatch.template.as_str(),
                    "simulated proposal email"
                );
                notifier.success(format!(
                    "sent \"{}\" to {}",
                    dispatch.template.label(),
                    dispatch.recipient
                ));
            }
            Err(error @ SendEmailError::NothingSelected) => notifier.info(error.to_string()),
            Err(error) => notifier.error(error.to_string()),
        }
        result
    }

    fn prepare_email(&self) -> Result<EmailDispatch, SendEmailError> {
        let selected = self.selected.ok_or(SendEmailError::NothingSelected)?;
        let proposal = self
            .selected_proposal()
            .ok_or(SendEmailError::NotFound(selected))?;
        let recipient = proposal
            .recipient()
            .ok_or_else(|| SendEmailError::MissingEmail {
                client_name: proposal.client_name.clone(),
            })?;
        Ok(EmailDispatch {
            proposal_id: proposal.id,
            recipient: recipient.to_owned(),
            template: self.template,
        })
    }

    fn toggle_select(&mut self, proposal_id: ProposalId) -> Vec<ListEvent> {
        self.selected = if self.selected == Some(proposal_id) {
            None
        } else {
            Some(proposal_id)
        };
        vec![ListEvent::SelectionChanged(self.selected)]
    }

    fn recompute(&mut self) -> Vec<ListEvent> {
        self.filtered = filter_proposals(&self.proposals, &self.query, self.search_by);
        let mut events = vec![ListEvent::FilterChanged {
            visible: self.filtered.len(),
            total: self.proposals.len(),
        }];
        let clamped = self.cursor.min(self.filtered.len().saturating_sub(1));
        if clamped != self.cursor {
            self.cursor = clamped;
            events.push(ListEvent::CursorMoved(self.cursor));
        }
        events
    }

    fn move_cursor(&mut self, delta: isize) -> Vec<ListEvent> {
        if self.filtered.is_empty() {
            return Vec::new();
        }
        let last = self.filtered.len() as isize - 1;
        let next = (self.cursor as isize + delta).clamp(0, last) as usize;
        self.set_cursor(next)
    }

    fn set_cursor(&mut self, index: usize) -> Vec<ListEvent> {
        let index = index.min(self.filtered.len().saturating_sub(1));
        if index == self.cursor {
            return Vec::new();
        }
        self.cursor = index;
        vec![ListEvent::CursorMoved(self.cursor)]
    }

    fn set_mode(&mut self, mode: ListMode) -> Vec<ListEvent> {
        if self.mode == mode {
            return Vec::new();
        }
        self.mode = mode;
        vec![ListEvent::ModeChanged(self.mode)]
    }
}
