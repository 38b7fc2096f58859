// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use pitchdesk_app::{Proposal, ProposalFormInput, ProposalId, ProposalSource};
use pitchdesk_db::{NewProposal, Store};

pub struct DbRuntime<'a> {
    store: &'a Store,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }
}

impl ProposalSource for DbRuntime<'_> {
    fn fetch_proposals(&mut self) -> Result<Vec<Proposal>> {
        self.store.list_proposals()
    }

    fn delete_proposal(&mut self, proposal_id: ProposalId) -> Result<()> {
        self.store.delete_proposal(proposal_id)
    }
}

impl pitchdesk_tui::AppRuntime for DbRuntime<'_> {
    fn submit_proposal(&mut self, input: &ProposalFormInput) -> Result<ProposalId> {
        let draft = input.validate()?;
        let proposal_id = self.store.create_proposal(&NewProposal::from(draft))?;
        tracing::info!(proposal_id = proposal_id.get(), "created proposal");
        Ok(proposal_id)
    }
}
