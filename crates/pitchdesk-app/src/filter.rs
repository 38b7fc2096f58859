// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Proposal, SearchField};

/// Returns the proposals whose `field` contains `query`, ignoring case.
///
/// The result keeps the input order. A query that is empty after trimming
/// returns the whole collection.
pub fn filter_proposals(proposals: &[Proposal], query: &str, field: SearchField) -> Vec<Proposal> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return proposals.to_vec();
    }

    proposals
        .iter()
        .filter(|proposal| proposal_matches(proposal, &needle, field))
        .cloned()
        .collect()
}

// `needle` must already be lowercased.
fn proposal_matches(proposal: &Proposal, needle: &str, field: SearchField) -> bool {
    match field {
        SearchField::Name => contains_folded(&proposal.client_name, needle),
        SearchField::Tags => proposal.tags.iter().any(|tag| contains_folded(tag, needle)),
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
