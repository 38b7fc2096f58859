// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use pitchdesk_app::{Proposal, ProposalFormInput, ProposalId, ProposalStatus};
use std::path::PathBuf;
use time::{Duration, OffsetDateTime};

const COMPANY_PREFIXES: [&str; 14] = [
    "Acme", "Globex", "Initech", "Umbrella", "Hooli", "Stark", "Wayne", "Soylent", "Vandelay",
    "Cyberdyne", "Tyrell", "Wonka", "Gringotts", "Pied Piper",
];

const COMPANY_SUFFIXES: [&str; 7] = [
    "Corp",
    "Labs",
    "Industries",
    "Health",
    "Logistics",
    "Group",
    "Partners",
];

const CONTACT_NAMES: [&str; 12] = [
    "avery", "jordan", "taylor", "riley", "morgan", "casey", "quinn", "parker", "drew", "rowan",
    "hayden", "elliot",
];

const SERVICES: [&str; 10] = [
    "Website redesign",
    "Mobile app build",
    "Data platform migration",
    "Accessibility audit",
    "Brand refresh",
    "Cloud cost review",
    "Checkout optimization",
    "Analytics dashboard",
    "Support retainer",
    "Discovery sprint",
];

const TAGS: [&str; 10] = [
    "web",
    "mobile",
    "design",
    "data",
    "retainer",
    "audit",
    "urgent",
    "migration",
    "discovery",
    "enterprise",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeProposal {
    pub client_name: String,
    pub client_email: Option<String>,
    pub title: String,
    pub tags: Vec<String>,
    pub status: ProposalStatus,
    pub amount_cents: Option<i64>,
}

impl FakeProposal {
    /// Stamps the fake with an id and fixed timestamps so it can stand in for a stored row.
    pub fn into_proposal(self, id: i64) -> Proposal {
        let updated_at = reference_now() - Duration::hours(id);
        Proposal {
            id: ProposalId::new(id),
            client_name: self.client_name,
            client_email: self.client_email,
            title: self.title,
            tags: self.tags,
            status: self.status,
            amount_cents: self.amount_cents,
            created_at: updated_at - Duration::days(2),
            updated_at,
        }
    }

    /// What a user would have typed to create this proposal.
    pub fn form_input(&self) -> ProposalFormInput {
        ProposalFormInput {
            client_name: self.client_name.clone(),
            client_email: self.client_email.clone().unwrap_or_default(),
            title: self.title.clone(),
            tags: self.tags.join(", "),
            amount: self
                .amount_cents
                .map(|cents| format!("{}.{:02}", cents / 100, cents % 100))
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for realistic proposal rows.
#[derive(Debug, Clone)]
pub struct ProposalFaker {
    rng: DeterministicRng,
}

impl ProposalFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn proposal(&mut self) -> FakeProposal {
        let client_name = format!(
            "{} {}",
            self.pick(&COMPANY_PREFIXES),
            self.pick(&COMPANY_SUFFIXES)
        );
        // roughly one in four clients has no address on file
        let client_email = if self.rng.int_n(4) == 0 {
            None
        } else {
            Some(self.email_for(&client_name))
        };
        let title = self.pick(&SERVICES).to_owned();

        let tag_count = self.rng.int_n(4);
        let mut tags: Vec<String> = Vec::with_capacity(tag_count);
        while tags.len() < tag_count {
            let tag = self.pick(&TAGS);
            if !tags.iter().any(|existing| existing == tag) {
                tags.push(tag.to_owned());
            }
        }

        let status = ProposalStatus::ALL[self.rng.int_n(ProposalStatus::ALL.len())];
        let amount_cents = if self.rng.int_n(5) == 0 {
            None
        } else {
            Some(self.int_range_i64(5, 500) * 100_000)
        };

        FakeProposal {
            client_name,
            client_email,
            title,
            tags,
            status,
            amount_cents,
        }
    }

    /// `count` proposals with ids 1..=count, newest first.
    pub fn proposals(&mut self, count: usize) -> Vec<Proposal> {
        (1..=count as i64)
            .map(|id| self.proposal().into_proposal(id))
            .collect()
    }

    fn email_for(&mut self, client_name: &str) -> String {
        let domain = client_name
            .split_whitespace()
            .next()
            .unwrap_or("client")
            .to_lowercase();
        format!("{}@{domain}.example", self.pick(&CONTACT_NAMES))
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range_i64(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = max - min + 1;
        min + (self.rng.next_u64() % (span as u64)) as i64
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("pitchdesk.db");
    Ok((dir, db_path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

pub fn tag_vocabulary() -> &'static [&'static str] {
    &TAGS
}

fn reference_now() -> OffsetDateTime {
    // 2026-02-19T12:34:56Z
    OffsetDateTime::UNIX_EPOCH + Duration::seconds(1_771_504_496)
}
