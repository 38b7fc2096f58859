// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::ids::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Draft,
    Sent,
    Accepted,
    Declined,
}

impl ProposalStatus {
    pub const ALL: [Self; 4] = [Self::Draft, Self::Sent, Self::Accepted, Self::Declined];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "sent" => Some(Self::Sent),
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// Formatting preset for an outgoing proposal email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EmailTemplate {
    #[default]
    Standard,
    Detailed,
    Summary,
    Formal,
}

impl EmailTemplate {
    pub const ALL: [Self; 4] = [Self::Standard, Self::Detailed, Self::Summary, Self::Formal];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Detailed => "detailed",
            Self::Summary => "summary",
            Self::Formal => "formal",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(Self::Standard),
            "detailed" => Some(Self::Detailed),
            "summary" => Some(Self::Summary),
            "formal" => Some(Self::Formal),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "Standard Proposal",
            Self::Detailed => "Detailed Breakdown",
            Self::Summary => "Brief Summary",
            Self::Formal => "Formal Business Proposal",
        }
    }

    pub fn rotate(self, delta: isize) -> Self {
        let current = Self::ALL
            .iter()
            .position(|template| *template == self)
            .unwrap_or(0) as isize;
        let len = Self::ALL.len() as isize;
        Self::ALL[(current + delta).rem_euclid(len) as usize]
    }
}

/// Which proposal field the search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchField {
    #[default]
    Name,
    Tags,
}

impl SearchField {
    pub const ALL: [Self; 2] = [Self::Name, Self::Tags];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Tags => "tags",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "name" => Some(Self::Name),
            "tags" => Some(Self::Tags),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "client name",
            Self::Tags => "tags",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Name => Self::Tags,
            Self::Tags => Self::Name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub client_name: String,
    pub client_email: Option<String>,
    pub title: String,
    pub tags: Vec<String>,
    pub status: ProposalStatus,
    pub amount_cents: Option<i64>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Proposal {
    /// Trimmed client email, treating blank values as absent.
    pub fn recipient(&self) -> Option<&str> {
        self.client_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}
