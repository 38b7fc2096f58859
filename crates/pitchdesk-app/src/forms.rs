// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    ClientName,
    ClientEmail,
    Title,
    Tags,
    Amount,
}

impl FormField {
    pub const ALL: [Self; 5] = [
        Self::ClientName,
        Self::ClientEmail,
        Self::Title,
        Self::Tags,
        Self::Amount,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::ClientName => "client name",
            Self::ClientEmail => "client email",
            Self::Title => "title",
            Self::Tags => "tags (comma separated)",
            Self::Amount => "amount ($)",
        }
    }

    pub const fn required(self) -> bool {
        matches!(self, Self::ClientName | Self::Title)
    }
}

/// Raw text the user typed into the create form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProposalFormInput {
    pub client_name: String,
    pub client_email: String,
    pub title: String,
    pub tags: String,
    pub amount: String,
}

/// Validated form contents, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalDraft {
    pub client_name: String,
    pub client_email: Option<String>,
    pub title: String,
    pub tags: Vec<String>,
    pub amount_cents: Option<i64>,
}

impl ProposalFormInput {
    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::ClientName => &self.client_name,
            FormField::ClientEmail => &self.client_email,
            FormField::Title => &self.title,
            FormField::Tags => &self.tags,
            FormField::Amount => &self.amount,
        }
    }

    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::ClientName => &mut self.client_name,
            FormField::ClientEmail => &mut self.client_email,
            FormField::Title => &mut self.title,
            FormField::Tags => &mut self.tags,
            FormField::Amount => &mut self.amount,
        }
    }

    pub fn validate(&self) -> Result<ProposalDraft> {
        let client_name = self.client_name.trim();
        if client_name.is_empty() {
            bail!("client name is required -- enter a name and retry");
        }

        let client_email = self.client_email.trim();
        if !client_email.is_empty() {
            validate_email(client_email)?;
        }

        let title = self.title.trim();
        if title.is_empty() {
            bail!("proposal title is required -- enter a title and retry");
        }

        Ok(ProposalDraft {
            client_name: client_name.to_owned(),
            client_email: (!client_email.is_empty()).then(|| client_email.to_owned()),
            title: title.to_owned(),
            tags: parse_tags(&self.tags),
            amount_cents: parse_amount_cents(&self.amount)?,
        })
    }
}

/// Splits comma-separated tags, dropping blanks and case-insensitive repeats.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
        if !tags
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(tag))
        {
            tags.push(tag.to_owned());
        }
    }
    tags
}

/// Parses `1234`, `1,234.5` or `$99.99` into cents. Blank means no amount.
pub fn parse_amount_cents(raw: &str) -> Result<Option<i64>> {
    let cleaned = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|ch| *ch != ',')
        .collect::<String>();
    if cleaned.is_empty() {
        return Ok(None);
    }

    let (whole, fraction) = match cleaned.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        bail!("amount {raw:?} is not a number -- use a value like 1500 or 1500.00");
    }
    if !whole.chars().all(|ch| ch.is_ascii_digit())
        || !fraction.chars().all(|ch| ch.is_ascii_digit())
    {
        bail!("amount {raw:?} is not a number -- use a value like 1500 or 1500.00");
    }
    if fraction.len() > 2 {
        bail!("amount {raw:?} has more than two decimal places");
    }

    let dollars: i64 = if whole.is_empty() {
        0
    } else {
        whole
            .parse()
            .map_err(|_| anyhow::anyhow!("amount {raw:?} is too large"))?
    };
    let cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().unwrap_or(0) * 10,
        _ => fraction.parse::<i64>().unwrap_or(0),
    };

    dollars
        .checked_mul(100)
        .and_then(|value| value.checked_add(cents))
        .map(Some)
        .ok_or_else(|| anyhow::anyhow!("amount {raw:?} is too large"))
}

fn validate_email(email: &str) -> Result<()> {
    let Some((local, domain)) = email.split_once('@') else {
        bail!("client email {email:?} is missing '@' -- use name@domain");
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        bail!("client email {email:?} is malformed -- use name@domain");
    }
    if email.chars().any(char::is_whitespace) {
        bail!("client email {email:?} contains spaces");
    }
    Ok(())
}
