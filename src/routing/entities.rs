// src/routing/entities.rs
// Entity extraction: pulls structured slots out of free text using the
// reference tables supplied by the data layer

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Named entity slots the extractor can populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntitySlot {
    Category,
    PersonName,
    ProjectName,
    TimeReference,
}

impl EntitySlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntitySlot::Category => "category",
            EntitySlot::PersonName => "personName",
            EntitySlot::ProjectName => "projectName",
            EntitySlot::TimeReference => "timeReference",
        }
    }
}

/// Clock times like "2:30" or "11:15pm".
static CLOCK_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([01]?\d|2[0-3]):[0-5]\d\s*(am|pm)?\b").unwrap());

/// Relative time words recognized without any table lookup.
const RELATIVE_TIME_TERMS: &[&str] = &["now", "next", "today", "tomorrow", "tonight", "later"];

/// Lowercases, drops apostrophes ("what's" -> "whats") and maps all other
/// punctuation to spaces. Both queries and catalogue phrases go through this
/// so matching is insensitive to case and punctuation.
pub(crate) fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if c == '\'' || c == '\u{2019}' {
            // drop, so contractions stay one token
        } else {
            out.push(' ');
        }
    }
    out
}

pub(crate) fn tokenize(normalized: &str) -> Vec<String> {
    normalized.split_whitespace().map(str::to_string).collect()
}

/// True when `phrase` occurs as a contiguous token run inside `tokens`.
pub(crate) fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    if phrase.is_empty() || phrase.len() > tokens.len() {
        return false;
    }
    tokens.windows(phrase.len()).any(|w| w == phrase)
}

/// One alias table entry: pre-normalized tokens plus the canonical value to
/// report when it matches.
#[derive(Debug, Clone)]
struct AliasEntry {
    tokens: Vec<String>,
    canonical: String,
}

fn build_entries<I, S>(values: I) -> Vec<AliasEntry>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .map(|v| {
            let canonical = v.into();
            AliasEntry {
                tokens: tokenize(&normalize(&canonical)),
                canonical,
            }
        })
        .filter(|e| !e.tokens.is_empty())
        .collect()
}

/// Finds the entry with the longest matching alias; ties keep table order.
fn find_alias(entries: &[AliasEntry], tokens: &[String]) -> Option<String> {
    let mut best: Option<&AliasEntry> = None;
    for entry in entries {
        if contains_phrase(tokens, &entry.tokens)
            && best.is_none_or(|b| entry.tokens.len() > b.tokens.len())
        {
            best = Some(entry);
        }
    }
    best.map(|e| e.canonical.clone())
}

/// Roster snapshot for alias matching: known categories, people, and
/// project-name tokens. Supplied by the data layer; the router treats it as
/// fresh enough and never refreshes it itself.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    categories: Vec<AliasEntry>,
    people: Vec<AliasEntry>,
    project_tokens: Vec<AliasEntry>,
}

impl ReferenceTables {
    pub fn new<I, S>(categories: I, people: I, project_tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: build_entries(categories),
            people: build_entries(people),
            project_tokens: build_entries(project_tokens),
        }
    }

    fn find_category(&self, tokens: &[String]) -> Option<String> {
        find_alias(&self.categories, tokens)
    }

    fn find_person(&self, tokens: &[String]) -> Option<String> {
        find_alias(&self.people, tokens)
    }

    fn find_project(&self, tokens: &[String]) -> Option<String> {
        find_alias(&self.project_tokens, tokens)
    }
}

/// Extracts entity slots from a query. Pure function of the text and the
/// reference tables; unparseable text simply yields fewer slots, never an
/// error.
pub fn extract(query: &str, tables: &ReferenceTables) -> BTreeMap<EntitySlot, String> {
    let tokens = tokenize(&normalize(query));
    let mut slots = BTreeMap::new();
    if tokens.is_empty() {
        return slots;
    }

    if let Some(category) = tables.find_category(&tokens) {
        slots.insert(EntitySlot::Category, category);
    }
    if let Some(person) = tables.find_person(&tokens) {
        slots.insert(EntitySlot::PersonName, person);
    }
    if let Some(time) = extract_time_reference(query, &tokens) {
        slots.insert(EntitySlot::TimeReference, time);
    }

    // Project names: literal token match first, then the proper-noun
    // heuristics for spans no table knows about.
    let project = tables
        .find_project(&tokens)
        .or_else(|| quoted_span(query).filter(|s| !already_extracted(&slots, s)))
        .or_else(|| capitalized_span(query).filter(|s| !already_extracted(&slots, s)));
    if let Some(project) = project {
        slots.insert(EntitySlot::ProjectName, project);
    }

    slots
}

fn extract_time_reference(query: &str, tokens: &[String]) -> Option<String> {
    if let Some(m) = CLOCK_TIME.find(query) {
        return Some(m.as_str().trim().to_string());
    }
    tokens
        .iter()
        .find(|t| RELATIVE_TIME_TERMS.contains(&t.as_str()))
        .cloned()
}

/// True when a heuristic candidate duplicates a value another slot already
/// claimed (e.g. a capitalized person name that the people table matched).
fn already_extracted(slots: &BTreeMap<EntitySlot, String>, candidate: &str) -> bool {
    let normalized = normalize(candidate);
    let wanted = normalized.split_whitespace().collect::<Vec<_>>();
    slots.values().any(|v| {
        let existing = normalize(v);
        existing.split_whitespace().collect::<Vec<_>>() == wanted
    })
}

/// First double-quoted span, if any.
fn quoted_span(query: &str) -> Option<String> {
    let start = query.find('"')?;
    let rest = &query[start + 1..];
    let end = rest.find('"')?;
    let inner = rest[..end].trim();
    (!inner.is_empty()).then(|| inner.to_string())
}

/// Proper-noun heuristic: the first run of two or more capitalized words, or
/// a single capitalized word that is not the sentence opener.
fn capitalized_span(query: &str) -> Option<String> {
    let words: Vec<&str> = query.split_whitespace().collect();
    let mut run: Vec<&str> = Vec::new();
    let mut run_start = 0usize;

    for (i, word) in words.iter().enumerate() {
        let core = word.trim_matches(|c: char| !c.is_alphanumeric());
        let capitalized =
            core.len() >= 2 && core.chars().next().is_some_and(|c| c.is_uppercase());
        if capitalized {
            if run.is_empty() {
                run_start = i;
            }
            run.push(core);
        } else if !run.is_empty() {
            if run.len() >= 2 || run_start > 0 {
                return Some(run.join(" "));
            }
            run.clear();
        }
    }
    if !run.is_empty() && (run.len() >= 2 || run_start > 0) {
        return Some(run.join(" "));
    }
    None
}
