//! Producer-to-agency matching for uploaded submissions.

use std::collections::HashSet;

use rusqlite::Connection;
use serde::Serialize;

use crate::db::{list_agencies, search_agencies, DatabaseError};
use crate::models::Agency;

/// Maximum agency suggestions returned per upload.
pub const MAX_AGENCY_MATCHES: usize = 10;

/// Jaro-Winkler score a normalized name must reach in the fuzzy pass.
pub const FUZZY_THRESHOLD: f64 = 0.85;

/// SQL candidates considered before ranking.
const CANDIDATE_LIMIT: usize = 50;

const NAME_SUFFIXES: &[&str] = &["inc", "llc", "corp", "co", "ltd", "the"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgencyMatch {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub dba: Option<String>,
    pub email: Option<String>,
    pub primary_underwriter: Option<String>,
}

impl From<&Agency> for AgencyMatch {
    fn from(agency: &Agency) -> Self {
        Self {
            id: agency.id,
            name: agency.name.clone(),
            code: agency.code.clone(),
            dba: agency.dba.clone(),
            email: agency.email.clone(),
            primary_underwriter: agency.primary_underwriter.clone(),
        }
    }
}

/// Lowercase, strip punctuation and corporate suffixes, collapse spaces.
pub fn normalize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect();
    cleaned
        .split_whitespace()
        .filter(|word| !NAME_SUFFIXES.contains(word))
        .collect::<Vec<_>>()
        .join(" ")
}

fn similarity(agency: &Agency, normalized: &str) -> f64 {
    std::iter::once(agency.name.as_str())
        .chain(agency.dba.as_deref())
        .map(|candidate| strsim::jaro_winkler(&normalize_name(candidate), normalized))
        .fold(0.0, f64::max)
}

/// Agencies that plausibly submitted a document naming this producer.
///
/// Ranked by exact code, then name similarity.
pub fn match_agencies(
    conn: &Connection,
    producer_name: Option<&str>,
    producer_code: Option<&str>,
) -> Result<Vec<AgencyMatch>, DatabaseError> {
    let name = producer_name.map(str::trim).filter(|n| !n.is_empty());
    let code = producer_code.map(str::trim).filter(|c| !c.is_empty());
    if name.is_none() && code.is_none() {
        return Ok(Vec::new());
    }

    let normalized = name.map(normalize_name).unwrap_or_default();
    let mut candidates = match name {
        Some(name) => search_agencies(conn, Some(name), None, CANDIDATE_LIMIT)?,
        None => Vec::new(),
    };

    // Fuzzy pass runs on a name miss whether or not the code hits
    if candidates.is_empty() && !normalized.is_empty() {
        candidates = list_agencies(conn, None)?
            .into_iter()
            .filter(|agency| similarity(agency, &normalized) >= FUZZY_THRESHOLD)
            .collect();
        tracing::debug!(found = candidates.len(), "Fuzzy agency pass");
    }

    if let Some(code) = code {
        candidates.extend(search_agencies(conn, None, Some(code), CANDIDATE_LIMIT)?);
    }
    let mut seen = HashSet::new();
    candidates.retain(|agency| seen.insert(agency.id));

    let mut scored: Vec<(bool, f64, Agency)> = candidates
        .into_iter()
        .map(|agency| {
            let exact_code = code.is_some_and(|c| agency.code.trim() == c);
            let score = if normalized.is_empty() {
                0.0
            } else {
                similarity(&agency, &normalized)
            };
            (exact_code, score, agency)
        })
        .collect();
    scored.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then(b.1.total_cmp(&a.1))
            .then(a.2.id.cmp(&b.2.id))
    });

    Ok(scored
        .iter()
        .take(MAX_AGENCY_MATCHES)
        .map(|(_, _, agency)| AgencyMatch::from(agency))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::insert_agency;
    use crate::db::sqlite::open_memory_database;
    use crate::models::AgencyInput;

    fn seed(conn: &Connection, name: &str, code: &str, dba: Option<&str>) {
        let mut input = AgencyInput::new(name, code);
        input.dba = dba.map(String::from);
        insert_agency(conn, &input).unwrap();
    }

    #[test]
    fn nothing_to_match_on() {
        let conn = open_memory_database().unwrap();
        seed(&conn, "Harbor Insurance", "H100", None);
        assert!(match_agencies(&conn, Some("  "), None).unwrap().is_empty());
        assert!(match_agencies(&conn, None, None).unwrap().is_empty());
    }

    #[test]
    fn exact_code_ranks_first() {
        let conn = open_memory_database().unwrap();
        seed(&conn, "Harbor Insurance Services", "H100", None);
        seed(&conn, "Harbor Insurance", "H200", None);
        let matches = match_agencies(&conn, Some("Harbor Insurance"), Some("H100")).unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].code, "H100");
        assert_eq!(matches[1].code, "H200");
    }

    #[test]
    fn like_search_covers_dba() {
        let conn = open_memory_database().unwrap();
        seed(&conn, "Pacific Holdings", "P1", Some("Bayside Brokers"));
        let matches = match_agencies(&conn, Some("bayside"), None).unwrap();
        assert_eq!(matches[0].code, "P1");
        assert_eq!(matches[0].dba.as_deref(), Some("Bayside Brokers"));
    }

    #[test]
    fn fuzzy_pass_catches_spelling_variants() {
        let conn = open_memory_database().unwrap();
        seed(&conn, "Harbour Insurance Agency", "H100", None);
        seed(&conn, "Summit Risk", "S200", None);
        let matches = match_agencies(&conn, Some("Harbor Insurance Agency, Inc."), None).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].code, "H100");
    }

    #[test]
    fn code_hit_does_not_suppress_fuzzy_name_match() {
        let conn = open_memory_database().unwrap();
        seed(&conn, "Harbour Insurance Agency", "H100", None);
        seed(&conn, "Zed Brokers", "X9", None);
        let matches =
            match_agencies(&conn, Some("Harbor Insurance Agency"), Some("X9")).unwrap();
        let codes: Vec<&str> = matches.iter().map(|m| m.code.as_str()).collect();
        assert_eq!(codes, ["X9", "H100"]);
    }

    #[test]
    fn results_are_capped() {
        let conn = open_memory_database().unwrap();
        for i in 0..15 {
            seed(&conn, &format!("Coastal Agency {i}"), &format!("C{i}"), None);
        }
        assert_eq!(match_agencies(&conn, Some("Coastal"), None).unwrap().len(), 10);
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_name("The Harbor Group, LLC."), "harbor group");
        assert_eq!(normalize_name("  A&B   Insurance "), "a b insurance");
    }
}
