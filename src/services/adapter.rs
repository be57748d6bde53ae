//! Candidate source adapter
//!
//! Turns raw upstream scorer records into method-stamped [`Candidate`]s. Records
//! that cannot be used (no identifier, no finite score) are dropped with a warning
//! so one bad row never fails a request.
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::models::{Candidate, ItemId, Method, RawItemId, UpstreamRecord};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Converts a ranked list of upstream records into candidates, preserving order
pub fn adapt_records(records: Vec<UpstreamRecord>, method: Method) -> Vec<Candidate> {
    let total = records.len();

    let candidates: Vec<Candidate> = records
        .into_iter()
        .enumerate()
        .filter_map(|(position, record)| adapt_record(record, method, position))
        .collect();

    if candidates.len() < total {
        tracing::warn!(
            method = %method,
            dropped = total - candidates.len(),
            kept = candidates.len(),
            "Dropped malformed upstream records"
        );
    }

    candidates
}

fn adapt_record(record: UpstreamRecord, method: Method, position: usize) -> Option<Candidate> {
    let item_id = match record.item_id {
        Some(RawItemId::Number(id)) => ItemId::from(id),
        Some(RawItemId::Text(id)) if !id.trim().is_empty() => ItemId(id.trim().to_string()),
        _ => {
            tracing::warn!(method = %method, position, "Upstream record without item id");
            return None;
        }
    };

    let raw_score = match record.score {
        Some(score) if score.is_finite() => score,
        _ => {
            tracing::warn!(
                method = %method,
                item_id = %item_id,
                "Upstream record without a finite score"
            );
            return None;
        }
    };

    let created_at = record.created_at.as_deref().and_then(|raw| {
        let parsed = parse_created_at(raw);
        if parsed.is_none() {
            tracing::debug!(item_id = %item_id, created_at = raw, "Unparseable created_at");
        }
        parsed
    });

    Some(Candidate {
        item_id,
        method,
        raw_score,
        category: record
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        created_at,
        normalized_score: None,
        title: record.title,
    })
}

/// Parses RFC 3339 timestamps, falling back to naive timestamps read as UTC
pub fn parse_created_at(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
