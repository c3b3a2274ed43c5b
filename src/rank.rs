//! Relevance scoring for fuzzy keyword search.
//!
//! Applied after normalization, only when fuzzy matching was requested
//! and the engine returned at least one row. Imposes a total order on
//! the result list and truncates it to the best N.

use crate::model::{MemoryRecord, now_ms};

/// Results kept when the caller does not ask for a specific top-N.
pub const DEFAULT_TOP_N: i64 = 10;

/// Sort records by descending relevance against the keyword phrase and
/// keep the best `top_n`. A `top_n` of zero or below disables truncation.
pub fn rank(records: Vec<MemoryRecord>, keyword: &str, top_n: i64) -> Vec<MemoryRecord> {
    let phrase = keyword.trim().to_lowercase();
    let terms: Vec<String> = phrase.split_whitespace().map(String::from).collect();
    let now = now_ms();

    let mut scored: Vec<(f64, MemoryRecord)> = records
        .into_iter()
        .map(|record| (score(&record, &phrase, &terms, now), record))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut ranked: Vec<MemoryRecord> = scored.into_iter().map(|(_, record)| record).collect();
    truncate(&mut ranked, top_n);
    ranked
}

/// Plain top-N truncation without rescoring, for non-fuzzy searches that
/// keep the engine's own ordering.
pub fn truncate(records: &mut Vec<MemoryRecord>, top_n: i64) {
    if top_n > 0 {
        records.truncate(top_n as usize);
    }
}

/// Match strength of one record.
///
/// Phrase hits (multi-term only): +10 in content, +15 in title.
/// Per term: +3 content / +5 title, with +1 / +2 when the term sits at a
/// word boundary. Coverage adds matched/total × 5 for content and × 7
/// for title. Recency adds max(0, 2 − ageDays/30) regardless of matches,
/// decaying to nothing past 60 days.
fn score(record: &MemoryRecord, phrase: &str, terms: &[String], now: i64) -> f64 {
    let content = record.content.to_lowercase();
    let title = record
        .fields
        .title
        .as_deref()
        .unwrap_or("")
        .to_lowercase();

    let mut score = 0.0;

    if terms.len() > 1 {
        if content.contains(phrase) {
            score += 10.0;
        }
        if title.contains(phrase) {
            score += 15.0;
        }
    }

    let mut content_hits = 0usize;
    let mut title_hits = 0usize;
    for term in terms {
        if content.contains(term.as_str()) {
            content_hits += 1;
            score += 3.0;
            if at_word_start(&content, term) {
                score += 1.0;
            }
        }
        if title.contains(term.as_str()) {
            title_hits += 1;
            score += 5.0;
            if at_word_start(&title, term) {
                score += 2.0;
            }
        }
    }

    if !terms.is_empty() {
        score += content_hits as f64 / terms.len() as f64 * 5.0;
        score += title_hits as f64 / terms.len() as f64 * 7.0;
    }

    let age_days = (now - record.created).max(0) as f64 / 86_400_000.0;
    score + (2.0 - age_days / 30.0).max(0.0)
}

/// Term starts the text or is preceded by a space.
fn at_word_start(text: &str, term: &str) -> bool {
    text.starts_with(term) || text.contains(&format!(" {term}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewRecord, RecordKind};

    fn record(title: &str, content: &str) -> MemoryRecord {
        MemoryRecord::create(NewRecord::new(RecordKind::Issue, content).title(title))
    }

    #[test]
    fn phrase_and_title_hits_outrank_term_hits() {
        let results = rank(
            vec![
                record("Other", "no mention"),
                record("Payment", "payment gateway payment"),
                record("Payment Timeout", "payments fail"),
            ],
            "payment timeout",
            DEFAULT_TOP_N,
        );

        assert_eq!(results[0].fields.title.as_deref(), Some("Payment Timeout"));
        assert_eq!(results[1].fields.title.as_deref(), Some("Payment"));
        assert_eq!(results[2].fields.title.as_deref(), Some("Other"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        let results = rank(
            vec![record("nothing", "x"), record("PAYMENT", "THE PAYMENT FAILED")],
            "payment",
            DEFAULT_TOP_N,
        );
        assert_eq!(results[0].fields.title.as_deref(), Some("PAYMENT"));
    }

    #[test]
    fn truncates_to_top_n() {
        let records: Vec<_> = (0..15).map(|i| record(&format!("t{i}"), "payment")).collect();
        assert_eq!(rank(records.clone(), "payment", 10).len(), 10);
        assert_eq!(rank(records.clone(), "payment", 3).len(), 3);
        // zero or negative disables truncation
        assert_eq!(rank(records.clone(), "payment", 0).len(), 15);
        assert_eq!(rank(records, "payment", -1).len(), 15);
    }

    #[test]
    fn newer_record_wins_a_tie() {
        let mut old = record("Payment", "payment failed");
        // 90 days old: recency bonus fully decayed
        old.created -= 90 * 86_400_000;
        let fresh = record("Payment", "payment failed");

        let results = rank(vec![old.clone(), fresh.clone()], "payment", DEFAULT_TOP_N);
        assert_eq!(results[0].id, fresh.id);
        assert_eq!(results[1].id, old.id);
    }

    #[test]
    fn plain_truncate_keeps_order() {
        let a = record("a", "");
        let b = record("b", "");
        let c = record("c", "");
        let mut records = vec![a.clone(), b.clone(), c];

        truncate(&mut records, 2);
        assert_eq!(records, vec![a, b]);
    }
}
