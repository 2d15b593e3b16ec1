//! Column label normalization
//!
//! Raw CKAN column labels arrive with arbitrary casing, whitespace, and
//! symbols. Normalization rewrites each label into a canonical token:
//! trim, collapse every whitespace run to one underscore, drop every
//! character outside `[0-9A-Za-z_]`, lowercase. The rewrite is
//! deterministic and idempotent, and is applied exactly once, before the
//! Record Set is stored.

use std::collections::HashSet;

/// Normalize one raw column label
pub fn normalize_label(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut pending_separator = false;

    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            pending_separator = true;
            continue;
        }
        if pending_separator {
            out.push('_');
            pending_separator = false;
        }
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch.to_ascii_lowercase());
        }
    }

    out
}

/// Normalize a full set of labels, keeping them unique
///
/// Two distinct raw labels can collapse to the same token (`"Total $"` and
/// `"total"` both become `total`). Labels must stay unique within a Record
/// Set, so later collisions get a numeric suffix.
pub fn normalize_labels(raw_labels: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw_labels.len());

    for raw in raw_labels {
        let base = normalize_label(raw);
        let mut candidate = base.clone();
        let mut n = 2;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        out.push(candidate);
    }

    out
}
