use crate::catalog::ConceptCatalog;
use crate::frame::{normalize_label, TabularFrame};
use serde::{Deserialize, Serialize};

/// Expense-like concepts that filings frequently store as negative amounts.
/// Resolution flips them positive so downstream formulas subtract them.
const NEGATIVE_EXPENSE_KEYS: [&str; 5] = [
    "cost_of_revenue",
    "operating_expenses",
    "rnd_expenses",
    "interest_expense",
    "depreciation_amortization",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchKind {
    Exact,
    Partial,
}

/// A resolved scalar plus where it came from. The provenance fields exist
/// for diagnostics only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedValue {
    pub value: f64,
    pub row_label: String,
    pub match_kind: MatchKind,
}

/// The winning row of a concept match, before any value extraction.
#[derive(Debug, Clone)]
pub struct RowMatch {
    pub row_index: usize,
    pub row_label: String,
    pub match_kind: MatchKind,
}

/// How a numeric is read from the winning row.
#[derive(Debug, Clone, Copy)]
pub enum ExtractionPolicy<'a> {
    /// Scan the column order right-to-left, return the first non-missing
    /// numeric. Suits single-filing frames carrying several context columns.
    LastNonMissing,
    /// Read one named column directly. Suits multi-period frames where each
    /// column is one fiscal period.
    ExactColumn(&'a str),
}

/// Resolves a canonical concept against a frame's row labels using the
/// catalog's synonym lists. Exact matches (in synonym preference order) win
/// outright; otherwise substring matches compete on summed magnitude.
#[derive(Debug, Clone, Copy)]
pub struct ConceptResolver<'a> {
    catalog: &'a ConceptCatalog,
}

impl<'a> ConceptResolver<'a> {
    pub fn new(catalog: &'a ConceptCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'a ConceptCatalog {
        self.catalog
    }

    /// Find the best-matching row for `concept_key` and extract a value from
    /// it. Returns `None` when nothing matches, when the input is empty, or
    /// when the winning row has no extractable numeric; it never panics.
    pub fn resolve(
        &self,
        frame: &TabularFrame,
        concept_key: &str,
        column_order: &[String],
        policy: ExtractionPolicy<'_>,
    ) -> Option<ResolvedValue> {
        let matched = self.best_row(frame, concept_key, column_order)?;
        let value = self.extract(frame, matched.row_index, column_order, policy)?;
        log::debug!(
            "resolve({}): {:?} row='{}' value={:.2}",
            concept_key,
            matched.match_kind,
            matched.row_label,
            value
        );
        Some(ResolvedValue {
            value,
            row_label: matched.row_label,
            match_kind: matched.match_kind,
        })
    }

    /// Row selection without extraction, for callers that read several
    /// columns out of the winning row.
    pub fn best_row(
        &self,
        frame: &TabularFrame,
        concept_key: &str,
        column_order: &[String],
    ) -> Option<RowMatch> {
        if frame.is_empty() {
            log::debug!("best_row({}): empty frame", concept_key);
            return None;
        }
        let synonyms = self.catalog.synonyms(concept_key);
        if synonyms.is_empty() {
            log::debug!("best_row({}): no synonyms in catalog", concept_key);
            return None;
        }

        // Exact phase: synonym order is the tie-break, not row position.
        for synonym in synonyms {
            let wanted = normalize_label(synonym);
            if wanted.is_empty() {
                continue;
            }
            if let Some((row_idx, row)) = frame
                .rows()
                .iter()
                .enumerate()
                .find(|(_, r)| r.normalized_label == wanted)
            {
                return Some(RowMatch {
                    row_index: row_idx,
                    row_label: row.label.clone(),
                    match_kind: MatchKind::Exact,
                });
            }
        }

        // Partial phase: substring matches ranked by summed magnitude over
        // the caller's column order. Zero-sum rows are never eligible.
        let mut best: Option<(usize, f64)> = None;
        for synonym in synonyms {
            let wanted = normalize_label(synonym);
            if wanted.is_empty() {
                continue;
            }
            for (row_idx, row) in frame.rows().iter().enumerate() {
                if !row.normalized_label.contains(wanted.as_str()) {
                    continue;
                }
                let score = self.row_score(frame, row_idx, column_order);
                if score == 0.0 {
                    continue;
                }
                match best {
                    Some((_, best_score)) if score <= best_score => {}
                    _ => best = Some((row_idx, score)),
                }
            }
        }

        if let Some((row_idx, score)) = best {
            let row = &frame.rows()[row_idx];
            log::debug!(
                "best_row({}): PARTIAL row='{}' score={:.2}",
                concept_key,
                row.label,
                score
            );
            return Some(RowMatch {
                row_index: row_idx,
                row_label: row.label.clone(),
                match_kind: MatchKind::Partial,
            });
        }

        log::debug!("best_row({}): no synonyms matched", concept_key);
        None
    }

    /// Like `resolve`, with the caller's neutral default applied.
    pub fn resolve_value(
        &self,
        frame: &TabularFrame,
        concept_key: &str,
        column_order: &[String],
        policy: ExtractionPolicy<'_>,
        fallback: f64,
    ) -> f64 {
        self.resolve(frame, concept_key, column_order, policy)
            .map(|r| r.value)
            .unwrap_or(fallback)
    }

    fn extract(
        &self,
        frame: &TabularFrame,
        row_idx: usize,
        column_order: &[String],
        policy: ExtractionPolicy<'_>,
    ) -> Option<f64> {
        match policy {
            ExtractionPolicy::LastNonMissing => column_order
                .iter()
                .rev()
                .find_map(|col| frame.value_at(row_idx, col)),
            ExtractionPolicy::ExactColumn(col) => frame.value_at(row_idx, col),
        }
    }

    fn row_score(&self, frame: &TabularFrame, row_idx: usize, column_order: &[String]) -> f64 {
        column_order
            .iter()
            .filter_map(|col| frame.value_at(row_idx, col))
            .map(f64::abs)
            .sum()
    }
}

/// Flip a known expense-like concept positive when it was reported negative.
/// Other concepts pass through regardless of sign.
pub fn flip_sign_if_negative_expense(value: f64, concept_key: &str) -> f64 {
    if NEGATIVE_EXPENSE_KEYS.contains(&concept_key) && value < 0.0 {
        log::debug!(
            "flip_sign_if_negative_expense: {} -> {} for {}",
            value,
            value.abs(),
            concept_key
        );
        return value.abs();
    }
    value
}
