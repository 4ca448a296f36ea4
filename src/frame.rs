use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

/// Canonical label normalization: Unicode NFKC, lowercase, trim. Applied to
/// row labels once at insertion and to synonyms at match time, so comparisons
/// are insensitive to case and odd whitespace forms in filings.
pub fn normalize_label(label: &str) -> String {
    label.nfkc().collect::<String>().trim().to_lowercase()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameRow {
    pub label: String,
    /// Cached `normalize_label(label)`, computed at insertion. Serialized
    /// with the row so deserialized frames keep a consistent cache.
    pub normalized_label: String,
    pub cells: Vec<Option<f64>>,
}

/// One financial statement as a row-labeled, period-column-labeled numeric
/// grid. Row labels are not guaranteed unique; encounter order is preserved
/// because it is the tie-break for partial concept matches. The core never
/// mutates a frame after construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabularFrame {
    columns: Vec<String>,
    rows: Vec<FrameRow>,
}

impl TabularFrame {
    pub fn new<S: Into<String>>(columns: Vec<S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Cells are padded with `None` or truncated to the column
    /// count so every row has the same width. Non-finite values count as
    /// missing.
    pub fn push_row<S: Into<String>>(&mut self, label: S, mut cells: Vec<Option<f64>>) {
        let label = label.into();
        for cell in &mut cells {
            if cell.is_some_and(|v| !v.is_finite()) {
                *cell = None;
            }
        }
        cells.resize(self.columns.len(), None);
        self.rows.push(FrameRow {
            normalized_label: normalize_label(&label),
            label,
            cells,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[FrameRow] {
        &self.rows
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell value for a row index and column label; `None` when the column
    /// is unknown or the cell is missing.
    pub fn value_at(&self, row: usize, column: &str) -> Option<f64> {
        let col_idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.cells.get(col_idx).copied().flatten())
    }
}

/// Shapes a filing-data provider may hand over. Resolved to a canonical
/// `TabularFrame` exactly once at the ingestion boundary; the analysis
/// operations only ever accept `TabularFrame`.
#[derive(Debug, Clone)]
pub enum FrameInput {
    Frame(TabularFrame),
    Records {
        columns: Vec<String>,
        rows: Vec<(String, Vec<Value>)>,
    },
    Missing,
}

impl FrameInput {
    /// Convert to a canonical frame, coercing raw cells to numbers. Anything
    /// unrecognized degrades to an empty frame rather than an error, so one
    /// bad statement never aborts a batch run.
    pub fn into_frame(self, debug_label: &str) -> TabularFrame {
        match self {
            FrameInput::Frame(frame) => {
                log::debug!(
                    "into_frame({}): already canonical, {} rows x {} cols",
                    debug_label,
                    frame.rows().len(),
                    frame.columns().len()
                );
                frame
            }
            FrameInput::Records { columns, rows } => {
                let mut frame = TabularFrame::new(columns);
                for (label, raw_cells) in rows {
                    let cells = raw_cells.iter().map(coerce_numeric).collect();
                    frame.push_row(label, cells);
                }
                log::debug!(
                    "into_frame({}): coerced records, {} rows x {} cols",
                    debug_label,
                    frame.rows().len(),
                    frame.columns().len()
                );
                frame
            }
            FrameInput::Missing => {
                log::debug!("into_frame({}): missing input -> empty frame", debug_label);
                TabularFrame::default()
            }
        }
    }
}

/// Numeric coercion for raw provider cells. Numeric strings count; NaN and
/// non-numeric values are treated as missing.
fn coerce_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_label() {
        assert_eq!(normalize_label("  Total Revenue  "), "total revenue");
        // NFKC folds the non-breaking space before lowercasing
        assert_eq!(normalize_label("Net\u{00a0}sales"), "net sales");
    }

    #[test]
    fn test_push_row_pads_and_truncates() {
        let mut frame = TabularFrame::new(vec!["2022", "2023"]);
        frame.push_row("Revenue", vec![Some(1.0)]);
        frame.push_row("Net Income", vec![Some(1.0), Some(2.0), Some(3.0)]);

        assert_eq!(frame.rows()[0].cells, vec![Some(1.0), None]);
        assert_eq!(frame.rows()[1].cells, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn test_push_row_drops_non_finite_cells() {
        let mut frame = TabularFrame::new(vec!["2022", "2023"]);
        frame.push_row("Revenue", vec![Some(f64::NAN), Some(f64::INFINITY)]);

        assert_eq!(frame.rows()[0].cells, vec![None, None]);
    }

    #[test]
    fn test_value_at() {
        let mut frame = TabularFrame::new(vec!["2022", "2023"]);
        frame.push_row("Revenue", vec![Some(10.0), None]);

        assert_eq!(frame.value_at(0, "2022"), Some(10.0));
        assert_eq!(frame.value_at(0, "2023"), None);
        assert_eq!(frame.value_at(0, "2024"), None);
        assert_eq!(frame.value_at(9, "2022"), None);
    }

    #[test]
    fn test_records_input_coercion() {
        let input = FrameInput::Records {
            columns: vec!["2022".to_string(), "2023".to_string()],
            rows: vec![
                ("Revenue".to_string(), vec![json!(100.0), json!("1,250.5")]),
                ("Notes".to_string(), vec![json!("see item 7"), json!(null)]),
            ],
        };

        let frame = input.into_frame("test");
        assert_eq!(frame.value_at(0, "2022"), Some(100.0));
        assert_eq!(frame.value_at(0, "2023"), Some(1250.5));
        assert_eq!(frame.value_at(1, "2022"), None);
    }

    #[test]
    fn test_missing_input_is_empty_frame() {
        let frame = FrameInput::Missing.into_frame("test");
        assert!(frame.is_empty());
    }
}
