use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Per-request tally of a batch write where every row commits on its own
///
/// Failures never abort the batch; they are counted and described. The
/// message list is bounded when the outcome is turned into a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    successful: usize,
    failed: usize,
    errors: Vec<String>,
}

/// The response body of a batch endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// A batch item that could not be read as a row at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRow {
    /// 1-based position in the submitted list
    pub position: usize,
    pub reason: String,
}

impl Display for MalformedRow {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Row {}: {}", self.position, self.reason)
    }
}

pub type BatchRow<T> = Result<T, MalformedRow>;

/// Reads each submitted item on its own so one bad item cannot sink the batch
pub fn parse_rows<T: DeserializeOwned>(items: Vec<Value>) -> Vec<BatchRow<T>> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| MalformedRow {
                position: index + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}

impl BatchOutcome {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(&mut self) {
        self.successful += 1;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.failed += 1;
        self.errors.push(message.into());
    }

    pub fn successful(&self) -> usize {
        self.successful
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Finishes the batch, keeping at most `max_errors` messages
    pub fn into_report(mut self, max_errors: usize) -> BatchReport {
        self.errors.truncate(max_errors);

        BatchReport {
            successful: self.successful,
            failed: self.failed,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_every_row() {
        let mut outcome = BatchOutcome::new();
        outcome.succeed();
        outcome.fail("first");
        outcome.succeed();

        assert_eq!(outcome.successful(), 2);
        assert_eq!(outcome.failed(), 1);

        let report = outcome.into_report(10);
        assert_eq!(report.errors, vec!["first".to_string()]);
    }

    #[test]
    fn test_report_truncates_messages_but_not_counts() {
        let mut outcome = BatchOutcome::new();
        for i in 0..25 {
            outcome.fail(format!("row {i}"));
        }

        let report = outcome.into_report(20);
        assert_eq!(report.failed, 25);
        assert_eq!(report.errors.len(), 20);
        assert_eq!(report.errors[0], "row 0");
        assert_eq!(report.errors[19], "row 19");
    }

    #[derive(Debug, serde::Deserialize)]
    struct Pair {
        id: i32,
        #[allow(dead_code)]
        label: String,
    }

    #[test]
    fn test_parse_rows_isolates_bad_items() {
        let rows = parse_rows::<Pair>(vec![
            serde_json::json!({ "id": 1, "label": "a" }),
            serde_json::json!({ "id": null, "label": "b" }),
            serde_json::json!("not an object"),
            serde_json::json!({ "id": 4, "label": "d" }),
        ]);

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].as_ref().map(|p| p.id), Ok(1));
        assert_eq!(rows[3].as_ref().map(|p| p.id), Ok(4));

        let bad = rows[1].as_ref().unwrap_err();
        assert_eq!(bad.position, 2);
        assert!(bad.to_string().starts_with("Row 2: invalid type: null"), "{bad}");
        assert_eq!(rows[2].as_ref().unwrap_err().position, 3);
    }

    #[test]
    fn test_report_serializes_flat() {
        let mut outcome = BatchOutcome::new();
        outcome.succeed();

        let json = serde_json::to_value(outcome.into_report(10)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "successful": 1, "failed": 0, "errors": [] })
        );
    }
}
