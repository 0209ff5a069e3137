use serde::Serialize;

/// Outcome of one field's fill attempt. All failure modes are local: they
/// surface here as data, never as errors that abort sibling fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillResult {
    Filled,
    /// Nothing to write: empty answer for a selection type, or no answer at
    /// all for the field.
    Skipped,
    Failed(String),
}

impl FillResult {
    pub fn is_filled(&self) -> bool {
        matches!(self, FillResult::Filled)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub id: String,
    pub label: String,
    pub reason: String,
}

/// Aggregated outcome of a batch fill. Always produced, even when every
/// single field failed.
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    pub filled_count: usize,
    pub skipped_count: usize,
    pub error_count: usize,
    pub per_field_errors: Vec<FieldError>,
}

impl FillReport {
    pub fn record(&mut self, id: &str, label: &str, result: &FillResult) {
        match result {
            FillResult::Filled => self.filled_count += 1,
            FillResult::Skipped => self.skipped_count += 1,
            FillResult::Failed(reason) => {
                self.error_count += 1;
                self.per_field_errors.push(FieldError {
                    id: id.to_string(),
                    label: label.to_string(),
                    reason: reason.clone(),
                });
            }
        }
    }

    pub fn all_ok(&self) -> bool {
        self.error_count == 0
    }
}
