use serde::{Deserialize, Serialize};

/// Aggregated outcome of one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Per-iteration and strategy errors, in the order they were recorded.
    pub errors: Vec<String>,
    /// Final value of the insert counter.
    pub insert_count: u64,
    /// Final value of the row counter.
    pub executed_item_count: u64,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_for_run_summaries() {
        let result = ExecutionResult {
            errors: vec!["worker 1 panicked: boom".to_string()],
            insert_count: 12,
            executed_item_count: 6,
        };

        let json = serde_json::to_value(&result).expect("serialize result");
        assert_eq!(json["executed_item_count"], 6);
        assert!(!result.is_success());

        let back: ExecutionResult = serde_json::from_value(json).expect("deserialize result");
        assert_eq!(back, result);
    }
}
