use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Round label stored for the single row written at report completion.
pub const FINAL_ROUND: &str = "Final";

/// One row of `interview_results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub candidate_name: String,
    pub round: String,
    pub score: f64,
    pub passed: bool,
    pub timestamp: DateTime<Utc>,
}

impl ResultRecord {
    pub fn final_round(candidate_name: &str, score: f64, passed: bool) -> Self {
        Self {
            candidate_name: candidate_name.to_string(),
            round: FINAL_ROUND.to_string(),
            score,
            passed,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_serializes_as_iso_8601() {
        let record = ResultRecord::final_round("Ada", 82.0, true);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["round"], "Final");
        assert_eq!(value["candidateName"], "Ada");

        let raw = value["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(raw).is_ok());
    }
}
