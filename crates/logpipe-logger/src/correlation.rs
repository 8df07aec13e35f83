use std::fmt;

use serde::{Deserialize, Serialize};

/// Correlation elements attached to every log line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Correlation {
    pub shard: String,
    pub epoch: u32,
    pub round: i64,
    pub sub_round: String,
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}/{}/{}]",
            self.shard, self.epoch, self.round, self.sub_round
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_bracketed_path() {
        let correlation = Correlation {
            shard: "meta".to_string(),
            epoch: 3,
            round: 42,
            sub_round: "block".to_string(),
        };
        assert_eq!(correlation.to_string(), "[meta/3/42/block]");
    }

    #[test]
    fn uses_pascal_case_wire_names() {
        let correlation = Correlation {
            shard: "0".to_string(),
            epoch: 1,
            round: 2,
            sub_round: "s".to_string(),
        };
        let json = serde_json::to_value(&correlation).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"Shard": "0", "Epoch": 1, "Round": 2, "SubRound": "s"})
        );
    }

    #[test]
    fn missing_fields_default() {
        let correlation: Correlation = serde_json::from_str(r#"{"Round": 7}"#).unwrap();
        assert_eq!(correlation.round, 7);
        assert!(correlation.shard.is_empty());
    }
}
