use serde::{Deserialize, Serialize};

use crate::domain::ActivityId;

pub const LOGIN_PATH: &str = "login";
pub const REGISTER_PATIENT_PATH: &str = "register_patient";
pub const SEARCH_PATIENT_PATH: &str = "search_patient";
pub const UPDATE_PATIENT_PATH: &str = "update_patient";
pub const RECENT_ACTIVITY_PATH: &str = "recent_activity";

pub const DEFAULT_ACTIVITY_LIMIT: u32 = 20;

/// Success body for login, create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Query string for `GET /recent_activity`. Entries come back newest first;
/// `before` pages backwards from an entry id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityQuery {
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<ActivityId>,
}

impl Default for ActivityQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_ACTIVITY_LIMIT,
            before: None,
        }
    }
}

impl ActivityQuery {
    pub fn latest(limit: u32) -> Self {
        Self {
            limit,
            before: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_query_omits_absent_cursor() {
        let value = serde_json::to_value(ActivityQuery::latest(5)).expect("serialize");
        assert_eq!(value, serde_json::json!({ "limit": 5 }));

        let paged = ActivityQuery {
            limit: 5,
            before: Some(ActivityId(40)),
        };
        let value = serde_json::to_value(paged).expect("serialize");
        assert_eq!(value, serde_json::json!({ "limit": 5, "before": 40 }));
    }
}
