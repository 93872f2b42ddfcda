//! Patron (reviewer) models.

use super::ranking::Ranking;
use super::rating::Rating;
use serde::{Deserialize, Serialize};

/// A reviewer as returned by `/patron/me` and the admin endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patron {
    pub telegram_id: String,

    /// Raw payload of the Telegram login widget.
    #[serde(default)]
    pub telegram_data: serde_json::Value,

    #[serde(default)]
    pub is_admin: bool,
}

impl Patron {
    /// Best human-readable name from the Telegram payload.
    pub fn display_name(&self) -> String {
        let field = |name: &str| {
            self.telegram_data
                .get(name)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
        };
        match (field("first_name"), field("last_name"), field("username")) {
            (Some(first), Some(last), _) => format!("{} {}", first, last),
            (Some(first), None, _) => first.to_string(),
            (None, _, Some(username)) => format!("@{}", username),
            _ => self.telegram_id.clone(),
        }
    }
}

/// Admin view of one patron with everything they rated and ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatronOverview {
    pub patron: Patron,
    pub ratings: Vec<Rating>,
    pub ranking: Ranking,
}

/// Body of `POST /admin/add-patron`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddPatronRequest {
    pub telegram_id: String,
    #[serde(default)]
    pub telegram_data: serde_json::Value,
    #[serde(default)]
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn patron(data: serde_json::Value) -> Patron {
        Patron {
            telegram_id: "42".to_string(),
            telegram_data: data,
            is_admin: false,
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(
            patron(json!({"first_name": "Ada", "last_name": "Lovelace"})).display_name(),
            "Ada Lovelace"
        );
        assert_eq!(patron(json!({"first_name": "Ada"})).display_name(), "Ada");
        assert_eq!(patron(json!({"username": "ada"})).display_name(), "@ada");
        assert_eq!(patron(json!({})).display_name(), "42");
    }

    #[test]
    fn test_deserialize_me_payload() {
        let p: Patron = serde_json::from_str(
            r#"{"telegram_id":"100","telegram_data":{"id":100},"is_admin":true}"#,
        )
        .unwrap();
        assert!(p.is_admin);
        assert_eq!(p.telegram_data["id"], json!(100));
    }
}
