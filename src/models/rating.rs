//! Rating model: one patron's judgment of one application.

use super::application::ApplicationId;
use super::document::Docs;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Reviewer sentiment towards an application.
///
/// The string form is canonical. Older API revisions sent `1 / 0 / -1`;
/// those are still accepted on decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    #[default]
    Unrated,
}

impl Sentiment {
    /// Value used in the `rate` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
            Self::Unrated => "unrated",
        }
    }

    /// Negative and unrated applications may never appear in a ranking.
    pub fn excludes_from_ranking(self) -> bool {
        matches!(self, Self::Negative | Self::Unrated)
    }

    /// Positive and neutral applications feed the available pool.
    pub fn is_rankable(self) -> bool {
        !self.excludes_from_ranking()
    }

    fn from_legacy(value: i64) -> Option<Self> {
        match value {
            1 => Some(Self::Positive),
            0 => Some(Self::Neutral),
            -1 => Some(Self::Negative),
            _ => None,
        }
    }
}

impl std::str::FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "negative" => Ok(Self::Negative),
            "neutral" => Ok(Self::Neutral),
            "unrated" => Ok(Self::Unrated),
            other => Err(format!("unknown sentiment: {}", other)),
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawSentiment {
    Text(String),
    Number(i64),
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawSentiment::deserialize(deserializer)? {
            RawSentiment::Text(s) => s.parse().map_err(D::Error::custom),
            RawSentiment::Number(n) => Sentiment::from_legacy(n)
                .ok_or_else(|| D::Error::custom(format!("unknown numeric rating: {}", n))),
        }
    }
}

/// A patron's rating of an application as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub patron_id: i64,
    pub application_id: ApplicationId,

    /// Comment on the whole application.
    #[serde(default)]
    pub comment: String,

    /// Per-document notes.
    #[serde(default)]
    pub docs: Docs,

    #[serde(default)]
    pub rate: Sentiment,
}

impl Rating {
    /// Fresh, unrated rating for an application the patron has not touched yet.
    pub fn unrated(patron_id: i64, application_id: ApplicationId) -> Self {
        Self {
            patron_id,
            application_id,
            comment: String::new(),
            docs: Docs::default(),
            rate: Sentiment::Unrated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_sentiments() {
        let rating: Rating = serde_json::from_str(
            r#"{"patron_id":1,"application_id":2,"comment":"ok","docs":{},"rate":"neutral"}"#,
        )
        .unwrap();
        assert_eq!(rating.rate, Sentiment::Neutral);
        assert_eq!(
            serde_json::to_value(&rating).unwrap()["rate"],
            serde_json::json!("neutral")
        );
    }

    #[test]
    fn test_legacy_numeric_sentiments() {
        let parse = |v: &str| serde_json::from_str::<Sentiment>(v).unwrap();
        assert_eq!(parse("1"), Sentiment::Positive);
        assert_eq!(parse("0"), Sentiment::Neutral);
        assert_eq!(parse("-1"), Sentiment::Negative);
        assert!(serde_json::from_str::<Sentiment>("2").is_err());
        assert!(serde_json::from_str::<Sentiment>("\"great\"").is_err());
    }

    #[test]
    fn test_missing_fields_default() {
        let rating: Rating = serde_json::from_str(r#"{"patron_id":1,"application_id":2}"#).unwrap();
        assert_eq!(rating, Rating::unrated(1, 2));
    }

    #[test]
    fn test_ranking_exclusion() {
        assert!(Sentiment::Negative.excludes_from_ranking());
        assert!(Sentiment::Unrated.excludes_from_ranking());
        assert!(Sentiment::Positive.is_rankable());
        assert!(Sentiment::Neutral.is_rankable());
    }
}
