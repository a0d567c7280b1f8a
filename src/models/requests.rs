use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{Category, Comparison, Outcome};

/// One comparison as sent by the client; the reviewed place is implied by
/// the enclosing request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ComparisonInput {
    #[validate(length(min = 1))]
    #[serde(alias = "opponent_place_id", rename = "opponentPlaceId")]
    pub opponent_place_id: String,
    pub outcome: Outcome,
}

/// Request to place a reviewed place into the user's ranking
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResolveRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "place_id", rename = "placeId")]
    pub place_id: String,
    pub category: Category,
    #[validate(length(max = 64), nested)]
    #[serde(default)]
    pub comparisons: Vec<ComparisonInput>,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub note: Option<String>,
}

impl ResolveRequest {
    /// Expand the client's opponent list into full comparisons
    pub fn to_comparisons(&self) -> Vec<Comparison> {
        self.comparisons
            .iter()
            .map(|c| Comparison::new(self.place_id.clone(), c.opponent_place_id.clone(), c.outcome))
            .collect()
    }
}

/// Query for the next opponent a client should ask about
///
/// `history` carries the comparisons answered so far as
/// `opponentId:outcome` pairs separated by commas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextOpponentQuery {
    #[serde(alias = "place_id", rename = "placeId")]
    pub place_id: String,
    pub category: Category,
    #[serde(default)]
    pub history: Option<String>,
}

impl NextOpponentQuery {
    pub fn parse_history(&self) -> Result<Vec<Comparison>, String> {
        let Some(history) = self.history.as_deref() else {
            return Ok(vec![]);
        };

        history
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| -> Result<Comparison, String> {
                let (opponent, outcome) = entry
                    .rsplit_once(':')
                    .ok_or_else(|| format!("history entry '{}' is not opponent:outcome", entry))?;
                Ok(Comparison::new(self.place_id.clone(), opponent, outcome.parse::<Outcome>()?))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_request_accepts_both_casings() {
        let camel: ResolveRequest = serde_json::from_str(
            r#"{"userId":"u1","placeId":"p4","category":"liked","comparisons":[{"opponentPlaceId":"p2","outcome":"win"}]}"#,
        )
        .unwrap();
        let snake: ResolveRequest = serde_json::from_str(
            r#"{"user_id":"u1","place_id":"p4","category":"liked","comparisons":[{"opponent_place_id":"p2","outcome":"win"}]}"#,
        )
        .unwrap();

        assert_eq!(camel.to_comparisons(), snake.to_comparisons());
        assert_eq!(camel.to_comparisons()[0], Comparison::new("p4", "p2", Outcome::Win));
        assert!(camel.note.is_none());
    }

    #[test]
    fn test_resolve_request_validation() {
        let request = ResolveRequest {
            user_id: String::new(),
            place_id: "p1".to_string(),
            category: Category::Neutral,
            comparisons: vec![],
            note: Some("x".repeat(2001)),
        };

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("user_id"));
        assert!(fields.contains_key("note"));
    }

    #[test]
    fn test_parse_history() {
        let query = NextOpponentQuery {
            place_id: "p4".to_string(),
            category: Category::Liked,
            history: Some("p2:win, p3:loss".to_string()),
        };

        let parsed = query.parse_history().unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], Comparison::new("p4", "p3", Outcome::Loss));

        let bad = NextOpponentQuery { history: Some("p2-win".to_string()), ..query };
        assert!(bad.parse_history().is_err());
    }
}
