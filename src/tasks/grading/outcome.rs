use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::services::inference::InferenceError;

use super::store::GradingResult;

const MARKSCHEME_KEY_PREFIX: &str = "item-";
const POINTS_TOLERANCE: f64 = 1e-9;

/// Raw grading result as returned by the model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GradingOutcome {
    pub(crate) is_correct: bool,
    pub(crate) points: f64,
    #[serde(default)]
    pub(crate) markscheme_state: Vec<MarkschemeItem>,
    #[serde(default)]
    pub(crate) comments: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MarkschemeItem {
    pub(crate) id: ItemId,
    pub(crate) correct: bool,
}

/// The result schema asks for string ids; bare numbers are still accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ItemId {
    Text(String),
    Number(i64),
}

impl ItemId {
    fn key(&self) -> Option<String> {
        match self {
            Self::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| markscheme_key(trimmed))
            }
            Self::Number(number) => Some(markscheme_key(&number.to_string())),
        }
    }
}

pub(crate) fn markscheme_key(item_id: &str) -> String {
    format!("{MARKSCHEME_KEY_PREFIX}{item_id}")
}

impl GradingOutcome {
    /// Parses and checks a model result against the question's point value.
    pub(crate) fn from_value(value: Value, max_points: f64) -> Result<Self, InferenceError> {
        let outcome: Self = serde_json::from_value(value)
            .map_err(|err| InferenceError::Validation(format!("result shape mismatch: {err}")))?;

        if !outcome.points.is_finite() || outcome.points < 0.0 {
            return Err(InferenceError::Validation(format!(
                "points must be a non-negative number, got {}",
                outcome.points
            )));
        }

        if outcome.points > max_points + POINTS_TOLERANCE {
            return Err(InferenceError::Validation(format!(
                "points {} exceed the question maximum {max_points}",
                outcome.points
            )));
        }

        Ok(outcome)
    }

    pub(crate) fn into_result(self) -> Result<GradingResult, InferenceError> {
        let mut markscheme_state = BTreeMap::new();
        for item in self.markscheme_state {
            let key = item.id.key().ok_or_else(|| {
                InferenceError::Validation("markscheme item with empty id".to_string())
            })?;
            markscheme_state.insert(key, item.correct);
        }

        let comments = self
            .comments
            .into_iter()
            .map(|comment| comment.trim().to_string())
            .filter(|comment| !comment.is_empty())
            .collect();

        Ok(GradingResult { is_correct: self.is_correct, points: self.points, markscheme_state, comments })
    }
}
