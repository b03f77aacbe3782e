use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questiontype", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    LongAnswer,
    MathExpression,
    Essay,
}

impl QuestionType {
    /// Closed-form types are scored inline and never enter the grading pipeline.
    pub(crate) fn is_auto_markable(self) -> bool {
        matches!(self, Self::MultipleChoice | Self::TrueFalse)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "gradingstatus", rename_all = "lowercase")]
pub(crate) enum GradingStatus {
    Unset,
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl GradingStatus {
    /// States a bulk dispatch may move to `Pending`.
    pub(crate) const DISPATCHABLE: [GradingStatus; 2] = [Self::Unset, Self::Failed];

    pub(crate) fn is_dispatchable(self) -> bool {
        Self::DISPATCHABLE.contains(&self)
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "commentauthorkind", rename_all = "lowercase")]
pub(crate) enum CommentAuthorKind {
    User,
    Ai,
}
