use std::fmt::Write as _;

use serde_json::{json, Value};

use crate::db::models::{Comment, CommentAuthor};
use crate::services::inference::CompletionRequest;

use super::store::GradingContext;

const GRADING_SYSTEM_PROMPT: &str = "You are an experienced teacher grading a student's \
answer to a single worksheet question.

Grade strictly against the reference answer and the mark scheme when one is provided. \
Award partial credit only where the mark scheme allows it and never exceed the maximum \
points. For every mark scheme item, report whether the student's answer satisfies it, \
using the item's id exactly as given. Write short, specific comments addressed to the \
student that justify the grade; do not repeat the question.

Respond with JSON matching the provided schema and nothing else.";

pub(super) const RESULT_SCHEMA_NAME: &str = "worksheet_answer_grade";

pub(super) fn result_schema() -> Value {
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["isCorrect", "points", "markschemeState", "comments"],
        "properties": {
            "isCorrect": {"type": "boolean"},
            "points": {"type": "number"},
            "markschemeState": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["id", "correct"],
                    "properties": {
                        "id": {"type": "string"},
                        "correct": {"type": "boolean"}
                    }
                }
            },
            "comments": {"type": "array", "items": {"type": "string"}}
        }
    })
}

pub(super) fn build_request(context: &GradingContext) -> CompletionRequest {
    CompletionRequest {
        system_prompt: GRADING_SYSTEM_PROMPT.to_string(),
        prompt: build_user_prompt(context),
        schema_name: RESULT_SCHEMA_NAME,
        schema: result_schema(),
        correlation_id: context.progress.id.clone(),
    }
}

fn build_user_prompt(context: &GradingContext) -> String {
    let question = &context.question;
    let mut prompt = String::new();

    let _ = writeln!(prompt, "Question ({:?}):\n{}\n", question.question_type, question.question);
    let _ = writeln!(prompt, "Maximum points: {}\n", question.points);

    if !question.answer.trim().is_empty() {
        let _ = writeln!(prompt, "Reference answer:\n{}\n", question.answer);
    }

    match question.mark_scheme.as_ref().map(|scheme| &scheme.0) {
        Some(scheme) if !scheme.is_null() => {
            let rendered = serde_json::to_string_pretty(scheme).unwrap_or_default();
            let _ = writeln!(prompt, "Mark scheme:\n{rendered}\n");
        }
        _ => prompt.push_str("Mark scheme: none provided; return an empty markschemeState.\n\n"),
    }

    if !context.comments.is_empty() {
        prompt.push_str("Existing comments on this answer:\n");
        for comment in &context.comments {
            let _ = writeln!(prompt, "- [{}] {}", author_label(comment), comment.content);
        }
        prompt.push('\n');
    }

    let _ = write!(prompt, "Student answer:\n{}", context.progress.student_answer);
    prompt
}

fn author_label(comment: &Comment) -> &'static str {
    match comment.author {
        CommentAuthor::Ai => "grader",
        CommentAuthor::User(_) => "teacher",
    }
}
