use crate::db::models::WorksheetQuestion;
use crate::db::types::QuestionType;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ObjectiveGrade {
    pub(crate) is_correct: bool,
    pub(crate) points: f64,
}

/// Scores closed-form answers. Returns `None` for question types that go
/// through the grading pipeline instead.
pub(crate) fn grade(question: &WorksheetQuestion, raw_answer: &str) -> Option<ObjectiveGrade> {
    let submitted = raw_answer.trim();

    let is_correct = match question.question_type {
        QuestionType::MultipleChoice => question
            .options
            .0
            .iter()
            .find(|option| option.is_correct)
            .is_some_and(|option| option.id == submitted),
        QuestionType::TrueFalse => !submitted.is_empty() && submitted == question.answer.trim(),
        _ => return None,
    };

    let points = if is_correct { question.points } else { 0.0 };
    Some(ObjectiveGrade { is_correct, points })
}
