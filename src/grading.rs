// src/grading.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::quiz::Question;

/// Per-question correctness breakdown, stored verbatim with the
/// submission as an immutable snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetail {
    pub question: String,
    pub correct: String,
    pub user_answer: String,
    pub is_correct: bool,
}

/// Outcome of grading one submission against one quiz.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    pub score: i64,
    pub total: i64,
    pub correct_answers: Vec<AnswerDetail>,
}

/// Trim + lowercase. Two answers match iff their normalized forms are
/// identical; no partial credit, no fuzzy matching.
fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}

/// Grades a submission against a quiz's question list.
///
/// * Questions are walked in stored order; `total` is the question
///   count, not the number of answers submitted.
/// * A missing answer is treated as the empty string, never an error.
/// * Pure function of its inputs: no I/O, no hidden state.
pub fn grade(questions: &[Question], answers: &HashMap<i64, String>) -> GradeResult {
    let mut score = 0;
    let mut correct_answers = Vec::with_capacity(questions.len());

    for question in questions {
        let user_answer = answers.get(&question.id).map(String::as_str).unwrap_or("");
        let is_correct = normalize(user_answer) == normalize(&question.answer);

        if is_correct {
            score += 1;
        }

        correct_answers.push(AnswerDetail {
            question: question.content.clone(),
            correct: question.answer.clone(),
            user_answer: user_answer.to_string(),
            is_correct,
        });
    }

    GradeResult {
        score,
        total: questions.len() as i64,
        correct_answers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn question(id: i64, content: &str, answer: &str) -> Question {
        Question {
            id,
            quiz_id: 1,
            question_type: "short".to_string(),
            content: content.to_string(),
            options: Json(vec![]),
            answer: answer.to_string(),
            position: id,
        }
    }

    fn answers(entries: &[(i64, &str)]) -> HashMap<i64, String> {
        entries
            .iter()
            .map(|(id, a)| (*id, a.to_string()))
            .collect()
    }

    #[test]
    fn scores_exact_matches_only() {
        let questions = vec![
            question(1, "Capital of France?", "Paris"),
            question(2, "Answer to everything?", "42"),
        ];

        let result = grade(&questions, &answers(&[(1, "paris"), (2, "7")]));

        assert_eq!(result.score, 1);
        assert_eq!(result.total, 2);
        assert!(result.correct_answers[0].is_correct);
        assert!(!result.correct_answers[1].is_correct);
    }

    #[test]
    fn matching_ignores_case_and_surrounding_whitespace() {
        let questions = vec![question(1, "Capital of France?", "Paris")];

        let padded = grade(&questions, &answers(&[(1, "  PARIS ")]));
        let plain = grade(&questions, &answers(&[(1, "paris")]));

        assert!(padded.correct_answers[0].is_correct);
        assert_eq!(padded.score, plain.score);
    }

    #[test]
    fn missing_answers_count_as_wrong_not_errors() {
        let questions = vec![
            question(1, "Q1", "a"),
            question(2, "Q2", "b"),
            question(3, "Q3", "c"),
        ];

        let result = grade(&questions, &answers(&[(2, "b")]));

        assert_eq!(result.score, 1);
        assert_eq!(result.total, 3);
        assert_eq!(result.correct_answers[0].user_answer, "");
        assert!(!result.correct_answers[0].is_correct);
    }

    #[test]
    fn total_tracks_question_count_not_submitted_answers() {
        let questions = vec![question(1, "Q1", "a")];

        let result = grade(&questions, &answers(&[(1, "a"), (99, "ghost")]));

        assert_eq!(result.total, 1);
        assert_eq!(result.score, 1);
        assert_eq!(result.correct_answers.len(), 1);
    }

    #[test]
    fn grading_is_idempotent() {
        let questions = vec![
            question(1, "Q1", "Paris"),
            question(2, "Q2", "42"),
        ];
        let submitted = answers(&[(1, " paris"), (2, "41")]);

        let first = grade(&questions, &submitted);
        let second = grade(&questions, &submitted);

        assert_eq!(first, second);
    }

    #[test]
    fn empty_quiz_grades_to_zero_of_zero() {
        let result = grade(&[], &answers(&[(1, "anything")]));

        assert_eq!(result.score, 0);
        assert_eq!(result.total, 0);
        assert!(result.correct_answers.is_empty());
    }
}
