use std::collections::{HashMap, HashSet};

use crate::db::models::Question;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradedAttempt {
    pub(crate) total_questions: i32,
    pub(crate) correct_answers: i32,
    pub(crate) score: f64,
}

/// One snapshot entry as served to the taker: the question plus the option
/// permutation it was displayed under.
pub(crate) struct AnswerKey<'a> {
    pub(crate) question: &'a Question,
    pub(crate) option_order: &'a [i32],
}

/// Positional label for a displayed option ("A", "B", ...).
pub(crate) fn index_to_label(index: usize) -> String {
    let mut label = String::new();
    let mut remaining = index;
    loop {
        label.insert(0, (b'A' + (remaining % 26) as u8) as char);
        remaining /= 26;
        if remaining == 0 {
            break;
        }
        remaining -= 1;
    }
    label
}

pub(crate) fn label_to_index(label: &str) -> Option<usize> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut index: usize = 0;
    for ch in trimmed.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return None;
        }
        index = index * 26 + (upper as usize - 'A' as usize + 1);
    }
    Some(index - 1)
}

/// Grades submitted answers against the attempt snapshot. Submitted labels
/// are positional in the *displayed* order, so each selection is mapped back
/// through `option_order` to an original option index before comparison with
/// the question's correct set. A question counts as correct only on an exact
/// match; unanswered or empty selections count as incorrect. The score is a
/// rounded percentage.
pub(crate) fn grade(
    snapshot: &[AnswerKey<'_>],
    answers: &HashMap<String, Vec<String>>,
) -> GradedAttempt {
    let total = snapshot.len();
    let mut correct_count = 0;

    for entry in snapshot {
        let correct: HashSet<usize> = entry
            .question
            .correct_options
            .0
            .iter()
            .filter_map(|label| label_to_index(label))
            .collect();

        let chosen: HashSet<usize> = answers
            .get(&entry.question.id)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|label| label_to_index(label))
                    .filter_map(|displayed| {
                        entry.option_order.get(displayed).map(|&original| original as usize)
                    })
                    .collect()
            })
            .unwrap_or_default();

        if !chosen.is_empty() && chosen == correct {
            correct_count += 1;
        }
    }

    let score = if total == 0 {
        0.0
    } else {
        (100.0 * correct_count as f64 / total as f64).round()
    };

    GradedAttempt {
        total_questions: total as i32,
        correct_answers: correct_count,
        score,
    }
}

/// Whether every snapshot question has a non-empty selection; gates
/// submission when the exam requires all questions answered.
pub(crate) fn all_answered(
    snapshot: &[AnswerKey<'_>],
    answers: &HashMap<String, Vec<String>>,
) -> bool {
    snapshot.iter().all(|entry| {
        answers.get(&entry.question.id).map(|labels| !labels.is_empty()).unwrap_or(false)
    })
}
