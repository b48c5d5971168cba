use rand::seq::SliceRandom;
use rand::Rng;

use crate::db::models::{Exam, Question};
use crate::services::errors::AttemptError;

/// One drawn question plus the option permutation applied for this attempt.
/// `option_order[p]` is the original option index shown at display position
/// `p`; without answer shuffling it is the identity permutation.
#[derive(Debug, Clone)]
pub(crate) struct SampledQuestion {
    pub(crate) question: Question,
    pub(crate) position: i32,
    pub(crate) option_order: Vec<i32>,
}

/// Draws the attempt's question set from the candidate pool: exactly
/// `exam.question_count` distinct questions, uniformly without replacement.
/// With `shuffle_questions` the draw order is kept (itself uniform); without
/// it the pool order is restored. Fails before any write when the pool is
/// too small.
pub(crate) fn draw(
    pool: &[Question],
    exam: &Exam,
    rng: &mut impl Rng,
) -> Result<Vec<SampledQuestion>, AttemptError> {
    let required = exam.question_count.max(0) as usize;
    if pool.len() < required {
        return Err(AttemptError::InsufficientBank { available: pool.len(), required });
    }

    let mut indices: Vec<usize> = (0..pool.len()).collect();
    indices.shuffle(rng);
    let mut drawn: Vec<usize> = indices.into_iter().take(required).collect();

    if !exam.shuffle_questions {
        drawn.sort_unstable();
    }

    let sampled = drawn
        .into_iter()
        .enumerate()
        .map(|(position, index)| {
            let question = pool[index].clone();
            let mut option_order: Vec<i32> = (0..question.options.0.len() as i32).collect();
            if exam.shuffle_answers {
                option_order.shuffle(rng);
            }
            SampledQuestion { question, position: position as i32, option_order }
        })
        .collect();

    Ok(sampled)
}
