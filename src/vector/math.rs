use std::cmp::Ordering;

use ndarray::ArrayView1;

use crate::core::errors::{PipelineError, PipelineResult};

pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> PipelineResult<f32> {
    if query.is_empty() || candidate.is_empty() {
        return Err(PipelineError::InvalidInput(
            "Vectors must not be empty".to_string(),
        ));
    }
    if query.len() != candidate.len() {
        return Err(PipelineError::InvalidInput(format!(
            "Vector length mismatch: {} != {}",
            query.len(),
            candidate.len()
        )));
    }

    let query_view = ArrayView1::from(query);
    let candidate_view = ArrayView1::from(candidate);

    let dot = query_view.dot(&candidate_view);
    let denom = l2_norm(&query_view) * l2_norm(&candidate_view);
    if denom <= f32::EPSILON {
        return Ok(0.0);
    }

    Ok(dot / denom)
}

pub fn rank_descending_by_cosine<'a, I>(query: &[f32], candidates: I) -> PipelineResult<Vec<(usize, f32)>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scores = Vec::new();
    for (idx, candidate) in candidates.into_iter().enumerate() {
        let score = cosine_similarity(query, candidate)?;
        scores.push((idx, score));
    }

    scores.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
    Ok(scores)
}

/// Maps a cosine similarity in `[-1, 1]` onto a relevance score in `[0, 1]`.
pub fn cosine_relevance(similarity: f32) -> f32 {
    ((similarity + 1.0) / 2.0).clamp(0.0, 1.0)
}

/// Maps a Euclidean distance onto a relevance score; smaller distances score higher.
///
/// Assumes unit-length embeddings, whose distances fall in `[0, 2]`.
pub fn euclidean_relevance(distance: f32) -> f32 {
    (1.0 - distance / std::f32::consts::SQRT_2).clamp(0.0, 1.0)
}

fn l2_norm(vector: &ArrayView1<f32>) -> f32 {
    vector.dot(vector).sqrt()
}
