use std::cmp::Ordering;

use crate::core::errors::ApiError;
use crate::qa::types::{Chunk, RankedChunk};

/// Normalized dot product in [-1, 1]. Zero-norm or mismatched vectors score
/// 0.0 instead of failing; embedding-mechanism consistency is the caller's
/// responsibility.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// Score every chunk against the query vector and order by descending
/// similarity. The sort is stable, so ties keep original chunk order.
pub fn rank(query: &[f32], chunks: &[Chunk]) -> Result<Vec<RankedChunk>, ApiError> {
    if chunks.is_empty() {
        return Err(ApiError::EmptyCorpus);
    }

    let mut ranked: Vec<RankedChunk> = chunks
        .iter()
        .map(|chunk| RankedChunk {
            similarity: cosine_similarity(query, &chunk.embedding),
            chunk: chunk.clone(),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            text: text.to_string(),
            embedding,
        }
    }

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn cosine_is_symmetric() {
        let a = [0.3, 0.7, 0.1];
        let b = [0.9, 0.2, 0.5];
        assert!(approx_eq(cosine_similarity(&a, &b), cosine_similarity(&b, &a)));
    }

    #[test]
    fn zero_vector_scores_zero_everywhere() {
        let zero = [0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&zero, &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0, 3.0], &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!(approx_eq(cosine_similarity(&v, &v), 1.0));
    }

    #[test]
    fn ranking_preserves_length_and_orders_descending() {
        let chunks = vec![
            chunk("a", vec![0.1, 0.9]),
            chunk("b", vec![0.9, 0.1]),
            chunk("c", vec![0.5, 0.5]),
        ];
        let ranked = rank(&[1.0, 0.0], &chunks).unwrap();

        assert_eq!(ranked.len(), chunks.len());
        for pair in ranked.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        assert_eq!(ranked[0].chunk.text, "b");
    }

    #[test]
    fn query_matching_one_chunk_ranks_it_first() {
        let chunks = vec![
            chunk("cat", vec![1.0, 0.0, 0.0]),
            chunk("dog", vec![0.0, 1.0, 0.0]),
            chunk("car", vec![0.0, 0.0, 1.0]),
        ];

        let ranked = rank(&[1.0, 0.0, 0.0], &chunks).unwrap();
        assert_eq!(ranked[0].chunk.text, "cat");
        assert!(approx_eq(ranked[0].similarity, 1.0));
    }

    #[test]
    fn ties_keep_original_chunk_order() {
        let chunks = vec![
            chunk("first", vec![1.0, 0.0]),
            chunk("second", vec![1.0, 0.0]),
            chunk("third", vec![2.0, 0.0]),
        ];

        let ranked = rank(&[1.0, 0.0], &chunks).unwrap();
        assert_eq!(ranked[0].chunk.text, "first");
        assert_eq!(ranked[1].chunk.text, "second");
        assert_eq!(ranked[2].chunk.text, "third");
    }

    #[test]
    fn empty_corpus_is_an_error() {
        assert!(matches!(rank(&[1.0], &[]), Err(ApiError::EmptyCorpus)));
    }
}
