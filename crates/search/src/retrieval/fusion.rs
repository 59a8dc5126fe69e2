//! Weighted reciprocal-rank fusion
//!
//! Combines the dense and lexical result lists without score normalization:
//! each list contributes `weight / rank` per chunk, with ranks starting at
//! 1 and no constant offset. A chunk absent from one list contributes zero
//! from that side.

use corpora_common::vector::VectorHit;
use std::collections::HashMap;

/// Fusion weights
#[derive(Debug, Clone)]
pub struct WeightedRrf {
    /// Weight for the dense (vector) list
    pub dense_weight: f64,

    /// Weight for the lexical list
    pub lexical_weight: f64,
}

impl Default for WeightedRrf {
    fn default() -> Self {
        Self {
            dense_weight: 0.8,
            lexical_weight: 0.2,
        }
    }
}

/// Result of fusion
#[derive(Debug, Clone)]
pub struct FusedHit {
    pub hit: VectorHit,
    pub dense_rank: Option<usize>,
    pub lexical_rank: Option<usize>,
    pub score: f64,
}

impl WeightedRrf {
    pub fn with_weights(dense_weight: f64, lexical_weight: f64) -> Self {
        Self {
            dense_weight,
            lexical_weight,
        }
    }

    /// Fuse the two ranked lists into one, ordered by descending fused
    /// score. Ties break by descending dense rank, then by chunk id.
    pub fn fuse(&self, dense: Vec<VectorHit>, lexical: Vec<VectorHit>) -> Vec<FusedHit> {
        let mut by_chunk: HashMap<i64, (VectorHit, Option<usize>, Option<usize>)> = HashMap::new();

        for (index, hit) in dense.into_iter().enumerate() {
            by_chunk.insert(hit.properties.chunk_id, (hit, Some(index + 1), None));
        }

        for (index, hit) in lexical.into_iter().enumerate() {
            match by_chunk.get_mut(&hit.properties.chunk_id) {
                Some((_, _, lexical_rank)) => {
                    *lexical_rank = Some(index + 1);
                }
                None => {
                    by_chunk.insert(hit.properties.chunk_id, (hit, None, Some(index + 1)));
                }
            }
        }

        let mut results: Vec<FusedHit> = by_chunk
            .into_values()
            .map(|(mut hit, dense_rank, lexical_rank)| {
                let dense_score = dense_rank
                    .map(|rank| self.dense_weight / rank as f64)
                    .unwrap_or(0.0);
                let lexical_score = lexical_rank
                    .map(|rank| self.lexical_weight / rank as f64)
                    .unwrap_or(0.0);

                let score = dense_score + lexical_score;
                hit.score = score;

                FusedHit {
                    hit,
                    dense_rank,
                    lexical_rank,
                    score,
                }
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.dense_rank.unwrap_or(0).cmp(&a.dense_rank.unwrap_or(0)))
                .then_with(|| a.hit.properties.chunk_id.cmp(&b.hit.properties.chunk_id))
        });

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpora_common::vector::VectorProperties;
    use uuid::Uuid;

    fn hit(chunk_id: i64, resource_id: i64) -> VectorHit {
        VectorHit {
            id: Uuid::from_u128(chunk_id as u128),
            score: 0.0,
            certainty: 0.0,
            properties: VectorProperties {
                content: format!("content {}", chunk_id),
                summary: String::new(),
                resource_id,
                chunk_id,
                order: chunk_id as i32,
                title: String::new(),
            },
        }
    }

    #[test]
    fn test_fusion_scores_and_order() {
        // Dense: A then B; lexical: B then C; weights 0.8 / 0.2.
        // A = 0.8/1 = 0.80, B = 0.8/2 + 0.2/1 = 0.60, C = 0.2/2 = 0.10.
        let fusion = WeightedRrf::default();
        let fused = fusion.fuse(vec![hit(1, 10), hit(2, 10)], vec![hit(2, 10), hit(3, 10)]);

        assert_eq!(fused.len(), 3);

        assert_eq!(fused[0].hit.properties.chunk_id, 1);
        assert!((fused[0].score - 0.80).abs() < 1e-9);

        assert_eq!(fused[1].hit.properties.chunk_id, 2);
        assert!((fused[1].score - 0.60).abs() < 1e-9);

        assert_eq!(fused[2].hit.properties.chunk_id, 3);
        assert!((fused[2].score - 0.10).abs() < 1e-9);
    }

    #[test]
    fn test_fusion_is_monotone_in_inverse_rank() {
        let fusion = WeightedRrf::default();
        let fused = fusion.fuse(vec![hit(1, 1), hit(2, 1), hit(3, 1)], vec![]);

        for pair in fused.windows(2) {
            assert!(pair[0].score > pair[1].score);
        }
    }

    #[test]
    fn test_swapped_weights_swap_ranking() {
        // Dense favors A, lexical favors B. With lexical-heavy weights B
        // must come out on top.
        let fusion = WeightedRrf::with_weights(0.2, 0.8);
        let fused = fusion.fuse(vec![hit(1, 1), hit(2, 1)], vec![hit(2, 1), hit(1, 1)]);

        // A = 0.2/1 + 0.8/2 = 0.6, B = 0.2/2 + 0.8/1 = 0.9.
        assert_eq!(fused[0].hit.properties.chunk_id, 2);
        assert_eq!(fused[1].hit.properties.chunk_id, 1);
    }

    #[test]
    fn test_tie_breaks_by_descending_dense_rank() {
        // With weights 0.5/0.5 and mirrored ranks both chunks score 0.75.
        let fusion = WeightedRrf::with_weights(0.5, 0.5);
        let fused = fusion.fuse(vec![hit(7, 1), hit(3, 1)], vec![hit(3, 1), hit(7, 1)]);

        // Both score 0.5/1 + 0.5/2 = 0.75; dense ranks differ (7 has rank 1,
        // 3 has rank 2): descending dense rank puts chunk 3 first.
        assert!((fused[0].score - fused[1].score).abs() < 1e-9);
        assert_eq!(fused[0].hit.properties.chunk_id, 3);
        assert_eq!(fused[1].hit.properties.chunk_id, 7);
    }
}
