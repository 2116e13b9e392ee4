use crate::qa::types::RankedChunk;

/// Decision taken after ranking: either synthesis proceeds with the top
/// chunks, or the question is answered "not found" without ever reaching
/// the generation service.
#[derive(Debug)]
pub enum GateDecision {
    NotFound,
    Proceed(Vec<RankedChunk>),
}

/// Short-circuits low-confidence retrievals. A top similarity strictly below
/// the threshold means no generation call is made for this question at all;
/// this is a cost and hallucination-avoidance control, not a soft warning.
#[derive(Debug, Clone)]
pub struct ConfidenceGate {
    threshold: f32,
    top_k: usize,
}

impl ConfidenceGate {
    pub fn new(threshold: f32, top_k: usize) -> Self {
        Self {
            threshold,
            top_k: top_k.max(1),
        }
    }

    pub fn evaluate(&self, mut ranked: Vec<RankedChunk>) -> GateDecision {
        match ranked.first() {
            None => GateDecision::NotFound,
            Some(top) if top.similarity < self.threshold => GateDecision::NotFound,
            Some(_) => {
                ranked.truncate(self.top_k);
                GateDecision::Proceed(ranked)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qa::types::Chunk;

    fn ranked(similarities: &[f32]) -> Vec<RankedChunk> {
        similarities
            .iter()
            .enumerate()
            .map(|(i, &similarity)| RankedChunk {
                chunk: Chunk {
                    text: format!("chunk-{i}"),
                    embedding: vec![],
                },
                similarity,
            })
            .collect()
    }

    #[test]
    fn exactly_at_threshold_proceeds() {
        let gate = ConfidenceGate::new(0.3, 3);
        assert!(matches!(
            gate.evaluate(ranked(&[0.3])),
            GateDecision::Proceed(_)
        ));
    }

    #[test]
    fn just_below_threshold_is_not_found() {
        let gate = ConfidenceGate::new(0.3, 3);
        assert!(matches!(
            gate.evaluate(ranked(&[0.2999])),
            GateDecision::NotFound
        ));
    }

    #[test]
    fn proceed_carries_at_most_top_k_in_rank_order() {
        let gate = ConfidenceGate::new(0.3, 3);
        let decision = gate.evaluate(ranked(&[0.9, 0.8, 0.7, 0.6, 0.5]));

        match decision {
            GateDecision::Proceed(top) => {
                assert_eq!(top.len(), 3);
                assert_eq!(top[0].similarity, 0.9);
                assert_eq!(top[2].similarity, 0.7);
            }
            GateDecision::NotFound => panic!("expected proceed"),
        }
    }

    #[test]
    fn empty_ranking_is_not_found() {
        let gate = ConfidenceGate::new(0.3, 3);
        assert!(matches!(gate.evaluate(vec![]), GateDecision::NotFound));
    }
}
