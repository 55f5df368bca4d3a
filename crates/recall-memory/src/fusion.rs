// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Weighted score fusion for hybrid lexical/vector ranking.
//!
//! Each side's raw scores are normalized by that side's maximum, fused with
//! a convex weight, and the union of candidates is ranked by fused score.
//! A ranking where no candidate clears the threshold is reported explicitly
//! rather than as an empty list.

use std::cmp::Ordering;
use std::collections::HashMap;

use recall_config::model::RetrievalConfig;

/// Normalize scores into `[0, 1]` by dividing by the maximum.
///
/// Returns all zeros when the maximum is not positive. Negative inputs are
/// clamped to zero.
pub fn normalize(scores: &[f32]) -> Vec<f32> {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if max.is_nan() || max <= 0.0 {
        return vec![0.0; scores.len()];
    }
    scores.iter().map(|s| (s / max).clamp(0.0, 1.0)).collect()
}

/// Convex combination `weight * vector + (1 - weight) * lexical`.
pub fn fuse(lexical: f32, vector: f32, weight: f32) -> f32 {
    weight * vector + (1.0 - weight) * lexical
}

/// One candidate's normalized side scores and its fused score.
#[derive(Debug, Clone, PartialEq)]
pub struct FusedScore {
    pub id: String,
    pub lexical: f32,
    pub vector: f32,
    pub hybrid: f32,
}

/// Outcome of ranking a candidate set.
#[derive(Debug, Clone, PartialEq)]
pub enum Ranking {
    /// At least one candidate reached the threshold; best first.
    Ranked(Vec<FusedScore>),
    /// Candidates existed (or not) but none reached the threshold.
    NothingQualified,
}

impl Ranking {
    /// The ranked candidates, empty when nothing qualified.
    pub fn into_scores(self) -> Vec<FusedScore> {
        match self {
            Ranking::Ranked(scores) => scores,
            Ranking::NothingQualified => Vec::new(),
        }
    }
}

/// Fusion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreFusion {
    /// Weight of the vector side; the lexical side gets `1 - vector_weight`.
    pub vector_weight: f32,
    /// Minimum fused score a candidate needs to be returned.
    pub threshold: f32,
    /// Maximum number of candidates returned.
    pub top_n: usize,
}

impl ScoreFusion {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            vector_weight: config.vector_weight as f32,
            threshold: config.result_threshold as f32,
            top_n: config.top_n,
        }
    }

    /// Rank the union of lexical and vector candidates.
    ///
    /// Duplicate ids within one side keep their highest score. A candidate
    /// missing from one side scores 0 there. Ties keep first-seen order,
    /// lexical candidates first.
    pub fn rank(&self, lexical: &[(String, f32)], vector: &[(String, f32)]) -> Ranking {
        let lexical = best_per_id(lexical);
        let vector = best_per_id(vector);

        let lexical_norm = normalize(&lexical.iter().map(|(_, s)| *s).collect::<Vec<_>>());
        let vector_norm = normalize(&vector.iter().map(|(_, s)| *s).collect::<Vec<_>>());

        // Union in first-seen order.
        let mut order: Vec<&str> = Vec::new();
        let mut sides: HashMap<&str, (f32, f32)> = HashMap::new();
        for ((id, _), norm) in lexical.iter().zip(&lexical_norm) {
            order.push(id.as_str());
            sides.insert(id.as_str(), (*norm, 0.0));
        }
        for ((id, _), norm) in vector.iter().zip(&vector_norm) {
            let entry = sides.entry(id.as_str()).or_insert_with(|| {
                order.push(id.as_str());
                (0.0, 0.0)
            });
            entry.1 = *norm;
        }

        let mut fused: Vec<FusedScore> = order
            .into_iter()
            .map(|id| {
                let (lex, vec) = sides.get(id).copied().unwrap_or((0.0, 0.0));
                FusedScore {
                    id: id.to_string(),
                    lexical: lex,
                    vector: vec,
                    hybrid: fuse(lex, vec, self.vector_weight),
                }
            })
            .collect();

        // Stable: equal scores keep first-seen order.
        fused.sort_by(|a, b| b.hybrid.partial_cmp(&a.hybrid).unwrap_or(Ordering::Equal));
        fused.retain(|f| f.hybrid >= self.threshold);
        fused.truncate(self.top_n);

        if fused.is_empty() {
            Ranking::NothingQualified
        } else {
            Ranking::Ranked(fused)
        }
    }
}

/// Collapse duplicate ids to their maximum score, keeping first-seen order.
fn best_per_id(scores: &[(String, f32)]) -> Vec<(String, f32)> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut best: Vec<(String, f32)> = Vec::with_capacity(scores.len());
    for (id, score) in scores {
        match positions.get(id.as_str()) {
            Some(&pos) => {
                if *score > best[pos].1 {
                    best[pos].1 = *score;
                }
            }
            None => {
                positions.insert(id.as_str(), best.len());
                best.push((id.clone(), *score));
            }
        }
    }
    best
}
