//! Converting root visit counts into move probabilities.
//!
//! Only explored root moves appear in a distribution. A move that is absent
//! was never searched and should be read as "not recommended".

use serde::{Deserialize, Serialize};

use crate::core::GameRng;

use super::search::SearchError;
use super::tree::MCTSTree;

/// One explored root move and its probability.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoveProbability<M> {
    /// The move.
    pub mv: M,
    /// Probability of playing it.
    pub probability: f32,
    /// Root-edge visit count behind the probability.
    pub visits: u32,
}

/// Distribution over explored root moves at `temperature`.
///
/// - `temperature <= 0`: one-hot on a most-visited move, ties broken
///   uniformly with `rng`.
/// - otherwise: proportional to `visits^(1 / temperature)`.
///
/// Fails with [`SearchError::Unsearched`] until at least one simulation has
/// passed through a root edge.
pub fn move_distribution<M: Clone>(
    tree: &MCTSTree<M>,
    temperature: f32,
    rng: &mut GameRng,
) -> Result<Vec<MoveProbability<M>>, SearchError> {
    let explored: Vec<(M, u32)> = tree
        .children(tree.root())
        .map(|(edge, child)| (edge.mv.clone(), child.visit_count))
        .collect();
    let max_visits = explored.iter().map(|(_, n)| *n).max().unwrap_or(0);
    if max_visits == 0 {
        return Err(SearchError::Unsearched);
    }

    if temperature <= 0.0 {
        let tied: Vec<usize> = explored
            .iter()
            .enumerate()
            .filter(|(_, (_, n))| *n == max_visits)
            .map(|(i, _)| i)
            .collect();
        let chosen = rng.choose(&tied).copied().unwrap_or(0);

        return Ok(explored
            .into_iter()
            .enumerate()
            .map(|(i, (mv, visits))| MoveProbability {
                mv,
                probability: if i == chosen { 1.0 } else { 0.0 },
                visits,
            })
            .collect());
    }

    // Scale by the maximum first so large exponents cannot overflow.
    let exponent = 1.0 / f64::from(temperature);
    let weights: Vec<f64> = explored
        .iter()
        .map(|(_, n)| (f64::from(*n) / f64::from(max_visits)).powf(exponent))
        .collect();
    let total: f64 = weights.iter().sum();

    Ok(explored
        .into_iter()
        .zip(weights)
        .map(|((mv, visits), w)| MoveProbability {
            mv,
            probability: (w / total) as f32,
            visits,
        })
        .collect())
}

/// Training target: each explored root move's share of the root's visits.
///
/// Independent of the temperature used to pick the move actually played.
pub fn training_policy<M: Clone>(tree: &MCTSTree<M>) -> Result<Vec<(M, f32)>, SearchError> {
    let root_visits = tree.root_node().visit_count;
    if root_visits == 0 {
        return Err(SearchError::Unsearched);
    }

    Ok(tree
        .children(tree.root())
        .map(|(edge, child)| (edge.mv.clone(), child.visit_count as f32 / root_visits as f32))
        .collect())
}

/// Sample a move by cumulative probability against one uniform draw.
pub fn sample_move<'d, M>(
    distribution: &'d [MoveProbability<M>],
    rng: &mut GameRng,
) -> Option<&'d M> {
    let probabilities: Vec<f32> = distribution.iter().map(|p| p.probability).collect();
    rng.sample_cumulative(&probabilities).map(|i| &distribution[i].mv)
}
