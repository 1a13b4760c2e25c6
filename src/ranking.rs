use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::io::{ItemId, UserId};
use crate::model::ScoringModel;

#[derive(PartialEq, Debug, Clone)]
pub struct ItemScore {
    pub id: ItemId,
    pub score: f64,
}

impl ItemScore {
    fn new(id: ItemId, score: f64) -> Self {
        ItemScore { id, score }
    }
}

impl Eq for ItemScore {}

impl Ord for ItemScore {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse order by score
        match self.score.partial_cmp(&other.score) {
            Some(Ordering::Less) => Ordering::Greater,
            Some(Ordering::Greater) => Ordering::Less,
            _ => Ordering::Equal,
        }
    }
}

impl PartialOrd for ItemScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Top-k ranking of the candidate items a user has not interacted with yet,
/// in descending score order.
///
/// Returns `None` for users the model cannot score. When fewer than `top_k`
/// candidates remain after exclusion, the ranking is truncated to the
/// candidates that exist.
pub fn rank_unseen<M: ScoringModel>(
    model: &M,
    user: UserId,
    seen: Option<&HashSet<ItemId>>,
    top_k: usize,
) -> Option<Vec<ItemScore>> {
    let scores = model.scores(user)?;
    let mut heap: BinaryHeap<ItemScore> = BinaryHeap::with_capacity(top_k + 1);
    for (item, score) in model.item_universe().iter().zip(scores.into_iter()) {
        if seen.map_or(false, |seen_items| seen_items.contains(item)) {
            continue;
        }
        heap.push(ItemScore::new(*item, score));
        if heap.len() > top_k {
            // reversed ordering: this drops the lowest-scored candidate
            heap.pop();
        }
    }
    Some(heap.into_sorted_vec())
}

/// Per-user top-k rankings for all given users. Users unknown to the model
/// get no entry in the result.
pub fn predict_ranking<M: ScoringModel>(
    model: &M,
    seen_by_user: &HashMap<UserId, HashSet<ItemId>>,
    users: &[UserId],
    top_k: usize,
    exclude_seen: bool,
) -> HashMap<UserId, Vec<ItemScore>> {
    users
        .par_iter()
        .filter_map(|user| {
            let seen = if exclude_seen {
                seen_by_user.get(user)
            } else {
                None
            };
            rank_unseen(model, *user, seen, top_k).map(|ranking| (*user, ranking))
        })
        .collect()
}
