use hashbrown::HashMap;

use crate::config::EvalConfig;
use crate::io::{self, ItemId, Rating, UserId};
use crate::metrics::evaluation_reporter::EvaluationReporter;
use crate::model::ScoringModel;
use crate::ranking;

/// Scores a model against held-out interactions with the configured top-k
/// ranking metrics.
///
/// For every user in the test set the model ranks all items that user has
/// not interacted with in the training set; the configured metrics compare
/// those rankings against the held-out items at the single cutoff
/// `cfg.top_k`. Test users the model cannot score are skipped. The full
/// metric mapping is emitted as one log record and returned.
pub fn evaluate<M: ScoringModel>(
    train: &[(UserId, ItemId, Rating)],
    test: &[(UserId, ItemId, Rating)],
    model: &M,
    cfg: &EvalConfig,
) -> HashMap<String, f64> {
    let seen_by_user = io::seen_items_by_user(train);
    let relevant_by_user = io::relevant_items_by_user(test);
    let mut users: Vec<UserId> = relevant_by_user.keys().copied().collect();
    users.sort_unstable();

    let predictions = ranking::predict_ranking(model, &seen_by_user, &users, cfg.top_k, true);

    let mut reporter = EvaluationReporter::new(&cfg.metrics, cfg.top_k);
    let mut qty_skipped = 0_usize;
    for user in &users {
        match predictions.get(user) {
            Some(ranking) => {
                let recommended_items = ranking
                    .iter()
                    .map(|scored| scored.id)
                    .collect::<Vec<ItemId>>();
                reporter.add(&recommended_items, &relevant_by_user[user]);
            }
            None => qty_skipped += 1,
        }
    }

    let results: HashMap<String, f64> = reporter.results().into_iter().collect();
    log::info!(
        "evaluation results {:?} over {} users ({} unknown to the model)",
        results,
        users.len() - qty_skipped,
        qty_skipped
    );
    results
}

#[cfg(test)]
mod evaluation_test {
    use super::*;
    use crate::metrics::MetricKind;
    use crate::model::bivae::BiVae;

    /// One user who has seen items 1 and 2, holds out item 3, and a model
    /// that scores item 3 highest among the remaining candidates.
    fn single_user_setup() -> (Vec<(UserId, ItemId, Rating)>, Vec<(UserId, ItemId, Rating)>, BiVae)
    {
        let train = vec![(1, 1, 1.0), (1, 2, 1.0)];
        let test = vec![(1, 3, 1.0)];
        let model = BiVae::new(
            1,
            vec![1],
            vec![1, 2, 3, 4],
            vec![1.0],
            vec![0.9, 0.8, 0.7, 0.1],
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        (train, test, model)
    }

    #[test]
    fn should_give_perfect_scores_when_the_held_out_item_ranks_first() {
        let (train, test, model) = single_user_setup();
        let results = evaluate(&train, &test, &model, &EvalConfig::default());
        assert!((1.0 - results["Recall@10"]).abs() < f64::EPSILON);
        assert!((1.0 - results["Ndcg@10"]).abs() < f64::EPSILON);
    }

    #[test]
    fn should_evaluate_the_legacy_metric_subset() {
        let (train, test, model) = single_user_setup();
        let cfg = EvalConfig {
            top_k: 10,
            metrics: MetricKind::ALL.to_vec(),
        };
        let results = evaluate(&train, &test, &model, &cfg);
        assert_eq!(4, results.len());
        assert!((1.0 - results["Map@10"]).abs() < f64::EPSILON);
        assert!((0.1 - results["Precision@10"]).abs() < f64::EPSILON);
    }

    #[test]
    fn should_be_idempotent_for_a_deterministic_model() {
        let (train, test, model) = single_user_setup();
        let cfg = EvalConfig::default();
        let first = evaluate(&train, &test, &model, &cfg);
        let second = evaluate(&train, &test, &model, &cfg);
        assert_eq!(first, second);
    }

    #[test]
    fn should_skip_test_users_unknown_to_the_model() {
        let (mut train, mut test, model) = single_user_setup();
        train.push((42, 1, 1.0));
        test.push((42, 2, 1.0));
        let results = evaluate(&train, &test, &model, &EvalConfig::default());
        // the unknown user contributes nothing, the known user stays perfect
        assert!((1.0 - results["Recall@10"]).abs() < f64::EPSILON);
    }

    #[test]
    fn should_survive_a_user_with_no_remaining_candidates() {
        let train = vec![(1, 1, 1.0), (1, 2, 1.0)];
        let test = vec![(1, 2, 1.0)];
        let model = BiVae::new(
            1,
            vec![1],
            vec![1, 2],
            vec![1.0],
            vec![0.9, 0.8],
            Vec::new(),
            Vec::new(),
        )
        .unwrap();
        let results = evaluate(&train, &test, &model, &EvalConfig::default());
        assert!((0.0 - results["Recall@10"]).abs() < f64::EPSILON);
    }
}
