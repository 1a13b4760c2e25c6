use crate::io::ItemId;
use crate::metrics::RankingMetric;
use hashbrown::HashSet;
use std::cmp;

pub struct Ndcg {
    sum_of_scores: f64,
    qty: usize,
    length: usize,
}

impl Ndcg {
    /// Normalized discounted cumulative gain at the given rank cutoff, with
    /// binary relevance and the 1/log2(rank + 1) discount. Normalization is
    /// against the ideal ranking of the held-out items.
    pub fn new(length: usize) -> Ndcg {
        Ndcg {
            sum_of_scores: 0_f64,
            qty: 0,
            length,
        }
    }

    fn dcg(&self, recommendations: &[ItemId], relevant_items: &HashSet<ItemId>) -> f64 {
        recommendations
            .iter()
            .take(cmp::min(recommendations.len(), self.length))
            .enumerate()
            .filter(|(_index, item_id)| relevant_items.contains(*item_id))
            .map(|(index, _item_id)| 1_f64 / ((index as f64) + 2_f64).log2())
            .sum()
    }

    fn ideal_dcg(&self, qty_relevant: usize) -> f64 {
        (0..cmp::min(qty_relevant, self.length))
            .map(|index| 1_f64 / ((index as f64) + 2_f64).log2())
            .sum()
    }
}

impl RankingMetric for Ndcg {
    fn add(&mut self, recommendations: &[ItemId], relevant_items: &[ItemId]) {
        self.qty += 1;
        let relevant_items: HashSet<ItemId> = relevant_items.iter().copied().collect();
        if relevant_items.is_empty() {
            return;
        }
        let dcg = self.dcg(recommendations, &relevant_items);
        let ideal_dcg = self.ideal_dcg(relevant_items.len());
        self.sum_of_scores += dcg / ideal_dcg;
    }

    fn result(&self) -> f64 {
        if self.qty > 0 {
            self.sum_of_scores / self.qty as f64
        } else {
            0.0
        }
    }

    fn get_name(&self) -> String {
        format!("Ndcg@{}", self.length)
    }
}

#[cfg(test)]
mod ndcg_test {
    use super::*;

    #[test]
    fn should_calculate_ndcg() {
        let mut undertest = Ndcg::new(10);
        let recommendations: Vec<ItemId> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let relevant_items: Vec<ItemId> = vec![3, 1, 77];
        undertest.add(&recommendations, &relevant_items);
        assert!((0.7039180890341347 - undertest.result()).abs() < 1e-12);
        assert_eq!("Ndcg@10", undertest.get_name());
    }

    #[test]
    fn should_normalize_against_the_ideal_ranking() {
        let mut undertest = Ndcg::new(20);
        let recommendations: Vec<ItemId> = (1..=24).collect();
        let relevant_items: Vec<ItemId> = vec![3, 55, 88, 4];
        undertest.add(&recommendations, &relevant_items);
        assert!((0.36331756126716835 - undertest.result()).abs() < 1e-12);
    }

    #[test]
    fn should_give_full_credit_to_a_perfect_ranking() {
        let mut undertest = Ndcg::new(10);
        undertest.add(&[30, 40, 50], &[30]);
        assert!((1.0 - undertest.result()).abs() < f64::EPSILON);
    }

    #[test]
    fn should_average_over_users() {
        let mut undertest = Ndcg::new(10);
        undertest.add(&[30], &[30]);
        undertest.add(&[40], &[30]);
        assert!((0.5 - undertest.result()).abs() < f64::EPSILON);
    }

    #[test]
    fn should_handle_no_users() {
        let undertest = Ndcg::new(10);
        assert!((0.0 - undertest.result()).abs() < f64::EPSILON);
    }
}
