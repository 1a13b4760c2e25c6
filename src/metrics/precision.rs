use crate::io::ItemId;
use crate::metrics::RankingMetric;
use hashbrown::HashSet;
use std::cmp;

pub struct Precision {
    sum_of_scores: f64,
    qty: usize,
    length: usize,
}

impl Precision {
    /// Returns a Precision evaluation metric.
    /// Precision quantifies how many of the top-k recommendations are part
    /// of the held-out items.
    ///
    /// # Arguments
    ///
    /// * `length` - the length aka 'k' that will be used for evaluation.
    ///
    pub fn new(length: usize) -> Precision {
        Precision {
            sum_of_scores: 0_f64,
            qty: 0,
            length,
        }
    }
}

impl RankingMetric for Precision {
    fn add(&mut self, recommendations: &[ItemId], relevant_items: &[ItemId]) {
        self.qty += 1;
        let top_recommendations: HashSet<&ItemId> = recommendations
            .iter()
            .take(cmp::min(recommendations.len(), self.length))
            .collect();

        let relevant_items: HashSet<&ItemId> = relevant_items.iter().collect();

        let intersection = top_recommendations.intersection(&relevant_items);

        self.sum_of_scores += intersection.count() as f64 / self.length as f64
    }

    fn result(&self) -> f64 {
        if self.qty > 0 {
            self.sum_of_scores / self.qty as f64
        } else {
            0.0
        }
    }

    fn get_name(&self) -> String {
        format!("Precision@{}", self.length)
    }
}

#[cfg(test)]
mod precision_test {
    use super::*;

    #[test]
    fn should_calculate_precision() {
        let mut undertest = Precision::new(10);
        let recommendations: Vec<ItemId> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let relevant_items: Vec<ItemId> = vec![3, 12];
        undertest.add(&recommendations, &relevant_items);
        assert_eq!(1.0 / 10.0, undertest.result());
        assert_eq!("Precision@10", undertest.get_name());
    }

    #[test]
    fn should_use_the_cutoff_as_denominator_for_short_rankings() {
        let mut undertest = Precision::new(10);
        undertest.add(&[3], &[3]);
        assert_eq!(1.0 / 10.0, undertest.result());
    }
}
