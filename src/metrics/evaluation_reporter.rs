use crate::io::ItemId;
use crate::metrics::{MetricKind, RankingMetric};
use itertools::Itertools;

/// Drives a configured subset of ranking metrics over per-user evaluation
/// pairs and renders their names and results.
pub struct EvaluationReporter {
    metrics: Vec<Box<dyn RankingMetric>>,
}

impl EvaluationReporter {
    pub fn new(kinds: &[MetricKind], length: usize) -> EvaluationReporter {
        let metrics = kinds.iter().map(|kind| kind.create(length)).collect();
        EvaluationReporter { metrics }
    }

    pub fn add(&mut self, recommendations: &[ItemId], relevant_items: &[ItemId]) {
        for metric in self.metrics.iter_mut() {
            metric.add(recommendations, relevant_items);
        }
    }

    pub fn results(&self) -> Vec<(String, f64)> {
        self.metrics
            .iter()
            .map(|metric| (metric.get_name(), metric.result()))
            .collect()
    }

    pub fn result(&self) -> String {
        self.metrics
            .iter()
            .map(|metric| format!("{:.4}", metric.result()))
            .join(",")
    }

    pub fn get_name(&self) -> String {
        self.metrics.iter().map(|metric| metric.get_name()).join(",")
    }
}
