use crate::io::ItemId;

pub mod evaluation_reporter;
pub mod map;
pub mod ndcg;
pub mod precision;
pub mod recall;

/// Per-user accumulator for a top-k ranking metric. `add` is called once per
/// evaluated user with the ranked recommendations and the held-out items;
/// `result` is the mean over all added users, 0.0 when none were added.
pub trait RankingMetric {
    fn add(&mut self, recommendations: &[ItemId], relevant_items: &[ItemId]);
    fn result(&self) -> f64;
    fn get_name(&self) -> String;
}

/// The fixed set of supported metrics. The default configuration evaluates
/// Ndcg and Recall; the legacy configuration evaluates all four.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Map,
    Ndcg,
    Precision,
    Recall,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Map,
        MetricKind::Ndcg,
        MetricKind::Precision,
        MetricKind::Recall,
    ];

    pub fn from_name(name: &str) -> Option<MetricKind> {
        match name.trim().to_lowercase().as_str() {
            "map" => Some(MetricKind::Map),
            "ndcg" => Some(MetricKind::Ndcg),
            "precision" => Some(MetricKind::Precision),
            "recall" => Some(MetricKind::Recall),
            _ => None,
        }
    }

    pub fn create(&self, length: usize) -> Box<dyn RankingMetric> {
        match self {
            MetricKind::Map => Box::new(map::MeanAveragePrecision::new(length)),
            MetricKind::Ndcg => Box::new(ndcg::Ndcg::new(length)),
            MetricKind::Precision => Box::new(precision::Precision::new(length)),
            MetricKind::Recall => Box::new(recall::Recall::new(length)),
        }
    }
}
