use std::time::Instant;
use tdigest::TDigest;

/// (position of the user in the evaluation order, scoring duration)
pub type UserDurationMicros = (u32, f64);

#[derive(Clone)]
pub struct Stopwatch {
    start_time: Instant,
    scoring_durations: Vec<UserDurationMicros>,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    pub fn new() -> Stopwatch {
        Stopwatch {
            start_time: Instant::now(),
            scoring_durations: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = Instant::now();
    }

    pub fn stop(&mut self, user_position: usize) {
        let duration = self.start_time.elapsed();
        let duration_as_micros: f64 = duration.as_micros() as f64;
        self.scoring_durations
            .push((user_position as u32, duration_as_micros));
    }

    pub fn get_n(&self) -> usize {
        self.scoring_durations.len()
    }

    pub fn get_percentile_in_micros(&self, percentile: f64) -> f64 {
        let t_digest = TDigest::new_with_size(100);
        let durations = self
            .scoring_durations
            .iter()
            .map(|(_position, micros)| *micros)
            .collect();
        let sorted_digest = t_digest.merge_unsorted(durations);
        sorted_digest.estimate_quantile(percentile / 100.0)
    }
}

#[cfg(test)]
mod stopwatch_test {
    use super::*;

    #[test]
    fn should_record_one_duration_per_stop() {
        let mut undertest = Stopwatch::new();
        for position in 0..5 {
            undertest.start();
            undertest.stop(position);
        }
        assert_eq!(5, undertest.get_n());
        assert!(undertest.get_percentile_in_micros(90.0) >= 0.0);
    }
}
