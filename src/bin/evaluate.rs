use indicatif::ProgressBar;
use std::path::Path;

use minuet::config::AppConfig;
use minuet::io::{self, ItemId, UserId};
use minuet::metrics::evaluation_reporter::EvaluationReporter;
use minuet::model::bivae::BiVae;
use minuet::model::quantize;
use minuet::ranking;
use minuet::sizeprobe;
use minuet::stopwatch::Stopwatch;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    let config = AppConfig::new(config_path);
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log.level),
    )
    .init();

    let top_k = config.eval.top_k;
    let user_col = &config.data.user_col;
    let item_col = &config.data.item_col;

    let training_data_path = &config.data.training_data_path;
    if !Path::new(training_data_path).is_file() {
        panic!("Training data file does not exist: {}", training_data_path);
    }
    let test_data_path = &config.data.test_data_path;
    if !Path::new(test_data_path).is_file() {
        panic!("Test data file does not exist: {}", test_data_path);
    }
    let model_path = &config.model.model_path;
    if !Path::new(model_path).is_file() {
        panic!("Model file does not exist: {}", model_path);
    }

    let train = io::read_interactions(training_data_path, user_col, item_col)?;
    let test = io::read_interactions(test_data_path, user_col, item_col)?;

    let mut model = BiVae::load(model_path)?;
    sizeprobe::measure_size(&model, "bivae")?;
    if config.model.quantize {
        model = quantize::quantize_dynamic(&model);
        sizeprobe::measure_size(&model, "bivae-int8")?;
    }

    let seen_by_user = io::seen_items_by_user(&train);
    let relevant_by_user = io::relevant_items_by_user(&test);
    let mut users: Vec<UserId> = relevant_by_user.keys().copied().collect();
    users.sort_unstable();

    let mut reporter = EvaluationReporter::new(&config.eval.metrics, top_k);
    let mut stopwatch = Stopwatch::new();
    let progress = ProgressBar::new(users.len() as u64);
    let mut qty_skipped = 0_usize;

    for (position, user) in users.iter().enumerate() {
        stopwatch.start();
        let ranking = ranking::rank_unseen(&model, *user, seen_by_user.get(user), top_k);
        stopwatch.stop(position);
        match ranking {
            Some(ranked) => {
                let recommended_items = ranked
                    .iter()
                    .map(|scored| scored.id)
                    .collect::<Vec<ItemId>>();
                reporter.add(&recommended_items, &relevant_by_user[user]);
            }
            None => qty_skipped += 1,
        }
        progress.inc(1);
    }
    progress.finish_and_clear();
    log::info!(
        "evaluation results {:?} over {} users ({} unknown to the model)",
        reporter.results(),
        users.len() - qty_skipped,
        qty_skipped
    );

    println!("===============================================================");
    println!("===               START EVALUATING TEST FILE               ====");
    println!("===============================================================");
    println!("{}", reporter.get_name());
    println!("{}", reporter.result());
    println!("Qty test users: {}", stopwatch.get_n());
    println!("Scoring latency");
    println!(
        "p90 (microseconds): {}",
        stopwatch.get_percentile_in_micros(90.0)
    );
    println!(
        "p95 (microseconds): {}",
        stopwatch.get_percentile_in_micros(95.0)
    );
    println!(
        "p99.5 (microseconds): {}",
        stopwatch.get_percentile_in_micros(99.5)
    );

    if config.report.save_records {
        let mut writer = csv::Writer::from_path(&config.report.out_path)?;
        writer.write_record(["metric", "score"])?;
        for (name, score) in reporter.results() {
            writer.write_record([name, format!("{:.6}", score)])?;
        }
        writer.flush()?;
    }

    Ok(())
}
