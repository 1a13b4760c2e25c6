use num_format::{Locale, ToFormattedString};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use std::path::Path;

use minuet::config::AppConfig;
use minuet::model::bivae::BiVae;
use minuet::model::quantize;
use minuet::sizeprobe;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    let config = AppConfig::new(config_path);
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log.level),
    )
    .init();

    let model_path = &config.model.model_path;
    if !Path::new(model_path).is_file() {
        panic!("Model file does not exist: {}", model_path);
    }
    let model = BiVae::load(model_path)?;
    let original_size = sizeprobe::measure_size(&model, "bivae")?;

    let user_encoder = quantize::quantize_layers(model.user_encoder());
    let item_encoder = quantize::quantize_layers(model.item_encoder());
    let small = model.with_encoders(user_encoder, item_encoder);
    let quantized_size = sizeprobe::measure_size(&small, "bivae-int8")?;

    println!("original bytes:  {}", original_size.to_formatted_string(&Locale::en));
    println!("quantized bytes: {}", quantized_size.to_formatted_string(&Locale::en));
    println!(
        "reduction: {:.2}x",
        original_size as f64 / quantized_size as f64
    );

    if let Some(first_layer) = model.user_encoder().first() {
        let mut rng = Pcg64::seed_from_u64(42);
        let probe: Vec<f32> = (0..first_layer.in_dim())
            .map(|_| rng.gen_range(-1.0..1.0f32))
            .collect();
        let drift =
            quantize::quantization_drift(model.user_encoder(), small.user_encoder(), &probe);
        println!("max encoder drift on probe input: {:.6}", drift);
    }

    let out_path = &config.model.quantized_model_path;
    if out_path.is_empty() {
        log::warn!("model.quantized_model_path not configured, skipping artifact write");
    } else {
        small.save(out_path)?;
        log::info!(
            "quantized model written to {} ({} -> {} bytes)",
            out_path,
            original_size,
            quantized_size
        );
    }

    Ok(())
}
