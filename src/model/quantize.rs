use crate::model::bivae::{forward_stack, BiVae, Dense, Linear, QuantizedDense};

/// Post-training dynamic quantization of dense layers to int8.
///
/// Weights are mapped to i8 with a single absmax scale per tensor; biases
/// stay in f32. The transform is pure: it returns new layers and never
/// mutates the model it reads from.
pub fn quantize_dense(layer: &Dense) -> QuantizedDense {
    let absmax = layer
        .weight
        .iter()
        .map(|weight| weight.abs())
        .fold(0.0f32, f32::max)
        .max(1e-12);
    let scale = absmax / 127.0;
    let weight = layer
        .weight
        .iter()
        .map(|weight| (weight / scale).round().clamp(-127.0, 127.0) as i8)
        .collect();
    QuantizedDense {
        in_dim: layer.in_dim,
        out_dim: layer.out_dim,
        weight,
        scale,
        bias: layer.bias.clone(),
    }
}

/// Step one of the transform: quantize every full-precision layer in a
/// stack. Layers that are already quantized pass through unchanged.
pub fn quantize_layers(layers: &[Linear]) -> Vec<Linear> {
    layers
        .iter()
        .map(|layer| match layer {
            Linear::Full(dense) => Linear::Quantized(quantize_dense(dense)),
            Linear::Quantized(quantized) => Linear::Quantized(quantized.clone()),
        })
        .collect()
}

/// Step two composed with step one: a new model whose encoder stacks are
/// quantized, with the factor matrices untouched.
pub fn quantize_dynamic(model: &BiVae) -> BiVae {
    let user_encoder = quantize_layers(model.user_encoder());
    let item_encoder = quantize_layers(model.item_encoder());
    model.with_encoders(user_encoder, item_encoder)
}

/// Largest absolute deviation between the outputs of two layer stacks on
/// the given probe input. Used to report how much accuracy quantization
/// gave up.
pub fn quantization_drift(original: &[Linear], quantized: &[Linear], probe: &[f32]) -> f64 {
    let original_output = forward_stack(original, probe);
    let quantized_output = forward_stack(quantized, probe);
    original_output
        .iter()
        .zip(quantized_output.iter())
        .map(|(a, b)| (a - b).abs() as f64)
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod quantize_test {
    use super::*;
    use crate::model::{ScoringModel, SerializableState, TensorData};

    fn sample_dense() -> Dense {
        Dense {
            in_dim: 2,
            out_dim: 2,
            weight: vec![-1.0, 0.5, 0.25, 0.0],
            bias: vec![0.1, -0.1],
        }
    }

    #[test]
    fn should_quantize_weights_with_absmax_scale() {
        let quantized = quantize_dense(&sample_dense());
        assert_eq!(1.0 / 127.0, quantized.scale);
        assert_eq!(vec![-127, 64, 32, 0], quantized.weight);
        assert_eq!(vec![0.1, -0.1], quantized.bias);
    }

    #[test]
    fn should_bound_dequantization_error_by_half_a_step() {
        let dense = sample_dense();
        let quantized = quantize_dense(&dense);
        for (original, value) in dense.weight.iter().zip(quantized.weight.iter()) {
            let restored = (*value as f32) * quantized.scale;
            assert!((original - restored).abs() <= quantized.scale * 0.5 + f32::EPSILON);
        }
    }

    #[test]
    fn should_keep_the_original_model_untouched() {
        let model = BiVae::seeded(4, vec![1, 2], vec![10, 20, 30], &[8], 5);
        let before = model.state_dict();
        let small = quantize_dynamic(&model);
        assert_eq!(before, model.state_dict());
        assert!(small.user_encoder().iter().all(Linear::is_quantized));
        assert!(small.item_encoder().iter().all(Linear::is_quantized));
        // scoring comes from the factors and is unaffected
        assert_eq!(model.scores(1), small.scores(1));
    }

    #[test]
    fn should_shrink_the_serialized_state() {
        let model = BiVae::seeded(8, vec![1, 2, 3], (1..50).collect(), &[16], 9);
        let small = quantize_dynamic(&model);
        let original_size = bincode::serialized_size(&model.state_dict()).unwrap();
        let quantized_size = bincode::serialized_size(&small.state_dict()).unwrap();
        assert!(quantized_size < original_size);
    }

    #[test]
    fn should_pass_quantized_layers_through_unchanged() {
        let once = quantize_layers(&[Linear::Full(sample_dense())]);
        let twice = quantize_layers(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn should_report_small_drift_on_quantized_stacks() {
        let model = BiVae::seeded(4, vec![1, 2], vec![10, 20, 30, 40], &[8], 13);
        let small = quantize_dynamic(&model);
        let probe = vec![0.5; model.user_encoder()[0].in_dim()];
        let drift = quantization_drift(model.user_encoder(), small.user_encoder(), &probe);
        assert!(drift < 0.05, "drift {} too large", drift);
    }

    #[test]
    fn should_emit_i8_tensors_in_the_state_dict() {
        let model = BiVae::seeded(2, vec![1], vec![10, 20], &[], 1);
        let small = quantize_dynamic(&model);
        match &small.state_dict().get("user_encoder.0.weight").unwrap().data {
            TensorData::I8 { values, scale } => {
                assert_eq!(2 * 2, values.len());
                assert!(*scale > 0.0);
            }
            TensorData::F32(_) => panic!("expected an i8 tensor after quantization"),
        }
    }
}
