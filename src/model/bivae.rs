use anyhow::{ensure, Context};
use hashbrown::HashMap;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};

use crate::io::{ItemId, UserId};
use crate::model::{ScoringModel, SerializableState, StateDict, TensorData};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    pub in_dim: usize,
    pub out_dim: usize,
    /// Row-major, `out_dim` rows of `in_dim` weights.
    pub weight: Vec<f32>,
    pub bias: Vec<f32>,
}

impl Dense {
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut output = Vec::with_capacity(self.out_dim);
        for row in 0..self.out_dim {
            let weights = &self.weight[row * self.in_dim..(row + 1) * self.in_dim];
            let activation: f32 = weights
                .iter()
                .zip(input.iter())
                .map(|(weight, x)| weight * x)
                .sum();
            output.push(activation + self.bias[row]);
        }
        output
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuantizedDense {
    pub in_dim: usize,
    pub out_dim: usize,
    pub weight: Vec<i8>,
    pub scale: f32,
    pub bias: Vec<f32>,
}

impl QuantizedDense {
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        let mut output = Vec::with_capacity(self.out_dim);
        for row in 0..self.out_dim {
            let weights = &self.weight[row * self.in_dim..(row + 1) * self.in_dim];
            let activation: f32 = weights
                .iter()
                .zip(input.iter())
                .map(|(weight, x)| (*weight as f32) * self.scale * x)
                .sum();
            output.push(activation + self.bias[row]);
        }
        output
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Linear {
    Full(Dense),
    Quantized(QuantizedDense),
}

impl Linear {
    pub fn forward(&self, input: &[f32]) -> Vec<f32> {
        match self {
            Linear::Full(dense) => dense.forward(input),
            Linear::Quantized(quantized) => quantized.forward(input),
        }
    }

    pub fn in_dim(&self) -> usize {
        match self {
            Linear::Full(dense) => dense.in_dim,
            Linear::Quantized(quantized) => quantized.in_dim,
        }
    }

    pub fn out_dim(&self) -> usize {
        match self {
            Linear::Full(dense) => dense.out_dim,
            Linear::Quantized(quantized) => quantized.out_dim,
        }
    }

    pub fn is_quantized(&self) -> bool {
        matches!(self, Linear::Quantized(_))
    }
}

/// Runs an input through a stack of layers, tanh between hidden layers.
pub fn forward_stack(layers: &[Linear], input: &[f32]) -> Vec<f32> {
    let mut activations = input.to_vec();
    for (position, layer) in layers.iter().enumerate() {
        activations = layer.forward(&activations);
        if position + 1 < layers.len() {
            for activation in activations.iter_mut() {
                *activation = activation.tanh();
            }
        }
    }
    activations
}

/// Bilinear VAE collaborative-filtering model.
///
/// Ranking scores come from the cached posterior means: the score of
/// (user, item) is the dot product of the user's theta row and the item's
/// beta row. The encoder stacks only participate in posterior inference and
/// dominate the serialized parameter size, which makes them the target of
/// post-training quantization.
#[derive(Clone, Debug)]
pub struct BiVae {
    latent_dim: usize,
    user_ids: Vec<UserId>,
    item_ids: Vec<ItemId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
    /// `user_ids.len() * latent_dim`, row-major.
    theta: Vec<f32>,
    /// `item_ids.len() * latent_dim`, row-major.
    beta: Vec<f32>,
    user_encoder: Vec<Linear>,
    item_encoder: Vec<Linear>,
}

#[derive(Serialize, Deserialize)]
struct BiVaeArtifact {
    latent_dim: usize,
    user_ids: Vec<UserId>,
    item_ids: Vec<ItemId>,
    theta: Vec<f32>,
    beta: Vec<f32>,
    user_encoder: Vec<Linear>,
    item_encoder: Vec<Linear>,
}

impl BiVae {
    pub fn new(
        latent_dim: usize,
        user_ids: Vec<UserId>,
        item_ids: Vec<ItemId>,
        theta: Vec<f32>,
        beta: Vec<f32>,
        user_encoder: Vec<Linear>,
        item_encoder: Vec<Linear>,
    ) -> anyhow::Result<BiVae> {
        ensure!(latent_dim > 0, "latent_dim must be positive");
        ensure!(
            theta.len() == user_ids.len() * latent_dim,
            "theta has {} values, expected {} users x {} factors",
            theta.len(),
            user_ids.len(),
            latent_dim
        );
        ensure!(
            beta.len() == item_ids.len() * latent_dim,
            "beta has {} values, expected {} items x {} factors",
            beta.len(),
            item_ids.len(),
            latent_dim
        );
        let user_index = user_ids
            .iter()
            .enumerate()
            .map(|(position, user)| (*user, position))
            .collect();
        let item_index = item_ids
            .iter()
            .enumerate()
            .map(|(position, item)| (*item, position))
            .collect();
        Ok(BiVae {
            latent_dim,
            user_ids,
            item_ids,
            user_index,
            item_index,
            theta,
            beta,
            user_encoder,
            item_encoder,
        })
    }

    /// Synthetic model with seeded uniform factors and encoder weights.
    /// Used by benchmarks and smoke tests; real models come from `load`.
    pub fn seeded(
        latent_dim: usize,
        user_ids: Vec<UserId>,
        item_ids: Vec<ItemId>,
        hidden_dims: &[usize],
        seed: u64,
    ) -> BiVae {
        let mut rng = Pcg64::seed_from_u64(seed);
        let mut uniform = |qty: usize| -> Vec<f32> {
            (0..qty).map(|_| rng.gen_range(-0.5..0.5f32)).collect()
        };
        let theta = uniform(user_ids.len() * latent_dim);
        let beta = uniform(item_ids.len() * latent_dim);

        let mut build_encoder = |input_dim: usize| -> Vec<Linear> {
            let mut layers = Vec::new();
            let mut in_dim = input_dim;
            for &out_dim in hidden_dims.iter().chain(std::iter::once(&latent_dim)) {
                layers.push(Linear::Full(Dense {
                    in_dim,
                    out_dim,
                    weight: uniform(in_dim * out_dim),
                    bias: vec![0.0; out_dim],
                }));
                in_dim = out_dim;
            }
            layers
        };
        let user_encoder = build_encoder(item_ids.len());
        let item_encoder = build_encoder(user_ids.len());

        BiVae::new(
            latent_dim,
            user_ids,
            item_ids,
            theta,
            beta,
            user_encoder,
            item_encoder,
        )
        .unwrap()
    }

    /// New model with both encoder stacks replaced, factors untouched.
    pub fn with_encoders(&self, user_encoder: Vec<Linear>, item_encoder: Vec<Linear>) -> BiVae {
        BiVae {
            latent_dim: self.latent_dim,
            user_ids: self.user_ids.clone(),
            item_ids: self.item_ids.clone(),
            user_index: self.user_index.clone(),
            item_index: self.item_index.clone(),
            theta: self.theta.clone(),
            beta: self.beta.clone(),
            user_encoder,
            item_encoder,
        }
    }

    pub fn latent_dim(&self) -> usize {
        self.latent_dim
    }

    pub fn user_encoder(&self) -> &[Linear] {
        &self.user_encoder
    }

    pub fn item_encoder(&self) -> &[Linear] {
        &self.item_encoder
    }

    pub fn qty_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn qty_items(&self) -> usize {
        self.item_ids.len()
    }

    fn theta_row(&self, user: UserId) -> Option<&[f32]> {
        let position = *self.user_index.get(&user)?;
        Some(&self.theta[position * self.latent_dim..(position + 1) * self.latent_dim])
    }

    fn beta_row(&self, position: usize) -> &[f32] {
        &self.beta[position * self.latent_dim..(position + 1) * self.latent_dim]
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let file = File::create(path)
            .with_context(|| format!("could not create model file {}", path))?;
        let artifact = BiVaeArtifact {
            latent_dim: self.latent_dim,
            user_ids: self.user_ids.clone(),
            item_ids: self.item_ids.clone(),
            theta: self.theta.clone(),
            beta: self.beta.clone(),
            user_encoder: self.user_encoder.clone(),
            item_encoder: self.item_encoder.clone(),
        };
        bincode::serialize_into(BufWriter::new(file), &artifact)
            .with_context(|| format!("could not serialize model to {}", path))?;
        Ok(())
    }

    pub fn load(path: &str) -> anyhow::Result<BiVae> {
        let file =
            File::open(path).with_context(|| format!("could not open model file {}", path))?;
        let artifact: BiVaeArtifact = bincode::deserialize_from(BufReader::new(file))
            .with_context(|| format!("could not deserialize model from {}", path))?;
        BiVae::new(
            artifact.latent_dim,
            artifact.user_ids,
            artifact.item_ids,
            artifact.theta,
            artifact.beta,
            artifact.user_encoder,
            artifact.item_encoder,
        )
    }
}

impl ScoringModel for BiVae {
    fn item_universe(&self) -> &[ItemId] {
        &self.item_ids
    }

    fn scores(&self, user: UserId) -> Option<Vec<f64>> {
        let theta_row = self.theta_row(user)?;
        let scores = (0..self.item_ids.len())
            .map(|position| {
                let beta_row = self.beta_row(position);
                theta_row
                    .iter()
                    .zip(beta_row.iter())
                    .map(|(theta, beta)| (theta * beta) as f64)
                    .sum()
            })
            .collect();
        Some(scores)
    }

    fn score(&self, user: UserId, item: ItemId) -> Option<f64> {
        let theta_row = self.theta_row(user)?;
        let position = *self.item_index.get(&item)?;
        let beta_row = self.beta_row(position);
        Some(
            theta_row
                .iter()
                .zip(beta_row.iter())
                .map(|(theta, beta)| (theta * beta) as f64)
                .sum(),
        )
    }
}

impl SerializableState for BiVae {
    fn state_dict(&self) -> StateDict {
        let mut state = StateDict::default();
        state.push(
            "theta",
            vec![self.user_ids.len(), self.latent_dim],
            TensorData::F32(self.theta.clone()),
        );
        state.push(
            "beta",
            vec![self.item_ids.len(), self.latent_dim],
            TensorData::F32(self.beta.clone()),
        );
        for (side, encoder) in [
            ("user_encoder", &self.user_encoder),
            ("item_encoder", &self.item_encoder),
        ] {
            for (position, layer) in encoder.iter().enumerate() {
                let weight_name = format!("{}.{}.weight", side, position);
                let bias_name = format!("{}.{}.bias", side, position);
                match layer {
                    Linear::Full(dense) => {
                        state.push(
                            &weight_name,
                            vec![dense.out_dim, dense.in_dim],
                            TensorData::F32(dense.weight.clone()),
                        );
                        state.push(
                            &bias_name,
                            vec![dense.out_dim],
                            TensorData::F32(dense.bias.clone()),
                        );
                    }
                    Linear::Quantized(quantized) => {
                        state.push(
                            &weight_name,
                            vec![quantized.out_dim, quantized.in_dim],
                            TensorData::I8 {
                                values: quantized.weight.clone(),
                                scale: quantized.scale,
                            },
                        );
                        state.push(
                            &bias_name,
                            vec![quantized.out_dim],
                            TensorData::F32(quantized.bias.clone()),
                        );
                    }
                }
            }
        }
        state
    }
}
