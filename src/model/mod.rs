use crate::io::{ItemId, UserId};
use serde::{Deserialize, Serialize};

pub mod bivae;
pub mod quantize;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TensorData {
    F32(Vec<f32>),
    I8 { values: Vec<i8>, scale: f32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: TensorData,
}

/// Ordered view over a model's named parameter tensors. This is the unit of
/// serialization for size measurement and for persisted model artifacts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDict {
    tensors: Vec<NamedTensor>,
}

impl StateDict {
    pub fn push(&mut self, name: &str, shape: Vec<usize>, data: TensorData) {
        self.tensors.push(NamedTensor {
            name: name.to_string(),
            shape,
            data,
        });
    }

    pub fn get(&self, name: &str) -> Option<&NamedTensor> {
        self.tensors.iter().find(|tensor| tensor.name == name)
    }

    pub fn tensors(&self) -> &[NamedTensor] {
        &self.tensors
    }
}

pub trait SerializableState {
    fn state_dict(&self) -> StateDict;
}

/// Scoring seam between the evaluation machinery and a trained model.
///
/// `scores` returns one score per item in `item_universe`, in universe order,
/// or `None` for users the model has never seen.
pub trait ScoringModel: Sync {
    fn item_universe(&self) -> &[ItemId];

    fn scores(&self, user: UserId) -> Option<Vec<f64>>;

    fn score(&self, user: UserId, item: ItemId) -> Option<f64> {
        let position = self
            .item_universe()
            .iter()
            .position(|&candidate| candidate == item)?;
        self.scores(user).map(|scores| scores[position])
    }
}
