//! Spam classifier: the loaded network and its tokenizer.
//!
//! The network is an externally trained artifact. `CnnModel` evaluates the
//! usual text-CNN layout exported as JSON weights:
//! `Embedding -> Conv1D... -> GlobalMaxPool1D -> Dense... -> Dense(1, sigmoid)`.
//! Anything else can sit behind the `Classifier` trait.

use crate::config::ModelConfig;
use crate::error::SpamError;
use crate::tokenizer::Tokenizer;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// A loaded binary classifier over padded token id sequences.
pub trait Classifier: Send + Sync {
    /// Probability that the sequence is spam, in `[0, 1]`.
    fn spam_probability(&self, sequence: &[u32]) -> Result<f32, SpamError>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Linear,
}

impl Activation {
    fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Tanh => x.tanh(),
            Activation::Linear => x,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingLayer {
    pub vocab_size: usize,
    pub dim: usize,
    /// `vocab_size` rows of `dim` values
    pub weights: Vec<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvLayer {
    /// `kernel[offset][in_channel][filter]`
    pub kernel: Vec<Vec<Vec<f32>>>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    /// `weights[input][unit]`
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
    pub activation: Activation,
}

/// On-disk weight document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CnnArtifact {
    pub embedding: EmbeddingLayer,
    #[serde(default)]
    pub conv_layers: Vec<ConvLayer>,
    pub dense_layers: Vec<DenseLayer>,
}

#[derive(Debug, Clone)]
pub struct CnnModel {
    artifact: CnnArtifact,
    min_sequence_len: usize,
}

impl CnnModel {
    /// Validate layer shapes and build the model.
    pub fn from_artifact(artifact: CnnArtifact) -> Result<Self, SpamError> {
        let emb = &artifact.embedding;
        if emb.vocab_size == 0 || emb.dim == 0 {
            return Err(SpamError::ModelLoad("embedding has zero size".to_string()));
        }
        if emb.weights.len() != emb.vocab_size {
            return Err(SpamError::ModelLoad(format!(
                "embedding has {} rows, expected {}",
                emb.weights.len(),
                emb.vocab_size
            )));
        }
        if let Some(row) = emb.weights.iter().position(|r| r.len() != emb.dim) {
            return Err(SpamError::ModelLoad(format!(
                "embedding row {} has wrong width, expected {}",
                row, emb.dim
            )));
        }

        let mut channels = emb.dim;
        let mut min_sequence_len = 1;
        for (i, conv) in artifact.conv_layers.iter().enumerate() {
            if conv.kernel.is_empty() {
                return Err(SpamError::ModelLoad(format!("conv layer {} has empty kernel", i)));
            }
            let filters = conv.bias.len();
            for offset in &conv.kernel {
                if offset.len() != channels || offset.iter().any(|f| f.len() != filters) {
                    return Err(SpamError::ModelLoad(format!(
                        "conv layer {} kernel shape does not match {} inputs x {} filters",
                        i, channels, filters
                    )));
                }
            }
            min_sequence_len += conv.kernel.len() - 1;
            channels = filters;
        }

        if artifact.dense_layers.is_empty() {
            return Err(SpamError::ModelLoad("no dense layers".to_string()));
        }
        for (i, dense) in artifact.dense_layers.iter().enumerate() {
            let units = dense.bias.len();
            if dense.weights.len() != channels || dense.weights.iter().any(|w| w.len() != units) {
                return Err(SpamError::ModelLoad(format!(
                    "dense layer {} shape does not match {} inputs x {} units",
                    i, channels, units
                )));
            }
            channels = units;
        }

        let head = &artifact.dense_layers[artifact.dense_layers.len() - 1];
        if channels != 1 || head.activation != Activation::Sigmoid {
            return Err(SpamError::ModelLoad(
                "output layer must be a single sigmoid unit".to_string(),
            ));
        }

        Ok(Self {
            artifact,
            min_sequence_len,
        })
    }

    /// Load weights from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SpamError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SpamError::ModelLoad(format!("cannot read {}: {}", path.display(), e))
        })?;
        let artifact: CnnArtifact = serde_json::from_str(&raw)
            .map_err(|e| SpamError::ModelLoad(format!("invalid model JSON: {}", e)))?;
        Self::from_artifact(artifact)
    }

    fn embed(&self, sequence: &[u32]) -> Result<Vec<Vec<f32>>, SpamError> {
        let emb = &self.artifact.embedding;
        sequence
            .iter()
            .map(|&id| {
                emb.weights.get(id as usize).cloned().ok_or_else(|| {
                    SpamError::Inference(format!(
                        "token id {} outside vocabulary of {}",
                        id, emb.vocab_size
                    ))
                })
            })
            .collect()
    }
}

fn conv1d(input: &[Vec<f32>], layer: &ConvLayer) -> Vec<Vec<f32>> {
    let width = layer.kernel.len();
    let filters = layer.bias.len();
    let steps = input.len() + 1 - width;

    (0..steps)
        .map(|t| {
            let mut out = layer.bias.clone();
            for (offset, taps) in layer.kernel.iter().enumerate() {
                for (x, weights) in input[t + offset].iter().zip(taps) {
                    for f in 0..filters {
                        out[f] += x * weights[f];
                    }
                }
            }
            out.into_iter().map(|v| layer.activation.apply(v)).collect()
        })
        .collect()
}

fn global_max_pool(input: &[Vec<f32>]) -> Vec<f32> {
    let channels = input.first().map(Vec::len).unwrap_or(0);
    (0..channels)
        .map(|c| input.iter().map(|row| row[c]).fold(f32::NEG_INFINITY, f32::max))
        .collect()
}

fn dense(input: &[f32], layer: &DenseLayer) -> Vec<f32> {
    let mut out = layer.bias.clone();
    for (x, weights) in input.iter().zip(&layer.weights) {
        for (o, w) in out.iter_mut().zip(weights) {
            *o += x * w;
        }
    }
    out.into_iter().map(|v| layer.activation.apply(v)).collect()
}

impl Classifier for CnnModel {
    fn spam_probability(&self, sequence: &[u32]) -> Result<f32, SpamError> {
        if sequence.len() < self.min_sequence_len {
            return Err(SpamError::Inference(format!(
                "sequence of {} ids is shorter than the receptive field of {}",
                sequence.len(),
                self.min_sequence_len
            )));
        }

        let mut features = self.embed(sequence)?;
        for layer in &self.artifact.conv_layers {
            features = conv1d(&features, layer);
        }

        let mut activations = global_max_pool(&features);
        for layer in &self.artifact.dense_layers {
            activations = dense(&activations, layer);
        }

        let prob = activations[0];
        if !prob.is_finite() {
            return Err(SpamError::Inference("network produced a non-finite output".to_string()));
        }
        Ok(prob.clamp(0.0, 1.0))
    }

    fn describe(&self) -> String {
        format!(
            "text CNN (vocab {}, embedding {}, {} conv, {} dense)",
            self.artifact.embedding.vocab_size,
            self.artifact.embedding.dim,
            self.artifact.conv_layers.len(),
            self.artifact.dense_layers.len()
        )
    }
}

/// A classifier paired with the tokenizer it was trained with.
pub struct ModelBundle {
    pub classifier: Arc<dyn Classifier>,
    pub tokenizer: Arc<Tokenizer>,
    pub loaded_at: DateTime<Local>,
}

impl ModelBundle {
    pub fn new(classifier: Arc<dyn Classifier>, tokenizer: Tokenizer) -> Self {
        Self {
            classifier,
            tokenizer: Arc::new(tokenizer),
            loaded_at: Local::now(),
        }
    }

    /// Load both artifacts; either one failing fails the load.
    pub fn load(config: &ModelConfig) -> Result<Self, SpamError> {
        let model = CnnModel::load(&config.model_path)?;
        let tokenizer = Tokenizer::load(&config.tokenizer_path)?;
        info!(
            "Loaded {} from {} with {} tokenizer entries",
            model.describe(),
            config.model_path.display(),
            tokenizer.vocabulary_size()
        );
        Ok(Self::new(Arc::new(model), tokenizer))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Vocab of 4 ids with a 1-d embedding equal to a "spamminess" score,
    /// a width-2 sum filter and a sigmoid head.
    pub(crate) fn tiny_artifact() -> CnnArtifact {
        CnnArtifact {
            embedding: EmbeddingLayer {
                vocab_size: 4,
                dim: 1,
                weights: vec![vec![0.0], vec![2.0], vec![-2.0], vec![0.5]],
            },
            conv_layers: vec![ConvLayer {
                kernel: vec![vec![vec![1.0]], vec![vec![1.0]]],
                bias: vec![0.0],
                activation: Activation::Linear,
            }],
            dense_layers: vec![DenseLayer {
                weights: vec![vec![1.0]],
                bias: vec![0.0],
                activation: Activation::Sigmoid,
            }],
        }
    }

    #[test]
    fn test_forward_pass() {
        let model = CnnModel::from_artifact(tiny_artifact()).unwrap();
        // windows: [1,1]=4, [1,0]=2, [0,0]=0 -> max 4
        let p = model.spam_probability(&[1, 1, 0, 0]).unwrap();
        assert!((p - 1.0 / (1.0 + (-4.0f32).exp())).abs() < 1e-6);

        // windows: [2,2]=-4, [2,0]=-2, [0,0]=0 -> max 0
        let p = model.spam_probability(&[2, 2, 0, 0]).unwrap();
        assert!((p - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_vocab_id_is_inference_error() {
        let model = CnnModel::from_artifact(tiny_artifact()).unwrap();
        let err = model.spam_probability(&[1, 9, 0]).unwrap_err();
        assert!(matches!(err, SpamError::Inference(_)));
    }

    #[test]
    fn test_sequence_shorter_than_kernel() {
        let model = CnnModel::from_artifact(tiny_artifact()).unwrap();
        assert!(model.spam_probability(&[1]).is_err());
    }

    #[test]
    fn test_relu_hidden_layer() {
        let mut artifact = tiny_artifact();
        artifact.dense_layers.insert(
            0,
            DenseLayer {
                weights: vec![vec![1.0, -1.0]],
                bias: vec![0.0, 0.0],
                activation: Activation::Relu,
            },
        );
        artifact.dense_layers[1].weights = vec![vec![1.0], vec![1.0]];
        let model = CnnModel::from_artifact(artifact).unwrap();
        // pooled 4 -> relu [4, 0] -> 4
        let p = model.spam_probability(&[1, 1, 0]).unwrap();
        assert!((p - 1.0 / (1.0 + (-4.0f32).exp())).abs() < 1e-6);
    }

    #[test]
    fn test_shape_validation() {
        let mut bad_rows = tiny_artifact();
        bad_rows.embedding.weights.pop();
        assert!(matches!(
            CnnModel::from_artifact(bad_rows),
            Err(SpamError::ModelLoad(_))
        ));

        let mut bad_kernel = tiny_artifact();
        bad_kernel.conv_layers[0].kernel[1] = vec![vec![1.0, 2.0]];
        assert!(CnnModel::from_artifact(bad_kernel).is_err());

        let mut bad_head = tiny_artifact();
        bad_head.dense_layers[0].activation = Activation::Linear;
        assert!(CnnModel::from_artifact(bad_head).is_err());

        let mut no_dense = tiny_artifact();
        no_dense.dense_layers.clear();
        assert!(CnnModel::from_artifact(no_dense).is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, serde_json::to_string(&tiny_artifact()).unwrap()).unwrap();
        let model = CnnModel::load(&path).unwrap();
        assert!(model.describe().contains("vocab 4"));

        std::fs::write(&path, "{\"embedding\": 3}").unwrap();
        assert!(matches!(CnnModel::load(&path), Err(SpamError::ModelLoad(_))));
    }

    #[test]
    fn test_bundle_requires_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        std::fs::write(&model_path, serde_json::to_string(&tiny_artifact()).unwrap()).unwrap();

        let config = ModelConfig {
            model_path: model_path.clone(),
            tokenizer_path: dir.path().join("missing.json"),
            ..ModelConfig::default()
        };
        assert!(matches!(ModelBundle::load(&config), Err(SpamError::TokenizerLoad(_))));

        let tok_path = dir.path().join("tok.json");
        std::fs::write(&tok_path, r#"{"word_index": {"free": 1}}"#).unwrap();
        let config = ModelConfig {
            model_path,
            tokenizer_path: tok_path,
            ..ModelConfig::default()
        };
        let bundle = ModelBundle::load(&config).unwrap();
        assert_eq!(bundle.tokenizer.vocabulary_size(), 1);
    }
}
