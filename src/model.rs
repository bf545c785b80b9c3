//! Pretrained crop classifier.
//!
//! The artifacts (feature scaler, label encoder and a dense feed-forward
//! network) are exported once from the training environment into a single
//! JSON document and loaded at startup. Nothing here mutates after load.

use crate::error::{AppError, Result};
use crate::features::{FeatureVector, FEATURE_COUNT};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// A fitted classifier mapping a feature vector to class probabilities.
pub trait CropClassifier: Send + Sync {
    /// Crop labels, indexed like the probabilities returned by `predict_proba`.
    fn classes(&self) -> &[String];

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>>;
}

/// Standardization fitted on the training set: `(x - mean) / scale`.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn transform(&self, features: &FeatureVector) -> [f64; FEATURE_COUNT] {
        let mut out = *features.values();
        for (i, value) in out.iter_mut().enumerate() {
            let scale = if self.scale[i] == 0.0 { 1.0 } else { self.scale[i] };
            *value = (*value - self.mean[i]) / scale;
        }
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelEncoder {
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Sigmoid,
    Tanh,
    Linear,
    Softmax,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DenseLayer {
    /// `[outputs][inputs]`
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    pub activation: Activation,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.first().map(Vec::len).unwrap_or(0)
    }

    fn outputs(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        let mut out: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        match self.activation {
            Activation::Relu => out.iter_mut().for_each(|v| *v = v.max(0.0)),
            Activation::Sigmoid => out.iter_mut().for_each(|v| *v = 1.0 / (1.0 + (-*v).exp())),
            Activation::Tanh => out.iter_mut().for_each(|v| *v = v.tanh()),
            Activation::Linear => {}
            Activation::Softmax => softmax(&mut out),
        }
        out
    }
}

fn softmax(values: &mut [f64]) {
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut total = 0.0;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        total += *v;
    }
    if total > 0.0 {
        values.iter_mut().for_each(|v| *v /= total);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DenseNetwork {
    pub layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    pub fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.layers
            .iter()
            .fold(input.to_vec(), |activations, layer| layer.forward(&activations))
    }
}

/// Scaler, encoder and network loaded together from one JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifacts {
    pub scaler: StandardScaler,
    pub encoder: LabelEncoder,
    pub network: DenseNetwork,
}

impl ModelArtifacts {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AppError::Model(format!(
                "Failed to read model file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let artifacts = Self::from_json(&content)?;
        info!(
            "Loaded crop model from {}: {} layers, {} classes",
            path.as_ref().display(),
            artifacts.network.layers.len(),
            artifacts.encoder.classes.len()
        );
        Ok(artifacts)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let artifacts: ModelArtifacts = serde_json::from_str(content)
            .map_err(|e| AppError::Model(format!("Failed to parse model file: {}", e)))?;
        artifacts.validate()?;
        Ok(artifacts)
    }

    /// Check every shape the forward pass relies on.
    fn validate(&self) -> Result<()> {
        if self.scaler.mean.len() != FEATURE_COUNT || self.scaler.scale.len() != FEATURE_COUNT {
            return Err(AppError::Model(format!(
                "Scaler must have {} means and scales, got {} and {}",
                FEATURE_COUNT,
                self.scaler.mean.len(),
                self.scaler.scale.len()
            )));
        }

        if self.encoder.classes.is_empty() {
            return Err(AppError::Model("Label encoder has no classes".to_string()));
        }

        if self.network.layers.is_empty() {
            return Err(AppError::Model("Network has no layers".to_string()));
        }

        let mut expected_inputs = FEATURE_COUNT;
        for (idx, layer) in self.network.layers.iter().enumerate() {
            if layer.outputs() == 0 || layer.bias.len() != layer.outputs() {
                return Err(AppError::Model(format!(
                    "Layer {} has {} weight rows but {} biases",
                    idx,
                    layer.outputs(),
                    layer.bias.len()
                )));
            }
            if layer.weights.iter().any(|row| row.len() != expected_inputs) {
                return Err(AppError::Model(format!(
                    "Layer {} expects {} inputs per row, got {}",
                    idx,
                    expected_inputs,
                    layer.inputs()
                )));
            }
            expected_inputs = layer.outputs();
        }

        if expected_inputs != self.encoder.classes.len() {
            return Err(AppError::Model(format!(
                "Network produces {} outputs but encoder has {} classes",
                expected_inputs,
                self.encoder.classes.len()
            )));
        }

        Ok(())
    }
}

impl CropClassifier for ModelArtifacts {
    fn classes(&self) -> &[String] {
        &self.encoder.classes
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        let scaled = self.scaler.transform(features);
        let output = self.network.forward(&scaled);

        if output.iter().any(|p| !p.is_finite()) {
            return Err(AppError::Model(
                "Model produced a non-finite probability".to_string(),
            ));
        }
        Ok(output)
    }
}
