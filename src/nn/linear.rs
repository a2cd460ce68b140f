//! Linear policy/value predictor.
//!
//! A softmax policy head and a tanh value head, both linear in the encoded
//! features. Small enough to train on a laptop in seconds, which makes it a
//! convenient reference model for the self-play loop; search treats it as
//! opaque like any other [`Predictor`].

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Color, GameRng};
use crate::nn::encoder::StateEncoder;
use crate::nn::traits::{Prediction, Predictor, PredictorError, PredictorFactory, TrainReport};
use crate::rules::RulesEngine;
use crate::training::TrainingExample;

/// Bumped whenever the on-disk layout changes.
const MODEL_VERSION: u32 = 1;

/// Optimization parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LinearPredictorConfig {
    /// Examples per gradient step.
    pub batch_size: usize,

    /// Passes over each training batch.
    pub epochs: usize,

    /// SGD step size.
    pub learning_rate: f32,

    /// Seed for example shuffling.
    pub seed: u64,
}

impl Default for LinearPredictorConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            epochs: 1,
            learning_rate: 0.01,
            seed: 0,
        }
    }
}

impl LinearPredictorConfig {
    /// Set the mini-batch size (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Set the number of epochs.
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct LinearWeights {
    features: usize,
    actions: usize,
    /// `actions x features`, row-major.
    policy_weights: Vec<f32>,
    policy_bias: Vec<f32>,
    value_weights: Vec<f32>,
    value_bias: f32,
}

impl LinearWeights {
    fn zeros(features: usize, actions: usize) -> Self {
        Self {
            features,
            actions,
            policy_weights: vec![0.0; features * actions],
            policy_bias: vec![0.0; actions],
            value_weights: vec![0.0; features],
            value_bias: 0.0,
        }
    }

    fn policy(&self, x: &[f32]) -> Vec<f32> {
        let mut logits: Vec<f32> = (0..self.actions)
            .map(|a| {
                let row = &self.policy_weights[a * self.features..(a + 1) * self.features];
                self.policy_bias[a] + dot(row, x)
            })
            .collect();
        softmax(&mut logits);
        logits
    }

    fn value(&self, x: &[f32]) -> f32 {
        (self.value_bias + dot(&self.value_weights, x)).tanh()
    }
}

#[derive(Serialize, Deserialize)]
struct ModelFile {
    version: u32,
    weights: LinearWeights,
}

#[derive(Clone)]
struct Sample {
    features: Vec<f32>,
    policy: Option<Vec<f32>>,
    value: f32,
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn softmax(logits: &mut [f32]) {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0;
    for l in logits.iter_mut() {
        *l = (*l - max).exp();
        sum += *l;
    }
    if sum > 0.0 {
        for l in logits.iter_mut() {
            *l /= sum;
        }
    }
}

/// Linear softmax-policy / tanh-value model over an encoder's features.
#[derive(Clone, Debug)]
pub struct LinearPredictor<S> {
    encoder: S,
    weights: LinearWeights,
    config: LinearPredictorConfig,
    rng: GameRng,
}

impl<S> LinearPredictor<S> {
    /// Fresh model with all weights at zero: uniform policy, value 0.
    pub fn new<E>(encoder: S, config: LinearPredictorConfig) -> Self
    where
        E: RulesEngine,
        S: StateEncoder<E>,
    {
        let weights = LinearWeights::zeros(encoder.feature_count(), encoder.action_space_size());
        let rng = GameRng::new(config.seed);
        Self {
            encoder,
            weights,
            config,
            rng,
        }
    }

    /// The optimization parameters.
    pub fn config(&self) -> &LinearPredictorConfig {
        &self.config
    }

    fn to_sample<E>(&self, example: &TrainingExample<E>) -> Sample
    where
        E: RulesEngine,
        S: StateEncoder<E>,
    {
        let features = self.encoder.encode(&example.position, example.to_move).tensor;

        let mut target = vec![0.0f32; self.weights.actions];
        for (mv, p) in &example.policy {
            if let Some(index) = self.encoder.move_index(mv) {
                target[index] += p;
            }
        }
        let total: f32 = target.iter().sum();
        let policy = (total > 0.0).then(|| target.into_iter().map(|p| p / total).collect());

        Sample {
            features,
            policy,
            value: example.value,
        }
    }

    /// One SGD step over `batch`; returns summed (policy, value) losses.
    fn step(&mut self, batch: &[&Sample]) -> (f32, f32) {
        let w = &mut self.weights;
        let (features, actions) = (w.features, w.actions);
        let mut grad_pw = vec![0.0f32; features * actions];
        let mut grad_pb = vec![0.0f32; actions];
        let mut grad_vw = vec![0.0f32; features];
        let mut grad_vb = 0.0f32;
        let (mut policy_loss, mut value_loss) = (0.0f32, 0.0f32);

        for sample in batch {
            let x = &sample.features;

            if let Some(target) = &sample.policy {
                let probs = w.policy(x);
                for a in 0..actions {
                    // d(cross-entropy)/d(logit) = p - target
                    let g = probs[a] - target[a];
                    grad_pb[a] += g;
                    let row = &mut grad_pw[a * features..(a + 1) * features];
                    for (r, xi) in row.iter_mut().zip(x) {
                        *r += g * xi;
                    }
                    if target[a] > 0.0 {
                        policy_loss -= target[a] * probs[a].max(1e-12).ln();
                    }
                }
            }

            let v = w.value(x);
            let error = v - sample.value;
            value_loss += error * error;
            let g = 2.0 * error * (1.0 - v * v);
            grad_vb += g;
            for (r, xi) in grad_vw.iter_mut().zip(x) {
                *r += g * xi;
            }
        }

        let scale = self.config.learning_rate / batch.len() as f32;
        for (p, g) in w.policy_weights.iter_mut().zip(&grad_pw) {
            *p -= scale * g;
        }
        for (p, g) in w.policy_bias.iter_mut().zip(&grad_pb) {
            *p -= scale * g;
        }
        for (p, g) in w.value_weights.iter_mut().zip(&grad_vw) {
            *p -= scale * g;
        }
        w.value_bias -= scale * grad_vb;

        (policy_loss, value_loss)
    }

    fn write(&self, path: &Path) -> Result<(), PredictorError> {
        let tmp = path.with_extension("tmp");
        {
            let writer = BufWriter::new(File::create(&tmp)?);
            bincode::serialize_into(
                writer,
                &ModelFile {
                    version: MODEL_VERSION,
                    weights: self.weights.clone(),
                },
            )?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl<E, S> Predictor<E> for LinearPredictor<S>
where
    E: RulesEngine,
    S: StateEncoder<E>,
{
    fn predict(
        &self,
        position: &E::Position,
        to_move: Color,
    ) -> Result<Prediction<E::Move>, PredictorError> {
        let encoded = self.encoder.encode(position, to_move);
        if encoded.len() != self.weights.features {
            return Err(PredictorError::Inference(format!(
                "expected {} features, encoder produced {}",
                self.weights.features,
                encoded.len()
            )));
        }

        let probs = self.weights.policy(&encoded.tensor);
        let moves = probs
            .into_iter()
            .enumerate()
            .filter_map(|(i, p)| self.encoder.index_move(i).map(|m| (m, p)))
            .collect();

        Ok(Prediction {
            moves,
            value: self.weights.value(&encoded.tensor),
        })
    }

    fn train(&mut self, examples: &[TrainingExample<E>]) -> Result<TrainReport, PredictorError> {
        if examples.is_empty() {
            return Ok(TrainReport::default());
        }

        let samples: Vec<Sample> = examples.iter().map(|e| self.to_sample(e)).collect();
        let batch_size = self.config.batch_size.max(1);
        let mut order: Vec<usize> = (0..samples.len()).collect();
        let mut report = TrainReport {
            examples: samples.len(),
            ..TrainReport::default()
        };

        for epoch in 0..self.config.epochs {
            let mut shuffle = self.rng.fork();
            for i in (1..order.len()).rev() {
                order.swap(i, shuffle.gen_range_usize(0..i + 1));
            }

            let (mut policy_loss, mut value_loss) = (0.0, 0.0);
            for chunk in order.chunks(batch_size) {
                let batch: Vec<&Sample> = chunk.iter().map(|&i| &samples[i]).collect();
                let (p, v) = self.step(&batch);
                policy_loss += p;
                value_loss += v;
            }

            report.policy_loss = policy_loss / samples.len() as f32;
            report.value_loss = value_loss / samples.len() as f32;
            debug!(
                epoch,
                policy_loss = report.policy_loss,
                value_loss = report.value_loss,
                "Linear predictor epoch complete"
            );
        }

        if report.policy_loss.is_nan() || report.value_loss.is_nan() {
            return Err(PredictorError::Training("loss diverged to NaN".into()));
        }

        Ok(report)
    }

    fn save(&self, path: &Path) -> Result<(), PredictorError> {
        self.write(path)
    }
}

/// Creates and loads [`LinearPredictor`] artifacts for one encoder.
#[derive(Clone, Debug)]
pub struct LinearPredictorFactory<S> {
    encoder: S,
    config: LinearPredictorConfig,
}

impl<S: Clone> LinearPredictorFactory<S> {
    /// Factory producing predictors with `encoder` and `config`.
    pub fn new(encoder: S, config: LinearPredictorConfig) -> Self {
        Self { encoder, config }
    }
}

impl<E, S> PredictorFactory<E> for LinearPredictorFactory<S>
where
    E: RulesEngine,
    S: StateEncoder<E> + Clone,
{
    type Output = LinearPredictor<S>;

    fn create(&self, path: &Path) -> Result<LinearPredictor<S>, PredictorError> {
        let predictor = LinearPredictor::new::<E>(self.encoder.clone(), self.config.clone());
        predictor.write(path)?;
        Ok(predictor)
    }

    fn load(&self, path: &Path) -> Result<LinearPredictor<S>, PredictorError> {
        let reader = BufReader::new(File::open(path)?);
        let file: ModelFile = bincode::deserialize_from(reader)?;

        let incompatible = |reason: String| PredictorError::Incompatible {
            path: path.display().to_string(),
            reason,
        };
        if file.version != MODEL_VERSION {
            return Err(incompatible(format!(
                "version {} (expected {MODEL_VERSION})",
                file.version
            )));
        }
        let (features, actions) = (self.encoder.feature_count(), self.encoder.action_space_size());
        if file.weights.features != features || file.weights.actions != actions {
            return Err(incompatible(format!(
                "{}x{} weights, encoder needs {features}x{actions}",
                file.weights.features, file.weights.actions
            )));
        }

        let mut predictor = LinearPredictor::new::<E>(self.encoder.clone(), self.config.clone());
        predictor.weights = file.weights;
        Ok(predictor)
    }
}
