//! Predictor traits for move-probability and value estimation.
//!
//! These traits define the boundary between search and whatever model backs
//! it. Search only needs `predict`; the training loop additionally needs
//! `train` and `save`, and a factory to load or create the artifact.

use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::core::Color;
use crate::rules::RulesEngine;
use crate::training::TrainingExample;

/// Errors raised at the predictor boundary.
#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Model file {path} is incompatible: {reason}")]
    Incompatible { path: String, reason: String },

    #[error("Model codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Predictor lock poisoned")]
    Poisoned,
}

/// Encoded position as a flat tensor for predictor input.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EncodedState {
    /// Flattened tensor data (row-major order).
    pub tensor: Vec<f32>,

    /// Shape of the tensor.
    pub shape: Vec<usize>,
}

impl EncodedState {
    /// Create a new encoded state.
    pub fn new(tensor: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(
            tensor.len(),
            shape.iter().product::<usize>(),
            "Tensor length must match shape product"
        );
        Self { tensor, shape }
    }

    /// Get the total number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tensor.len()
    }

    /// Check if the tensor is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensor.is_empty()
    }
}

/// Raw predictor output for one position.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction<M> {
    /// Move probabilities. May include illegal moves and omit legal ones;
    /// search masks them to the legal set.
    pub moves: Vec<(M, f32)>,

    /// Value for the side to move, in `[-1, 1]`.
    pub value: f32,
}

/// Summary returned by a training pass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainReport {
    /// Examples consumed per epoch.
    pub examples: usize,

    /// Mean policy cross-entropy over the final epoch.
    pub policy_loss: f32,

    /// Mean squared value error over the final epoch.
    pub value_loss: f32,
}

/// Learned map from positions to move probabilities and a value.
///
/// `predict` takes `&self`; implementations that are also `Sync` may be
/// shared by concurrent self-play workers. Wrap a backend that cannot serve
/// concurrent inference in [`Serialized`].
pub trait Predictor<E: RulesEngine>: Send {
    /// Evaluate `position` for the side `to_move`.
    fn predict(&self, position: &E::Position, to_move: Color)
        -> Result<Prediction<E::Move>, PredictorError>;

    /// Fit the model to a batch of labeled examples.
    fn train(&mut self, examples: &[TrainingExample<E>]) -> Result<TrainReport, PredictorError>;

    /// Persist the model, overwriting `path`.
    fn save(&self, path: &Path) -> Result<(), PredictorError>;
}

/// Creates and loads persisted predictors.
pub trait PredictorFactory<E: RulesEngine> {
    /// The predictor type produced.
    type Output: Predictor<E>;

    /// Create a fresh model and write it to `path`.
    fn create(&self, path: &Path) -> Result<Self::Output, PredictorError>;

    /// Load a model from `path`.
    fn load(&self, path: &Path) -> Result<Self::Output, PredictorError>;

    /// Load `path` if it exists, otherwise create it.
    fn load_or_create(&self, path: &Path) -> Result<Self::Output, PredictorError> {
        if path.exists() {
            info!(path = %path.display(), "Loading model");
            self.load(path)
        } else {
            info!(path = %path.display(), "Model does not exist, creating a new one");
            self.create(path)
        }
    }
}

/// Uniform priors over legal moves and a fixed value.
///
/// A baseline for tests and for exercising search without a trained model.
/// Training is a no-op and nothing is persisted.
#[derive(Clone, Debug)]
pub struct UniformPredictor<E> {
    engine: E,
    value: f32,
}

impl<E: RulesEngine> UniformPredictor<E> {
    /// Uniform priors with a value of 0.
    pub fn new(engine: E) -> Self {
        Self { engine, value: 0.0 }
    }

    /// Report `value` for every position.
    pub fn with_value(mut self, value: f32) -> Self {
        self.value = value;
        self
    }
}

impl<E: RulesEngine> Predictor<E> for UniformPredictor<E> {
    fn predict(
        &self,
        position: &E::Position,
        to_move: Color,
    ) -> Result<Prediction<E::Move>, PredictorError> {
        let legal = self.engine.legal_moves(position, to_move);
        let p = if legal.is_empty() {
            0.0
        } else {
            1.0 / legal.len() as f32
        };
        Ok(Prediction {
            moves: legal.into_iter().map(|m| (m, p)).collect(),
            value: self.value,
        })
    }

    fn train(&mut self, examples: &[TrainingExample<E>]) -> Result<TrainReport, PredictorError> {
        Ok(TrainReport {
            examples: examples.len(),
            ..TrainReport::default()
        })
    }

    fn save(&self, _path: &Path) -> Result<(), PredictorError> {
        Ok(())
    }
}

/// Serializes inference behind a lock.
///
/// `Serialized<P>` is `Sync` whenever `P` is `Send`, so a backend that must
/// not be called concurrently can still be shared by the worker pool.
#[derive(Debug)]
pub struct Serialized<P> {
    inner: Mutex<P>,
}

impl<P> Serialized<P> {
    /// Wrap a predictor.
    pub fn new(inner: P) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Unwrap the predictor.
    pub fn into_inner(self) -> Result<P, PredictorError> {
        self.inner.into_inner().map_err(|_| PredictorError::Poisoned)
    }
}

impl<E: RulesEngine, P: Predictor<E>> Predictor<E> for Serialized<P> {
    fn predict(
        &self,
        position: &E::Position,
        to_move: Color,
    ) -> Result<Prediction<E::Move>, PredictorError> {
        let inner = self.inner.lock().map_err(|_| PredictorError::Poisoned)?;
        inner.predict(position, to_move)
    }

    fn train(&mut self, examples: &[TrainingExample<E>]) -> Result<TrainReport, PredictorError> {
        self.inner
            .get_mut()
            .map_err(|_| PredictorError::Poisoned)?
            .train(examples)
    }

    fn save(&self, path: &Path) -> Result<(), PredictorError> {
        let inner = self.inner.lock().map_err(|_| PredictorError::Poisoned)?;
        inner.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::connect_four::{Column, ConnectFour};
    use std::cell::Cell;

    #[test]
    fn test_encoded_state_new() {
        let state = EncodedState::new(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        assert_eq!(state.len(), 4);
        assert!(!state.is_empty());
    }

    #[test]
    fn test_uniform_predictor() {
        let game = ConnectFour::with_size(4, 4, 3);
        let predictor = UniformPredictor::new(game.clone()).with_value(0.5);
        let prediction = predictor
            .predict(&game.initial_position(), Color::Black)
            .unwrap();

        assert_eq!(prediction.moves.len(), 4);
        assert!(prediction.moves.iter().all(|(_, p)| (*p - 0.25).abs() < 1e-6));
        assert_eq!(prediction.value, 0.5);
    }

    #[test]
    fn test_uniform_predictor_no_moves() {
        let game = ConnectFour::with_size(2, 1, 2);
        let position = game.position_from_moves(&[0, 1]).unwrap();
        let predictor = UniformPredictor::new(game);

        let prediction = predictor.predict(&position, Color::Black).unwrap();
        assert!(prediction.moves.is_empty());
    }

    /// Predictor that is `Send` but not `Sync`.
    struct CountingPredictor {
        calls: Cell<usize>,
    }

    impl Predictor<ConnectFour> for CountingPredictor {
        fn predict(
            &self,
            _position: &crate::games::connect_four::ConnectFourPosition,
            _to_move: Color,
        ) -> Result<Prediction<Column>, PredictorError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Prediction {
                moves: vec![(Column(0), 1.0)],
                value: 0.0,
            })
        }

        fn train(
            &mut self,
            examples: &[TrainingExample<ConnectFour>],
        ) -> Result<TrainReport, PredictorError> {
            Ok(TrainReport {
                examples: examples.len(),
                ..TrainReport::default()
            })
        }

        fn save(&self, _path: &Path) -> Result<(), PredictorError> {
            Ok(())
        }
    }

    fn assert_sync<T: Sync>(_: &T) {}

    #[test]
    fn test_serialized_is_shareable_across_threads() {
        let game = ConnectFour::new();
        let position = game.initial_position();
        let shared = Serialized::new(CountingPredictor {
            calls: Cell::new(0),
        });
        assert_sync(&shared);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        shared.predict(&position, Color::Black).unwrap();
                    }
                });
            }
        });

        let inner = shared.into_inner().unwrap();
        assert_eq!(inner.calls.get(), 100);
    }
}
