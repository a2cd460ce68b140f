//! Predictor boundary for search and training.
//!
//! Search treats the model as an opaque capability: `predict` a position,
//! `train` on labeled examples, `save` to a path. A factory loads or creates
//! the persisted artifact.
//!
//! ## Overview
//!
//! - **Traits**: `Predictor`, `PredictorFactory`, `StateEncoder`
//! - **Reference model**: `LinearPredictor` (softmax policy, tanh value)
//! - **Baseline**: `UniformPredictor` for tests and untrained search
//! - **Thread safety**: `Serialized` for backends without concurrent inference
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rust_azero::games::ConnectFour;
//! use rust_azero::nn::{
//!     ConnectFourEncoder, LinearPredictorConfig, LinearPredictorFactory, PredictorFactory,
//! };
//!
//! let game = ConnectFour::new();
//! let factory = LinearPredictorFactory::new(
//!     ConnectFourEncoder::new(&game),
//!     LinearPredictorConfig::default(),
//! );
//! let path = std::path::Path::new("model.bin");
//! let predictor = PredictorFactory::<ConnectFour>::load_or_create(&factory, path)?;
//! # Ok::<(), rust_azero::nn::PredictorError>(())
//! ```

pub mod encoder;
pub mod linear;
pub mod traits;

// Re-export main types
pub use encoder::{ConnectFourEncoder, StateEncoder};
pub use linear::{LinearPredictor, LinearPredictorConfig, LinearPredictorFactory};
pub use traits::{
    EncodedState, Prediction, Predictor, PredictorError, PredictorFactory, Serialized,
    TrainReport, UniformPredictor,
};
