// Library interface for CoachRS modules
// This allows integration tests to access the core functionality

pub mod config;
pub mod coverage;
pub mod engine;
pub mod error;
pub mod features;
pub mod logging;
pub mod models;
pub mod problems;
pub mod recovery;
pub mod scoring;
pub mod selector;

// Re-export commonly used types for convenience
pub use models::*;
pub use coverage::MuscleCoverage;
pub use engine::{
    EngineInput, Recommendation, RecommendationEngine, RecommendationOutput, RecommendedExercise,
};
pub use features::{extract_features, FeatureVector, Model, ModelRegistry, Predictions};
pub use recovery::{Intensity, MuscleRecoveryStatus};
pub use error::{CoachError, Result};
pub use logging::{LogConfig, LogLevel, LogFormat};
