//! # temporal-normalizer
//!
//! Turns free-form Vietnamese time expressions into one canonical time result
//! for an HR assistant ("lương tháng 9", "công từ 1/10 đến 31/10").
//!
//! Text is canonicalized, sent to a Duckling-compatible time-parsing service,
//! and the service's candidates are reconciled with the original text into a
//! [`NormalizedTimeResult`] in a fixed UTC+7 offset. Service failures never
//! surface to callers; they read as "no time information".
//!
//! ## Modules
//!
//! - [`canonicalize`](mod@canonicalize): Vietnamese date phrase rewriting
//! - [`gateway`]: HTTP client for the time-parsing service
//! - [`candidate`]: lenient decoding of service candidates
//! - [`grain`]: grain vocabulary and period expansion
//! - [`normalize`](mod@normalize): candidate + text reconciliation into one result
//! - [`result`]: the output type
//! - [`intent`]: classifier trait, intent catalog and confidence gate
//! - [`registry`]: runtime keyword registry and its classifier
//! - [`pipeline`]: intent gate + gateway + normalizer
//! - [`settings`]: file and environment configuration
//! - [`zone`]: offset resolution and ISO conversion
//! - [`error`]: Error types

pub mod candidate;
pub mod canonicalize;
pub mod error;
pub mod gateway;
pub mod grain;
pub mod intent;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod result;
pub mod settings;
pub mod zone;

pub use candidate::{decode_candidates, RawCandidate, TimeValue};
pub use canonicalize::canonicalize;
pub use error::{EngineError, Result};
pub use gateway::{DucklingGateway, ParseOutcome, StaticParser, TimeParser};
pub use grain::{expand, expand_iso, Grain};
pub use intent::{FixedClassifier, IntentCatalog, IntentClassifier, IntentSpec, Prediction};
pub use normalize::{normalize, NormalizeOptions, Normalizer};
pub use pipeline::{PredictionResponse, TemporalPipeline};
pub use registry::{KeyEntry, KeyRegistry, KeywordClassifier};
pub use result::NormalizedTimeResult;
pub use settings::{load_settings, DucklingSettings, IntentSettings, NormalizerSettings, Settings};
