//! # gr-cascade — Cascade slot engine for Grocery Run
//!
//! A 5×5 cluster-pays slot with chain-reaction cascades. Clusters of three or
//! more 4-connected matching symbols pay, vanish, and let the cells above fall
//! into their place while fresh symbols drop in from the top. Each further
//! cascade in a spin pays at a higher combo multiplier.
//!
//! ## Features
//!
//! - **Deterministic**: all randomness comes from an injected [`RandomSource`];
//!   a seed reproduces a spin exactly
//! - **Cluster matching**: flood-fill detection with wild substitution
//! - **Sticky-wild bonus round**: matched wilds stay put and raise the round multiplier
//! - **Grand win**: jackpot-symbol condition with a one-off award
//! - **Collaborators**: daily limits, eligibility and stat recording behind traits
//!
//! ## Architecture
//!
//! ```text
//! CascadeEngine (EngineConfig, validated once)
//!     │
//!     ├── Grid::generate ← WeightedSelector ← RandomSource
//!     │
//!     ├── CascadeResolver
//!     │       ├── find_clusters → PayTable::score → Match
//!     │       └── Grid::collapse (gravity + refill)
//!     │
//!     └── BonusRoundState (sticky wilds, round multiplier)
//!           │
//!           v
//!     SpinResult → SpinRecord → SpinRecorder
//! ```

pub mod bonus;
pub mod cascade;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod limits;
pub mod paytable;
pub mod rng;
pub mod selector;
pub mod session;
pub mod spin;
pub mod stats;
pub mod symbols;

pub use bonus::*;
pub use cascade::*;
pub use cluster::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use grid::*;
pub use limits::*;
pub use paytable::*;
pub use rng::*;
pub use selector::*;
pub use session::*;
pub use spin::*;
pub use stats::*;
pub use symbols::*;
