//! # latencylab-sim: Deterministic discrete-event simulation for LatencyLab
//!
//! The engine consumes a validated [`Model`](latencylab_model::Model) and
//! runs N independent simulations under a seed. Each run owns its entire
//! state (per-context FIFO queues, capacity slots, instance arena,
//! completion heap); nothing is shared between runs, and there is no
//! global mutable state. Same `(model, seed)` → same results, bit for bit,
//! on a given executor version.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      simulate_many                             │
//! │  ┌────────────┐   ┌─────────────────┐   ┌──────────────────┐  │
//! │  │ Executor   │   │ per-run RNG     │   │ trace collector  │  │
//! │  │ dispatch   │   │ (seed, run_id)  │   │ (optional)       │  │
//! │  └────────────┘   └─────────────────┘   └──────────────────┘  │
//! │                                                                │
//! │  ┌──────────────────────────┐  ┌──────────────────────────┐   │
//! │  │ sim_legacy (v1, FROZEN)  │  │ sim_v2 (delayed wiring)  │   │
//! │  │ SimRng / splitmix64      │  │ SmallRng / rand_distr    │   │
//! │  └──────────────────────────┘  └──────────────────────────┘   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! - Per-run seeds derive from `(seed, run_id)`; runs are independent.
//! - Simultaneous completions process in `(kind, context, name,
//!   instance_id)` order.
//! - Queues are FIFO per context; free slots allocate lowest-index first.
//! - Event fan-out follows wiring insertion order.
//!
//! The v1 executor is frozen as a behavioral reference; see the
//! `sim_legacy` module for the policy.

mod error;
mod executor;
pub mod rng;
pub mod sampler;
mod sim_legacy;
mod sim_v2;

pub use error::SimError;
pub use executor::{Executor, SimOutput, simulate_many};
pub use rng::{GaussianRng, SimRng, splitmix64};
pub use sampler::sample_duration_ms;
pub use sim_v2::DELAY_CONTEXT;
