//! Core contracts and pure primitives for Seedbank.
//!
//! This crate defines the deterministic selection and seed-derivation
//! helpers shared by the storage layer and the HTTP facade. Everything in
//! here is side-effect-free: given the same pool snapshot and seed, every
//! function returns the same sequence on every platform.

pub mod error;
pub mod record;
pub mod seeds;
pub mod select;

pub use error::{Error, Result};
pub use record::{category_of, dedup_key, record_id, scalar_string};
pub use seeds::{DimensionConfig, ResolvedSeeds, SeedFlags, clamp_base, resolve_seeds};
pub use select::{SelectionMethod, distribution, filter_and_select, select, shuffle};
