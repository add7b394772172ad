//! Anchor-based trajectory target generation.
//!
//! A scene is a batch of vectorized polylines (map elements and agent
//! history). A VectorNet-style encoder summarizes the scene into a fixed
//! 128-wide embedding, and the [`model::TargetGenerator`] refines a set of
//! anchor points sampled from map centerlines into candidate trajectory
//! endpoints: one residual-corrected 2D target and one confidence logit per
//! anchor.

pub mod config;
pub mod data;
pub mod model;

pub use model::{TargetGenerator, VectorNet};
