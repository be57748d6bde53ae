pub mod adapter;
pub mod counter;
pub mod diversity;
pub mod merger;
pub mod normalizer;
pub mod orderer;
pub mod recommendations;
pub mod sources;
pub mod strategy;

pub use recommendations::{AssemblyRequest, RecommendationEngine};
