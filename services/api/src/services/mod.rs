//! Domain services: stateless orchestration over the persistence ports

pub mod favorites;
pub mod recommendations;

pub use favorites::{FavoriteService, ToggleOutcome};
pub use recommendations::RecommendationService;
