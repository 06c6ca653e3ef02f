//! Data models for the API service

pub mod recommendation;
pub mod template;

pub use recommendation::{
    BehaviorPattern, InteractionType, ItemCount, RecommendationStatus, RecommendationType,
    SimilarUser, TermCount, UserRecommendation,
};
pub use template::Template;
