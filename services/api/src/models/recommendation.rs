//! Recommendation models: stored recommendations, their lifecycle status,
//! interaction audit entries, and the derived behavior-pattern aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    Active,
    Dismissed,
    Converted,
    Expired,
}

impl RecommendationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationStatus::Active => "active",
            RecommendationStatus::Dismissed => "dismissed",
            RecommendationStatus::Converted => "converted",
            RecommendationStatus::Expired => "expired",
        }
    }

    /// Legal lifecycle transitions. A user can dismiss or convert an active
    /// recommendation, and undo a dismissal; converted and expired are
    /// terminal.
    pub fn can_transition_to(&self, to: RecommendationStatus) -> bool {
        matches!(
            (self, to),
            (
                RecommendationStatus::Active,
                RecommendationStatus::Dismissed | RecommendationStatus::Converted
            ) | (RecommendationStatus::Dismissed, RecommendationStatus::Active)
        )
    }
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecommendationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RecommendationStatus::Active),
            "dismissed" => Ok(RecommendationStatus::Dismissed),
            "converted" => Ok(RecommendationStatus::Converted),
            "expired" => Ok(RecommendationStatus::Expired),
            other => Err(format!("Unknown recommendation status: {}", other)),
        }
    }
}

/// What a recommendation points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    Material,
    Category,
    ProjectType,
    Supplier,
}

impl RecommendationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Material => "material",
            RecommendationType::Category => "category",
            RecommendationType::ProjectType => "project_type",
            RecommendationType::Supplier => "supplier",
        }
    }
}

impl FromStr for RecommendationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "material" => Ok(RecommendationType::Material),
            "category" => Ok(RecommendationType::Category),
            "project_type" => Ok(RecommendationType::ProjectType),
            "supplier" => Ok(RecommendationType::Supplier),
            other => Err(format!("Unknown recommendation type: {}", other)),
        }
    }
}

/// Stored recommendation entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecommendation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rec_type: RecommendationType,
    pub material_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub project_type: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub score: f64,
    pub reason: Option<String>,
    pub status: RecommendationStatus,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a user interacted with a surfaced recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    View,
    Click,
    Convert,
    Dismiss,
}

impl InteractionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::View => "view",
            InteractionType::Click => "click",
            InteractionType::Convert => "convert",
            InteractionType::Dismiss => "dismiss",
        }
    }
}

impl FromStr for InteractionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(InteractionType::View),
            "click" => Ok(InteractionType::Click),
            "convert" => Ok(InteractionType::Convert),
            "dismiss" => Ok(InteractionType::Dismiss),
            other => Err(format!("Unknown interaction type: {}", other)),
        }
    }
}

/// An id with how often it appeared in the window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCount {
    pub id: Uuid,
    pub count: i64,
}

/// A search term with how often it was used in the window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermCount {
    pub term: String,
    pub count: i64,
}

/// Derived per-user activity aggregate over a time window. Never stored as
/// its own row set: recomputed on demand and cached with a short TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorPattern {
    pub user_id: Uuid,
    pub window_days: u32,
    pub top_materials: Vec<ItemCount>,
    pub top_categories: Vec<ItemCount>,
    pub top_search_terms: Vec<TermCount>,
    pub session_count: i64,
    pub average_session_secs: f64,
    pub project_type_preferences: Vec<TermCount>,
}

/// Another user with a favorites-overlap similarity score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarUser {
    pub user_id: Uuid,
    pub similarity_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_recommendations_can_be_dismissed_or_converted() {
        assert!(RecommendationStatus::Active.can_transition_to(RecommendationStatus::Dismissed));
        assert!(RecommendationStatus::Active.can_transition_to(RecommendationStatus::Converted));
    }

    #[test]
    fn dismissal_can_be_undone() {
        assert!(RecommendationStatus::Dismissed.can_transition_to(RecommendationStatus::Active));
    }

    #[test]
    fn converted_and_expired_are_terminal() {
        for from in [RecommendationStatus::Converted, RecommendationStatus::Expired] {
            for to in [
                RecommendationStatus::Active,
                RecommendationStatus::Dismissed,
                RecommendationStatus::Converted,
                RecommendationStatus::Expired,
            ] {
                assert!(!from.can_transition_to(to));
            }
        }
    }

    #[test]
    fn no_status_transitions_to_itself() {
        for status in [
            RecommendationStatus::Active,
            RecommendationStatus::Dismissed,
            RecommendationStatus::Converted,
            RecommendationStatus::Expired,
        ] {
            assert!(!status.can_transition_to(status));
        }
    }

    #[test]
    fn status_string_roundtrip() {
        for status in [
            RecommendationStatus::Active,
            RecommendationStatus::Dismissed,
            RecommendationStatus::Converted,
            RecommendationStatus::Expired,
        ] {
            assert_eq!(status.as_str().parse::<RecommendationStatus>(), Ok(status));
        }
        assert!("archived".parse::<RecommendationStatus>().is_err());
    }

    #[test]
    fn interaction_types_parse_from_wire_strings() {
        assert_eq!("view".parse::<InteractionType>(), Ok(InteractionType::View));
        assert_eq!("click".parse::<InteractionType>(), Ok(InteractionType::Click));
        assert_eq!(
            "convert".parse::<InteractionType>(),
            Ok(InteractionType::Convert)
        );
        assert_eq!(
            "dismiss".parse::<InteractionType>(),
            Ok(InteractionType::Dismiss)
        );
        assert!("hover".parse::<InteractionType>().is_err());
    }
}
