use serde::{Deserialize, Serialize};

/// Tunables for matching, ranking and display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum fuzzy score for a known location to be accepted.
    pub match_threshold: f64,
    /// Score reported when no known location clears the threshold.
    pub fallback_score: f64,
    /// Maximum routes listed in a recommendation payload.
    pub max_recommendations: usize,
    /// Maximum routes listed by "cheapest"/"fastest" refinements.
    pub max_refinements: usize,
    /// Booking count that earns the "Most Used" annotation.
    pub most_used_bookings: u64,
    /// Booking count that earns the "Popular" annotation.
    pub popular_bookings: u64,
    /// Stops shown in a route-by-id answer before collapsing to "+N more".
    pub stop_display_limit: usize,
    /// Routes listed by the popular-routes answer.
    pub popular_route_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.6,
            fallback_score: 0.5,
            max_recommendations: 10,
            max_refinements: 5,
            most_used_bookings: 10,
            popular_bookings: 5,
            stop_display_limit: 5,
            popular_route_limit: 10,
        }
    }
}
