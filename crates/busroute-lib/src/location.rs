//! Location normalization, fuzzy matching, and extraction from rider messages.
//!
//! Riders type colloquial names ("cp", "ndls"), partial names ("dwarka") and
//! typos. [`LocationResolver`] turns those fragments into canonical names
//! known to the network, falling back to a best-effort guess rather than
//! failing. [`extract_locations`] pulls source/destination spans out of a
//! free-text sentence using a small ordered set of patterns.

use std::collections::BTreeSet;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::store::TransitStore;

/// Colloquial key → canonical display name.
///
/// Order matters: partial matching walks the table top to bottom and the
/// first key contained in (or containing) the input wins.
pub const LOCATION_ALIASES: &[(&str, &str)] = &[
    ("cp", "Connaught Place"),
    ("connaught", "Connaught Place"),
    ("kashmiri", "Kashmere Gate"),
    ("kashmere", "Kashmere Gate"),
    ("airport", "IGI Airport"),
    ("igi", "IGI Airport"),
    ("isbt", "ISBT Kashmere Gate"),
    ("anand vihar", "Anand Vihar ISBT"),
    ("saket", "Saket District Centre"),
    ("nehru place", "Nehru Place"),
    ("rajiv chowk", "Connaught Place"),
    ("new delhi", "New Delhi Railway Station"),
    ("ndls", "New Delhi Railway Station"),
    ("old delhi", "Old Delhi Railway Station"),
    ("chandni chowk", "Chandni Chowk"),
    ("red fort", "Red Fort"),
    ("india gate", "India Gate"),
    ("qutub minar", "Qutub Minar"),
    ("lotus temple", "Lotus Temple"),
    ("akshardham", "Akshardham Temple"),
    ("dwarka", "Dwarka Sector 21"),
    ("noida", "Noida City Centre"),
    ("gurgaon", "Gurgaon Cyber City"),
    ("gurugram", "Gurgaon Cyber City"),
    ("vasant kunj", "Vasant Kunj"),
    ("rohini", "Rohini Sector 18"),
    ("pitampura", "Pitampura"),
    ("janakpuri", "Janakpuri West"),
    ("lajpat nagar", "Lajpat Nagar"),
    ("south ex", "South Extension"),
    ("hauz khas", "Hauz Khas"),
    ("green park", "Green Park"),
    ("karol bagh", "Karol Bagh"),
    ("paharganj", "Paharganj"),
    ("nizamuddin", "Hazrat Nizamuddin"),
    ("okhla", "Okhla Industrial Area"),
    ("kalkaji", "Kalkaji Mandir"),
    ("badarpur", "Badarpur Border"),
    ("faridabad", "Faridabad New Town"),
    ("ghaziabad", "Ghaziabad"),
    ("vaishali", "Vaishali"),
    ("mayur vihar", "Mayur Vihar"),
    ("laxmi nagar", "Laxmi Nagar"),
    ("shahdara", "Shahdara"),
    ("azadpur", "Azadpur"),
    ("model town", "Model Town"),
];

/// Destinations offered as suggestions when a search comes up empty.
pub const POPULAR_DESTINATIONS: &[&str] = &[
    "Connaught Place",
    "IGI Airport",
    "Kashmere Gate",
    "Anand Vihar ISBT",
    "Dwarka Sector 21",
    "Noida City Centre",
    "Gurgaon Cyber City",
    "Nehru Place",
    "Saket District Centre",
    "Hauz Khas",
];

/// Words stripped from extracted spans before they are treated as places.
const FILTER_WORDS: &[&str] = &[
    "bus", "buses", "route", "routes", "how", "reach", "go", "going", "travel", "much", "price",
    "fare", "cost", "show", "find", "get", "me", "the", "a", "an", "is", "are", "can", "will",
    "would",
];

const EXACT_SCORE: f64 = 1.0;
const CONTAINS_SCORE: f64 = 0.9;

static REACH_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"how\s+to\s+reach\s+(.+?)\s+from\s+(.+?)(?:\s|$|\.|\?)").expect("valid regex")
});
static FROM_TO_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"from\s+(.+?)\s+to\s+(.+?)(?:\s|$|\.|\?)").expect("valid regex"));
static X_TO_Y_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.+?)\s+to\s+(.+?)(?:\s|$|\.|\?)").expect("valid regex"));
static TO_Y_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"to\s+(.+?)(?:\s|$|\.|\?)").expect("valid regex"));

/// A resolved location together with the confidence of the match.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationMatch {
    pub name: String,
    /// Confidence in `[0, 1]`; `1.0` means an exact hit on a known location.
    pub score: f64,
}

impl LocationMatch {
    pub fn is_exact(&self) -> bool {
        self.score >= EXACT_SCORE
    }
}

/// Map a raw fragment to a canonical name via the alias table, or title-case it.
pub fn normalize_location(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    if lowered.is_empty() {
        return String::new();
    }

    if let Some((_, canonical)) = LOCATION_ALIASES.iter().find(|(key, _)| *key == lowered) {
        return (*canonical).to_string();
    }

    if let Some((_, canonical)) = LOCATION_ALIASES
        .iter()
        .find(|(key, _)| lowered.contains(key) || key.contains(lowered.as_str()))
    {
        return (*canonical).to_string();
    }

    title_case(raw.trim())
}

/// Score how well `query` names `target`.
///
/// Exact (case-insensitive) equality scores 1.0, containment in either
/// direction 0.9, anything else the normalized Levenshtein similarity.
pub fn match_score(query: &str, target: &str) -> f64 {
    let query = query.trim().to_lowercase();
    let target = target.trim().to_lowercase();

    if query == target {
        return EXACT_SCORE;
    }
    if query.contains(&target) || target.contains(&query) {
        return CONTAINS_SCORE;
    }
    strsim::normalized_levenshtein(&query, &target)
}

/// Extract `[source, destination]` or `[destination]` from a rider message.
///
/// Patterns are tried in order: "how to reach X from Y", "from X to Y",
/// "X to Y", "to Y". The first pattern that matches decides the outcome,
/// except that "X to Y" falls through to "to Y" when both spans clean to
/// nothing. Captures are lazy, so a destination span stops at the first
/// whitespace ("from cp to dwarka sector 21" yields `["cp", "dwarka"]`).
pub fn extract_locations(message: &str) -> Vec<String> {
    let lowered = message.to_lowercase();

    if let Some(caps) = REACH_PATTERN.captures(&lowered) {
        let destination = clean_location(&caps[1]);
        let source = clean_location(&caps[2]);
        return pair_or_empty(source, destination);
    }

    if let Some(caps) = FROM_TO_PATTERN.captures(&lowered) {
        let source = clean_location(&caps[1]);
        let destination = clean_location(&caps[2]);
        return pair_or_empty(source, destination);
    }

    if let Some(caps) = X_TO_Y_PATTERN.captures(&lowered) {
        let source = clean_location(&caps[1]);
        let destination = clean_location(&caps[2]);
        if !source.is_empty() && !destination.is_empty() {
            return vec![source, destination];
        }
        if !destination.is_empty() {
            return vec![destination];
        }
    }

    if let Some(caps) = TO_Y_PATTERN.captures(&lowered) {
        let destination = clean_location(&caps[1]);
        if !destination.is_empty() {
            return vec![destination];
        }
    }

    Vec::new()
}

fn pair_or_empty(source: String, destination: String) -> Vec<String> {
    if source.is_empty() || destination.is_empty() {
        Vec::new()
    } else {
        vec![source, destination]
    }
}

fn clean_location(span: &str) -> String {
    span.split_whitespace()
        .filter(|word| !FILTER_WORDS.contains(&word.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn title_case(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut previous_is_letter = false;
    for ch in input.chars() {
        if previous_is_letter {
            output.extend(ch.to_lowercase());
        } else {
            output.extend(ch.to_uppercase());
        }
        previous_is_letter = ch.is_alphabetic();
    }
    output
}

/// Resolves rider-supplied place names against the locations the network serves.
pub struct LocationResolver {
    store: Arc<dyn TransitStore>,
    match_threshold: f64,
    fallback_score: f64,
    known: OnceCell<Vec<String>>,
}

impl LocationResolver {
    pub fn new(store: Arc<dyn TransitStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            match_threshold: config.match_threshold,
            fallback_score: config.fallback_score,
            known: OnceCell::new(),
        }
    }

    /// Distinct route endpoints and stop names, sorted.
    ///
    /// Built on first use and memoized for the resolver's lifetime. A store
    /// failure is logged and yields an empty slice without caching it, so a
    /// later call can still populate the cache.
    pub fn known_locations(&self) -> &[String] {
        match self.known.get_or_try_init(|| load_known_locations(self.store.as_ref())) {
            Ok(locations) => locations,
            Err(err) => {
                warn!(error = %err, "failed to load known locations");
                &[]
            }
        }
    }

    /// Find the known location that best matches `query`.
    ///
    /// Never fails: when nothing clears the threshold the normalized query is
    /// returned with the fallback score.
    pub fn find_best_location_match(&self, query: &str) -> LocationMatch {
        let known = self.known_locations();
        let trimmed = query.trim();

        if let Some(exact) = known
            .iter()
            .find(|location| location.eq_ignore_ascii_case(trimmed))
        {
            return LocationMatch {
                name: exact.clone(),
                score: EXACT_SCORE,
            };
        }

        let normalized = normalize_location(trimmed);
        if normalized.is_empty() {
            return LocationMatch {
                name: normalized,
                score: self.fallback_score,
            };
        }

        let mut best: Option<(&String, f64)> = None;
        for location in known {
            let score = match_score(&normalized, location);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((location, score));
            }
        }

        match best {
            Some((location, score)) if score >= self.match_threshold => {
                debug!(query, matched = %location, score, "resolved location");
                LocationMatch {
                    name: location.clone(),
                    score,
                }
            }
            _ => LocationMatch {
                name: normalized,
                score: self.fallback_score,
            },
        }
    }
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver")
            .field("match_threshold", &self.match_threshold)
            .field("cached_locations", &self.known.get().map(Vec::len))
            .finish()
    }
}

fn load_known_locations(store: &dyn TransitStore) -> Result<Vec<String>> {
    let mut locations = BTreeSet::new();
    for route in store.list_active_routes()? {
        for stop in store.list_stops_for_route(route.id)? {
            insert_non_empty(&mut locations, &stop.stop_name);
        }
        insert_non_empty(&mut locations, &route.start_location);
        insert_non_empty(&mut locations, &route.end_location);
    }
    debug!(count = locations.len(), "known location cache built");
    Ok(locations.into_iter().collect())
}

fn insert_non_empty(locations: &mut BTreeSet<String>, name: &str) {
    let name = name.trim();
    if !name.is_empty() {
        locations.insert(name.to_string());
    }
}
