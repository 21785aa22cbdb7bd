mod common;

use std::sync::Arc;

use busroute_lib::{EngineConfig, LocationResolver, TransitStore};

use common::fixture_store;

fn resolver() -> LocationResolver {
    let store: Arc<dyn TransitStore> = Arc::new(fixture_store());
    LocationResolver::new(store, &EngineConfig::default())
}

#[test]
fn known_locations_cover_active_endpoints_and_stops() {
    let resolver = resolver();
    let known = resolver.known_locations();

    for expected in ["Connaught Place", "IGI Airport", "Dhaula Kuan", "Karol Bagh", "Hauz Khas"] {
        assert!(known.iter().any(|name| name == expected), "missing {expected}");
    }
    assert!(!known.iter().any(|name| name == "Mehrauli"));

    let mut sorted = known.to_vec();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted, known);
}

#[test]
fn every_known_location_resolves_to_itself() {
    let resolver = resolver();
    for location in resolver.known_locations().to_vec() {
        let found = resolver.find_best_location_match(&location.to_uppercase());
        assert_eq!(found.name, location);
        assert!(found.is_exact());
    }
}

#[test]
fn colloquial_names_reach_canonical_locations() {
    let resolver = resolver();
    let cases = [
        ("cp", "Connaught Place"),
        ("airport", "IGI Airport"),
        ("dwarka", "Dwarka Sector 21"),
        ("noida", "Noida City Centre"),
        ("anand vihar", "Anand Vihar ISBT"),
    ];
    for (query, expected) in cases {
        let found = resolver.find_best_location_match(query);
        assert_eq!(found.name, expected, "query {query}");
        assert!(found.score >= 0.9, "query {query} scored {}", found.score);
    }
}

#[test]
fn fuzzy_matches_respect_threshold() {
    let resolver = resolver();

    let found = resolver.find_best_location_match("Rajendra Plce");
    assert_eq!(found.name, "Rajendra Place");
    assert!(found.score >= 0.6 && found.score < 1.0);

    let fallback = resolver.find_best_location_match("quxbar");
    assert_eq!(fallback.name, "Quxbar");
    assert_eq!(fallback.score, 0.5);
}
