//! Non-graph route search: direct endpoint matching with a stop-based fallback.

use std::fmt::Write as _;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::location::LocationResolver;
use crate::model::{BusRecord, RouteRecord};
use crate::response::{
    bus_label, bus_type_label, rupees, ResponseKind, ResponsePayload, RouteSummary,
};
use crate::store::TransitStore;

/// Case-insensitive substring test; an empty needle matches nothing.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    !needle.is_empty() && haystack.to_lowercase().contains(&needle)
}

/// Order routes by ascending fare, keeping store order among equal fares.
pub(crate) fn sort_by_fare(routes: &mut [RouteRecord]) {
    routes.sort_by(|a, b| a.fare.total_cmp(&b.fare));
}

/// Searches active routes by endpoint, name, and stop names.
pub struct RouteSearch {
    store: Arc<dyn TransitStore>,
    resolver: Arc<LocationResolver>,
    config: EngineConfig,
}

impl RouteSearch {
    pub fn new(
        store: Arc<dyn TransitStore>,
        resolver: Arc<LocationResolver>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            config,
        }
    }

    /// Routes serving `source` → `destination` after fuzzy resolution.
    ///
    /// A route qualifies when its start or name mentions the source and its
    /// end or name mentions the destination. With no direct hits, routes that
    /// stop at both places are returned instead.
    pub fn find_routes(&self, source: &str, destination: &str) -> Result<Vec<RouteRecord>> {
        let source = self.resolver.find_best_location_match(source).name;
        let destination = self.resolver.find_best_location_match(destination).name;

        let routes: Vec<RouteRecord> = self
            .store
            .list_active_routes()?
            .into_iter()
            .filter(|route| {
                (contains_ignore_case(&route.start_location, &source)
                    || contains_ignore_case(&route.route_name, &source))
                    && (contains_ignore_case(&route.end_location, &destination)
                        || contains_ignore_case(&route.route_name, &destination))
            })
            .collect();

        if !routes.is_empty() {
            debug!(%source, %destination, count = routes.len(), "direct routes found");
            return Ok(routes);
        }

        self.find_routes_via_stops(&source, &destination)
    }

    /// Active routes with a stop matching `source` and a stop matching `destination`.
    pub fn find_routes_via_stops(
        &self,
        source: &str,
        destination: &str,
    ) -> Result<Vec<RouteRecord>> {
        let mut matches = Vec::new();
        for route in self.store.list_active_routes()? {
            let stops = self.store.list_stops_for_route(route.id)?;
            let serves_source = stops
                .iter()
                .any(|stop| contains_ignore_case(&stop.stop_name, source));
            let serves_destination = stops
                .iter()
                .any(|stop| contains_ignore_case(&stop.stop_name, destination));
            if serves_source && serves_destination {
                matches.push(route);
            }
        }
        debug!(source, destination, count = matches.len(), "routes via stops");
        Ok(matches)
    }

    /// Every active route whose end, name, or any stop mentions `destination`.
    pub fn find_all_routes_to_destination(&self, destination: &str) -> Result<Vec<RouteRecord>> {
        let mut matches = Vec::new();
        for route in self.store.list_active_routes()? {
            let direct = contains_ignore_case(&route.end_location, destination)
                || contains_ignore_case(&route.route_name, destination);
            let via_stop = direct
                || self
                    .store
                    .list_stops_for_route(route.id)?
                    .iter()
                    .any(|stop| contains_ignore_case(&stop.stop_name, destination));
            if via_stop {
                matches.push(route);
            }
        }
        Ok(matches)
    }

    /// Fare-ranked listing for a source/destination search.
    pub fn generate_recommendations(
        &self,
        routes: &[RouteRecord],
        source: &str,
        destination: &str,
    ) -> Result<ResponsePayload> {
        if routes.is_empty() {
            return Ok(ResponsePayload::text(format!(
                "No routes found\n\nFrom: {source}\nTo: {destination}"
            ))
            .with_suggestions(["Try Again", "Help"]));
        }

        let ranked = self.top_by_fare(routes);
        let mut message = format!(
            "ROUTES: {source} → {destination}\nFound {} route(s)\n\n",
            routes.len()
        );
        let mut summaries = Vec::with_capacity(ranked.len());

        for (idx, route) in ranked.iter().enumerate() {
            let bus = self.bus_or_none(route);
            let bookings = self.bookings_for(route);
            let _ = writeln!(
                message,
                "{}. Bus {} ({})",
                idx + 1,
                bus_label(route, bus.as_ref()),
                bus_type_label(bus.as_ref())
            );
            message.push_str(&self.fare_line(route, bookings));
            message.push_str("\n\n");
            summaries.push(summary_with_bookings(route, bus.as_ref(), bookings));
        }

        Ok(ResponsePayload::new(ResponseKind::RouteList, message)
            .with_routes(summaries)
            .with_suggestions(["Book Ticket", "Cheapest Route", "Fastest Route", "New Search"]))
    }

    /// Fare-ranked listing of every route reaching `destination`.
    pub fn generate_destination_recommendations(
        &self,
        routes: &[RouteRecord],
        destination: &str,
    ) -> Result<ResponsePayload> {
        if routes.is_empty() {
            return Ok(ResponsePayload::text(format!("No routes found to {destination}"))
                .with_suggestions(["Try Again", "Help"]));
        }

        let ranked = self.top_by_fare(routes);
        let mut message = format!(
            "All Routes to {destination}\nFound {} route(s)\nShowing top {} routes\n\n",
            routes.len(),
            ranked.len()
        );
        let mut summaries = Vec::with_capacity(ranked.len());

        for (idx, route) in ranked.iter().enumerate() {
            let bus = self.bus_or_none(route);
            let bookings = self.bookings_for(route);
            let _ = writeln!(message, "{}. {} → {destination}", idx + 1, route.start_location);
            let _ = writeln!(
                message,
                "   Bus {} ({})",
                bus_label(route, bus.as_ref()),
                bus_type_label(bus.as_ref())
            );
            message.push_str(&self.fare_line(route, bookings));
            message.push_str("\n\n");
            summaries.push(summary_with_bookings(route, bus.as_ref(), bookings));
        }

        Ok(ResponsePayload::new(ResponseKind::DestinationRoutes, message)
            .with_routes(summaries)
            .with_suggestions(["Book Ticket", "New Search", "Popular Routes"]))
    }

    /// Bus assigned to a route, if any.
    pub fn bus_for(&self, route: &RouteRecord) -> Result<Option<BusRecord>> {
        match route.bus_id {
            Some(bus_id) => self.store.get_bus(bus_id),
            None => Ok(None),
        }
    }

    /// "Most Used" / "Popular" badge for a route's booking count.
    pub fn popularity_badge(&self, bookings: u64) -> Option<&'static str> {
        if bookings >= self.config.most_used_bookings {
            Some("Most Used")
        } else if bookings >= self.config.popular_bookings {
            Some("Popular")
        } else {
            None
        }
    }

    fn top_by_fare(&self, routes: &[RouteRecord]) -> Vec<RouteRecord> {
        let mut ranked = routes.to_vec();
        sort_by_fare(&mut ranked);
        ranked.truncate(self.config.max_recommendations);
        ranked
    }

    fn bus_or_none(&self, route: &RouteRecord) -> Option<BusRecord> {
        match self.bus_for(route) {
            Ok(bus) => bus,
            Err(err) => {
                warn!(route = %route.route_number, error = %err, "bus details unavailable");
                None
            }
        }
    }

    fn bookings_for(&self, route: &RouteRecord) -> Option<u64> {
        match self.store.count_bookings_for_route(route.id) {
            Ok(count) => Some(count),
            Err(err) => {
                warn!(route = %route.route_number, error = %err, "booking count unavailable");
                None
            }
        }
    }

    fn fare_line(&self, route: &RouteRecord, bookings: Option<u64>) -> String {
        let mut line = format!("   Fare: {}", rupees(route.fare));
        if let Some(distance) = route.distance_km {
            let _ = write!(line, " | {distance} km");
        }
        if let Some(badge) = bookings.and_then(|count| self.popularity_badge(count)) {
            let _ = write!(line, " | {badge}");
        }
        line
    }
}

impl std::fmt::Debug for RouteSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSearch")
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn summary_with_bookings(
    route: &RouteRecord,
    bus: Option<&BusRecord>,
    bookings: Option<u64>,
) -> RouteSummary {
    let summary = RouteSummary::new(route, bus);
    match bookings {
        Some(count) => summary.with_bookings(count),
        None => summary,
    }
}
