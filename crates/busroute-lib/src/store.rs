//! Read access to the transit records owned by the external store.
//!
//! The engine depends only on [`TransitStore`]. Two backends ship with the
//! crate: [`InMemoryStore`] for tests and embedding, and
//! [`SqliteStore`](crate::db::SqliteStore) for a read-only SQLite database.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{BusId, BusRecord, LiveLocation, RouteId, RouteRecord, StopRecord};

/// Read-only collaborator contract for routes, stops, buses and bookings.
pub trait TransitStore: Send + Sync {
    /// All routes with `is_active` set.
    fn list_active_routes(&self) -> Result<Vec<RouteRecord>>;

    /// Stops for a route ordered by `stop_order`.
    fn list_stops_for_route(&self, route_id: RouteId) -> Result<Vec<StopRecord>>;

    fn get_bus(&self, bus_id: BusId) -> Result<Option<BusRecord>>;

    /// Number of historical bookings that reference the route.
    fn count_bookings_for_route(&self, route_id: RouteId) -> Result<u64>;

    /// Look a route up by number: exact (case-insensitive) first, then partial.
    fn find_route_by_number(&self, number: &str) -> Result<Option<RouteRecord>>;

    /// Look a bus up by number: exact, then partial, then `DTC-<number>`.
    fn find_bus_by_number(&self, number: &str) -> Result<Option<BusRecord>>;

    /// Every bus, active or not, ordered by identifier.
    fn list_buses(&self) -> Result<Vec<BusRecord>>;

    /// Total number of bookings across all routes.
    fn count_bookings(&self) -> Result<u64>;

    fn live_location(&self, bus_id: BusId) -> Result<Option<LiveLocation>>;

    /// Number of buses currently reporting a live position.
    fn count_live_locations(&self) -> Result<u64>;
}

/// Pick the best route for a number query out of an ordered candidate list.
pub(crate) fn match_route_number<'a>(
    routes: impl IntoIterator<Item = &'a RouteRecord> + Clone,
    number: &str,
) -> Option<&'a RouteRecord> {
    let needle = number.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    routes
        .clone()
        .into_iter()
        .find(|route| route.route_number.to_lowercase() == needle)
        .or_else(|| {
            routes
                .into_iter()
                .find(|route| route.route_number.to_lowercase().contains(&needle))
        })
}

/// Pick the best bus for a number query out of an ordered candidate list.
pub(crate) fn match_bus_number<'a>(
    buses: impl IntoIterator<Item = &'a BusRecord> + Clone,
    number: &str,
) -> Option<&'a BusRecord> {
    let needle = number.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let prefixed = format!("dtc-{needle}");
    buses
        .clone()
        .into_iter()
        .find(|bus| {
            let candidate = bus.bus_number.to_lowercase();
            candidate == needle || candidate == prefixed
        })
        .or_else(|| {
            buses
                .into_iter()
                .find(|bus| bus.bus_number.to_lowercase().contains(&needle))
        })
}

/// In-memory [`TransitStore`] backed by plain vectors.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    routes: Vec<RouteRecord>,
    stops: HashMap<RouteId, Vec<StopRecord>>,
    buses: Vec<BusRecord>,
    bookings: HashMap<RouteId, u64>,
    live: HashMap<BusId, LiveLocation>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, route: RouteRecord) -> Self {
        self.routes.push(route);
        self
    }

    /// Attach stops to a route; names are numbered 1..=n in the given order.
    pub fn with_stops<I, S>(mut self, route_id: RouteId, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.stops.entry(route_id).or_default();
        let offset = entry.len() as u32;
        for (index, name) in names.into_iter().enumerate() {
            entry.push(StopRecord::new(route_id, name, offset + index as u32 + 1));
        }
        self
    }

    pub fn with_stop(mut self, stop: StopRecord) -> Self {
        self.stops.entry(stop.route_id).or_default().push(stop);
        self
    }

    pub fn with_bus(mut self, bus: BusRecord) -> Self {
        self.buses.push(bus);
        self
    }

    pub fn with_bookings(mut self, route_id: RouteId, count: u64) -> Self {
        *self.bookings.entry(route_id).or_default() += count;
        self
    }

    pub fn with_live_location(mut self, location: LiveLocation) -> Self {
        self.live.insert(location.bus_id, location);
        self
    }
}

impl TransitStore for InMemoryStore {
    fn list_active_routes(&self) -> Result<Vec<RouteRecord>> {
        Ok(self
            .routes
            .iter()
            .filter(|route| route.is_active)
            .cloned()
            .collect())
    }

    fn list_stops_for_route(&self, route_id: RouteId) -> Result<Vec<StopRecord>> {
        let mut stops = self.stops.get(&route_id).cloned().unwrap_or_default();
        stops.sort_by_key(|stop| stop.stop_order);
        Ok(stops)
    }

    fn get_bus(&self, bus_id: BusId) -> Result<Option<BusRecord>> {
        Ok(self.buses.iter().find(|bus| bus.id == bus_id).cloned())
    }

    fn count_bookings_for_route(&self, route_id: RouteId) -> Result<u64> {
        Ok(self.bookings.get(&route_id).copied().unwrap_or(0))
    }

    fn find_route_by_number(&self, number: &str) -> Result<Option<RouteRecord>> {
        Ok(match_route_number(&self.routes, number).cloned())
    }

    fn find_bus_by_number(&self, number: &str) -> Result<Option<BusRecord>> {
        Ok(match_bus_number(&self.buses, number).cloned())
    }

    fn list_buses(&self) -> Result<Vec<BusRecord>> {
        let mut buses = self.buses.clone();
        buses.sort_by_key(|bus| bus.id);
        Ok(buses)
    }

    fn count_bookings(&self) -> Result<u64> {
        Ok(self.bookings.values().sum())
    }

    fn live_location(&self, bus_id: BusId) -> Result<Option<LiveLocation>> {
        Ok(self.live.get(&bus_id).cloned())
    }

    fn count_live_locations(&self) -> Result<u64> {
        Ok(self.live.len() as u64)
    }
}
