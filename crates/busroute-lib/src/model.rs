//! Read-only transit records consumed by the engine.
//!
//! These mirror the rows owned by the external store. The engine never
//! mutates them; it only filters, ranks, and attributes them.

use chrono::NaiveDateTime;
use serde::Serialize;

/// Numeric identifier for a route.
pub type RouteId = i64;

/// Numeric identifier for a bus.
pub type BusId = i64;

/// A bus service between two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteRecord {
    pub id: RouteId,
    pub route_number: String,
    pub route_name: String,
    pub start_location: String,
    pub end_location: String,
    pub distance_km: Option<f64>,
    pub fare: f64,
    pub estimated_duration_minutes: Option<u32>,
    pub bus_id: Option<BusId>,
    pub is_active: bool,
}

impl RouteRecord {
    /// Create an active route with the required fields; optional fields start empty.
    pub fn new(
        id: RouteId,
        route_number: impl Into<String>,
        start_location: impl Into<String>,
        end_location: impl Into<String>,
        fare: f64,
    ) -> Self {
        let start_location = start_location.into();
        let end_location = end_location.into();
        Self {
            id,
            route_number: route_number.into(),
            route_name: format!("{start_location} - {end_location}"),
            start_location,
            end_location,
            distance_km: None,
            fare,
            estimated_duration_minutes: None,
            bus_id: None,
            is_active: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.route_name = name.into();
        self
    }

    pub fn with_distance(mut self, distance_km: f64) -> Self {
        self.distance_km = Some(distance_km);
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.estimated_duration_minutes = Some(minutes);
        self
    }

    pub fn with_bus(mut self, bus_id: BusId) -> Self {
        self.bus_id = Some(bus_id);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// An intermediate stop on a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopRecord {
    pub route_id: RouteId,
    pub stop_name: String,
    /// 1-based position along the route.
    pub stop_order: u32,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl StopRecord {
    pub fn new(route_id: RouteId, stop_name: impl Into<String>, stop_order: u32) -> Self {
        Self {
            route_id,
            stop_name: stop_name.into(),
            stop_order,
            latitude: None,
            longitude: None,
        }
    }
}

/// A vehicle that may be assigned to routes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusRecord {
    pub id: BusId,
    pub bus_number: String,
    pub registration_number: String,
    pub bus_type: String,
    pub capacity: u32,
    pub is_active: bool,
}

impl BusRecord {
    pub fn new(id: BusId, bus_number: impl Into<String>, bus_type: impl Into<String>) -> Self {
        let bus_number = bus_number.into();
        Self {
            id,
            registration_number: format!("REG-{bus_number}"),
            bus_number,
            bus_type: bus_type.into(),
            capacity: 40,
            is_active: true,
        }
    }

    /// Whether the bus category denotes an air-conditioned vehicle.
    ///
    /// Any type mentioning "AC" counts, except the explicit "Non-AC" family.
    pub fn is_air_conditioned(&self) -> bool {
        let kind = self.bus_type.to_uppercase();
        if !kind.contains("AC") {
            return false;
        }
        let compact: String = kind.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        !compact.contains("NONAC")
    }
}

/// Last reported position of a bus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveLocation {
    pub bus_id: BusId,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: Option<f64>,
    pub last_updated: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_conditioning_is_read_from_bus_type() {
        assert!(BusRecord::new(1, "DTC-001", "AC").is_air_conditioned());
        assert!(BusRecord::new(2, "DTC-002", "Electric AC").is_air_conditioned());
        assert!(!BusRecord::new(3, "DTC-003", "Non-AC").is_air_conditioned());
        assert!(!BusRecord::new(4, "DTC-004", "non ac").is_air_conditioned());
        assert!(!BusRecord::new(5, "DTC-005", "Standard").is_air_conditioned());
    }

    #[test]
    fn route_builder_defaults_name_from_endpoints() {
        let route = RouteRecord::new(7, "534", "Anand Vihar ISBT", "Mehrauli", 25.0);
        assert_eq!(route.route_name, "Anand Vihar ISBT - Mehrauli");
        assert!(route.is_active);
        assert!(route.distance_km.is_none());
    }
}
