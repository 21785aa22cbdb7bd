//! Common test utilities and fixture helpers.
//!
//! The in-memory network built by [`fixture_store`] mirrors
//! `docs/fixtures/transit_fixture.sql`, so tests can run the same scenarios
//! against either backend.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use busroute_lib::model::{BusId, RouteId};
use busroute_lib::{
    BusRecord, ConversationEngine, Error, InMemoryStore, LiveLocation, Result, RouteRecord,
    StopRecord, TransitStore,
};
use chrono::NaiveDate;
use rusqlite::Connection;

/// Path to fixtures directory used by tests.
#[allow(dead_code)]
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

/// Build a SQLite database from the SQL fixture inside `dir`.
#[allow(dead_code)]
pub fn fixture_database(dir: &Path) -> PathBuf {
    let sql = std::fs::read_to_string(fixtures_dir().join("transit_fixture.sql"))
        .expect("read transit_fixture.sql");
    let path = dir.join("transit.db");
    let connection = Connection::open(&path).expect("create fixture database");
    connection.execute_batch(&sql).expect("load fixture SQL");
    path
}

/// In-memory copy of the fixture network.
pub fn fixture_store() -> InMemoryStore {
    let updated = NaiveDate::from_ymd_opt(2025, 1, 15)
        .and_then(|date| date.and_hms_opt(9, 30, 0))
        .expect("valid timestamp");

    InMemoryStore::new()
        .with_bus(BusRecord::new(1, "DTC-001", "AC"))
        .with_bus(BusRecord::new(2, "DTC-078", "Non-AC"))
        .with_bus(BusRecord::new(3, "DTC-150", "Electric AC"))
        .with_bus(BusRecord {
            is_active: false,
            ..BusRecord::new(4, "DTC-200", "Standard")
        })
        .with_route(
            RouteRecord::new(1, "001", "Connaught Place", "IGI Airport", 50.0)
                .with_distance(18.5)
                .with_duration(45)
                .with_bus(1),
        )
        .with_route(
            RouteRecord::new(2, "002", "Connaught Place", "IGI Airport", 25.0)
                .with_distance(20.0)
                .with_duration(60)
                .with_bus(2),
        )
        .with_route(
            RouteRecord::new(3, "025A", "Kashmere Gate", "Dwarka Sector 21", 30.0)
                .with_distance(24.0)
                .with_duration(70)
                .with_bus(3),
        )
        .with_route(
            RouteRecord::new(4, "118", "Connaught Place", "Dwarka Sector 21", 35.0)
                .with_distance(28.0),
        )
        .with_route(
            RouteRecord::new(5, "534", "Anand Vihar ISBT", "Noida City Centre", 20.0)
                .with_distance(12.0)
                .with_duration(35)
                .with_bus(1),
        )
        .with_route(
            RouteRecord::new(6, "999", "Mehrauli", "Badarpur Border", 15.0)
                .with_distance(14.0)
                .with_duration(40)
                .inactive(),
        )
        .with_route(
            RouteRecord::new(7, "740", "Hauz Khas", "Saket District Centre", 10.0)
                .with_distance(5.0)
                .with_duration(20),
        )
        .with_stops(1, ["Dhaula Kuan", "Mahipalpur"])
        .with_stops(
            3,
            [
                "Tis Hazari",
                "Karol Bagh",
                "Rajendra Place",
                "Patel Nagar",
                "Kirti Nagar",
                "Janakpuri West",
                "Uttam Nagar",
            ],
        )
        .with_stops(4, ["Karol Bagh"])
        .with_bookings(1, 12)
        .with_bookings(2, 6)
        .with_bookings(3, 2)
        .with_live_location(LiveLocation {
            bus_id: 1,
            latitude: 28.6315,
            longitude: 77.2167,
            speed_kmh: Some(32.5),
            last_updated: updated,
        })
}

#[allow(dead_code)]
pub fn fixture_engine() -> ConversationEngine {
    let store: Arc<dyn TransitStore> = Arc::new(fixture_store());
    ConversationEngine::with_store(store)
}

/// Fixture network whose reads can be switched off between turns.
#[allow(dead_code)]
pub struct FlakyStore {
    inner: InMemoryStore,
    offline: AtomicBool,
    bus_lookups_fail: bool,
}

#[allow(dead_code)]
impl FlakyStore {
    pub fn new() -> Self {
        Self {
            inner: fixture_store(),
            offline: AtomicBool::new(false),
            bus_lookups_fail: false,
        }
    }

    /// Make every `get_bus` call fail while other reads succeed.
    pub fn failing_bus_lookups() -> Self {
        Self {
            bus_lookups_fail: true,
            ..Self::new()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(Error::store("offline"))
        } else {
            Ok(())
        }
    }
}

impl TransitStore for FlakyStore {
    fn list_active_routes(&self) -> Result<Vec<RouteRecord>> {
        self.check()?;
        self.inner.list_active_routes()
    }
    fn list_stops_for_route(&self, route_id: RouteId) -> Result<Vec<StopRecord>> {
        self.check()?;
        self.inner.list_stops_for_route(route_id)
    }
    fn get_bus(&self, bus_id: BusId) -> Result<Option<BusRecord>> {
        self.check()?;
        if self.bus_lookups_fail {
            return Err(Error::store("bus table locked"));
        }
        self.inner.get_bus(bus_id)
    }
    fn count_bookings_for_route(&self, route_id: RouteId) -> Result<u64> {
        self.check()?;
        self.inner.count_bookings_for_route(route_id)
    }
    fn find_route_by_number(&self, number: &str) -> Result<Option<RouteRecord>> {
        self.check()?;
        self.inner.find_route_by_number(number)
    }
    fn find_bus_by_number(&self, number: &str) -> Result<Option<BusRecord>> {
        self.check()?;
        self.inner.find_bus_by_number(number)
    }
    fn list_buses(&self) -> Result<Vec<BusRecord>> {
        self.check()?;
        self.inner.list_buses()
    }
    fn count_bookings(&self) -> Result<u64> {
        self.check()?;
        self.inner.count_bookings()
    }
    fn live_location(&self, bus_id: BusId) -> Result<Option<LiveLocation>> {
        self.check()?;
        self.inner.live_location(bus_id)
    }
    fn count_live_locations(&self) -> Result<u64> {
        self.check()?;
        self.inner.count_live_locations()
    }
}
