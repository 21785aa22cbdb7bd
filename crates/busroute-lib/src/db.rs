use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDateTime;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::{BusId, BusRecord, LiveLocation, RouteId, RouteRecord, StopRecord};
use crate::store::{match_bus_number, match_route_number, TransitStore};

const ROUTE_COLUMNS: &str = "id, route_number, route_name, start_location, end_location, \
     distance_km, fare, estimated_duration_minutes, bus_id, is_active";
const STOP_COLUMNS: &str = "route_id, stop_name, stop_order, latitude, longitude";
const BUS_COLUMNS: &str = "id, bus_number, registration_number, bus_type, capacity, is_active";

/// Timestamp layouts accepted for `live_bus_locations.last_updated`.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Tables the store can read, detected when the database is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SchemaSupport {
    bookings: bool,
    live_locations: bool,
}

/// Read-only [`TransitStore`] over a SQLite database.
///
/// The `routes`, `stops` and `buses` tables are required. `bookings` and
/// `live_bus_locations` are optional; when missing, counts read as zero and
/// live positions as absent.
pub struct SqliteStore {
    connection: Mutex<Connection>,
    schema: SchemaSupport,
}

impl SqliteStore {
    /// Open a database file read-only and verify its schema.
    pub fn open(db_path: &Path) -> Result<Self> {
        if !db_path.exists() {
            return Err(Error::DatabaseNotFound {
                path: db_path.to_path_buf(),
            });
        }
        let connection = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!(path = %db_path.display(), "opening transit database");
        Self::from_connection(connection)
    }

    /// Wrap an existing connection, verifying its schema.
    pub fn from_connection(connection: Connection) -> Result<Self> {
        let schema = detect_schema(&connection)?;
        debug!(
            bookings = schema.bookings,
            live_locations = schema.live_locations,
            "transit schema detected"
        );
        Ok(Self {
            connection: Mutex::new(connection),
            schema,
        })
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn query_routes(&self, filter: &str) -> Result<Vec<RouteRecord>> {
        let sql = format!("SELECT {ROUTE_COLUMNS} FROM routes {filter} ORDER BY id");
        let connection = self.connection();
        let mut stmt = connection.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_route)?;

        let mut routes = Vec::new();
        let mut skipped = 0usize;
        for entry in rows {
            let route = entry?;
            if route.fare < 0.0 || !route.fare.is_finite() {
                skipped += 1;
                continue;
            }
            routes.push(route);
        }
        if skipped > 0 {
            warn!(skipped, "ignored routes with invalid fares");
        }
        Ok(routes)
    }

    fn query_buses(&self) -> Result<Vec<BusRecord>> {
        let sql = format!("SELECT {BUS_COLUMNS} FROM buses ORDER BY id");
        let connection = self.connection();
        let mut stmt = connection.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_bus)?;
        let mut buses = Vec::new();
        for entry in rows {
            buses.push(entry?);
        }
        Ok(buses)
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("bookings", &self.schema.bookings)
            .field("live_locations", &self.schema.live_locations)
            .finish()
    }
}

impl TransitStore for SqliteStore {
    fn list_active_routes(&self) -> Result<Vec<RouteRecord>> {
        self.query_routes("WHERE COALESCE(is_active, 1) != 0")
    }

    fn list_stops_for_route(&self, route_id: RouteId) -> Result<Vec<StopRecord>> {
        let sql =
            format!("SELECT {STOP_COLUMNS} FROM stops WHERE route_id = ?1 ORDER BY stop_order");
        let connection = self.connection();
        let mut stmt = connection.prepare(&sql)?;
        let rows = stmt.query_map([route_id], row_to_stop)?;
        let mut stops = Vec::new();
        for entry in rows {
            stops.push(entry?);
        }
        Ok(stops)
    }

    fn get_bus(&self, bus_id: BusId) -> Result<Option<BusRecord>> {
        let sql = format!("SELECT {BUS_COLUMNS} FROM buses WHERE id = ?1");
        let connection = self.connection();
        let bus = connection
            .query_row(&sql, [bus_id], row_to_bus)
            .optional()?;
        Ok(bus)
    }

    fn count_bookings_for_route(&self, route_id: RouteId) -> Result<u64> {
        if !self.schema.bookings {
            return Ok(0);
        }
        let connection = self.connection();
        let count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM bookings WHERE route_id = ?1",
            [route_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }

    fn find_route_by_number(&self, number: &str) -> Result<Option<RouteRecord>> {
        let routes = self.query_routes("")?;
        Ok(match_route_number(&routes, number).cloned())
    }

    fn find_bus_by_number(&self, number: &str) -> Result<Option<BusRecord>> {
        let buses = self.query_buses()?;
        Ok(match_bus_number(&buses, number).cloned())
    }

    fn list_buses(&self) -> Result<Vec<BusRecord>> {
        self.query_buses()
    }

    fn count_bookings(&self) -> Result<u64> {
        if !self.schema.bookings {
            return Ok(0);
        }
        let connection = self.connection();
        let count: i64 =
            connection.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    fn live_location(&self, bus_id: BusId) -> Result<Option<LiveLocation>> {
        if !self.schema.live_locations {
            return Ok(None);
        }
        let connection = self.connection();
        let row = connection
            .query_row(
                "SELECT bus_id, latitude, longitude, speed, last_updated \
                 FROM live_bus_locations WHERE bus_id = ?1 \
                 ORDER BY last_updated DESC LIMIT 1",
                [bus_id],
                |row| {
                    Ok((
                        row.get::<_, BusId>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((bus_id, latitude, longitude, speed_kmh, raw_timestamp)) = row else {
            return Ok(None);
        };
        let last_updated = parse_timestamp(&raw_timestamp).ok_or_else(|| Error::InvalidRecord {
            entity: "live_bus_location",
            id: bus_id,
            message: format!("unparseable timestamp '{raw_timestamp}'"),
        })?;

        Ok(Some(LiveLocation {
            bus_id,
            latitude,
            longitude,
            speed_kmh,
            last_updated,
        }))
    }

    fn count_live_locations(&self) -> Result<u64> {
        if !self.schema.live_locations {
            return Ok(0);
        }
        let connection = self.connection();
        let count: i64 = connection.query_row(
            "SELECT COUNT(DISTINCT bus_id) FROM live_bus_locations",
            [],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as u64)
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw.trim(), format).ok())
}

fn row_to_route(row: &Row<'_>) -> rusqlite::Result<RouteRecord> {
    Ok(RouteRecord {
        id: row.get(0)?,
        route_number: row.get(1)?,
        route_name: row.get(2)?,
        start_location: row.get(3)?,
        end_location: row.get(4)?,
        distance_km: row.get(5)?,
        fare: row.get(6)?,
        estimated_duration_minutes: row.get(7)?,
        bus_id: row.get(8)?,
        is_active: row.get::<_, Option<bool>>(9)?.unwrap_or(true),
    })
}

fn row_to_stop(row: &Row<'_>) -> rusqlite::Result<StopRecord> {
    Ok(StopRecord {
        route_id: row.get(0)?,
        stop_name: row.get(1)?,
        stop_order: row.get(2)?,
        latitude: row.get(3)?,
        longitude: row.get(4)?,
    })
}

fn row_to_bus(row: &Row<'_>) -> rusqlite::Result<BusRecord> {
    Ok(BusRecord {
        id: row.get(0)?,
        bus_number: row.get(1)?,
        registration_number: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        bus_type: row
            .get::<_, Option<String>>(3)?
            .unwrap_or_else(|| "Standard".to_string()),
        capacity: row.get(4)?,
        is_active: row.get::<_, Option<bool>>(5)?.unwrap_or(true),
    })
}

fn detect_schema(connection: &Connection) -> Result<SchemaSupport> {
    let required: [(&str, &[&str]); 3] = [
        (
            "routes",
            &[
                "id",
                "route_number",
                "route_name",
                "start_location",
                "end_location",
                "distance_km",
                "fare",
                "estimated_duration_minutes",
                "bus_id",
                "is_active",
            ],
        ),
        (
            "stops",
            &["route_id", "stop_name", "stop_order", "latitude", "longitude"],
        ),
        (
            "buses",
            &[
                "id",
                "bus_number",
                "registration_number",
                "bus_type",
                "capacity",
                "is_active",
            ],
        ),
    ];

    for (table, columns) in required {
        if !table_exists(connection, table)? || !table_has_columns(connection, table, columns)? {
            return Err(Error::UnsupportedSchema);
        }
    }

    let bookings = table_exists(connection, "bookings")?
        && table_has_columns(connection, "bookings", &["route_id"])?;
    let live_locations = table_exists(connection, "live_bus_locations")?
        && table_has_columns(
            connection,
            "live_bus_locations",
            &["bus_id", "latitude", "longitude", "speed", "last_updated"],
        )?;

    Ok(SchemaSupport {
        bookings,
        live_locations,
    })
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let mut stmt = connection
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

fn table_has_columns(connection: &Connection, table: &str, required: &[&str]) -> Result<bool> {
    let pragma = format!("PRAGMA table_info('{table}')");
    let mut stmt = connection.prepare(&pragma)?;
    let mut rows = stmt.query([])?;

    let mut columns = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        columns.push(name);
    }

    Ok(required.iter().all(|required| {
        columns
            .iter()
            .any(|column| column.eq_ignore_ascii_case(required))
    }))
}
