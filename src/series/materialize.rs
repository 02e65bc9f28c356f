//! Typed materialization of result sets
//!
//! A target type describes its writable members once, as a map from member
//! name to a typed assignment closure. The map is compiled on first use and
//! kept in a process-wide cache keyed by the target type, so each later call
//! only resolves columns to setters once per result set and then runs the
//! closures row by row.
//!
//! ```rust
//! use influx_series::series::{materialize, FromSerie, Serie, Setters};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Position {
//!     lat: f64,
//!     lng: f64,
//! }
//!
//! impl FromSerie for Position {
//!     fn register(setters: &mut Setters<Self>) {
//!         setters
//!             .field("lat", |p: &mut Self, v: f64| p.lat = v)
//!             .field("lng", |p: &mut Self, v: f64| p.lng = v);
//!     }
//! }
//!
//! let serie = Serie::new(["time", "Lat", "Lng"]).row(vec![
//!     json!("2024-01-01T00:00:00Z"),
//!     json!(31.2),
//!     json!(121.5),
//! ]);
//! let rows: Vec<Position> = materialize(&serie).unwrap();
//! assert_eq!(rows[0].lng, 121.5);
//! ```

use crate::series::convert::{convert, parse_enum, ConvertError, FromValue};
use crate::series::error::{MaterializeError, MaterializeResult};
use crate::series::types::{Serie, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::debug;

/// Assigns one untyped value to one member
pub type Setter<T> = Box<dyn Fn(&mut T, &Value) -> Result<(), ConvertError> + Send + Sync>;

/// Member setters of a target type, looked up case-insensitively
pub struct Setters<T> {
    setters: HashMap<String, Setter<T>>,
}

impl<T> Setters<T> {
    /// Create an empty setter map
    pub fn new() -> Self {
        Self {
            setters: HashMap::new(),
        }
    }

    /// Register a member converted through [`FromValue`].
    ///
    /// Nulls leave the member at its default unless the member type is an
    /// `Option`, in which case it is set to `None`.
    pub fn field<V, F>(&mut self, name: &str, assign: F) -> &mut Self
    where
        V: FromValue + 'static,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.insert(
            name,
            Box::new(move |target, value| {
                if let Some(value) = convert::<V>(value)? {
                    assign(target, value);
                }
                Ok(())
            }),
        )
    }

    /// Register an enumeration member parsed from its string representation
    pub fn enum_field<E, F>(&mut self, name: &str, assign: F) -> &mut Self
    where
        E: FromStr + 'static,
        E::Err: Display,
        F: Fn(&mut T, E) + Send + Sync + 'static,
    {
        self.insert(
            name,
            Box::new(move |target, value| {
                if !value.is_null() {
                    assign(target, parse_enum::<E>(value)?);
                }
                Ok(())
            }),
        )
    }

    /// Register a raw setter
    pub fn insert(&mut self, name: &str, setter: Setter<T>) -> &mut Self {
        self.setters.insert(name.to_lowercase(), setter);
        self
    }

    /// Setter for a member, ignoring case
    pub fn get(&self, name: &str) -> Option<&Setter<T>> {
        self.setters.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.setters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.setters.is_empty()
    }
}

impl<T> Default for Setters<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A type that rows can be materialized into
pub trait FromSerie: Default + 'static {
    /// Describe the writable members
    fn register(setters: &mut Setters<Self>);
}

type SetterCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static SETTER_CACHE: OnceLock<SetterCache> = OnceLock::new();

/// Compiled setters for `T`, built on first use.
///
/// Concurrent first calls may each compile the map; the first one stored wins
/// and the others are dropped.
pub fn setters<T: FromSerie>() -> Arc<Setters<T>> {
    let cache = SETTER_CACHE.get_or_init(Default::default);
    let id = TypeId::of::<T>();

    let cached = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned();
    if let Some(setters) = cached.and_then(|entry| entry.downcast::<Setters<T>>().ok()) {
        return setters;
    }

    let mut built = Setters::new();
    T::register(&mut built);
    debug!(
        target_type = std::any::type_name::<T>(),
        members = built.len(),
        "Compiled setter map"
    );
    let built = Arc::new(built);

    let entry = cache
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(id)
        .or_insert_with(|| built.clone() as Arc<dyn Any + Send + Sync>)
        .clone();
    entry.downcast::<Setters<T>>().unwrap_or(built)
}

/// Materialize every row of a result set.
///
/// Each row starts from `T::default()`; tags are applied first, then columns
/// in column order. Tags and columns without a matching member are skipped.
/// The first conversion failure aborts the whole set.
pub fn materialize<T: FromSerie>(serie: &Serie) -> MaterializeResult<Vec<T>> {
    let setters = setters::<T>();

    let tags: Vec<(&str, Value, &Setter<T>)> = serie
        .tags
        .iter()
        .filter_map(|(key, value)| {
            setters
                .get(key)
                .map(|setter| (key.as_str(), Value::String(value.clone()), setter))
        })
        .collect();

    let columns: Vec<Option<&Setter<T>>> = serie
        .columns
        .iter()
        .map(|column| setters.get(column))
        .collect();

    let mut rows = Vec::with_capacity(serie.values.len());
    for row in &serie.values {
        let mut item = T::default();

        for (key, value, setter) in &tags {
            setter(&mut item, value).map_err(|source| MaterializeError::Convert {
                member: key.to_string(),
                source,
            })?;
        }

        for (index, value) in row.iter().enumerate() {
            let Some(Some(setter)) = columns.get(index) else {
                continue;
            };
            setter(&mut item, value).map_err(|source| MaterializeError::Convert {
                member: serie.columns[index].clone(),
                source,
            })?;
        }

        rows.push(item);
    }

    Ok(rows)
}

/// Materialize several result sets, preserving set order then row order
pub fn materialize_all<T: FromSerie>(series: &[Serie]) -> MaterializeResult<Vec<T>> {
    let mut rows = Vec::new();
    for serie in series {
        rows.extend(materialize::<T>(serie)?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    enum NavStatus {
        #[default]
        UnderWay,
        Anchored,
        Moored,
    }

    impl FromStr for NavStatus {
        type Err = String;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "UnderWay" | "0" => Ok(Self::UnderWay),
                "Anchored" | "1" => Ok(Self::Anchored),
                "Moored" | "5" => Ok(Self::Moored),
                other => Err(format!("unknown navigation status {}", other)),
            }
        }
    }

    #[derive(Debug, Default)]
    struct ShipTrack {
        time: Option<DateTime<Utc>>,
        mmsi: String,
        speed: f64,
        course: Option<f32>,
        heading: u16,
        draught: Decimal,
        status: NavStatus,
    }

    impl FromSerie for ShipTrack {
        fn register(setters: &mut Setters<Self>) {
            setters
                .field("time", |t: &mut Self, v: Option<DateTime<Utc>>| t.time = v)
                .field("MMSI", |t: &mut Self, v: String| t.mmsi = v)
                .field("speed", |t: &mut Self, v: f64| t.speed = v)
                .field("course", |t: &mut Self, v: Option<f32>| t.course = v)
                .field("heading", |t: &mut Self, v: u16| t.heading = v)
                .field("draught", |t: &mut Self, v: Decimal| t.draught = v)
                .enum_field("NavStatus", |t: &mut Self, v: NavStatus| t.status = v);
        }
    }

    fn track_serie() -> Serie {
        Serie::new(["time", "speed", "course", "heading", "draught", "unknown"])
            .name("ShipTrack")
            .tag("mmsi", "413000000")
            .tag("navStatus", "Moored")
            .row(vec![
                json!("2024-01-01T00:00:00Z"),
                json!(12.5),
                json!(90.0),
                json!(91),
                json!("7.25"),
                json!("ignored"),
            ])
            .row(vec![
                json!("2024-01-01T00:01:00Z"),
                json!(3),
                Value::Null,
                Value::Null,
                json!(8.1),
                Value::Null,
            ])
    }

    #[test]
    fn test_materialize_tags_and_columns() {
        let rows: Vec<ShipTrack> = materialize(&track_serie()).unwrap();
        assert_eq!(rows.len(), 2);

        let first = &rows[0];
        assert_eq!(
            first.time,
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(first.mmsi, "413000000");
        assert_eq!(first.status, NavStatus::Moored);
        assert_eq!(first.speed, 12.5);
        assert_eq!(first.course, Some(90.0));
        assert_eq!(first.heading, 91);
        assert_eq!(first.draught, Decimal::new(725, 2));

        let second = &rows[1];
        assert_eq!(second.speed, 3.0);
        assert_eq!(second.course, None);
        assert_eq!(second.heading, 0);
        assert_eq!(second.draught, Decimal::new(81, 1));
        assert_eq!(second.mmsi, "413000000");
    }

    #[test]
    fn test_columns_override_tags() {
        let serie = Serie::new(["mmsi"])
            .tag("MMSI", "from-tag")
            .row(vec![json!("from-column")]);

        let rows: Vec<ShipTrack> = materialize(&serie).unwrap();
        assert_eq!(rows[0].mmsi, "from-column");
    }

    #[test]
    fn test_enum_from_number() {
        let serie = Serie::new(["navstatus"]).row(vec![json!(1)]);
        let rows: Vec<ShipTrack> = materialize(&serie).unwrap();
        assert_eq!(rows[0].status, NavStatus::Anchored);
    }

    #[test]
    fn test_conversion_failure_aborts_the_set() {
        let serie = Serie::new(["heading"])
            .row(vec![json!(10)])
            .row(vec![json!(70000)])
            .row(vec![json!(20)]);

        let err = materialize::<ShipTrack>(&serie).unwrap_err();
        match err {
            MaterializeError::Convert { member, source } => {
                assert_eq!(member, "heading");
                assert!(matches!(source, ConvertError::OutOfRange { .. }));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_materialize_all_preserves_order() {
        let a = Serie::new(["speed"]).row(vec![json!(1)]).row(vec![json!(2)]);
        let b = Serie::new(["speed"]).row(vec![json!(3)]);

        let rows: Vec<ShipTrack> = materialize_all(&[a, b]).unwrap();
        let speeds: Vec<f64> = rows.iter().map(|r| r.speed).collect();
        assert_eq!(speeds, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_setter_map_is_cached() {
        let first = setters::<ShipTrack>();
        let second = setters::<ShipTrack>();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 7);
        assert!(first.get("mmsi").is_some());
        assert!(first.get("NAVSTATUS").is_some());
    }

    #[test]
    fn test_setter_cache_across_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(setters::<ShipTrack>))
            .collect();
        let maps: Vec<Arc<Setters<ShipTrack>>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        for map in &maps {
            assert!(Arc::ptr_eq(map, &maps[0]));
        }
    }
}
