//! JSON streaming of result sets
//!
//! Rows are written as flat objects without building an intermediate
//! document: tag pairs first, then the non-null column values in column
//! order. Null values are left out of the object, so two rows of the same set
//! may carry different property sets. A tag whose output name equals a column's
//! output name is dropped so each key appears once, and the column value wins
//! as it does in typed materialization.
//!
//! Every row is checked against the column names before anything is written;
//! a set with a short or long row fails with
//! [`MaterializeError::ColumnMismatch`] and leaves the writer untouched.

use crate::series::error::{MaterializeError, MaterializeResult};
use crate::series::types::{PageResult, Paging, Serie, Value};
use heck::ToLowerCamelCase;
use serde::ser::{SerializeMap, SerializeSeq, SerializeStruct};
use serde::{Serialize, Serializer};
use std::io::Write;

/// Renames tags and columns on output
pub type NameMapper<'a> = &'a (dyn Fn(&str) -> String + Sync);

/// `NavStatus` → `navStatus`, `MMSI` → `mmsi`
pub fn camel_case(name: &str) -> String {
    name.to_lower_camel_case()
}

/// Write the rows of one set as a JSON array
pub fn write_json<W: Write>(
    serie: &Serie,
    writer: W,
    mapper: Option<NameMapper<'_>>,
) -> MaterializeResult<()> {
    let rows = SerieRows::new(serie, mapper)?;
    write_value(&rows, writer)
}

/// Write the rows of several sets as one JSON array, set order then row order
pub fn write_series_json<W: Write>(
    series: &[Serie],
    writer: W,
    mapper: Option<NameMapper<'_>>,
) -> MaterializeResult<()> {
    let rows = SeriesRows::new(series, mapper)?;
    write_value(&rows, writer)
}

/// Write `{"page": {...}, "values": [...]}`
pub fn write_page_json<W: Write>(
    page: &PageResult<Serie>,
    writer: W,
    mapper: Option<NameMapper<'_>>,
) -> MaterializeResult<()> {
    let document = PageDocument {
        page: &page.page,
        values: SeriesRows::new(&page.values, mapper)?,
    };
    write_value(&document, writer)
}

fn write_value<T: Serialize, W: Write>(value: &T, writer: W) -> MaterializeResult<()> {
    let mut serializer = serde_json::Serializer::new(writer);
    value.serialize(&mut serializer)?;
    serializer.into_inner().flush()?;
    Ok(())
}

/// One set with output names resolved up front
struct SerieRows<'a> {
    tags: Vec<(String, &'a str)>,
    columns: Vec<String>,
    values: &'a [Vec<Value>],
}

impl<'a> SerieRows<'a> {
    fn new(serie: &'a Serie, mapper: Option<NameMapper<'_>>) -> MaterializeResult<Self> {
        let names = serie.columns.len();
        if let Some(row) = serie.values.iter().find(|row| row.len() != names) {
            return Err(MaterializeError::ColumnMismatch {
                names,
                values: row.len(),
            });
        }

        let rename = |name: &str| match mapper {
            Some(mapper) => mapper(name),
            None => name.to_string(),
        };

        let columns: Vec<String> = serie.columns.iter().map(|c| rename(c)).collect();
        let tags = serie
            .tags
            .iter()
            .map(|(key, value)| (rename(key), value.as_str()))
            .filter(|(key, _)| !columns.contains(key))
            .collect();

        Ok(Self {
            tags,
            columns,
            values: &serie.values,
        })
    }
}

impl Serialize for SerieRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.values.len()))?;
        for row in self.values {
            seq.serialize_element(&RowObject { rows: self, row })?;
        }
        seq.end()
    }
}

struct RowObject<'a> {
    rows: &'a SerieRows<'a>,
    row: &'a [Value],
}

impl Serialize for RowObject<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (key, value) in &self.rows.tags {
            map.serialize_entry(key, value)?;
        }
        for (name, value) in self.rows.columns.iter().zip(self.row) {
            if !value.is_null() {
                map.serialize_entry(name, value)?;
            }
        }
        map.end()
    }
}

struct SeriesRows<'a> {
    series: Vec<SerieRows<'a>>,
}

impl<'a> SeriesRows<'a> {
    fn new(series: &'a [Serie], mapper: Option<NameMapper<'_>>) -> MaterializeResult<Self> {
        let series = series
            .iter()
            .map(|serie| SerieRows::new(serie, mapper))
            .collect::<MaterializeResult<Vec<_>>>()?;
        Ok(Self { series })
    }
}

impl Serialize for SeriesRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len: usize = self.series.iter().map(|rows| rows.values.len()).sum();
        let mut seq = serializer.serialize_seq(Some(len))?;
        for rows in &self.series {
            for row in rows.values {
                seq.serialize_element(&RowObject { rows, row })?;
            }
        }
        seq.end()
    }
}

struct PageDocument<'a> {
    page: &'a Paging,
    values: SeriesRows<'a>,
}

impl Serialize for PageDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("PageResult", 2)?;
        state.serialize_field("page", self.page)?;
        state.serialize_field("values", &self.values)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn track() -> Serie {
        Serie::new(["time", "Lat", "Speed"])
            .name("ShipTrack")
            .tag("NavStatus", "Moored")
            .row(vec![json!("2024-01-01T00:00:00Z"), json!(31.2), json!(0)])
            .row(vec![json!("2024-01-01T00:01:00Z"), Value::Null, json!(1.5)])
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> MaterializeResult<()>) -> serde_json::Value {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_tag_shadowed_by_column() {
        let serie = Serie::new(["time", "MMSI"])
            .tag("MMSI", "from-tag")
            .tag("NavStatus", "Moored")
            .row(vec![json!("t"), json!("from-column")]);

        let mut out = Vec::new();
        write_json(&serie, &mut out, None).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"[{"NavStatus":"Moored","time":"t","MMSI":"from-column"}]"#
        );

        let serie = Serie::new(["MMSI"])
            .tag("mmsi", "from-tag")
            .row(vec![json!("from-column")]);
        let mut out = Vec::new();
        write_json(&serie, &mut out, Some(&camel_case)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            r#"[{"mmsi":"from-column"}]"#
        );
    }

    #[test]
    fn test_rows_as_flat_objects() {
        let value = render(|out| write_json(&track(), out, None));
        assert_eq!(
            value,
            json!([
                {"NavStatus": "Moored", "time": "2024-01-01T00:00:00Z", "Lat": 31.2, "Speed": 0},
                {"NavStatus": "Moored", "time": "2024-01-01T00:01:00Z", "Speed": 1.5}
            ])
        );
    }

    #[test]
    fn test_tags_precede_columns() {
        let mut out = Vec::new();
        write_json(&track(), &mut out, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(r#"[{"NavStatus":"Moored","time":"#));
    }

    #[test]
    fn test_name_mapper() {
        let value = render(|out| write_json(&track(), out, Some(&camel_case)));
        assert_eq!(value[0]["navStatus"], json!("Moored"));
        assert_eq!(value[0]["lat"], json!(31.2));
        assert!(value[0].get("Lat").is_none());
    }

    #[test]
    fn test_column_mismatch_writes_nothing() {
        let serie = Serie::new(["time", "lat"])
            .row(vec![json!("2024-01-01T00:00:00Z"), json!(1)])
            .row(vec![json!("2024-01-01T00:01:00Z")]);

        let mut out = Vec::new();
        let err = write_json(&serie, &mut out, None).unwrap_err();
        assert!(matches!(
            err,
            MaterializeError::ColumnMismatch { names: 2, values: 1 }
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_series_are_flattened() {
        let a = Serie::new(["v"]).row(vec![json!(1)]);
        let b = Serie::new(["v"]).tag("host", "b").row(vec![json!(2)]);

        let value = render(|out| write_series_json(&[a, b], out, None));
        assert_eq!(value, json!([{"v": 1}, {"host": "b", "v": 2}]));
    }

    #[test]
    fn test_page_document() {
        let page = PageResult::new(Paging::new(1, 1).with_total(2), vec![track()]);
        let value = render(|out| write_page_json(&page, out, None));

        assert_eq!(
            value["page"],
            json!({"page": 1, "pages": 2, "pageSize": 1, "total": 2})
        );
        assert_eq!(value["values"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_empty_set() {
        let value = render(|out| write_json(&Serie::new(["time"]), out, None));
        assert_eq!(value, json!([]));
    }
}
