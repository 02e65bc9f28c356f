//! Column extraction helpers

use crate::series::convert::{convert, FromValue};
use crate::series::error::{MaterializeError, MaterializeResult};
use crate::series::types::{Segment, Serie};
use chrono::{DateTime, Duration, Utc};

/// Column holding the counts of a `COUNT(...) AS COUNT` statement
pub const COUNT_COLUMN: &str = "COUNT";

/// Non-null values of one column across all sets, converted to `V`.
///
/// Sets without the column contribute nothing.
pub fn column_values<V: FromValue>(series: &[Serie], column: &str) -> MaterializeResult<Vec<V>> {
    let mut values = Vec::new();
    for serie in series {
        let Some(index) = serie.column_index(column) else {
            continue;
        };
        for row in &serie.values {
            let Some(value) = row.get(index) else {
                continue;
            };
            let converted = convert::<V>(value).map_err(|source| MaterializeError::Convert {
                member: column.to_string(),
                source,
            })?;
            if let Some(converted) = converted {
                values.push(converted);
            }
        }
    }
    Ok(values)
}

/// Windows with a positive count from a `GROUP BY time(duration)` count
/// statement, read from the [`COUNT_COLUMN`] column
pub fn segments(series: &[Serie], duration: Duration) -> MaterializeResult<Vec<Segment>> {
    segments_by(series, duration, COUNT_COLUMN)
}

/// Same as [`segments`] with an explicit count column
pub fn segments_by(
    series: &[Serie],
    duration: Duration,
    count_column: &str,
) -> MaterializeResult<Vec<Segment>> {
    let mut segments = Vec::new();
    for serie in series {
        let (Some(time_index), Some(count_index)) =
            (serie.column_index("time"), serie.column_index(count_column))
        else {
            continue;
        };

        for row in &serie.values {
            let (Some(time), Some(count)) = (row.get(time_index), row.get(count_index)) else {
                continue;
            };

            let count = convert::<i64>(count)
                .map_err(|source| MaterializeError::Convert {
                    member: count_column.to_string(),
                    source,
                })?
                .unwrap_or(0);
            if count <= 0 {
                continue;
            }

            let Some(start) =
                convert::<DateTime<Utc>>(time).map_err(|source| MaterializeError::Convert {
                    member: "time".to_string(),
                    source,
                })?
            else {
                continue;
            };
            segments.push(Segment::new(start, start + duration, count));
        }
    }
    Ok(segments)
}
