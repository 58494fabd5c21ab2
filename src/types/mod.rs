mod row;
mod sql_value;
mod timestamp;

pub use self::row::{QueryResult, RawQueryResult, Row};
pub use self::sql_value::SqlValue;
pub use self::timestamp::{
    instant_eq, strict_eq, truncate_to_micros, TimestampValue, Timestamptz,
};
