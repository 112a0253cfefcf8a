mod column;
mod driver_value;
mod row;
mod sql_value;

pub use column::{ColumnDescription, ColumnMetadata, Nullability, TypeCode};
pub use driver_value::DriverValue;
pub use row::{Row, Value};
pub use sql_value::{Params, SqlValue};
