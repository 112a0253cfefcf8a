mod driver;

pub use driver::{Driver, DriverSession, ResultSet};
