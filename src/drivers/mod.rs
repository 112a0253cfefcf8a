mod postgres;

pub use self::in_memory_test::{
    athena_column, InMemoryResponse, InMemoryTestDriver, InMemoryTestResponseBuilder,
};
pub use self::postgres::PostgresDriver;
