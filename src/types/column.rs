use std::fmt;

/// A JDBC `java.sql.Types` code identifying a column's SQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeCode(pub i32);

impl TypeCode {
    pub const BIT: TypeCode = TypeCode(-7);
    pub const TINYINT: TypeCode = TypeCode(-6);
    pub const SMALLINT: TypeCode = TypeCode(5);
    pub const INTEGER: TypeCode = TypeCode(4);
    pub const BIGINT: TypeCode = TypeCode(-5);
    pub const FLOAT: TypeCode = TypeCode(6);
    pub const REAL: TypeCode = TypeCode(7);
    pub const DOUBLE: TypeCode = TypeCode(8);
    pub const NUMERIC: TypeCode = TypeCode(2);
    pub const DECIMAL: TypeCode = TypeCode(3);
    pub const CHAR: TypeCode = TypeCode(1);
    pub const VARCHAR: TypeCode = TypeCode(12);
    pub const LONGVARCHAR: TypeCode = TypeCode(-1);
    pub const DATE: TypeCode = TypeCode(91);
    pub const TIME: TypeCode = TypeCode(92);
    pub const TIMESTAMP: TypeCode = TypeCode(93);
    pub const BINARY: TypeCode = TypeCode(-2);
    pub const VARBINARY: TypeCode = TypeCode(-3);
    pub const LONGVARBINARY: TypeCode = TypeCode(-4);
    pub const NULL: TypeCode = TypeCode(0);
    pub const OTHER: TypeCode = TypeCode(1111);
    pub const JAVA_OBJECT: TypeCode = TypeCode(2000);
    pub const STRUCT: TypeCode = TypeCode(2002);
    pub const ARRAY: TypeCode = TypeCode(2003);
    pub const BOOLEAN: TypeCode = TypeCode(16);
    pub const NCHAR: TypeCode = TypeCode(-15);
    pub const NVARCHAR: TypeCode = TypeCode(-9);
    pub const LONGNVARCHAR: TypeCode = TypeCode(-16);

    /// The `java.sql.Types` constant name, if this is a known code.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            TypeCode::BIT => "BIT",
            TypeCode::TINYINT => "TINYINT",
            TypeCode::SMALLINT => "SMALLINT",
            TypeCode::INTEGER => "INTEGER",
            TypeCode::BIGINT => "BIGINT",
            TypeCode::FLOAT => "FLOAT",
            TypeCode::REAL => "REAL",
            TypeCode::DOUBLE => "DOUBLE",
            TypeCode::NUMERIC => "NUMERIC",
            TypeCode::DECIMAL => "DECIMAL",
            TypeCode::CHAR => "CHAR",
            TypeCode::VARCHAR => "VARCHAR",
            TypeCode::LONGVARCHAR => "LONGVARCHAR",
            TypeCode::DATE => "DATE",
            TypeCode::TIME => "TIME",
            TypeCode::TIMESTAMP => "TIMESTAMP",
            TypeCode::BINARY => "BINARY",
            TypeCode::VARBINARY => "VARBINARY",
            TypeCode::LONGVARBINARY => "LONGVARBINARY",
            TypeCode::NULL => "NULL",
            TypeCode::OTHER => "OTHER",
            TypeCode::JAVA_OBJECT => "JAVA_OBJECT",
            TypeCode::STRUCT => "STRUCT",
            TypeCode::ARRAY => "ARRAY",
            TypeCode::BOOLEAN => "BOOLEAN",
            TypeCode::NCHAR => "NCHAR",
            TypeCode::NVARCHAR => "NVARCHAR",
            TypeCode::LONGNVARCHAR => "LONGNVARCHAR",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "TYPE({})", self.0),
        }
    }
}

impl From<i32> for TypeCode {
    fn from(code: i32) -> Self {
        TypeCode(code)
    }
}

/// JDBC `ResultSetMetaData.isNullable` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nullability {
    NoNulls = 0,
    Nullable = 1,
    Unknown = 2,
}

impl Nullability {
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Column metadata exactly as a driver reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,
    pub type_code: TypeCode,
    pub display_size: i32,
    pub precision: i32,
    pub scale: i32,
    pub nullable: Nullability,
}

impl ColumnMetadata {
    pub fn new(name: impl Into<String>, type_code: TypeCode) -> Self {
        Self {
            name: name.into(),
            type_code,
            display_size: 0,
            precision: 0,
            scale: 0,
            nullable: Nullability::Unknown,
        }
    }

    pub fn display_size(mut self, display_size: i32) -> Self {
        self.display_size = display_size;
        self
    }

    pub fn precision(mut self, precision: i32) -> Self {
        self.precision = precision;
        self
    }

    pub fn scale(mut self, scale: i32) -> Self {
        self.scale = scale;
        self
    }

    pub fn nullable(mut self, nullable: Nullability) -> Self {
        self.nullable = nullable;
        self
    }
}

/// One entry of `Cursor::description`, in the fixed DB-API layout
/// `(name, type_code, display_size, internal_size, precision, scale, null_ok)`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescription {
    pub name: String,
    pub type_code: TypeCode,
    pub display_size: Option<i32>,
    /// Never reported.
    pub internal_size: Option<i32>,
    pub precision: Option<i32>,
    pub scale: Option<i32>,
    pub null_ok: Option<Nullability>,
}

impl ColumnDescription {
    pub fn new(
        name: impl Into<String>,
        type_code: TypeCode,
        display_size: i32,
        precision: i32,
        scale: i32,
        null_ok: Nullability,
    ) -> Self {
        Self {
            name: name.into(),
            type_code,
            display_size: Some(display_size),
            internal_size: None,
            precision: Some(precision),
            scale: Some(scale),
            null_ok: Some(null_ok),
        }
    }

    /// The description as a positional tuple of raw codes.
    #[allow(clippy::type_complexity)]
    pub fn as_tuple(
        &self,
    ) -> (
        &str,
        i32,
        Option<i32>,
        Option<i32>,
        Option<i32>,
        Option<i32>,
        Option<i32>,
    ) {
        (
            &self.name,
            self.type_code.0,
            self.display_size,
            self.internal_size,
            self.precision,
            self.scale,
            self.null_ok.map(Nullability::code),
        )
    }
}
