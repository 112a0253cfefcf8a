use athenars::drivers::{InMemoryResponse, InMemoryTestDriver, InMemoryTestResponseBuilder};
use athenars::error::ErrorKind;
use athenars::types::{ColumnDescription, DriverValue, Nullability, Row, TypeCode, Value};
use athenars::{connect, named_params, params, row, ConnectOptions, Connection, DriverError, Error};
use chrono::NaiveDate;

const SCHEMA: &str = "test_athenars_schema";

fn one_row() -> InMemoryResponse {
    InMemoryTestResponseBuilder::new()
        .column("number_of_rows", TypeCode::INTEGER)
        .row(vec![1.into()])
        .build()
}

fn many_rows(n: i64) -> InMemoryResponse {
    InMemoryTestResponseBuilder::new()
        .column("a", TypeCode::INTEGER)
        .rows((0..n).map(|i| vec![DriverValue::Int(i)]))
        .build()
}

fn open(driver: &InMemoryTestDriver) -> Connection {
    connect(driver, ConnectOptions::new().schema_name(SCHEMA)).unwrap()
}

#[test]
fn test_fetchone() {
    let driver = InMemoryTestDriver::new().with_response(one_row());
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT * FROM one_row", ()).unwrap();
    assert_eq!(cursor.row_number(), Some(0));
    assert_eq!(cursor.fetch_one().unwrap(), Some(row![1]));
    assert_eq!(cursor.row_number(), Some(1));
    assert_eq!(cursor.fetch_one().unwrap(), None);
    assert_eq!(cursor.fetch_one().unwrap(), None);
    assert_eq!(cursor.row_number(), Some(1));
}

#[test]
fn test_fetchall() {
    let driver = InMemoryTestDriver::new().with_responses([one_row(), many_rows(10_000)]);
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    let rows = cursor.execute("SELECT * FROM one_row", ()).unwrap().fetch_all().unwrap();
    assert_eq!(rows, vec![row![1]]);

    cursor.execute("SELECT a FROM many_rows ORDER BY a", ()).unwrap();
    let expected: Vec<Row> = (0..10_000i64).map(|i| row![i]).collect();
    assert_eq!(cursor.fetch_all().unwrap(), expected);
    assert_eq!(cursor.row_number(), Some(10_000));

    // one page plus EOF, then ten pages of 1000 plus EOF
    assert_eq!(driver.fetch_calls(), 13);
}

#[test]
fn test_null_param() {
    let driver = InMemoryTestDriver::new().with_response(
        InMemoryTestResponseBuilder::new()
            .column("_col0", TypeCode::VARCHAR)
            .row(vec![DriverValue::Null])
            .build(),
    );
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor
        .execute("SELECT {0:s} FROM one_row", params![None::<&str>])
        .unwrap();
    driver.assert_last_query("SELECT null FROM one_row");
    assert_eq!(cursor.fetch_all().unwrap(), vec![row![None::<i64>]]);
}

#[test]
fn test_iterator() {
    let driver = InMemoryTestDriver::new().with_response(one_row());
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT * FROM one_row", ()).unwrap();
    let rows = (&mut cursor)
        .into_iter()
        .collect::<athenars::Result<Vec<_>>>()
        .unwrap();
    assert_eq!(rows, vec![row![1]]);
    assert!(cursor.rows().next().is_none());
}

#[test]
fn test_iterator_without_result_stops_after_error() {
    let driver = InMemoryTestDriver::new();
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    let mut rows = cursor.rows();
    assert!(matches!(rows.next(), Some(Err(Error::Programming(_)))));
    assert!(rows.next().is_none());
}

#[test]
fn test_description_initial() {
    let driver = InMemoryTestDriver::new();
    let conn = open(&driver);
    let cursor = conn.cursor().unwrap();
    assert_eq!(cursor.description(), None);
    assert_eq!(cursor.row_number(), None);
}

#[test]
fn test_description_failed() {
    let driver = InMemoryTestDriver::new()
        .with_failure(DriverError::execution("line 1:1: mismatched input 'blah_blah'"));
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    let err = cursor.execute("blah_blah", ()).err().unwrap();
    assert!(err.is_database_error());
    assert_eq!(cursor.description(), None);
}

#[test]
fn test_description_cleared_by_failed_reexecute() {
    let driver = InMemoryTestDriver::new()
        .with_response(one_row())
        .with_failure(DriverError::execution("boom"));
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT * FROM one_row", ()).unwrap();
    assert!(cursor.description().is_some());
    assert!(cursor.execute("SELECT boom", ()).is_err());
    assert_eq!(cursor.description(), None);
    assert!(matches!(cursor.fetch_one(), Err(Error::Programming(_))));
}

#[test]
fn test_bad_query() {
    let driver = InMemoryTestDriver::new().with_failure(DriverError::Execution {
        message: "SYNTAX_ERROR: line 1:8: Column 'does_not_exist' cannot be resolved".into(),
        sql_state: None,
    });
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    let err = cursor
        .execute("SELECT does_not_exist FROM this_really_does_not_exist", ())
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Operational);
    assert!(err.is_database_error());
    assert!(err.to_string().contains("does_not_exist"));
}

#[test]
fn test_failure_during_fetch() {
    let driver = InMemoryTestDriver::new().with_response(
        InMemoryTestResponseBuilder::new()
            .column("a", TypeCode::INTEGER)
            .row(vec![1.into()])
            .build_failing(DriverError::execution("Query exhausted resources")),
    );
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT a FROM huge", ()).unwrap();
    let err = cursor.fetch_all().unwrap_err();
    assert!(err.is_database_error());
    assert!(err.to_string().contains("exhausted resources"));
}

#[test]
fn test_fetchone_no_data() {
    let driver = InMemoryTestDriver::new();
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();
    assert!(matches!(cursor.fetch_one(), Err(Error::Programming(_))));
}

#[test]
fn test_fetchmany() {
    let driver = InMemoryTestDriver::new().with_response(many_rows(15));
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT * FROM many_rows LIMIT 15", ()).unwrap();
    assert_eq!(cursor.fetch_many(Some(10)).unwrap().len(), 10);
    assert_eq!(cursor.fetch_many(Some(10)).unwrap().len(), 5);
    assert!(cursor.fetch_many(Some(10)).unwrap().is_empty());
    assert_eq!(cursor.row_number(), Some(15));
}

#[test]
fn test_arraysize() {
    let driver = InMemoryTestDriver::new().with_response(many_rows(20));
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();
    assert_eq!(cursor.array_size(), 1);

    cursor.set_array_size(5);
    cursor.execute("SELECT * FROM many_rows LIMIT 20", ()).unwrap();
    let mut batches = Vec::new();
    loop {
        let batch = cursor.fetch_many(None).unwrap();
        if batch.is_empty() {
            break;
        }
        batches.push(batch.len());
    }
    assert_eq!(batches, vec![5, 5, 5, 5]);
}

#[test]
fn test_fetch_pages_follow_fetch_size() {
    let driver = InMemoryTestDriver::new().with_response(many_rows(20));
    let conn = connect(&driver, ConnectOptions::new().fetch_size(7)).unwrap();
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT * FROM many_rows LIMIT 20", ()).unwrap();
    assert_eq!(cursor.fetch_many(Some(3)).unwrap().len(), 3);
    assert_eq!(driver.fetch_calls(), 1);
    assert_eq!(cursor.fetch_many(Some(10)).unwrap().len(), 10);
    assert_eq!(driver.fetch_calls(), 2);
    assert_eq!(cursor.fetch_all().unwrap().len(), 7);
}

#[test]
fn test_no_params() {
    let driver = InMemoryTestDriver::new();
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    let err = cursor.execute("SELECT '{0:s}' FROM one_row", ()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Index);
    let err = cursor.execute("SELECT '{x:s}' FROM one_row", ()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Key);
    driver.assert_query_count(0);
}

#[test]
fn test_escape() {
    let bad_str = "`~!@#$%^&*()_+-={}[]|\\;:'\",./<>?\n\r\t ";
    let expected = "`~!@#$%^&*()_+-={}[]|;:'\",./<>?\n\n\t ";
    let expected_sql = "SELECT 1, '`~!@#$%^&*()_+-={}[]|;:''\",./<>?\n\n\t ' FROM one_row";

    let response = || {
        InMemoryTestResponseBuilder::new()
            .column("_col0", TypeCode::INTEGER)
            .column("_col1", TypeCode::VARCHAR)
            .row(vec![1.into(), expected.into()])
            .build()
    };
    let driver = InMemoryTestDriver::new().with_responses([response(), response()]);
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor
        .execute("SELECT {0:d}, {1:s} FROM one_row", params![1, bad_str])
        .unwrap();
    driver.assert_last_query(expected_sql);
    assert_eq!(cursor.fetch_all().unwrap(), vec![row![1, expected]]);

    cursor
        .execute(
            "SELECT {a:d}, {b:s} FROM one_row",
            named_params! { "a" => 1, "b" => bad_str },
        )
        .unwrap();
    driver.assert_last_query(expected_sql);
    assert_eq!(cursor.fetch_all().unwrap(), vec![row![1, expected]]);
}

#[test]
fn test_none_empty_query() {
    let driver = InMemoryTestDriver::new();
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    assert!(matches!(
        cursor.execute(None::<&str>, ()),
        Err(Error::Programming(_))
    ));
    assert!(matches!(cursor.execute("", ()), Err(Error::Programming(_))));
    driver.assert_query_count(0);
}

#[test]
fn test_invalid_params() {
    let driver = InMemoryTestDriver::new();
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    let err = cursor
        .execute("SELECT {0:d} FROM one_row", params!["one"])
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::Type);
    driver.assert_query_count(0);
}

#[test]
fn test_open_close() {
    let driver = InMemoryTestDriver::new().with_response(one_row());
    {
        let conn = open(&driver);
        conn.close().unwrap();
    }
    {
        let conn = open(&driver);
        let mut cursor = conn.cursor().unwrap();
        cursor.execute("SELECT * FROM one_row", ()).unwrap();
        assert_eq!(driver.open_statements(), 1);
    }
    assert_eq!(driver.open_statements(), 0);
    assert_eq!(driver.open_sessions(), 0);
}

#[test]
fn test_reexecute_releases_previous_statement() {
    let driver = InMemoryTestDriver::new().with_responses([one_row(), one_row()]);
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT * FROM one_row", ()).unwrap();
    cursor.execute("SELECT * FROM one_row", ()).unwrap();
    assert_eq!(driver.open_statements(), 1);
    cursor.close().unwrap();
    assert_eq!(driver.open_statements(), 0);
}

#[test]
fn test_statement_without_result_set() {
    let driver = InMemoryTestDriver::new().with_response(InMemoryResponse::no_result());
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor
        .execute("CREATE DATABASE IF NOT EXISTS {0}", params!["x"])
        .unwrap();
    driver.assert_last_query("CREATE DATABASE IF NOT EXISTS 'x'");
    assert_eq!(cursor.description(), None);
    assert_eq!(driver.open_statements(), 0);
    assert!(matches!(cursor.fetch_all(), Err(Error::Programming(_))));
}

#[test]
fn test_unicode() {
    let unicode_str = "王兢";
    let driver = InMemoryTestDriver::new().with_response(
        InMemoryTestResponseBuilder::new()
            .column("_col0", TypeCode::VARCHAR)
            .row(vec![unicode_str.into()])
            .build(),
    );
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor
        .execute("SELECT {0:s} FROM one_row", params![unicode_str])
        .unwrap();
    driver.assert_last_query("SELECT '王兢' FROM one_row");
    assert_eq!(cursor.fetch_all().unwrap(), vec![row![unicode_str]]);
}

#[test]
fn test_null() {
    let all_null = InMemoryTestResponseBuilder::new()
        .column("_col0", TypeCode::VARCHAR)
        .rows((0..10_000).map(|_| vec![DriverValue::Null]))
        .build();
    let some_null = InMemoryTestResponseBuilder::new()
        .column("_col0", TypeCode::INTEGER)
        .rows((0..10_000i64).map(|a| vec![if a % 11 == 0 { DriverValue::Null } else { a.into() }]))
        .build();
    let driver = InMemoryTestDriver::new().with_responses([all_null, some_null]);
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT null FROM many_rows", ()).unwrap();
    assert_eq!(cursor.fetch_all().unwrap(), vec![row![None::<i64>]; 10_000]);

    cursor
        .execute("SELECT IF(a % 11 = 0, null, a) FROM many_rows", ())
        .unwrap();
    let expected: Vec<Row> = (0..10_000i64)
        .map(|a| row![if a % 11 == 0 { None } else { Some(a) }])
        .collect();
    assert_eq!(cursor.fetch_all().unwrap(), expected);
}

#[test]
fn test_description() {
    let driver = InMemoryTestDriver::new().with_response(
        InMemoryTestResponseBuilder::new()
            .column("foobar", TypeCode::INTEGER)
            .row(vec![1.into()])
            .build(),
    );
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT 1 AS foobar FROM one_row", ()).unwrap();
    let description = cursor.description().unwrap();
    assert_eq!(
        description,
        &[ColumnDescription::new(
            "foobar",
            TypeCode::INTEGER,
            11,
            10,
            0,
            Nullability::Unknown
        )]
    );
    assert_eq!(
        description[0].as_tuple(),
        ("foobar", 4, Some(11), None, Some(10), Some(0), Some(2))
    );
}

#[test]
fn test_complex() {
    let timestamp = NaiveDate::from_ymd_opt(2017, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let date = NaiveDate::from_ymd_opt(2017, 1, 2).unwrap();

    let driver = InMemoryTestDriver::new().with_response(
        InMemoryTestResponseBuilder::new()
            .column("col_boolean", TypeCode::BOOLEAN)
            .column("col_tinyint", TypeCode::TINYINT)
            .column("col_smallint", TypeCode::SMALLINT)
            .column("col_int", TypeCode::INTEGER)
            .column("col_bigint", TypeCode::BIGINT)
            .column("col_float", TypeCode::DOUBLE)
            .column("col_double", TypeCode::DOUBLE)
            .column("col_string", TypeCode::LONGNVARCHAR)
            .column("col_timestamp", TypeCode::TIMESTAMP)
            .column("col_date", TypeCode::DATE)
            .column("col_binary", TypeCode::LONGVARBINARY)
            .column("col_array", TypeCode::ARRAY)
            .column("col_map", TypeCode::JAVA_OBJECT)
            .column("col_struct", TypeCode::JAVA_OBJECT)
            .row(vec![
                DriverValue::Bool(true),
                DriverValue::Int(127),
                DriverValue::Int(32767),
                DriverValue::Int(2147483647),
                DriverValue::Int(9223372036854775807),
                DriverValue::Double(0.5),
                DriverValue::Double(0.25),
                "a string".into(),
                DriverValue::Timestamp(timestamp),
                DriverValue::Date(date),
                DriverValue::Bytes(b"123".to_vec()),
                DriverValue::Array(vec![1.into(), 2.into()]),
                DriverValue::Map(vec![(1.into(), 2.into()), (3.into(), 4.into())]),
                DriverValue::Struct(vec![("a".into(), 1.into()), ("b".into(), 2.into())]),
            ])
            .build(),
    );
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor
        .execute(
            "SELECT col_boolean, col_tinyint, col_smallint, col_int, col_bigint, \
             col_float, col_double, col_string, col_timestamp, col_date, col_binary, \
             col_array, col_map, col_struct FROM one_row_complex",
            (),
        )
        .unwrap();

    let description: Vec<_> = cursor
        .description()
        .unwrap()
        .iter()
        .map(|d| {
            let (name, code, display, internal, precision, scale, null_ok) = d.as_tuple();
            (name.to_string(), code, display, internal, precision, scale, null_ok)
        })
        .collect();
    let s = |v: i32| Some(v);
    assert_eq!(
        description,
        vec![
            ("col_boolean".to_string(), 16, s(5), None, s(0), s(0), s(2)),
            ("col_tinyint".to_string(), -6, s(4), None, s(3), s(0), s(2)),
            ("col_smallint".to_string(), 5, s(6), None, s(5), s(0), s(2)),
            ("col_int".to_string(), 4, s(11), None, s(10), s(0), s(2)),
            ("col_bigint".to_string(), -5, s(20), None, s(19), s(0), s(2)),
            ("col_float".to_string(), 8, s(24), None, s(17), s(0), s(2)),
            ("col_double".to_string(), 8, s(24), None, s(17), s(0), s(2)),
            ("col_string".to_string(), -16, s(1073741824), None, s(1073741824), s(0), s(2)),
            ("col_timestamp".to_string(), 93, s(23), None, s(3), s(0), s(2)),
            ("col_date".to_string(), 91, s(10), None, s(0), s(0), s(2)),
            ("col_binary".to_string(), -4, s(1073741824), None, s(1073741824), s(0), s(2)),
            ("col_array".to_string(), 2003, s(0), None, s(0), s(0), s(2)),
            ("col_map".to_string(), 2000, s(0), None, s(0), s(0), s(2)),
            ("col_struct".to_string(), 2000, s(0), None, s(0), s(0), s(2)),
        ]
    );

    let rows = cursor.fetch_all().unwrap();
    let expected = vec![Row::new(vec![
        Value::Bool(true),
        Value::Int(127),
        Value::Int(32767),
        Value::Int(2147483647),
        Value::Int(9223372036854775807),
        Value::Float(0.5),
        Value::Float(0.25),
        Value::Text("a string".into()),
        Value::Timestamp(timestamp),
        Value::Date(date),
        Value::Bytes(b"123".to_vec()),
        Value::Text("[1, 2]".into()),
        Value::Text("{1=2, 3=4}".into()),
        Value::Text("{a=1, b=2}".into()),
    ])];
    assert_eq!(rows, expected);

    let types = |row: &Row| row.iter().map(Value::type_name).collect::<Vec<_>>();
    assert_eq!(types(&rows[0]), types(&expected[0]));
}

#[test]
fn test_decimal_cannot_be_fetched() {
    let driver = InMemoryTestDriver::new().with_response(
        InMemoryTestResponseBuilder::new()
            .column("col_decimal", TypeCode::DECIMAL)
            .row(vec![DriverValue::Decimal("0.1".into())])
            .build(),
    );
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT col_decimal FROM one_row_complex", ()).unwrap();
    let err = cursor.fetch_all().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotSupported);
}

#[test]
fn test_connection_is_closed() {
    let driver = InMemoryTestDriver::new();
    let conn = open(&driver);
    assert!(!conn.is_closed());
    conn.close().unwrap();
    assert!(conn.is_closed());
    assert!(matches!(conn.cursor(), Err(Error::Programming(_))));
}

#[test]
fn test_cursor_is_closed() {
    let driver = InMemoryTestDriver::new();
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();
    assert!(!cursor.is_closed());
    cursor.close().unwrap();
    assert!(cursor.is_closed());

    assert!(matches!(
        cursor.execute("SELECT * FROM one_row", ()),
        Err(Error::Programming(_))
    ));
    assert!(matches!(cursor.fetch_one(), Err(Error::Programming(_))));
    assert!(matches!(cursor.fetch_many(None), Err(Error::Programming(_))));
    assert!(matches!(cursor.fetch_all(), Err(Error::Programming(_))));
    assert!(matches!(cursor.cancel(), Err(Error::Programming(_))));
    cursor.close().unwrap();
    driver.assert_query_count(0);
}

#[test]
fn test_connection_close_invalidates_cursors() {
    let driver = InMemoryTestDriver::new().with_response(one_row());
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();
    cursor.execute("SELECT * FROM one_row", ()).unwrap();

    conn.close().unwrap();
    assert!(cursor.is_closed());
    assert!(matches!(cursor.fetch_one(), Err(Error::Programming(_))));
    cursor.close().unwrap();
    assert_eq!(driver.open_statements(), 0);
}

#[test]
fn test_no_ops() {
    let driver = InMemoryTestDriver::new();
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    assert_eq!(cursor.row_count(), -1);
    cursor.set_input_sizes(&[]);
    cursor.set_output_size(1, None);
    cursor.cancel().unwrap();
    assert!(matches!(
        cursor.execute_many("SELECT * FROM one_row", Vec::new()),
        Err(Error::NotSupported(_))
    ));
    conn.commit().unwrap();
    assert!(matches!(conn.rollback(), Err(Error::NotSupported(_))));
    cursor.close().unwrap();
    conn.close().unwrap();
}

#[test]
fn test_cursors_on_threads_share_one_session() {
    let driver = InMemoryTestDriver::new().with_responses([many_rows(500), many_rows(500)]);
    let conn = open(&driver);

    std::thread::scope(|scope| {
        for _ in 0..2 {
            let mut cursor = conn.cursor().unwrap();
            scope.spawn(move || {
                cursor.execute("SELECT a FROM many_rows", ()).unwrap();
                assert_eq!(cursor.fetch_all().unwrap().len(), 500);
            });
        }
    });

    driver.assert_query_count(2);
    assert_eq!(driver.open_sessions(), 1);
    assert_eq!(driver.open_statements(), 0);
}

#[test]
fn test_failed_format_discards_previous_result() {
    let driver = InMemoryTestDriver::new().with_response(one_row());
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT * FROM one_row", ()).unwrap();
    assert!(cursor.description().is_some());

    let err = cursor.execute("SELECT '{0:s}' FROM one_row", ()).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Index);
    assert_eq!(cursor.description(), None);
    assert_eq!(cursor.row_number(), None);
    assert!(matches!(cursor.fetch_one(), Err(Error::Programming(_))));
    assert_eq!(driver.open_statements(), 0);
    driver.assert_query_count(1);

    assert!(cursor.execute(None::<&str>, ()).is_err());
    assert_eq!(cursor.description(), None);
}

fn rows_with_bad_cell() -> InMemoryResponse {
    InMemoryTestResponseBuilder::new()
        .column("a", TypeCode::INTEGER)
        .rows(vec![
            vec![1.into()],
            vec![2.into()],
            vec!["bad".into()],
            vec![4.into()],
            vec![5.into()],
        ])
        .build()
}

#[test]
fn test_conversion_error_is_not_swallowed() {
    let driver = InMemoryTestDriver::new().with_response(rows_with_bad_cell());
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT a FROM mixed", ()).unwrap();
    assert!(matches!(cursor.fetch_all(), Err(Error::Interface(_))));
    assert!(matches!(cursor.fetch_all(), Err(Error::Interface(_))));
    assert!(matches!(cursor.fetch_one(), Err(Error::Interface(_))));
    assert_eq!(cursor.row_number(), Some(0));
}

#[test]
fn test_rows_before_failed_page_are_still_delivered() {
    let driver = InMemoryTestDriver::new().with_response(rows_with_bad_cell());
    let conn = connect(&driver, ConnectOptions::new().fetch_size(2)).unwrap();
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT a FROM mixed", ()).unwrap();
    assert!(cursor.fetch_all().is_err());
    assert_eq!(cursor.fetch_one().unwrap(), Some(row![1]));
    assert_eq!(cursor.fetch_one().unwrap(), Some(row![2]));
    assert!(matches!(cursor.fetch_one(), Err(Error::Interface(_))));
    assert_eq!(cursor.row_number(), Some(2));
    // two pages pulled, nothing after the failed one
    assert_eq!(driver.fetch_calls(), 2);
}

#[test]
fn test_decimal_failure_persists() {
    let driver = InMemoryTestDriver::new().with_response(
        InMemoryTestResponseBuilder::new()
            .column("col_decimal", TypeCode::DECIMAL)
            .rows(vec![
                vec![DriverValue::Decimal("0.1".into())],
                vec![DriverValue::Decimal("0.2".into())],
            ])
            .build(),
    );
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT col_decimal FROM t", ()).unwrap();
    assert!(matches!(cursor.fetch_one(), Err(Error::NotSupported(_))));
    assert!(matches!(cursor.fetch_many(Some(5)), Err(Error::NotSupported(_))));
}

#[test]
fn test_fetch_failure_persists_instead_of_looking_exhausted() {
    let driver = InMemoryTestDriver::new().with_response(
        InMemoryTestResponseBuilder::new()
            .column("a", TypeCode::INTEGER)
            .build_failing(DriverError::execution("Query exhausted resources")),
    );
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor.execute("SELECT a FROM huge", ()).unwrap();
    assert!(matches!(cursor.fetch_one(), Err(Error::Operational(_))));
    assert!(matches!(cursor.fetch_one(), Err(Error::Operational(_))));
    assert_eq!(driver.fetch_calls(), 1);
}

#[test]
fn test_statement_released_when_connection_dropped_first() {
    let driver = InMemoryTestDriver::new().with_response(one_row());
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();
    cursor.execute("SELECT * FROM one_row", ()).unwrap();
    assert_eq!(driver.open_statements(), 1);

    drop(conn);
    assert_eq!(driver.open_sessions(), 0);
    assert!(cursor.is_closed());

    drop(cursor);
    assert_eq!(driver.open_statements(), 0);
}

#[test]
fn test_cursor_close_after_connection_dropped() {
    let driver = InMemoryTestDriver::new().with_response(one_row());
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();
    cursor.execute("SELECT * FROM one_row", ()).unwrap();

    drop(conn);
    cursor.close().unwrap();
    assert_eq!(driver.open_statements(), 0);
    assert!(matches!(cursor.fetch_one(), Err(Error::Programming(_))));
}

#[test]
fn test_positional_and_named_params_together() {
    let driver = InMemoryTestDriver::new().with_response(one_row());
    let conn = open(&driver);
    let mut cursor = conn.cursor().unwrap();

    cursor
        .execute(
            "SELECT {0:d}, {name:s} FROM one_row",
            params![1].named_arg("name", "x"),
        )
        .unwrap();
    driver.assert_last_query("SELECT 1, 'x' FROM one_row");
}

#[test]
fn test_driver_receives_jdbc_connection_settings() {
    let driver = InMemoryTestDriver::new();
    let _conn = connect(
        &driver,
        ConnectOptions::new()
            .schema_name(SCHEMA)
            .region_name("us-west-2")
            .s3_staging_dir("s3://bucket/staging/")
            .credentials("AKIA", "secret"),
    )
    .unwrap();

    let options = &driver.connect_options()[0];
    assert_eq!(
        options.jdbc_url().as_deref(),
        Some("jdbc:awsathena://athena.us-west-2.amazonaws.com:443/")
    );
    let props = options.driver_properties();
    assert_eq!(props.get("schema").map(String::as_str), Some(SCHEMA));
    assert_eq!(
        props.get("s3_staging_dir").map(String::as_str),
        Some("s3://bucket/staging/")
    );
    assert_eq!(props.get("password").map(String::as_str), Some("secret"));
}
