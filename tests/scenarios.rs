use csvio::{ColumnDescriptor, ErrorKind, ReaderBuilder, RecordOrComment, RowDescriptor, WriterBuilder};

#[derive(Default, Debug, PartialEq)]
struct Pair {
    a: i64,
    b: i64,
}

fn pair_descriptor() -> RowDescriptor<Pair> {
    let mut d = RowDescriptor::new();
    d.push_column(ColumnDescriptor::new(
        Some("A".to_string()),
        |s: &str| s.parse::<i64>().map_err(|e| e.to_string()),
        |r: &mut Pair, v: i64| r.a = v,
    ));
    d.push_column(
        ColumnDescriptor::new(
            Some("B".to_string()),
            |s: &str| s.parse::<i64>().map_err(|e| e.to_string()),
            |r: &mut Pair, v: i64| r.b = v,
        )
        .required(true),
    );
    d
}

// Scenario 1: plain integers, two records.
#[test]
fn scenario_plain_records() {
    let d = pair_descriptor();
    let mut r = ReaderBuilder::new()
        .from_reader(std::io::Cursor::new(b"A,B\r\n1,2\r\n3,4\r\n".to_vec()))
        .unwrap();
    assert_eq!(r.deserialize(&d).unwrap(), Some(Pair { a: 1, b: 2 }));
    assert_eq!(r.deserialize(&d).unwrap(), Some(Pair { a: 3, b: 4 }));
    assert_eq!(r.deserialize(&d).unwrap(), None);
}

// Scenario 2: a quoted value containing the separator.
#[test]
fn scenario_quoted_value_with_embedded_separator() {
    let mut r = ReaderBuilder::new()
        .from_reader(std::io::Cursor::new(b"A,B\r\nhello,\"wo,rld\"\r\n".to_vec()))
        .unwrap();
    assert_eq!(
        r.read_record().unwrap(),
        Some(vec!["hello".to_string(), "wo,rld".to_string()])
    );
}

// Scenario 3: a doubled quote inside an escaped value.
#[test]
fn scenario_doubled_quote_inside_escaped_value() {
    let mut r = ReaderBuilder::new()
        .from_reader(std::io::Cursor::new(
            b"A,B\r\n\"say \"\"hi\"\"\",x\r\n".to_vec(),
        ))
        .unwrap();
    assert_eq!(
        r.read_record().unwrap(),
        Some(vec!["say \"hi\"".to_string(), "x".to_string()])
    );
}

// Scenario 4: a leading comment line is delivered with its text intact via
// `read_record_or_comment` (not silently discarded), and the record that
// follows still reads correctly afterward.
#[test]
fn scenario_leading_comment_is_skipped() {
    let mut b = ReaderBuilder::new();
    b.has_headers(false);
    b.options().comment_character(Some('#'));
    let mut r = b
        .from_reader(std::io::Cursor::new(
            b"# top comment\r\n1,2\r\n".to_vec(),
        ))
        .unwrap();
    assert_eq!(
        r.read_record_or_comment().unwrap(),
        Some(RecordOrComment::Comment(" top comment".to_string()))
    );
    assert_eq!(
        r.read_record_or_comment().unwrap(),
        Some(RecordOrComment::Record(vec!["1".to_string(), "2".to_string()]))
    );
    assert_eq!(r.read_record().unwrap(), None);
}

// Scenario 5: a missing required column poisons the reader; every later
// call fails with `Poisoned` without invoking a setter.
#[test]
fn scenario_missing_required_column_poisons_reader() {
    let d = pair_descriptor();
    let mut r = ReaderBuilder::new()
        .from_reader(std::io::Cursor::new(b"A,B\r\n1\r\n".to_vec()))
        .unwrap();
    let err = r.deserialize(&d).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::RequiredColumnMissing { column, .. } if column == "B"));
    let err = r.deserialize(&d).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Poisoned));
}

// Scenario 6: writing a value containing the separator quotes only that
// value; the header is auto-written once.
#[test]
fn scenario_write_quotes_only_the_value_that_needs_it() {
    let mut w = WriterBuilder::new().from_writer(Vec::new()).unwrap();
    w.write_record(&["A", "B"]).unwrap();
    w.write_record(&["a,b", "c"]).unwrap();
    let out = w.into_inner().unwrap();
    assert_eq!(out, b"A,B\r\n\"a,b\",c\r\n");
}

#[test]
fn row_ending_detect_locks_to_first_terminator_then_errors_on_disagreement() {
    let mut b = ReaderBuilder::new();
    b.has_headers(false);
    b.options().row_ending(csvio::RowEnding::Detect);
    let mut r = b
        .from_reader(std::io::Cursor::new(b"a,b\nc,d\r\ne,f\n".to_vec()))
        .unwrap();
    assert_eq!(r.read_record().unwrap(), Some(vec!["a".to_string(), "b".to_string()]));
    assert_eq!(r.row_ending_detected().resolved(), Some(csvio::RowEnding::Lf));
    let err = r.read_record().unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::ExpectedEndOfRecordOrValue(_)));
}

#[test]
fn comment_only_record_never_calls_row_constructor() {
    let d = pair_descriptor();
    let mut b = ReaderBuilder::new();
    b.has_headers(false);
    b.options().comment_character(Some('#'));
    let mut r = b
        .from_reader(std::io::Cursor::new(b"#not a row\r\n1,2\r\n".to_vec()))
        .unwrap();
    assert_eq!(r.deserialize(&d).unwrap(), Some(Pair { a: 1, b: 2 }));
}

#[test]
fn round_trip_preserves_values_through_quoting() {
    let values = vec![vec!["plain".to_string(), "a,b".to_string(), "has\"quote".to_string()]];
    let mut w = WriterBuilder::new().from_writer(Vec::new()).unwrap();
    w.write_record(&values[0]).unwrap();
    let encoded = w.into_inner().unwrap();

    let mut r = ReaderBuilder::new()
        .has_headers(false)
        .from_reader(std::io::Cursor::new(encoded))
        .unwrap();
    assert_eq!(r.read_record().unwrap(), Some(values[0].clone()));
}
