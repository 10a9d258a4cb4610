use crate::error::ArchiveError;
use crate::fits::{BLOCK_SIZE, Header, HeaderValue};

#[test]
fn test_header_round_trip() {
    let mut header = Header::new();
    header.set("SIMPLE", HeaderValue::Logical(true));
    header.set("BITPIX", HeaderValue::Integer(8));
    header.set("NAXIS", HeaderValue::Integer(0));
    header.set("TIME", HeaderValue::Float(1234.5));
    header.set("TIMEUNIT", HeaderValue::Text("Myr".to_string()));

    let bytes = header.to_bytes().unwrap();
    assert_eq!(bytes.len() % BLOCK_SIZE, 0);

    let parsed = Header::read_from(&mut bytes.as_slice()).unwrap().unwrap();
    assert_eq!(parsed, header);
}

#[test]
fn test_set_replaces_existing_card() {
    let mut header = Header::new();
    header.set("TIME", HeaderValue::Float(1.0));
    header.set("TIME", HeaderValue::Float(2.0));

    assert_eq!(header.get_f64("TIME"), Some(2.0));
    let bytes = header.to_bytes().unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert_eq!(text.matches("TIME    =").count(), 1);
}

#[test]
fn test_parse_foreign_cards() {
    let cards = [
        "XTENSION= 'BINTABLE'           / binary table extension",
        "NAXIS2  =                  100 / number of rows",
        "TIME    =          1.0000D+02",
        "OBJECT  = 'O''Brien '",
        "COMMENT   written elsewhere",
        "END",
    ];
    let mut bytes: Vec<u8> = cards
        .iter()
        .flat_map(|card| format!("{card:<80}").into_bytes())
        .collect();
    bytes.resize(BLOCK_SIZE, b' ');

    let header = Header::read_from(&mut bytes.as_slice()).unwrap().unwrap();

    assert!(header.is_bintable());
    assert_eq!(header.get_i64("NAXIS2"), Some(100));
    assert_eq!(header.get_f64("TIME"), Some(100.0));
    assert_eq!(header.get_str("OBJECT"), Some("O'Brien"));
    assert!(header.get("COMMENT").is_none());
}

#[test]
fn test_integer_reads_as_float() {
    let mut header = Header::new();
    header.set("TIME", HeaderValue::Integer(40));
    assert_eq!(header.get_f64("TIME"), Some(40.0));
    assert_eq!(header.get_i64("TIME"), Some(40));
}

#[test]
fn test_read_from_empty_stream_is_none() {
    let empty: &[u8] = &[];
    assert!(Header::read_from(&mut &*empty).unwrap().is_none());
}

#[test]
fn test_truncated_header_fails() {
    let mut header = Header::new();
    header.set("NAXIS", HeaderValue::Integer(0));
    let bytes = header.to_bytes().unwrap();

    let result = Header::read_from(&mut &bytes[..100]);
    assert!(matches!(result, Err(ArchiveError::Header(_))));
}

#[test]
fn test_long_keyword_is_rejected() {
    let mut header = Header::new();
    header.set("TOOLONGKEY", HeaderValue::Integer(1));
    assert!(header.to_bytes().is_err());
}

#[test]
fn test_data_len() {
    let mut header = Header::new();
    header.set("BITPIX", HeaderValue::Integer(8));
    header.set("NAXIS", HeaderValue::Integer(2));
    header.set("NAXIS1", HeaderValue::Integer(29));
    header.set("NAXIS2", HeaderValue::Integer(10));
    header.set("PCOUNT", HeaderValue::Integer(0));
    header.set("GCOUNT", HeaderValue::Integer(1));
    assert_eq!(header.data_len().unwrap(), 290);

    let mut primary = Header::new();
    primary.set("NAXIS", HeaderValue::Integer(0));
    assert_eq!(primary.data_len().unwrap(), 0);
}

#[test]
fn test_data_len_overflow_is_an_error() {
    let mut header = Header::new();
    header.set("BITPIX", HeaderValue::Integer(64));
    header.set("NAXIS", HeaderValue::Integer(2));
    header.set("NAXIS1", HeaderValue::Integer(i64::MAX / 2));
    header.set("NAXIS2", HeaderValue::Integer(4));
    assert!(matches!(header.data_len(), Err(ArchiveError::Header(_))));

    header.set("NAXIS2", HeaderValue::Integer(1));
    header.set("PCOUNT", HeaderValue::Integer(i64::MAX));
    assert!(matches!(header.data_len(), Err(ArchiveError::Header(_))));

    header.set("PCOUNT", HeaderValue::Integer(0));
    assert!(matches!(header.data_len(), Err(ArchiveError::Header(_))));
}
