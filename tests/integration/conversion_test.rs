//! Integration tests for the conversion pipeline across every format pair

use assert_matches::assert_matches;
use dataconv::codec::{supported_pairs, Format};
use dataconv::conversion::{ConversionConfig, ConversionEngine};
use dataconv::error::ConversionError;
use pretty_assertions::assert_eq;

fn engine() -> ConversionEngine {
    ConversionEngine::new(ConversionConfig::compact())
}

fn sample(format: Format) -> &'static str {
    match format {
        Format::Csv => "name,age\nJohn,25\nJane,28\n",
        Format::Json => r#"[{"name":"John","age":25},{"name":"Jane","age":28}]"#,
        Format::Xml => "<data><item><name>John</name><age>25</age></item>\
                        <item><name>Jane</name><age>28</age></item></data>",
        Format::Yaml => "- name: John\n  age: 25\n- name: Jane\n  age: 28\n",
        Format::Sql | Format::Xlsx => "",
    }
}

#[cfg(test)]
mod scenario_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_to_json_keeps_cells_as_strings() {
        let out = engine()
            .convert_str(Format::Csv, Format::Json, "name,age\nJohn,25\nJane,28")
            .unwrap();
        assert_eq!(
            out,
            r#"[{"name":"John","age":"25"},{"name":"Jane","age":"28"}]"#
        );
    }

    #[test]
    fn test_json_list_under_key_becomes_repeated_siblings() {
        let out = engine()
            .convert_str(Format::Json, Format::Xml, r#"{"a":1,"b":[1,2]}"#)
            .unwrap();
        assert_eq!(out, "<data><a>1</a><b>1</b><b>2</b></data>");
    }

    #[test]
    fn test_custom_root_and_table_names() {
        let config = ConversionConfig::compact()
            .with_xml_root("people")
            .with_sql_table("staff");
        let engine = ConversionEngine::new(config);

        let xml = engine.convert_str(Format::Csv, Format::Xml, "n\nA\n").unwrap();
        assert_eq!(xml, "<people><item><n>A</n></item></people>");

        let sql = engine.convert_str(Format::Csv, Format::Sql, "n\nA\nB\n").unwrap();
        assert_eq!(
            sql,
            "INSERT INTO staff (n) VALUES ('A');\nINSERT INTO staff (n) VALUES ('B');"
        );
    }

    #[test]
    fn test_csv_through_xml_reads_back_as_same_table() {
        let engine = engine();
        let xml = engine
            .convert_str(Format::Csv, Format::Xml, "First Name,age\nAnn,31\nBo,4\n")
            .unwrap();
        let csv = engine.convert_str(Format::Xml, Format::Csv, &xml).unwrap();
        assert_eq!(csv, "first_name,age\nAnn,31\nBo,4\n");
    }

    #[test]
    fn test_yaml_to_json_keeps_native_types() {
        let out = engine()
            .convert_str(Format::Yaml, Format::Json, "count: 3\nactive: true\nname: x\n")
            .unwrap();
        assert_eq!(out, r#"{"count":3,"active":true,"name":"x"}"#);
    }

    #[test]
    fn test_json_to_csv_fills_missing_columns() {
        let out = engine()
            .convert_str(Format::Json, Format::Csv, r#"[{"a":1,"b":2},{"a":3},{"b":4,"c":5}]"#)
            .unwrap();
        assert_eq!(out, "a,b\n1,2\n3,\n,4\n");
    }

    #[test]
    fn test_single_item_xml_document_to_json() {
        let out = engine()
            .convert_str(Format::Xml, Format::Json, "<data><item><a>1</a></item></data>")
            .unwrap();
        assert_eq!(out, r#"{"item":{"a":"1"}}"#);
    }
}

#[cfg(test)]
mod pair_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_supported_pair_converts() {
        let engine = engine();
        for kind in supported_pairs() {
            let result = engine.convert(kind.from, kind.to, sample(kind.from).as_bytes());
            let data = result.unwrap_or_else(|e| panic!("{} failed: {}", kind, e));
            assert!(!data.is_empty(), "{} produced no output", kind);
            assert_eq!(data.metadata.kind, kind);
        }
    }

    #[test]
    fn test_every_other_pair_is_rejected() {
        let engine = engine();
        for from in Format::ALL {
            for to in Format::ALL {
                if from.can_convert_to(to) {
                    continue;
                }
                let err = engine.convert(from, to, b"").unwrap_err();
                assert_matches!(err, ConversionError::UnsupportedPair { .. });
            }
        }
    }

    #[test]
    fn test_supported_pair_count() {
        assert_eq!(supported_pairs().len(), 12);
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_malformed_inputs_are_decode_errors() {
        let engine = engine();
        let cases: [(Format, &[u8]); 4] = [
            (Format::Json, b"[{\"a\":1}"),
            (Format::Yaml, b"a: [1, 2"),
            (Format::Xml, b"<data><item></data>"),
            (Format::Csv, b"a,b\n\xff,1"),
        ];
        for (format, input) in cases {
            let target = format.supported_targets()[0];
            let err = engine.convert(format, target, input).unwrap_err();
            assert_matches!(err, ConversionError::Decode(ref e) if e.format == format);
        }
    }

    #[test]
    fn test_nested_records_are_shape_errors() {
        let err = engine()
            .convert(Format::Json, Format::Csv, br#"[{"a":{"b":1}}]"#)
            .unwrap_err();
        assert_matches!(err, ConversionError::Shape(_));
        assert!(err.user_message().contains("'a'"));
    }

    #[test]
    fn test_scalar_list_is_shape_error() {
        let err = engine()
            .convert(Format::Yaml, Format::Csv, b"- 1\n- 2\n")
            .unwrap_err();
        assert_matches!(err, ConversionError::Shape(_));
    }

    #[test]
    fn test_oversized_input_rejected_before_decoding() {
        let engine = ConversionEngine::new(ConversionConfig::compact().with_max_input_bytes(1024));
        let input = vec![b'{'; 2048];
        let err = engine.convert(Format::Json, Format::Yaml, &input).unwrap_err();
        assert_matches!(err, ConversionError::InputTooLarge { size: 2048, limit: 1024 });
    }

    #[test]
    fn test_byte_order_mark_is_ignored() {
        let out = engine()
            .convert_str(Format::Csv, Format::Json, "\u{feff}id\n7\n")
            .unwrap();
        assert_eq!(out, r#"[{"id":"7"}]"#);
    }
}
