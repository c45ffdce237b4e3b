//! End-to-end scenarios exercising the public API top to bottom: a
//! mapping built with [`MappingBuilder`], read through [`StreamReader`],
//! and (scenario 6) written back through [`StreamWriter`].

use std::any::Any;
use std::sync::Arc;

use flatbean::bean::{Bean, PropertyError};
use flatbean::builder::{FieldBuilder, MappingBuilder, RecordBuilder};
use flatbean::context::StreamFormat;
use flatbean::error::{RecordFault, StreamError};
use flatbean::field::CollectionKind;
use flatbean::formats::{CsvReader, CsvWriter, FixedLengthReader, FixedLengthWriter};
use flatbean::reader::StreamReader;
use flatbean::value::{TypeKind, Value};
use flatbean::writer::StreamWriter;

#[derive(Debug, Default)]
struct Person {
    id: String,
    name: String,
}

impl Bean for Person {
    fn get_property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Text(self.id.clone())),
            "name" => Some(Value::Text(self.name.clone())),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        let text = value.as_text().unwrap_or_default().to_owned();
        match name {
            "id" => self.id = text,
            "name" => self.name = text,
            other => {
                return Err(PropertyError::Unknown {
                    property: other.to_owned(),
                })
            }
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn person_tree() -> flatbean::MappingTree {
    MappingBuilder::new(StreamFormat::FixedLength)
        .record(
            0,
            RecordBuilder::new("person")
                .field(
                    FieldBuilder::new("id", 0)
                        .width(5)
                        .required(true)
                        .property("id"),
                )
                .field(
                    FieldBuilder::new("name", 5)
                        .width(20)
                        .trim(true)
                        .property("name"),
                )
                .bean::<Person>(),
        )
        .build()
        .unwrap()
}

#[test]
fn fixed_length_happy_path() {
    let tree = Arc::new(person_tree());
    let line = "00042 Alice               \n";
    let mut reader = StreamReader::new(FixedLengthReader::new(line.as_bytes()), tree);

    let bean = reader.read().unwrap().expect("one record");
    let person = bean.as_any().downcast_ref::<Person>().unwrap();
    assert_eq!(person.id, "00042");
    assert_eq!(person.name, "Alice");

    assert!(reader.read().unwrap().is_none());
}

#[derive(Debug, Default)]
struct Header {
    title: String,
    year: i64,
}

impl Bean for Header {
    fn get_property(&self, name: &str) -> Option<Value> {
        match name {
            "title" => Some(Value::Text(self.title.clone())),
            "year" => Some(Value::Integer(self.year)),
            _ => None,
        }
    }
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        match name {
            "title" => self.title = value.as_text().unwrap_or_default().to_owned(),
            "year" => {
                self.year = match value {
                    Value::Integer(n) => n,
                    _ => return Err(PropertyError::TypeMismatch { property: "year".into(), expected: "integer" }),
                }
            }
            other => return Err(PropertyError::Unknown { property: other.to_owned() }),
        }
        Ok(())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default)]
struct Detail {
    kind: String,
    name: String,
    count: i64,
}

impl Bean for Detail {
    fn get_property(&self, name: &str) -> Option<Value> {
        match name {
            "kind" => Some(Value::Text(self.kind.clone())),
            "name" => Some(Value::Text(self.name.clone())),
            "count" => Some(Value::Integer(self.count)),
            _ => None,
        }
    }
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        match name {
            "kind" => self.kind = value.as_text().unwrap_or_default().to_owned(),
            "name" => self.name = value.as_text().unwrap_or_default().to_owned(),
            "count" => {
                self.count = match value {
                    Value::Integer(n) => n,
                    _ => return Err(PropertyError::TypeMismatch { property: "count".into(), expected: "integer" }),
                }
            }
            other => return Err(PropertyError::Unknown { property: other.to_owned() }),
        }
        Ok(())
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn header_detail_tree() -> flatbean::MappingTree {
    MappingBuilder::new(StreamFormat::Csv)
        .record(
            0,
            RecordBuilder::new("header")
                .field(FieldBuilder::new("kind", 0).identifier(true).literal("H"))
                .field(FieldBuilder::new("title", 1).property("title"))
                .field(FieldBuilder::new("year", 2).declared_type(TypeKind::Integer).property("year"))
                .bean::<Header>(),
        )
        .record(
            0,
            RecordBuilder::new("detail")
                .occurs(0, flatbean::value::Occurs::Unbounded)
                .field(FieldBuilder::new("kind", 0).identifier(true).literal("D").property("kind"))
                .field(FieldBuilder::new("name", 1).property("name"))
                .field(FieldBuilder::new("count", 2).declared_type(TypeKind::Integer).property("count"))
                .bean::<Detail>(),
        )
        .build()
        .unwrap()
}

#[test]
fn csv_with_identifier() {
    let tree = Arc::new(header_detail_tree());
    let input = "H,report,2024\nD,foo,7\nD,bar,x\n";
    let mut reader = StreamReader::new(CsvReader::new(input.as_bytes()), tree);

    let header = reader.read().unwrap().expect("header record");
    let header = header.as_any().downcast_ref::<Header>().unwrap();
    assert_eq!(header.title, "report");
    assert_eq!(header.year, 2024);

    let detail = reader.read().unwrap().expect("first detail record");
    let detail = detail.as_any().downcast_ref::<Detail>().unwrap();
    assert_eq!(detail.name, "foo");
    assert_eq!(detail.count, 7);

    let err = reader.read().unwrap_err();
    match err {
        StreamError::Record(RecordFault::Invalid { record, faults, .. }) => {
            assert_eq!(record, "detail");
            assert_eq!(faults.len(), 1);
            assert_eq!(faults[0].field, "count");
        }
        other => panic!("expected a field-level Invalid fault, got {other:?}"),
    }

    assert!(reader.read().unwrap().is_none());
}

/// A top-level cohort of `a` (min 1, max 1) then `b` (min 0), matching
/// scenario 3 exactly.
fn sequence_tree() -> flatbean::MappingTree {
    MappingBuilder::new(StreamFormat::Csv)
        .record(
            0,
            RecordBuilder::new("a")
                .occurs(1, flatbean::value::Occurs::Bounded(1))
                .field(FieldBuilder::new("kind", 0).identifier(true).literal("a")),
        )
        .record(
            1,
            RecordBuilder::new("b")
                .occurs(0, flatbean::value::Occurs::Unbounded)
                .field(FieldBuilder::new("kind", 0).identifier(true).literal("b")),
        )
        .build()
        .unwrap()
}

#[test]
fn sequence_violation_reports_the_unsatisfied_predecessor() {
    let tree = Arc::new(sequence_tree());
    let input = "b\n";
    let mut reader = StreamReader::new(CsvReader::new(input.as_bytes()), tree);

    // "b" matches its own record definition, but "a" hasn't arrived yet and
    // still needs one occurrence: the record is unexpected, not unidentified.
    let err = reader.read().unwrap_err();
    assert!(matches!(
        err,
        StreamError::Record(RecordFault::Unexpected { ref record, .. }) if record == "b"
    ));

    // The stream ends having consumed the line above; "a" never arrived.
    let end = reader.read().unwrap_err();
    assert!(matches!(
        end,
        StreamError::Record(RecordFault::Sequence { ref expected, .. }) if expected == "a"
    ));
}

fn tags_tree() -> flatbean::MappingTree {
    MappingBuilder::new(StreamFormat::Csv)
        .record(
            0,
            RecordBuilder::new("row")
                .field(FieldBuilder::new("id", 0))
                .field(FieldBuilder::new("name", 1))
                .field(
                    FieldBuilder::new("tags", 2)
                        .collection(CollectionKind::Array)
                        .occurs(1, flatbean::value::Occurs::Bounded(3))
                        .property("tags"),
                )
                .bean::<TaggedRow>(),
        )
        .build()
        .unwrap()
}

#[derive(Debug, Default)]
struct TaggedRow {
    tags: Vec<String>,
}

impl Bean for TaggedRow {
    fn get_property(&self, name: &str) -> Option<Value> {
        match name {
            "tags" => Some(Value::List(self.tags.iter().cloned().map(Value::Text).collect())),
            _ => None,
        }
    }
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        match (name, value) {
            ("tags", Value::List(items)) => {
                self.tags = items
                    .into_iter()
                    .filter_map(|v| v.as_text().map(str::to_owned))
                    .collect();
                Ok(())
            }
            (other, _) => Err(PropertyError::Unknown { property: other.to_owned() }),
        }
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn collection_field_gathers_up_to_max_occurs() {
    let tree = Arc::new(tags_tree());
    let mut reader = StreamReader::new(CsvReader::new("id,name,red,green,blue\n".as_bytes()), tree);
    let bean = reader.read().unwrap().expect("record parses");
    assert_eq!(
        bean.get_property("tags"),
        Some(Value::List(vec![
            Value::Text("red".into()),
            Value::Text("green".into()),
            Value::Text("blue".into()),
        ]))
    );
}

#[test]
fn collection_field_below_min_occurs_is_invalid() {
    let tree = Arc::new(tags_tree());
    let mut reader = StreamReader::new(CsvReader::new("id,name\n".as_bytes()), tree);
    let err = reader.read().unwrap_err();
    match err {
        StreamError::Record(RecordFault::Invalid { faults, .. }) => {
            assert_eq!(faults.len(), 1);
            assert_eq!(faults[0].field, "tags");
        }
        other => panic!("expected Invalid, got {other:?}"),
    }
}

#[derive(Debug, Default)]
struct LineRow {
    id: String,
}

impl Bean for LineRow {
    fn get_property(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Text(self.id.clone())),
            _ => None,
        }
    }
    fn set_property(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        match name {
            "id" => {
                self.id = value.as_text().unwrap_or_default().to_owned();
                Ok(())
            }
            other => Err(PropertyError::Unknown { property: other.to_owned() }),
        }
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn max_two_tree() -> flatbean::MappingTree {
    MappingBuilder::new(StreamFormat::Csv)
        .record(
            0,
            RecordBuilder::new("line")
                .occurs(0, flatbean::value::Occurs::Bounded(2))
                .field(FieldBuilder::new("id", 0).property("id"))
                .bean::<LineRow>(),
        )
        .build()
        .unwrap()
}

#[test]
fn max_occurs_overflow_is_unexpected_but_still_recognisable() {
    let tree = Arc::new(max_two_tree());
    let input = "1\n2\n3\n";
    let mut reader = StreamReader::new(CsvReader::new(input.as_bytes()), tree);

    reader.read().unwrap().expect("first occurrence");
    reader.read().unwrap().expect("second occurrence");

    let err = reader.read().unwrap_err();
    assert!(matches!(
        err,
        StreamError::Record(RecordFault::Unexpected { ref record, .. }) if record == "line"
    ));
}

#[test]
fn round_trip_through_the_fixed_length_writer() {
    let tree = Arc::new(person_tree());
    let original = Person {
        id: "00042".into(),
        name: "Alice".into(),
    };

    let mut buf = Vec::new();
    {
        let mut writer = StreamWriter::new(FixedLengthWriter::new(&mut buf), tree.clone());
        writer.write(&original).unwrap();
        writer.finish().unwrap();
    }

    let mut reader = StreamReader::new(FixedLengthReader::new(buf.as_slice()), tree);
    let roundtripped = reader.read().unwrap().expect("one record");
    let roundtripped = roundtripped.as_any().downcast_ref::<Person>().unwrap();
    assert_eq!(roundtripped.id, original.id);
    assert_eq!(roundtripped.name.trim_end(), original.name.trim_end());
}

#[test]
fn csv_round_trip_preserves_every_property() {
    let tree = Arc::new(header_detail_tree());
    let detail = Detail {
        kind: "D".into(),
        name: "crate".into(),
        count: 3,
    };

    let mut buf = Vec::new();
    {
        let mut writer = StreamWriter::new(CsvWriter::new(&mut buf), tree.clone());
        writer.write(&detail).unwrap();
        writer.finish().unwrap();
    }

    let mut reader = StreamReader::new(CsvReader::new(buf.as_slice()), tree);
    let roundtripped = reader.read().unwrap().expect("one record");
    let roundtripped = roundtripped.as_any().downcast_ref::<Detail>().unwrap();
    assert_eq!(roundtripped.name, detail.name);
    assert_eq!(roundtripped.count, detail.count);
}
