//! XML codec
//!
//! Decoding maps an element's children onto a [`Map`] keyed by tag name.
//! Repeated sibling tags collapse into a [`Value::List`] under that key, which
//! is the only place the decoder invents a list. A single child is never
//! promoted, so a one-element list written by [`encode_xml`] reads back as a
//! plain value. Attributes, comments and processing instructions are ignored.
//!
//! Encoding writes a caller-named root element. Map entries become child
//! elements whose tags are the slugified keys, a list under a key becomes
//! repeated siblings, and a list that is itself element content is written as
//! `<item>` children.

use crate::codec::Format;
use crate::error::{ConversionError, ConversionResult, DecodeError, ShapeError};
use crate::value::{Map, RecordSet, Value};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;

/// Element being assembled during decoding
struct Frame {
    tag: String,
    children: Map,
    text: String,
}

impl Frame {
    fn new(tag: String) -> Self {
        Self {
            tag,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn finish(self) -> (String, Value) {
        let value = if !self.children.is_empty() {
            Value::Map(self.children)
        } else if !self.text.is_empty() {
            Value::text(self.text)
        } else {
            Value::Null
        };
        (self.tag, value)
    }
}

/// Parse an XML document, returning the root's tag and its decoded content
pub fn decode_document(text: &str) -> Result<(String, Value), DecodeError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            DecodeError::new(
                Format::Xml,
                format!("{} (byte {})", e, reader.buffer_position()),
            )
        })?;

        match event {
            Event::Start(e) => stack.push(Frame::new(tag_name(&e)?)),
            Event::Empty(e) => close(Frame::new(tag_name(&e)?), &mut stack, &mut root)?,
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| DecodeError::new(Format::Xml, "unexpected closing tag"))?;
                close(frame, &mut stack, &mut root)?;
            }
            Event::Text(e) => {
                let content = e
                    .unescape()
                    .map_err(|e| DecodeError::new(Format::Xml, e.to_string()))?;
                push_text(&mut stack, &content)?;
            }
            Event::CData(e) => {
                let content = std::str::from_utf8(&e)
                    .map_err(|e| DecodeError::new(Format::Xml, e.to_string()))?;
                push_text(&mut stack, content)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DecodeError::new(
            Format::Xml,
            format!("unclosed element <{}>", open.tag),
        ));
    }

    root.ok_or_else(|| DecodeError::new(Format::Xml, "document has no root element"))
}

/// Parse an XML document into the value of its root element
pub fn decode_xml(text: &str) -> Result<Value, DecodeError> {
    decode_document(text).map(|(_, value)| value)
}

fn tag_name(start: &BytesStart<'_>) -> Result<String, DecodeError> {
    std::str::from_utf8(start.name().as_ref())
        .map(str::to_string)
        .map_err(|e| DecodeError::new(Format::Xml, e.to_string()))
}

fn push_text(stack: &mut [Frame], content: &str) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(frame) => {
            frame.text.push_str(content);
            Ok(())
        }
        None if content.trim().is_empty() => Ok(()),
        None => Err(DecodeError::new(Format::Xml, "text outside the root element")),
    }
}

fn close(
    frame: Frame,
    stack: &mut [Frame],
    root: &mut Option<(String, Value)>,
) -> Result<(), DecodeError> {
    let (tag, value) = frame.finish();
    match stack.last_mut() {
        Some(parent) => {
            attach(&mut parent.children, tag, value);
            Ok(())
        }
        None if root.is_some() => Err(DecodeError::new(
            Format::Xml,
            format!("second root element <{}>", tag),
        )),
        None => {
            *root = Some((tag, value));
            Ok(())
        }
    }
}

fn attach(children: &mut Map, tag: String, value: Value) {
    match children.get_mut(&tag) {
        // An element never decodes to a list, so a list here is a promoted key.
        Some(Value::List(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::replace(existing, Value::Null);
            *existing = Value::List(vec![first, value]);
        }
        None => {
            children.insert(tag, value);
        }
    }
}

/// Rows of a document following the `<root><item>...</item></root>` layout
///
/// Only direct children of the root named `item_tag` are rows; items without
/// child elements are skipped.
pub fn items_to_records(root_value: Value, item_tag: &str) -> Result<RecordSet, ShapeError> {
    let mut root = match root_value {
        Value::Map(map) => map,
        _ => return Ok(Vec::new()),
    };

    let items = match root.remove(item_tag) {
        Some(Value::List(items)) => items,
        Some(single) => vec![single],
        None => return Ok(Vec::new()),
    };

    let rows = items
        .into_iter()
        .filter(|item| matches!(item, Value::Map(_)))
        .collect();
    Value::List(rows).into_record_set()
}

/// Tag form of a key: lower-cased with spaces replaced by underscores
pub fn slugify(key: &str) -> String {
    key.to_lowercase().replace(' ', "_")
}

/// Render a value as an XML document under a `root` element
pub fn encode_xml(
    value: &Value,
    root: &str,
    item_tag: &str,
    indent: Option<usize>,
) -> ConversionResult<String> {
    let mut writer = match indent {
        Some(width) if width > 0 => Writer::new_with_indent(Vec::new(), b' ', width),
        _ => Writer::new(Vec::new()),
    };

    write_element(&mut writer, root, value, item_tag)?;

    String::from_utf8(writer.into_inner()).map_err(|e| ConversionError::encode(Format::Xml, e))
}

fn write_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    value: &Value,
    item_tag: &str,
) -> ConversionResult<()> {
    if tag.is_empty() {
        return Err(ConversionError::shape("empty key cannot be used as an XML tag"));
    }

    match value {
        Value::Null => emit(writer, Event::Empty(BytesStart::new(tag))),
        Value::Scalar(scalar) => {
            emit(writer, Event::Start(BytesStart::new(tag)))?;
            emit(writer, Event::Text(BytesText::new(scalar.as_str())))?;
            emit(writer, Event::End(BytesEnd::new(tag)))
        }
        Value::Map(map) => {
            emit(writer, Event::Start(BytesStart::new(tag)))?;
            for (key, child) in map.iter() {
                let child_tag = slugify(key);
                match child {
                    Value::List(items) => {
                        for item in items {
                            write_element(writer, &child_tag, item, item_tag)?;
                        }
                    }
                    other => write_element(writer, &child_tag, other, item_tag)?,
                }
            }
            emit(writer, Event::End(BytesEnd::new(tag)))
        }
        Value::List(items) => {
            emit(writer, Event::Start(BytesStart::new(tag)))?;
            for item in items {
                write_element(writer, item_tag, item, item_tag)?;
            }
            emit(writer, Event::End(BytesEnd::new(tag)))
        }
    }
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> ConversionResult<()> {
    writer
        .write_event(event)
        .map_err(|e| ConversionError::encode(Format::Xml, e))
}
