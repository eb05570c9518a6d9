//! quick-xml backed [`XmlCodec`]
//!
//! Decoding produces an insertion-ordered `serde_json` tree:
//! - element text becomes a string, empty elements become `{}`
//! - attributes become string fields; text next to attributes or children
//!   is stored under `$t`
//! - repeated names become sequences, and names listed in `force_array`
//!   are always sequences; absent ones are added as `[]` under the root
//!
//! Encoding is the inverse for options trees: mappings nest, sequences
//! repeat the tag, scalars become text, and the reserved `@`/`#` keys carry
//! attributes and text of one element.

use std::collections::BTreeSet;
use std::fmt::Display;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use serde_json::{Map, Value};
use tradelink_core::XmlCodec;
use tradelink_domain::constants::{ATTRIBUTES_KEY, DECODED_TEXT_KEY, TEXT_KEY};
use tradelink_domain::{ApiError, Result};

use crate::errors::InfraError;

/// Stateless XML codec
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickXmlCodec;

impl QuickXmlCodec {
    pub fn new() -> Self {
        Self
    }
}

impl XmlCodec for QuickXmlCodec {
    fn to_structured(&self, xml: &str, force_array: &BTreeSet<String>) -> Result<Value> {
        let mut decoder = Decoder { force_array, seen: BTreeSet::new() };
        let (root_name, mut content) = decoder.parse(xml)?;

        if let Value::Object(fields) = &mut content {
            for name in force_array {
                if !decoder.seen.contains(name.as_str()) {
                    fields.insert(name.clone(), Value::Array(Vec::new()));
                }
            }
        }

        let mut document = Map::new();
        document.insert(root_name, content);
        Ok(Value::Object(document))
    }

    fn to_xml(&self, root: &str, attributes: &[(&str, &str)], body: &Map<String, Value>) -> Result<String> {
        validate_name(root)?;

        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(encode_error)?;

        let mut start = BytesStart::new(root);
        for (key, value) in attributes {
            validate_name(key)?;
            start.push_attribute((*key, *value));
        }
        writer.write_event(Event::Start(start)).map_err(encode_error)?;
        write_children(&mut writer, body)?;
        writer.write_event(Event::End(BytesEnd::new(root))).map_err(encode_error)?;

        String::from_utf8(writer.into_inner()).map_err(encode_error)
    }
}

/* -------------------------------------------------------------------------- */
/* Decoding */
/* -------------------------------------------------------------------------- */

struct Frame {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self> {
        let name = utf8(start.name().as_ref())?;
        let mut fields = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(decode_error)?;
            let key = utf8(attribute.key.as_ref())?;
            let value = attribute.unescape_value().map_err(decode_error)?.into_owned();
            fields.insert(key, Value::String(value));
        }
        Ok(Self { name, fields, text: String::new() })
    }

    fn into_value(self) -> Value {
        let text = self.text.trim();
        if self.fields.is_empty() {
            return if text.is_empty() {
                Value::Object(Map::new())
            } else {
                Value::String(text.to_string())
            };
        }
        let mut fields = self.fields;
        if !text.is_empty() {
            fields.insert(DECODED_TEXT_KEY.to_string(), Value::String(text.to_string()));
        }
        Value::Object(fields)
    }
}

struct Decoder<'a> {
    force_array: &'a BTreeSet<String>,
    seen: BTreeSet<String>,
}

impl Decoder<'_> {
    fn parse(&mut self, xml: &str) -> Result<(String, Value)> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Frame> = Vec::new();
        let mut root: Option<(String, Value)> = None;

        loop {
            match reader.read_event().map_err(InfraError::from)? {
                Event::Start(start) => {
                    Self::ensure_single_root(&stack, root.as_ref())?;
                    stack.push(Frame::open(&start)?);
                }
                Event::Empty(start) => {
                    Self::ensure_single_root(&stack, root.as_ref())?;
                    let frame = Frame::open(&start)?;
                    self.close(frame, &mut stack, &mut root);
                }
                Event::End(_) => {
                    let frame = stack
                        .pop()
                        .ok_or_else(|| ApiError::Decode("unexpected closing tag".to_string()))?;
                    self.close(frame, &mut stack, &mut root);
                }
                Event::Text(text) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&text.unescape().map_err(decode_error)?);
                    }
                }
                Event::CData(data) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(ApiError::Decode(format!("element `{}` is never closed", open.name)));
        }
        root.ok_or_else(|| ApiError::Decode("document has no root element".to_string()))
    }

    fn ensure_single_root(stack: &[Frame], root: Option<&(String, Value)>) -> Result<()> {
        if stack.is_empty() && root.is_some() {
            return Err(ApiError::Decode("document has more than one root element".to_string()));
        }
        Ok(())
    }

    fn close(&mut self, frame: Frame, stack: &mut [Frame], root: &mut Option<(String, Value)>) {
        let name = frame.name.clone();
        let value = frame.into_value();

        let Some(parent) = stack.last_mut() else {
            *root = Some((name, value));
            return;
        };

        let forced = self.force_array.contains(&name);
        if forced {
            self.seen.insert(name.clone());
        }

        match parent.fields.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None if forced => {
                parent.fields.insert(name, Value::Array(vec![value]));
            }
            None => {
                parent.fields.insert(name, value);
            }
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Encoding */
/* -------------------------------------------------------------------------- */

type XmlWriter = Writer<Vec<u8>>;

fn write_children(writer: &mut XmlWriter, fields: &Map<String, Value>) -> Result<()> {
    for (name, value) in fields {
        if name == ATTRIBUTES_KEY {
            continue;
        }
        if name == TEXT_KEY {
            match value {
                Value::Object(nested) => write_children(writer, nested)?,
                Value::Array(_) => {
                    return Err(ApiError::InvalidOptions(format!(
                        "the `{TEXT_KEY}` key holds a sequence"
                    )))
                }
                scalar => write_text(writer, scalar)?,
            }
            continue;
        }
        write_element(writer, name, value)?;
    }
    Ok(())
}

fn write_element(writer: &mut XmlWriter, name: &str, value: &Value) -> Result<()> {
    validate_name(name)?;

    match value {
        Value::Array(items) => {
            for item in items {
                if item.is_array() {
                    return Err(ApiError::InvalidOptions(format!(
                        "`{name}` holds a sequence nested in a sequence"
                    )));
                }
                write_element(writer, name, item)?;
            }
            Ok(())
        }
        Value::Object(fields) => {
            let mut start = BytesStart::new(name);
            if let Some(attributes) = fields.get(ATTRIBUTES_KEY) {
                push_attributes(&mut start, name, attributes)?;
            }

            let has_content = fields.keys().any(|key| key != ATTRIBUTES_KEY);
            if !has_content {
                return writer.write_event(Event::Empty(start)).map_err(encode_error);
            }

            writer.write_event(Event::Start(start)).map_err(encode_error)?;
            write_children(writer, fields)?;
            writer.write_event(Event::End(BytesEnd::new(name))).map_err(encode_error)
        }
        Value::Null => writer.write_event(Event::Empty(BytesStart::new(name))).map_err(encode_error),
        scalar => {
            writer.write_event(Event::Start(BytesStart::new(name))).map_err(encode_error)?;
            write_text(writer, scalar)?;
            writer.write_event(Event::End(BytesEnd::new(name))).map_err(encode_error)
        }
    }
}

fn push_attributes(start: &mut BytesStart<'_>, element: &str, attributes: &Value) -> Result<()> {
    let Value::Object(attributes) = attributes else {
        return Err(ApiError::InvalidOptions(format!(
            "attributes of `{element}` must be a mapping"
        )));
    };
    for (key, value) in attributes {
        validate_name(key)?;
        let text = scalar_string(value).ok_or_else(|| {
            ApiError::InvalidOptions(format!("attribute `{key}` of `{element}` must be a scalar"))
        })?;
        start.push_attribute((key.as_str(), text.as_str()));
    }
    Ok(())
}

fn write_text(writer: &mut XmlWriter, value: &Value) -> Result<()> {
    let Some(text) = scalar_string(value) else {
        return Ok(());
    };
    writer.write_event(Event::Text(BytesText::new(&text))).map_err(encode_error)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|first| first.is_alphabetic() || first == '_');
    let valid_rest = chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));
    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(ApiError::InvalidOptions(format!("`{name}` is not a valid element name")))
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes).map(str::to_string).map_err(decode_error)
}

fn decode_error(err: impl Display) -> ApiError {
    ApiError::Decode(format!("malformed XML: {err}"))
}

fn encode_error(err: impl Display) -> ApiError {
    ApiError::InvalidOptions(format!("cannot serialize options: {err}"))
}
