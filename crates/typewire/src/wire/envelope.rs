// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Envelope framing: header, payload section, schema section.
//!
//! ```text
//! +--------+-------+-------+------+-------------+---------+------+-------------+--------+
//! | "tywr" | major | minor | 0xA0 | len (u32)   | payload | 0xA1 | len (u32)   | schema |
//! +--------+-------+-------+------+-------------+---------+------+-------------+--------+
//! ```

use crate::config::{ENVELOPE_MAGIC, HEADER_LEN, SECTION_PAYLOAD, SECTION_SCHEMA, VERSION_MAJOR, VERSION_MINOR};
use crate::error::{Result, SerializationError};
use crate::schema::{FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeKind, ValueType};
use crate::wire::{WireReader, WireWriter};

const VT_PRIMITIVE: u8 = 0;
const VT_REFERENCE: u8 = 1;
const VT_LIST: u8 = 2;
const VT_ANY: u8 = 3;

/// Nesting limit for `list<list<...>>` value types on decode.
const MAX_VALUE_TYPE_DEPTH: usize = 64;

/// Smallest possible encoding of one notation (empty name, no fields).
const MIN_NOTATION_LEN: usize = 4 + 1 + 1 + 4 + 4;

/// Wire form of a [`TypeDescriptor`]: supertype and interfaces by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeNotation {
    pub name: String,
    pub kind: TypeKind,
    pub super_type: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl From<&TypeDescriptor> for TypeNotation {
    fn from(desc: &TypeDescriptor) -> Self {
        Self {
            name: desc.name().to_string(),
            kind: desc.kind(),
            super_type: desc.super_type().map(|s| s.name().to_string()),
            interfaces: desc.interfaces().to_vec(),
            fields: desc.fields().to_vec(),
        }
    }
}

impl TypeNotation {
    fn write(&self, w: &mut WireWriter) -> Result<()> {
        w.write_str(&self.name)?;
        w.write_u8(self.kind.code());
        match &self.super_type {
            Some(parent) => {
                w.write_u8(1);
                w.write_str(parent)?;
            }
            None => w.write_u8(0),
        }
        w.write_len(self.interfaces.len())?;
        for iface in &self.interfaces {
            w.write_str(iface)?;
        }
        w.write_len(self.fields.len())?;
        for field in &self.fields {
            w.write_str(field.name())?;
            write_value_type(w, field.value_type())?;
            w.write_u8(u8::from(field.is_nullable()));
        }
        Ok(())
    }

    fn read(r: &mut WireReader<'_>) -> Result<Self> {
        let name = r.read_string()?;
        let kind_code = r.read_u8()?;
        let kind = TypeKind::from_code(kind_code).ok_or_else(|| {
            SerializationError::InvalidEnvelope(format!("unknown type kind {} for {}", kind_code, name))
        })?;
        let super_type = match r.read_u8()? {
            0 => None,
            1 => Some(r.read_string()?),
            other => {
                return Err(SerializationError::InvalidEnvelope(format!(
                    "invalid supertype flag {} for {}",
                    other, name
                )))
            }
        };
        let interface_count = r.read_len(4)?;
        let mut interfaces = Vec::with_capacity(interface_count);
        for _ in 0..interface_count {
            interfaces.push(r.read_string()?);
        }
        let field_count = r.read_len(4 + 1 + 1)?;
        let mut fields = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            let field_name = r.read_string()?;
            let value_type = read_value_type(r, 0)?;
            let nullable = match r.read_u8()? {
                0 => false,
                1 => true,
                other => {
                    return Err(SerializationError::InvalidEnvelope(format!(
                        "invalid nullability flag {} on {}.{}",
                        other, name, field_name
                    )))
                }
            };
            fields.push(FieldDescriptor::new(field_name, value_type, nullable)?);
        }
        Ok(Self {
            name,
            kind,
            super_type,
            interfaces,
            fields,
        })
    }
}

fn write_value_type(w: &mut WireWriter, vt: &ValueType) -> Result<()> {
    match vt {
        ValueType::Primitive(kind) => {
            w.write_u8(VT_PRIMITIVE);
            w.write_u8(kind.code());
        }
        ValueType::Reference(name) => {
            w.write_u8(VT_REFERENCE);
            w.write_str(name)?;
        }
        ValueType::List(element) => {
            w.write_u8(VT_LIST);
            write_value_type(w, element)?;
        }
        ValueType::Any => w.write_u8(VT_ANY),
    }
    Ok(())
}

fn read_value_type(r: &mut WireReader<'_>, depth: usize) -> Result<ValueType> {
    if depth > MAX_VALUE_TYPE_DEPTH {
        return Err(SerializationError::InvalidEnvelope(
            "value type nesting too deep".into(),
        ));
    }
    match r.read_u8()? {
        VT_PRIMITIVE => {
            let code = r.read_u8()?;
            PrimitiveKind::from_code(code)
                .map(ValueType::Primitive)
                .ok_or_else(|| SerializationError::InvalidEnvelope(format!("unknown primitive code {}", code)))
        }
        VT_REFERENCE => Ok(ValueType::Reference(r.read_string()?)),
        VT_LIST => Ok(ValueType::list(read_value_type(r, depth + 1)?)),
        VT_ANY => Ok(ValueType::Any),
        other => Err(SerializationError::InvalidEnvelope(format!(
            "unknown value type tag {}",
            other
        ))),
    }
}

/// The unit exchanged between nodes: encoded payload plus its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    payload: Vec<u8>,
    schema: Vec<TypeNotation>,
}

impl Envelope {
    pub fn new(payload: Vec<u8>, schema: Vec<TypeNotation>) -> Self {
        Self { payload, schema }
    }

    /// Encoded root value.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Type notations in first-reference order.
    pub fn schema(&self) -> &[TypeNotation] {
        &self.schema
    }

    /// Frame the envelope: header, payload section, schema section.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut schema = WireWriter::new();
        schema.write_len(self.schema.len())?;
        for notation in &self.schema {
            notation.write(&mut schema)?;
        }

        let mut w = WireWriter::new();
        w.write_bytes(&ENVELOPE_MAGIC);
        w.write_u16_le(VERSION_MAJOR);
        w.write_u16_le(VERSION_MINOR);
        w.write_u8(SECTION_PAYLOAD);
        w.write_blob(&self.payload)?;
        w.write_u8(SECTION_SCHEMA);
        w.write_blob(&schema.into_bytes())?;
        Ok(w.into_bytes())
    }

    /// Parse a framed envelope.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(SerializationError::InvalidEnvelope(format!(
                "{} bytes is shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }
        let mut r = WireReader::new(bytes);
        if r.read_bytes(ENVELOPE_MAGIC.len())? != ENVELOPE_MAGIC {
            return Err(SerializationError::InvalidEnvelope("bad magic".into()));
        }
        let major = r.read_u16_le()?;
        let minor = r.read_u16_le()?;
        if major != VERSION_MAJOR {
            return Err(SerializationError::InvalidEnvelope(format!(
                "unsupported version {}.{}",
                major, minor
            )));
        }

        expect_section(&mut r, SECTION_PAYLOAD)?;
        let payload = r.read_blob()?.to_vec();
        expect_section(&mut r, SECTION_SCHEMA)?;
        let schema_bytes = r.read_blob()?;
        if !r.is_exhausted() {
            return Err(SerializationError::InvalidEnvelope(format!(
                "{} trailing bytes after schema",
                r.remaining()
            )));
        }

        let mut sr = WireReader::new(schema_bytes);
        let count = sr.read_len(MIN_NOTATION_LEN)?;
        let mut schema: Vec<TypeNotation> = Vec::with_capacity(count);
        for _ in 0..count {
            let notation = TypeNotation::read(&mut sr)?;
            if schema.iter().any(|n| n.name == notation.name) {
                return Err(SerializationError::InvalidEnvelope(format!(
                    "type {} described twice",
                    notation.name
                )));
            }
            schema.push(notation);
        }
        if !sr.is_exhausted() {
            return Err(SerializationError::InvalidEnvelope(
                "trailing bytes in schema section".into(),
            ));
        }

        Ok(Self { payload, schema })
    }
}

fn expect_section(r: &mut WireReader<'_>, tag: u8) -> Result<()> {
    let found = r.read_u8()?;
    if found != tag {
        return Err(SerializationError::InvalidEnvelope(format!(
            "expected section {:#04x}, found {:#04x}",
            tag, found
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TypeDescriptorBuilder;
    use std::sync::Arc;

    fn sample_schema() -> Vec<TypeNotation> {
        let base = Arc::new(
            TypeDescriptorBuilder::composite("demo.Base")
                .field("id", PrimitiveKind::U64)
                .build()
                .unwrap(),
        );
        let child = TypeDescriptorBuilder::composite("demo.Child")
            .super_type(base.clone())
            .list("tags", ValueType::Primitive(PrimitiveKind::String), true)
            .any("extra", true)
            .interface_name("demo.Marker")
            .build()
            .unwrap();
        vec![TypeNotation::from(&child), TypeNotation::from(base.as_ref())]
    }

    #[test]
    fn test_envelope_bytes_roundtrip() {
        let envelope = Envelope::new(vec![0x00], sample_schema());
        let bytes = envelope.to_bytes().unwrap();
        assert_eq!(&bytes[..4], b"tywr");
        assert_eq!(Envelope::from_bytes(&bytes).unwrap(), envelope);
    }

    #[test]
    fn test_bad_magic_rejected() {
        let mut bytes = Envelope::new(vec![0x00], vec![]).to_bytes().unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            Envelope::from_bytes(&bytes),
            Err(SerializationError::InvalidEnvelope(_))
        ));
    }

    #[test]
    fn test_unsupported_major_rejected() {
        let mut bytes = Envelope::new(vec![0x00], vec![]).to_bytes().unwrap();
        bytes[4] = 9;
        assert!(Envelope::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_truncated_envelope_rejected() {
        let bytes = Envelope::new(vec![0x00], sample_schema()).to_bytes().unwrap();
        for cut in [3, HEADER_LEN, HEADER_LEN + 3, bytes.len() - 1] {
            assert!(Envelope::from_bytes(&bytes[..cut]).is_err(), "cut at {}", cut);
        }
    }

    #[test]
    fn test_nullable_primitive_in_schema_rejected() {
        let mut w = WireWriter::new();
        w.write_len(1).unwrap();
        w.write_str("demo.Bad").unwrap();
        w.write_u8(TypeKind::Composite.code());
        w.write_u8(0);
        w.write_len(0).unwrap();
        w.write_len(1).unwrap();
        w.write_str("n").unwrap();
        w.write_u8(VT_PRIMITIVE);
        w.write_u8(PrimitiveKind::I32.code());
        w.write_u8(1);
        let schema = w.into_bytes();

        let mut framed = WireWriter::new();
        framed.write_bytes(&ENVELOPE_MAGIC);
        framed.write_u16_le(VERSION_MAJOR);
        framed.write_u16_le(VERSION_MINOR);
        framed.write_u8(SECTION_PAYLOAD);
        framed.write_blob(&[0x00]).unwrap();
        framed.write_u8(SECTION_SCHEMA);
        framed.write_blob(&schema).unwrap();

        assert!(matches!(
            Envelope::from_bytes(&framed.into_bytes()),
            Err(SerializationError::NullabilityViolation { .. })
        ));
    }
}
