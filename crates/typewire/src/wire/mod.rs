// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary wire format.
//!
//! An envelope is an 8-byte header followed by two length-prefixed
//! sections: the payload (the root value) and the schema (one
//! [`TypeNotation`] per referenced type). Inside the payload every value
//! starts with a one-byte tag:
//!
//! | Tag | Value | Body |
//! |-----|-------|------|
//! | `0x00` | null | - |
//! | `0x01` | bool | u8 |
//! | `0x02`..`0x0B` | integers, floats | little-endian |
//! | `0x0C` | char | u32 scalar value |
//! | `0x0D` | string | u32 len + UTF-8 |
//! | `0x0E` | bytes | u32 len + bytes |
//! | `0x10` | list | u32 count + values |
//! | `0x11` | enum constant | u32 type index + u32 ordinal |
//! | `0x12` | object | u32 type index + u32 field count + values |
//! | `0x13` | inline object | same as object, never assigned an id |
//! | `0x14` | back-reference | u32 object id |

mod cursor;
mod envelope;

pub use cursor::{WireReader, WireWriter};
pub use envelope::{Envelope, TypeNotation};

pub const TAG_NULL: u8 = 0x00;
pub const TAG_BOOL: u8 = 0x01;
pub const TAG_U8: u8 = 0x02;
pub const TAG_I8: u8 = 0x03;
pub const TAG_U16: u8 = 0x04;
pub const TAG_I16: u8 = 0x05;
pub const TAG_U32: u8 = 0x06;
pub const TAG_I32: u8 = 0x07;
pub const TAG_U64: u8 = 0x08;
pub const TAG_I64: u8 = 0x09;
pub const TAG_F32: u8 = 0x0A;
pub const TAG_F64: u8 = 0x0B;
pub const TAG_CHAR: u8 = 0x0C;
pub const TAG_STRING: u8 = 0x0D;
pub const TAG_BYTES: u8 = 0x0E;
pub const TAG_LIST: u8 = 0x10;
pub const TAG_ENUM: u8 = 0x11;
pub const TAG_OBJECT: u8 = 0x12;
pub const TAG_INLINE_OBJECT: u8 = 0x13;
pub const TAG_BACKREF: u8 = 0x14;
