// Copyright ⓒ 2024-2025 Peter Morgan <peter.james.morgan@gmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Append primitive values to a growable buffer in Kafka wire order.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{Encode, Error, Result};

const STRING_LIMIT: usize = i16::MAX as usize;
const BYTES_LIMIT: usize = i32::MAX as usize;

/// An owned, append only buffer for one message.
///
/// Every `put_*` appends big-endian bytes at the current position. There is
/// no way to rewind: fields must be written in the order declared for the
/// version being encoded.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Encoder {
    buffer: BytesMut,
}

impl Encoder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// The number of bytes written so far.
    #[must_use]
    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    pub fn put_i8(&mut self, value: i8) -> Result<()> {
        self.buffer.put_i8(value);
        Ok(())
    }

    pub fn put_i16(&mut self, value: i16) -> Result<()> {
        self.buffer.put_i16(value);
        Ok(())
    }

    pub fn put_i32(&mut self, value: i32) -> Result<()> {
        self.buffer.put_i32(value);
        Ok(())
    }

    pub fn put_i64(&mut self, value: i64) -> Result<()> {
        self.buffer.put_i64(value);
        Ok(())
    }

    /// A non-nullable string: `int16` length followed by UTF-8 bytes.
    pub fn put_string(&mut self, value: &str) -> Result<()> {
        let length = limit("string", value.len(), STRING_LIMIT)
            .and_then(|length| i16::try_from(length).map_err(Into::into))?;

        self.buffer.put_i16(length);
        self.buffer.put_slice(value.as_bytes());
        Ok(())
    }

    /// A nullable string, where `None` is written as a length of `-1`.
    pub fn put_nullable_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            None => self.put_i16(-1),
            Some(value) => self.put_string(value),
        }
    }

    /// A non-nullable byte blob: `int32` length followed by the bytes.
    pub fn put_bytes(&mut self, value: &[u8]) -> Result<()> {
        let length = limit("bytes", value.len(), BYTES_LIMIT)
            .and_then(|length| i32::try_from(length).map_err(Into::into))?;

        self.buffer.put_i32(length);
        self.buffer.put_slice(value);
        Ok(())
    }

    pub fn put_nullable_bytes(&mut self, value: Option<&[u8]>) -> Result<()> {
        match value {
            None => self.put_i32(-1),
            Some(value) => self.put_bytes(value),
        }
    }

    pub fn put_array_length(&mut self, length: usize) -> Result<()> {
        limit("array", length, BYTES_LIMIT)
            .and_then(|length| i32::try_from(length).map_err(Into::into))
            .and_then(|length| self.put_i32(length))
    }

    pub fn put_nullable_array_length(&mut self, length: Option<usize>) -> Result<()> {
        match length {
            None => self.put_i32(-1),
            Some(length) => self.put_array_length(length),
        }
    }

    /// Write the element count, then each element at `version`.
    pub fn put_array<T>(&mut self, items: &mut [T], version: i16) -> Result<()>
    where
        T: Encode,
    {
        self.put_array_length(items.len())?;

        items
            .iter_mut()
            .try_for_each(|item| item.encode(self, version))
    }

    pub fn put_nullable_array<T>(&mut self, items: Option<&mut [T]>, version: i16) -> Result<()>
    where
        T: Encode,
    {
        match items {
            None => self.put_nullable_array_length(None),
            Some(items) => self.put_array(items, version),
        }
    }

    /// Overwrite a previously written `int32`, used for the frame size prefix.
    pub(crate) fn patch_i32(&mut self, position: usize, value: i32) -> Result<()> {
        let end = position + size_of::<i32>();

        if end > self.buffer.len() {
            return Err(Error::InsufficientData {
                wanted: size_of::<i32>(),
                remaining: self.buffer.len().saturating_sub(position),
            });
        }

        self.buffer[position..end].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }
}

fn limit(kind: &'static str, length: usize, limit: usize) -> Result<usize> {
    if length > limit {
        Err(Error::EncodeValueTooLarge {
            kind,
            length,
            limit,
        })
    } else {
        Ok(length)
    }
}
