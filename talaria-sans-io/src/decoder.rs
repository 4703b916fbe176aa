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

//! Read primitive values from a borrowed frame, mirroring [`crate::Encoder`].

use std::str;

use bytes::Bytes;

use crate::{Decode, Error, Result};

/// A forward only view over received bytes.
///
/// The first failing read exhausts the view, so no later read on the same
/// decoder can succeed from a misaligned position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Decoder<'a> {
    encoded: &'a [u8],
    position: usize,
}

impl<'a> Decoder<'a> {
    #[must_use]
    pub fn new(encoded: &'a [u8]) -> Self {
        Self {
            encoded,
            position: 0,
        }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.encoded.len() - self.position
    }

    fn exhaust(&mut self) {
        self.position = self.encoded.len();
    }

    fn fused<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.exhaust();
        }

        result
    }

    fn take(&mut self, wanted: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();

        if wanted > remaining {
            self.exhaust();
            return Err(Error::InsufficientData { wanted, remaining });
        }

        let encoded = self.encoded;
        let start = self.position;
        self.position += wanted;
        Ok(&encoded[start..self.position])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.take(N).and_then(|taken| {
            <[u8; N]>::try_from(taken).map_err(|_| Error::InsufficientData {
                wanted: N,
                remaining: taken.len(),
            })
        })
    }

    pub fn get_i8(&mut self) -> Result<i8> {
        self.take_array().map(i8::from_be_bytes)
    }

    pub fn get_i16(&mut self) -> Result<i16> {
        self.take_array().map(i16::from_be_bytes)
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        self.take_array().map(i32::from_be_bytes)
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        self.take_array().map(i64::from_be_bytes)
    }

    fn string_of(&mut self, length: usize) -> Result<String> {
        let result = self
            .take(length)
            .and_then(|taken| str::from_utf8(taken).map(str::to_owned).map_err(Into::into));

        self.fused(result)
    }

    pub fn get_string(&mut self) -> Result<String> {
        let length = self.get_i16().map(i32::from)?;
        let length = self.non_nullable(length)?;
        self.string_of(length)
    }

    pub fn get_nullable_string(&mut self) -> Result<Option<String>> {
        let length = self.get_i16().map(i32::from)?;

        self.nullable(length)?
            .map(|length| self.string_of(length))
            .transpose()
    }

    pub fn get_bytes(&mut self) -> Result<Bytes> {
        let length = self.get_i32()?;
        let length = self.non_nullable(length)?;
        self.take(length).map(Bytes::copy_from_slice)
    }

    pub fn get_nullable_bytes(&mut self) -> Result<Option<Bytes>> {
        let length = self.get_i32()?;

        self.nullable(length)?
            .map(|length| self.take(length).map(Bytes::copy_from_slice))
            .transpose()
    }

    pub fn get_array_length(&mut self) -> Result<usize> {
        let length = self.get_i32()?;
        self.non_nullable(length)
    }

    pub fn get_nullable_array_length(&mut self) -> Result<Option<usize>> {
        let length = self.get_i32()?;
        self.nullable(length)
    }

    /// Read an element count, then that many elements at `version`.
    pub fn get_array<T>(&mut self, version: i16) -> Result<Vec<T>>
    where
        T: Decode,
    {
        let length = self.get_array_length()?;
        self.elements(length, version)
    }

    pub fn get_nullable_array<T>(&mut self, version: i16) -> Result<Option<Vec<T>>>
    where
        T: Decode,
    {
        self.get_nullable_array_length()?
            .map(|length| self.elements(length, version))
            .transpose()
    }

    fn elements<T>(&mut self, length: usize, version: i16) -> Result<Vec<T>>
    where
        T: Decode,
    {
        // every element occupies at least one byte
        let mut elements = Vec::with_capacity(length.min(self.remaining()));

        for _ in 0..length {
            let element = T::decode(self, version);
            elements.push(self.fused(element)?);
        }

        Ok(elements)
    }

    fn non_nullable(&mut self, length: i32) -> Result<usize> {
        let result = usize::try_from(length).map_err(|_| Error::MalformedLength(length));
        self.fused(result)
    }

    fn nullable(&mut self, length: i32) -> Result<Option<usize>> {
        if length == -1 {
            Ok(None)
        } else {
            self.non_nullable(length).map(Some)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers() -> Result<()> {
        let encoded = [254, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14];
        let mut decoder = Decoder::new(&encoded[..]);

        assert_eq!(-2, decoder.get_i8()?);
        assert_eq!(0x0102, decoder.get_i16()?);
        assert_eq!(0x0304_0506, decoder.get_i32()?);
        assert_eq!(0x0708_090a_0b0c_0d0e, decoder.get_i64()?);
        assert_eq!(0, decoder.remaining());

        Ok(())
    }

    #[test]
    fn insufficient_data() {
        let encoded = [0, 0, 1];
        let mut decoder = Decoder::new(&encoded[..]);

        assert_eq!(
            Err(Error::InsufficientData {
                wanted: 4,
                remaining: 3
            }),
            decoder.get_i32()
        );
    }

    #[test]
    fn fused_after_failure() {
        // a string claiming 5 bytes with only 2 present, followed by what
        // would otherwise be a valid int16
        let encoded = [0, 5, b'a', b'b'];
        let mut decoder = Decoder::new(&encoded[..]);

        assert!(matches!(
            decoder.get_string(),
            Err(Error::InsufficientData { wanted: 5, .. })
        ));

        assert_eq!(0, decoder.remaining());
        assert!(decoder.get_i16().is_err());
        assert!(decoder.get_i8().is_err());
    }

    #[test]
    fn nullable_string() -> Result<()> {
        let encoded = [255, 255, 0, 0, 0, 2, b'h', b'i'];
        let mut decoder = Decoder::new(&encoded[..]);

        assert_eq!(None, decoder.get_nullable_string()?);
        assert_eq!(Some(String::new()), decoder.get_nullable_string()?);
        assert_eq!(Some(String::from("hi")), decoder.get_nullable_string()?);
        Ok(())
    }

    #[test]
    fn non_nullable_string_rejects_null() {
        let encoded = [255, 255];
        let mut decoder = Decoder::new(&encoded[..]);

        assert_eq!(Err(Error::MalformedLength(-1)), decoder.get_string());
    }

    #[test]
    fn malformed_lengths() {
        assert_eq!(
            Err(Error::MalformedLength(-2)),
            Decoder::new(&[255, 254][..]).get_nullable_string()
        );

        assert_eq!(
            Err(Error::MalformedLength(-2)),
            Decoder::new(&[255, 255, 255, 254][..]).get_nullable_array_length()
        );

        assert_eq!(
            Err(Error::MalformedLength(i32::MIN)),
            Decoder::new(&[128, 0, 0, 0][..]).get_nullable_bytes()
        );
    }

    #[test]
    fn invalid_utf8() {
        let encoded = [0, 2, 0xc3, 0x28, 0, 1];
        let mut decoder = Decoder::new(&encoded[..]);

        assert!(matches!(decoder.get_string(), Err(Error::Utf8(_))));
        assert_eq!(0, decoder.remaining());
    }

    #[test]
    fn nullable_bytes() -> Result<()> {
        let encoded = [255, 255, 255, 255, 0, 0, 0, 0, 0, 0, 0, 1, 42];
        let mut decoder = Decoder::new(&encoded[..]);

        assert_eq!(None, decoder.get_nullable_bytes()?);
        assert_eq!(Some(Bytes::new()), decoder.get_nullable_bytes()?);
        assert_eq!(Bytes::from_static(&[42]), decoder.get_bytes()?);
        Ok(())
    }

    #[test]
    fn hostile_array_count() {
        let encoded = [127, 255, 255, 255];
        let mut decoder = Decoder::new(&encoded[..]);

        assert!(matches!(
            decoder.get_array::<crate::begin_quorum_epoch_request::PartitionData>(0),
            Err(Error::InsufficientData { .. })
        ));
    }
}
