//
// Copyright (c) 2016 KAMADA Ken'ichi.
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions
// are met:
// 1. Redistributions of source code must retain the above copyright
//    notice, this list of conditions and the following disclaimer.
// 2. Redistributions in binary form must reproduce the above copyright
//    notice, this list of conditions and the following disclaimer in the
//    documentation and/or other materials provided with the distribution.
//
// THIS SOFTWARE IS PROVIDED BY THE AUTHOR AND CONTRIBUTORS ``AS IS'' AND
// ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE
// ARE DISCLAIMED.  IN NO EVENT SHALL THE AUTHOR OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS
// OR SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION)
// HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT
// LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY
// OUT OF THE USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF
// SUCH DAMAGE.
//

use std::fmt;
use std::marker::PhantomData;

use crate::endian::Endian;
use crate::tiff::IfdEntry;
use crate::util::trim_nul;

/// An unsigned rational number, which is a pair of 32-bit unsigned integers.
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct Rational { pub num: u32, pub denom: u32 }

impl Rational {
    /// Converts the value to f64.  A zero denominator yields 0.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        if self.denom == 0 {
            return 0.0;
        }
        self.num as f64 / self.denom as f64
    }
}

impl From<(u32, u32)> for Rational {
    fn from(t: (u32, u32)) -> Rational {
        Rational { num: t.0, denom: t.1 }
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Rational({}/{})", self.num, self.denom)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.denom)
    }
}

/// A signed rational number, which is a pair of 32-bit signed integers.
#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct SRational { pub num: i32, pub denom: i32 }

impl SRational {
    /// Converts the value to f64.  A zero denominator yields 0.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        if self.denom == 0 {
            return 0.0;
        }
        self.num as f64 / self.denom as f64
    }
}

impl From<(i32, i32)> for SRational {
    fn from(t: (i32, i32)) -> SRational {
        SRational { num: t.0, denom: t.1 }
    }
}

impl fmt::Debug for SRational {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SRational({}/{})", self.num, self.denom)
    }
}

/// Typed accessors for the values of IFD entries.
///
/// Offsets stored in entries are relative to `tiff_start`.  A value
/// whose total size (count times the width of the declared type) is
/// 4 bytes or less is stored inline in the entry itself.
///
/// No accessor panics.  A value that does not fit in the buffer reads
/// as zero, an empty string or an empty slice.
pub struct ValueReader<'a, E> {
    buf: &'a [u8],
    tiff_start: usize,
    endian: PhantomData<E>,
}

impl<'a, E> Clone for ValueReader<'a, E> {
    fn clone(&self) -> Self {
        Self { buf: self.buf, tiff_start: self.tiff_start, endian: PhantomData }
    }
}

impl<'a, E> ValueReader<'a, E> where E: Endian {
    pub fn new(buf: &'a [u8], tiff_start: usize) -> Self {
        Self { buf, tiff_start, endian: PhantomData }
    }

    /// Returns the whole buffer.
    #[inline]
    pub fn buf(&self) -> &'a [u8] {
        self.buf
    }

    #[inline]
    pub fn tiff_start(&self) -> usize {
        self.tiff_start
    }

    // Offset-stored values ignore the inline rule.  Rationals are
    // always 8 bytes or more, so they never fit inline anyway.
    fn offset_area(&self, entry: &IfdEntry, nested: usize) -> Option<usize> {
        self.tiff_start.checked_add(entry.value_offset as usize)?
            .checked_add(nested)
    }

    // The natural width is used when the declared type is unknown.
    fn locate(&self, entry: &IfdEntry, natural_width: usize)
              -> Option<usize> {
        let width = entry.type_width().unwrap_or(natural_width);
        let len = (entry.count as usize).checked_mul(width)?;
        if len <= 4 {
            Some(entry.inline_at())
        } else {
            self.offset_area(entry, 0)
        }
    }

    fn slice(&self, start: usize, len: usize) -> Option<&'a [u8]> {
        self.buf.get(start..start.checked_add(len)?)
    }

    /// Returns `count` bytes of the value.
    pub fn bytes(&self, entry: &IfdEntry) -> &'a [u8] {
        self.locate(entry, 1)
            .and_then(|start| self.slice(start, entry.count as usize))
            .unwrap_or(&[])
    }

    /// Returns the value as a string with trailing NULs removed.
    pub fn string(&self, entry: &IfdEntry) -> String {
        String::from_utf8_lossy(trim_nul(self.bytes(entry))).into_owned()
    }

    /// Returns the first inline byte.
    pub fn u8(&self, entry: &IfdEntry) -> u8 {
        self.buf.get(entry.inline_at()).copied().unwrap_or(0)
    }

    /// Returns the first inline 16-bit value.  The declared type is
    /// not checked.
    pub fn u16(&self, entry: &IfdEntry) -> u16 {
        E::loadu16(self.buf, entry.inline_at()).unwrap_or(0)
    }

    /// Returns the inline 32-bit value.  The declared type is not
    /// checked.
    pub fn u32(&self, entry: &IfdEntry) -> u32 {
        E::loadu32(self.buf, entry.inline_at()).unwrap_or(0)
    }

    /// Returns an inline unsigned integer of the declared width.
    /// Types other than BYTE and SHORT are read as 32 bits.
    pub fn uint(&self, entry: &IfdEntry) -> u32 {
        match entry.data_type {
            1 => self.u8(entry) as u32,
            3 => self.u16(entry) as u32,
            _ => self.u32(entry),
        }
    }

    /// Returns the first `N` inline bytes, zero-filled if out of range.
    pub fn inline_bytes<const N: usize>(&self, entry: &IfdEntry) -> [u8; N] {
        let mut val = [0u8; N];
        if let Some(s) = self.slice(entry.inline_at(), N) {
            val.copy_from_slice(s);
        }
        val
    }

    /// Returns `n` 32-bit values from the offset area.
    pub fn u32_array(&self, entry: &IfdEntry, n: usize) -> Option<Vec<u32>> {
        let start = self.offset_area(entry, 0)?;
        self.slice(start, n.checked_mul(4)?)?;
        (0..n).map(|i| E::loadu32(self.buf, start + i * 4)).collect()
    }

    /// Returns the rational `nested` bytes into the offset area.
    pub fn rational_parts(&self, entry: &IfdEntry, nested: usize)
                          -> Rational {
        self.offset_area(entry, nested)
            .and_then(|at| Some(Rational {
                num: E::loadu32(self.buf, at)?,
                denom: E::loadu32(self.buf, at.checked_add(4)?)?,
            }))
            .unwrap_or_default()
    }

    pub fn rational(&self, entry: &IfdEntry, nested: usize) -> f64 {
        self.rational_parts(entry, nested).to_f64()
    }

    /// Returns the signed rational `nested` bytes into the offset area.
    pub fn srational_parts(&self, entry: &IfdEntry, nested: usize)
                           -> SRational {
        self.offset_area(entry, nested)
            .and_then(|at| Some(SRational {
                num: E::loadu32(self.buf, at)? as i32,
                denom: E::loadu32(self.buf, at.checked_add(4)?)? as i32,
            }))
            .unwrap_or_default()
    }

    pub fn srational(&self, entry: &IfdEntry, nested: usize) -> f64 {
        self.srational_parts(entry, nested).to_f64()
    }

    /// Returns up to `n` consecutive rationals, the same number as
    /// `count` if it is smaller.
    pub fn rationals(&self, entry: &IfdEntry, n: usize) -> Vec<Rational> {
        (0..n.min(entry.count as usize))
            .map(|i| self.rational_parts(entry, i * 8))
            .collect()
    }

    /// Interprets three rationals as degrees, minutes and seconds
    /// and returns decimal degrees.
    pub fn gps_coord(&self, entry: &IfdEntry) -> f64 {
        let deg = self.rational(entry, 0);
        let min = self.rational(entry, 8);
        let sec = self.rational(entry, 16);
        deg + min / 60.0 + sec / 3600.0
    }

    /// Decodes a UTF-16LE string (the XP* tags) regardless of the
    /// TIFF byte order.  `count` is the number of bytes.
    pub fn utf16le(&self, entry: &IfdEntry) -> String {
        let units = self.bytes(entry).chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect::<Vec<_>>();
        String::from_utf16_lossy(&units)
            .trim_end_matches('\0')
            .trim()
            .to_owned()
    }

    /// Reformats a 4-character version code such as "0232" as "2.32".
    pub fn version(&self, entry: &IfdEntry) -> String {
        if entry.count != 4 {
            return String::new();
        }
        match self.slice(entry.inline_at(), 4) {
            Some(v) => format!("{}.{}{}", v[1] as char, v[2] as char,
                               v[3] as char),
            None => String::new(),
        }
    }

    /// Returns two consecutive 16-bit values, such as the source and
    /// used image counts of a composite image.
    pub fn u16_pair(&self, entry: &IfdEntry) -> (u16, u16) {
        if entry.count < 2 {
            return (0, 0);
        }
        self.locate(entry, 2)
            .and_then(|at| Some((E::loadu16(self.buf, at)?,
                                 E::loadu16(self.buf, at.checked_add(2)?)?)))
            .unwrap_or((0, 0))
    }

    /// Returns a UserComment-like value without its 8-byte character
    /// code prefix.
    pub fn user_comment(&self, entry: &IfdEntry) -> String {
        match self.bytes(entry) {
            raw if raw.len() > 8 =>
                String::from_utf8_lossy(trim_nul(&raw[8..])).into_owned(),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use crate::endian::{BigEndian, LittleEndian};
    use super::*;

    fn entry(data_type: u16, count: u32, value_offset: u32, offset: usize)
             -> IfdEntry {
        IfdEntry { tag: 0, data_type, count, value_offset, offset }
    }

    #[test]
    fn inline_string() {
        // The entry is at 0 and its value is at 8.
        let data = b"\x01\x0f\0\x02\0\0\0\x04abc\0";
        let r = ValueReader::<BigEndian>::new(data, 0);
        assert_eq!(r.string(&entry(2, 4, 0, 0)), "abc");
        assert_eq!(r.bytes(&entry(2, 3, 0, 0)), b"abc");
    }

    #[test]
    fn offset_string() {
        // The TIFF header starts at 2, so offset 12 means 14.
        let data = b"--\x01\x0f\0\x02\0\0\0\x06\0\0\0\x0cCanon\0";
        let r = ValueReader::<BigEndian>::new(data, 2);
        let e = IfdEntry::parse::<BigEndian>(data, 2).unwrap();
        assert_eq!(r.string(&e), "Canon");
        // Overflows the buffer by one byte.
        assert_eq!(r.string(&entry(2, 7, 12, 2)), "");
    }

    #[test]
    fn inline_rule_follows_declared_type() {
        // Two SHORTs fit inline, but three do not.
        let data = b"\0\0\0\0\0\0\0\0\0\x01\0\x02\0\x03\0\x04";
        let r = ValueReader::<BigEndian>::new(data, 0);
        assert_eq!(r.u16_pair(&entry(3, 2, 0, 0)), (1, 2));
        assert_eq!(r.u16_pair(&entry(3, 3, 10, 0)), (2, 3));
        assert_eq!(r.u16_pair(&entry(3, 1, 0, 0)), (0, 0));
    }

    #[test]
    fn integers() {
        let data = b"\0\0\0\0\0\0\0\0\x12\x34\x56\x78";
        let be = ValueReader::<BigEndian>::new(data, 0);
        let le = ValueReader::<LittleEndian>::new(data, 0);
        let e = entry(4, 1, 0, 0);
        assert_eq!(be.u8(&e), 0x12);
        assert_eq!(be.u16(&e), 0x1234);
        assert_eq!(le.u16(&e), 0x3412);
        assert_eq!(be.u32(&e), 0x12345678);
        assert_eq!(le.u32(&e), 0x78563412);
        assert_eq!(be.uint(&e), 0x12345678);
        assert_eq!(be.uint(&entry(3, 1, 0, 0)), 0x1234);
        assert_eq!(le.uint(&entry(1, 1, 0, 0)), 0x12);
        assert_eq!(be.inline_bytes::<4>(&e), [0x12, 0x34, 0x56, 0x78]);
        assert_eq!(be.inline_bytes::<4>(&entry(4, 1, 0, 4)), [0; 4]);
    }

    #[test]
    fn rationals() {
        let data = b"\0\0\0\x05\0\0\0\x02\xff\xff\xff\xfe\0\0\0\x04";
        let r = ValueReader::<BigEndian>::new(data, 0);
        let e = entry(5, 2, 0, 0);
        assert_eq!(r.rational_parts(&e, 0), Rational { num: 5, denom: 2 });
        assert_eq!(r.rational(&e, 0), 2.5);
        assert_eq!(r.srational(&e, 8), -0.5);
        assert_eq!(r.rationals(&e, 4).len(), 2);
        // Out of range.
        assert_eq!(r.rational(&e, 16), 0.0);
        assert_eq!(r.srational_parts(&entry(10, 1, u32::MAX, 0), 0),
                   SRational::default());
    }

    #[test]
    fn zero_denominator() {
        assert_eq!(Rational { num: 3, denom: 0 }.to_f64(), 0.0);
        assert_eq!(SRational { num: -3, denom: 0 }.to_f64(), 0.0);
    }

    #[test]
    fn gps_coord() {
        let mut data = Vec::new();
        for &(n, d) in &[(40u32, 1u32), (30, 1), (1800, 100)] {
            data.extend_from_slice(&n.to_le_bytes());
            data.extend_from_slice(&d.to_le_bytes());
        }
        let r = ValueReader::<LittleEndian>::new(&data, 0);
        let v = r.gps_coord(&entry(5, 3, 0, 0));
        assert!((v - 40.505).abs() < 1e-9, "{}", v);
    }

    #[test]
    fn utf16le() {
        // Always little endian, even in a big-endian TIFF.
        let mut data = vec![0u8; 8];
        data.extend_from_slice(b"\0\0\0\x08");
        data.extend_from_slice(b"T\0i\0t\0l\0e\0 \0\0\0");
        let r = ValueReader::<BigEndian>::new(&data, 4);
        assert_eq!(r.utf16le(&entry(1, 14, 8, 0)), "Title");
        assert_eq!(r.utf16le(&entry(1, 16, 8, 0)), "");
    }

    #[test]
    fn version() {
        let data = b"\x90\0\0\x07\0\0\0\x040232";
        let r = ValueReader::<BigEndian>::new(data, 0);
        assert_eq!(r.version(&entry(7, 4, 0, 0)), "2.32");
        assert_eq!(r.version(&entry(7, 3, 0, 0)), "");
    }

    #[test]
    fn user_comment() {
        let mut data = vec![0u8; 12];
        data.extend_from_slice(b"ASCII\0\0\0Hello\0");
        let r = ValueReader::<BigEndian>::new(&data, 0);
        assert_eq!(r.user_comment(&entry(7, 14, 12, 0)), "Hello");
        assert_eq!(r.user_comment(&entry(7, 8, 12, 0)), "");
    }

    #[test]
    fn u32_array() {
        let data = b"\0\0\0\x01\0\0\0\x02";
        let r = ValueReader::<BigEndian>::new(data, 0);
        assert_eq!(r.u32_array(&entry(4, 2, 0, 0), 2), Some(vec![1, 2]));
        assert_eq!(r.u32_array(&entry(4, 2, 4, 0), 2), None);
    }

    fn exercise<E>(r: &ValueReader<E>, e: &IfdEntry) where E: Endian {
        let _ = r.bytes(e);
        let _ = r.string(e);
        let _ = r.u8(e);
        let _ = r.u16(e);
        let _ = r.u32(e);
        let _ = r.uint(e);
        let _ = r.inline_bytes::<4>(e);
        let _ = r.u32_array(e, 2);
        let _ = r.rational(e, 8);
        let _ = r.srational(e, 16);
        let _ = r.rationals(e, 4);
        let _ = r.gps_coord(e);
        let _ = r.utf16le(e);
        let _ = r.version(e);
        let _ = r.u16_pair(e);
        let _ = r.user_comment(e);
    }

    proptest! {
        #[test]
        fn accessors_never_panic(
            buf in prop::collection::vec(any::<u8>(), 0..=16),
            tiff_start in 0usize..32,
            data_type in any::<u16>(),
            count in any::<u32>(),
            value_offset in any::<u32>(),
            offset in prop_oneof![0usize..32, Just(usize::MAX - 4)],
        ) {
            let e = IfdEntry { tag: 0, data_type, count, value_offset, offset };
            exercise(&ValueReader::<BigEndian>::new(&buf, tiff_start), &e);
            exercise(&ValueReader::<LittleEndian>::new(&buf, tiff_start), &e);
        }

        #[test]
        fn rational_round_trip(num in any::<u32>(), denom in 1u32..=u32::MAX, at in 0u32..8) {
            let mut buf = vec![0u8; at as usize];
            buf.extend_from_slice(&num.to_be_bytes());
            buf.extend_from_slice(&denom.to_be_bytes());
            let r = ValueReader::<BigEndian>::new(&buf, 0);
            let e = IfdEntry { tag: 0, data_type: 5, count: 1,
                               value_offset: at, offset: 0 };
            prop_assert_eq!(r.rational(&e, 0), num as f64 / denom as f64);
            prop_assert_eq!(r.rational_parts(&e, 0), Rational { num, denom });
        }
    }
}
