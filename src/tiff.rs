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

use crate::endian::Endian;
use crate::error::Error;
use crate::util::{atou16, ctou32};

// The TIFF header follows the APP1 marker (2), the segment length (2)
// and the "Exif\0\0" identifier code (6).
const APP1_TO_TIFF: usize = 10;

/// Byte order of a TIFF structure.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ByteOrder {
    /// "II"
    LittleEndian,
    /// "MM"
    BigEndian,
}

/// Where the TIFF structure starts and how it is encoded.
///
/// All value offsets in IFD entries are relative to `tiff_start`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TiffContext {
    /// Offset of the TIFF header in the source buffer.
    pub tiff_start: usize,
    pub byte_order: ByteOrder,
}

impl TiffContext {
    /// Creates the context for the APP1 segment whose marker starts
    /// at `marker`.
    pub fn from_app1(buf: &[u8], marker: usize) -> Result<Self, Error> {
        let tiff_start = marker.checked_add(APP1_TO_TIFF)
            .ok_or(Error::InvalidFormat("Truncated TIFF header"))?;
        let byte_order = byte_order_at(buf, tiff_start)?;
        Ok(Self { tiff_start, byte_order })
    }

    /// Returns the absolute offset of the 0th IFD.
    ///
    /// The 42 magic number is not checked.
    pub fn first_ifd<E>(&self, buf: &[u8]) -> Result<usize, Error>
    where E: Endian {
        let ofs = self.tiff_start.checked_add(4)
            .and_then(|at| E::loadu32(buf, at))
            .ok_or(Error::InvalidFormat("Truncated TIFF header"))?;
        self.tiff_start.checked_add(ofs as usize)
            .ok_or(Error::InvalidFormat("Invalid IFD offset"))
    }
}

/// Reads a byte-order marker ("II" or "MM") at `at`.
pub fn byte_order_at(buf: &[u8], at: usize) -> Result<ByteOrder, Error> {
    let end = at.checked_add(2)
        .ok_or(Error::InvalidFormat("Truncated TIFF header"))?;
    match buf.get(at..end) {
        Some([0x49, 0x49]) => Ok(ByteOrder::LittleEndian),
        Some([0x4d, 0x4d]) => Ok(ByteOrder::BigEndian),
        Some(_) => Err(Error::InvalidFormat("Unsupported byte order")),
        None => Err(Error::InvalidFormat("Truncated TIFF header")),
    }
}

/// A 12-byte IFD entry as it is stored.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IfdEntry {
    pub tag: u16,
    pub data_type: u16,
    pub count: u32,
    /// The raw "value offset" element.  It holds the value itself
    /// when the value fits in 4 bytes.
    pub value_offset: u32,
    /// Absolute offset of this entry in the buffer.
    pub offset: usize,
}

impl IfdEntry {
    /// Reads the entry at `offset`, if all 12 bytes are available.
    pub fn parse<E>(buf: &[u8], offset: usize) -> Option<Self>
    where E: Endian {
        Some(Self {
            tag: E::loadu16(buf, offset)?,
            data_type: E::loadu16(buf, offset.checked_add(2)?)?,
            count: E::loadu32(buf, offset.checked_add(4)?)?,
            value_offset: E::loadu32(buf, offset.checked_add(8)?)?,
            offset,
        })
    }

    /// Returns the size of one element of the declared type,
    /// or None if the type is unknown.
    pub fn type_width(&self) -> Option<usize> {
        match self.data_type {
            1 | 2 | 6 | 7 => Some(1),
            3 | 8 => Some(2),
            4 | 9 | 11 | 13 => Some(4),
            5 | 10 | 12 => Some(8),
            _ => None,
        }
    }

    /// Returns the absolute offset of the inline value.
    #[inline]
    pub fn inline_at(&self) -> usize {
        self.offset.saturating_add(8)
    }
}

/// The outcome of walking one directory.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct IfdWalk {
    /// The entry count stored in the directory.
    pub declared: u16,
    /// The number of entries that fit in the buffer and were visited.
    pub visited: usize,
}

impl IfdWalk {
    pub fn is_truncated(&self) -> bool {
        self.visited < self.declared as usize
    }
}

/// Walks the IFD at the absolute offset `base` and calls `visit` for
/// each entry in directory order.
///
/// The walker does not know any tags; interpreting them is up to the
/// visitor.  A declared count larger than the buffer can hold is
/// clamped, and an unreadable count is an error.
pub fn walk_ifd<E, F>(buf: &[u8], base: usize, mut visit: F)
                      -> Result<IfdWalk, Error>
where E: Endian, F: FnMut(&IfdEntry) {
    let declared = E::loadu16(buf, base)
        .ok_or(Error::InvalidFormat("Truncated IFD count"))?;
    // loadu16 succeeded, so base + 2 <= buf.len().
    let start = base + 2;
    let count = (declared as usize).min((buf.len() - start) / 12);
    let mut visited = 0;
    for i in 0..count {
        let entry = match IfdEntry::parse::<E>(buf, start + i * 12) {
            Some(entry) => entry,
            None => break,
        };
        log::trace!(target: "exif_evidence",
                    "IFD entry at {:#x}: tag {:#06x} type {} count {} value {:#x}",
                    entry.offset, entry.tag, entry.data_type, entry.count,
                    entry.value_offset);
        visit(&entry);
        visited += 1;
    }
    Ok(IfdWalk { declared, visited })
}

/// A struct used to parse a DateTime field.
///
/// # Examples
/// ```
/// use exif_evidence::DateTime;
/// let dt = DateTime::from_ascii(b"2016:05:04 03:02:01").unwrap();
/// assert_eq!(dt.year, 2016);
/// assert_eq!(format!("{}", dt), "2016-05-04 03:02:01");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// The subsecond data in nanoseconds.  If the Exif attribute has
    /// more sigfinicant digits, they are rounded down.
    pub nanosecond: Option<u32>,
    /// The offset of the time zone in minutes.
    pub offset: Option<i16>,
}

impl DateTime {
    /// Parses an ASCII value in the `YYYY:MM:DD HH:MM:SS` format.
    ///
    /// Unlike lenient Exif readers, the whole value must match the
    /// format and every component must be within its calendar range.
    pub fn from_ascii(data: &[u8]) -> Result<DateTime, Error> {
        if data.len() != 19 {
            return Err(Error::InvalidFormat("DateTime length mismatch"));
        } else if data[10] != b' ' || data[13] != b':' || data[16] != b':' {
            return Err(Error::InvalidFormat("Invalid DateTime delimiter"));
        }
        let mut dt = Self::from_date_ascii(&data[..10])?;
        dt.hour = atou16(&data[11..13])? as u8;
        dt.minute = atou16(&data[14..16])? as u8;
        dt.second = atou16(&data[17..19])? as u8;
        if dt.hour > 23 || dt.minute > 59 || dt.second > 59 {
            return Err(Error::InvalidFormat("Time out of range"));
        }
        Ok(dt)
    }

    /// Parses an ASCII value in the `YYYY:MM:DD` format.
    /// The time of day is set to midnight.
    pub fn from_date_ascii(data: &[u8]) -> Result<DateTime, Error> {
        if data.len() != 10 {
            return Err(Error::InvalidFormat("Date length mismatch"));
        } else if data[4] != b':' || data[7] != b':' {
            return Err(Error::InvalidFormat("Invalid date delimiter"));
        }
        let year = atou16(&data[0..4])?;
        let month = atou16(&data[5..7])? as u8;
        let day = atou16(&data[8..10])? as u8;
        if month < 1 || month > 12 || day < 1 ||
            day > days_in_month(year, month) {
            return Err(Error::InvalidFormat("Date out of range"));
        }
        Ok(DateTime {
            year, month, day, hour: 0, minute: 0, second: 0,
            nanosecond: None,
            offset: None,
        })
    }

    /// Parses an SubsecTime-like field.
    pub fn parse_subsec(&mut self, data: &[u8]) -> Result<(), Error> {
        let mut subsec = 0;
        let mut ndigits = 0;
        for &c in data {
            if c == b' ' {
                break;
            }
            subsec = subsec * 10 + ctou32(c)?;
            ndigits += 1;
            if ndigits >= 9 {
                break;
            }
        }
        if ndigits == 0 {
            self.nanosecond = None;
        } else {
            for _ in ndigits..9 {
                subsec *= 10;
            }
            self.nanosecond = Some(subsec);
        }
        Ok(())
    }

    /// Parses an OffsetTime-like field.
    pub fn parse_offset(&mut self, data: &[u8]) -> Result<(), Error> {
        if data == b"   :  " || data == b"      " {
            return Err(Error::InvalidFormat("OffsetTime is blank"));
        } else if data.len() < 6 {
            return Err(Error::InvalidFormat("OffsetTime too short"));
        } else if data[3] != b':' {
            return Err(Error::InvalidFormat("Invalid OffsetTime delimiter"));
        }
        let hour = atou16(&data[1..3])?;
        let min = atou16(&data[4..6])?;
        let offset = (hour * 60 + min) as i16;
        self.offset = Some(match data[0] {
            b'+' => offset,
            b'-' => -offset,
            _ => return Err(Error::InvalidFormat("Invalid OffsetTime sign")),
        });
        Ok(())
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
               self.year, self.month, self.day,
               self.hour, self.minute, self.second)
    }
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        _ => 31,
    }
}
