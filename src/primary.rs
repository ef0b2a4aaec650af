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

//! Decoder for the 0th IFD of the primary image.

use crate::diag::Diagnostics;
use crate::endian::Endian;
use crate::error::Error;
use crate::evidence::Evidence;
use crate::labels;
use crate::tag::{Context, Tag};
use crate::tiff::{walk_ifd, DateTime, IfdEntry};
use crate::value::ValueReader;

/// A sub-IFD referenced from the 0th IFD, by absolute offset.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SubIfd {
    Exif(usize),
    Gps(usize),
}

/// Decodes the 0th IFD at `base` into `ev`.
///
/// The Exif and GPS IFD pointers are returned in directory order
/// so that the caller can decode them with their own tag tables.
pub(crate) fn decode<E>(r: &ValueReader<E>, base: usize, ev: &mut Evidence,
                        diag: &mut Diagnostics) -> Result<Vec<SubIfd>, Error>
where E: Endian {
    let mut subs = Vec::new();
    let walk = walk_ifd::<E, _>(r.buf(), base, |e| {
        match Tag(Context::Tiff, e.tag) {
            Tag::ProcessingSoftware =>
                ev.processing.processing_software = r.string(e),
            Tag::ImageWidth => ev.image.width = r.uint(e),
            Tag::ImageLength => ev.image.height = r.uint(e),
            Tag::ImageDescription =>
                ev.authorship.image_description = r.string(e),
            Tag::Make => ev.device.make = r.string(e),
            Tag::Model => ev.device.model = r.string(e),
            Tag::Orientation =>
                ev.image.orientation = labels::orientation(r.u16(e)).to_owned(),
            Tag::Software => ev.processing.software = r.string(e),
            Tag::DateTime => ev.temporal.modify_date =
                parse_datetime(&r.string(e), "tiff:DateTime", diag),
            Tag::Artist => ev.authorship.artist = r.string(e),
            Tag::Copyright => ev.authorship.copyright = r.string(e),
            Tag::ExifIFDPointer => match pointer(r, e) {
                Some(ofs) => subs.push(SubIfd::Exif(ofs)),
                None => diag.warn("tiff:ExifIFDPointer", "Invalid IFD offset"),
            },
            Tag::GPSInfoIFDPointer => match pointer(r, e) {
                Some(ofs) => subs.push(SubIfd::Gps(ofs)),
                None => diag.warn("tiff:GPSInfoIFDPointer", "Invalid IFD offset"),
            },
            Tag::XPTitle => ev.authorship.xp_title = r.utf16le(e),
            Tag::XPComment => ev.authorship.xp_comment = r.utf16le(e),
            Tag::XPAuthor => ev.authorship.xp_author = r.utf16le(e),
            Tag::XPKeywords => ev.authorship.xp_keywords = r.utf16le(e),
            Tag::XPSubject => ev.authorship.xp_subject = r.utf16le(e),
            _ => {},
        }
    })?;
    if walk.is_truncated() {
        diag.warn("tiff", format!("IFD declares {} entries but only {} fit",
                                  walk.declared, walk.visited));
    }
    Ok(subs)
}

fn pointer<E>(r: &ValueReader<E>, e: &IfdEntry) -> Option<usize>
where E: Endian {
    r.tiff_start().checked_add(r.u32(e) as usize)
}

/// Parses a `YYYY:MM:DD HH:MM:SS` value.  A malformed value is
/// recorded as a warning and skipped.
pub(crate) fn parse_datetime(s: &str, context: &str, diag: &mut Diagnostics)
                             -> Option<DateTime> {
    match DateTime::from_ascii(s.as_bytes()) {
        Ok(dt) => Some(dt),
        Err(err) => {
            diag.warn(context, format!("Cannot parse {:?}: {}", s, err));
            None
        },
    }
}
