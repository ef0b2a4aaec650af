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

//! MakerNote dispatch.
//!
//! MakerNotes have no common format.  Vendor parsers are tried in
//! registration order, and each one checks its own signature first so
//! that a mismatch lets the next parser try.

use crate::diag::Diagnostics;
use crate::endian::{BigEndian, Endian, LittleEndian};
use crate::error::Error;
use crate::evidence::{FieldValue, Fields, MakerNote};
use crate::labels;
use crate::tag::{Context, Tag};
use crate::tiff::{byte_order_at, walk_ifd, ByteOrder};
use crate::value::ValueReader;

/// A parser for one vendor's MakerNote format.
pub trait MakerNoteParser: Send + Sync {
    /// The manufacturer name stored in the resulting `MakerNote`.
    fn manufacturer(&self) -> &str;

    /// Parses `raw`, the whole MakerNote value.
    ///
    /// Returns `Ok(None)` if `raw` does not look like this vendor's
    /// format.  An error means the signature matched but the content
    /// is unusable.
    fn try_parse(&self, raw: &[u8], diag: &mut Diagnostics)
                 -> Result<Option<Fields>, Error>;
}

/// An ordered list of MakerNote parsers.
pub struct MakerNoteRegistry {
    parsers: Vec<Box<dyn MakerNoteParser>>,
}

impl Default for MakerNoteRegistry {
    /// Returns a registry with the built-in parsers.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(AppleParser));
        registry
    }
}

impl std::fmt::Debug for MakerNoteRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_list()
            .entries(self.parsers.iter().map(|p| p.manufacturer()))
            .finish()
    }
}

impl MakerNoteRegistry {
    /// Returns an empty registry.
    pub fn new() -> Self {
        Self { parsers: Vec::new() }
    }

    /// Appends a parser.  It is tried after the ones already registered.
    pub fn register(&mut self, parser: Box<dyn MakerNoteParser>) {
        self.parsers.push(parser);
    }

    /// Returns the result of the first parser that recognizes `raw`.
    ///
    /// `Error::UnknownMakerNote` is returned if none does.
    pub fn dispatch(&self, raw: &[u8], diag: &mut Diagnostics)
                    -> Result<MakerNote, Error> {
        for parser in &self.parsers {
            if let Some(fields) = parser.try_parse(raw, diag)? {
                log::debug!(target: "exif_evidence",
                            "MakerNote parsed as {} ({} fields)",
                            parser.manufacturer(), fields.len());
                return Ok(MakerNote {
                    raw: raw.to_vec(),
                    manufacturer: parser.manufacturer().to_owned(),
                    fields,
                });
            }
        }
        Err(Error::UnknownMakerNote)
    }
}

const APPLE_SIGNATURE: &[u8] = b"Apple iOS\0\0\x01";
// The signature, a byte-order mark, and an entry count and
// at least half an entry.
const APPLE_MIN_LEN: usize = 22;
const APPLE_BYTE_ORDER_AT: usize = 12;
const APPLE_IFD_AT: usize = 14;

/// Apple iOS MakerNotes.
///
/// The signature is followed by a byte-order mark and an IFD.  There
/// is no TIFF magic number or IFD pointer, and value offsets are
/// relative to the start of the MakerNote.
#[derive(Clone, Copy, Debug, Default)]
pub struct AppleParser;

impl MakerNoteParser for AppleParser {
    fn manufacturer(&self) -> &str {
        "Apple"
    }

    fn try_parse(&self, raw: &[u8], diag: &mut Diagnostics)
                 -> Result<Option<Fields>, Error> {
        if raw.len() < APPLE_MIN_LEN || !raw.starts_with(APPLE_SIGNATURE) {
            log::debug!(target: "exif_evidence",
                        "Not an Apple MakerNote ({} bytes)", raw.len());
            return Ok(None);
        }
        let fields = match byte_order_at(raw, APPLE_BYTE_ORDER_AT)? {
            ByteOrder::BigEndian => parse_apple::<BigEndian>(raw, diag)?,
            ByteOrder::LittleEndian => parse_apple::<LittleEndian>(raw, diag)?,
        };
        Ok(Some(fields))
    }
}

fn parse_apple<E>(raw: &[u8], diag: &mut Diagnostics) -> Result<Fields, Error>
where E: Endian {
    let r = ValueReader::<E>::new(raw, 0);
    let mut fields = Fields::new();
    let walk = walk_ifd::<E, _>(raw, APPLE_IFD_AT, |e| {
        let int = || FieldValue::Int(r.u32(e) as i32 as i64);
        let (name, value) = match Tag(Context::Apple, e.tag) {
            Tag::MakerNoteVersion => ("MakerNoteVersion", int()),
            Tag::AEStable => ("AEStable", FieldValue::Bool(r.u32(e) == 1)),
            Tag::AETarget => ("AETarget", FieldValue::Int(r.u32(e).into())),
            Tag::AEAverage => ("AEAverage", FieldValue::Int(r.u32(e).into())),
            Tag::AFStable => ("AFStable", FieldValue::Bool(r.u32(e) == 1)),
            Tag::AccelerationVector => ("AccelerationVector",
                FieldValue::FloatArray(vec![r.srational(e, 0),
                                            r.srational(e, 8),
                                            r.srational(e, 16)])),
            Tag::HDRImageType => ("HDRImageType",
                labels::apple_hdr_image_type(r.u32(e)).into()),
            Tag::BurstUUID => ("BurstUUID", r.string(e).into()),
            Tag::FocusDistanceRange => ("FocusDistanceRange",
                format!("{:.2} - {:.2} m", r.srational(e, 0),
                        r.srational(e, 8)).into()),
            Tag::OISMode => ("OISMode", int()),
            Tag::ContentIdentifier => ("ContentIdentifier", r.string(e).into()),
            Tag::ImageCaptureType => ("ImageCaptureType",
                labels::apple_image_capture_type(r.u32(e) as i32).into()),
            Tag::AppleImageUniqueID => ("ImageUniqueID", r.string(e).into()),
            Tag::ImageProcessingFlags => ("ImageProcessingFlags", int()),
            Tag::QualityHint => ("QualityHint", r.string(e).into()),
            Tag::LuminanceNoiseAmplitude => ("LuminanceNoiseAmplitude",
                FieldValue::Float(r.srational(e, 0))),
            Tag::PhotosAppFeatureFlags => ("PhotosAppFeatureFlags", int()),
            Tag::ImageCaptureRequestID =>
                ("ImageCaptureRequestID", r.string(e).into()),
            Tag::HDRHeadroom =>
                ("HDRHeadroom", FieldValue::Float(r.srational(e, 0))),
            Tag::AFPerformance => match r.u32_array(e, 2).as_deref() {
                Some(&[dist, packed]) => ("AFPerformance",
                    af_performance(dist as i32, packed as i32).into()),
                _ => return,
            },
            Tag::SceneFlags => ("SceneFlags", int()),
            Tag::SignalToNoiseRatio =>
                ("SignalToNoiseRatio", FieldValue::Float(r.srational(e, 0))),
            Tag::PhotoIdentifier => ("PhotoIdentifier", r.string(e).into()),
            Tag::ColorTemperature => ("ColorTemperature", int()),
            Tag::CameraType => ("CameraType",
                labels::apple_camera_type(r.u32(e) as i32).into()),
            Tag::FocusPosition => ("FocusPosition", int()),
            Tag::HDRGain => ("HDRGain", FieldValue::Float(r.srational(e, 0))),
            Tag::AFMeasuredDepth => ("AFMeasuredDepth", int()),
            Tag::AFConfidence => ("AFConfidence", int()),
            _ => return,
        };
        fields.insert(name.to_owned(), value);
    })?;
    if walk.is_truncated() {
        diag.warn("makernote:Apple", format!(
            "IFD declares {} entries, only {} fit", walk.declared, walk.visited));
    }
    Ok(fields)
}

// The focus distance, then the upper 4 and lower 28 bits.
fn af_performance(dist: i32, packed: i32) -> String {
    format!("{} {} {}", dist, (packed >> 28) & 0xf, packed & 0xfff_ffff)
}
