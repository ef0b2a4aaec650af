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

//! This is a pure-Rust library to extract provenance evidence from
//! the Exif data of JPEG files.
//!
//! The 0th, Exif and GPS IFDs are decoded into an [`Evidence`] record
//! grouped by concern (time, location, device, image, camera settings,
//! processing, authorship and authenticity).  Vendor MakerNotes are
//! passed to a registry of parsers, and the encrypted MakerNote that
//! Google HDR+ stores in extended XMP is recovered even from
//! truncated files.
//!
//! Decoding is tolerant.  A malformed field is skipped and recorded
//! in [`Evidence::diagnostics`] instead of failing the whole file.
//!
//! # Examples
//!
//! ```
//! use exif_evidence::{Error, Reader, Severity};
//!
//! // An Exif segment with Make "Canon" and Orientation 6.
//! let data = b"\xff\xd8\xff\xe1\x00\x34Exif\0\0\
//!              MM\0*\0\0\0\x08\0\x02\
//!              \x01\x0f\0\x02\0\0\0\x06\0\0\0\x26\
//!              \x01\x12\0\x03\0\0\0\x01\0\x06\0\0\
//!              \0\0\0\0Canon\0\xff\xd9";
//! let evidence = match Reader::new().read_jpeg(data) {
//!     Ok(evidence) => evidence,
//!     Err(Error::PartialResult(partial)) => partial.into_inner().0,
//!     Err(e) => panic!("{}", e),
//! };
//! assert_eq!(evidence.device.make, "Canon");
//! assert_eq!(evidence.image.orientation, "Rotate 90 CW");
//! for d in evidence.diagnostics_at(Severity::Warning) {
//!     eprintln!("{}", d);
//! }
//! ```

pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::{Error, PartialResult};
pub use evidence::{Authenticity, Authorship, Camera, Device, Evidence,
                   FieldValue, Fields, Gps, Image, MakerNote, Processing,
                   Temporal};
pub use makernote::{AppleParser, MakerNoteParser, MakerNoteRegistry};
pub use payload::{Decoded, HdrPlusProtobuf, PayloadDecoder};
pub use reader::Reader;
pub use tag::{Context, Tag};
pub use tiff::DateTime;
pub use value::{Rational, SRational};
pub use xmp::XmpDocument;

#[cfg(test)]
#[macro_use]
mod tmacro;

pub mod hdrplus;
pub mod labels;
pub mod payload;
pub mod xmp;

mod diag;
mod endian;
mod error;
mod evidence;
mod exififd;
mod gps;
mod jpeg;
mod makernote;
mod primary;
mod reader;
mod tag;
mod tiff;
mod util;
mod value;
