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

use std::io;
use std::io::Read;

use crate::diag::Diagnostics;
use crate::endian::{BigEndian, Endian, LittleEndian};
use crate::error::{Error, PartialResult};
use crate::evidence::Evidence;
use crate::exififd;
use crate::gps;
use crate::hdrplus;
use crate::jpeg;
use crate::makernote::{MakerNoteParser, MakerNoteRegistry};
use crate::payload::{HdrPlusProtobuf, PayloadDecoder};
use crate::primary;
use crate::primary::SubIfd;
use crate::tiff::{ByteOrder, TiffContext};
use crate::value::ValueReader;

/// A builder that extracts provenance evidence from JPEG data.
///
/// # Examples
/// ```
/// use exif_evidence::Reader;
/// let data = b"\xff\xd8\xff\xe1\x00\x16Exif\0\0MM\0*\0\0\0\x08\0\0\0\0\0\0\xff\xd9";
/// let evidence = Reader::new().hdrplus(false).read_jpeg(data).unwrap();
/// assert!(evidence.diagnostics.is_empty());
/// ```
pub struct Reader {
    hdrplus: bool,
    makernotes: bool,
    registry: MakerNoteRegistry,
    decoder: Box<dyn PayloadDecoder>,
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}

impl Reader {
    /// Constructs a new `Reader` with every stage enabled, the built-in
    /// MakerNote parsers and the protobuf payload decoder.
    pub fn new() -> Self {
        Self {
            hdrplus: true,
            makernotes: true,
            registry: MakerNoteRegistry::default(),
            decoder: Box::new(HdrPlusProtobuf),
        }
    }

    /// Sets whether the HDR+ MakerNote is recovered from XMP.
    ///
    /// The recovery runs only when the Software tag starts with
    /// `"HDR+"`.  If it fails, `read_jpeg` returns
    /// `Error::PartialResult` with the record decoded so far.
    pub fn hdrplus(&mut self, enable: bool) -> &mut Self {
        self.hdrplus = enable;
        self
    }

    /// Sets whether the Exif MakerNote is passed to the vendor parsers.
    pub fn makernotes(&mut self, enable: bool) -> &mut Self {
        self.makernotes = enable;
        self
    }

    /// Appends a vendor MakerNote parser.  Parsers are tried in
    /// registration order after the built-in ones.
    pub fn register_makernote_parser(&mut self,
                                     parser: Box<dyn MakerNoteParser>)
                                     -> &mut Self {
        self.registry.register(parser);
        self
    }

    /// Replaces the decoder for the decompressed HDR+ payload.
    pub fn payload_decoder(&mut self, decoder: Box<dyn PayloadDecoder>)
                           -> &mut Self {
        self.decoder = decoder;
        self
    }

    /// Extracts evidence from the JPEG file in `data`.
    ///
    /// A file that is not a JPEG, has no Exif segment or has an
    /// unreadable TIFF header or 0th IFD is an error.  Problems in
    /// the other IFDs are recorded in `Evidence::diagnostics`.
    /// A failure of the HDR+ recovery is returned as
    /// `Error::PartialResult` together with the evidence.
    pub fn read_jpeg(&self, data: &[u8]) -> Result<Evidence, Error> {
        let marker = jpeg::find_exif_segment(data)?;
        let ctx = TiffContext::from_app1(data, marker)?;
        match ctx.byte_order {
            ByteOrder::BigEndian => self.read_tiff::<BigEndian>(data, ctx),
            ByteOrder::LittleEndian =>
                self.read_tiff::<LittleEndian>(data, ctx),
        }
    }

    /// Reads a whole JPEG file from `reader` and extracts evidence
    /// from it.
    pub fn read_from<R>(&self, mut reader: R) -> Result<Evidence, Error>
    where R: io::Read {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.read_jpeg(&buf)
    }

    fn read_tiff<E>(&self, data: &[u8], ctx: TiffContext)
                    -> Result<Evidence, Error>
    where E: Endian {
        let mut ev = Evidence::default();
        let mut diag = Diagnostics::new();
        let r = ValueReader::<E>::new(data, ctx.tiff_start);
        let ifd0 = ctx.first_ifd::<E>(data)?;
        let subs = primary::decode(&r, ifd0, &mut ev, &mut diag)?;

        let registry = self.makernotes.then_some(&self.registry);
        for sub in subs {
            let (context, result) = match sub {
                SubIfd::Exif(ofs) => ("exif", exififd::decode(
                    &r, ofs, &mut ev, registry, &mut diag)),
                SubIfd::Gps(ofs) =>
                    ("gps", gps::decode(&r, ofs, &mut ev.gps, &mut diag)),
            };
            if let Err(err) = result {
                diag.warn(context, format!("Skipped IFD: {}", err));
            }
        }
        exififd::refine_temporal(&mut ev.temporal, &mut diag);

        let mut errors = Vec::new();
        if self.hdrplus && ev.processing.software.starts_with("HDR+") {
            log::debug!(target: "exif_evidence",
                        "Software is {:?}, looking for the HDR+ MakerNote",
                        ev.processing.software);
            if let Err(err) = hdrplus::recover(data, &mut ev, &*self.decoder,
                                               &mut diag) {
                diag.error("hdrplus", err.to_string());
                errors.push(err);
            }
        }
        ev.diagnostics = diag.into_vec();
        if errors.is_empty() {
            Ok(ev)
        } else {
            Err(Error::PartialResult(PartialResult::new(ev, errors)))
        }
    }
}
