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

use std::error;
use std::fmt;
use std::io;

use crate::evidence::Evidence;

/// An error type returned when extracting evidence from a JPEG file.
///
/// Errors fall into three groups.  `InvalidFormat`, `NotFound` and
/// `Io` returned directly from `Reader` are fatal and no record is
/// produced.  `PartialResult` carries a fully populated record
/// together with the errors that stopped the MakerNote sub-pipeline.
/// The remaining variants describe sub-pipeline failures and normally
/// appear inside a `PartialResult`.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Input data was malformed or truncated.
    InvalidFormat(&'static str),
    /// Input data could not be read due to an I/O error and
    /// a `std::io::Error` value is associated with this variant.
    Io(io::Error),
    /// Expected data (an Exif segment, an XMP packet, an attribute)
    /// was not found.
    NotFound(&'static str),
    /// The MakerNote attribute could not be base64-decoded.
    Base64(base64::DecodeError),
    /// Neither gzip nor raw DEFLATE recovered any bytes.
    Decompress(io::Error),
    /// The recovered MakerNote payload could not be decoded.
    Payload(prost::DecodeError),
    /// The XMP packet is not well-formed XML.
    Xml(quick_xml::Error),
    /// No registered MakerNote parser accepted the data.
    UnknownMakerNote,
    /// The result was best-effort.  The extracted record and
    /// the errors that stopped the optional stages are associated.
    ///
    /// This is returned by `Reader::read_jpeg` when a sub-pipeline
    /// failed after the Exif fields had been decoded.
    PartialResult(PartialResult),
}

impl Error {
    /// Extracts the record from `PartialResult` and calls the closure
    /// with the errors.  Other variants are returned unchanged.
    ///
    /// # Examples
    /// ```
    /// # fn main() -> Result<(), exif_evidence::Error> {
    /// # let data = b"\xff\xd8\xff\xe1\x00\x16Exif\0\0II*\0\x08\0\0\0\0\0\0\0\0\0\xff\xd9";
    /// let evidence = exif_evidence::Reader::new()
    ///     .read_jpeg(data)
    ///     .or_else(|e| e.distill_partial_result(|errors| {
    ///         errors.iter().for_each(|e| eprintln!("Warning: {}", e));
    ///     }))?;
    /// # let _ = evidence; Ok(()) }
    /// ```
    pub fn distill_partial_result<F>(self, f: F) -> Result<Evidence, Self>
    where F: FnOnce(Vec<Error>) {
        if let Error::PartialResult(partial) = self {
            let (evidence, errors) = partial.into_inner();
            f(errors);
            Ok(evidence)
        } else {
            Err(self)
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Error {
        Error::Base64(err)
    }
}

impl From<prost::DecodeError> for Error {
    fn from(err: prost::DecodeError) -> Error {
        Error::Payload(err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Error {
        Error::Xml(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidFormat(msg) => f.write_str(msg),
            Error::Io(ref err) => err.fmt(f),
            Error::NotFound(msg) => f.write_str(msg),
            Error::Base64(ref err) => write!(f, "Invalid base64: {}", err),
            Error::Decompress(ref err) =>
                write!(f, "Both gzip and raw inflate failed: {}", err),
            Error::Payload(ref err) => write!(f, "Invalid payload: {}", err),
            Error::Xml(ref err) => write!(f, "Invalid XMP: {}", err),
            Error::UnknownMakerNote =>
                f.write_str("Cannot parse MakerNote, corrupted or unsupported"),
            Error::PartialResult(ref pr) =>
                write!(f, "Partial result with {} errors", pr.errors().len()),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::InvalidFormat(_) => None,
            Error::Io(ref err) => Some(err),
            Error::NotFound(_) => None,
            Error::Base64(ref err) => Some(err),
            Error::Decompress(ref err) => Some(err),
            Error::Payload(ref err) => Some(err),
            Error::Xml(ref err) => Some(err),
            Error::UnknownMakerNote => None,
            Error::PartialResult(_) => None,
        }
    }
}

/// A struct that contains the best-effort record and the errors
/// that prevented it from being complete.
pub struct PartialResult(Box<(Evidence, Vec<Error>)>);

impl PartialResult {
    pub(crate) fn new(evidence: Evidence, errors: Vec<Error>) -> Self {
        Self(Box::new((evidence, errors)))
    }

    /// Returns the record and the errors.
    pub fn into_inner(self) -> (Evidence, Vec<Error>) {
        let Self(inner) = self;
        *inner
    }

    /// Returns a reference to the record.
    pub fn evidence(&self) -> &Evidence {
        &self.0 .0
    }

    /// Returns the errors.
    pub fn errors(&self) -> &[Error] {
        &self.0 .1
    }
}

impl fmt::Debug for PartialResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PartialResult(Evidence({} diagnostics), {:?})",
               self.evidence().diagnostics.len(), self.errors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distill_partial_result() {
        let partial = PartialResult::new(
            Evidence::default(), vec![Error::NotFound("XMP block not found")]);
        let mut seen = Vec::new();
        let evidence = Error::PartialResult(partial)
            .distill_partial_result(|errors| seen = errors)
            .unwrap();
        assert_eq!(evidence, Evidence::default());
        assert_pat!(&seen[..], [Error::NotFound("XMP block not found")]);
    }

    #[test]
    fn distill_other_error() {
        let r = Error::InvalidFormat("Not a JPEG file")
            .distill_partial_result(|_| panic!("must not be called"));
        assert_err_pat!(r, Error::InvalidFormat("Not a JPEG file"));
    }

    #[test]
    fn display() {
        let e = Error::PartialResult(PartialResult::new(
            Evidence::default(),
            vec![Error::UnknownMakerNote, Error::NotFound("x")]));
        assert_eq!(e.to_string(), "Partial result with 2 errors");
        assert_eq!(Error::NotFound("No Exif data found").to_string(),
                   "No Exif data found");
    }
}
