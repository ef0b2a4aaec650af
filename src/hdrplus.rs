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

//! The Google HDR+ MakerNote.
//!
//! HDR+ photos carry their MakerNote in the `HdrPlusMakernote`
//! attribute of the extended XMP packet.  The value is base64 text
//! of the `"HDRP"` magic, one separator byte and an encrypted gzip
//! stream of a protobuf message.  The stream is often truncated in
//! the wild, so every stage keeps whatever it could recover.

use std::io;
use std::io::Read;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, Engine, GeneralPurpose,
                     GeneralPurposeConfig};
use flate2::read::{DeflateDecoder, GzDecoder};

use crate::diag::Diagnostics;
use crate::error::Error;
use crate::evidence::{Evidence, MakerNote};
use crate::payload::PayloadDecoder;
use crate::xmp::{find_extended, find_standard, raw_attribute, XmpDocument};

/// The manufacturer name given to recovered HDR+ MakerNotes.
pub const MANUFACTURER: &str = "Google HDR+";

const MAGIC: &[u8] = b"HDRP";
// The magic is followed by one byte before the ciphertext.
const CIPHERTEXT_AT: usize = MAGIC.len() + 1;

const KEY_SEED: (u32, u32) = (0x2515_606b, 0x4a77_91cd);
// 0x2545f4914f6cdd1d in big-endian 16-bit limbs.
const MULTIPLIER: [u64; 4] = [0x2545, 0xf491, 0x4f6c, 0xdd1d];

// Padding is canonical after `sanitize_base64`, but the final
// character may carry nonzero trailing bits.
const PADDED: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireCanonical));
const UNPADDED: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::RequireNone));

/// Keeps only base64 characters and recomputes the `=` padding.
///
/// # Examples
/// ```
/// use exif_evidence::hdrplus::sanitize_base64;
/// assert_eq!(sanitize_base64("SE\u{fffd}RS\n\u{8}UA="), "SERSUA==");
/// assert_eq!(sanitize_base64("SERSUA=="), "SERSUA==");
/// ```
pub fn sanitize_base64(s: &str) -> String {
    let mut out = s.chars()
        .filter(|&c| c.is_ascii_alphanumeric() || c == '+' || c == '/' ||
                c == '=')
        .collect::<String>();
    let removed = s.chars().count() - out.len();
    if removed > 0 {
        log::debug!(target: "exif_evidence",
                    "Removed {} non-base64 characters", removed);
    }
    let len = out.trim_end_matches('=').len();
    out.truncate(len);
    let pad = (4 - len % 4) % 4;
    out.extend(std::iter::repeat('=').take(pad));
    out
}

/// Decodes standard base64, retrying without padding on failure.
pub fn decode_base64(s: &str) -> Result<Vec<u8>, Error> {
    PADDED.decode(s).or_else(|err| {
        log::debug!(target: "exif_evidence",
                    "Padded base64 failed ({}), retrying without padding",
                    err);
        UNPADDED.decode(s.trim_end_matches('='))
    }).map_err(Error::Base64)
}

/// Multiplies the 64-bit value `hi:lo` by 0x2545f4914f6cdd1d and
/// returns the low 64 bits as `(hi, lo)`.
///
/// The product is computed with 16-bit limbs and explicit carries.
pub fn multiply64(hi: u32, lo: u32) -> (u32, u32) {
    let a = [(hi >> 16) as u64, (hi & 0xffff) as u64,
             (lo >> 16) as u64, (lo & 0xffff) as u64];
    let mut c = [0u64; 7];
    for (j, &x) in a.iter().enumerate() {
        for (k, &y) in MULTIPLIER.iter().enumerate() {
            c[j + k] += x * y;
        }
    }
    for j in (3..=6).rev() {
        while c[j] > 0xffff_ffff {
            c[j - 2] += 1;
            c[j] -= 1 << 32;
        }
        c[j - 1] += c[j] >> 16;
        c[j] &= 0xffff;
    }
    (((c[3] << 16) + c[4]) as u32, ((c[5] << 16) + c[6]) as u32)
}

/// Decrypts (or encrypts, as the cipher is an involution) HDR+
/// MakerNote bytes.
///
/// The data is processed as 8-byte blocks of two little-endian
/// 32-bit words, zero-padded at the end.  Before each block the
/// running key goes through three xorshift steps and a multiply,
/// and is then XORed into the block.  The padding is removed from
/// the result.
pub fn decrypt(data: &[u8]) -> Vec<u8> {
    let mut buf = data.to_vec();
    buf.resize((data.len() + 7) / 8 * 8, 0);
    let (mut hi, mut lo) = KEY_SEED;
    for block in buf.chunks_exact_mut(8) {
        lo ^= lo >> 12 | (hi & 0xfff) << 20;
        hi ^= hi >> 12;
        hi ^= (hi & 0x7f) << 25 | lo >> 7;
        lo ^= (lo & 0x7f) << 25;
        lo ^= lo >> 27 | (hi & 0x7ff_ffff) << 5;
        hi ^= hi >> 27;
        (hi, lo) = multiply64(hi, lo);
        let (w0, w1) = block.split_at_mut(4);
        xor_word(w0, lo);
        xor_word(w1, hi);
    }
    buf.truncate(data.len());
    buf
}

fn xor_word(word: &mut [u8], key: u32) {
    for (b, k) in word.iter_mut().zip(key.to_le_bytes()) {
        *b ^= k;
    }
}

/// The framing a compressed stream was recovered with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Framing {
    Gzip,
    RawDeflate,
}

/// Bytes recovered from a possibly truncated compressed stream.
#[derive(Debug)]
pub struct Inflated {
    pub bytes: Vec<u8>,
    pub framing: Framing,
    /// The error that ended the stream early, if any.  `bytes` holds
    /// everything decoded before it.
    pub error: Option<io::Error>,
}

/// Decompresses a gzip stream, falling back to raw DEFLATE.
///
/// Output decoded before an error is kept.  Only an error with no
/// output at all is returned as `Err`.
pub fn inflate(data: &[u8]) -> Result<Inflated, Error> {
    let mut bytes = Vec::new();
    let gz_err = match GzDecoder::new(data).read_to_end(&mut bytes) {
        Ok(_) => return Ok(Inflated { bytes, framing: Framing::Gzip,
                                      error: None }),
        Err(err) if !bytes.is_empty() =>
            return Ok(Inflated { bytes, framing: Framing::Gzip,
                                 error: Some(err) }),
        Err(err) => err,
    };
    log::debug!(target: "exif_evidence",
                "gzip failed ({}), retrying as raw DEFLATE", gz_err);
    let mut bytes = Vec::new();
    match DeflateDecoder::new(data).read_to_end(&mut bytes) {
        Ok(_) if !bytes.is_empty() =>
            Ok(Inflated { bytes, framing: Framing::RawDeflate, error: None }),
        Err(err) if !bytes.is_empty() =>
            Ok(Inflated { bytes, framing: Framing::RawDeflate,
                          error: Some(err) }),
        Ok(_) => Err(Error::Decompress(gz_err)),
        Err(err) => Err(Error::Decompress(err)),
    }
}

/// Extracts the HDR+ MakerNote from the XMP packets of `buf`.
///
/// The standard packet is stored in `ev.xmp`.  A packet without
/// `HasExtendedXMP` or a payload without the magic ends the pipeline
/// successfully.  Truncated streams and payloads are recorded as
/// warnings and do not fail.
pub(crate) fn recover(buf: &[u8], ev: &mut Evidence,
                      decoder: &dyn PayloadDecoder, diag: &mut Diagnostics)
                      -> Result<(), Error> {
    let packet = find_standard(buf)?;
    let doc = XmpDocument::parse(&packet).unwrap_or_else(|err| {
        diag.warn("xmp", format!("Malformed XMP packet: {}", err));
        XmpDocument {
            has_extended_xmp: raw_attribute(&packet, "HasExtendedXMP")
                .unwrap_or_default().to_owned(),
            ..XmpDocument::default()
        }
    });
    let guid = doc.has_extended_xmp.clone();
    ev.xmp = Some(doc);
    if guid.is_empty() {
        diag.info("xmp", "No extended XMP packet");
        return Ok(());
    }

    let extended = find_extended(buf, &guid)?;
    let attr = raw_attribute(&extended, "HdrPlusMakernote")
        .ok_or(Error::NotFound("No HdrPlusMakernote attribute"))?;
    let clean = sanitize_base64(attr);
    log::debug!(target: "exif_evidence", "HdrPlusMakernote: {} -> {} chars",
                attr.len(), clean.len());
    let encrypted = decode_base64(&clean)?;
    if encrypted.len() < CIPHERTEXT_AT || !encrypted.starts_with(MAGIC) {
        diag.info("hdrplus", "MakerNote does not start with HDRP");
        return Ok(());
    }

    let decrypted = decrypt(&encrypted[CIPHERTEXT_AT..]);
    let inflated = inflate(&decrypted)?;
    if inflated.framing == Framing::RawDeflate {
        diag.warn("hdrplus", "Corrupted gzip framing, recovered as raw DEFLATE");
    }
    if let Some(ref err) = inflated.error {
        diag.warn("hdrplus", format!(
            "Compressed stream ended early ({}), using {} recovered bytes",
            err, inflated.bytes.len()));
    }
    let decoded = decoder.decode(&inflated.bytes);
    if let Some(err) = decoded.error {
        diag.warn("hdrplus", format!("Payload decoded partially: {}", err));
    }
    ev.image.makers_note = Some(MakerNote {
        raw: encrypted,
        manufacturer: MANUFACTURER.to_owned(),
        fields: decoded.fields,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use flate2::Compression;
    use flate2::write::{DeflateEncoder, GzEncoder};
    use proptest::prelude::*;
    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        (0..s.len()).step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
            .collect()
    }

    #[test]
    fn multiply() {
        assert_eq!(multiply64(0, 1), (0x2545f491, 0x4f6cdd1d));
        assert_eq!(multiply64(0xffffffff, 0xffffffff), (0xdaba0b6e, 0xb09322e3));
        assert_eq!(multiply64(0x01234567, 0x89abcdef), (0x9615c7fa, 0x8b11a713));
    }

    #[test]
    fn multiply_matches_wrapping_mul() {
        for &x in &[0u64, 1, 0x0123456789abcdef, 0xfedcba9876543210, u64::MAX] {
            let (hi, lo) = multiply64((x >> 32) as u32, x as u32);
            assert_eq!((hi as u64) << 32 | lo as u64,
                       x.wrapping_mul(0x2545f4914f6cdd1d));
        }
    }

    #[test]
    fn known_ciphertext() {
        assert_eq!(decrypt(&[0; 32]), hex(
            "f0ef3d6d5e701e2ce81ca0ea3d1bf31d780293fa0e6e6b2c5524dd343119c584"));
        assert_eq!(decrypt(&hex("b8ab6f467e1d7f478d6ece85497ed23c")),
                   b"HDR+ makernote!!");
        assert_eq!(decrypt(b"HDR+ makernote!!"),
                   hex("b8ab6f467e1d7f478d6ece85497ed23c"));
    }

    #[test]
    fn unaligned_length() {
        // The key stream does not depend on the length.
        assert_eq!(decrypt(&[0; 13]), hex("f0ef3d6d5e701e2ce81ca0ea3d"));
        assert!(decrypt(&[]).is_empty());
    }

    #[test]
    fn base64_fallback() {
        assert_ok!(decode_base64("SERSUA=="), b"HDRP");
        // Nonzero trailing bits are accepted.
        assert_ok!(decode_base64("SERSUB=="), b"HDRP");
        assert_ok!(decode_base64("SERSUA"), b"HDRP");
        assert_err_pat!(decode_base64("S==="), Error::Base64(_));
    }

    #[test]
    fn inflate_gzip() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"hello, world").unwrap();
        let gz = enc.finish().unwrap();
        let out = inflate(&gz).unwrap();
        assert_eq!(out.bytes, b"hello, world");
        assert_eq!(out.framing, Framing::Gzip);
        assert!(out.error.is_none());
    }

    #[test]
    fn inflate_truncated_gzip() {
        let text = (0..20000u32).map(|i| (i * 7919 % 251) as u8)
            .collect::<Vec<_>>();
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&text).unwrap();
        let gz = enc.finish().unwrap();
        let out = inflate(&gz[..gz.len() - 10]).unwrap();
        assert!(!out.bytes.is_empty());
        assert!(text.starts_with(&out.bytes));
        assert!(out.error.is_some());
    }

    #[test]
    fn inflate_raw_deflate() {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"no gzip header").unwrap();
        let raw = enc.finish().unwrap();
        let out = inflate(&raw).unwrap();
        assert_eq!(out.bytes, b"no gzip header");
        assert_eq!(out.framing, Framing::RawDeflate);
    }

    #[test]
    fn inflate_garbage() {
        assert_err_pat!(inflate(b"\xff\xff\xff\xff"), Error::Decompress(_));
    }

    proptest! {
        #[test]
        fn sanitize_idempotent(s in any::<String>()) {
            let once = sanitize_base64(&s);
            prop_assert_eq!(sanitize_base64(&once), once.clone());
        }

        #[test]
        fn sanitize_padding_law(s in "[A-Za-z0-9+/=]*") {
            prop_assert_eq!(sanitize_base64(&s).len() % 4, 0);
        }

        #[test]
        fn decrypt_is_involution(data in prop::collection::vec(any::<u8>(), 0..64)) {
            prop_assert_eq!(decrypt(&decrypt(&data)), data);
        }
    }
}
