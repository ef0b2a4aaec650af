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

use crate::endian::{BigEndian, Endian};
use crate::error::Error;

mod marker {
    // The first byte of a marker.
    pub const P:    u8 = 0xff;
    // Marker codes.
    pub const Z:    u8 = 0x00;		// Not a marker but a byte stuffing.
    pub const TEM:  u8 = 0x01;
    pub const RST0: u8 = 0xd0;
    pub const RST7: u8 = 0xd7;
    pub const SOI:  u8 = 0xd8;
    pub const EOI:  u8 = 0xd9;
    pub const APP1: u8 = 0xe1;
}

// SOI marker as the JPEG header.
const JPEG_SIG: [u8; 2] = [marker::P, marker::SOI];

// Exif identifier code "Exif\0\0". [EXIF23 4.7.2]
const EXIF_ID: [u8; 6] = [0x45, 0x78, 0x69, 0x66, 0x00, 0x00];

const BROKEN: Error = Error::InvalidFormat("Broken JPEG file");

/// Finds the first APP1 segment that carries Exif data and returns
/// the offset of its marker (the 0xff byte).
pub fn find_exif_segment(buf: &[u8]) -> Result<usize, Error> {
    if !is_jpeg(buf) {
        return Err(Error::InvalidFormat("Not a JPEG file"));
    }
    let mut pos = JPEG_SIG.len();
    loop {
        // Find a marker prefix.  Discard non-ff bytes, which appear if
        // we are in the scan data after SOS or we are out of sync.
        pos += buf[pos..].iter().position(|&b| b == marker::P)
            .ok_or(BROKEN)?;
        // Get a marker code.  Fill bytes (0xff) may precede it.
        let mut code;
        loop {
            pos += 1;
            code = *buf.get(pos).ok_or(BROKEN)?;
            if code != marker::P { break; }
        }
        let marker_at = pos - 1;
        pos += 1;
        // Continue or return early on stand-alone markers.
        match code {
            marker::Z | marker::TEM | marker::RST0..=marker::RST7 => continue,
            marker::SOI => return Err(Error::InvalidFormat("Unexpected SOI")),
            marker::EOI => return Err(Error::NotFound("No Exif data found")),
            _ => {},
        }
        // Skip marker segments.
        let seglen = BigEndian::loadu16(buf, pos).ok_or(BROKEN)? as usize;
        if seglen < 2 {
            return Err(Error::InvalidFormat("Invalid segment length"));
        }
        let end = pos + seglen;
        let seg = buf.get(pos + 2..end).ok_or(BROKEN)?;
        if code == marker::APP1 && seg.starts_with(&EXIF_ID) {
            log::debug!(target: "exif_evidence",
                        "Exif APP1 segment at {:#x}, {} bytes",
                        marker_at, seglen);
            return Ok(marker_at);
        }
        pos = end;
    }
}

pub fn is_jpeg(buf: &[u8]) -> bool {
    buf.starts_with(&JPEG_SIG)
}
