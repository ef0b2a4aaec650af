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

//! XMP packets embedded in JPEG files.
//!
//! Packets are located by scanning the raw bytes instead of walking
//! APP1 segments.  Extended XMP is split over several segments, and
//! the scan spans them all.
//!
//! Attribute values of interest are base64 payloads, and XML entity
//! decoding could alter them.  `raw_attribute` therefore reads an
//! attribute directly from the packet text, independently of the
//! XML parser.

use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};

use crate::error::Error;
use crate::util::find_bytes;

const XMP_MARKER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const EXT_MARKER: &str = "http://ns.adobe.com/xmp/extension/\0";
const XMPMETA_START: &str = "<x:xmpmeta";
const XMPMETA_END: &[u8] = b"</x:xmpmeta>";

/// Returns the standard XMP packet, from just after its namespace
/// marker to the end of the closing `</x:xmpmeta>` tag.
pub fn find_standard(buf: &[u8]) -> Result<String, Error> {
    let start = find_bytes(buf, XMP_MARKER, 0)
        .ok_or(Error::NotFound("XMP packet not found"))? + XMP_MARKER.len();
    let end = find_bytes(buf, XMPMETA_END, start)
        .ok_or(Error::NotFound("XMP end tag not found"))? + XMPMETA_END.len();
    Ok(String::from_utf8_lossy(&buf[start..end]).into_owned())
}

/// Returns the extended XMP packet identified by `guid`.
///
/// The span from the first chunk header to the closing tag is
/// reassembled by dropping the chunk headers and is then decoded
/// leniently.  Replacement characters for invalid UTF-8 and
/// XML-illegal control characters are removed.
pub fn find_extended(buf: &[u8], guid: &str) -> Result<String, Error> {
    let marker = format!("{}{}\0", EXT_MARKER, guid);
    let start = find_bytes(buf, marker.as_bytes(), 0)
        .ok_or(Error::NotFound("Extended XMP packet not found"))?;
    let end = find_bytes(buf, XMPMETA_END, start)
        .ok_or(Error::NotFound("XMP end tag not found"))? + XMPMETA_END.len();
    // A GUID containing the closing tag puts `end` inside the marker.
    let body = buf.get(start..end).unwrap_or(&[]);
    let body = strip_chunk_headers(body, guid.len());
    let text = String::from_utf8_lossy(&body);
    let text = match text.find(XMPMETA_START) {
        Some(i) => &text[i..],
        None => &text[..],
    };
    let text = text.chars().filter(|&c| c != '\u{fffd}').collect::<String>();
    Ok(sanitize_xml(&text))
}

// Each chunk is preceded by the APP1 marker and length, the namespace,
// the GUID, the full length and the chunk offset.
fn strip_chunk_headers(body: &[u8], guid_len: usize) -> Vec<u8> {
    let marker = EXT_MARKER.as_bytes();
    let mut out = Vec::with_capacity(body.len());
    let mut pos = 0;
    while let Some(i) = find_bytes(body, marker, pos) {
        let head = match i.checked_sub(4) {
            Some(h) if h >= pos && body[h..h + 2] == [0xff, 0xe1] => h,
            _ => i,
        };
        out.extend_from_slice(&body[pos..head]);
        pos = (i + marker.len() + guid_len + 8).min(body.len());
    }
    out.extend_from_slice(&body[pos..]);
    out
}

/// Removes extended XMP chunk headers (the namespace marker and
/// a GUID in upper-case hex) and control characters other than
/// tab, LF and CR.
pub fn sanitize_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(i) = rest.find(EXT_MARKER) {
        let after = &rest[i + EXT_MARKER.len()..];
        let guid_len = after.bytes()
            .take_while(|b| matches!(b, b'A'..=b'F' | b'0'..=b'9'))
            .count();
        if guid_len == 0 {
            out.push_str(&rest[..i + EXT_MARKER.len()]);
        } else {
            out.push_str(&rest[..i]);
        }
        rest = &after[guid_len..];
    }
    out.push_str(rest);
    out.retain(|c| c >= '\u{20}' || c == '\t' || c == '\n' || c == '\r');
    out
}

/// Returns the value of the first `name="..."` attribute in `xml`
/// exactly as written, without entity decoding.  A namespace prefix
/// before `name` is allowed.
///
/// # Examples
/// ```
/// use exif_evidence::xmp::raw_attribute;
/// let xml = r#"<rdf:Description hdrp:HdrPlusMakernote="SERSUA&amp;+/="/>"#;
/// assert_eq!(raw_attribute(xml, "HdrPlusMakernote"), Some("SERSUA&amp;+/="));
/// ```
pub fn raw_attribute<'a>(xml: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!("{}=\"", name);
    let start = xml.find(&pattern)? + pattern.len();
    let len = xml[start..].find('"')?;
    Some(&xml[start..start + len])
}

/// An item of a `Container:Directory`, which describes the media
/// appended to motion and portrait photos.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContainerItem {
    pub mime: String,
    pub semantic: String,
    /// Zero for the primary image.
    pub length: u64,
}

/// The parts of an XMP packet relevant to provenance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XmpDocument {
    pub version: String,
    /// GUID of the extended XMP packet, if any.
    pub has_extended_xmp: String,
    /// All other `rdf:Description` attributes keyed by local name.
    pub attributes: BTreeMap<String, String>,
    pub container: Vec<ContainerItem>,
    /// The raw `HdrPlusMakernote` attribute.  See `raw_attribute`.
    pub hdrplus_makernote: String,
}

impl XmpDocument {
    /// Parses an XMP packet.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        let mut doc = XmpDocument::default();
        let mut reader = quick_xml::Reader::from_str(xml);
        loop {
            match reader.read_event()? {
                Event::Start(ref e) | Event::Empty(ref e) =>
                    match e.local_name().as_ref() {
                        b"Description" => doc.description(e)?,
                        b"Item" => doc.container.push(container_item(e)?),
                        _ => {},
                    },
                Event::Eof => break,
                _ => {},
            }
        }
        doc.hdrplus_makernote = raw_attribute(xml, "HdrPlusMakernote")
            .unwrap_or_default().to_owned();
        Ok(doc)
    }

    fn description(&mut self, e: &BytesStart) -> Result<(), Error> {
        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let name = String::from_utf8_lossy(attr.key.local_name().as_ref())
                .into_owned();
            match name.as_str() {
                // Taken verbatim from the packet text instead.
                "HdrPlusMakernote" => continue,
                "Version" => self.version = attr.unescape_value()?.into_owned(),
                "HasExtendedXMP" =>
                    self.has_extended_xmp = attr.unescape_value()?.into_owned(),
                _ => {},
            }
            self.attributes.insert(name, attr.unescape_value()?.into_owned());
        }
        Ok(())
    }
}

fn container_item(e: &BytesStart) -> Result<ContainerItem, Error> {
    let mut item = ContainerItem::default();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        match attr.key.local_name().as_ref() {
            b"Mime" => item.mime = attr.unescape_value()?.into_owned(),
            b"Semantic" => item.semantic = attr.unescape_value()?.into_owned(),
            b"Length" => item.length =
                attr.unescape_value()?.trim().parse().unwrap_or(0),
            _ => {},
        }
    }
    Ok(item)
}
