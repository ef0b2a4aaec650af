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

//! The evidence record and its sections.
//!
//! Every field has a zero value (an empty string, 0 or `None`) that
//! is kept when the corresponding tag is absent or unreadable.

use std::collections::BTreeMap;
use std::fmt;

use crate::diag::{Diagnostic, Severity};
use crate::tiff::DateTime;
use crate::xmp::XmpDocument;

/// Provenance metadata extracted from one JPEG file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Evidence {
    pub temporal: Temporal,
    pub gps: Gps,
    pub device: Device,
    pub image: Image,
    pub camera: Camera,
    pub processing: Processing,
    pub authorship: Authorship,
    pub authenticity: Authenticity,
    /// The standard XMP packet, if the HDR+ pipeline read one.
    pub xmp: Option<XmpDocument>,
    /// Problems observed while decoding, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl Evidence {
    /// Returns the diagnostics at or above `severity`.
    pub fn diagnostics_at(&self, severity: Severity)
                          -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.severity >= severity)
    }
}

/// Capture, digitization and modification times.
///
/// The sub-second and time zone tags are kept verbatim and are also
/// folded into the parsed `DateTime` values when they are valid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Temporal {
    /// DateTimeOriginal.
    pub date_captured: Option<DateTime>,
    /// DateTimeDigitized.
    pub create_date: Option<DateTime>,
    /// DateTime of the primary image.
    pub modify_date: Option<DateTime>,
    pub sub_sec_time: String,
    pub sub_sec_time_original: String,
    pub sub_sec_time_digitized: String,
    pub offset_time: String,
    pub offset_time_original: String,
    pub offset_time_digitized: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gps {
    pub version: String,
    /// Meters, negative below sea level.
    pub altitude: f64,
    /// Decimal degrees, negative in the southern hemisphere.
    pub latitude: f64,
    /// Decimal degrees, negative west of Greenwich.
    pub longitude: f64,
    /// GPSDateStamp and GPSTimeStamp combined, in UTC.
    pub timestamp: Option<DateTime>,
    pub speed: String,
    pub direction: String,
    pub map_datum: String,
    pub destination_latitude: f64,
    pub destination_longitude: f64,
    pub destination_bearing: String,
    pub destination_distance: String,
    pub processing_method: String,
    pub differential: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Device {
    pub make: String,
    pub model: String,
    pub body_serial_number: String,
    pub serial_number: String,
    pub camera_firmware: String,
    pub lens_info: String,
    pub lens_make: String,
    pub lens_model: String,
    pub lens_serial_number: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub pixel_x_dimension: u32,
    pub pixel_y_dimension: u32,
    pub orientation: String,
    pub color_space: String,
    pub components_configuration: String,
    pub file_source: String,
    pub scene_type: String,
    pub exif_version: String,
    pub flashpix_version: String,
    /// The HDR+ MakerNote recovered from extended XMP.
    pub makers_note: Option<MakerNote>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Camera {
    pub exposure_time: String,
    pub f_number: f64,
    pub exposure_program: String,
    pub iso: u32,
    /// Millimeters.
    pub focal_length: f64,
    pub metering_mode: String,
    pub light_source: String,
    pub flash: String,
    pub white_balance: String,
    pub scene_capture_type: String,
    pub subject_distance_range: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Processing {
    pub software: String,
    pub processing_software: String,
    pub image_editor: String,
    pub digital_zoom_ratio: f64,
    pub contrast: String,
    pub saturation: String,
    pub sharpness: String,
    pub composite_image: String,
    /// "{source}/{used}" numbers of images of a composite image.
    pub composite_image_count: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Authorship {
    pub artist: String,
    pub copyright: String,
    pub image_description: String,
    pub xp_title: String,
    pub xp_comment: String,
    pub xp_author: String,
    pub xp_keywords: String,
    pub xp_subject: String,
    pub user_comment: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Authenticity {
    pub image_unique_id: String,
    /// The Exif MakerNote decoded by a vendor parser.
    pub maker_note: Option<MakerNote>,
    pub related_sound_file: String,
}

/// A decoded MakerNote.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MakerNote {
    /// The bytes the fields were decoded from.  For HDR+ these are
    /// the base64-decoded bytes before decryption.
    pub raw: Vec<u8>,
    pub manufacturer: String,
    pub fields: Fields,
}

/// Manufacturer-defined fields keyed by name.
pub type Fields = BTreeMap<String, FieldValue>;

/// The value of a manufacturer-defined field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    FloatArray(Vec<f64>),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            FieldValue::Str(ref s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            FieldValue::Int(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(v: Vec<f64>) -> Self {
        FieldValue::FloatArray(v)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FieldValue::Str(ref s) => f.write_str(s),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
            FieldValue::FloatArray(ref v) => {
                let mut sep = "";
                for x in v {
                    write!(f, "{}{}", sep, x)?;
                    sep = ", ";
                }
                Ok(())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values() {
        let e = Evidence::default();
        assert_eq!(e.device.make, "");
        assert_eq!(e.gps.latitude, 0.0);
        assert_eq!(e.temporal.date_captured, None);
        assert_eq!(e.image.makers_note, None);
        assert!(e.diagnostics.is_empty());
    }

    #[test]
    fn diagnostics_at() {
        let mut e = Evidence::default();
        for &severity in &[Severity::Info, Severity::Warning, Severity::Error] {
            e.diagnostics.push(Diagnostic {
                severity, message: String::new(), context: "test".into() });
        }
        assert_eq!(e.diagnostics_at(Severity::Info).count(), 3);
        assert_eq!(e.diagnostics_at(Severity::Warning).count(), 2);
        assert_eq!(e.diagnostics_at(Severity::Error).count(), 1);
    }

    #[test]
    fn field_value_display() {
        assert_eq!(FieldValue::from("HDR Image").to_string(), "HDR Image");
        assert_eq!(FieldValue::Int(-3).to_string(), "-3");
        assert_eq!(FieldValue::Bool(true).to_string(), "true");
        assert_eq!(FieldValue::from(vec![0.5, -1.0]).to_string(), "0.5, -1");
        assert_eq!(FieldValue::Int(7).as_int(), Some(7));
        assert_eq!(FieldValue::Float(1.0).as_str(), None);
    }
}
