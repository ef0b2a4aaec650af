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

//! Structured payload decoding for HDR+ MakerNotes.
//!
//! The decompressed MakerNote is a protobuf message.  Decoding is
//! tolerant: unknown fields are skipped, and when the input ends in
//! the middle of a field, whatever was decoded before that point is
//! still projected.

use prost::Message;

use crate::error::Error;
use crate::evidence::{FieldValue, Fields};

/// The result of decoding a payload.
#[derive(Debug, Default)]
pub struct Decoded {
    /// Recovered fields, keyed by dotted names.
    pub fields: Fields,
    /// The error that stopped decoding early, if any.
    pub error: Option<Error>,
}

/// Decodes the decompressed bytes of an HDR+ MakerNote into fields.
///
/// A decoder must not fail outright: it returns what it recovered
/// together with the error, if any.
pub trait PayloadDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Decoded;
}

/// Top-level HDR+ MakerNote message.
///
/// Text fields are declared as `bytes` so that a message with
/// invalid UTF-8 still decodes.
#[derive(Clone, PartialEq, Message)]
pub struct HdrPlusMakerNote {
    #[prost(message, optional, tag = "1")]
    pub image_info: Option<ImageInfo>,
    #[prost(bytes = "vec", tag = "2")]
    pub time_log_text: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub summary_text: Vec<u8>,
    #[prost(message, optional, tag = "9")]
    pub frame_count: Option<FrameCount>,
    #[prost(message, optional, tag = "10")]
    pub device_info: Option<DeviceInfo>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ImageInfo {
    #[prost(bytes = "vec", tag = "1")]
    pub image_name: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub image_data: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
pub struct FrameCount {
    #[prost(int32, tag = "3")]
    pub frame_count: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct DeviceInfo {
    #[prost(bytes = "vec", tag = "1")]
    pub make: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub model: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub codename: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub hardware_revision: Vec<u8>,
    #[prost(bytes = "vec", tag = "6")]
    pub hdrp_software: Vec<u8>,
    #[prost(bytes = "vec", tag = "7")]
    pub android_release: Vec<u8>,
    #[prost(int64, tag = "8")]
    pub software_date: i64,
    #[prost(bytes = "vec", tag = "9")]
    pub application: Vec<u8>,
    #[prost(bytes = "vec", tag = "10")]
    pub app_version: Vec<u8>,
    #[prost(message, optional, tag = "11")]
    pub exposure_time_info: Option<ExposureTimeInfo>,
    #[prost(message, optional, tag = "12")]
    pub iso_info: Option<IsoInfo>,
    #[prost(int32, tag = "13")]
    pub max_analog_iso: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ExposureTimeInfo {
    #[prost(int64, tag = "1")]
    pub min: i64,
    #[prost(int64, tag = "2")]
    pub max: i64,
}

#[derive(Clone, PartialEq, Message)]
pub struct IsoInfo {
    #[prost(int32, tag = "1")]
    pub min: i32,
    #[prost(int32, tag = "2")]
    pub max: i32,
}

/// The default decoder, for the HDR+ protobuf message.
#[derive(Clone, Copy, Debug, Default)]
pub struct HdrPlusProtobuf;

impl PayloadDecoder for HdrPlusProtobuf {
    fn decode(&self, bytes: &[u8]) -> Decoded {
        let mut msg = HdrPlusMakerNote::default();
        // `merge` leaves the fields decoded before an error in place.
        let error = msg.merge(bytes).err().map(Error::Payload);
        Decoded { fields: project(&msg), error }
    }
}

/// Flattens the message into dotted keys.  Empty and zero values
/// are omitted, except that `frameCount` is kept whenever its
/// message is present.
pub fn project(msg: &HdrPlusMakerNote) -> Fields {
    let mut fields = Fields::new();
    if let Some(ref info) = msg.image_info {
        put_text(&mut fields, "imageInfo.imageName", &info.image_name);
        if !info.image_data.is_empty() {
            fields.insert("imageInfo.imageDataSize".to_owned(),
                          FieldValue::Int(info.image_data.len() as i64));
        }
    }
    put_text(&mut fields, "timeLogText", &msg.time_log_text);
    put_text(&mut fields, "summaryText", &msg.summary_text);
    if let Some(ref fc) = msg.frame_count {
        fields.insert("frameCount".to_owned(),
                      FieldValue::Int(fc.frame_count.into()));
    }
    if let Some(ref dev) = msg.device_info {
        put_text(&mut fields, "deviceInfo.make", &dev.make);
        put_text(&mut fields, "deviceInfo.model", &dev.model);
        put_text(&mut fields, "deviceInfo.codename", &dev.codename);
        put_text(&mut fields, "deviceInfo.hardwareRevision",
                 &dev.hardware_revision);
        put_text(&mut fields, "deviceInfo.hdrpSoftware", &dev.hdrp_software);
        put_text(&mut fields, "deviceInfo.androidRelease",
                 &dev.android_release);
        put_int(&mut fields, "deviceInfo.softwareDate", dev.software_date);
        put_text(&mut fields, "deviceInfo.application", &dev.application);
        put_text(&mut fields, "deviceInfo.appVersion", &dev.app_version);
        if let Some(ref exp) = dev.exposure_time_info {
            put_int(&mut fields, "deviceInfo.exposureTimeMin", exp.min);
            put_int(&mut fields, "deviceInfo.exposureTimeMax", exp.max);
        }
        if let Some(ref iso) = dev.iso_info {
            put_int(&mut fields, "deviceInfo.isoMin", iso.min.into());
            put_int(&mut fields, "deviceInfo.isoMax", iso.max.into());
        }
        put_int(&mut fields, "deviceInfo.maxAnalogIso",
                dev.max_analog_iso.into());
    }
    fields
}

fn put_text(fields: &mut Fields, key: &str, value: &[u8]) {
    if !value.is_empty() {
        fields.insert(key.to_owned(),
                      String::from_utf8_lossy(value).into_owned().into());
    }
}

fn put_int(fields: &mut Fields, key: &str, value: i64) {
    if value != 0 {
        fields.insert(key.to_owned(), FieldValue::Int(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HdrPlusMakerNote {
        HdrPlusMakerNote {
            image_info: Some(ImageInfo {
                image_name: b"IMG_20240101_120000".to_vec(),
                image_data: vec![0; 12],
            }),
            time_log_text: b"capture 12ms\nmerge 48ms".to_vec(),
            summary_text: Vec::new(),
            frame_count: Some(FrameCount { frame_count: 0 }),
            device_info: Some(DeviceInfo {
                make: b"Google".to_vec(),
                model: b"Pixel 8".to_vec(),
                software_date: 1700000000,
                iso_info: Some(IsoInfo { min: 50, max: 0 }),
                max_analog_iso: 1600,
                ..DeviceInfo::default()
            }),
        }
    }

    #[test]
    fn project_sample() {
        let fields = project(&sample());
        assert_eq!(fields["imageInfo.imageName"].as_str(),
                   Some("IMG_20240101_120000"));
        assert_eq!(fields["imageInfo.imageDataSize"].as_int(), Some(12));
        assert_eq!(fields["timeLogText"].as_str(),
                   Some("capture 12ms\nmerge 48ms"));
        assert_eq!(fields["frameCount"].as_int(), Some(0));
        assert_eq!(fields["deviceInfo.make"].as_str(), Some("Google"));
        assert_eq!(fields["deviceInfo.softwareDate"].as_int(), Some(1700000000));
        assert_eq!(fields["deviceInfo.isoMin"].as_int(), Some(50));
        assert_eq!(fields["deviceInfo.maxAnalogIso"].as_int(), Some(1600));
        assert!(!fields.contains_key("summaryText"));
        assert!(!fields.contains_key("deviceInfo.isoMax"));
        assert!(!fields.contains_key("deviceInfo.codename"));
        assert_eq!(fields.len(), 8);
    }

    #[test]
    fn decode_complete() {
        let bytes = sample().encode_to_vec();
        let decoded = HdrPlusProtobuf.decode(&bytes);
        assert!(decoded.error.is_none());
        assert_eq!(decoded.fields, project(&sample()));
    }

    #[test]
    fn decode_truncated() {
        let msg = HdrPlusMakerNote {
            time_log_text: b"first field".to_vec(),
            summary_text: vec![b's'; 100],
            ..HdrPlusMakerNote::default()
        };
        let bytes = msg.encode_to_vec();
        let decoded = HdrPlusProtobuf.decode(&bytes[..bytes.len() - 20]);
        assert_pat!(decoded.error, Some(Error::Payload(_)));
        assert_eq!(decoded.fields["timeLogText"].as_str(), Some("first field"));
        assert!(!decoded.fields.contains_key("summaryText"));
    }

    #[test]
    fn unknown_fields_and_bad_utf8() {
        // Field 5 (varint 7), then field 2 with an invalid UTF-8 byte.
        let bytes = b"\x28\x07\x12\x03a\xffb";
        let decoded = HdrPlusProtobuf.decode(bytes);
        assert!(decoded.error.is_none());
        assert_eq!(decoded.fields["timeLogText"].as_str(), Some("a\u{fffd}b"));
    }
}
