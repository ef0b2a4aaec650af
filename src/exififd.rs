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

//! Decoder for the Exif IFD.

use crate::diag::Diagnostics;
use crate::endian::Endian;
use crate::error::Error;
use crate::evidence::{Evidence, Fields, MakerNote, Temporal};
use crate::labels;
use crate::makernote::MakerNoteRegistry;
use crate::primary::parse_datetime;
use crate::tag::{Context, Tag};
use crate::tiff::{walk_ifd, DateTime};
use crate::value::ValueReader;

/// Decodes the Exif IFD at `base` into `ev`.
///
/// The MakerNote is dispatched to `makernotes` if given and is
/// otherwise ignored.
pub(crate) fn decode<E>(r: &ValueReader<E>, base: usize, ev: &mut Evidence,
                        makernotes: Option<&MakerNoteRegistry>,
                        diag: &mut Diagnostics) -> Result<(), Error>
where E: Endian {
    let walk = walk_ifd::<E, _>(r.buf(), base, |e| {
        let (cam, img) = (&mut ev.camera, &mut ev.image);
        match Tag(Context::Exif, e.tag) {
            Tag::ExposureTime =>
                cam.exposure_time = labels::exposure_time(r.rational_parts(e, 0)),
            Tag::FNumber => cam.f_number = r.rational(e, 0),
            Tag::ExposureProgram => cam.exposure_program =
                labels::exposure_program(r.u16(e)).to_owned(),
            Tag::PhotographicSensitivity => cam.iso = r.u16(e) as u32,
            Tag::ExifVersion => img.exif_version = r.version(e),
            Tag::DateTimeOriginal => ev.temporal.date_captured =
                parse_datetime(&r.string(e), "exif:DateTimeOriginal", diag),
            Tag::DateTimeDigitized => ev.temporal.create_date =
                parse_datetime(&r.string(e), "exif:DateTimeDigitized", diag),
            Tag::OffsetTime => ev.temporal.offset_time = r.string(e),
            Tag::OffsetTimeOriginal =>
                ev.temporal.offset_time_original = r.string(e),
            Tag::OffsetTimeDigitized =>
                ev.temporal.offset_time_digitized = r.string(e),
            Tag::ComponentsConfiguration if e.count == 4 =>
                img.components_configuration =
                labels::components_configuration(&r.inline_bytes::<4>(e)),
            Tag::MeteringMode => cam.metering_mode =
                labels::metering_mode(r.u16(e)).to_owned(),
            Tag::LightSource => cam.light_source =
                labels::light_source(r.u16(e)).to_owned(),
            Tag::Flash => cam.flash = labels::flash(r.u16(e)).to_owned(),
            Tag::FocalLength => cam.focal_length = r.rational(e, 0),
            Tag::MakerNote => if let Some(registry) = makernotes {
                let raw = r.bytes(e);
                match registry.dispatch(raw, diag) {
                    Ok(note) => ev.authenticity.maker_note = Some(note),
                    Err(Error::UnknownMakerNote) => {
                        diag.error("exif:MakerNote",
                                   Error::UnknownMakerNote.to_string());
                        ev.authenticity.maker_note = Some(MakerNote {
                            raw: raw.to_vec(),
                            manufacturer: "Unknown".to_owned(),
                            fields: Fields::new(),
                        });
                    },
                    Err(err) => diag.warn("exif:MakerNote",
                                          format!("Skipped: {}", err)),
                }
            },
            Tag::UserComment =>
                ev.authorship.user_comment = r.user_comment(e),
            Tag::SubSecTime => ev.temporal.sub_sec_time = r.string(e),
            Tag::SubSecTimeOriginal =>
                ev.temporal.sub_sec_time_original = r.string(e),
            Tag::SubSecTimeDigitized =>
                ev.temporal.sub_sec_time_digitized = r.string(e),
            Tag::FlashpixVersion => img.flashpix_version = r.version(e),
            Tag::ColorSpace =>
                img.color_space = labels::color_space(r.u16(e)).to_owned(),
            Tag::PixelXDimension => img.pixel_x_dimension = r.uint(e),
            Tag::PixelYDimension => img.pixel_y_dimension = r.uint(e),
            Tag::RelatedSoundFile =>
                ev.authenticity.related_sound_file = r.string(e),
            Tag::FileSource =>
                img.file_source = labels::file_source(r.u8(e)).to_owned(),
            Tag::SceneType =>
                img.scene_type = labels::scene_type(r.u8(e)).to_owned(),
            Tag::WhiteBalance => cam.white_balance =
                labels::white_balance(r.u16(e)).to_owned(),
            Tag::DigitalZoomRatio =>
                ev.processing.digital_zoom_ratio = r.rational(e, 0),
            Tag::SceneCaptureType => cam.scene_capture_type =
                labels::scene_capture_type(r.u16(e)).to_owned(),
            Tag::Contrast => ev.processing.contrast =
                labels::processing_level(r.u16(e)).to_owned(),
            Tag::Saturation => ev.processing.saturation =
                labels::processing_level(r.u16(e)).to_owned(),
            Tag::Sharpness => ev.processing.sharpness =
                labels::processing_level(r.u16(e)).to_owned(),
            Tag::SubjectDistanceRange => cam.subject_distance_range =
                labels::subject_distance_range(r.u16(e)).to_owned(),
            Tag::ImageUniqueID =>
                ev.authenticity.image_unique_id = r.string(e),
            Tag::BodySerialNumber =>
                ev.device.body_serial_number = r.string(e),
            Tag::LensSpecification => ev.device.lens_info =
                labels::lens_specification(&r.rationals(e, 4)),
            Tag::LensMake => ev.device.lens_make = r.string(e),
            Tag::LensModel => ev.device.lens_model = r.string(e),
            Tag::LensSerialNumber =>
                ev.device.lens_serial_number = r.string(e),
            Tag::ImageEditor => ev.processing.image_editor = r.string(e),
            Tag::CameraFirmware => ev.device.camera_firmware = r.string(e),
            Tag::CompositeImage => ev.processing.composite_image =
                labels::composite_image(r.u16(e)).to_owned(),
            Tag::SourceImageNumberOfCompositeImage => {
                let (source, used) = r.u16_pair(e);
                ev.processing.composite_image_count =
                    format!("{}/{}", source, used);
            },
            Tag::SerialNumber => ev.device.serial_number = r.string(e),
            _ => {},
        }
    })?;
    if walk.is_truncated() {
        diag.warn("exif", format!("IFD declares {} entries but only {} fit",
                                  walk.declared, walk.visited));
    }
    Ok(())
}

/// Folds the sub-second and time zone tags into the parsed dates.
///
/// This runs after all IFDs have been decoded because DateTime lives
/// in the 0th IFD but SubSecTime and OffsetTime live in the Exif IFD.
pub(crate) fn refine_temporal(t: &mut Temporal, diag: &mut Diagnostics) {
    refine(&mut t.modify_date, &t.sub_sec_time, &t.offset_time,
           "exif:SubSecTime", "exif:OffsetTime", diag);
    refine(&mut t.date_captured, &t.sub_sec_time_original,
           &t.offset_time_original,
           "exif:SubSecTimeOriginal", "exif:OffsetTimeOriginal", diag);
    refine(&mut t.create_date, &t.sub_sec_time_digitized,
           &t.offset_time_digitized,
           "exif:SubSecTimeDigitized", "exif:OffsetTimeDigitized", diag);
}

fn refine(dt: &mut Option<DateTime>, subsec: &str, offset: &str,
          subsec_ctx: &str, offset_ctx: &str, diag: &mut Diagnostics) {
    let dt = match dt.as_mut() {
        Some(dt) => dt,
        None => return,
    };
    if !subsec.is_empty() {
        if let Err(err) = dt.parse_subsec(subsec.as_bytes()) {
            diag.warn(subsec_ctx, format!("Cannot parse {:?}: {}", subsec, err));
        }
    }
    // "   :  " means unknown.
    if !offset.trim_matches(|c| c == ' ' || c == ':').is_empty() {
        if let Err(err) = dt.parse_offset(offset.as_bytes()) {
            diag.warn(offset_ctx, format!("Cannot parse {:?}: {}", offset, err));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::diag::Severity;
    use crate::endian::{BigEndian, LittleEndian};
    use super::*;

    // Builds a little-endian IFD at offset 0 with the values area
    // following it.  Offsets in entries are relative to 0.
    fn ifd(entries: &[(u16, u16, u32, &[u8])]) -> Vec<u8> {
        let values_at = 2 + entries.len() * 12 + 4;
        let mut head = (entries.len() as u16).to_le_bytes().to_vec();
        let mut values = Vec::new();
        for &(tag, typ, count, data) in entries {
            head.extend_from_slice(&tag.to_le_bytes());
            head.extend_from_slice(&typ.to_le_bytes());
            head.extend_from_slice(&count.to_le_bytes());
            if data.len() <= 4 {
                let mut inline = data.to_vec();
                inline.resize(4, 0);
                head.extend_from_slice(&inline);
            } else {
                let ofs = (values_at + values.len()) as u32;
                head.extend_from_slice(&ofs.to_le_bytes());
                values.extend_from_slice(data);
            }
        }
        head.extend_from_slice(&[0; 4]);
        head.extend_from_slice(&values);
        head
    }

    fn rational(num: u32, denom: u32) -> Vec<u8> {
        [num.to_le_bytes(), denom.to_le_bytes()].concat()
    }

    #[test]
    fn camera_settings() {
        let exposure = rational(1, 500);
        let fnumber = rational(28, 10);
        let data = ifd(&[
            (0x829a, 5, 1, &exposure),
            (0x829d, 5, 1, &fnumber),
            (0x8827, 3, 1, &[0x90, 0x01]),
            (0x9000, 7, 4, b"0232"),
            (0x9101, 7, 4, &[1, 2, 3, 0]),
            (0x9209, 3, 1, &[0x10, 0]),
            (0xa002, 4, 1, &[0xa0, 0x0f, 0, 0]),
            (0xa301, 7, 1, &[1]),
            (0xa403, 3, 1, &[1, 0]),
            (0xa461, 3, 2, &[5, 0, 3, 0]),
        ]);
        let r = ValueReader::<LittleEndian>::new(&data, 0);
        let mut ev = Evidence::default();
        let mut diag = Diagnostics::new();
        decode(&r, 0, &mut ev, None, &mut diag).unwrap();
        assert_eq!(ev.camera.exposure_time, "1/500");
        assert_eq!(ev.camera.f_number, 2.8);
        assert_eq!(ev.camera.iso, 400);
        assert_eq!(ev.camera.flash, "Off, Did not fire");
        assert_eq!(ev.camera.white_balance, "Manual");
        assert_eq!(ev.image.exif_version, "2.32");
        assert_eq!(ev.image.components_configuration, "YCbCr-");
        assert_eq!(ev.image.pixel_x_dimension, 4000);
        assert_eq!(ev.image.scene_type, "Directly Photographed");
        assert_eq!(ev.processing.composite_image_count, "5/3");
        assert!(diag.is_empty());
    }

    #[test]
    fn strings_and_dates() {
        let data = ifd(&[
            (0x9003, 2, 20, b"2023:07:14 18:22:05\0"),
            (0x9004, 2, 20, b"2023-07-14 18:22:05\0"),
            (0x9011, 2, 7, b"+09:00\0"),
            (0x9291, 2, 4, b"123\0"),
            (0x9286, 7, 13, b"ASCII\0\0\0note\0"),
            (0xa433, 2, 6, b"Apple\0"),
        ]);
        let r = ValueReader::<LittleEndian>::new(&data, 0);
        let mut ev = Evidence::default();
        let mut diag = Diagnostics::new();
        decode(&r, 0, &mut ev, None, &mut diag).unwrap();
        assert_eq!(ev.authorship.user_comment, "note");
        assert_eq!(ev.device.lens_make, "Apple");
        assert_eq!(ev.temporal.create_date, None);
        assert_eq!(diag.len(), 1);

        refine_temporal(&mut ev.temporal, &mut diag);
        let dt = ev.temporal.date_captured.unwrap();
        assert_eq!(dt.to_string(), "2023-07-14 18:22:05");
        assert_eq!(dt.nanosecond, Some(123_000_000));
        assert_eq!(dt.offset, Some(540));
        assert_eq!(diag.len(), 1);
    }

    #[test]
    fn refine_blank_and_bad_offsets() {
        let mut t = Temporal {
            date_captured: DateTime::from_ascii(b"2020:01:01 00:00:00").ok(),
            create_date: DateTime::from_ascii(b"2020:01:01 00:00:00").ok(),
            offset_time_original: "   :  ".to_owned(),
            offset_time_digitized: "0900".to_owned(),
            ..Temporal::default()
        };
        let mut diag = Diagnostics::new();
        refine_temporal(&mut t, &mut diag);
        assert_eq!(t.date_captured.unwrap().offset, None);
        assert_eq!(t.create_date.unwrap().offset, None);
        let d = diag.into_vec();
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].context, "exif:OffsetTimeDigitized");
    }

    #[test]
    fn unknown_makernote() {
        let data = ifd(&[(0x927c, 7, 8, b"Nikon\0\x02\x10")]);
        let r = ValueReader::<LittleEndian>::new(&data, 0);
        let mut ev = Evidence::default();
        let mut diag = Diagnostics::new();
        let registry = MakerNoteRegistry::default();
        decode(&r, 0, &mut ev, Some(&registry), &mut diag).unwrap();
        let note = ev.authenticity.maker_note.unwrap();
        assert_eq!(note.manufacturer, "Unknown");
        assert_eq!(note.raw, b"Nikon\0\x02\x10");
        assert!(note.fields.is_empty());
        assert_eq!(diag.iter().next().unwrap().severity, Severity::Error);

        // Ignored without a registry.
        let mut ev = Evidence::default();
        decode(&r, 0, &mut ev, None, &mut Diagnostics::new()).unwrap();
        assert_eq!(ev.authenticity.maker_note, None);
    }

    #[test]
    fn big_endian_rationals() {
        let data = b"\0\x01\
                     \x92\x0a\0\x05\0\0\0\x01\0\0\0\x12\
                     \0\0\0\0\
                     \0\0\x01\xa4\0\0\0\x64";
        let r = ValueReader::<BigEndian>::new(data, 0);
        let mut ev = Evidence::default();
        decode(&r, 0, &mut ev, None, &mut Diagnostics::new()).unwrap();
        assert_eq!(ev.camera.focal_length, 4.2);
    }
}
