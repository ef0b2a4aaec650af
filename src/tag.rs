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

use std::fmt;

// This is not an enum to keep safety and API stability, while
// supporting unknown tag values.  Storing unknown values in a
// repr(u16) enum is unsafe, and a catch-all Unknown(u16) variant
// breaks old code as soon as a new constant is defined.

/// A tag of a TIFF/Exif field.
///
/// Tags are matched against the associated constants, such as
/// `Tag::Make` or `Tag::GPSLatitude`.  The same number means different
/// things in different directories, so a tag carries its `Context`.
///
/// # Examples
/// ```
/// use exif_evidence::{Context, Tag};
/// assert_eq!(Tag::Orientation, Tag(Context::Tiff, 0x112));
/// assert_eq!(Tag::GPSLatitude.to_string(), "GPSLatitude");
/// assert_eq!(Tag(Context::Exif, 0x1234).to_string(), "Tag(Exif, 4660)");
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Tag(pub Context, pub u16);

impl Tag {
    /// Returns the context of the tag.
    #[inline]
    pub fn context(self) -> Context {
        self.0
    }

    /// Returns the value of the tag.
    #[inline]
    pub fn number(self) -> u16 {
        self.1
    }

    /// Returns the name of the tag if it is known.
    pub fn name(self) -> Option<&'static str> {
        get_tag_name(self)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match get_tag_name(*self) {
            Some(name) => f.write_str(name),
            None => write!(f, "Tag({:?}, {})", self.0, self.1),
        }
    }
}

/// An enum that indicates which directory a tag belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Context {
    /// The primary (0th) IFD.
    Tiff,
    /// The Exif sub-IFD.
    Exif,
    /// The GPS sub-IFD.
    Gps,
    /// The IFD inside an Apple MakerNote.
    Apple,
}

macro_rules! generate_well_known_tag_constants {
    (
        $( |$ctx:path| $(
            ($name:ident, $num:expr)
        ),+, )+
    ) => (
        // The constant names follow the Exif specification but not
        // the Rust naming conventions.
        #[allow(non_upper_case_globals)]
        impl Tag {
            $($(
                pub const $name: Tag = Tag($ctx, $num);
            )+)+
        }

        fn get_tag_name(tag: Tag) -> Option<&'static str> {
            match tag {
                $($(
                    Tag::$name => Some(stringify!($name)),
                )+)+
                _ => None,
            }
        }
    )
}

generate_well_known_tag_constants!(
    |Context::Tiff|

    (ProcessingSoftware, 0x000b),
    (ImageWidth, 0x0100),
    (ImageLength, 0x0101),
    (ImageDescription, 0x010e),
    (Make, 0x010f),
    (Model, 0x0110),
    (Orientation, 0x0112),
    (Software, 0x0131),
    (DateTime, 0x0132),
    (Artist, 0x013b),
    (Copyright, 0x8298),
    (ExifIFDPointer, 0x8769),
    (GPSInfoIFDPointer, 0x8825),
    (XPTitle, 0x9c9b),
    (XPComment, 0x9c9c),
    (XPAuthor, 0x9c9d),
    (XPKeywords, 0x9c9e),
    (XPSubject, 0x9c9f),

    |Context::Exif|

    (ExposureTime, 0x829a),
    (FNumber, 0x829d),
    (ExposureProgram, 0x8822),
    (PhotographicSensitivity, 0x8827),
    (ExifVersion, 0x9000),
    (DateTimeOriginal, 0x9003),
    (DateTimeDigitized, 0x9004),
    (OffsetTime, 0x9010),
    (OffsetTimeOriginal, 0x9011),
    (OffsetTimeDigitized, 0x9012),
    (ComponentsConfiguration, 0x9101),
    (MeteringMode, 0x9207),
    (LightSource, 0x9208),
    (Flash, 0x9209),
    (FocalLength, 0x920a),
    (MakerNote, 0x927c),
    (UserComment, 0x9286),
    (SubSecTime, 0x9290),
    (SubSecTimeOriginal, 0x9291),
    (SubSecTimeDigitized, 0x9292),
    (FlashpixVersion, 0xa000),
    (ColorSpace, 0xa001),
    (PixelXDimension, 0xa002),
    (PixelYDimension, 0xa003),
    (RelatedSoundFile, 0xa004),
    (FileSource, 0xa300),
    (SceneType, 0xa301),
    (WhiteBalance, 0xa403),
    (DigitalZoomRatio, 0xa404),
    (SceneCaptureType, 0xa406),
    (Contrast, 0xa408),
    (Saturation, 0xa409),
    (Sharpness, 0xa40a),
    (SubjectDistanceRange, 0xa40c),
    (ImageUniqueID, 0xa420),
    (BodySerialNumber, 0xa431),
    (LensSpecification, 0xa432),
    (LensMake, 0xa433),
    (LensModel, 0xa434),
    (LensSerialNumber, 0xa435),
    (ImageEditor, 0xa438),
    (CameraFirmware, 0xa439),
    (CompositeImage, 0xa460),
    (SourceImageNumberOfCompositeImage, 0xa461),
    (SerialNumber, 0xfde9),

    |Context::Gps|

    (GPSVersionID, 0x00),
    (GPSLatitudeRef, 0x01),
    (GPSLatitude, 0x02),
    (GPSLongitudeRef, 0x03),
    (GPSLongitude, 0x04),
    (GPSAltitudeRef, 0x05),
    (GPSAltitude, 0x06),
    (GPSTimeStamp, 0x07),
    (GPSSpeedRef, 0x0c),
    (GPSSpeed, 0x0d),
    (GPSImgDirectionRef, 0x10),
    (GPSImgDirection, 0x11),
    (GPSMapDatum, 0x12),
    (GPSDestLatitudeRef, 0x13),
    (GPSDestLatitude, 0x14),
    (GPSDestLongitudeRef, 0x15),
    (GPSDestLongitude, 0x16),
    (GPSDestBearingRef, 0x17),
    (GPSDestBearing, 0x18),
    (GPSDestDistanceRef, 0x19),
    (GPSDestDistance, 0x1a),
    (GPSProcessingMethod, 0x1b),
    (GPSDateStamp, 0x1d),
    (GPSDifferential, 0x1e),

    |Context::Apple|

    (MakerNoteVersion, 0x0001),
    (AEStable, 0x0004),
    (AETarget, 0x0005),
    (AEAverage, 0x0006),
    (AFStable, 0x0007),
    (AccelerationVector, 0x0008),
    (HDRImageType, 0x000a),
    (BurstUUID, 0x000b),
    (FocusDistanceRange, 0x000c),
    (OISMode, 0x000f),
    (ContentIdentifier, 0x0011),
    (ImageCaptureType, 0x0014),
    (AppleImageUniqueID, 0x0015),
    (ImageProcessingFlags, 0x0019),
    (QualityHint, 0x001a),
    (LuminanceNoiseAmplitude, 0x001d),
    (PhotosAppFeatureFlags, 0x001f),
    (ImageCaptureRequestID, 0x0020),
    (HDRHeadroom, 0x0021),
    (AFPerformance, 0x0023),
    (SceneFlags, 0x0025),
    (SignalToNoiseRatio, 0x0027),
    (PhotoIdentifier, 0x002b),
    (ColorTemperature, 0x002d),
    (CameraType, 0x002e),
    (FocusPosition, 0x002f),
    (HDRGain, 0x0030),
    (AFMeasuredDepth, 0x0038),
    (AFConfidence, 0x003d),
);
