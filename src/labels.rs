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

//! Labels for enumerated tag values and formatting of a few
//! composite values.
//!
//! Unmapped codes fall back to a fixed label of the table
//! (`"Unknown"`, `"Not Defined"` and so on) instead of failing.

use crate::value::Rational;

/// Orientation (0x112).
pub fn orientation(v: u16) -> &'static str {
    match v {
        1 => "Horizontal",
        2 => "Mirror horizontal",
        3 => "Rotate 180",
        4 => "Mirror vertical",
        5 => "Mirror horizontal and rotate 270 CW",
        6 => "Rotate 90 CW",
        7 => "Mirror horizontal and rotate 90 CW",
        8 => "Rotate 270 CW",
        _ => "Unknown",
    }
}

/// ExposureProgram (0x8822).
pub fn exposure_program(v: u16) -> &'static str {
    match v {
        0 => "Not Defined",
        1 => "Manual",
        2 => "Program AE",
        3 => "Aperture-priority AE",
        4 => "Shutter speed priority AE",
        5 => "Creative (Slow speed)",
        6 => "Action (High speed)",
        7 => "Portrait",
        8 => "Landscape",
        9 => "Bulb",
        _ => "Unknown",
    }
}

/// ComponentsConfiguration (0x9101), such as "YCbCr-".
pub fn components_configuration(v: &[u8]) -> String {
    v.iter().map(|&c| match c {
        0 => "-",
        1 => "Y",
        2 => "Cb",
        3 => "Cr",
        4 => "R",
        5 => "G",
        6 => "B",
        _ => "?",
    }).collect()
}

/// MeteringMode (0x9207).
pub fn metering_mode(v: u16) -> &'static str {
    match v {
        0 => "Unknown",
        1 => "Average",
        2 => "Center-weighted average",
        3 => "Spot",
        4 => "Multi-spot",
        5 => "Multi-segment",
        6 => "Partial",
        255 => "Other",
        _ => "Not Defined",
    }
}

/// LightSource (0x9208).
pub fn light_source(v: u16) -> &'static str {
    match v {
        0 => "Unknown",
        1 => "Daylight",
        2 => "Fluorescent",
        3 => "Tungsten (Incandescent)",
        4 => "Flash",
        9 => "Fine Weather",
        10 => "Cloudy",
        11 => "Shade",
        12 => "Daylight Fluorescent",
        13 => "Day White Fluorescent",
        14 => "Cool White Fluorescent",
        15 => "White Fluorescent",
        16 => "Warm White Fluorescent",
        17 => "Standard Light A",
        18 => "Standard Light B",
        19 => "Standard Light C",
        20 => "D55",
        21 => "D65",
        22 => "D75",
        23 => "D50",
        24 => "ISO Studio Tungsten",
        255 => "Other",
        _ => "Not Defined",
    }
}

/// ColorSpace (0xa001).
pub fn color_space(v: u16) -> &'static str {
    match v {
        0x1 => "sRGB",
        0x2 => "Adobe RGB",
        0xfffd => "Wide Gamut RGB",
        0xfffe => "ICC Profile",
        0xffff => "Uncalibrated",
        _ => "None",
    }
}

/// Flash (0x9209).
pub fn flash(v: u16) -> &'static str {
    match v {
        0x00 => "No Flash",
        0x01 => "Fired",
        0x05 => "Fired, Return no detected",
        0x07 => "Fired, Return detected",
        0x08 => "On, Did not fire",
        0x09 => "On, Fired",
        0x0d => "On, Return not detected",
        0x0f => "On, Return detected",
        0x10 => "Off, Did not fire",
        0x14 => "Off, Did not fire, Return not detected",
        0x18 => "Auto, Did not fire",
        0x19 => "Auto, Fired",
        0x1d => "Auto, Fired, Return not detected",
        0x1f => "Auto, Fired, Return detected",
        0x20 => "No flash function",
        0x30 => "Off, No flash function",
        0x41 => "Fired, Red-eye reduction",
        0x45 => "Fired, Red-eye reduction, Return not detected",
        0x47 => "Fired, Red-eye reduction, Return detected",
        0x49 => "On, Red-eye reduction",
        0x4d => "On, Red-eye reduction, Return not detected",
        0x4f => "On, Red-eye reduction, Return detected",
        0x50 => "Off, Red-eye reduction",
        0x58 => "Auto, Did not fire, Red-eye reduction",
        0x59 => "Auto, Fired, Red-eye reduction",
        0x5d => "Auto, Fired, Red-eye reduction, Return not detected",
        0x5f => "Auto, Fired, Red-eye reduction, Return detected",
        _ => "Unknown",
    }
}

/// Formats ExposureTime (0x829a).
///
/// One second or longer is shown in seconds ("2s", "2.5s"), and
/// shorter times as a reciprocal rounded half up ("1/500").
///
/// # Examples
/// ```
/// use exif_evidence::labels::exposure_time;
/// assert_eq!(exposure_time((1, 500).into()), "1/500");
/// assert_eq!(exposure_time((2, 1).into()), "2s");
/// assert_eq!(exposure_time((5, 2).into()), "2.5s");
/// ```
pub fn exposure_time(v: Rational) -> String {
    if v.denom == 0 || v.num == 0 {
        return "Invalid".to_owned();
    }
    if v.num >= v.denom {
        let secs = v.to_f64();
        if secs.fract() == 0.0 {
            return format!("{}s", secs as u64);
        }
        return format!("{:.1}s", secs);
    }
    let recip = (v.denom as f64 / v.num as f64 + 0.5) as u64;
    format!("1/{}", recip)
}

/// FileSource (0xa300).
pub fn file_source(v: u8) -> &'static str {
    match v {
        1 => "Film Scanner (Transparent Scanner)",
        2 => "Film Scanner (Relection Print Scanner)",
        3 => "Digital Camera",
        _ => "Unknown",
    }
}

/// SceneType (0xa301).
pub fn scene_type(v: u8) -> &'static str {
    match v {
        1 => "Directly Photographed",
        _ => "Unknown",
    }
}

/// SceneCaptureType (0xa406).
pub fn scene_capture_type(v: u16) -> &'static str {
    match v {
        0 => "Standard",
        1 => "Landscape",
        2 => "Portrait",
        3 => "Night",
        4 => "Other",
        _ => "Unknown",
    }
}

/// WhiteBalance (0xa403).
pub fn white_balance(v: u16) -> &'static str {
    match v {
        0 => "Auto",
        1 => "Manual",
        _ => "Unknown",
    }
}

/// Contrast (0xa408), Saturation (0xa409) and Sharpness (0xa40a).
/// The three tags share the same codes.
pub fn processing_level(v: u16) -> &'static str {
    match v {
        0 => "Normal",
        1 => "Low",
        2 => "High",
        _ => "Unknown or not set",
    }
}

/// SubjectDistanceRange (0xa40c).
pub fn subject_distance_range(v: u16) -> &'static str {
    match v {
        0 => "Unknown",
        1 => "Macro",
        2 => "Close",
        3 => "Distant",
        _ => "Not defined",
    }
}

/// CompositeImage (0xa460).
pub fn composite_image(v: u16) -> &'static str {
    match v {
        0 => "Unknown",
        1 => "Not a Composite Image",
        2 => "General Composite Image",
        3 => "Composite Image Captured While Shooting",
        _ => "Not defined",
    }
}

/// Formats LensSpecification (0xa432) like "24-70mm f/2.8-4".
///
/// The four rationals are the minimum and maximum focal lengths and
/// the minimum F numbers at them.  An unknown F number (0/0) is
/// omitted.
pub fn lens_specification(v: &[Rational]) -> String {
    if v.len() < 4 {
        return String::new();
    }
    let (fmin, fmax) = (v[0].to_f64(), v[1].to_f64());
    let mut s = if fmin == fmax {
        format!("{}mm", fmin)
    } else {
        format!("{}-{}mm", fmin, fmax)
    };
    if v[2].denom != 0 {
        let (amin, amax) = (v[2].to_f64(), v[3].to_f64());
        if v[3].denom == 0 || amin == amax {
            s.push_str(&format!(" f/{}", amin));
        } else {
            s.push_str(&format!(" f/{}-{}", amin, amax));
        }
    }
    s
}

/// GPSDifferential (0x1e).
pub fn gps_differential(v: u16) -> &'static str {
    match v {
        1 => "Differential Corrected",
        _ => "No Correction",
    }
}

/// HDRImageType of Apple MakerNotes.
pub fn apple_hdr_image_type(v: u32) -> &'static str {
    match v {
        3 => "HDR Image",
        4 => "Original Image",
        _ => "Unknown",
    }
}

/// ImageCaptureType of Apple MakerNotes.
pub fn apple_image_capture_type(v: i32) -> &'static str {
    match v {
        1 => "ProRAW",
        2 => "Portrait",
        10 => "Photo",
        11 => "Manual Focus",
        12 => "Scene",
        _ => "Unknown Value",
    }
}

/// CameraType of Apple MakerNotes.
pub fn apple_camera_type(v: i32) -> &'static str {
    match v {
        0 => "Back Wide Angle",
        1 => "Back Normal",
        6 => "Front",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposure() {
        let sets: &[((u32, u32), &str)] = &[
            ((1, 500), "1/500"),
            ((2, 1), "2s"),
            ((10, 10), "1s"),
            ((5, 2), "2.5s"),
            ((13, 10), "1.3s"),
            ((10, 1250), "1/125"),
            // 3/1000 is 1/333.33..., and 3/2000 is 1/666.66...
            ((3, 1000), "1/333"),
            ((3, 2000), "1/667"),
            ((1, 0), "Invalid"),
            ((0, 100), "Invalid"),
        ];
        for &(r, expected) in sets {
            assert_eq!(exposure_time(r.into()), expected, "{:?}", r);
        }
    }

    #[test]
    fn fallbacks() {
        assert_eq!(orientation(6), "Rotate 90 CW");
        assert_eq!(orientation(0), "Unknown");
        assert_eq!(exposure_program(10), "Unknown");
        assert_eq!(metering_mode(7), "Not Defined");
        assert_eq!(light_source(5), "Not Defined");
        assert_eq!(light_source(255), "Other");
        assert_eq!(color_space(0), "None");
        assert_eq!(flash(0x02), "Unknown");
        assert_eq!(flash(0x19), "Auto, Fired");
        assert_eq!(file_source(3), "Digital Camera");
        assert_eq!(scene_type(0), "Unknown");
        assert_eq!(scene_capture_type(3), "Night");
        assert_eq!(processing_level(9), "Unknown or not set");
        assert_eq!(subject_distance_range(4), "Not defined");
        assert_eq!(composite_image(2), "General Composite Image");
        assert_eq!(gps_differential(0), "No Correction");
        assert_eq!(apple_image_capture_type(-1), "Unknown Value");
    }

    #[test]
    fn components() {
        assert_eq!(components_configuration(&[1, 2, 3, 0]), "YCbCr-");
        assert_eq!(components_configuration(&[4, 5, 6, 9]), "RGB?");
    }

    #[test]
    fn lens() {
        let spec = [(24, 1), (70, 1), (28, 10), (4, 1)]
            .iter().map(|&r| r.into()).collect::<Vec<Rational>>();
        assert_eq!(lens_specification(&spec), "24-70mm f/2.8-4");
        let spec = [(42, 10), (42, 10), (18, 10), (18, 10)]
            .iter().map(|&r| r.into()).collect::<Vec<Rational>>();
        assert_eq!(lens_specification(&spec), "4.2mm f/1.8");
        let spec = [(50, 1), (50, 1), (0, 0), (0, 0)]
            .iter().map(|&r| r.into()).collect::<Vec<Rational>>();
        assert_eq!(lens_specification(&spec), "50mm");
        assert_eq!(lens_specification(&spec[..3]), "");
    }
}
