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

//! Decoder for the GPS IFD.
//!
//! Reference tags (N/S, E/W, above/below sea level) may appear before
//! or after the values they qualify, so raw values are accumulated
//! over the whole directory and composed only after the walk.

use crate::diag::Diagnostics;
use crate::endian::Endian;
use crate::error::Error;
use crate::evidence::Gps;
use crate::labels;
use crate::tag::{Context, Tag};
use crate::tiff::{walk_ifd, DateTime};
use crate::value::ValueReader;

const CONTEXT: &str = "gps";

/// Decodes the GPS IFD at `base` into `gps`.
pub(crate) fn decode<E>(r: &ValueReader<E>, base: usize, gps: &mut Gps,
                        diag: &mut Diagnostics) -> Result<(), Error>
where E: Endian {
    let mut acc = GpsAccumulator::default();
    let walk = walk_ifd::<E, _>(r.buf(), base, |e| {
        match Tag(Context::Gps, e.tag) {
            Tag::GPSVersionID => {
                let v = r.inline_bytes::<4>(e);
                gps.version = format!("{}.{}.{}.{}", v[0], v[1], v[2], v[3]);
            },
            Tag::GPSLatitudeRef => acc.lat_ref = r.string(e),
            Tag::GPSLatitude => acc.lat = Some(r.gps_coord(e)),
            Tag::GPSLongitudeRef => acc.long_ref = r.string(e),
            Tag::GPSLongitude => acc.long = Some(r.gps_coord(e)),
            Tag::GPSAltitudeRef => {
                let v = r.u8(e);
                acc.below_sea_level = v == 1 || v == 3;
            },
            Tag::GPSAltitude => acc.alt = r.rational(e, 0),
            Tag::GPSTimeStamp => acc.time = Some(
                [r.rational(e, 0), r.rational(e, 8), r.rational(e, 16)]),
            Tag::GPSSpeedRef => acc.speed_ref = r.string(e),
            Tag::GPSSpeed => acc.speed = r.rational(e, 0),
            Tag::GPSImgDirectionRef => acc.direction_ref = r.string(e),
            Tag::GPSImgDirection => acc.direction = Some(r.rational(e, 0)),
            Tag::GPSMapDatum => gps.map_datum = r.string(e),
            Tag::GPSDestLatitudeRef => acc.dest_lat_ref = r.string(e),
            Tag::GPSDestLatitude => acc.dest_lat = Some(r.gps_coord(e)),
            Tag::GPSDestLongitudeRef => acc.dest_long_ref = r.string(e),
            Tag::GPSDestLongitude => acc.dest_long = Some(r.gps_coord(e)),
            Tag::GPSDestBearingRef => acc.bearing_ref = r.string(e),
            Tag::GPSDestBearing => acc.bearing = Some(r.rational(e, 0)),
            Tag::GPSDestDistanceRef => acc.distance_ref = r.string(e),
            Tag::GPSDestDistance => acc.distance = Some(r.rational(e, 0)),
            Tag::GPSProcessingMethod => gps.processing_method = r.string(e),
            Tag::GPSDateStamp => acc.date = r.string(e),
            Tag::GPSDifferential =>
                gps.differential = labels::gps_differential(r.u16(e)).to_owned(),
            _ => {},
        }
    })?;
    if walk.is_truncated() {
        diag.warn(CONTEXT, format!("IFD declares {} entries but only {} fit",
                                   walk.declared, walk.visited));
    }
    acc.finish(gps, diag);
    Ok(())
}

/// Raw GPS values collected during the walk.
#[derive(Debug, Default)]
struct GpsAccumulator {
    lat: Option<f64>,
    lat_ref: String,
    long: Option<f64>,
    long_ref: String,
    alt: f64,
    below_sea_level: bool,
    time: Option<[f64; 3]>,
    date: String,
    speed: f64,
    speed_ref: String,
    direction: Option<f64>,
    direction_ref: String,
    dest_lat: Option<f64>,
    dest_lat_ref: String,
    dest_long: Option<f64>,
    dest_long_ref: String,
    bearing: Option<f64>,
    bearing_ref: String,
    distance: Option<f64>,
    distance_ref: String,
}

impl GpsAccumulator {
    fn finish(self, gps: &mut Gps, diag: &mut Diagnostics) {
        if let Some(lat) = self.lat {
            gps.latitude = signed(lat, &self.lat_ref, "S");
            check_range(gps.latitude, 90.0, "Latitude", diag);
        }
        if let Some(long) = self.long {
            gps.longitude = signed(long, &self.long_ref, "W");
            check_range(gps.longitude, 180.0, "Longitude", diag);
        }

        gps.altitude = if self.below_sea_level { -self.alt } else { self.alt };
        if gps.altitude < -11000.0 || gps.altitude > 9000.0 {
            diag.warn(CONTEXT,
                      format!("Altitude {} out of valid range", gps.altitude));
        }

        if !self.speed_ref.is_empty() {
            gps.speed = format!("{:.2}{}", self.speed, self.speed_ref);
        }
        if let Some(dir) = self.direction.filter(|_| !self.direction_ref.is_empty()) {
            gps.direction = format!("{:.6}{}", dir, self.direction_ref);
        }

        if let Some(lat) = self.dest_lat {
            gps.destination_latitude = signed(lat, &self.dest_lat_ref, "S");
            check_range(gps.destination_latitude, 90.0,
                        "Destination latitude", diag);
        }
        if let Some(long) = self.dest_long {
            gps.destination_longitude = signed(long, &self.dest_long_ref, "W");
            check_range(gps.destination_longitude, 180.0,
                        "Destination longitude", diag);
        }
        if let Some(v) = self.bearing.filter(|_| !self.bearing_ref.is_empty()) {
            gps.destination_bearing = format!("{:.6}{}", v, self.bearing_ref);
        }
        if let Some(v) = self.distance.filter(|_| !self.distance_ref.is_empty()) {
            gps.destination_distance = format!("{:.6}{}", v, self.distance_ref);
        }

        if let Some(time) = self.time.filter(|_| !self.date.is_empty()) {
            gps.timestamp = timestamp(&self.date, time, diag);
        }
    }
}

fn signed(v: f64, reference: &str, negative: &str) -> f64 {
    if reference == negative { -v } else { v }
}

fn check_range(v: f64, limit: f64, what: &str, diag: &mut Diagnostics) {
    if v < -limit || v > limit {
        diag.warn(CONTEXT, format!("{} {} out of valid range", what, v));
    }
}

// Hours and minutes are truncated.  The fraction of seconds is kept
// in nanoseconds.
fn timestamp(date: &str, [h, m, s]: [f64; 3], diag: &mut Diagnostics)
             -> Option<DateTime> {
    let mut dt = match DateTime::from_date_ascii(date.as_bytes()) {
        Ok(dt) => dt,
        Err(err) => {
            diag.warn("gps:GPSDateStamp",
                      format!("Cannot parse {:?}: {}", date, err));
            return None;
        },
    };
    if !(0.0..24.0).contains(&h) || !(0.0..60.0).contains(&m) ||
        !(0.0..61.0).contains(&s) {
        diag.warn("gps:GPSTimeStamp",
                  format!("Time {}:{}:{} out of range", h, m, s));
        return None;
    }
    dt.hour = h as u8;
    dt.minute = m as u8;
    dt.second = s as u8;
    dt.nanosecond = Some(((s - s.trunc()) * 1e9) as u32);
    dt.offset = Some(0);
    Some(dt)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use crate::endian::BigEndian;
    use super::*;

    // A big-endian IFD at 0 followed by its values.
    fn ifd(entries: &[(u16, u16, u32, Vec<u8>)]) -> Vec<u8> {
        let values_at = 2 + entries.len() * 12 + 4;
        let mut head = (entries.len() as u16).to_be_bytes().to_vec();
        let mut values = Vec::new();
        for (tag, typ, count, data) in entries {
            head.extend_from_slice(&tag.to_be_bytes());
            head.extend_from_slice(&typ.to_be_bytes());
            head.extend_from_slice(&count.to_be_bytes());
            if data.len() <= 4 {
                let mut inline = data.clone();
                inline.resize(4, 0);
                head.extend_from_slice(&inline);
            } else {
                head.extend_from_slice(
                    &((values_at + values.len()) as u32).to_be_bytes());
                values.extend_from_slice(data);
            }
        }
        head.extend_from_slice(&[0; 4]);
        head.extend_from_slice(&values);
        head
    }

    fn rationals(v: &[(u32, u32)]) -> Vec<u8> {
        v.iter().flat_map(|&(n, d)| {
            n.to_be_bytes().into_iter().chain(d.to_be_bytes())
        }).collect()
    }

    fn decode_ifd(data: &[u8]) -> (Gps, Diagnostics) {
        let r = ValueReader::<BigEndian>::new(data, 0);
        let mut gps = Gps::default();
        let mut diag = Diagnostics::new();
        decode(&r, 0, &mut gps, &mut diag).unwrap();
        (gps, diag)
    }

    #[test]
    fn coordinates_with_refs_after_values() {
        let data = ifd(&[
            (0x00, 1, 4, vec![2, 3, 0, 0]),
            (0x02, 5, 3, rationals(&[(405000, 10000), (0, 1), (0, 1)])),
            (0x04, 5, 3, rationals(&[(73, 1), (59, 1), (600, 100)])),
            (0x01, 2, 2, b"N\0".to_vec()),
            (0x03, 2, 2, b"W\0".to_vec()),
            (0x06, 5, 1, rationals(&[(12, 1)])),
            (0x05, 1, 1, vec![1]),
            (0x1e, 3, 1, vec![0, 1]),
        ]);
        let (gps, diag) = decode_ifd(&data);
        assert_eq!(gps.version, "2.3.0.0");
        assert!((gps.latitude - 40.5).abs() < 1e-9);
        assert!((gps.longitude + 73.985).abs() < 1e-9, "{}", gps.longitude);
        assert_eq!(gps.altitude, -12.0);
        assert_eq!(gps.differential, "Differential Corrected");
        assert!(diag.is_empty());
    }

    #[test]
    fn formatted_values() {
        let data = ifd(&[
            (0x0c, 2, 2, b"K\0".to_vec()),
            (0x0d, 5, 1, rationals(&[(5, 2)])),
            (0x10, 2, 2, b"T\0".to_vec()),
            (0x11, 5, 1, rationals(&[(18050, 100)])),
            (0x18, 5, 1, rationals(&[(90, 1)])),
            (0x1a, 5, 1, rationals(&[(3, 2)])),
            (0x19, 2, 2, b"K\0".to_vec()),
            (0x12, 2, 7, b"WGS-84\0".to_vec()),
        ]);
        let (gps, _) = decode_ifd(&data);
        assert_eq!(gps.speed, "2.50K");
        assert_eq!(gps.direction, "180.500000T");
        // No reference for the bearing.
        assert_eq!(gps.destination_bearing, "");
        assert_eq!(gps.destination_distance, "1.500000K");
        assert_eq!(gps.map_datum, "WGS-84");
    }

    #[test]
    fn timestamp_needs_date() {
        let time = rationals(&[(14, 1), (5, 1), (3125, 100)]);
        let (gps, _) = decode_ifd(&ifd(&[(0x07, 5, 3, time.clone())]));
        assert_eq!(gps.timestamp, None);

        let data = ifd(&[
            (0x1d, 2, 11, b"2021:02:28\0".to_vec()),
            (0x07, 5, 3, time),
        ]);
        let (gps, _) = decode_ifd(&data);
        let ts = gps.timestamp.unwrap();
        assert_eq!(ts.to_string(), "2021-02-28 14:05:31");
        assert_eq!(ts.nanosecond, Some(250_000_000));
        assert_eq!(ts.offset, Some(0));
    }

    #[test]
    fn out_of_range_is_kept() {
        let data = ifd(&[
            (0x02, 5, 3, rationals(&[(95, 1), (0, 1), (0, 1)])),
            (0x06, 5, 1, rationals(&[(9500, 1)])),
        ]);
        let (gps, diag) = decode_ifd(&data);
        assert_eq!(gps.latitude, 95.0);
        assert_eq!(gps.altitude, 9500.0);
        assert_eq!(diag.len(), 2);
    }

    proptest! {
        #[test]
        fn sign_law(lat in 0.0f64..90.0, long in 0.0f64..180.0,
                    alt in 0.0f64..9000.0,
                    lat_ref in "[NS]", long_ref in "[EW]",
                    alt_ref in 0u8..4) {
            let acc = GpsAccumulator {
                lat: Some(lat), lat_ref: lat_ref.clone(),
                long: Some(long), long_ref: long_ref.clone(),
                alt, below_sea_level: alt_ref == 1 || alt_ref == 3,
                ..GpsAccumulator::default()
            };
            let mut gps = Gps::default();
            let mut diag = Diagnostics::new();
            acc.finish(&mut gps, &mut diag);
            let s = |neg: bool| if neg { -1.0 } else { 1.0 };
            prop_assert_eq!(gps.latitude, lat * s(lat_ref == "S"));
            prop_assert_eq!(gps.longitude, long * s(long_ref == "W"));
            prop_assert_eq!(gps.altitude,
                            alt * s(alt_ref == 1 || alt_ref == 3));
            prop_assert!(diag.is_empty());
        }
    }
}
