//! Spherical-earth helpers for target placement and relative geometry.
//!
//! Local frames are east (`x`) / north (`y`) metres around a centre point.

use std::f64::consts::PI;

use rand::Rng;
use serde::{Deserialize, Serialize};
use simlink_core::PlatformObservation;

/// Mean earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A geodetic position: degrees and metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt }
    }
}

impl From<&PlatformObservation> for GeoPoint {
    fn from(p: &PlatformObservation) -> Self {
        Self::new(p.lat, p.lon, p.alt)
    }
}

/// Gnomonic projection of `point` onto the tangent plane at `center`.
pub fn to_local_xy(point: &GeoPoint, center: &GeoPoint) -> (f64, f64) {
    let (lat, lon) = (point.lat.to_radians(), point.lon.to_radians());
    let (lat0, lon0) = (center.lat.to_radians(), center.lon.to_radians());
    let dlon = lon - lon0;

    let cos_c = lat.sin() * lat0.sin() + lat.cos() * lat0.cos() * dlon.cos();
    let x = EARTH_RADIUS_M * lat.cos() * dlon.sin() / cos_c;
    let y = EARTH_RADIUS_M * (lat.sin() * lat0.cos() - lat.cos() * lat0.sin() * dlon.cos()) / cos_c;
    (x, y)
}

/// Point reached by travelling `dx` east and `dy` north along a great
/// circle from `center`, raised by `dz`.
pub fn offset(center: &GeoPoint, dx: f64, dy: f64, dz: f64) -> GeoPoint {
    let d = dx.hypot(dy);
    if d == 0.0 {
        return GeoPoint::new(center.lat, center.lon, center.alt + dz);
    }

    let (lat0, lon0) = (center.lat.to_radians(), center.lon.to_radians());
    let azimuth = dx.atan2(dy);
    let angular = d / EARTH_RADIUS_M;

    let lat = (lat0.sin() * angular.cos() + lat0.cos() * angular.sin() * azimuth.cos()).asin();
    let lon = lon0
        + (azimuth.sin() * angular.sin() * lat0.cos()).atan2(angular.cos() - lat0.sin() * lat.sin());

    GeoPoint::new(
        lat.to_degrees(),
        normalize_degrees(lon.to_degrees()),
        center.alt + dz,
    )
}

/// Random `(dx, dy)` on an annulus between `min` and `max` metres.
pub fn random_arc_offset(rng: &mut impl Rng, min: f64, max: f64) -> (f64, f64) {
    let angle = rng.gen_range(0.0..2.0 * PI);
    let distance = if max > min {
        rng.gen_range(min..max)
    } else {
        min
    };
    (distance * angle.cos(), distance * angle.sin())
}

/// Wrap an angle in degrees into `[-180, 180)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Offset `(dx, dy, dz)` in metres from `from` to `to`.
pub fn relative_offset(from: &GeoPoint, to: &GeoPoint) -> (f64, f64, f64) {
    let (dx, dy) = to_local_xy(to, from);
    (dx, dy, to.alt - from.alt)
}

/// Straight-line distance in metres.
pub fn distance(from: &GeoPoint, to: &GeoPoint) -> f64 {
    let (dx, dy, dz) = relative_offset(from, to);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Bearing of `to` relative to `from`'s heading, and elevation angle,
/// both in degrees.
pub fn bearing_elevation(from: &PlatformObservation, to: &PlatformObservation) -> (f64, f64) {
    let (dx, dy, dz) = relative_offset(&from.into(), &to.into());
    let absolute = dx.atan2(dy).to_degrees();
    let bearing = normalize_degrees(absolute - from.heading);
    let elevation = dz.atan2(dx.hypot(dy)).to_degrees();
    (bearing, elevation)
}
