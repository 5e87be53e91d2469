//! WGS84 -> UTM 30N (EPSG:25830) forward projection.
//!
//! Segment lengths must be computed in a metric CRS; the road network ships
//! in EPSG:4326, so polylines are projected here before measuring. UTM huso
//! 30N covers the Madrid area.

const A: f64 = 6378137.0;
const E: f64 = 0.08181919084262149;
const K0: f64 = 0.9996;
const ZONE: f64 = 30.0;

/// Projects a WGS84 `(lat, lon)` in degrees to UTM 30N easting/northing in
/// meters.
pub fn wgs84_to_utm30(lat: f64, lon: f64) -> (f64, f64) {
    let long_origin = ((ZONE - 1.0) * 6.0 - 180.0 + 3.0).to_radians();
    let phi = lat.to_radians();
    let lambda = lon.to_radians();

    let e2 = E * E;
    let ep2 = e2 / (1.0 - e2);

    let n = A / (1.0 - (E * phi.sin()).powi(2)).sqrt();
    let t = phi.tan().powi(2);
    let c = ep2 * phi.cos().powi(2);
    let a_ = (lambda - long_origin) * phi.cos();

    let m = A
        * ((1.0 - e2 / 4.0 - 3.0 * e2.powi(2) / 64.0 - 5.0 * e2.powi(3) / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e2.powi(2) / 32.0 + 45.0 * e2.powi(3) / 1024.0)
                * (2.0 * phi).sin()
            + (15.0 * e2.powi(2) / 256.0 + 45.0 * e2.powi(3) / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e2.powi(3) / 3072.0) * (6.0 * phi).sin());

    let x = K0
        * n
        * (a_
            + (1.0 - t + c) * a_.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a_.powi(5) / 120.0)
        + 500000.0;

    let y = K0
        * (m + n
            * phi.tan()
            * (a_.powi(2) / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a_.powi(4) / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a_.powi(6) / 720.0));

    (x, y)
}

/// Length in meters of a polyline given as WGS84 `(lon, lat)` vertices,
/// measured after projection.
pub fn projected_length_m(part: &[(f64, f64)]) -> f64 {
    part.windows(2)
        .map(|w| {
            let (x1, y1) = wgs84_to_utm30(w[0].1, w[0].0);
            let (x2, y2) = wgs84_to_utm30(w[1].1, w[1].0);
            ((x2 - x1).powi(2) + (y2 - y1).powi(2)).sqrt()
        })
        .sum()
}
