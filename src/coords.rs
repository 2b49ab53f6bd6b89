use std::f64::consts::PI;
use std::fmt;

/// Radius of the Web Mercator sphere (the WGS84 semi-major axis) in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// A geographic point in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Projects the point to Spherical Mercator, returning `(x, y)` in meters.
    ///
    /// Latitudes of ±90° have no Mercator representation; they yield an
    /// infinite or NaN `y`.
    pub fn to_mercator(self) -> (f64, f64) {
        lnglat_to_mercator(self)
    }
}

/// Converts a geographic point to Spherical Mercator `(x, y)` meters.
pub fn lnglat_to_mercator(lnglat: LngLat) -> (f64, f64) {
    let lng = lnglat.lng.to_radians();
    let lat = lnglat.lat.to_radians();

    let x = EARTH_RADIUS * lng;
    let y = EARTH_RADIUS * (PI * 0.25 + 0.5 * lat).tan().ln();

    (x, y)
}

/// A bounding box in Spherical Mercator meters.
///
/// Its `Display` form is the `left,bottom,right,top` string WMS servers
/// expect in the `BBOX` parameter, with nine fractional digits.
///
/// # Example
/// ```rust
/// # use wms_tile_downloader::Tile;
/// let bbox = Tile::new(17, 10, 5).mercator_bounds();
/// assert_eq!(
///     bbox.to_string(),
///     "1252344.271424328,6261721.357121640,2504688.542848655,7514065.628545966",
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MercatorBbox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl fmt::Display for MercatorBbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.9},{:.9},{:.9},{:.9}",
            self.left, self.bottom, self.right, self.top
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn origin_projects_to_zero() {
        let (x, y) = LngLat::new(0.0, 0.0).to_mercator();
        assert_eq!(x, 0.0);
        assert_relative_eq!(y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn antimeridian_is_half_circumference() {
        let (x, _) = lnglat_to_mercator(LngLat::new(180.0, 0.0));
        assert_relative_eq!(x, PI * EARTH_RADIUS);

        let (x, _) = lnglat_to_mercator(LngLat::new(-180.0, 0.0));
        assert_relative_eq!(x, -PI * EARTH_RADIUS);
    }

    #[test]
    fn known_point() {
        let (x, y) = LngLat::new(20.499903, 52.017401).to_mercator();
        assert_relative_eq!(x, 2282038.7632715013, max_relative = 1e-12);
        assert_relative_eq!(y, 6803272.390103946, max_relative = 1e-12);
    }

    #[test]
    fn pole_leaves_the_world_extent() {
        let (_, y) = LngLat::new(0.0, 90.0).to_mercator();
        assert!(y.is_nan() || y > PI * EARTH_RADIUS);
    }

    #[test]
    fn bbox_display_uses_nine_decimals() {
        let bbox = MercatorBbox {
            left: 1.0,
            bottom: -2.5,
            right: 3.0000000004,
            top: 0.1234567896,
        };
        assert_eq!(
            bbox.to_string(),
            "1.000000000,-2.500000000,3.000000000,0.123456790"
        );
    }
}
