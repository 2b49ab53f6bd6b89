use std::{f64::consts::PI, fmt};

use crate::coords::{LngLat, MercatorBbox};

/// A slippy-map tile with x, y and z-coordinate.
/// ref: https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames
///
/// Rows grow southward. A tile is valid when `0 <= x, y < 2^z`; tiles
/// produced by [`Tile::containing`] are not clamped and may lie outside
/// that range for points off the Mercator world.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Tile {
    pub x: i64,
    pub y: i64,
    pub z: u8,
}

/// Number of tiles along one axis at zoom `z`, as a float.
pub(crate) fn tiles_per_axis(z: u8) -> f64 {
    2_f64.powi(i32::from(z))
}

impl Tile {
    pub fn new(x: i64, y: i64, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Returns the tile containing the point at `lng`/`lat` (degrees).
    ///
    /// Longitudes are not wrapped. `lat` must lie strictly inside
    /// (-90, 90); at the poles the row is computed from an infinite or
    /// NaN value and saturates.
    ///
    /// # Example
    /// ```rust
    /// # use wms_tile_downloader::Tile;
    /// assert_eq!(Tile::containing(20.499903, 52.017401, 11), Tile::new(1140, 676, 11));
    /// ```
    pub fn containing(lng: f64, lat: f64, zoom: u8) -> Self {
        let lat_rad = lat.to_radians();

        // scale factor
        let n = tiles_per_axis(zoom);

        let x = (lng + 180_f64) / 360_f64 * n;
        let y = (1_f64 - (lat_rad.tan() + 1_f64 / lat_rad.cos()).ln() / PI) / 2_f64 * n;

        Self::new(x.floor() as i64, y.floor() as i64, zoom)
    }

    /// The geographic coordinate of the tile's north-west corner.
    pub fn upper_left(&self) -> LngLat {
        let n = tiles_per_axis(self.z);

        let lng = self.x as f64 / n * 360_f64 - 180_f64;
        let lat_rad = (PI * (1_f64 - 2_f64 * self.y as f64 / n)).sinh().atan();

        LngLat::new(lng, lat_rad.to_degrees())
    }

    /// The tile's extent in Spherical Mercator meters, as sent in the
    /// `BBOX` of a WMS `GetMap` request.
    pub fn mercator_bounds(&self) -> MercatorBbox {
        let (left, top) = self.upper_left().to_mercator();
        let lower_right = Tile::new(self.x.saturating_add(1), self.y.saturating_add(1), self.z);
        let (right, bottom) = lower_right.upper_left().to_mercator();

        MercatorBbox {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Whether the tile lies inside the `2^z x 2^z` grid of its zoom level.
    pub fn is_valid(&self) -> bool {
        let n = tiles_per_axis(self.z);
        (0..n as i64).contains(&self.x) && (0..n as i64).contains(&self.y)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    const NUDGE: f64 = 1e-9;

    #[test]
    fn tile_index() {
        let tile = Tile::containing(20.499903, 52.017401, 11);
        assert_eq!(tile, Tile::new(1140, 676, 11));
    }

    #[test]
    fn tile_index_high_zoom() {
        let tile = Tile::containing(6.0402, 50.7929, 18);
        assert_eq!((tile.x, tile.y), (135470, 87999));
    }

    #[test]
    fn world_tile() {
        assert_eq!(Tile::containing(0.0, 0.0, 0), Tile::new(0, 0, 0));
        assert_eq!(Tile::containing(-179.9, 85.0, 0), Tile::new(0, 0, 0));
        assert_eq!(Tile::containing(179.9, -85.0, 0), Tile::new(0, 0, 0));
    }

    #[test]
    fn containing_does_not_clamp() {
        assert_eq!(Tile::containing(180.0, 0.0, 1).x, 2);
        assert_eq!(Tile::containing(-190.0, 0.0, 1).x, -1);
        assert_eq!(Tile::containing(0.0, 85.051129, 20).y, -1);
        assert_eq!(Tile::containing(0.0, -85.051129, 20).y, 1 << 20);
    }

    #[test]
    fn upper_left_of_world() {
        let ul = Tile::new(0, 0, 0).upper_left();
        assert_eq!(ul.lng, -180.0);
        assert_relative_eq!(ul.lat, 85.0511287798066, epsilon = 1e-9);
    }

    #[test]
    fn upper_left_known() {
        let ul = Tile::new(1140, 676, 11).upper_left();
        assert_relative_eq!(ul.lng, 20.390625, epsilon = 1e-12);
        assert!(ul.lat > 52.017401);
    }

    #[test]
    fn mercator_bounds_fixture() {
        let bbox = Tile::new(17, 10, 5).mercator_bounds();
        assert_eq!(
            bbox.to_string(),
            "1252344.271424328,6261721.357121640,2504688.542848655,7514065.628545966"
        );
    }

    #[test]
    fn mercator_bounds_of_world() {
        let bbox = Tile::new(0, 0, 0).mercator_bounds();
        let half = PI * crate::coords::EARTH_RADIUS;
        assert_relative_eq!(bbox.left, -half, max_relative = 1e-12);
        assert_relative_eq!(bbox.right, half, max_relative = 1e-12);
        assert_relative_eq!(bbox.top, half, max_relative = 1e-12);
        assert_relative_eq!(bbox.bottom, -half, max_relative = 1e-12);
    }

    #[test]
    fn mercator_bounds_at_the_index_limit() {
        let bounds = Tile::new(i64::MAX, i64::MAX, 63).mercator_bounds();
        assert!(bounds.left.is_finite() && bounds.right.is_finite());
        assert!(bounds.bottom.is_finite() && bounds.top.is_finite());
    }

    #[test]
    fn validity() {
        assert!(Tile::new(0, 0, 0).is_valid());
        assert!(Tile::new(3, 3, 2).is_valid());
        assert!(!Tile::new(4, 0, 2).is_valid());
        assert!(!Tile::new(0, -1, 2).is_valid());
    }

    #[test]
    fn display() {
        assert_eq!(Tile::new(17, 10, 5).to_string(), "5/17/10");
    }

    #[test]
    fn corner_round_trip_low_zooms() {
        for z in 0..=8u8 {
            let n = 1_i64 << z;
            for x in 0..n {
                for y in 0..n {
                    let tile = Tile::new(x, y, z);
                    let ul = tile.upper_left();
                    assert_eq!(
                        Tile::containing(ul.lng + NUDGE, ul.lat - NUDGE, z),
                        tile
                    );
                }
            }
        }
    }

    proptest! {
        #[test]
        fn corner_round_trip(z in 0u8..=24, fx in 0f64..1.0, fy in 0f64..1.0) {
            let n = 1_i64 << z;
            let tile = Tile::new(
                ((fx * n as f64) as i64).min(n - 1),
                ((fy * n as f64) as i64).min(n - 1),
                z,
            );
            let ul = tile.upper_left();
            prop_assert_eq!(Tile::containing(ul.lng + NUDGE, ul.lat - NUDGE, z), tile);
        }

        #[test]
        fn points_in_the_world_give_valid_tiles(
            lng in -180f64..180.0,
            lat in -85.05f64..85.05,
            z in 0u8..=24,
        ) {
            prop_assert!(Tile::containing(lng, lat, z).is_valid());
        }
    }
}
