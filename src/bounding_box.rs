use std::str::FromStr;

use crate::error::ConfigError;
use crate::tile::{tiles_per_axis, Tile};

/// Northern and southern limit of the Web Mercator world, in degrees.
pub const MERCATOR_LAT_LIMIT: f64 = 85.051129;

/// A geographic bounding box with west, south, east and north boundaries
/// in degrees.
///
/// A box whose `west` is greater than its `east` crosses the antimeridian.
///
/// # Example
/// ```rust
/// # use wms_tile_downloader::BoundingBox;
/// let warsaw = BoundingBox::new(20.499903, 52.017401, 20.742137, 52.168715);
/// assert_eq!(warsaw.tiles(&[9]).len(), 2);
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        BoundingBox {
            west,
            south,
            east,
            north,
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    /// Checks the box describes a real area on the globe.
    ///
    /// Boxes crossing the antimeridian are accepted, a south boundary north
    /// of the north boundary is not.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let coords = [self.west, self.south, self.east, self.north];
        if coords.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::InvalidBoundingBox(
                "coordinates must be finite numbers".to_owned(),
            ));
        }
        for lng in [self.west, self.east] {
            if !(-180_f64..=180_f64).contains(&lng) {
                return Err(ConfigError::InvalidBoundingBox(format!(
                    "longitude {} is outside [-180, 180]",
                    lng
                )));
            }
        }
        for lat in [self.south, self.north] {
            if !(-90_f64..=90_f64).contains(&lat) {
                return Err(ConfigError::InvalidBoundingBox(format!(
                    "latitude {} is outside [-90, 90]",
                    lat
                )));
            }
        }
        if self.south > self.north {
            return Err(ConfigError::InvalidBoundingBox(format!(
                "south ({}) is north of north ({})",
                self.south, self.north
            )));
        }

        Ok(())
    }

    /// Splits the box at the antimeridian, western part first.
    fn parts(&self) -> Vec<BoundingBox> {
        let (w, s, e, n) = (self.west, self.south, self.east, self.north);

        if self.crosses_antimeridian() {
            vec![
                BoundingBox::new(-180_f64, s, e, n),
                BoundingBox::new(w, s, 180_f64, n),
            ]
        } else {
            vec![*self]
        }
    }

    /// Lists every tile intersecting the box at each of the given zoom levels.
    ///
    /// Tiles are ordered by zoom (in the order given), then by the western
    /// and eastern part of an antimeridian-crossing box, then column by
    /// column. The result holds no duplicates and only tiles inside the
    /// grid of their zoom level. Boxes with no area on the Mercator world,
    /// including ones with `south > north`, yield no tiles.
    pub fn tiles(&self, zooms: &[u8]) -> Vec<Tile> {
        let parts = self.parts();
        let mut tiles = Vec::new();

        for &zoom in zooms {
            // Both parts share their rows, so columns already emitted by the
            // western part are all that can repeat.
            let mut covered_cols = 0;

            for part in &parts {
                let w = part.west.max(-180_f64);
                let s = part.south.max(-MERCATOR_LAT_LIMIT);
                let e = part.east.min(180_f64);
                let n = part.north.min(MERCATOR_LAT_LIMIT);
                if s > n {
                    continue;
                }

                let ll = Tile::containing(w, s, zoom);
                let ur = Tile::containing(e, n, zoom);
                let limit = tiles_per_axis(zoom) as i64;

                // indices saturate at i64::MAX from zoom 63 on
                let cols = ll.x.max(covered_cols)..ur.x.saturating_add(1).min(limit);
                let rows = ur.y.max(0)..ll.y.saturating_add(1).min(limit);
                if cols.is_empty() || rows.is_empty() {
                    continue;
                }

                covered_cols = cols.end;
                tiles.extend(cols.flat_map(|x| {
                    rows.clone().map(move |y| Tile::new(x, y, zoom))
                }));
            }
        }

        tiles
    }
}

/// Lists the tiles covering the box `west, south, east, north` at `zooms`.
///
/// See [`BoundingBox::tiles`].
pub fn tiles_covering(west: f64, south: f64, east: f64, north: f64, zooms: &[u8]) -> Vec<Tile> {
    BoundingBox::new(west, south, east, north).tiles(zooms)
}

impl FromStr for BoundingBox {
    type Err = ConfigError;

    /// Parses `west,south,east,north` (equivalently `left,bottom,right,top`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let coords = s
            .split(',')
            .map(|c| {
                c.trim().parse::<f64>().map_err(|_| {
                    ConfigError::InvalidBoundingBox(format!("`{}` is not a number", c.trim()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        match coords[..] {
            [west, south, east, north] => Ok(BoundingBox::new(west, south, east, north)),
            _ => Err(ConfigError::InvalidBoundingBox(format!(
                "expected 4 comma-separated coordinates, got {}",
                coords.len()
            ))),
        }
    }
}
