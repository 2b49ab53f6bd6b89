//! Download map tiles from a Web Map Service (WMS) to your disk en-masse.
//!
//! **Use with caution.** Downloading tiles en-masse can hog down a WMS
//! server easily. Keep the concurrency low on servers you don't operate.
//!
//! The crate works out which slippy-map tiles cover a geographic bounding
//! box at a set of zoom levels, requests each tile's Spherical Mercator
//! extent through a WMS `GetMap` request and stores the image as
//! `<output>/<z>/<x>/<y>.<ext>`.
//!
//! # Usage
//!
//! The `wms-tile-downloader` binary features a helpful CLI you can access
//! via `-h` / `--help`.
//!
//! It is also available as a library.
//!
//! # CLI Example
//!
//! ```bash
//! wms-tile-downloader \
//!   --url "https://wms.example.com/ows" \
//!   --layer roads \
//!   --bbox 20.499903,52.017401,20.742137,52.168715 \
//!   --zoom 9,10,11 \
//!   --output ./tiles \
//!   --concurrency 8
//! ```
//!
//! # Library Example
//! ```rust
//! use wms_tile_downloader::{tiles_covering, Tile};
//!
//! // a box crossing the antimeridian
//! let tiles = tiles_covering(170.0, -10.0, -170.0, 10.0, &[3]);
//! assert_eq!(tiles.len(), 4);
//!
//! let bbox = Tile::new(17, 10, 5).mercator_bounds();
//! assert_eq!(
//!     bbox.to_string(),
//!     "1252344.271424328,6261721.357121640,2504688.542848655,7514065.628545966",
//! );
//! ```

mod bounding_box;
mod config;
mod coords;
mod error;
mod fetch;
mod layout;
mod tile;
mod wms;

pub use bounding_box::{tiles_covering, BoundingBox, MERCATOR_LAT_LIMIT};
pub use config::{Config, ConfigBuilder, MAX_ZOOM};
pub use coords::{lnglat_to_mercator, LngLat, MercatorBbox, EARTH_RADIUS};
pub use error::{ConfigError, FetchError};
pub use fetch::{fetch, fetch_with, FetchSummary};
pub use layout::{extension_for_format, write_tile, PathFormat};
pub use tile::Tile;
pub use wms::{GetMapUrl, HttpTileSource, TileSource, WmsVersion};
