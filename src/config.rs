use std::{path::Path, path::PathBuf, time::Duration};

use crate::bounding_box::BoundingBox;
use crate::error::ConfigError;
use crate::layout::{extension_for_format, PathFormat};
use crate::tile::Tile;
use crate::wms::{GetMapUrl, WmsVersion};

/// Highest zoom level tiles can be requested for.
pub const MAX_ZOOM: u8 = 24;

pub const DEFAULT_FORMAT: &str = "image/png";
pub const DEFAULT_TILE_SIZE: u32 = 256;
pub const DEFAULT_CONCURRENCY: usize = 16;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_OUTPUT_FOLDER: &str = "output";

/// Tile fetching configuration.
///
/// Created through [`ConfigBuilder`], which validates every field, so a
/// `Config` always describes a runnable download.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    bounding_box: BoundingBox,
    zooms: Vec<u8>,
    layer: String,
    version: WmsVersion,
    get_map: GetMapUrl,
    extension: String,
    output_folder: PathBuf,
    layout: PathFormat,
    timeout: Duration,
    concurrency: usize,
    fetch_existing: bool,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Lists all tiles in the contained bounding box at the configured zooms.
    pub fn tiles(&self) -> Vec<Tile> {
        self.bounding_box.tiles(&self.zooms)
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bounding_box
    }

    pub fn zooms(&self) -> &[u8] {
        &self.zooms
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn version(&self) -> WmsVersion {
        self.version
    }

    /// Request builder carrying every query parameter but the tile's bbox.
    pub fn get_map(&self) -> &GetMapUrl {
        &self.get_map
    }

    /// File extension of stored tiles, derived from the image format.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    pub fn layout(&self) -> &PathFormat {
        &self.layout
    }

    /// Where `tile` is stored on disk.
    pub fn tile_path(&self, tile: &Tile) -> anyhow::Result<PathBuf> {
        Ok(self
            .output_folder
            .join(self.layout.tile_path(tile, &self.extension)?))
    }

    /// Timeout for fetching a single tile. Zero disables it.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Maximum number of tiles fetched in parallel.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Whether tiles already on disk are fetched again.
    pub fn fetch_existing(&self) -> bool {
        self.fetch_existing
    }
}

/// Collects download settings and validates them into a [`Config`].
///
/// # Example
/// ```rust
/// # use wms_tile_downloader::{BoundingBox, Config};
/// let config = Config::builder()
///     .url("https://wms.example.com/ows")
///     .layer("roads")
///     .zooms(vec![9, 10])
///     .bounding_box(BoundingBox::new(20.499903, 52.017401, 20.742137, 52.168715))
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.tiles().len(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    bounding_box: Option<BoundingBox>,
    zooms: Vec<u8>,
    url: String,
    layer: String,
    style: String,
    format: String,
    width: u32,
    height: u32,
    version: WmsVersion,
    params: Vec<(String, String)>,
    output_folder: PathBuf,
    layout: String,
    timeout: Duration,
    concurrency: usize,
    fetch_existing: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            bounding_box: None,
            zooms: Vec::new(),
            url: String::new(),
            layer: String::new(),
            style: String::new(),
            format: DEFAULT_FORMAT.to_owned(),
            width: DEFAULT_TILE_SIZE,
            height: DEFAULT_TILE_SIZE,
            version: WmsVersion::default(),
            params: Vec::new(),
            output_folder: PathBuf::from(DEFAULT_OUTPUT_FOLDER),
            layout: PathFormat::DEFAULT.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            concurrency: DEFAULT_CONCURRENCY,
            fetch_existing: false,
        }
    }
}

impl ConfigBuilder {
    pub fn bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    pub fn zooms(mut self, zooms: Vec<u8>) -> Self {
        self.zooms = zooms;
        self
    }

    /// The WMS server endpoint. Defaults to `https` when no scheme is given.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn layer(mut self, layer: impl Into<String>) -> Self {
        self.layer = layer.into();
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// MIME type of the requested images, `image/png` by default.
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    pub fn version(mut self, version: WmsVersion) -> Self {
        self.version = version;
        self
    }

    /// Adds a custom query parameter sent with every request.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn output_folder(mut self, output_folder: impl Into<PathBuf>) -> Self {
        self.output_folder = output_folder.into();
        self
    }

    /// Path format of tiles below the output folder, see [`PathFormat`].
    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn fetch_existing(mut self, fetch_existing: bool) -> Self {
        self.fetch_existing = fetch_existing;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        if self.layer.trim().is_empty() {
            return Err(ConfigError::MissingLayer);
        }
        if self.zooms.is_empty() {
            return Err(ConfigError::MissingZoom);
        }
        if let Some(&zoom) = self.zooms.iter().find(|&&z| z > MAX_ZOOM) {
            return Err(ConfigError::InvalidZoom(zoom));
        }
        let bounding_box = self
            .bounding_box
            .ok_or(ConfigError::MissingBoundingBox)?;
        bounding_box.validate()?;

        if self.width == 0 {
            return Err(ConfigError::Zero("width"));
        }
        if self.height == 0 {
            return Err(ConfigError::Zero("height"));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Zero("concurrency"));
        }

        let mut get_map = GetMapUrl::new(&self.url, self.version)?
            .param("layers", self.layer.as_str())
            .param("styles", self.style.as_str())
            .param("format", self.format.as_str())
            .param("width", self.width.to_string())
            .param("height", self.height.to_string());
        for (key, value) in self.params {
            if key.trim().is_empty() {
                return Err(ConfigError::InvalidParam(format!("{}={}", key, value)));
            }
            get_map = get_map.param(key, value);
        }

        // zooms keep their given order, repeated ones are requested once
        let mut zooms = Vec::with_capacity(self.zooms.len());
        for zoom in self.zooms {
            if !zooms.contains(&zoom) {
                zooms.push(zoom);
            }
        }

        Ok(Config {
            bounding_box,
            zooms,
            layer: self.layer,
            version: self.version,
            get_map,
            extension: extension_for_format(&self.format),
            output_folder: self.output_folder,
            layout: PathFormat::new(self.layout)?,
            timeout: self.timeout,
            concurrency: self.concurrency,
            fetch_existing: self.fetch_existing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ConfigBuilder {
        Config::builder()
            .url("https://wms.service.com")
            .layer("layer:name")
            .zooms(vec![5])
            .bounding_box(BoundingBox::new(20.0, 50.0, 21.0, 51.0))
    }

    #[test]
    fn defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.version(), WmsVersion::V1_3_0);
        assert_eq!(config.extension(), "png");
        assert_eq!(config.concurrency(), 16);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.output_folder(), Path::new("output"));
        assert!(!config.fetch_existing());
        assert_eq!(
            config.get_map().base_url().as_str(),
            "https://wms.service.com/?crs=EPSG%3A3857&format=image%2Fpng&height=256&layers=layer%3Aname&request=GetMap&service=WMS&styles=&version=1.3.0&width=256"
        );
    }

    #[test]
    fn request_options() {
        let config = builder()
            .style("styles:name")
            .format("image/jpeg")
            .width(128)
            .height(64)
            .version(WmsVersion::V1_1_1)
            .param("transparent", "true")
            .build()
            .unwrap();

        assert_eq!(config.extension(), "jpg");
        assert_eq!(
            config.get_map().base_url().as_str(),
            "https://wms.service.com/?format=image%2Fjpeg&height=64&layers=layer%3Aname&request=GetMap&service=WMS&srs=EPSG%3A3857&styles=styles%3Aname&transparent=true&version=1.1.1&width=128"
        );
    }

    #[test]
    fn tile_path() {
        let config = builder().output_folder("/tmp/tiles").build().unwrap();
        assert_eq!(
            config.tile_path(&Tile::new(17, 10, 5)).unwrap(),
            Path::new("/tmp/tiles/5/17/10.png")
        );
    }

    #[test]
    fn required_fields() {
        assert_eq!(builder().url("").build(), Err(ConfigError::MissingUrl));
        assert_eq!(builder().layer(" ").build(), Err(ConfigError::MissingLayer));
        assert_eq!(builder().zooms(vec![]).build(), Err(ConfigError::MissingZoom));

        let no_bbox = Config::builder()
            .url("https://wms.service.com")
            .layer("layer:name")
            .zooms(vec![5])
            .build();
        assert_eq!(no_bbox, Err(ConfigError::MissingBoundingBox));
    }

    #[test]
    fn invalid_values() {
        assert_eq!(
            builder().zooms(vec![3, 25]).build(),
            Err(ConfigError::InvalidZoom(25))
        );
        assert!(matches!(
            builder()
                .bounding_box(BoundingBox::new(0.0, 10.0, 1.0, -10.0))
                .build(),
            Err(ConfigError::InvalidBoundingBox(_))
        ));
        assert_eq!(builder().width(0).build(), Err(ConfigError::Zero("width")));
        assert_eq!(
            builder().concurrency(0).build(),
            Err(ConfigError::Zero("concurrency"))
        );
        assert!(matches!(
            builder().layout("{z}/{y}.png").build(),
            Err(ConfigError::InvalidLayout { .. })
        ));
        assert!(matches!(
            builder().param("", "x").build(),
            Err(ConfigError::InvalidParam(_))
        ));
    }

    #[test]
    fn repeated_zooms_are_fetched_once() {
        let config = builder().zooms(vec![6, 5, 6]).build().unwrap();
        assert_eq!(config.zooms(), &[6, 5]);
    }

    #[test]
    fn antimeridian_box_is_valid() {
        let config = builder()
            .bounding_box(BoundingBox::new(170.0, -10.0, -170.0, 10.0))
            .zooms(vec![3])
            .build()
            .unwrap();
        assert_eq!(config.tiles().len(), 4);
    }
}
