use async_trait::async_trait;
use bytes::Bytes;
use clap::crate_version;
use reqwest::Url;
use std::{collections::BTreeMap, fmt, str::FromStr, time::Duration};

use crate::error::{ConfigError, FetchError};
use crate::tile::Tile;

/// Spatial reference of every requested tile.
pub const SPATIAL_REF_SYSTEM: &str = "EPSG:3857";

const ZERO_DURATION: Duration = Duration::from_secs(0);

/// Version of the WMS protocol spoken with the server.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WmsVersion {
    V1_0_0,
    V1_1_0,
    V1_1_1,
    #[default]
    V1_3_0,
}

impl WmsVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            WmsVersion::V1_0_0 => "1.0.0",
            WmsVersion::V1_1_0 => "1.1.0",
            WmsVersion::V1_1_1 => "1.1.1",
            WmsVersion::V1_3_0 => "1.3.0",
        }
    }

    /// Query key naming the spatial reference: 1.3.0 renamed `srs` to `crs`.
    fn reference_system_key(&self) -> &'static str {
        match self {
            WmsVersion::V1_3_0 => "crs",
            _ => "srs",
        }
    }
}

impl fmt::Display for WmsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WmsVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.0.0" => Ok(WmsVersion::V1_0_0),
            "1.1.0" => Ok(WmsVersion::V1_1_0),
            "1.1.1" => Ok(WmsVersion::V1_1_1),
            "1.3.0" => Ok(WmsVersion::V1_3_0),
            other => Err(ConfigError::InvalidVersion(other.to_owned())),
        }
    }
}

/// Builds `GetMap` request URLs for individual tiles.
///
/// Query parameters are emitted sorted by key. Later parameters replace
/// earlier ones with the same key, so parameters set through
/// [`GetMapUrl::param`] override the protocol defaults.
#[derive(Clone, PartialEq)]
pub struct GetMapUrl {
    base: Url,
    params: BTreeMap<String, String>,
}

impl GetMapUrl {
    /// Parses the server URL, defaulting to `https` when no scheme is given.
    pub fn new(url: &str, version: WmsVersion) -> Result<Self, ConfigError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ConfigError::MissingUrl);
        }

        let with_scheme = if url.contains("://") {
            url.to_owned()
        } else {
            format!("https://{}", url)
        };
        let mut base = Url::parse(&with_scheme).map_err(|e| ConfigError::InvalidUrl {
            url: url.to_owned(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() || base.host().is_none() {
            return Err(ConfigError::InvalidUrl {
                url: url.to_owned(),
                reason: "url has no host".to_owned(),
            });
        }

        let mut params: BTreeMap<String, String> = base.query_pairs().into_owned().collect();
        base.set_query(None);

        params.insert("service".to_owned(), "WMS".to_owned());
        params.insert("request".to_owned(), "GetMap".to_owned());
        params.insert("version".to_owned(), version.to_string());
        params.insert(
            version.reference_system_key().to_owned(),
            SPATIAL_REF_SYSTEM.to_owned(),
        );

        Ok(Self { base, params })
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// The URL shared by all tiles, without the tile's `bbox`.
    pub fn base_url(&self) -> Url {
        self.with_params(self.params.iter())
    }

    pub fn tile_url(&self, tile: &Tile) -> Url {
        let mut params = self.params.clone();
        params.insert("bbox".to_owned(), tile.mercator_bounds().to_string());

        self.with_params(params.iter())
    }

    fn with_params<'a>(&self, params: impl Iterator<Item = (&'a String, &'a String)>) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut().extend_pairs(params);
        url
    }
}

impl fmt::Debug for GetMapUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetMapUrl")
            .field("base_url", &self.base_url().as_str())
            .finish()
    }
}

/// Where tile imagery comes from.
#[async_trait]
pub trait TileSource: Send + Sync {
    /// Retrieves the body served at `url`.
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError>;
}

/// Fetches tiles over HTTP with an explicitly configured client.
#[derive(Clone, Debug)]
pub struct HttpTileSource {
    client: reqwest::Client,
}

impl HttpTileSource {
    /// Creates a source whose requests time out after `timeout`.
    ///
    /// Pass the zero duration to disable the timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self::with_client(client_builder(timeout).build()?))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn client_builder(timeout: Duration) -> reqwest::ClientBuilder {
    let builder = reqwest::Client::builder()
        .user_agent(format!("wms-tile-downloader_rs_{}", crate_version!()));
    if timeout > ZERO_DURATION {
        builder.timeout(timeout)
    } else {
        builder
    }
}

#[async_trait]
impl TileSource for HttpTileSource {
    async fn fetch(&self, url: &Url) -> Result<Bytes, FetchError> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }
}
