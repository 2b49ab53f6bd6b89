use thiserror::Error;

/// Invalid download configuration, reported before any request is made.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("WMS server url is required")]
    MissingUrl,

    #[error("invalid WMS server url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("layer name is required")]
    MissingLayer,

    #[error("at least one zoom level is required")]
    MissingZoom,

    #[error("zoom level {0} is above the supported maximum of {max}", max = crate::config::MAX_ZOOM)]
    InvalidZoom(u8),

    #[error("bounding box is required")]
    MissingBoundingBox,

    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("unsupported WMS version `{0}`")]
    InvalidVersion(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("invalid query parameter `{0}`, expected key=value")]
    InvalidParam(String),

    #[error("invalid output layout `{layout}`: {reason}")]
    InvalidLayout { layout: String, reason: String },
}

/// Failure of a single tile download.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered with status {status}")]
    Status { status: u16 },

    #[error("failed writing tile: {0}")]
    Io(#[from] std::io::Error),
}
