use anyhow::{Context, Result};
use maplit::hashmap;
use std::{
    collections::HashMap,
    ffi::OsString,
    fmt,
    path::{Component, Path, PathBuf},
};
use strfmt::strfmt;
use tokio::fs;

use crate::error::ConfigError;
use crate::tile::Tile;

/// Describes where a tile is stored below the output folder.
///
/// The format string may use the specifiers `{z}`, `{x}`, `{y}` and
/// `{ext}`; the default lays tiles out as `z/x/y.ext`.
#[derive(Clone, PartialEq)]
pub struct PathFormat {
    format_str: String,
}

impl PathFormat {
    pub const DEFAULT: &'static str = "{z}/{x}/{y}.{ext}";

    pub fn new(format_str: impl Into<String>) -> Result<Self, ConfigError> {
        let format_str = format_str.into();
        let invalid = |reason: &str| ConfigError::InvalidLayout {
            layout: format_str.clone(),
            reason: reason.to_owned(),
        };

        for specifier in ["{x}", "{y}", "{z}"] {
            if !format_str.contains(specifier) {
                return Err(invalid(&format!("missing {}", specifier)));
            }
        }

        let sample = strfmt(&format_str, &vars(&Tile::new(0, 0, 0), "png"))
            .map_err(|e| invalid(&e.to_string()))?;
        let relative = Path::new(&sample)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !relative {
            return Err(invalid("must be a relative path below the output folder"));
        }

        Ok(Self { format_str })
    }

    /// The tile's path relative to the output folder.
    pub fn tile_path(&self, tile: &Tile, ext: &str) -> Result<PathBuf> {
        strfmt(&self.format_str, &vars(tile, ext))
            .map(PathBuf::from)
            .with_context(|| format!("failed formatting path of tile {}", tile))
    }
}

impl Default for PathFormat {
    fn default() -> Self {
        Self {
            format_str: Self::DEFAULT.to_owned(),
        }
    }
}

impl fmt::Debug for PathFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathFormat")
            .field("format_str", &self.format_str)
            .finish()
    }
}

fn vars(tile: &Tile, ext: &str) -> HashMap<String, String> {
    hashmap! {
        "x".to_owned() => tile.x.to_string(),
        "y".to_owned() => tile.y.to_string(),
        "z".to_owned() => tile.z.to_string(),
        "ext".to_owned() => ext.to_owned(),
    }
}

/// Derives the file extension for tiles of the given MIME type.
///
/// # Example
/// ```rust
/// # use wms_tile_downloader::extension_for_format;
/// assert_eq!(extension_for_format("image/png"), "png");
/// assert_eq!(extension_for_format("image/jpeg"), "jpg");
/// ```
pub fn extension_for_format(format: &str) -> String {
    let mime = format.split(';').next().unwrap_or_default().trim();
    let subtype = mime.rsplit('/').next().unwrap_or(mime);
    let subtype = subtype.split('+').next().unwrap_or(subtype);

    match subtype.to_lowercase().as_str() {
        "jpeg" => "jpg".to_owned(),
        "tiff" => "tif".to_owned(),
        "" => "bin".to_owned(),
        other => other.to_owned(),
    }
}

/// Writes the tile body to `path`, creating missing parent directories.
///
/// The body is written to a `.part` file next to `path` and renamed into
/// place once complete, so `path` only ever holds a whole tile.
pub async fn write_tile(path: &Path, body: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(path);
    let written = match fs::write(&partial, body).await {
        Ok(()) => fs::rename(&partial, path).await,
        Err(e) => Err(e),
    };
    if written.is_err() {
        let _ = fs::remove_file(&partial).await;
    }
    written
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}
