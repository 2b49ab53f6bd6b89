use std::{fmt::Display, str::FromStr};

use wms_tile_downloader::{BoundingBox, WmsVersion, MAX_ZOOM};

pub fn is_numeric_min<T>(min: T) -> impl Fn(&str) -> Result<T, String> + Clone + Send + Sync + 'static
where
    T: FromStr + PartialOrd + Display + Copy + Send + Sync + 'static,
{
    move |v: &str| {
        let val = v.parse::<T>().map_err(|_| "must be numeric".to_owned())?;

        if val < min {
            return Err(format!("must be >= {}", min));
        }

        Ok(val)
    }
}

pub fn is_bbox(v: &str) -> Result<BoundingBox, String> {
    let bbox = v.parse::<BoundingBox>().map_err(|e| e.to_string())?;
    bbox.validate().map_err(|e| e.to_string())?;

    Ok(bbox)
}

pub fn is_zoom_list(v: &str) -> Result<Vec<u8>, String> {
    v.split(',')
        .map(|z| {
            let zoom = z
                .trim()
                .parse::<u8>()
                .map_err(|_| format!("`{}` is not a zoom level", z.trim()))?;

            if zoom > MAX_ZOOM {
                return Err(format!("must be <= {}", MAX_ZOOM));
            }

            Ok(zoom)
        })
        .collect()
}

pub fn is_wms_version(v: &str) -> Result<WmsVersion, String> {
    v.parse::<WmsVersion>().map_err(|e| e.to_string())
}

pub fn is_query_param(v: &str) -> Result<(String, String), String> {
    match v.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err("expected key=value".to_owned()),
    }
}
