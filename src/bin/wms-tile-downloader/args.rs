use clap::{command, Arg, ArgAction, ArgMatches};
use std::{path::PathBuf, time::Duration};

use crate::validators::*;
use wms_tile_downloader::{BoundingBox, Config, ConfigError, PathFormat, WmsVersion};

const URL_ARG: &str = "url";
const LAYER_ARG: &str = "layer";
const STYLE_ARG: &str = "style";
const BBOX_ARG: &str = "bbox";
const ZOOM_ARG: &str = "zoom";
const FORMAT_ARG: &str = "format";
const WIDTH_ARG: &str = "width";
const HEIGHT_ARG: &str = "height";
const VERSION_ARG: &str = "wms_version";
const PARAM_ARG: &str = "param";
const OUTPUT_DIR_ARG: &str = "output_dir";
const LAYOUT_ARG: &str = "layout";
const TIMEOUT_ARG: &str = "timeout";
const PARALLEL_FETCHES_ARG: &str = "num_parallel";
const FETCH_EXISTING_ARG: &str = "should_fetch_existing";
const DRY_RUN_ARG: &str = "dry_run";
const LOGLEVEL_ARG: &str = "loglevel";

pub struct Args {
    pub url: String,
    pub layer: String,
    pub style: String,
    pub bounding_box: BoundingBox,
    pub zooms: Vec<u8>,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub version: WmsVersion,
    pub params: Vec<(String, String)>,
    pub output_dir: PathBuf,
    pub layout: String,
    pub timeout: Duration,
    pub parallel_fetches: usize,
    pub fetch_existing: bool,
    pub dry_run: bool,
    pub loglevel: Option<String>,
}

impl Args {
    pub fn parse() -> Self {
        Self::from_matches(&get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        // every argument below either is required or has a default value
        let string = |id: &str| matches.get_one::<String>(id).cloned().unwrap_or_default();

        Self {
            url: string(URL_ARG),
            layer: string(LAYER_ARG),
            style: string(STYLE_ARG),
            bounding_box: *matches
                .get_one::<BoundingBox>(BBOX_ARG)
                .expect("bbox is required"),
            zooms: matches
                .get_one::<Vec<u8>>(ZOOM_ARG)
                .cloned()
                .unwrap_or_default(),
            format: string(FORMAT_ARG),
            width: *matches
                .get_one::<u32>(WIDTH_ARG)
                .expect("width has a default"),
            height: *matches
                .get_one::<u32>(HEIGHT_ARG)
                .expect("height has a default"),
            version: *matches
                .get_one::<WmsVersion>(VERSION_ARG)
                .expect("version has a default"),
            params: matches
                .get_many::<(String, String)>(PARAM_ARG)
                .map(|params| params.cloned().collect())
                .unwrap_or_default(),
            output_dir: matches
                .get_one::<PathBuf>(OUTPUT_DIR_ARG)
                .cloned()
                .expect("output has a default"),
            layout: string(LAYOUT_ARG),
            timeout: Duration::from_millis(
                *matches
                    .get_one::<u64>(TIMEOUT_ARG)
                    .expect("timeout has a default"),
            ),
            parallel_fetches: *matches
                .get_one::<usize>(PARALLEL_FETCHES_ARG)
                .expect("concurrency has a default"),
            fetch_existing: matches.get_flag(FETCH_EXISTING_ARG),
            dry_run: matches.get_flag(DRY_RUN_ARG),
            loglevel: matches.get_one::<String>(LOGLEVEL_ARG).cloned(),
        }
    }

    pub fn config(&self) -> Result<Config, ConfigError> {
        let mut builder = Config::builder()
            .url(self.url.as_str())
            .layer(self.layer.as_str())
            .style(self.style.as_str())
            .bounding_box(self.bounding_box)
            .zooms(self.zooms.clone())
            .format(self.format.as_str())
            .width(self.width)
            .height(self.height)
            .version(self.version)
            .output_folder(self.output_dir.as_path())
            .layout(self.layout.as_str())
            .timeout(self.timeout)
            .concurrency(self.parallel_fetches)
            .fetch_existing(self.fetch_existing);

        for (key, value) in &self.params {
            builder = builder.param(key.as_str(), value.as_str());
        }

        builder.build()
    }
}

fn command() -> clap::Command {
    command!()
        .disable_version_flag(true)
        .arg(
            Arg::new(URL_ARG)
                .help("The WMS server URL. Defaults to https when no scheme is given.")
                .required(true)
                .short('u')
                .long("url"),
        )
        .arg(
            Arg::new(LAYER_ARG)
                .help("The name of the layer to fetch")
                .required(true)
                .short('l')
                .long("layer"),
        )
        .arg(
            Arg::new(STYLE_ARG)
                .help("The style of the layer (the server's default style if omitted)")
                .short('s')
                .long("style"),
        )
        .arg(
            Arg::new(BBOX_ARG)
                .help("Bounding box in degrees as west,south,east,north. West may exceed east to cross the antimeridian.")
                .required(true)
                .value_parser(is_bbox)
                .allow_hyphen_values(true)
                .short('b')
                .long("bbox"),
        )
        .arg(
            Arg::new(ZOOM_ARG)
                .help("Comma-separated list of zoom levels to fetch")
                .required(true)
                .value_parser(is_zoom_list)
                .short('z')
                .long("zoom"),
        )
        .arg(
            Arg::new(FORMAT_ARG)
                .help("The image format to request. Also determines the file extension.")
                .default_value("image/png")
                .long("format"),
        )
        .arg(
            Arg::new(WIDTH_ARG)
                .help("Tile width in pixels")
                .value_parser(is_numeric_min(1u32))
                .default_value("256")
                .long("width"),
        )
        .arg(
            Arg::new(HEIGHT_ARG)
                .help("Tile height in pixels")
                .value_parser(is_numeric_min(1u32))
                .default_value("256")
                .long("height"),
        )
        .arg(
            Arg::new(VERSION_ARG)
                .help("The WMS version spoken with the server (1.0.0, 1.1.0, 1.1.1 or 1.3.0)")
                .value_parser(is_wms_version)
                .default_value("1.3.0")
                .long("version"),
        )
        .arg(
            Arg::new(PARAM_ARG)
                .help("Custom query parameter as key=value, sent with every request. May be repeated.")
                .value_parser(is_query_param)
                .action(ArgAction::Append)
                .short('p')
                .long("param"),
        )
        .arg(
            Arg::new(PARALLEL_FETCHES_ARG)
                .help("The amount of tiles fetched in parallel.")
                .value_parser(is_numeric_min(1usize))
                .default_value("16")
                .short('c')
                .long("concurrency"),
        )
        .arg(
            Arg::new(TIMEOUT_ARG)
                .help("The timeout (in milliseconds) for fetching a single tile. Pass 0 for no timeout.")
                .value_parser(is_numeric_min(0u64))
                .default_value("10000")
                .short('t')
                .long("timeout"),
        )
        .arg(
            Arg::new(OUTPUT_DIR_ARG)
                .help("The folder to output the tiles to")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("output")
                .short('o')
                .long("output"),
        )
        .arg(
            Arg::new(LAYOUT_ARG)
                .help("How tiles are laid out below the output folder, using the format specifiers `{z}`, `{x}`, `{y}` and `{ext}`.")
                .default_value(PathFormat::DEFAULT)
                .long("layout"),
        )
        .arg(
            Arg::new(FETCH_EXISTING_ARG)
                .help("Fetch tiles that we've already downloaded (this usually isn't required)")
                .action(ArgAction::SetTrue)
                .long("fetch-existing"),
        )
        .arg(
            Arg::new(DRY_RUN_ARG)
                .help("Don't actually fetch anything, just determine how many tiles would be fetched.")
                .action(ArgAction::SetTrue)
                .long("dry-run"),
        )
        .arg(
            Arg::new(LOGLEVEL_ARG)
                .help("Log level, overrides RUST_LOG")
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .long("loglevel"),
        )
}

fn get_matches() -> ArgMatches {
    command().get_matches()
}
