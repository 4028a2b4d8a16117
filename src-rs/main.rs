use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{warn, Level};
use tracing_subscriber::EnvFilter;

use map_fill::dialog::ConsoleDialogs;
use map_fill::document::Document;
use map_fill::fetch::HttpFetcher;
use map_fill::params::{DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM, ZOOM_PRESETS};
use map_fill::prefs::{JsonFilePreferences, PreferenceStore, PREF_API_KEY, PREF_STYLES};
use map_fill::request::{build_with_endpoint, STATIC_MAPS_ENDPOINT};
use map_fill::shape::TargetShape;
use map_fill::style::{parse_styles, translate};
use map_fill::workflow::generate_map;
use map_fill::{Dimensions, MapRequestParams, MapType, RunError};

#[derive(Parser, Debug)]
#[command(
    name = "map-fill",
    version,
    about = "Fill selected design shapes with Google Static Maps images"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print supported commands in JSON
    Commands,
    /// Print map types and zoom presets in JSON
    Options,
    /// Fill the selected shapes of a document with map images
    Generate(GenerateArgs),
    /// Print the map request URLs a run would fetch, without fetching
    Url(UrlArgs),
    /// Translate style JSON into Static Maps style parameters
    Styles(StylesArgs),
    /// Print the remembered API key and styles
    Prefs,
}

#[derive(Args, Debug)]
struct FormArgs {
    /// Place or address to center the map on
    #[arg(long, default_value = "")]
    location: String,
    /// Zoom level
    #[arg(long, default_value_t = DEFAULT_ZOOM, value_parser = clap::value_parser!(u8).range(MIN_ZOOM as i64..=MAX_ZOOM as i64))]
    zoom: u8,
    /// Map type
    #[arg(long, value_enum, default_value_t = MapType::Roadmap)]
    map_type: MapType,
    /// Leave out the red location pin
    #[arg(long, action = ArgAction::SetTrue)]
    no_pin: bool,
    /// Style JSON text (default: remembered styles)
    #[arg(long, conflicts_with = "styles_file")]
    styles: Option<String>,
    /// Style JSON file path (or - for stdin)
    #[arg(long)]
    styles_file: Option<String>,
    /// Google Static Maps API key (default: remembered key)
    #[arg(long)]
    api_key: Option<String>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Document JSON path
    document: PathBuf,
    /// Write the updated document here instead of in place
    #[arg(long)]
    out: Option<PathBuf>,
    /// Shape ids to fill (default: shapes flagged as selected)
    #[arg(long = "select", value_delimiter = ',')]
    select: Vec<String>,
    #[command(flatten)]
    form: FormArgs,
    /// Fetch timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_sec: u64,
    /// Print the run summary as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Args, Debug)]
struct UrlArgs {
    /// Document JSON path; requests are sized to its selected shapes
    #[arg(long, conflicts_with_all = ["width", "height"])]
    document: Option<PathBuf>,
    /// Shape ids (with --document)
    #[arg(long = "select", value_delimiter = ',', requires = "document")]
    select: Vec<String>,
    /// Map width in pixels
    #[arg(long, default_value_t = 640)]
    width: u32,
    /// Map height in pixels
    #[arg(long, default_value_t = 640)]
    height: u32,
    #[command(flatten)]
    form: FormArgs,
}

#[derive(Args, Debug)]
struct StylesArgs {
    /// Style JSON file path (or - for stdin)
    input: String,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match cli.command {
        Commands::Commands => print_commands().map(|_| 0),
        Commands::Options => print_options().map(|_| 0),
        Commands::Generate(args) => command_generate(args),
        Commands::Url(args) => command_url(args).map(|_| 0),
        Commands::Styles(args) => command_styles(args).map(|_| 0),
        Commands::Prefs => command_prefs().map(|_| 0),
    }
}

fn setup_logging(log_level: &Option<String>) {
    let log_level = match log_level
        .as_ref()
        .unwrap_or(&"warn".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!("reqwest=off,{}", log_level)))
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn print_commands() -> Result<()> {
    let rows = vec![
        json!({
            "name": "generate",
            "description": "Fill selected document shapes with Static Maps images sized to each shape."
        }),
        json!({
            "name": "url",
            "description": "Print the Static Maps request URLs a run would fetch."
        }),
        json!({
            "name": "styles",
            "description": "Translate map style JSON into style= query parameters."
        }),
        json!({
            "name": "options",
            "description": "List map types and zoom presets."
        }),
        json!({
            "name": "prefs",
            "description": "Show the remembered API key and styles."
        }),
    ];

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "commands": rows }))?
    );
    Ok(())
}

fn print_options() -> Result<()> {
    let map_types: Vec<Value> = MapType::ALL
        .iter()
        .map(|t| json!({ "label": t.label(), "value": t.as_query() }))
        .collect();
    let payload = json!({
        "map_types": map_types,
        "zoom": {
            "min": MIN_ZOOM,
            "max": MAX_ZOOM,
            "default": DEFAULT_ZOOM,
            "presets": ZOOM_PRESETS,
        },
        "endpoint": endpoint(),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn command_generate(args: GenerateArgs) -> Result<i32> {
    let prefs_path = prefs_path();
    let mut prefs = JsonFilePreferences::new(&prefs_path);
    let params = form_params(&args.form, &prefs)?;

    let mut document = Document::load(&args.document)?;
    let mut fetcher = HttpFetcher::new(
        out_root().join("downloads"),
        Duration::from_secs(args.timeout_sec.max(1)),
    )
    .context("failed to create HTTP client")?;
    let mut dialogs = ConsoleDialogs;

    let result = {
        let mut selection = document.selection_mut(&args.select)?;
        if selection.is_empty() {
            warn!("no shapes selected in {}", args.document.display());
        }
        generate_map(
            &endpoint(),
            &params,
            &mut selection,
            &mut prefs,
            &mut fetcher,
            &mut dialogs,
        )
    };

    // Fills applied before a fatal error are kept.
    if !matches!(result, Err(RunError::Validation(_))) {
        let target = args.out.as_deref().unwrap_or(&args.document);
        document.save(target)?;
    }

    match result {
        Ok(summary) => {
            if args.json {
                println!("{}", serde_json::to_string(&summary)?);
            }
            Ok(0)
        }
        // Already reported through the error dialog.
        Err(_) => Ok(1),
    }
}

fn command_url(args: UrlArgs) -> Result<()> {
    let prefs = JsonFilePreferences::new(prefs_path());
    let params = form_params(&args.form, &prefs)?;
    let rules = params.validate()?;
    let fragment = translate(&rules);
    let endpoint = endpoint();

    let sizes: Vec<(String, Option<Dimensions>)> = match &args.document {
        Some(path) => {
            let mut document = Document::load(path)?;
            let selection = document.selection_mut(&args.select)?;
            selection
                .iter()
                .map(|shape| (shape.id.clone(), shape.fill_dimensions().ok()))
                .collect()
        }
        None => {
            let Some(size) = Dimensions::new(args.width, args.height) else {
                bail!("map size must be positive, got {}x{}", args.width, args.height);
            };
            vec![("map".to_string(), Some(size))]
        }
    };

    let rows: Vec<Value> = sizes
        .into_iter()
        .map(|(id, size)| match size {
            Some(size) => json!({
                "id": id,
                "size": size,
                "url": build_with_endpoint(&endpoint, &params, size, &fragment).url(),
            }),
            None => json!({ "id": id, "skipped": "unsupported shape" }),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&json!({ "requests": rows }))?);
    Ok(())
}

fn command_styles(args: StylesArgs) -> Result<()> {
    let raw = read_input(&args.input)?;
    let rules = parse_styles(&raw).context("invalid styles JSON")?;
    println!("{}", translate(&rules));
    Ok(())
}

fn command_prefs() -> Result<()> {
    let prefs = JsonFilePreferences::new(prefs_path());
    let payload = json!({
        "path": abs_path(prefs.path()).display().to_string(),
        PREF_API_KEY: prefs.get(PREF_API_KEY, ""),
        PREF_STYLES: prefs.get(PREF_STYLES, ""),
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// Reads the form the way the panel does on open: fields left empty fall
/// back to the remembered API key and styles.
fn form_params(form: &FormArgs, prefs: &dyn PreferenceStore) -> Result<MapRequestParams> {
    let raw_styles = match (&form.styles, &form.styles_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => read_input(path)?,
        (None, None) => prefs.get(PREF_STYLES, ""),
    };
    let api_key = form
        .api_key
        .clone()
        .unwrap_or_else(|| prefs.get(PREF_API_KEY, ""));

    Ok(MapRequestParams {
        location: form.location.clone(),
        zoom_level: form.zoom,
        map_type: form.map_type,
        include_pin: !form.no_pin,
        raw_styles: (!raw_styles.trim().is_empty()).then_some(raw_styles),
        api_key,
    })
}

fn read_input(path: &str) -> Result<String> {
    if path == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read stdin")?;
        return Ok(raw);
    }
    fs::read_to_string(path).with_context(|| format!("file not found: {path}"))
}

fn endpoint() -> String {
    env::var("MAP_FILL_ENDPOINT")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| STATIC_MAPS_ENDPOINT.to_string())
}

fn out_root() -> PathBuf {
    env::var("MAP_FILL_OUT_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".map-fill"))
}

fn prefs_path() -> PathBuf {
    env::var("MAP_FILL_PREFS")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| out_root().join("preferences.json"))
}

fn abs_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn form(location: &str) -> FormArgs {
        FormArgs {
            location: location.to_string(),
            zoom: DEFAULT_ZOOM,
            map_type: MapType::Terrain,
            no_pin: false,
            styles: None,
            styles_file: None,
            api_key: None,
        }
    }

    #[test]
    fn form_falls_back_to_remembered_values() {
        let dir = tempdir().unwrap();
        let mut prefs = JsonFilePreferences::new(dir.path().join("prefs.json"));
        prefs.set(PREF_API_KEY, "SAVED").unwrap();
        prefs.set(PREF_STYLES, "[]").unwrap();

        let params = form_params(&form("Oslo"), &prefs).unwrap();
        assert_eq!(params.api_key, "SAVED");
        assert_eq!(params.raw_styles.as_deref(), Some("[]"));
        assert!(params.include_pin);
        assert_eq!(params.map_type, MapType::Terrain);
    }

    #[test]
    fn explicit_form_values_win_over_remembered_ones() {
        let dir = tempdir().unwrap();
        let mut prefs = JsonFilePreferences::new(dir.path().join("prefs.json"));
        prefs.set(PREF_API_KEY, "SAVED").unwrap();
        prefs.set(PREF_STYLES, "[]").unwrap();

        let mut args = form("Oslo");
        args.api_key = Some("TYPED".to_string());
        args.styles = Some("  ".to_string());
        let params = form_params(&args, &prefs).unwrap();
        assert_eq!(params.api_key, "TYPED");
        assert_eq!(params.raw_styles, None);
    }

    #[test]
    fn styles_file_is_read() {
        let dir = tempdir().unwrap();
        let styles_path = dir.path().join("styles.json");
        fs::write(&styles_path, r#"[{"stylers": [{"saturation": -100}]}]"#).unwrap();
        let prefs = JsonFilePreferences::new(dir.path().join("prefs.json"));

        let mut args = form("Oslo");
        args.styles_file = Some(styles_path.display().to_string());
        args.api_key = Some("KEY".to_string());
        let params = form_params(&args, &prefs).unwrap();
        assert_eq!(params.validate().unwrap().len(), 1);
    }

    #[test]
    fn cli_parses_generate_arguments() {
        let cli = Cli::try_parse_from([
            "map-fill",
            "generate",
            "doc.json",
            "--location",
            "Paris",
            "--zoom",
            "15",
            "--map-type",
            "hybrid",
            "--no-pin",
            "--select",
            "a,b",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.select, ["a", "b"]);
                assert_eq!(args.form.zoom, 15);
                assert_eq!(args.form.map_type, MapType::Hybrid);
                assert!(args.form.no_pin);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_zoom_outside_range() {
        assert!(Cli::try_parse_from(["map-fill", "url", "--zoom", "21"]).is_err());
    }
}
