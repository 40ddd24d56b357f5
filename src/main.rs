use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use renameimg::{
    Config,
    color::HexColor,
    font::WatermarkFont,
    layout::{Point, Rotation},
    persistence::SaveError,
    reveal,
    session::{Navigation, Session, scan_folder},
    startup_checks,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Batch watermark and rename photos", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Global options that apply to all commands
    #[arg(short, long, default_value = "renameimg.toml", global = true)]
    config: PathBuf,

    /// Overrides `app.log_level` from the config file
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the images a folder would load, in order
    List { folder: PathBuf },

    /// Watermark every image in a folder, saving each under the watermark text
    Stamp {
        folder: PathBuf,

        /// Watermark text, also used as the output name
        #[arg(short, long)]
        text: String,

        /// Output name to use instead of the text
        #[arg(short, long)]
        name: Option<String>,

        /// Index of the first image to process
        #[arg(long)]
        start: Option<usize>,

        /// Stop after this many images
        #[arg(long)]
        count: Option<usize>,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Watermark and rename a single image
    Save {
        file: PathBuf,

        /// New file name without extension
        #[arg(short, long)]
        name: String,

        /// Watermark text; leave empty to only rename
        #[arg(short, long, default_value = "")]
        text: String,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Show a file in the system file manager
    Reveal { file: PathBuf },
}

#[derive(Args, Debug, Clone)]
struct StyleArgs {
    /// Font size in pixels (10-800)
    #[arg(long)]
    size: Option<u32>,

    /// Rotation in degrees: 0, 45, 90, 135, 180, 225, 270 or 315
    #[arg(long)]
    rotation: Option<Rotation>,

    /// Text color as #rrggbb or #rrggbbaa
    #[arg(long)]
    color: Option<HexColor>,

    /// Place the text freely instead of centering it on the bottom edge
    #[arg(long)]
    free: bool,

    /// Top-left corner of the text as fractions of the image size, e.g. 0.1,0.8
    #[arg(long, value_parser = parse_position, requires = "free")]
    position: Option<(f32, f32)>,
}

fn parse_position(s: &str) -> Result<(f32, f32), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let parse = |v: &str| v.trim().parse::<f32>().map_err(|e| e.to_string());
    Ok((parse(x)?, parse(y)?))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let config = if config_found {
        let config_content = std::fs::read_to_string(&cli.config)?;
        toml_edit::de::from_str::<Config>(&config_content)?
    } else {
        Config::default()
    };

    // Set up logging before anything touches the disk
    let log_level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.app.log_level.clone());
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if config_found {
        info!("Configuration loaded from: {:?}", cli.config);
    } else {
        info!("Config file not found at {:?}, using defaults", cli.config);
    }

    match cli.command {
        Commands::List { folder } => list(&folder),
        Commands::Stamp {
            folder,
            text,
            name,
            start,
            count,
            style,
        } => {
            check_startup(&config, &folder)?;
            stamp(&config, &folder, &text, name.as_deref(), start, count, &style)
        }
        Commands::Save {
            file,
            name,
            text,
            style,
        } => {
            check_startup(&config, parent_folder(&file))?;
            save_one(&config, &file, &name, &text, &style)
        }
        Commands::Reveal { file } => {
            if let Err(e) = reveal::reveal(&file) {
                warn!("{}", e);
                eprintln!("Warning: {}", e);
            }
            Ok(())
        }
    }
}

fn check_startup(config: &Config, folder: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match startup_checks::perform_startup_checks(config, Some(folder), true) {
        Ok(()) => Ok(()),
        Err(errors) => {
            for error in &errors {
                tracing::error!("Startup check failed: {}", error);
            }
            if errors.iter().any(|e| e.is_critical()) {
                tracing::error!("Critical startup check failed, exiting");
                Err("Critical startup check failed".into())
            } else {
                warn!("Non-critical startup checks failed, continuing");
                Ok(())
            }
        }
    }
}

/// Folder holding `file`; a bare file name lives in the working directory.
fn parent_folder(file: &Path) -> &Path {
    file.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
}

fn list(folder: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let images = scan_folder(folder)?;
    if images.is_empty() {
        println!("No images in {}", folder.display());
    }
    for (index, path) in images.iter().enumerate() {
        println!("{:>4}  {}", index, path.display());
    }
    Ok(())
}

fn open_session(
    config: &Config,
    style: &StyleArgs,
) -> Result<Session<WatermarkFont>, Box<dyn std::error::Error>> {
    let font = WatermarkFont::load(&config.watermark.font_path)?;

    let mut watermark = config.watermark.clone();
    if let Some(size) = style.size {
        watermark.font_size = size;
    }
    if let Some(rotation) = style.rotation {
        watermark.rotation = rotation;
    }
    if let Some(color) = style.color {
        watermark.color = color;
    }
    if style.free {
        watermark.lock_bottom = false;
    }

    Ok(Session::new(font, &watermark, &config.output))
}

/// Put the watermark on the current image, as a user would before saving.
fn prepare_current(
    session: &mut Session<WatermarkFont>,
    text: &str,
    name: Option<&str>,
    style: &StyleArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    session.set_text(text)?;
    if let Some(name) = name {
        session.set_output_stem(name);
    }
    if let (Some((x, y)), Some(canvas)) = (style.position, session.canvas()) {
        session.drag_to(Point::new(canvas.width * x, canvas.height * y));
    }
    Ok(())
}

fn report(outcome: &renameimg::persistence::SaveOutcome) {
    println!("Saved {}", outcome.destination.display());
    match &outcome.backup {
        Some(backup) => println!("  backup: {}", backup.display()),
        None => println!("  backup: failed (see log)"),
    }
}

fn stamp(
    config: &Config,
    folder: &Path,
    text: &str,
    name: Option<&str>,
    start: Option<usize>,
    count: Option<usize>,
    style: &StyleArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(config, style)?;
    let total = session.load_folder(folder)?;
    info!("Stamping up to {} images in {:?}", total, folder);

    if let Some(start) = start {
        session.select(start)?;
    }

    let mut processed = 0;
    loop {
        if count.is_some_and(|limit| processed >= limit) {
            break;
        }

        prepare_current(&mut session, text, name, style)?;
        let navigation = match session.save_and_next() {
            Ok((outcome, navigation)) => {
                report(&outcome);
                processed += 1;
                navigation
            }
            Err(SaveError::NoImage) => {
                warn!("Skipping {:?}: could not be decoded", session.current_path());
                session.next()
            }
            Err(e) => return Err(e.into()),
        };

        if !matches!(navigation, Navigation::Moved(_)) {
            break;
        }
    }

    println!("Processed {} of {} images", processed, total);
    Ok(())
}

fn save_one(
    config: &Config,
    file: &Path,
    name: &str,
    text: &str,
    style: &StyleArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let folder = parent_folder(file);
    let mut session = open_session(config, style)?;
    session.load_folder(folder)?;

    let index = session
        .images()
        .iter()
        .position(|p| p.file_name() == file.file_name())
        .ok_or_else(|| format!("{} is not a supported image", file.display()))?;
    session.select(index)?;

    prepare_current(&mut session, text, Some(name), style)?;
    let (outcome, _) = session.save_and_next()?;
    report(&outcome);
    Ok(())
}
