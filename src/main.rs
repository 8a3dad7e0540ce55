use backdrop::batch::{self, BatchEvent};
use backdrop::config::{self, JobConfig};
use backdrop::imaging::{BackgroundMode, Rgb, RustBackend};
use backdrop::output;
use backdrop::presets::{self, Preset, PresetError};
use backdrop::settings::Settings;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "backdrop")]
#[command(about = "Strip, invert and re-back raster images")]
#[command(long_about = "\
Strip, invert and re-back raster images

Every image runs through the same fixed pipeline, each stage optional:

  resize → crop → background removal / inversion → alpha cap → backdrop

and is written as PNG, JPEG, WebP, TIFF or BMP.

Options are layered, later wins:

  settings file   (~/.backdrop-settings.json: default format, naming, output dir)
  --preset NAME   (logo_black, logo_white, product, or one you saved)
  --config FILE   (TOML, see 'backdrop gen-config')
  flags           (--mode, --tolerance, --format, ...)

Output names come from a pattern with {filename}, {date}, {time} and
{counter}; files land in 'converted/' next to each input unless
--output-dir is given. Existing files are never replaced without
--overwrite.")]
#[command(version)]
struct Cli {
    /// Settings file (default: ~/.backdrop-settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log pipeline decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by every command that resolves a job configuration.
#[derive(clap::Args, Clone)]
struct JobArgs {
    /// TOML job configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start from a named preset
    #[arg(long)]
    preset: Option<String>,

    /// Background detection: black, white or custom
    #[arg(long)]
    mode: Option<BackgroundMode>,

    /// 0-255 for black/white, percent (0-100) for custom
    #[arg(long)]
    tolerance: Option<u8>,

    /// Key color for custom mode (#RRGGBB)
    #[arg(long)]
    color: Option<Rgb>,

    /// Keep foreground colors instead of inverting them
    #[arg(long)]
    no_invert: bool,

    /// Resize to WIDTHxHEIGHT before anything else
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    resize: Option<(u32, u32)>,

    /// Crop to LEFT,TOP,RIGHT,BOTTOM pixels after resizing
    #[arg(long, value_name = "L,T,R,B", value_parser = parse_crop)]
    crop: Option<[u32; 4]>,

    /// Cap the opacity of visible pixels (0-255)
    #[arg(long, value_name = "ALPHA")]
    alpha: Option<u8>,

    /// Composite the result over this color (#RRGGBB)
    #[arg(long, value_name = "COLOR")]
    backdrop: Option<Rgb>,

    /// Output format: png, jpg, jpeg, webp, tiff, bmp
    #[arg(short, long)]
    format: Option<String>,

    /// JPEG/WebP quality (1-100)
    #[arg(short, long)]
    quality: Option<u32>,

    /// Output file name pattern
    #[arg(long)]
    naming: Option<String>,

    /// Directory for converted files
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Replace existing output files
    #[arg(long)]
    overwrite: bool,
}

impl JobArgs {
    /// The flags that were given, as a sparse config layer.
    fn overlay(&self) -> toml::Value {
        let mut processing = toml::map::Map::new();
        let mut output = toml::map::Map::new();

        if let Some(mode) = self.mode {
            processing.insert("background_mode".into(), mode.as_str().into());
        }
        if let Some(tolerance) = self.tolerance {
            processing.insert("tolerance".into(), i64::from(tolerance).into());
        }
        if let Some(color) = self.color {
            processing.insert("custom_color".into(), color.to_hex().into());
        }
        if self.no_invert {
            processing.insert("invert_colors".into(), false.into());
        }
        if let Some((width, height)) = self.resize {
            processing.insert("resize".into(), true.into());
            processing.insert("width".into(), i64::from(width).into());
            processing.insert("height".into(), i64::from(height).into());
        }
        if let Some([left, top, right, bottom]) = self.crop {
            processing.insert("crop".into(), true.into());
            processing.insert("crop_left".into(), i64::from(left).into());
            processing.insert("crop_top".into(), i64::from(top).into());
            processing.insert("crop_right".into(), i64::from(right).into());
            processing.insert("crop_bottom".into(), i64::from(bottom).into());
        }
        if let Some(alpha) = self.alpha {
            processing.insert("adjust_alpha".into(), true.into());
            processing.insert("alpha_value".into(), i64::from(alpha).into());
        }
        if let Some(color) = self.backdrop {
            processing.insert("replace_background".into(), true.into());
            processing.insert("replacement_color".into(), color.to_hex().into());
        }

        if let Some(format) = &self.format {
            output.insert("format".into(), format.clone().into());
        }
        if let Some(quality) = self.quality {
            output.insert("quality".into(), i64::from(quality).into());
        }
        if let Some(naming) = &self.naming {
            output.insert("naming_pattern".into(), naming.clone().into());
        }
        if let Some(dir) = &self.output_dir {
            output.insert(
                "directory".into(),
                dir.to_string_lossy().into_owned().into(),
            );
        }
        if self.overwrite {
            output.insert("overwrite".into(), true.into());
        }

        let mut table = toml::map::Map::new();
        table.insert("processing".into(), toml::Value::Table(processing));
        table.insert("output".into(), toml::Value::Table(output));
        toml::Value::Table(table)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Convert a single image
    Convert {
        input: PathBuf,
        /// Exact output path (extension follows the format)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        job: JobArgs,
    },
    /// Convert files and folders in parallel
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        /// Descend into subfolders
        #[arg(short, long)]
        recursive: bool,
        /// Maximum parallel workers (default: all cores)
        #[arg(short, long)]
        jobs: Option<usize>,
        #[command(flatten)]
        job: JobArgs,
    },
    /// List, inspect, save and delete presets
    #[command(subcommand)]
    Presets(PresetCommand),
    /// Show or clear recently converted files and folders
    Recent {
        #[arg(long)]
        clear: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum PresetCommand {
    /// List built-in and saved presets
    List,
    /// Print a preset as TOML
    Show { name: String },
    /// Save the effective options under a name
    Save {
        name: String,
        #[command(flatten)]
        job: JobArgs,
    },
    /// Delete a saved preset
    Delete { name: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings_path = cli.settings.clone().unwrap_or_else(Settings::default_path);
    let mut settings = load_settings(&settings_path);

    match cli.command {
        Command::Convert {
            input,
            output: explicit,
            job,
        } => {
            let config = resolve_job(&job, &settings, None)?;
            let destination = match explicit {
                Some(path) => path,
                None => {
                    let jobs = batch::plan(
                        std::slice::from_ref(&input),
                        &config.output.naming_rule(),
                        chrono::Local::now().naive_local(),
                    );
                    jobs.into_iter()
                        .next()
                        .map(|j| j.destination)
                        .ok_or("no output path planned")?
                }
            };
            let written = batch::convert_file(
                &RustBackend::new(),
                &input,
                &destination,
                &config.processing,
                &config.output.format,
                &config.output.save_parameters(),
            )?;
            output::print_convert_result(&input, &written);

            settings.add_recent_file(&input);
            remember_output_dir(&mut settings, &job);
            store_settings(&settings, &settings_path);
        }
        Command::Batch {
            inputs,
            recursive,
            jobs,
            job,
        } => {
            let config = resolve_job(&job, &settings, Some((recursive, jobs)))?;
            init_thread_pool(&config.batch);

            let (tx, rx) = std::sync::mpsc::channel::<BatchEvent>();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let report = batch::convert_paths(
                &RustBackend::new(),
                &inputs,
                &config,
                chrono::Local::now().naive_local(),
                Some(tx),
            )?;
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            for input in &inputs {
                if input.is_dir() {
                    settings.add_recent_folder(input);
                } else {
                    settings.add_recent_file(input);
                }
            }
            remember_output_dir(&mut settings, &job);
            store_settings(&settings, &settings_path);

            if report.failed > 0 {
                output::print_batch_summary(&report);
                return Err(format!(
                    "{} of {} images failed",
                    report.failed,
                    report.outcomes.len()
                )
                .into());
            }
        }
        Command::Presets(PresetCommand::List) => {
            output::print_presets(&settings);
        }
        Command::Presets(PresetCommand::Show { name }) => {
            let preset = presets::resolve(&name, &settings)?;
            print!("{}", toml::to_string_pretty(&preset)?);
        }
        Command::Presets(PresetCommand::Save { name, job }) => {
            let config = resolve_job(&job, &settings, None)?;
            settings.save_preset(&name, Preset::from_config(&config));
            settings.save(&settings_path)?;
            println!("Saved preset '{}'", name);
        }
        Command::Presets(PresetCommand::Delete { name }) => {
            if !settings.remove_preset(&name) {
                if presets::built_in(&name).is_some() {
                    return Err(PresetError::BuiltIn(name).into());
                }
                return Err(PresetError::NotFound(name).into());
            }
            settings.save(&settings_path)?;
            println!("Deleted preset '{}'", name);
        }
        Command::Recent { clear } => {
            if clear {
                settings.clear_recent();
                settings.save(&settings_path)?;
            }
            output::print_recent(&settings);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Layer settings, preset, config file, batch flags and job flags.
fn resolve_job(
    job: &JobArgs,
    settings: &Settings,
    batch_flags: Option<(bool, Option<usize>)>,
) -> Result<JobConfig, Box<dyn std::error::Error>> {
    let mut layers = vec![settings.output_overlay()];
    if let Some(name) = &job.preset {
        layers.push(presets::resolve(name, settings)?.to_overlay());
    }
    if let Some(path) = &job.config {
        layers.push(config::load_raw_config(path)?);
    }
    if let Some((recursive, jobs)) = batch_flags {
        let mut table = toml::map::Map::new();
        if recursive {
            table.insert("recursive".into(), true.into());
        }
        if let Some(n) = jobs {
            table.insert("max_processes".into(), i64::try_from(n)?.into());
        }
        let mut root = toml::map::Map::new();
        root.insert("batch".into(), toml::Value::Table(table));
        layers.push(toml::Value::Table(root));
    }
    layers.push(job.overlay());

    let config = config::resolve_layers(layers)?;
    debug!(?config, "resolved job configuration");
    Ok(config)
}

/// Initialize the rayon thread pool based on batch config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(batch: &config::BatchConfig) {
    let threads = config::effective_threads(batch);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

/// Install a stderr subscriber when `--verbose` is set or `RUST_LOG` is present.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("backdrop=debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => return,
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load settings, falling back to defaults when the file cannot be read.
fn load_settings(path: &Path) -> Settings {
    Settings::load(path).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
        Settings::default()
    })
}

/// Save settings after a conversion. Failure only costs the recent lists.
fn store_settings(settings: &Settings, path: &Path) {
    if let Err(e) = settings.save(path) {
        warn!(path = %path.display(), error = %e, "could not save settings");
    }
}

fn remember_output_dir(settings: &mut Settings, job: &JobArgs) {
    if let Some(dir) = &job.output_dir {
        settings.last_output_dir = Some(dir.clone());
    }
}

fn parse_size(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid dimension '{v}'"))
    };
    Ok((parse(w)?, parse(h)?))
}

fn parse_crop(s: &str) -> Result<[u32; 4], String> {
    let values = s
        .split(',')
        .map(|v| {
            v.trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid crop value '{v}'"))
        })
        .collect::<Result<Vec<u32>, String>>()?;
    <[u32; 4]>::try_from(values).map_err(|_| format!("expected LEFT,TOP,RIGHT,BOTTOM, got '{s}'"))
}
