use clap::Parser;
use mdpub::config::{self, BuildConfig, FileConfig};
use mdpub::{output, publish, template};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mdpub")]
#[command(about = "Publish interlinked markdown documents as HTML")]
#[command(long_about = "\
Publish interlinked markdown documents as HTML

Starting from the root documents, every referenced .md file is discovered,
rendered, sanitized and wrapped in the page template. Links between documents
are rewritten to the published names:

  README.md           → index.html
  docs/User_Guide.md  → docs/user-guide.html
  NOTES.md            → notes.html

A page is only written when its content changed, so repeated runs on
unchanged input leave the output tree untouched.

With --destdir all pages are flattened into one directory (basename only) and
--assetdir is mirrored beneath it. Hidden files are never copied.

Settings may also come from a TOML file given with --config; flags win.
Run 'mdpub --gen-template' to print a starting template.")]
#[command(version)]
struct Cli {
    /// Root markdown documents
    #[arg(required_unless_present = "gen_template")]
    roots: Vec<PathBuf>,

    /// Write all pages flattened into this directory
    #[arg(long, value_name = "DIR")]
    destdir: Option<PathBuf>,

    /// Mirror every non-hidden file in this directory under the destination
    #[arg(long, value_name = "DIR")]
    assetdir: Option<PathBuf>,

    /// Page template [default: template.html]
    #[arg(long, value_name = "FILE")]
    tmplfile: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(long)]
    quiet: bool,

    /// Read settings from a TOML file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum parallel workers (default: all cores)
    #[arg(long, short = 'j', value_name = "N")]
    jobs: Option<usize>,

    /// Print the stock page template and exit
    #[arg(long)]
    gen_template: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.gen_template {
        println!("{}", template::stock_template());
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let file = match &cli.config {
        Some(path) => config::load_file_config(path)?,
        None => FileConfig::default(),
    };
    let file = apply_flags(file, &cli);
    file.validate()?;
    let config = BuildConfig::from_file(cli.roots, file);

    init_tracing(config.quiet);
    init_thread_pool(&config.processing);

    let report = publish::publish(&config)?;
    if !config.quiet {
        output::print_report(&report);
    }
    Ok(())
}

/// Layer command-line flags over the file (or stock) settings.
fn apply_flags(mut file: FileConfig, cli: &Cli) -> FileConfig {
    if let Some(dir) = &cli.destdir {
        file.destdir = Some(dir.clone());
    }
    if let Some(dir) = &cli.assetdir {
        file.assetdir = Some(dir.clone());
    }
    if let Some(path) = &cli.tmplfile {
        file.tmplfile = path.clone();
    }
    if cli.quiet {
        file.quiet = true;
    }
    if let Some(jobs) = cli.jobs {
        file.processing.max_processes = Some(jobs);
    }
    file
}

/// Log to stderr at info, or warn when quiet. `RUST_LOG` overrides both.
fn init_tracing(quiet: bool) {
    let default = if quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
