use clap::Parser;
use std::{path::PathBuf, process};
use stem_splitter_engine::{
    model::{paths::models_dir, registry::model_names},
    parse_bit_rate, split_file, OnnxLoader, ProgressReporter, SplitOptions, DEFAULT_BIT_RATE,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "stem-splitter")]
#[command(about = "Split audio into stems with a segmented separation model", long_about = None)]
#[command(version)]
struct Cli {
    /// Input audio file
    input: Option<PathBuf>,

    /// Model name, i.e. the folder name in the models dir (2stems, 4stems, 5stems-16khz, ...)
    #[arg(short, long, default_value = "2stems")]
    model: String,

    /// Output base file name (default: <input>)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output bit rate (128k, 192000, 256k, ...)
    #[arg(short, long, value_parser = parse_bit_rate_arg)]
    bitrate: Option<u32>,

    /// Output track list, e.g. `vocals,drums` or `mixed=vocals+drums,acc=input-vocals`
    #[arg(short, long, default_value = "")]
    tracks: String,

    /// Models dir (default: $STEM_SPLITTER_MODELS_DIR or the platform data dir)
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// Overwrite when the target output file exists
    #[arg(long)]
    overwrite: bool,

    /// Display detailed processing information
    #[arg(long)]
    verbose: bool,

    /// Display debug information
    #[arg(long)]
    debug: bool,

    /// List available models
    #[arg(long)]
    list: bool,
}

fn parse_bit_rate_arg(s: &str) -> Result<u32, String> {
    parse_bit_rate(s).map_err(|e| e.to_string())
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = if cli.list {
        handle_list()
    } else {
        handle_split(cli)
    };

    match result {
        Ok(()) => process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_split(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let input = cli.input.ok_or("Not specified the input file path")?;

    let opts = SplitOptions {
        model_name: cli.model,
        models_dir: cli.models_dir,
        output_base: cli.output,
        bit_rate: cli.bitrate.unwrap_or(DEFAULT_BIT_RATE),
        tracks: cli.tracks,
        overwrite: cli.overwrite,
    };

    eprintln!("Input file:");
    eprintln!("{}", input.display());
    eprintln!();

    let mut progress = ProgressReporter::new(|e| {
        eprintln!(
            "[{:6.2}%] {}, {}/{}",
            e.percent,
            e.stage.label(),
            e.done,
            e.total
        );
    });

    let dir = models_dir(opts.models_dir.as_deref())?;
    let loader = OnnxLoader::new(dir, opts.model_name.clone());
    let written = split_file(&input, &opts, &loader, &mut progress)?;

    eprintln!();
    eprintln!("Output files:");
    for path in written {
        println!("{}", path.display());
    }
    eprintln!();
    eprintln!("Completed.");

    Ok(())
}

fn handle_list() -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Available models:");
    for (i, name) in model_names()?.iter().enumerate() {
        let marker = if i == 0 { " (default)" } else { "" };
        eprintln!("  • {}{}", name, marker);
    }
    eprintln!();
    eprintln!("Use --model <name> to specify a model");
    Ok(())
}
