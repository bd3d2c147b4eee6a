//! pdfdeck CLI - slide layout reconstruction tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfdeck::{
    read_input, render, JsonFormat, PageSelection, ReconstructOptions, ReconstructionStats,
    Reconstructor,
};

#[derive(Parser)]
#[command(name = "pdfdeck")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Reconstruct editable slide layouts from PDF page dumps", long_about = None)]
struct Cli {
    /// Input page dump (JSON)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Log each heuristic's decisions (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    args: ReconstructArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by every command that runs reconstruction.
#[derive(clap::Args, Default)]
struct ReconstructArgs {
    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// JSON file overriding detection thresholds
    #[arg(long, value_name = "FILE", env = "PDFDECK_CONFIG")]
    config: Option<PathBuf>,

    /// Reconstruct pages in parallel
    #[arg(long)]
    parallel: bool,

    /// Skip chart clustering
    #[arg(long)]
    no_charts: bool,

    /// Skip table detection
    #[arg(long)]
    no_tables: bool,

    /// Keep icon-font glyphs as text
    #[arg(long)]
    no_icons: bool,

    /// Skip layout role tagging
    #[arg(long)]
    no_roles: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct a page dump into a slide layout (JSON)
    Reconstruct {
        /// Input page dump
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        args: ReconstructArgs,
    },

    /// Show page dump information
    Info {
        /// Input page dump
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Show what reconstruction would produce
    Stats {
        /// Input page dump
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print statistics as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        args: ReconstructArgs,
    },

    /// Print the default configuration as JSON
    Config,

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();

    // RUST_LOG still wins when set
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Some(Commands::Reconstruct {
            input,
            output,
            compact,
            args,
        }) => cmd_reconstruct(&input, output.as_deref(), compact, &args),
        Some(Commands::Info { input }) => cmd_info(&input),
        Some(Commands::Stats { input, json, args }) => cmd_stats(&input, json, &args),
        Some(Commands::Config) => cmd_config(),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: reconstruct if input is provided
            if let Some(input) = cli.input {
                let output = cli.output.unwrap_or_else(|| default_output(&input));
                cmd_reconstruct(&input, Some(&output), false, &cli.args)
            } else {
                println!("{}", "Usage: pdfdeck <FILE> [OUTPUT]".yellow());
                println!("       pdfdeck --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// `deck.json` -> `deck_layout.json` next to the input.
fn default_output(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    input.with_file_name(format!("{}_layout.json", stem))
}

fn build_options(args: &ReconstructArgs) -> Result<ReconstructOptions, Box<dyn std::error::Error>> {
    let mut options = match &args.config {
        Some(path) => ReconstructOptions::from_json_file(path)?,
        None => ReconstructOptions::default(),
    };

    if let Some(p) = &args.pages {
        let selection = PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?;
        options = options.with_pages(selection);
    }
    if args.parallel {
        options = options.with_parallel(true);
    }
    if args.no_charts {
        options = options.with_charts(false);
    }
    if args.no_tables {
        options = options.with_tables(false);
    }
    if args.no_icons {
        options = options.with_icons(false);
    }
    if args.no_roles {
        options = options.with_roles(false);
    }
    log::debug!(
        "options: pages {:?}, charts {}, tables {}, icons {}, roles {}",
        options.pages,
        options.detect_charts,
        options.detect_tables,
        options.extract_icons,
        options.classify_roles
    );
    Ok(options)
}

fn cmd_reconstruct(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    args: &ReconstructArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(args)?;

    let pb = ProgressBar::new(3);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );
    // Keep stdout clean for the JSON
    if output.is_none() {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    pb.set_message("Reading page dump...");
    let doc = read_input(input)?;
    pb.inc(1);

    pb.set_message(format!("Reconstructing {} pages...", doc.pages.len()));
    let layout = Reconstructor::new(options).reconstruct(&doc);
    pb.inc(1);

    pb.set_message("Writing layout...");
    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = render::to_json(&layout, format)?;
    pb.inc(1);
    pb.finish_with_message("Done!");

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
        if !layout.failed_pages.is_empty() {
            println!(
                "{} pages passed through unchanged: {:?}",
                "Warning:".yellow().bold(),
                layout.failed_pages
            );
        }
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let doc = read_input(input)?;

    println!("{}", "Page Dump Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: {}", "Pages".bold(), doc.pages.len());
    let c = &doc.coefficients;
    println!(
        "{}: scale {} / stroke {} / font {}",
        "Coefficients".bold(),
        c.scale,
        c.stroke_width_scale,
        c.font_size_scale
    );

    println!();
    println!("{}", "Primitives".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for (i, page) in doc.pages.iter().enumerate() {
        println!(
            "{} {:>3}: {}x{}  {} shapes, {} text runs, {} images",
            "Page".bold(),
            page.number.unwrap_or(i as u32 + 1),
            page.width,
            page.height,
            page.shapes.len(),
            page.texts.len(),
            page.images.len()
        );
    }

    Ok(())
}

fn cmd_stats(input: &Path, json: bool, args: &ReconstructArgs) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(args)?;
    let doc = read_input(input)?;
    let layout = Reconstructor::new(options).reconstruct(&doc);
    let stats = ReconstructionStats::from_layout(&layout);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "Reconstruction Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Pages".bold(), stats.page_count);
    println!(
        "{}: {} ({} rings, {} lines)",
        "Shapes".bold(),
        stats.shape_count,
        stats.ring_count,
        stats.line_count
    );
    println!(
        "{}: {} ({} cells, {} merged)",
        "Tables".bold(),
        stats.table_count,
        stats.cell_count,
        stats.merged_cell_count
    );
    if stats.ambiguous_row_count > 0 {
        println!(
            "{}: {}",
            "Ambiguous row heights".yellow(),
            stats.ambiguous_row_count
        );
    }
    println!(
        "{}: {} ({} shapes rasterized)",
        "Charts".bold(),
        stats.chart_count,
        stats.charted_shape_count
    );
    println!("{}: {}", "Icons".bold(), stats.icon_count);
    println!(
        "{}: {} ({} runs)",
        "Text blocks".bold(),
        stats.text_block_count,
        stats.text_run_count
    );
    println!("{}: {}", "Images".bold(), stats.image_count);
    if stats.failed_page_count > 0 {
        println!(
            "{}: {:?}",
            "Failed pages".red().bold(),
            layout.failed_pages
        );
    }

    Ok(())
}

fn cmd_config() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&ReconstructOptions::default())?);
    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdfdeck".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Slide layout reconstruction tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/pdfdeck".dimmed());
    println!("License: MIT");
}
