use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "photowall", version, about = "Timed photo collage wall")]
struct Cli {
    /// Settings file (`key=value` text, or JSON when it ends in `.json`).
    #[arg(long, global = true, default_value = photowall::DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep rendering collages; type `f` + Enter to toggle fullscreen, `q` + Enter to quit.
    Run(RunArgs),
    /// Render a single collage as a PNG.
    Frame(FrameArgs),
    /// Print the grid for a canvas and photo count as JSON.
    Plan(PlanArgs),
    /// Write a commented default settings file.
    Init(InitArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Override the output PNG from the settings.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Stop after this many collages.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Use the fullscreen canvas size.
    #[arg(long, default_value_t = false)]
    fullscreen: bool,
}

#[derive(Parser, Debug)]
struct PlanArgs {
    /// Canvas width (defaults to the settings).
    #[arg(long, allow_negative_numbers = true)]
    width: Option<i64>,

    /// Canvas height (defaults to the settings).
    #[arg(long, allow_negative_numbers = true)]
    height: Option<i64>,

    /// Photo count (defaults to the settings).
    #[arg(long, allow_negative_numbers = true)]
    number: Option<i64>,
}

#[derive(Parser, Debug)]
struct InitArgs {
    /// Overwrite an existing settings file.
    #[arg(long, default_value_t = false)]
    force: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Run(args) => cmd_run(&cli.settings, args),
        Command::Frame(args) => cmd_frame(&cli.settings, args),
        Command::Plan(args) => cmd_plan(&cli.settings, args),
        Command::Init(args) => cmd_init(&cli.settings, args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn cmd_run(settings_path: &Path, args: RunArgs) -> anyhow::Result<()> {
    let settings = photowall::Settings::load_or_create(settings_path)?;
    let mut cfg = settings.refresh_config()?;
    cfg.max_cycles = args.max_cycles;
    cfg.threads = args.threads;

    let out = args.out.unwrap_or_else(|| settings.output.clone());
    let surface = photowall::PngSurface::new(
        &out,
        settings.windowed_canvas()?,
        settings.fullscreen_canvas()?,
    )
    .with_fullscreen(settings.fullscreen);
    let mut lp = photowall::RefreshLoop::new(cfg, surface)?;

    let (tx, rx) = mpsc::channel();
    // Detached: a blocked stdin read must not keep the process alive after the loop stops.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let signal = match line.trim() {
                "f" | "F" => photowall::LoopSignal::ToggleFullscreen,
                "q" | "Q" | "quit" | "exit" => photowall::LoopSignal::Exit,
                "" => continue,
                other => {
                    tracing::warn!(input = other, "unknown command (use 'f' or 'q')");
                    continue;
                }
            };
            if tx.send(signal).is_err() {
                break;
            }
        }
    });

    eprintln!("writing collages to {}", out.display());
    let stats = lp.run(&rx)?;
    eprintln!(
        "stopped after {} collages ({} failed cycles, {} corrupt photos skipped)",
        stats.cycles_rendered, stats.cycles_failed, stats.photos_skipped
    );
    Ok(())
}

fn cmd_frame(settings_path: &Path, args: FrameArgs) -> anyhow::Result<()> {
    let settings = photowall::Settings::load_or_default(settings_path)?;
    let cfg = settings.refresh_config()?;
    let canvas = if args.fullscreen {
        settings.fullscreen_canvas()?
    } else {
        settings.windowed_canvas()?
    };

    let mut lp = photowall::RefreshLoop::new(cfg, photowall::InMemorySurface::new(canvas))?;
    let frame = lp.render_once()?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    frame.save_png(&args.out)?;

    let skipped = lp.stats().photos_skipped;
    if skipped > 0 {
        eprintln!("skipped {skipped} corrupt photo(s)");
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_plan(settings_path: &Path, args: PlanArgs) -> anyhow::Result<()> {
    let settings = photowall::Settings::load_or_default(settings_path)?;
    let canvas = photowall::CanvasSpec::from_signed(
        args.width.unwrap_or(settings.width),
        args.height.unwrap_or(settings.height),
    )?;
    let count = photowall::PhotoCount::from_signed(args.number.unwrap_or(settings.number))?;
    let shape = photowall::GridShape::for_count(count, canvas);
    let cells = photowall::plan_grid(canvas, count)?;

    let out = serde_json::json!({
        "canvas": canvas,
        "count": count,
        "shape": shape,
        "cells": cells,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&out).context("serialize plan")?
    );
    Ok(())
}

fn cmd_init(settings_path: &Path, args: InitArgs) -> anyhow::Result<()> {
    if settings_path.exists() && !args.force {
        anyhow::bail!(
            "'{}' already exists (use --force to overwrite)",
            settings_path.display()
        );
    }
    photowall::Settings::default().write_to(settings_path)?;

    eprintln!("wrote {}", settings_path.display());
    Ok(())
}
