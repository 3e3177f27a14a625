use anyhow::{Context, Result, bail};
use c64gfx::config::ConverterConfig;
use c64gfx::loader;
use c64gfx::output::{self, ConversionResult, OutputOptions};
use c64gfx_core::emit::Assembler;
use c64gfx_core::{ConvertOptions, MemoryLayout, Mode, ModeConfig, pipeline};
use clap::{Args, Parser, Subcommand};
use simplelog::{ColorChoice, LevelFilter, TermLogger, TerminalMode};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "c64gfx")]
#[command(version, about = "Convert images to C64 bitmaps and sprites", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct EmitArgs {
    /// Write an assembler include with addresses and sizes
    #[arg(long)]
    emit_asm: bool,

    /// Write a BASIC loader and PRG files
    #[arg(long)]
    emit_basic: bool,

    /// Include dialect: 64tass, acme, ca65 or kick
    #[arg(long, value_parser = parse_assembler)]
    assembler: Option<Assembler>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a full-screen image into bitmap, screen and color memory
    ConvertBitmap {
        input: PathBuf,
        output_dir: PathBuf,

        /// bitmap_hires or bitmap_multicolor
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,

        /// JSON map of memory addresses, e.g. '{"bitmap": "$6000"}'
        #[arg(long)]
        addresses: Option<String>,

        /// Floyd-Steinberg dithering
        #[arg(long)]
        dither: bool,

        /// Force the background color (palette index)
        #[arg(long)]
        background_color: Option<u8>,

        /// Border color for the loader and include (palette index)
        #[arg(long)]
        border_color: Option<u8>,

        /// Fail on the first cell with too many colors
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        emit: EmitArgs,

        /// Skip preview.png
        #[arg(long)]
        no_preview: bool,
    },

    /// Convert a sprite sheet into 64-byte sprite blocks
    ConvertSprites {
        input: PathBuf,
        output_dir: PathBuf,

        /// hires, multicolor, sprite_hires or sprite_multicolor
        #[arg(long, value_parser = parse_sprite_mode)]
        sprite_mode: Option<Mode>,

        /// Number of sprites to take from the sheet
        #[arg(long)]
        count: Option<usize>,

        /// JSON list of {x, y, w, h} regions to crop instead of tiling
        #[arg(long, conflicts_with = "count")]
        regions: Option<String>,

        #[arg(long)]
        background_color: Option<u8>,

        /// Shared multicolor 0 (palette index)
        #[arg(long)]
        multicolor0: Option<u8>,

        /// Shared multicolor 1 (palette index)
        #[arg(long, requires = "multicolor0")]
        multicolor1: Option<u8>,

        #[arg(long)]
        dither: bool,

        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        emit: EmitArgs,
    },

    /// Report palette usage and color conflicts without writing anything
    Analyze {
        input: PathBuf,

        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,

        /// Only report cells that break the color limit
        #[arg(long)]
        constraints_only: bool,

        #[arg(long)]
        background_color: Option<u8>,

        #[arg(long)]
        dither: bool,
    },
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn parse_sprite_mode(s: &str) -> Result<Mode, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "hires" => Ok(Mode::SpriteHires),
        "multicolor" => Ok(Mode::SpriteMulticolor),
        other => {
            let mode = parse_mode(other)?;
            if mode.is_sprite() {
                Ok(mode)
            } else {
                Err(format!("{} is not a sprite mode", mode))
            }
        }
    }
}

fn parse_assembler(s: &str) -> Result<Assembler, String> {
    s.parse().map_err(|e| format!("{}", e))
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            _ => LevelFilter::Debug,
        }
    };
    // A logger may already be set when embedded; keep going without one.
    let _ = TermLogger::init(
        level,
        simplelog::Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn layout_from(config: &ConverterConfig, addresses: Option<&str>) -> Result<MemoryLayout> {
    match addresses {
        Some(json) => {
            let overrides: BTreeMap<String, serde_json::Value> =
                serde_json::from_str(json).context("--addresses must be a JSON object")?;
            Ok(config.addresses.with_overrides(&overrides)?)
        }
        None => Ok(config.addresses),
    }
}

fn output_options(config: &ConverterConfig, emit: &EmitArgs, preview: bool) -> OutputOptions {
    OutputOptions {
        emit_asm: emit.emit_asm,
        emit_basic: emit.emit_basic,
        assembler: emit.assembler.unwrap_or(config.assembler),
        preview,
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn convert_bitmap(
    config: &ConverterConfig,
    input: &Path,
    output_dir: &Path,
    mode: Option<Mode>,
    addresses: Option<&str>,
    dither: bool,
    background_color: Option<u8>,
    border_color: Option<u8>,
    strict: bool,
    emit: &EmitArgs,
    no_preview: bool,
) -> Result<()> {
    let mode = mode.unwrap_or(config.bitmap_mode);
    if !mode.is_bitmap() {
        bail!("{} is not a bitmap mode", mode);
    }
    let mode_config = ModeConfig::for_mode(mode)
        .with_background(background_color)
        .with_strict(strict);
    let options = ConvertOptions {
        dither: dither || config.dither,
        layout: layout_from(config, addresses)?,
        border_color,
    };

    let pixels = loader::load_bitmap_source(input, mode)?;
    let conv = pipeline::convert_bitmap(&pixels, &mode_config, &options)?;
    let files = output::write_bitmap(
        output_dir,
        &conv,
        &output_options(config, emit, config.preview && !no_preview),
    )?;

    if conv.manifest.conflict_count > 0 {
        log::warn!(
            "{} cells had more colors than {} allows; see report.txt",
            conv.manifest.conflict_count,
            mode
        );
    }
    print_json(&ConversionResult {
        files,
        report: &conv.report,
        manifest: &conv.manifest,
    })
}

struct SpriteArgs<'a> {
    sprite_mode: Option<Mode>,
    count: Option<usize>,
    regions: Option<&'a str>,
    background_color: Option<u8>,
    multicolor0: Option<u8>,
    multicolor1: Option<u8>,
    dither: bool,
    strict: bool,
}

fn convert_sprites(
    config: &ConverterConfig,
    input: &Path,
    output_dir: &Path,
    args: SpriteArgs,
    emit: &EmitArgs,
) -> Result<()> {
    let mode = args.sprite_mode.unwrap_or(config.sprite_mode);
    let extra: Vec<u8> = [args.multicolor0, args.multicolor1]
        .into_iter()
        .flatten()
        .collect();
    if !extra.is_empty() && !mode.is_multicolor() {
        bail!("--multicolor0/--multicolor1 need a multicolor sprite mode");
    }
    let mode_config = ModeConfig::for_mode(mode)
        .with_background(args.background_color)
        .with_extra_shared(extra)
        .with_strict(args.strict);
    let options = ConvertOptions {
        dither: args.dither || config.dither,
        layout: config.addresses,
        border_color: None,
    };

    let conv = match args.regions {
        Some(json) => {
            let regions = loader::parse_regions(json)?;
            let image = loader::open_image(input)?;
            loader::convert_sheet_regions(&image, &mode_config, &regions, &options)?
        }
        None => {
            let pixels = loader::load_sheet(input)?;
            pipeline::convert_sprites(&pixels, &mode_config, args.count, &options)?
        }
    };

    let files = output::write_sprites(output_dir, &conv, &output_options(config, emit, false))?;
    if conv.manifest.conflict_count > 0 {
        log::warn!(
            "{} sprites had more colors than {} allows",
            conv.manifest.conflict_count,
            mode
        );
    }
    print_json(&ConversionResult {
        files,
        report: &conv.report,
        manifest: &conv.manifest,
    })
}

#[derive(serde::Serialize)]
struct AnalyzeResult<'a> {
    report: &'a c64gfx_core::AnalysisReport,
    report_text: String,
}

fn analyze(
    config: &ConverterConfig,
    input: &Path,
    mode: Option<Mode>,
    constraints_only: bool,
    background_color: Option<u8>,
    dither: bool,
) -> Result<()> {
    let mode = mode.unwrap_or(config.bitmap_mode);
    let pixels = if mode.is_bitmap() {
        loader::load_bitmap_source(input, mode)?
    } else {
        loader::load_sheet(input)?
    };
    let mode_config = ModeConfig::for_mode(mode).with_background(background_color);
    let report = pipeline::analyze(
        &pixels,
        &mode_config,
        dither || config.dither,
        constraints_only,
    )?;
    print_json(&AnalyzeResult {
        report_text: report.to_text(),
        report: &report,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);
    let config = ConverterConfig::load();

    match cli.command {
        Commands::ConvertBitmap {
            input,
            output_dir,
            mode,
            addresses,
            dither,
            background_color,
            border_color,
            strict,
            emit,
            no_preview,
        } => convert_bitmap(
            &config,
            &input,
            &output_dir,
            mode,
            addresses.as_deref(),
            dither,
            background_color,
            border_color,
            strict,
            &emit,
            no_preview,
        ),
        Commands::ConvertSprites {
            input,
            output_dir,
            sprite_mode,
            count,
            regions,
            background_color,
            multicolor0,
            multicolor1,
            dither,
            strict,
            emit,
        } => convert_sprites(
            &config,
            &input,
            &output_dir,
            SpriteArgs {
                sprite_mode,
                count,
                regions: regions.as_deref(),
                background_color,
                multicolor0,
                multicolor1,
                dither,
                strict,
            },
            &emit,
        ),
        Commands::Analyze {
            input,
            mode,
            constraints_only,
            background_color,
            dither,
        } => analyze(
            &config,
            &input,
            mode,
            constraints_only,
            background_color,
            dither,
        ),
    }
}
