use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::{error, info, warn};

use pfg_core::PfgError;
use pfg_io::{read_surface_file, LoadOutcome};
use pfg_render::{create_file_dispatcher, parse_program, Interpreter, OutputKind, RenderConfig, ViewVolumeRoutines};
use pfg_surface::{LoadLimits, SurfaceLibrary};

/// Draw bicubic patch surfaces placed by a turtle program
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Surface file as `ID=PATH`; ID is the single character used by `~ID`
    #[clap(short, long = "surface", value_parser = parse_surface_arg)]
    surfaces: Vec<(u8, PathBuf)>,

    /// Texture for a loaded surface as `ID=INDEX`
    #[clap(short, long = "texture", value_parser = parse_texture_arg)]
    textures: Vec<(u8, u32)>,

    /// Turtle program text
    #[clap(short, long, conflicts_with = "program_file")]
    program: Option<String>,

    /// File holding the turtle program
    #[clap(long)]
    program_file: Option<PathBuf>,

    /// JSON render configuration
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Name of a PostScript file to write
    #[clap(long)]
    ps: Option<PathBuf>,

    /// Name of a Wavefront `.obj` file to write
    #[clap(long)]
    obj: Option<PathBuf>,

    /// Limit the library to 20 surfaces of at most 40 patches
    #[clap(long)]
    legacy_limits: bool,

    /// Print the effective configuration as JSON and exit
    #[clap(long)]
    print_config: bool,
}

fn parse_surface_arg(s: &str) -> std::result::Result<(u8, PathBuf), String> {
    let (id, path) = s.split_once('=').ok_or_else(|| format!("expected ID=PATH, got '{s}'"))?;
    match id.as_bytes() {
        [id] if id.is_ascii_graphic() => Ok((*id, PathBuf::from(path))),
        _ => Err(format!("surface identifier must be one character, got '{id}'")),
    }
}

fn parse_texture_arg(s: &str) -> std::result::Result<(u8, u32), String> {
    let (id, value) = parse_surface_arg(s)?;
    let index = value
        .to_str()
        .and_then(|i| i.parse().ok())
        .ok_or_else(|| format!("texture index must be a non-negative integer, got '{}'", value.display()))?;
    Ok((id, index))
}

fn load_surfaces(args: &Args, library: &mut SurfaceLibrary) -> Result<()> {
    for (id, path) in &args.surfaces {
        let start = Instant::now();
        match read_surface_file(path, *id, library) {
            Ok(LoadOutcome::Loaded(id)) => {
                info!("Loaded '{}' from {} in {:?}", id as char, path.display(), start.elapsed())
            }
            Ok(LoadOutcome::Skipped(reason)) => warn!("Skipped {}: {reason}", path.display()),
            Err(e) if e.is_fatal() => {
                return Err(e).with_context(|| format!("loading {}", path.display()));
            }
            Err(e) => warn!("Skipped {}: {e}", path.display()),
        }
    }
    for &(id, texture) in &args.textures {
        if let Err(e) = library.set_surface_texture(id, Some(texture)) {
            warn!("Texture {texture} not applied: {e}");
        }
    }
    Ok(())
}

fn program_text(args: &Args, library: &SurfaceLibrary) -> Result<String> {
    if let Some(p) = &args.program {
        return Ok(p.clone());
    }
    if let Some(path) = &args.program_file {
        return std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()));
    }
    // every loaded surface at the origin
    Ok(library.surfaces().map(|s| format!("~{} ", s.id as char)).collect())
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => RenderConfig::load(path).with_context(|| format!("reading {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if args.legacy_limits {
        cfg.limits = LoadLimits::legacy();
    }
    if args.print_config {
        println!("{}", cfg.to_json()?);
        return Ok(());
    }

    let mut library = SurfaceLibrary::with_limits(cfg.limits);
    load_surfaces(&args, &mut library)?;

    let modules = parse_program(&program_text(&args, &library)?)?;

    if cfg.view.fit_to_volume {
        let mut volume = ViewVolumeRoutines::new();
        Interpreter::new(&mut library, &cfg).run(&modules, &mut volume)?;
        match volume.volume() {
            Some(aabb) => {
                info!("View volume {:?} .. {:?}", aabb.min, aabb.max);
                cfg.view.fit_to(&aabb);
            }
            None => warn!("Nothing drawn; keeping the configured view"),
        }
    }

    let outputs = [(OutputKind::Postscript, &args.ps), (OutputKind::Obj, &args.obj)];
    let mut written = 0;
    for (kind, path) in outputs {
        let Some(path) = path else { continue };
        let start = Instant::now();
        let mut dispatcher = create_file_dispatcher(kind, path)?;
        Interpreter::new(&mut library, &cfg).run(&modules, dispatcher.as_mut())?;
        info!("Wrote {} output to {} in {:?}", kind.label(), path.display(), start.elapsed());
        written += 1;
    }
    if written == 0 {
        warn!("No output requested; use --ps or --obj");
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.downcast_ref::<PfgError>().is_some_and(PfgError::is_fatal) {
                error!("Fatal: {e:#}");
            } else {
                error!("{e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
