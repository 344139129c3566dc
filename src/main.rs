use clap::{Parser, Subcommand};
use respic::args::RenderArguments;
use respic::defaults::{self, SiteDefaults};
use respic::preview::{PreviewProcessor, PreviewRepository};
use respic::render::Renderer;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "respic")]
#[command(about = "Responsive <img>/<picture> markup renderer")]
#[command(long_about = "\
Responsive <img>/<picture> markup renderer

Takes a render-arguments JSON file plus optional site defaults and prints
the markup that would be emitted for it. Image processing is simulated:
renditions get deterministic URIs of the form <stem>-<width>x<height>.<ext>,
so the output is stable and diffable.

Arguments file:

  {
    \"src\": \"photos/dawn.png\",
    \"width\": \"400c\",
    \"height\": \"200c\",
    \"add_webp\": true,
    \"sources\": {
      \"desktop\": { \"width\": \"800c\", \"height\": \"400c\" }
    }
  }

Dimension strings accept an optional suffix: 400 (plain), 400c (crop to
fill), 400m (fit within). Source names matching a breakpoint name from the
defaults get media=\"(min-width: Npx)\" automatically.

Run 'respic gen-defaults' to generate a documented defaults.toml.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the markup for an arguments file
    Render {
        /// Render-arguments JSON file
        arguments: PathBuf,

        /// Site defaults TOML file
        #[arg(long)]
        defaults: Option<PathBuf>,

        /// Assumed source image size, WIDTHxHEIGHT
        #[arg(long, default_value = "2000x1500", value_parser = parse_dimensions)]
        dimensions: (u32, u32),
    },
    /// Print a stock defaults.toml with all options documented
    GenDefaults,
}

fn parse_dimensions(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got \"{value}\""))?;
    let width = width
        .parse::<u32>()
        .map_err(|_| format!("invalid width \"{width}\""))?;
    let height = height
        .parse::<u32>()
        .map_err(|_| format!("invalid height \"{height}\""))?;
    if width == 0 || height == 0 {
        return Err("dimensions must be non-zero".to_string());
    }
    Ok((width, height))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            arguments,
            defaults,
            dimensions,
        } => {
            let raw = std::fs::read_to_string(&arguments)?;
            let args: RenderArguments = serde_json::from_str(&raw)?;
            let site_defaults = match defaults {
                Some(path) => SiteDefaults::load(&path)?,
                None => SiteDefaults::default(),
            };

            let processor = PreviewProcessor;
            let repository = PreviewRepository::with_dimensions(dimensions.0, dimensions.1);
            let markup = Renderer::new(&processor, &repository).render(&args, &site_defaults)?;
            println!("{markup}");
        }
        Command::GenDefaults => {
            print!("{}", defaults::stock_toml());
        }
    }

    Ok(())
}
