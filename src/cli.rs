use crate::config::{Config, load_config};
use crate::hyperlink::link_person_labels;
use crate::ir::{GrampsId, GrampsTree};
use crate::layout::{EgoOutcome, Layout, compute_ego_layout, compute_tree_layout};
use crate::layout_dump::write_layout_dump;
use crate::parser::parse_tree_json;
use crate::render::{render_svg, write_output_svg};
use anyhow::Result;
use clap::{Parser, ValueEnum};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "GTR_LOG";

#[derive(Parser, Debug)]
#[command(name = "gtr", version, about = "Family tree renderer for Gramps JSON exports")]
pub struct Args {
    /// Tree JSON file or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Draw the ego diagram of this person instead of the full tree
    #[arg(short = 'p', long = "person", conflicts_with = "each_person")]
    pub person: Option<String>,

    /// Draw one ego diagram per person into this directory
    #[arg(long = "each-person", value_name = "DIR")]
    pub each_person: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Base URL of the person pages (overrides SITEURL)
    #[arg(long = "site-url")]
    pub site_url: Option<String>,

    /// Seed for the wedding-day estimate
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Write the computed layout as JSON
    #[arg(long = "dump-layout")]
    pub dump_layout: Option<PathBuf>,

    /// PNG width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// PNG height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if args.site_url.is_some() {
        config.render.site_url = args.site_url.clone();
    }

    let input = read_input(args.input.as_deref())?;
    let tree = parse_tree_json(&input)?;

    if let Some(dir) = args.each_person.as_deref() {
        return render_each_person(&tree, &config, dir, args.output_format);
    }

    let layout = match args.person.as_deref() {
        Some(id) => {
            let id = GrampsId::from(id);
            match compute_ego_layout(&id, &tree, &config.theme, &config.layout)? {
                EgoOutcome::Drawn(layout) => layout,
                EgoOutcome::NoRelations => {
                    warn!(%id, "person has no relations, nothing written");
                    return Ok(());
                }
            }
        }
        None => {
            let mut rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            compute_tree_layout(&tree, &config.theme, &config.layout, &mut rng)?
        }
    };

    if let Some(path) = args.dump_layout.as_deref() {
        write_layout_dump(path, &layout)?;
    }
    emit(&layout, &config, args.output_format, args.output.as_deref())
}

fn render_each_person(
    tree: &GrampsTree,
    config: &Config,
    dir: &Path,
    format: OutputFormat,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let mut written = 0usize;
    for id in tree.persons().keys() {
        match compute_ego_layout(id, tree, &config.theme, &config.layout)? {
            EgoOutcome::Drawn(layout) => {
                let path = dir.join(format!("{id}.{}", format.extension()));
                emit(&layout, config, format, Some(&path))?;
                written += 1;
            }
            EgoOutcome::NoRelations => {
                info!(%id, "skipping person without relations");
            }
        }
    }
    info!(written, total = tree.persons().len(), "ego diagrams written");
    Ok(())
}

fn emit(layout: &Layout, config: &Config, format: OutputFormat, output: Option<&Path>) -> Result<()> {
    let svg = render_svg(layout, &config.theme);
    let svg = link_person_labels(&svg, &config.render.resolve_site_url());
    match format {
        OutputFormat::Svg => write_output_svg(&svg, output),
        OutputFormat::Png => write_png(&svg, config, &ensure_output(output, "png")?),
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, config: &Config, output: &Path) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.render)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _config: &Config, _output: &Path) -> Result<()> {
    anyhow::bail!("PNG output requires the `png` feature")
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: Option<&Path>, ext: &str) -> Result<PathBuf> {
    output
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow::anyhow!("Output path required for {ext} output"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ego_arguments() {
        let args = Args::try_parse_from([
            "gtr", "-i", "tree.json", "--person", "I0001", "-e", "png", "-o", "out.png", "--seed", "7",
        ])
        .unwrap();
        assert_eq!(args.person.as_deref(), Some("I0001"));
        assert!(matches!(args.output_format, OutputFormat::Png));
        assert_eq!(args.seed, Some(7));
    }

    #[test]
    fn person_and_each_person_conflict() {
        let err = Args::try_parse_from(["gtr", "--person", "I1", "--each-person", "out"]);
        assert!(err.is_err());
    }

    #[test]
    fn png_needs_an_output_path() {
        assert!(ensure_output(None, "png").is_err());
        assert_eq!(
            ensure_output(Some(Path::new("a.png")), "png").unwrap(),
            PathBuf::from("a.png")
        );
    }
}
