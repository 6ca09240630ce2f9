use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use mathline::{Artifact, MarginSpec, Margins, OutputKind, Pipeline, RasterBackend, RenderOpts};

#[derive(Parser, Debug)]
#[command(name = "mathline", version)]
struct Cli {
    /// Log pipeline stages and computed geometry to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one expression and print its HTML fragment (or SVG markup).
    Render(RenderArgs),
    /// Typeset one expression and print its page metrics as JSON.
    Metrics(MetricsArgs),
    /// Render one expression per line of a file, concurrently.
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
struct OptArgs {
    /// JSON file with render options; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rasterization density (pixels per inch).
    #[arg(long)]
    density: Option<u32>,

    /// Font-size multiplier for emitted em lengths.
    #[arg(long)]
    factor: Option<f64>,

    /// Per-tool timeout in seconds.
    #[arg(long)]
    timeout: Option<f64>,

    /// Uniform page margin in points.
    #[arg(long, conflicts_with = "margins")]
    margin: Option<f64>,

    /// Directional page margins in points: LEFT,TOP,RIGHT,BOTTOM.
    #[arg(long, value_delimiter = ',', num_args = 4)]
    margins: Option<Vec<f64>>,

    /// Output kind.
    #[arg(long, value_enum)]
    output: Option<OutputChoice>,

    /// Rasterizer backing raster output.
    #[arg(long, value_enum)]
    rasterizer: Option<RasterizerChoice>,

    /// CSS class for emitted markup.
    #[arg(long, conflicts_with = "no_class")]
    class: Option<String>,

    /// Emit markup without a CSS class.
    #[arg(long)]
    no_class: bool,

    /// Omit the static object-fit style from symmetric images.
    #[arg(long)]
    no_static_style: bool,

    /// Skip the integer page-height correction for vector output.
    #[arg(long)]
    no_height_correction: bool,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// LaTeX math expression; surrounding `$` are stripped.
    expression: String,

    /// Output image path (raster) or SVG path (vector; markup is printed when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    opts: OptArgs,
}

#[derive(Parser, Debug)]
struct MetricsArgs {
    /// LaTeX math expression; surrounding `$` are stripped.
    expression: String,

    #[command(flatten)]
    opts: OptArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// File with one expression per line (blank lines are skipped).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Directory receiving `formula-<n>.png` (or `.svg`).
    #[arg(long)]
    out_dir: PathBuf,

    /// Worker threads (defaults to the number of CPUs).
    #[arg(long)]
    threads: Option<usize>,

    #[command(flatten)]
    opts: OptArgs,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputChoice {
    Single,
    Split,
    Symmetric,
    Vector,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RasterizerChoice {
    Magick,
    Resvg,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Metrics(args) => cmd_metrics(args),
        Command::Batch(args) => cmd_batch(args),
    }
}

fn build_opts(args: &OptArgs) -> anyhow::Result<RenderOpts> {
    let mut opts = match &args.config {
        Some(path) => RenderOpts::from_path(path)?,
        None => RenderOpts::default(),
    };
    if let Some(d) = args.density {
        opts.density = d;
    }
    if let Some(f) = args.factor {
        opts.factor = f;
    }
    if let Some(t) = args.timeout {
        opts.process_timeout =
            Duration::try_from_secs_f64(t).with_context(|| format!("invalid timeout {t}"))?;
    }
    if let Some(m) = args.margin {
        opts.margin = MarginSpec::Uniform(m);
    }
    if let Some(m) = &args.margins
        && let &[left, top, right, bottom] = m.as_slice()
    {
        opts.margin = MarginSpec::Directional(Margins {
            left,
            top,
            right,
            bottom,
        });
    }
    if let Some(o) = args.output {
        opts.output = match o {
            OutputChoice::Single => OutputKind::Single,
            OutputChoice::Split => OutputKind::Split,
            OutputChoice::Symmetric => OutputKind::Symmetric,
            OutputChoice::Vector => OutputKind::Vector,
        };
    }
    if let Some(r) = args.rasterizer {
        opts.rasterizer = match r {
            RasterizerChoice::Magick => RasterBackend::Magick,
            RasterizerChoice::Resvg => RasterBackend::Resvg,
        };
    }
    if let Some(c) = &args.class {
        opts.class_name = Some(c.clone());
    }
    if args.no_class {
        opts.class_name = None;
    }
    if args.no_static_style {
        opts.include_static_style = false;
    }
    if args.no_height_correction {
        opts.correct_page_height = false;
    }
    opts.validate()?;
    Ok(opts)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(build_opts(&args.opts)?)?;
    let artifact = pipeline.render(&args.expression)?;
    let out = emit(&artifact, args.out.as_deref())?;
    println!("{out}");
    Ok(())
}

fn cmd_metrics(args: MetricsArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(build_opts(&args.opts)?)?;
    let metrics = pipeline.measure(&args.expression)?;
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let pipeline = Pipeline::new(build_opts(&args.opts)?)?;
    let text = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read expressions '{}'", args.in_path.display()))?;
    let expressions: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let ext = match pipeline.opts().output {
        OutputKind::Vector => "svg",
        _ => "png",
    };
    let results = pipeline.render_many(expressions.as_slice(), args.threads)?;
    let mut failed = 0usize;
    for (i, (expr, result)) in expressions.iter().zip(results).enumerate() {
        let path = args.out_dir.join(format!("formula-{i}.{ext}"));
        match result.map_err(anyhow::Error::from).and_then(|a| emit(&a, Some(path.as_path()))) {
            Ok(html) => println!("{html}"),
            Err(e) => {
                failed += 1;
                eprintln!("{expr}: {e:#}");
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} expressions failed", expressions.len());
    }
    Ok(())
}

/// Write the artifact (when a path is given) and return what should be printed.
fn emit(artifact: &Artifact, out: Option<&Path>) -> anyhow::Result<String> {
    match (artifact, out) {
        (Artifact::Raster(r), Some(path)) => Ok(r.save_with_html(path)?),
        (Artifact::Raster(_), None) => anyhow::bail!("--out is required for raster output"),
        (Artifact::Vector(v), Some(path)) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(path, &v.markup)
                .with_context(|| format!("write svg '{}'", path.display()))?;
            Ok(serde_json::to_string(&v.metrics)?)
        }
        (Artifact::Vector(v), None) => Ok(v.markup.clone()),
    }
}
