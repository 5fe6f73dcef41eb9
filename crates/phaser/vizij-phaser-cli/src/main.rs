use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};

use vizij_phaser_core::{
    bake_scene, calculate, export_baked_json, export_scene_json, parse_stored_scene_json,
    reset_keyframes, Composition, Config, FrameInterval, Outcome, PanelSettings, Scene, Severity,
};

/// Exit status when a pass was rejected (bad range, no selection).
const EXIT_REJECTED: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "vizij-phaser",
    version,
    about = "Bake phase-delayed follow-through into scene rotation keys"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write phase keys for every descendant of the active node.
    Calculate(CalculateArgs),
    /// Remove phase keys over a frame range.
    Reset(ResetArgs),
    /// Dump per-node local rotations for every frame of a range.
    Bake(BakeArgs),
}

#[derive(Args, Debug)]
struct SceneArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Override the scene's active node.
    #[arg(long)]
    active: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CompositionArg {
    BeneathParent,
    NodeLocal,
}

impl From<CompositionArg> for Composition {
    fn from(arg: CompositionArg) -> Self {
        match arg {
            CompositionArg::BeneathParent => Composition::BeneathParent,
            CompositionArg::NodeLocal => Composition::NodeLocal,
        }
    }
}

#[derive(Args, Debug)]
struct CalculateArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Pass config JSON; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read the config file and numeric flags on the panel's slider scale
    /// (recursion 0..10, strength 1..10).
    #[arg(long, default_value_t = false)]
    panel: bool,

    #[arg(long)]
    start: Option<i32>,

    #[arg(long)]
    end: Option<i32>,

    /// Frames of lag per depth level.
    #[arg(long)]
    delay: Option<f32>,

    /// Per-level falloff of influence.
    #[arg(long)]
    recursion: Option<f32>,

    /// Amplitude multiplier at depth 1.
    #[arg(long)]
    strength: Option<f32>,

    /// Deltas closer to identity than this are dropped.
    #[arg(long)]
    threshold: Option<f32>,

    #[arg(long, value_enum)]
    composition: Option<CompositionArg>,

    /// Collect per-node, per-frame diagnostics into the report.
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Write the pass report JSON here.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ResetArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[arg(long, default_value_t = 0)]
    start: i32,

    #[arg(long, default_value_t = 100)]
    end: i32,
}

#[derive(Args, Debug)]
struct BakeArgs {
    #[command(flatten)]
    scene: SceneArgs,

    #[arg(long, default_value_t = 0)]
    start: i32,

    #[arg(long, default_value_t = 100)]
    end: i32,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    let result = match cli.cmd {
        Command::Calculate(args) => cmd_calculate(args),
        Command::Reset(args) => cmd_reset(args),
        Command::Bake(args) => cmd_bake(args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let debug_pass = matches!(&cli.cmd, Command::Calculate(args) if args.debug);
    let level = match (cli.verbose, debug_pass) {
        (0, false) => "warn",
        (1, false) => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_scene(args: &SceneArgs) -> anyhow::Result<Scene> {
    let text = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("read scene '{}'", args.in_path.display()))?;
    let mut scene = parse_stored_scene_json(&text)
        .with_context(|| format!("parse scene '{}'", args.in_path.display()))?;
    if let Some(active) = &args.active {
        scene
            .set_active(active)
            .with_context(|| format!("select active node '{active}'"))?;
    }
    Ok(scene)
}

fn write_output(out: Option<&Path>, text: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(path, text)
                .with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

/// Print notifications the scene collected during the command.
fn flush_messages(scene: &mut Scene) {
    for msg in scene.take_messages() {
        let tag = match msg.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        eprintln!("[{tag}] {}", msg.text);
    }
}

fn resolve_config(args: &CalculateArgs) -> anyhow::Result<Config> {
    let text = match &args.config {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("read config '{}'", path.display()))?,
        ),
        None => None,
    };

    let mut config = if args.panel {
        let mut panel: PanelSettings = match &text {
            Some(t) => serde_json::from_str(t).context("parse panel settings")?,
            None => PanelSettings::default(),
        };
        override_opt(&mut panel.start_frame, args.start);
        override_opt(&mut panel.end_frame, args.end);
        override_opt(&mut panel.delay, args.delay);
        override_opt(&mut panel.recursion, args.recursion);
        override_opt(&mut panel.strength, args.strength);
        override_opt(&mut panel.threshold, args.threshold);
        panel.to_config()
    } else {
        let mut config: Config = match &text {
            Some(t) => serde_json::from_str(t).context("parse config")?,
            None => Config::default(),
        };
        override_opt(&mut config.start_frame, args.start);
        override_opt(&mut config.end_frame, args.end);
        override_opt(&mut config.delay, args.delay);
        override_opt(&mut config.recursion, args.recursion);
        override_opt(&mut config.strength, args.strength);
        override_opt(&mut config.threshold, args.threshold);
        config
    };
    if let Some(c) = args.composition {
        config.composition = c.into();
    }
    config.debug |= args.debug;
    Ok(config)
}

fn override_opt<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn cmd_calculate(args: CalculateArgs) -> anyhow::Result<ExitCode> {
    let config = resolve_config(&args)?;
    let mut scene = load_scene(&args.scene)?;
    log::debug!("resolved config: {config:?}");

    let outcome = calculate(&mut scene, &config)?;
    flush_messages(&mut scene);
    let report = match outcome {
        Outcome::Completed(report) => report,
        Outcome::Rejected(_) => return Ok(ExitCode::from(EXIT_REJECTED)),
    };

    eprintln!(
        "{} node(s), {} key(s) written, {} cleared, {} suppressed",
        report.nodes_collected, report.keys_written, report.keys_cleared, report.suppressed_frames
    );
    if let Some(path) = &args.report {
        let text = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, text).with_context(|| format!("write report '{}'", path.display()))?;
    }

    write_output(args.scene.out.as_deref(), &export_scene_json(&scene)?)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_reset(args: ResetArgs) -> anyhow::Result<ExitCode> {
    let mut scene = load_scene(&args.scene)?;
    let outcome = reset_keyframes(&mut scene, args.start, args.end);
    flush_messages(&mut scene);
    let report = match outcome {
        Outcome::Completed(report) => report,
        Outcome::Rejected(_) => return Ok(ExitCode::from(EXIT_REJECTED)),
    };
    eprintln!("{} key(s) cleared", report.keys_cleared);
    write_output(args.scene.out.as_deref(), &export_scene_json(&scene)?)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_bake(args: BakeArgs) -> anyhow::Result<ExitCode> {
    let scene = load_scene(&args.scene)?;
    let interval = FrameInterval::new(args.start, args.end)?;
    let baked = bake_scene(&scene, interval);
    let text = serde_json::to_string_pretty(&export_baked_json(&baked))?;
    write_output(args.scene.out.as_deref(), &text)?;
    Ok(ExitCode::SUCCESS)
}
