use crate::infra::{load_registry, read_inputs};
use crate::server;
use crate::shell::run_session;
use clap::{Args, Parser, Subcommand};
use pmrt_calc::calculator::{CalculationReport, DataLayout};
use pmrt_calc::config::AppConfig;
use pmrt_calc::error::AppError;
use pmrt_calc::telemetry;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pmrt",
    about = "Estimate the probability of post-mastectomy radiotherapy from a fitted logistic model",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Fill in the form on the terminal, or score a JSON file of answers
    Calculate(CalculateArgs),
    /// List the models found in the data directory
    Models(CalculatorArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct CalculatorArgs {
    /// Directory holding the coefficient, metadata and average tables
    #[arg(long)]
    pub(crate) data_dir: Option<PathBuf>,
    /// Model to use (for example "Logistic Lasso")
    #[arg(long)]
    pub(crate) model: Option<String>,
}

impl CalculatorArgs {
    pub(crate) fn apply(&mut self, config: &mut AppConfig) {
        if let Some(data_dir) = self.data_dir.take() {
            config.calculator.data_dir = data_dir;
        }
        if let Some(model) = self.model.take() {
            config.calculator.model = model;
        }
    }
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[command(flatten)]
    pub(crate) calculator: CalculatorArgs,
}

#[derive(Args, Debug)]
pub(crate) struct CalculateArgs {
    #[command(flatten)]
    pub(crate) calculator: CalculatorArgs,
    /// JSON object of `feature: number` answers; skips the interactive form
    #[arg(long)]
    pub(crate) inputs: Option<PathBuf>,
    /// Print the report as JSON instead of text
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Calculate(args) => run_calculate(args),
        Command::Models(args) => run_models(args),
    }
}

fn load_config(args: &mut CalculatorArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    args.apply(&mut config);
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

fn run_calculate(mut args: CalculateArgs) -> Result<(), AppError> {
    let config = load_config(&mut args.calculator)?;
    let registry = load_registry(&config.calculator.data_dir)?;
    let assets = registry.get(&config.calculator.model)?;
    let variant = &config.calculator.variant;

    let report = match &args.inputs {
        Some(path) => {
            let inputs = read_inputs(path)?;
            let calculation = assets.calculate(variant, &inputs)?;
            CalculationReport::build(&assets, variant, &calculation)?
        }
        None => {
            let stdin = io::stdin();
            match run_session(&assets, variant, stdin.lock(), io::stdout())? {
                Some(report) => report,
                None => return Ok(()),
            }
        }
    };

    let mut stdout = io::stdout().lock();
    if args.json {
        let rendered = serde_json::to_string_pretty(&report).map_err(io::Error::from)?;
        writeln!(stdout, "{rendered}")?;
    } else if args.inputs.is_some() {
        write!(stdout, "{}", report.render_text())?;
    }
    Ok(())
}

fn run_models(mut args: CalculatorArgs) -> Result<(), AppError> {
    let config = load_config(&mut args)?;
    let layout = DataLayout::new(&config.calculator.data_dir);

    let mut stdout = io::stdout().lock();
    for model in layout.available_models()? {
        let marker = if model == config.calculator.model { "*" } else { " " };
        writeln!(stdout, "{marker} {model}")?;
    }
    Ok(())
}
