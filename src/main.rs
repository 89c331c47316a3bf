use anyhow::{bail, Result};
use clap::Parser;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use subspace_explainer::scorer::{HttpScorer, WorkerScorer};
use subspace_explainer::{
    Aggregation, CausalModel, Change, Dataset, DiffMode, EditingGroup, ExecutionMode, ExplainerConfig,
    ExplorerSession, Filter, ScorerRouter, SubmitOutcome,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "subspace-explainer")]
#[command(about = "Explain the difference of a field between two subspaces of a dataset")]
struct Args {
    /// Dataset rows (.json array of objects or .csv)
    #[arg(long)]
    data: PathBuf,

    /// Field metadata (.json array)
    #[arg(long)]
    fields: PathBuf,

    /// Causal model with `funcDeps` and `edges` (.json)
    #[arg(long)]
    causal_model: Option<PathBuf>,

    /// Target field whose aggregate is compared
    #[arg(long)]
    main_field: String,

    /// sum, mean, count or none
    #[arg(long, default_value = "count")]
    aggregation: String,

    /// full, other or two-group
    #[arg(long, default_value = "full")]
    diff_mode: DiffMode,

    /// Foreground filter: `fid=a,b,c` (set) or `fid:lo..hi` (range)
    #[arg(long, value_parser = parse_filter)]
    filter: Filter,

    /// Background filter, two-group mode only
    #[arg(long, value_parser = parse_filter)]
    background_filter: Option<Filter>,

    /// Entry dimension for detail views
    #[arg(long)]
    index_key: Option<String>,

    /// worker or server (default from EXPLAINER_EXECUTION_MODE)
    #[arg(long)]
    mode: Option<ExecutionMode>,

    /// Scoring service URL (default from EXPLAINER_SCORER_URL)
    #[arg(long)]
    scorer_url: Option<String>,
}

fn parse_value(raw: &str) -> Value {
    match raw.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => json!(n),
        _ => json!(raw.trim()),
    }
}

fn parse_filter(spec: &str) -> std::result::Result<Filter, String> {
    if let Some((fid, values)) = spec.split_once('=') {
        let values: Vec<Value> = values.split(',').map(parse_value).collect();
        return Ok(Filter::Set {
            fid: fid.trim().to_string(),
            values,
        });
    }
    if let Some((fid, range)) = spec.split_once(':') {
        let (lo, hi) = range
            .split_once("..")
            .ok_or_else(|| format!("Range filter must look like fid:lo..hi, got {}", spec))?;
        let lo: f64 = lo.trim().parse().map_err(|_| format!("Invalid range start: {}", lo))?;
        let hi: f64 = hi.trim().parse().map_err(|_| format!("Invalid range end: {}", hi))?;
        if !lo.is_finite() || !hi.is_finite() {
            return Err(format!("Range bounds must be finite numbers, got {}", spec));
        }
        return Ok(Filter::range(fid.trim(), lo, hi));
    }
    Err(format!("Unrecognized filter: {}", spec))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = ExplainerConfig::from_env()?;
    if let Some(url) = args.scorer_url {
        config.scorer_url = url;
    }
    let mode = args.mode.unwrap_or(config.execution_mode);

    info!("Subspace explainer starting...");
    info!("Main field: {}, diff mode: {}, execution mode: {}", args.main_field, args.diff_mode, mode);

    let dataset = Dataset::load(&args.data, &args.fields)?;
    let causal_model = match &args.causal_model {
        Some(path) => CausalModel::load(path)?,
        None => CausalModel::default(),
    };
    info!("Loaded {} rows, {} fields", dataset.len(), dataset.fields.len());

    let router = ScorerRouter::new()
        .with_worker(Arc::new(WorkerScorer::baseline()))
        .with_server(Arc::new(HttpScorer::from_config(&config)?));

    let mut session = ExplorerSession::new(Arc::new(router));
    session.apply(Change::Dataset(dataset));
    session.apply(Change::CausalModel(causal_model));
    session.apply(Change::MainField(Some(args.main_field)));
    session.apply(Change::Aggregation(Aggregation::parse_optional(&args.aggregation)?));
    session.apply(Change::DiffMode(args.diff_mode));
    session.apply(Change::ExecutionMode(mode));
    session.apply(Change::IndexKey(args.index_key));
    session.apply(Change::Filter(Some(args.filter)));

    if let Some(background) = args.background_filter {
        if args.diff_mode != DiffMode::TwoGroup {
            bail!("--background-filter requires --diff-mode two-group");
        }
        session.apply(Change::EditingGroup(EditingGroup::Background));
        session.apply(Change::Filter(Some(background)));
    }

    match session.explain().await? {
        Some(SubmitOutcome::Failed(e)) => return Err(e.into()),
        Some(SubmitOutcome::Applied) | Some(SubmitOutcome::Skipped) => {}
        Some(SubmitOutcome::Superseded) | None => warn!("No explanation was produced"),
    }

    let state = session.state();
    let output = json!({
        "diffMode": state.diff_mode,
        "indices": {
            "foreground": state.indices.foreground,
            "background": state.indices.background,
        },
        "causalEffects": session.result().causal_effects,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
