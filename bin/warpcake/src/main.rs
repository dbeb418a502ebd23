//! warpcake deploys warp routes across chains and enrolls every route with the
//! routers of all the other chains.

mod cli;
mod report;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use warpcake_deploy::{
    ChainMap, DEPLOYMENT_STATE_FILENAME, DeploymentPlan, DeploymentSnapshot, DeploymentState,
    DryRunBackend, OrchestratorSettings, WarpDeploymentRecord, WarpOrchestrator, WarpRouteConfig,
    records_from_snapshot,
};

use cli::{Cli, Command, DeployArgs, DeploySingleArgs, PlanArgs, ResumeArgs};

/// Output directory used when neither the plan nor the CLI sets one.
const DEFAULT_OUTDATA: &str = "data_warpcake";

type DryRunOrchestrator = WarpOrchestrator<DryRunBackend, DryRunBackend, DryRunBackend>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize the logger.
    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .init();

    match cli.command {
        Command::Validate(args) => validate(args),
        Command::Deploy(args) => deploy(args).await,
        Command::DeploySingle(args) => deploy_single(args).await,
        Command::Resume(args) => resume(args).await,
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "warpcake", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn validate(args: PlanArgs) -> Result<()> {
    let plan = DeploymentPlan::load_from_file(&args.plan)?;
    let registry = plan.registry();

    println!("{}", report::routes_table(&plan.routes, &registry));

    plan.validate()?;

    for chain in plan.routes.keys() {
        if !registry.is_deployable(chain) {
            tracing::warn!(chain = %chain, "Protocol of chain does not support warp route deployment");
        }
    }

    tracing::info!(routes = plan.routes.len(), "Deployment plan is valid");
    Ok(())
}

async fn deploy(args: DeployArgs) -> Result<()> {
    let (plan, outdata, orchestrator) = prepare(&args)?;
    let routes = plan.normalized_routes();

    tracing::info!(
        plan = %args.plan.plan.display(),
        outdata = %outdata.display(),
        chains = ?routes.keys().collect::<Vec<_>>(),
        "Deploying warp routes..."
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel_on_ctrl_c(cancel.clone());
    let progress = report::spawn_progress(&orchestrator.tracker());

    let result = orchestrator
        .deploy_with_cancel(&routes, &plan.wallets, cancel)
        .await;

    progress.abort();
    ctrl_c.abort();

    let snapshot = orchestrator.tracker().snapshot();
    println!("{}", report::status_table(&snapshot));
    save_state(&outdata, &routes, snapshot)?;

    let addresses = result?;
    tracing::info!(addresses = ?addresses, "Warp route mesh deployed");
    Ok(())
}

async fn deploy_single(args: DeploySingleArgs) -> Result<()> {
    let (plan, outdata, orchestrator) = prepare(&args.deploy)?;
    let chain = args.chain;

    let route = plan.route(&chain)?.normalize_addresses();
    let wallet = plan
        .wallets
        .get(&chain)
        .context(format!("No wallet configured for {chain}"))?;

    let result = orchestrator.deploy_single(&chain, &route, wallet).await;

    let snapshot = orchestrator.tracker().snapshot();
    println!("{}", report::status_table(&snapshot));

    let result = match result {
        Ok(result) => result,
        Err(err) => {
            save_state(&outdata, &ChainMap::from([(chain, route)]), snapshot)?;
            return Err(err.into());
        }
    };

    let record = WarpDeploymentRecord::new(
        result.chain,
        result.address,
        result.config,
        result.timestamp,
        result.tx_hashes,
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&record).context("Failed to serialize deployment record")?
    );

    std::fs::create_dir_all(&outdata)
        .context(format!("Failed to create {}", outdata.display()))?;
    DeploymentState {
        snapshot,
        records: vec![record],
    }
    .save_to_file(&outdata.join(DEPLOYMENT_STATE_FILENAME))?;

    Ok(())
}

async fn resume(args: ResumeArgs) -> Result<()> {
    let (plan, outdata, orchestrator) = prepare(&args.deploy)?;
    let routes = plan.normalized_routes();

    let state_path = args
        .state
        .unwrap_or_else(|| outdata.join(DEPLOYMENT_STATE_FILENAME));
    let state = DeploymentState::load_from_file(&state_path)?;

    tracing::info!(
        state = %state_path.display(),
        chains = ?routes.keys().collect::<Vec<_>>(),
        "Resuming remote router enrollment..."
    );

    let cancel = CancellationToken::new();
    let ctrl_c = cancel_on_ctrl_c(cancel.clone());
    let progress = report::spawn_progress(&orchestrator.tracker());

    let result = orchestrator
        .resume_enrollment(&routes, &plan.wallets, state.snapshot, cancel)
        .await;

    progress.abort();
    ctrl_c.abort();

    let snapshot = orchestrator.tracker().snapshot();
    println!("{}", report::status_table(&snapshot));
    save_state(&outdata, &routes, snapshot)?;

    result?;
    tracing::info!("Remote router enrollment resumed and complete");
    Ok(())
}

/// Load the plan and build an orchestrator over the dry-run backend.
fn prepare(args: &DeployArgs) -> Result<(DeploymentPlan, PathBuf, DryRunOrchestrator)> {
    let plan = DeploymentPlan::load_from_file(&args.plan.plan)?;

    let outdata = args
        .outdata
        .clone()
        .or_else(|| plan.outdata.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTDATA));

    let settings = settings_from_env(plan.orchestrator.clone())?;
    tracing::debug!(settings = ?settings, "Orchestrator settings");

    let mut backend = DryRunBackend::new(plan.dry_run.clone());
    if args.latency_ms > 0 {
        backend = backend.with_latency(Duration::from_millis(args.latency_ms));
    }

    let orchestrator = WarpOrchestrator::new(
        plan.registry(),
        backend.clone(),
        backend.clone(),
        backend,
        settings,
    );

    Ok((plan, outdata, orchestrator))
}

/// Overlay `WARPCAKE_*` environment variables on the plan's settings.
fn settings_from_env(base: OrchestratorSettings) -> Result<OrchestratorSettings> {
    Figment::from(Serialized::defaults(base))
        .merge(Env::prefixed("WARPCAKE_"))
        .extract()
        .context("Failed to read orchestrator settings from the environment")
}

fn cancel_on_ctrl_c(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, cancelling deployment...");
            cancel.cancel();
        }
    })
}

/// Write the deployment state and its records to the output directory.
fn save_state(
    outdata: &Path,
    routes: &ChainMap<WarpRouteConfig>,
    snapshot: DeploymentSnapshot,
) -> Result<()> {
    std::fs::create_dir_all(outdata)
        .context(format!("Failed to create {}", outdata.display()))?;

    let records = records_from_snapshot(routes, &snapshot, chrono::Utc::now().timestamp_millis());
    DeploymentState { snapshot, records }.save_to_file(&outdata.join(DEPLOYMENT_STATE_FILENAME))
}
