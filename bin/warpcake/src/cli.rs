use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "warpcake")]
#[command(
    author,
    version,
    about = "Deploy warp routes across chains and wire them into a full mesh"
)]
pub struct Cli {
    /// The verbosity level.
    #[arg(short, long, env = "WARPCAKE_VERBOSITY", default_value_t = LevelFilter::INFO)]
    pub verbosity: LevelFilter,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check a deployment plan without touching any chain.
    Validate(PlanArgs),

    /// Deploy every route of the plan and enroll the remote router mesh.
    Deploy(DeployArgs),

    /// Deploy the route of a single chain, without enrolling remote routers.
    DeploySingle(DeploySingleArgs),

    /// Resume remote router enrollment from a saved deployment state.
    Resume(ResumeArgs),

    /// Print shell completions.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    /// Path to the plan file, or to a directory containing `Warpcake.toml`.
    #[arg(env = "WARPCAKE_PLAN", default_value = ".")]
    pub plan: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct DeployArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// The path to the output data directory.
    ///
    /// Overrides `outdata` from the plan. Defaults to ./data_warpcake
    #[arg(long, env = "WARPCAKE_OUTDATA")]
    pub outdata: Option<PathBuf>,

    /// Simulated latency of every deployment and router update, in milliseconds.
    #[arg(long, env = "WARPCAKE_LATENCY_MS", default_value_t = 0)]
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Args)]
pub struct DeploySingleArgs {
    #[command(flatten)]
    pub deploy: DeployArgs,

    /// The chain to deploy on.
    #[arg(long, env = "WARPCAKE_CHAIN")]
    pub chain: String,
}

#[derive(Debug, Clone, Args)]
pub struct ResumeArgs {
    #[command(flatten)]
    pub deploy: DeployArgs,

    /// Saved deployment state.
    ///
    /// Defaults to deployment-state.json in the output data directory.
    #[arg(long, env = "WARPCAKE_STATE")]
    pub state: Option<PathBuf>,
}
