//! warpcake-deploy - Multi-chain warp route deployment.
//!
//! This crate deploys a warp route on every chain of a batch and then enrolls
//! each route with the routers of all the other chains, so that tokens can move
//! between any pair of chains in the batch.
//!
//! Chain access goes through the collaborator traits in [`traits`]; the
//! [`WarpOrchestrator`] sequences them and reports per-chain progress through a
//! [`StatusTracker`].

mod address;
pub use address::{is_evm_address, normalize_address};

mod chains;
pub use chains::{ChainMetadata, ChainRegistry, ProtocolType};

mod config;
pub use config::{
    ChainMap, ChainName, DestinationGas, MAX_SYNTHETIC_DECIMALS, ModuleReference, RemoteRouter,
    RemoteRouters, TokenKind, TokenType, WarpRouteConfig,
};

pub mod error;
pub use error::{ConfigValidationError, OrchestrationError, SignerError};

mod mesh;
pub use mesh::remote_routers_for;

mod settings;
pub use settings::{
    DEFAULT_DEPLOY_TIMEOUT_SECS, DEFAULT_ENROLLMENT_TIMEOUT_SECS, DEFAULT_PREPARE_CONCURRENCY,
    DEFAULT_SIGNER_TIMEOUT_SECS, OrchestratorSettings,
};

mod status;
pub use status::{ChainStatus, DeploymentStatus};

mod tracker;
pub use tracker::{DeploymentSnapshot, RunId, StatusTracker};

pub mod traits;
pub use traits::{
    DeployedRoute, RouterModule, RouterModuleFactory, SignerResolver, SubmittedTx, WarpDeployer,
};

mod orchestrator;
pub use orchestrator::{WarpDeployResult, WarpOrchestrator};

mod dry_run;
pub use dry_run::{DryRunBackend, DryRunFaults, DryRunRouter, DryRunSigner, RecordedEnrollment};

mod plan;
pub use plan::{DeploymentPlan, WARP_PLAN_FILENAME};

mod record;
pub use record::{
    DEPLOYMENT_STATE_FILENAME, DeploymentState, WarpDeploymentRecord, record_id,
    records_from_snapshot,
};
