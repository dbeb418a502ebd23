//! Contracts of the external collaborators driven by the orchestrator.
//!
//! The orchestrator never talks to a chain directly. It asks a [`SignerResolver`]
//! for a signing capability per chain, hands every config to a [`WarpDeployer`]
//! in one batch, and finally enrolls remote routers through the
//! [`RouterModule`] built by a [`RouterModuleFactory`].
//!
//! # Example
//!
//! ```no_run
//! use warpcake_deploy::{
//!     ChainRegistry, DryRunBackend, OrchestratorSettings, WarpOrchestrator,
//! };
//!
//! let backend = DryRunBackend::default();
//! let orchestrator = WarpOrchestrator::new(
//!     ChainRegistry::default(),
//!     backend.clone(),
//!     backend.clone(),
//!     backend,
//!     OrchestratorSettings::default(),
//! );
//! ```

mod deployer;
mod router;
mod signer;

pub use deployer::WarpDeployer;
pub use router::{DeployedRoute, RouterModule, RouterModuleFactory, SubmittedTx};
pub use signer::SignerResolver;
