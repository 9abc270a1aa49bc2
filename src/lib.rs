//! # kubelab - A Kubernetes Lab on DigitalOcean
//!
//! kubelab declares the droplets for a small Kubernetes lab (one master and
//! a handful of workers), creates them on DigitalOcean, and produces the
//! Ansible inventory that the kubeadm playbooks run against.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────┐     ┌──────────────────────┐
//! │      LabConfig       │────>│      StackPlan       │
//! │ (Kubelab.<stack>.yaml│     │ (ssh key + droplets) │
//! │   + KUBELAB_* env)   │     └──────────────────────┘
//! └──────────────────────┘                │ deploy
//!                                         ▼
//!                              ┌──────────────────────┐
//!                              │    CloudProvider     │
//!                              │    (DigitalOcean)    │
//!                              └──────────────────────┘
//!                                         │ addresses
//!                                         ▼
//!                              ┌──────────────────────┐
//!                              │     StackOutputs     │──> .kubelab/stacks/<stack>.json
//!                              └──────────────────────┘
//!                                         │ <tool> stack output --json
//!                                         ▼
//!                              ┌──────────────────────┐
//!                              │     Materializer     │──> dynamic.json
//!                              └──────────────────────┘
//! ```
//!
//! Both the provisioning path and the materializer build the inventory with
//! [`inventory::project`], so the published `ansible_inventory` output and a
//! reconstructed one are identical for the same addresses.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use kubelab::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = LabConfig::load(None, "dev")?;
//!     let plan = StackPlan::declare(&config)?;
//!     let provider = Arc::new(DigitalOcean::new(&config.provider)?);
//!
//!     let outputs = deploy(&plan, provider).await?;
//!     StateStore::default().save(&StackState::new("dev", outputs))?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod prelude {
    //! Convenient re-exports of commonly used types.

    pub use crate::config::{ConfigSource, LabConfig, ProviderSettings};
    pub use crate::error::{Error, Result};
    pub use crate::inventory::{project, InventoryDocument};
    pub use crate::materialize::{
        resolve_inventory, InventoryOrigin, Materializer, StackOutputSource, ToolCommand,
    };
    pub use crate::provision::{deploy, CloudProvider, DigitalOcean, Output, StackPlan};
    pub use crate::state::{StackOutputs, StackState, StateStore};
}

pub mod config;
pub mod error;
pub mod inventory;
pub mod materialize;
pub mod provision;
pub mod state;

pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
