//! Realize a [`StackPlan`] and compute its outputs.

use super::output::Output;
use super::provider::{CloudProvider, SshKey};
use super::{DropletSpec, StackPlan};
use crate::error::Result;
use crate::inventory;
use crate::state::StackOutputs;
use std::sync::Arc;
use tracing::{info, warn};

/// Create every resource of `plan` and return the published outputs.
///
/// The SSH key is created first; every droplet depends on it. Droplets are
/// then created and polled concurrently. The inventory is projected only
/// once the master address and all worker addresses are known, with
/// workers kept in plan order.
///
/// The first failure aborts the run. Resources already created are left in
/// place.
pub async fn deploy(plan: &StackPlan, provider: Arc<dyn CloudProvider>) -> Result<StackOutputs> {
    info!(
        "Deploying {} resources with {}",
        plan.resource_count(),
        provider.name()
    );

    let ssh_key = {
        let provider = Arc::clone(&provider);
        let spec = plan.ssh_key.clone();
        Output::from_future(async move { provider.create_ssh_key(&spec).await })
    };

    let master_ip = droplet_address(&provider, &ssh_key, plan.master.clone());
    let worker_ips = Output::all(
        plan.workers
            .iter()
            .map(|spec| droplet_address(&provider, &ssh_key, spec.clone())),
    );

    let ansible_inventory = master_ip
        .zip(&worker_ips)
        .apply(|(master, workers)| inventory::project(&master, &workers))
        .and_then(|document| async move { document.to_json_pretty() });

    let ssh_key_id = ssh_key.apply(|key| key.id.to_string());

    let resolved = futures::try_join!(
        master_ip.resolve(),
        worker_ips.resolve(),
        ansible_inventory.resolve(),
        ssh_key_id.resolve(),
    );

    let (master_ip, worker_ips, ansible_inventory, ssh_key_id) = match resolved {
        Ok(outputs) => outputs,
        Err(e) => {
            warn!("Deployment failed; resources created so far were not removed");
            return Err(e);
        }
    };

    Ok(StackOutputs {
        master_ip,
        worker_ips,
        ansible_inventory,
        ssh_key_id,
    })
}

fn droplet_address(
    provider: &Arc<dyn CloudProvider>,
    ssh_key: &Output<SshKey>,
    spec: DropletSpec,
) -> Output<String> {
    let provider = Arc::clone(provider);
    ssh_key.and_then(move |key| async move {
        let droplet = provider.create_droplet(&spec, &[key.id]).await?;
        provider.droplet_ipv4(&droplet).await
    })
}
