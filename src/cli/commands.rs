//! CLI commands for the admin toolkit
//!
//! Each handler resolves the deployed contract and the network's Safe, then
//! drives the matching workflow.

use alloy_primitives::{Address, Bytes};
use tokio_util::sync::CancellationToken;

use crate::config::AdminConfig;
use crate::deployment::{DeployedContract, DeploymentRecord, SafeConfig, CRYPTOART_CONTRACT};
use crate::network::Session;
use crate::safe::{contract_owner, encode_transfer_ownership, HttpSafeService};
use crate::workflow::{transfer_ownership_direct, ExecutionOutcome, MultisigWorkflow, WorkflowOutcome};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Everything a command needs, resolved once at startup
pub struct AppContext {
    pub config: AdminConfig,
    pub session: Session,
    pub service: HttpSafeService,
    pub deployments: DeploymentRecord,
    pub safes: SafeConfig,
    pub cancel: CancellationToken,
}

impl AppContext {
    /// Bootstrap the session, then load the deployment files
    pub fn new(network_id: &str, config: AdminConfig, cancel: CancellationToken) -> CliResult<Self> {
        let session = Session::bootstrap(network_id, &config)?;
        let service = HttpSafeService::new(session.network().safe_service_url());
        let deployments = DeploymentRecord::load(&config.deployments_path)?;
        let safes = SafeConfig::load(&config.safe_config_path)?;

        Ok(Self {
            config,
            session,
            service,
            deployments,
            safes,
            cancel,
        })
    }

    /// The deployed CryptoArt contract on the session network
    pub fn contract(&self) -> CliResult<DeployedContract> {
        Ok(self
            .deployments
            .contract(self.session.network().chain_id(), CRYPTOART_CONTRACT)?)
    }

    /// The Safe configured for the network the contract is deployed on
    pub fn safe(&self, contract: &DeployedContract) -> CliResult<Address> {
        Ok(self.safes.safe_address(&contract.network_name)?)
    }

    fn workflow(&self) -> MultisigWorkflow<'_, crate::network::HttpNodeClient, HttpSafeService> {
        let policy = self.config.poll_policy().with_cancellation(self.cancel.clone());
        MultisigWorkflow::new(&self.session, &self.service, policy)
            .allow_nonce_reuse(self.config.allow_nonce_reuse)
    }
}

/// Print the current owner of the contract
pub async fn cmd_owner(ctx: &AppContext) -> CliResult<()> {
    let contract = ctx.contract()?;
    let owner = contract_owner(ctx.session.node(), contract.address).await?;

    println!("📜 CryptoArt on {}", contract.network_name);
    println!("   ├─ Address: {}", contract.address);
    println!("   └─ Owner:   {}", owner);

    Ok(())
}

/// Hand ownership from the signer to the Safe
pub async fn cmd_transfer_to_safe(ctx: &AppContext) -> CliResult<()> {
    let contract = ctx.contract()?;
    let safe = ctx.safe(&contract)?;

    println!("🔑 Transferring ownership of {} to Safe {}", contract.address, safe);
    let transfer = transfer_ownership_direct(&ctx.session, contract.address, safe).await?;

    println!("✅ Transaction sent!");
    println!("   ├─ Previous owner: {}", transfer.previous_owner);
    println!("   ├─ New owner:      {}", transfer.new_owner);
    println!("   └─ Hash:           {}", transfer.tx_hash);

    Ok(())
}

/// Hand ownership from the Safe back to the signer
pub async fn cmd_transfer_from_safe(ctx: &AppContext) -> CliResult<()> {
    let contract = ctx.contract()?;
    let safe = ctx.safe(&contract)?;
    let data = encode_transfer_ownership(ctx.session.address());

    println!(
        "🔐 Proposing ownership transfer of {} from Safe {} to {}",
        contract.address,
        safe,
        ctx.session.address()
    );
    let outcome = ctx.workflow().run(safe, contract.address, data).await?;
    report_outcome(&outcome)
}

/// Run an arbitrary call through the Safe
pub async fn cmd_propose(ctx: &AppContext, to: &str, data: &str) -> CliResult<()> {
    let contract = ctx.contract()?;
    let safe = ctx.safe(&contract)?;
    let to: Address = to.parse()?;
    let data = Bytes::from(hex::decode(data.trim_start_matches("0x"))?);

    println!("🔐 Proposing call to {} from Safe {}", to, safe);
    let outcome = ctx.workflow().run(safe, to, data).await?;
    report_outcome(&outcome)
}

/// Print the outcome; a reverted execution is an error
fn report_outcome(outcome: &WorkflowOutcome) -> CliResult<()> {
    println!("\n   Safe transaction {}", outcome.safe_tx_hash);
    for signer in &outcome.signers {
        println!("   ├─ Signed by {}", signer);
    }

    match &outcome.execution {
        ExecutionOutcome::Executed {
            tx_hash,
            success: true,
            ..
        } => {
            println!("   └─ Executed in {}", tx_hash);
            println!("\n✅ Done!");
            Ok(())
        }
        ExecutionOutcome::Executed { tx_hash, .. } => {
            println!("   └─ Reverted in {}", tx_hash);
            println!("\n❌ Execution failed");
            Err(format!("execTransaction {} reverted", tx_hash).into())
        }
        ExecutionOutcome::Skipped { reason } => {
            println!("   └─ Not executed: {}", reason);
            println!("\n⚠️  The proposal is fully signed and can be executed later");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    fn outcome(execution: ExecutionOutcome) -> WorkflowOutcome {
        WorkflowOutcome {
            safe_tx_hash: B256::repeat_byte(0x11),
            signers: vec![Address::repeat_byte(0x01), Address::repeat_byte(0x02)],
            execution,
        }
    }

    #[test]
    fn test_reverted_execution_is_error() {
        let reverted = outcome(ExecutionOutcome::Executed {
            tx_hash: B256::repeat_byte(0x22),
            service_tx_hash: None,
            success: false,
        });
        let err = report_outcome(&reverted).unwrap_err();
        assert!(err.to_string().contains("reverted"));
    }

    #[test]
    fn test_successful_or_skipped_execution_is_ok() {
        let executed = outcome(ExecutionOutcome::Executed {
            tx_hash: B256::repeat_byte(0x22),
            service_tx_hash: Some(B256::repeat_byte(0x22)),
            success: true,
        });
        assert!(report_outcome(&executed).is_ok());

        let skipped = outcome(ExecutionOutcome::Skipped {
            reason: "invalid gas price None".to_string(),
        });
        assert!(report_outcome(&skipped).is_ok());
    }
}
