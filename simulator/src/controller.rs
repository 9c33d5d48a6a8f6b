//! Simulation controller.

use std::time::Instant;

use anyhow::{bail, Context};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use balance_transfer_chaincode::{AccountChaincode, Chaincode, ChaincodeConfig, Invocation};
use balance_transfer_common::{Account, Response};
use balance_transfer_ledger::{MemoryStore, ScopedCursor, StateStore};

use crate::metrics::SimulationMetrics;
use crate::scenario::{Scenario, ScenarioStep};

/// Destination used by random runs to exercise rejected transfers.
const MISSING_ACCOUNT: &str = "nobody";

/// Microseconds since `started`, saturating at `u64::MAX`.
fn elapsed_us(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX)
}

/// Plays the host: owns world state and commits successful invocations.
pub struct SimulationController {
    /// Committed world state.
    store: MemoryStore,
    /// Chaincode under test.
    chaincode: AccountChaincode,
    /// Random number generator.
    rng: StdRng,
    /// Simulation metrics.
    metrics: SimulationMetrics,
}

impl SimulationController {
    /// Create a new simulation controller.
    pub fn new(config: ChaincodeConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            store: MemoryStore::new(config.channel_id.clone()),
            chaincode: AccountChaincode::new(config),
            rng,
            metrics: SimulationMetrics::new(),
        }
    }

    /// Instantiate the chaincode.
    pub async fn initialize(&mut self) -> anyhow::Result<()> {
        let mut tx = self.store.begin();
        let response = self.chaincode.init(&mut tx).await;
        if !response.is_ok() {
            bail!("Chaincode init failed: {}", response.message);
        }
        tx.commit();
        Ok(())
    }

    /// Submit a transaction, committing its write set if it succeeds.
    async fn submit(&mut self, invocation: &Invocation) -> Response {
        let started = Instant::now();
        let mut tx = self.store.begin();
        let response = self.chaincode.call(&mut tx, invocation).await;
        let latency_us = elapsed_us(started);

        if response.is_ok() {
            let writes = tx.commit();
            self.metrics.record_commit(latency_us);
            info!(args = ?invocation.args, writes, "Transaction committed");
        } else {
            tx.rollback();
            self.metrics.record_rejection(latency_us);
            info!(
                args = ?invocation.args,
                code = response.code.as_deref().unwrap_or_default(),
                message = %response.message,
                "Transaction rejected"
            );
        }
        response
    }

    /// Evaluate an invocation without committing anything.
    async fn evaluate(&self, invocation: &Invocation) -> Response {
        let mut tx = self.store.begin();
        let response = self.chaincode.call(&mut tx, invocation).await;
        tx.rollback();
        response
    }

    /// Run a scenario, stopping at the first failed step.
    pub async fn run_scenario(&mut self, scenario: &Scenario) -> anyhow::Result<()> {
        info!(
            scenario = %scenario.name,
            description = %scenario.description,
            steps = scenario.steps.len(),
            "Running scenario"
        );

        for (index, step) in scenario.steps.iter().enumerate() {
            self.execute_step(step)
                .await
                .with_context(|| format!("Step {} of scenario {} failed", index + 1, scenario.name))?;
        }

        Ok(())
    }

    /// Execute a single scenario step.
    async fn execute_step(&mut self, step: &ScenarioStep) -> anyhow::Result<()> {
        match step {
            ScenarioStep::Invoke { args } => {
                let response = self.submit(&Invocation { args: args.clone() }).await;
                if !response.is_ok() {
                    bail!("Invocation {:?} failed: {}", args, response.message);
                }
            }
            ScenarioStep::Query { args } => {
                let response = self.evaluate(&Invocation { args: args.clone() }).await;
                if !response.is_ok() {
                    bail!("Query {:?} failed: {}", args, response.message);
                }
                info!(args = ?args, payload = %response.payload_str(), "Query result");
            }
            ScenarioStep::AssertBalance { name, balance } => {
                let actual = self.balance_of(name).await?;
                if actual != *balance {
                    bail!("Balance of {name} is {actual}, expected {balance}");
                }
                self.metrics.record_assertion();
                info!(account = %name, balance, "Balance assertion passed");
            }
            ScenarioStep::AssertFailure { args, code } => {
                let response = self.evaluate(&Invocation { args: args.clone() }).await;
                if response.is_ok() {
                    bail!("Invocation {:?} succeeded, expected failure", args);
                }
                if let Some(expected) = code {
                    if response.code.as_deref() != Some(expected.as_str()) {
                        bail!(
                            "Invocation {:?} failed with {:?}, expected {}",
                            args,
                            response.code,
                            expected
                        );
                    }
                }
                self.metrics.record_assertion();
                info!(args = ?args, message = %response.message, "Failure assertion passed");
            }
        }

        Ok(())
    }

    async fn balance_of(&self, name: &str) -> anyhow::Result<i64> {
        let response = self
            .evaluate(&Invocation::new("getaccount", [name]))
            .await;
        if !response.is_ok() {
            bail!("Cannot read account {name}: {}", response.message);
        }
        let account = Account::from_bytes(name, &response.payload)?;
        Ok(account.balance)
    }

    /// Create `accounts` accounts and run `transfers` random transfers
    /// between them. Roughly one transfer in ten targets a missing account
    /// and must be rejected without changing the total.
    pub async fn run_random(&mut self, accounts: usize, transfers: usize) -> anyhow::Result<()> {
        if accounts < 2 {
            bail!("Random runs need at least 2 accounts, got {accounts}");
        }
        info!(accounts, transfers, "Running random transfers");

        let names: Vec<String> = (0..accounts).map(|i| format!("account{i:03}")).collect();
        for (i, name) in names.iter().enumerate() {
            let balance = self.rng.gen_range(0..1_000i64).to_string();
            let id = format!("ID{i:05}");
            let invocation = Invocation::new(
                "createaccount",
                [id.as_str(), name.as_str(), balance.as_str()],
            );
            let response = self.submit(&invocation).await;
            if !response.is_ok() {
                bail!("Could not create {name}: {}", response.message);
            }
        }

        let total_before = self.total_balance()?;

        for _ in 0..transfers {
            let from = &names[self.rng.gen_range(0..names.len())];
            let to = if self.rng.gen_ratio(1, 10) {
                MISSING_ACCOUNT
            } else {
                names[self.rng.gen_range(0..names.len())].as_str()
            };
            let amount = self.rng.gen_range(1..=500i64).to_string();

            let invocation = Invocation::new("transfer", [from.as_str(), to, amount.as_str()]);
            let response = self.submit(&invocation).await;
            if response.is_ok() == (to == MISSING_ACCOUNT) {
                warn!(args = ?invocation.args, "Unexpected transfer outcome");
                bail!("Transfer {:?} returned status {}", invocation.args, response.status);
            }
        }

        let total_after = self.total_balance()?;
        if total_before != total_after {
            bail!("Total balance changed from {total_before} to {total_after}");
        }
        info!(total = total_after, "Total balance conserved");
        Ok(())
    }

    /// All accounts in key order, read with a range scan.
    pub fn dump_state(&self) -> anyhow::Result<Vec<Account>> {
        let tx = self.store.begin();
        let cursor = ScopedCursor::new(tx.get_state_by_range("", "")?);

        let mut accounts = Vec::new();
        for entry in cursor {
            let entry = entry?;
            accounts.push(Account::from_bytes(&entry.key, &entry.value)?);
        }
        Ok(accounts)
    }

    fn total_balance(&self) -> anyhow::Result<i64> {
        self.dump_state()?
            .iter()
            .try_fold(0i64, |sum, account| sum.checked_add(account.balance))
            .context("Total balance overflows")
    }

    /// Get simulation metrics.
    pub fn metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }

    /// Get chaincode.
    pub fn chaincode(&self) -> &AccountChaincode {
        &self.chaincode
    }
}
