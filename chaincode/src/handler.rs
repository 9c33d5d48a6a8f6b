//! Entry points and the account operations behind them.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use balance_transfer_common::{Account, AccountName, ChaincodeError, Response, Result};
use balance_transfer_ledger::StateStore;

use crate::args;
use crate::config::ChaincodeConfig;
use crate::function::Function;
use crate::invocation::Invocation;
use crate::metrics::{Metrics, SharedMetrics};
use crate::query;

/// Entry points the host calls.
#[async_trait]
pub trait Chaincode: Send + Sync {
    /// Called once when the chaincode is instantiated or upgraded.
    async fn init(&self, stub: &mut dyn StateStore) -> Response;

    /// Called for every transaction proposal.
    async fn invoke(&self, stub: &mut dyn StateStore, function: &str, args: &[String])
        -> Response;

    /// Invoke using the `{"Args":[...]}` form.
    async fn call(&self, stub: &mut dyn StateStore, invocation: &Invocation) -> Response {
        self.invoke(stub, invocation.function_name(), invocation.params())
            .await
    }
}

/// The account chaincode.
pub struct AccountChaincode {
    config: ChaincodeConfig,
    metrics: SharedMetrics,
}

impl AccountChaincode {
    /// Create a chaincode with its own metrics.
    pub fn new(config: ChaincodeConfig) -> Self {
        Self::with_metrics(config, Arc::new(Metrics::new()))
    }

    /// Create a chaincode reporting into shared metrics.
    pub fn with_metrics(config: ChaincodeConfig, metrics: SharedMetrics) -> Self {
        Self { config, metrics }
    }

    /// Get configuration.
    pub fn config(&self) -> &ChaincodeConfig {
        &self.config
    }

    /// Get metrics.
    pub fn metrics(&self) -> &SharedMetrics {
        &self.metrics
    }

    #[instrument(
        name = "invoke",
        skip(self, stub, args),
        fields(tx_id = %stub.tx_id(), channel = %stub.context().channel_id)
    )]
    fn dispatch(&self, stub: &mut dyn StateStore, function: &str, args: &[String]) -> Response {
        let (label, result) = match function.parse::<Function>() {
            Ok(resolved) => (Some(resolved.as_str()), self.execute(stub, resolved, args)),
            Err(e) => (None, Err(e)),
        };

        match result {
            Ok(payload) => {
                self.metrics.record_success(label);
                debug!(payload_len = payload.len(), "Invocation succeeded");
                Response::success(payload)
            }
            Err(e) => {
                self.metrics.record_failure(label, e.error_code());
                warn!(code = e.error_code(), error = %e, "Invocation failed");
                Response::from(e)
            }
        }
    }

    fn execute(
        &self,
        stub: &mut dyn StateStore,
        function: Function,
        args: &[String],
    ) -> Result<Vec<u8>> {
        match function {
            Function::CreateAccount => self.create_account(stub, args).map(|()| Vec::new()),
            Function::GetAccount => self.get_account(stub, args),
            Function::Transfer => self.transfer(stub, args).map(|()| Vec::new()),
            Function::Query => self.query(stub, args),
        }
    }

    /// `createaccount(id, name, balance)`.
    fn create_account(&self, stub: &mut dyn StateStore, args: &[String]) -> Result<()> {
        args::expect_exactly(args, 3)?;
        let account_id = args::non_empty(args, 0)?;
        let name = AccountName::new(args::non_empty(args, 1)?);
        args::non_empty(args, 2)?;
        let balance = args::integer(args, 2)?;

        if stub.get_state(name.storage_key())?.is_some() {
            return Err(ChaincodeError::AccountExists(name));
        }

        let account = Account::new(account_id, name, balance);
        stub.put_state(account.name.storage_key(), account.to_bytes()?)?;

        info!(
            account = %account.name,
            account_id = %account.account_id,
            balance,
            "Account created"
        );
        Ok(())
    }

    /// `getaccount(name)`: the stored record, byte for byte.
    fn get_account(&self, stub: &mut dyn StateStore, args: &[String]) -> Result<Vec<u8>> {
        args::expect_exactly(args, 1)?;
        let name = AccountName::new(&args[0]);

        match stub.get_state(name.storage_key())? {
            Some(bytes) => Ok(bytes),
            None => Err(ChaincodeError::AccountNotFound(name)),
        }
    }

    /// `transfer(source, destination, amount)`.
    ///
    /// Both records are read and the new balances computed before anything
    /// is written, so a missing account or an overflow leaves the write set
    /// empty.
    fn transfer(&self, stub: &mut dyn StateStore, args: &[String]) -> Result<()> {
        args::expect_at_least(args, 3)?;
        let source = AccountName::new(&args[0]);
        let destination = AccountName::new(&args[1]);
        let amount = args::integer(args, 2)?;

        let mut from = load_account(stub, &source)?;

        if source == destination {
            stub.put_state(source.storage_key(), from.to_bytes()?)?;
            info!(account = %source, amount, "Self-transfer recorded");
            return Ok(());
        }

        let mut to = load_account(stub, &destination)?;
        from.debit(amount)?;
        to.credit(amount)?;

        stub.put_state(source.storage_key(), from.to_bytes()?)?;
        stub.put_state(destination.storage_key(), to.to_bytes()?)?;

        info!(
            from = %source,
            to = %destination,
            amount,
            from_balance = from.balance,
            to_balance = to.balance,
            "Transfer applied"
        );
        Ok(())
    }

    /// `query(expression)`.
    fn query(&self, stub: &mut dyn StateStore, args: &[String]) -> Result<Vec<u8>> {
        args::expect_at_least(args, 1)?;
        query::query_result_for_query_string(stub, &args[0])
    }
}

fn load_account(stub: &dyn StateStore, name: &AccountName) -> Result<Account> {
    let bytes = stub
        .get_state(name.storage_key())?
        .ok_or_else(|| ChaincodeError::AccountNotFound(name.clone()))?;
    Account::from_bytes(name.storage_key(), &bytes)
}

#[async_trait]
impl Chaincode for AccountChaincode {
    async fn init(&self, stub: &mut dyn StateStore) -> Response {
        info!(
            chaincode = %self.config.name,
            version = %self.config.version,
            tx_id = %stub.tx_id(),
            "Instantiating AccountChaincode"
        );
        Response::success(Vec::new())
    }

    async fn invoke(
        &self,
        stub: &mut dyn StateStore,
        function: &str,
        args: &[String],
    ) -> Response {
        self.dispatch(stub, function, args)
    }
}
