//! End-to-end behaviour of the account chaincode against the in-memory host.

use balance_transfer_chaincode::{AccountChaincode, Chaincode, ChaincodeConfig};
use balance_transfer_common::{Account, Response};
use balance_transfer_ledger::{MemoryStore, StateQueryIterator, StateStore};
use proptest::prelude::*;

struct Host {
    chaincode: AccountChaincode,
    store: MemoryStore,
}

impl Host {
    fn new() -> Self {
        Self {
            chaincode: AccountChaincode::new(ChaincodeConfig::default()),
            store: MemoryStore::new("mychannel"),
        }
    }

    /// Run one invocation, committing its writes only if it succeeds.
    async fn invoke(&self, function: &str, args: &[&str]) -> Response {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut tx = self.store.begin();
        let response = self.chaincode.invoke(&mut tx, function, &args).await;
        if response.is_ok() {
            tx.commit();
        } else {
            tx.rollback();
        }
        response
    }

    fn account(&self, key: &str) -> Option<Account> {
        self.store
            .get(key)
            .map(|bytes| Account::from_bytes(key, &bytes).unwrap())
    }

    fn balance(&self, key: &str) -> i64 {
        self.account(key).unwrap().balance
    }

    fn total(&self) -> i64 {
        let tx = self.store.begin();
        let mut cursor = tx.get_state_by_range("", "").unwrap();
        let mut sum = 0;
        while cursor.has_next() {
            let entry = cursor.next_entry().unwrap();
            sum += Account::from_bytes(&entry.key, &entry.value).unwrap().balance;
        }
        cursor.close().unwrap();
        sum
    }
}

#[tokio::test]
async fn duplicate_create_is_conflict_and_keeps_record() {
    let host = Host::new();
    assert!(host.invoke("createaccount", &["A1", "alice", "200"]).await.is_ok());

    let response = host.invoke("createaccount", &["A2", "ALICE", "5"]).await;
    assert_eq!(response.code.as_deref(), Some("ACCOUNT_EXISTS"));
    assert_eq!(response.message, "This account already exists: alice");

    let account = host.account("alice").unwrap();
    assert_eq!(account.account_id, "A1");
    assert_eq!(account.balance, 200);
}

#[tokio::test]
async fn invalid_create_writes_nothing() {
    let host = Host::new();
    for args in [
        ["", "alice", "1"],
        ["A1", "", "1"],
        ["A1", "alice", "1.5"],
        ["A1", "alice", "one"],
    ] {
        let response = host.invoke("createaccount", &args).await;
        assert_eq!(response.code.as_deref(), Some("VALIDATION_ERROR"));
    }
    assert!(host.store.is_empty());
}

#[tokio::test]
async fn getaccount_on_missing_name_is_not_found() {
    let host = Host::new();
    let response = host.invoke("getaccount", &["ghost"]).await;
    assert!(!response.is_ok());
    assert_eq!(response.code.as_deref(), Some("ACCOUNT_NOT_FOUND"));
    assert!(response.payload.is_empty());

    let empty = host.invoke("getaccount", &[""]).await;
    assert_eq!(empty.code.as_deref(), Some("ACCOUNT_NOT_FOUND"));
    assert_eq!(empty.message, "Account does not exist: ");
}

#[tokio::test]
async fn created_account_reads_back_lowercased() {
    let host = Host::new();
    host.invoke("createaccount", &["A1", "Alice", "200"]).await;

    let response = host.invoke("getaccount", &["alice"]).await;
    let account: Account = serde_json::from_slice(&response.payload).unwrap();
    assert_eq!(account.account_id, "A1");
    assert_eq!(account.name.as_str(), "alice");
    assert_eq!(account.balance, 200);
}

#[tokio::test]
async fn transfer_moves_amount_without_sign_bound() {
    let host = Host::new();
    host.invoke("createaccount", &["S1", "source", "30"]).await;
    host.invoke("createaccount", &["D1", "dest", "-10"]).await;

    assert!(host.invoke("transfer", &["source", "dest", "100"]).await.is_ok());
    assert_eq!(host.balance("source"), -70);
    assert_eq!(host.balance("dest"), 90);

    assert!(host.invoke("transfer", &["source", "dest", "-20"]).await.is_ok());
    assert_eq!(host.balance("source"), -50);
    assert_eq!(host.balance("dest"), 70);
}

#[tokio::test]
async fn transfer_from_missing_source_leaves_destination() {
    let host = Host::new();
    host.invoke("createaccount", &["D1", "dest", "10"]).await;

    let response = host.invoke("transfer", &["ghost", "dest", "5"]).await;
    assert_eq!(response.code.as_deref(), Some("ACCOUNT_NOT_FOUND"));
    assert_eq!(host.balance("dest"), 10);
}

#[tokio::test]
async fn transfer_to_missing_destination_leaves_source() {
    let host = Host::new();
    host.invoke("createaccount", &["S1", "source", "10"]).await;

    let response = host.invoke("transfer", &["source", "ghost", "5"]).await;
    assert_eq!(response.code.as_deref(), Some("ACCOUNT_NOT_FOUND"));
    assert_eq!(host.balance("source"), 10);
    assert!(host.store.get("ghost").is_none());
}

#[tokio::test]
async fn transfer_argument_errors() {
    let host = Host::new();
    host.invoke("createaccount", &["S1", "source", "10"]).await;
    host.invoke("createaccount", &["D1", "dest", "10"]).await;

    let short = host.invoke("transfer", &["source", "dest"]).await;
    assert_eq!(short.message, "Incorrect number of arguments. Expecting 3");

    let bad_amount = host.invoke("transfer", &["source", "dest", "5x"]).await;
    assert_eq!(bad_amount.code.as_deref(), Some("VALIDATION_ERROR"));

    let empty_name = host.invoke("transfer", &["", "dest", "5"]).await;
    assert_eq!(empty_name.code.as_deref(), Some("ACCOUNT_NOT_FOUND"));

    let empty_destination = host.invoke("transfer", &["source", "", "5"]).await;
    assert_eq!(empty_destination.code.as_deref(), Some("ACCOUNT_NOT_FOUND"));

    assert_eq!(host.balance("source"), 10);
    assert_eq!(host.balance("dest"), 10);
}

#[tokio::test]
async fn match_all_query_returns_every_record_once_in_key_order() {
    let host = Host::new();
    for (id, name, balance) in [("D", "dave", "4"), ("A", "alice", "1"), ("C", "carol", "3")] {
        host.invoke("createaccount", &[id, name, balance]).await;
    }

    let response = host.invoke("query", &[r#"{"selector":{}}"#]).await;
    assert!(response.is_ok());
    let results: Vec<serde_json::Value> = serde_json::from_slice(&response.payload).unwrap();

    let keys: Vec<&str> = results.iter().map(|r| r["Key"].as_str().unwrap()).collect();
    assert_eq!(keys, ["alice", "carol", "dave"]);
    for result in &results {
        assert_eq!(result["Record"]["name"], result["Key"]);
        assert_eq!(result["Record"]["docType"], "account");
    }
    assert_eq!(host.store.open_cursors(), 0);
}

#[tokio::test]
async fn selector_query_filters_by_balance() {
    let host = Host::new();
    host.invoke("createaccount", &["A", "alice", "150"]).await;
    host.invoke("createaccount", &["B", "bob", "50"]).await;
    host.invoke("createaccount", &["C", "carol", "250"]).await;

    let response = host
        .invoke("query", &[r#"{"selector":{"balance":{"$lt":200}}}"#])
        .await;
    let results: Vec<serde_json::Value> = serde_json::from_slice(&response.payload).unwrap();
    let keys: Vec<&str> = results.iter().map(|r| r["Key"].as_str().unwrap()).collect();
    assert_eq!(keys, ["alice", "bob"]);

    let empty = host
        .invoke("query", &[r#"{"selector":{"name":"nobody"}}"#])
        .await;
    assert_eq!(empty.payload, b"[]");
}

#[tokio::test]
async fn malformed_query_is_store_error() {
    let host = Host::new();
    let response = host.invoke("query", &["{not json"]).await;
    assert_eq!(response.code.as_deref(), Some("STORE_ERROR"));

    let response = host.invoke("query", &[]).await;
    assert_eq!(response.code.as_deref(), Some("VALIDATION_ERROR"));
    assert_eq!(host.store.open_cursors(), 0);
}

#[tokio::test]
async fn reads_are_idempotent() {
    let host = Host::new();
    host.invoke("createaccount", &["A", "alice", "150"]).await;
    host.invoke("createaccount", &["B", "bob", "50"]).await;

    let first = host.invoke("getaccount", &["bob"]).await;
    let second = host.invoke("getaccount", &["bob"]).await;
    assert_eq!(first, second);

    let query = r#"{"selector":{"docType":"account"}}"#;
    let first = host.invoke("query", &[query]).await;
    let second = host.invoke("query", &[query]).await;
    assert_eq!(first.payload, second.payload);
}

#[tokio::test]
async fn unknown_function_is_rejected() {
    let host = Host::new();
    let response = host.invoke("mint", &["alice", "1000"]).await;
    assert_eq!(response.code.as_deref(), Some("UNKNOWN_FUNCTION"));
    assert_eq!(response.message, "Received unknown function invocation: mint");
    assert!(host.store.is_empty());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn transfers_conserve_total_balance(
        balances in prop::collection::vec(-1_000_000i64..1_000_000, 2..6),
        transfers in prop::collection::vec((0usize..6, 0usize..6, -10_000i64..10_000), 0..40),
    ) {
        let host = Host::new();
        let names: Vec<String> = (0..balances.len()).map(|i| format!("acct{i}")).collect();

        tokio_test::block_on(async {
            for (name, balance) in names.iter().zip(&balances) {
                let balance = balance.to_string();
                let response = host
                    .invoke("createaccount", &["ID", name.as_str(), balance.as_str()])
                    .await;
                assert!(response.is_ok());
            }

            for (from, to, amount) in &transfers {
                let from = &names[from % names.len()];
                let to = &names[to % names.len()];
                let amount = amount.to_string();
                let response = host
                    .invoke("transfer", &[from.as_str(), to.as_str(), amount.as_str()])
                    .await;
                assert!(response.is_ok());
            }
        });

        prop_assert_eq!(host.total(), balances.iter().sum::<i64>());
        prop_assert_eq!(host.store.open_cursors(), 0);
    }

    #[test]
    fn query_output_is_well_formed_json(
        balances in prop::collection::vec(-500i64..500, 0..8),
        threshold in -500i64..500,
    ) {
        let host = Host::new();
        let query = format!(r#"{{"selector":{{"balance":{{"$gte":{threshold}}}}}}}"#);

        let response = tokio_test::block_on(async {
            for (i, balance) in balances.iter().enumerate() {
                let name = format!("acct{i:02}");
                let balance = balance.to_string();
                host.invoke("createaccount", &["ID", name.as_str(), balance.as_str()]).await;
            }
            host.invoke("query", &[query.as_str()]).await
        });

        let results: Vec<serde_json::Value> = serde_json::from_slice(&response.payload).unwrap();
        let expected = balances.iter().filter(|b| **b >= threshold).count();
        prop_assert_eq!(results.len(), expected);
    }
}
