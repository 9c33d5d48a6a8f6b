//! Simulation scenarios.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// A simulation scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// Steps in the scenario.
    pub steps: Vec<ScenarioStep>,
}

/// A step in a scenario.
///
/// `args` always starts with the function name, as in the platform CLI's
/// `{"Args":[...]}` form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScenarioStep {
    /// Submit a transaction; its writes are committed if it succeeds.
    Invoke { args: Vec<String> },
    /// Evaluate without committing and log the payload.
    Query { args: Vec<String> },
    /// Account balance equals.
    AssertBalance { name: String, balance: i64 },
    /// Invocation is rejected, optionally with a specific error code.
    AssertFailure {
        args: Vec<String>,
        #[serde(default)]
        code: Option<String>,
    },
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl Scenario {
    /// Load a built-in scenario by name, or a scenario file by path.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "sample" => Ok(Self::sample()),
            "insufficient-destination" => Ok(Self::insufficient_destination()),
            "rich-query" => Ok(Self::rich_query()),
            path => Self::from_file(Path::new(path)),
        }
    }

    /// Read a JSON scenario file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Unknown scenario or unreadable file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Malformed scenario file: {}", path.display()))
    }

    /// Two accounts, a transfer each way, and a duplicate create.
    fn sample() -> Self {
        Self {
            name: "sample".to_string(),
            description: "Create two accounts and move balance between them".to_string(),
            steps: vec![
                ScenarioStep::Invoke {
                    args: args(&["createaccount", "A12345", "Alice", "200"]),
                },
                ScenarioStep::Invoke {
                    args: args(&["createaccount", "B67890", "Bob", "100"]),
                },
                ScenarioStep::Query {
                    args: args(&["getaccount", "alice"]),
                },
                ScenarioStep::Invoke {
                    args: args(&["transfer", "alice", "bob", "50"]),
                },
                ScenarioStep::AssertBalance {
                    name: "alice".to_string(),
                    balance: 150,
                },
                ScenarioStep::AssertBalance {
                    name: "bob".to_string(),
                    balance: 150,
                },
                ScenarioStep::Invoke {
                    args: args(&["transfer", "bob", "alice", "300"]),
                },
                ScenarioStep::AssertBalance {
                    name: "bob".to_string(),
                    balance: -150,
                },
                ScenarioStep::AssertBalance {
                    name: "alice".to_string(),
                    balance: 450,
                },
                ScenarioStep::AssertFailure {
                    args: args(&["createaccount", "C00001", "ALICE", "10"]),
                    code: Some("ACCOUNT_EXISTS".to_string()),
                },
            ],
        }
    }

    /// Transfers involving a missing account leave the other side untouched.
    fn insufficient_destination() -> Self {
        Self {
            name: "insufficient-destination".to_string(),
            description: "Transfers to and from missing accounts are rejected".to_string(),
            steps: vec![
                ScenarioStep::Invoke {
                    args: args(&["createaccount", "A12345", "alice", "100"]),
                },
                ScenarioStep::AssertFailure {
                    args: args(&["transfer", "alice", "ghost", "10"]),
                    code: Some("ACCOUNT_NOT_FOUND".to_string()),
                },
                ScenarioStep::AssertBalance {
                    name: "alice".to_string(),
                    balance: 100,
                },
                ScenarioStep::AssertFailure {
                    args: args(&["transfer", "ghost", "alice", "10"]),
                    code: Some("ACCOUNT_NOT_FOUND".to_string()),
                },
                ScenarioStep::AssertBalance {
                    name: "alice".to_string(),
                    balance: 100,
                },
                ScenarioStep::AssertFailure {
                    args: args(&["transfer", "alice", "ghost", "ten"]),
                    code: Some("VALIDATION_ERROR".to_string()),
                },
                ScenarioStep::AssertFailure {
                    args: args(&["delete", "alice"]),
                    code: Some("UNKNOWN_FUNCTION".to_string()),
                },
            ],
        }
    }

    /// Selector queries over a handful of accounts.
    fn rich_query() -> Self {
        let mut steps: Vec<ScenarioStep> = [
            ("D00001", "dave", "200"),
            ("A00001", "alice", "150"),
            ("C00001", "charlie", "250"),
            ("B00001", "bob", "50"),
        ]
        .into_iter()
        .map(|(id, name, balance)| ScenarioStep::Invoke {
            args: args(&["createaccount", id, name, balance]),
        })
        .collect();

        steps.extend([
            ScenarioStep::Query {
                args: args(&["query", r#"{"selector":{"balance":{"$lt":200}}}"#]),
            },
            ScenarioStep::Query {
                args: args(&[
                    "query",
                    r#"{"selector":{"$or":[{"name":"dave"},{"balance":{"$gte":250}}]}}"#,
                ]),
            },
            ScenarioStep::Query {
                args: args(&["query", r#"{"selector":{"docType":"account"},"limit":2}"#]),
            },
            ScenarioStep::AssertFailure {
                args: args(&["query", r#"{"selector":{"name":{"$regex":"^a"}}}"#]),
                code: Some("STORE_ERROR".to_string()),
            },
        ]);

        Self {
            name: "rich-query".to_string(),
            description: "Filter accounts with selector queries".to_string(),
            steps,
        }
    }
}
