//! Invocation requests in the platform CLI's `{"Args":[...]}` form.

use serde::{Deserialize, Serialize};

/// A function name plus its string arguments.
///
/// Serializes as `{"Args":["transfer","alice","bob","50"]}`: the first
/// element is the function name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    #[serde(rename = "Args")]
    pub args: Vec<String>,
}

impl Invocation {
    /// Build an invocation from a function name and arguments.
    pub fn new<I, S>(function: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = vec![function.to_string()];
        all.extend(args.into_iter().map(Into::into));
        Self { args: all }
    }

    /// Parse the `{"Args":[...]}` JSON form.
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Function name; empty if the argument list is empty.
    pub fn function_name(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    /// Arguments after the function name.
    pub fn params(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }
}
