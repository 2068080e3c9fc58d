//! The contract between a session and whatever runs its script through the engine.

use crate::response;
use std::collections::HashMap;
use tracing::{debug, warn};

/// What the engine returned for one expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CasResult {
    /// The value of the expression, in the engine's input syntax.
    pub value: Option<String>,

    /// The display form of the expression.
    pub display: Option<String>,

    /// The error the engine reported for the expression. Empty if there was none.
    pub error: String,
}

impl CasResult {
    /// Creates a result for an expression that evaluated successfully.
    pub fn new(value: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            display: Some(display.into()),
            error: String::new(),
        }
    }

    /// Creates a result that only carries an error.
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            value: None,
            display: None,
            error: error.into(),
        }
    }
}

/// The results of a script, keyed by the position of each expression in the session, as a
/// string.
///
/// Positions can be missing; a session reports each missing position as an error against the
/// expression at that position.
pub type CasResults = HashMap<String, CasResult>;

/// Runs a script through the engine.
pub trait Connector {
    /// Evaluates the given script and returns the results of each expression.
    ///
    /// If the engine fails outright, this must return an empty map rather than panicking; the
    /// session reports an empty map as a total failure.
    fn evaluate(&mut self, script: &str) -> CasResults;
}

impl<F> Connector for F
where
    F: FnMut(&str) -> CasResults,
{
    fn evaluate(&mut self, script: &str) -> CasResults {
        self(script)
    }
}

/// Adapts a transport that returns the engine's raw printed output into a [`Connector`].
///
/// The transport returns [`None`] if the engine could not be run at all.
#[derive(Debug, Clone)]
pub struct RawConnector<F> {
    transport: F,
}

impl<F> RawConnector<F>
where
    F: FnMut(&str) -> Option<String>,
{
    /// Creates a connector around the given transport.
    pub fn new(transport: F) -> Self {
        Self { transport }
    }
}

impl<F> Connector for RawConnector<F>
where
    F: FnMut(&str) -> Option<String>,
{
    fn evaluate(&mut self, script: &str) -> CasResults {
        match (self.transport)(script) {
            Some(raw) => {
                debug!(bytes = raw.len(), "unpacking engine output");
                response::unpack(&raw)
            },
            None => {
                warn!("engine transport returned no output");
                CasResults::new()
            },
        }
    }
}
