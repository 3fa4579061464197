//! Graph driver family (Cypher-style statements).

use super::DriverSession;
use crate::core::Result;
use crate::transaction::SessionProxy;
use serde_json::{Map, Value};

/// Named statement parameters
pub type Parameters = Map<String, Value>;

/// One result row, keyed by column
pub type Record = Map<String, Value>;

/// Data operations shared by graph sessions and graph transactions
pub trait GraphStatements {
    fn run(&mut self, statement: &str, parameters: &Parameters) -> Result<Vec<Record>>;
}

/// What application code holds: a graph session, enlisted or not.
pub trait GraphSession: DriverSession + GraphStatements {}

impl<T: DriverSession + GraphStatements> GraphSession for T {}

impl<S> GraphStatements for SessionProxy<S>
where
    S: DriverSession,
    S::Transaction: GraphStatements,
{
    fn run(&mut self, statement: &str, parameters: &Parameters) -> Result<Vec<Record>> {
        self.invoke("run", |tx| tx.run(statement, parameters))
    }
}
