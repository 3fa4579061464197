//! Document driver family (collection-oriented operations).

use super::DriverSession;
use crate::core::Result;
use crate::transaction::SessionProxy;
use serde_json::{Map, Value};

pub type Document = Map<String, Value>;

/// Data operations shared by document sessions and document transactions
pub trait DocumentOperations {
    fn insert_one(&mut self, collection: &str, document: Document) -> Result<()>;

    fn find(&mut self, collection: &str, filter: &Document) -> Result<Vec<Document>>;

    /// Returns the number of deleted documents
    fn delete_many(&mut self, collection: &str, filter: &Document) -> Result<u64>;
}

pub trait DocumentSession: DriverSession + DocumentOperations {}

impl<T: DriverSession + DocumentOperations> DocumentSession for T {}

/// Equality match of every filter field against `document`.
///
/// An empty filter matches everything.
pub fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(field, expected)| document.get(field) == Some(expected))
}

impl<S> DocumentOperations for SessionProxy<S>
where
    S: DriverSession,
    S::Transaction: DocumentOperations,
{
    fn insert_one(&mut self, collection: &str, document: Document) -> Result<()> {
        self.invoke("insert_one", |tx| tx.insert_one(collection, document))
    }

    fn find(&mut self, collection: &str, filter: &Document) -> Result<Vec<Document>> {
        self.invoke("find", |tx| tx.find(collection, filter))
    }

    fn delete_many(&mut self, collection: &str, filter: &Document) -> Result<u64> {
        self.invoke("delete_many", |tx| tx.delete_many(collection, filter))
    }
}
