//! Shared fixtures: in-memory drivers and a local coordinator.
#![allow(dead_code)]

use nosqltx::{
    CoordinatorTransaction, Document, DocumentOperations, DriverError, DriverSession,
    DriverTransaction, EndFlag, EnlistmentRegistry, GraphStatements, Parameters, Record,
    ResourceParticipant, Result, StartFlag, TransactionCoordinator, TransactionStatus, TxError,
    Xid,
};
use nosqltx::driver::document::matches_filter;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ----------------------------------------------------------------------------
// Call journal
// ----------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<String>>>);

impl Calls {
    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|c| c.as_str() == call).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Undecided,
    Success,
    Failure,
}

// ----------------------------------------------------------------------------
// Graph driver
//
// Statements: "CREATE <name>" adds a node, "MATCH" lists visible nodes,
// "FAIL" is rejected by the driver.
// ----------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct GraphStore {
    nodes: Arc<Mutex<Vec<String>>>,
    pub calls: Calls,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> GraphDriverSession {
        self.calls.push("driver.session");
        GraphDriverSession {
            store: self.clone(),
            open: true,
        }
    }

    pub fn committed(&self) -> Vec<String> {
        self.nodes.lock().unwrap().clone()
    }
}

fn node_records(nodes: &[String]) -> Vec<Record> {
    nodes
        .iter()
        .map(|name| {
            let mut record = Record::new();
            record.insert("name".to_string(), Value::from(name.as_str()));
            record
        })
        .collect()
}

fn execute(
    nodes: &mut Vec<String>,
    visible: &[String],
    statement: &str,
) -> Result<Vec<Record>> {
    if let Some(name) = statement.strip_prefix("CREATE ") {
        nodes.push(name.to_string());
        return Ok(Vec::new());
    }
    if statement.starts_with("MATCH") {
        return Ok(node_records(visible));
    }
    Err(DriverError::new(format!("statement rejected: {}", statement)).into())
}

pub struct GraphDriverSession {
    store: GraphStore,
    open: bool,
}

impl DriverSession for GraphDriverSession {
    type Transaction = GraphDriverTransaction;

    fn begin_transaction(&mut self) -> Result<GraphDriverTransaction> {
        self.store.calls.push("session.begin");
        Ok(GraphDriverTransaction {
            store: self.store.clone(),
            pending: Vec::new(),
            outcome: Outcome::Undecided,
            open: true,
        })
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) -> Result<()> {
        self.store.calls.push("session.close");
        self.open = false;
        Ok(())
    }
}

impl GraphStatements for GraphDriverSession {
    fn run(&mut self, statement: &str, _parameters: &Parameters) -> Result<Vec<Record>> {
        self.store.calls.push(format!("session.run:{}", statement));
        let mut nodes = self.store.nodes.lock().unwrap();
        let visible = nodes.clone();
        execute(&mut nodes, &visible, statement)
    }
}

pub struct GraphDriverTransaction {
    store: GraphStore,
    pending: Vec<String>,
    outcome: Outcome,
    open: bool,
}

impl DriverTransaction for GraphDriverTransaction {
    fn success(&mut self) -> Result<()> {
        self.store.calls.push("tx.success");
        self.outcome = Outcome::Success;
        Ok(())
    }

    fn failure(&mut self) -> Result<()> {
        self.store.calls.push("tx.failure");
        self.outcome = Outcome::Failure;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.store.calls.push("tx.close");
        if self.outcome == Outcome::Success {
            self.store.nodes.lock().unwrap().append(&mut self.pending);
        }
        self.pending.clear();
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl GraphStatements for GraphDriverTransaction {
    fn run(&mut self, statement: &str, _parameters: &Parameters) -> Result<Vec<Record>> {
        self.store.calls.push(format!("tx.run:{}", statement));
        let mut visible = self.store.committed();
        visible.extend(self.pending.iter().cloned());
        execute(&mut self.pending, &visible, statement)
    }
}

// ----------------------------------------------------------------------------
// Document driver
// ----------------------------------------------------------------------------

type Collections = HashMap<String, Vec<Document>>;

#[derive(Clone, Default)]
pub struct DocumentStore {
    collections: Arc<Mutex<Collections>>,
    pub calls: Calls,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> DocumentDriverSession {
        DocumentDriverSession {
            store: self.clone(),
            open: true,
        }
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

pub struct DocumentDriverSession {
    store: DocumentStore,
    open: bool,
}

impl DriverSession for DocumentDriverSession {
    type Transaction = DocumentDriverTransaction;

    fn begin_transaction(&mut self) -> Result<DocumentDriverTransaction> {
        self.store.calls.push("session.begin");
        let working = self.store.collections.lock().unwrap().clone();
        Ok(DocumentDriverTransaction {
            store: self.store.clone(),
            working,
            outcome: Outcome::Undecided,
            open: true,
        })
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) -> Result<()> {
        self.store.calls.push("session.close");
        self.open = false;
        Ok(())
    }
}

impl DocumentOperations for DocumentDriverSession {
    fn insert_one(&mut self, collection: &str, document: Document) -> Result<()> {
        self.store.calls.push("session.insert_one");
        let mut collections = self.store.collections.lock().unwrap();
        collections.entry(collection.to_string()).or_default().push(document);
        Ok(())
    }

    fn find(&mut self, collection: &str, filter: &Document) -> Result<Vec<Document>> {
        self.store.calls.push("session.find");
        let collections = self.store.collections.lock().unwrap();
        Ok(find_in(&collections, collection, filter))
    }

    fn delete_many(&mut self, collection: &str, filter: &Document) -> Result<u64> {
        self.store.calls.push("session.delete_many");
        let mut collections = self.store.collections.lock().unwrap();
        Ok(delete_in(&mut collections, collection, filter))
    }
}

fn find_in(collections: &Collections, collection: &str, filter: &Document) -> Vec<Document> {
    collections
        .get(collection)
        .map(|docs| {
            docs.iter()
                .filter(|doc| matches_filter(doc, filter))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

fn delete_in(collections: &mut Collections, collection: &str, filter: &Document) -> u64 {
    match collections.get_mut(collection) {
        Some(docs) => {
            let before = docs.len();
            docs.retain(|doc| !matches_filter(doc, filter));
            (before - docs.len()) as u64
        }
        None => 0,
    }
}

pub struct DocumentDriverTransaction {
    store: DocumentStore,
    working: Collections,
    outcome: Outcome,
    open: bool,
}

impl DriverTransaction for DocumentDriverTransaction {
    fn success(&mut self) -> Result<()> {
        self.outcome = Outcome::Success;
        Ok(())
    }

    fn failure(&mut self) -> Result<()> {
        self.outcome = Outcome::Failure;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.store.calls.push("tx.close");
        if self.outcome == Outcome::Success {
            *self.store.collections.lock().unwrap() = std::mem::take(&mut self.working);
        }
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl DocumentOperations for DocumentDriverTransaction {
    fn insert_one(&mut self, collection: &str, document: Document) -> Result<()> {
        self.store.calls.push("tx.insert_one");
        self.working.entry(collection.to_string()).or_default().push(document);
        Ok(())
    }

    fn find(&mut self, collection: &str, filter: &Document) -> Result<Vec<Document>> {
        self.store.calls.push("tx.find");
        Ok(find_in(&self.working, collection, filter))
    }

    fn delete_many(&mut self, collection: &str, filter: &Document) -> Result<u64> {
        self.store.calls.push("tx.delete_many");
        Ok(delete_in(&mut self.working, collection, filter))
    }
}

pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

// ----------------------------------------------------------------------------
// Local coordinator
// ----------------------------------------------------------------------------

pub struct LocalTransaction {
    xid: Xid,
    status: Mutex<TransactionStatus>,
    participants: Mutex<Vec<Arc<dyn ResourceParticipant>>>,
    resources: EnlistmentRegistry,
}

impl LocalTransaction {
    fn new() -> Self {
        Self {
            xid: Xid::new(),
            status: Mutex::new(TransactionStatus::Active),
            participants: Mutex::new(Vec::new()),
            resources: EnlistmentRegistry::new(),
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participants.lock().unwrap().len()
    }

    pub fn participants(&self) -> Vec<Arc<dyn ResourceParticipant>> {
        self.participants.lock().unwrap().clone()
    }

    fn set_status(&self, status: TransactionStatus) {
        *self.status.lock().unwrap() = status;
    }
}

impl CoordinatorTransaction for LocalTransaction {
    fn xid(&self) -> Xid {
        self.xid
    }

    fn status(&self) -> TransactionStatus {
        *self.status.lock().unwrap()
    }

    fn enlist_resource(&self, participant: Arc<dyn ResourceParticipant>) -> Result<()> {
        let status = self.status();
        if !status.can_enlist() {
            return Err(TxError::Enlistment(format!("transaction is {}", status)));
        }
        participant.start(&self.xid, StartFlag::New)?;
        self.participants.lock().unwrap().push(participant);
        Ok(())
    }

    fn resources(&self) -> &EnlistmentRegistry {
        &self.resources
    }
}

/// Single-threaded coordinator: one current transaction at a time.
#[derive(Default)]
pub struct LocalCoordinator {
    current: Mutex<Option<Arc<LocalTransaction>>>,
}

impl LocalCoordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn begin(&self) -> Arc<LocalTransaction> {
        let transaction = Arc::new(LocalTransaction::new());
        *self.current.lock().unwrap() = Some(Arc::clone(&transaction));
        transaction
    }

    pub fn set_rollback_only(&self) {
        if let Some(transaction) = self.current.lock().unwrap().as_ref() {
            transaction.set_status(TransactionStatus::MarkedRollback);
        }
    }

    /// Two-phase commit, one-phase when a single participant is enlisted.
    pub fn commit(&self) -> Result<()> {
        let transaction = self.take_current()?;
        if transaction.status() == TransactionStatus::MarkedRollback {
            Self::finish_rollback(&transaction)?;
            return Err(TxError::Enlistment("transaction rolled back".into()));
        }

        let xid = transaction.xid();
        let participants = transaction.participants();
        for participant in &participants {
            participant.end(&xid, EndFlag::Success)?;
        }

        transaction.set_status(TransactionStatus::Preparing);
        let one_phase = participants.len() == 1;
        if !one_phase {
            for participant in &participants {
                if let Err(err) = participant.prepare(&xid) {
                    Self::finish_rollback(&transaction)?;
                    return Err(err);
                }
            }
        }

        transaction.set_status(TransactionStatus::Committing);
        for participant in &participants {
            participant.commit(&xid, one_phase)?;
        }
        transaction.set_status(TransactionStatus::Committed);
        Ok(())
    }

    pub fn rollback(&self) -> Result<()> {
        let transaction = self.take_current()?;
        for participant in transaction.participants() {
            participant.end(&transaction.xid(), EndFlag::Fail)?;
        }
        Self::finish_rollback(&transaction)
    }

    fn finish_rollback(transaction: &LocalTransaction) -> Result<()> {
        transaction.set_status(TransactionStatus::RollingBack);
        for participant in transaction.participants() {
            participant.rollback(&transaction.xid())?;
        }
        transaction.set_status(TransactionStatus::RolledBack);
        Ok(())
    }

    fn take_current(&self) -> Result<Arc<LocalTransaction>> {
        self.current
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| TxError::IllegalState("no current transaction".into()))
    }
}

impl TransactionCoordinator for LocalCoordinator {
    fn current_transaction(&self) -> Result<Option<Arc<dyn CoordinatorTransaction>>> {
        Ok(self
            .current
            .lock()
            .unwrap()
            .clone()
            .map(|transaction| transaction as Arc<dyn CoordinatorTransaction>))
    }
}
