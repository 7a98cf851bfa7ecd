//! Compensating-transaction coordinator.
//!
//! The store writes through on every mutation, so a multi-step operation
//! that fails midway cannot rely on isolation. Instead, each step registers
//! a compensating action as it applies, and `rollback` replays the log in
//! reverse registration order. Recovery is best-effort: a compensation that
//! fails is logged and skipped so the remaining ones still run.

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::graph::store::GraphStore;
use crate::graph::types::Graph;

/// A registered inverse operation, run once during rollback.
pub type RollbackAction = Box<dyn FnOnce(&mut GraphStore) -> Result<()> + Send>;

struct Compensation {
    action: RollbackAction,
    description: String,
}

struct ActiveTransaction {
    snapshot: Graph,
    compensations: Vec<Compensation>,
}

/// Tracks the single in-flight logical transaction.
///
/// Exactly one transaction may be active at a time. `begin` while one is
/// active is an error, as are `commit`, `rollback`, and
/// `add_rollback_action` while idle.
#[derive(Default)]
pub struct TransactionCoordinator {
    active: Option<ActiveTransaction>,
}

impl TransactionCoordinator {
    pub fn new() -> Self {
        Self { active: None }
    }

    /// Begin a transaction, snapshotting the current graph for callers that
    /// need the pre-transaction state to compute diffs against.
    pub fn begin(&mut self, store: &mut GraphStore) -> Result<()> {
        if self.active.is_some() {
            return Err(Error::TransactionState(
                "a transaction is already active".into(),
            ));
        }
        let snapshot = store.load()?;
        self.active = Some(ActiveTransaction {
            snapshot,
            compensations: Vec::new(),
        });
        debug!("transaction started");
        Ok(())
    }

    /// Register a compensating action for a write that has been applied.
    /// Actions run in reverse registration order on rollback.
    pub fn add_rollback_action(
        &mut self,
        action: RollbackAction,
        description: impl Into<String>,
    ) -> Result<()> {
        match self.active.as_mut() {
            Some(tx) => {
                let description = description.into();
                debug!(action = %description, "rollback action registered");
                tx.compensations.push(Compensation {
                    action,
                    description,
                });
                Ok(())
            }
            None => Err(Error::TransactionState("no active transaction".into())),
        }
    }

    /// Commit: discard the compensation log and return to idle. Writes have
    /// already landed, so there is nothing else to do.
    pub fn commit(&mut self) -> Result<()> {
        match self.active.take() {
            Some(tx) => {
                debug!(
                    compensations = tx.compensations.len(),
                    "transaction committed"
                );
                Ok(())
            }
            None => Err(Error::TransactionState("no active transaction".into())),
        }
    }

    /// Roll back: run every compensation in reverse registration order. A
    /// failing compensation is logged and skipped; the coordinator returns
    /// to idle either way.
    pub fn rollback(&mut self, store: &mut GraphStore) -> Result<()> {
        let tx = match self.active.take() {
            Some(tx) => tx,
            None => return Err(Error::TransactionState("no active transaction".into())),
        };

        let count = tx.compensations.len();
        for compensation in tx.compensations.into_iter().rev() {
            if let Err(err) = (compensation.action)(store) {
                warn!(
                    action = %compensation.description,
                    error = %err,
                    "compensation failed during rollback"
                );
            }
        }
        debug!(compensations = count, "transaction rolled back");
        Ok(())
    }

    /// `true` while a transaction is active.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The graph snapshot taken at `begin`, while a transaction is active.
    pub fn current_graph(&self) -> Option<&Graph> {
        self.active.as_ref().map(|tx| &tx.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::nodes::add_nodes;
    use crate::graph::types::Node;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn test_store() -> (TempDir, GraphStore) {
        let tmp = TempDir::new().unwrap();
        let store = GraphStore::open(tmp.path().join("graph.jsonl"), false).unwrap();
        (tmp, store)
    }

    #[test]
    fn only_one_transaction_at_a_time() {
        let (_tmp, mut store) = test_store();
        let mut tx = TransactionCoordinator::new();

        tx.begin(&mut store).unwrap();
        assert!(tx.is_active());
        assert!(matches!(
            tx.begin(&mut store),
            Err(Error::TransactionState(_))
        ));

        tx.commit().unwrap();
        assert!(!tx.is_active());
        tx.begin(&mut store).unwrap();
        tx.rollback(&mut store).unwrap();
        assert!(!tx.is_active());
    }

    #[test]
    fn idle_coordinator_rejects_everything_but_begin() {
        let (_tmp, mut store) = test_store();
        let mut tx = TransactionCoordinator::new();

        assert!(matches!(tx.commit(), Err(Error::TransactionState(_))));
        assert!(matches!(
            tx.rollback(&mut store),
            Err(Error::TransactionState(_))
        ));
        assert!(matches!(
            tx.add_rollback_action(Box::new(|_| Ok(())), "noop"),
            Err(Error::TransactionState(_))
        ));
    }

    #[test]
    fn rollback_runs_compensations_in_reverse_order() {
        let (_tmp, mut store) = test_store();
        let mut tx = TransactionCoordinator::new();
        tx.begin(&mut store).unwrap();

        let order: Arc<Mutex<Vec<&str>>> = Arc::new(Mutex::new(Vec::new()));
        for step in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            tx.add_rollback_action(
                Box::new(move |_| {
                    order.lock().unwrap().push(step);
                    Ok(())
                }),
                step,
            )
            .unwrap();
        }

        tx.rollback(&mut store).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
    }

    #[test]
    fn failing_compensation_does_not_stop_the_rest() {
        let (_tmp, mut store) = test_store();
        let mut tx = TransactionCoordinator::new();
        tx.begin(&mut store).unwrap();

        let ran: Arc<Mutex<Vec<&str>>> = Arc::new(Mutex::new(Vec::new()));
        {
            let ran = Arc::clone(&ran);
            tx.add_rollback_action(
                Box::new(move |_| {
                    ran.lock().unwrap().push("survivor");
                    Ok(())
                }),
                "survivor",
            )
            .unwrap();
        }
        tx.add_rollback_action(
            Box::new(|_| Err(Error::Validation("boom".into()))),
            "failing step",
        )
        .unwrap();

        tx.rollback(&mut store).unwrap();
        assert_eq!(*ran.lock().unwrap(), vec!["survivor"]);
        assert!(!tx.is_active());
    }

    #[test]
    fn commit_discards_compensations() {
        let (_tmp, mut store) = test_store();
        add_nodes(&mut store, vec![Node::new("Grak", "npc")]).unwrap();

        let mut tx = TransactionCoordinator::new();
        tx.begin(&mut store).unwrap();
        tx.add_rollback_action(
            Box::new(|store| {
                crate::graph::nodes::delete_nodes(store, &["Grak".to_string()]).map(|_| ())
            }),
            "remove Grak",
        )
        .unwrap();
        tx.commit().unwrap();

        // Nothing ran; Grak is still there.
        let graph = store.load().unwrap();
        assert!(graph.has_node("Grak"));
    }

    #[test]
    fn snapshot_reflects_state_at_begin() {
        let (_tmp, mut store) = test_store();
        add_nodes(&mut store, vec![Node::new("Grak", "npc")]).unwrap();

        let mut tx = TransactionCoordinator::new();
        assert!(tx.current_graph().is_none());
        tx.begin(&mut store).unwrap();

        add_nodes(&mut store, vec![Node::new("Lurtz", "npc")]).unwrap();

        let snapshot = tx.current_graph().unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
        assert!(snapshot.has_node("Grak"));
    }
}
