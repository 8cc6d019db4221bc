//! Hierarchical step tree (spec §4.7, §9): id-addressed nodes in an arena,
//! nodes hold parent ids (not back-pointers), subscribers are arrays owned
//! by the root. Entering a step sets state=in-progress and notifies;
//! exiting normally transitions to completed (forcing current=total);
//! exiting with an error transitions to failed with the error attached.
//! Children inherit their parent's subscribers and trackable reference. A
//! child's failure does not auto-fail its parent.

use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::domain::entities::{StepState, TaskStatus};
use crate::error::KoditResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepId(usize);

#[derive(Debug, Clone)]
pub struct StepSnapshot {
    pub name: String,
    pub state: StepState,
    pub current: u64,
    pub total: u64,
    pub message: Option<String>,
    pub error: Option<String>,
    pub trackable_type: String,
    pub trackable_id: String,
}

impl StepSnapshot {
    fn to_task_status(&self) -> TaskStatus {
        TaskStatus {
            trackable_type: self.trackable_type.clone(),
            trackable_id: self.trackable_id.clone(),
            name: self.name.clone(),
            state: self.state,
            current: self.current,
            total: self.total,
            message: self.message.clone(),
            error: self.error.clone(),
        }
    }
}

pub trait ProgressSubscriber: Send + Sync {
    fn on_update(&self, snapshot: &StepSnapshot);
}

struct StepNode {
    #[allow(dead_code)]
    parent: Option<StepId>,
    snapshot: StepSnapshot,
}

/// The arena. Cheaply clonable; every `StepHandle` holds a reference back
/// into the same tree.
#[derive(Clone)]
pub struct StepTree {
    inner: Arc<Mutex<TreeInner>>,
}

struct TreeInner {
    nodes: Vec<StepNode>,
    subscribers: Vec<Arc<dyn ProgressSubscriber>>,
}

impl StepTree {
    pub fn new(subscribers: Vec<Arc<dyn ProgressSubscriber>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TreeInner {
                nodes: Vec::new(),
                subscribers,
            })),
        }
    }

    /// Creates the root step for an operation, e.g. "kodit.index.run".
    pub fn root(&self, name: &str, trackable_type: &str, trackable_id: &str) -> StepHandle {
        self.new_step(None, name, trackable_type, trackable_id)
    }

    fn new_step(&self, parent: Option<StepId>, name: &str, trackable_type: &str, trackable_id: &str) -> StepHandle {
        let snapshot = StepSnapshot {
            name: name.to_owned(),
            state: StepState::Started,
            current: 0,
            total: 0,
            message: None,
            error: None,
            trackable_type: trackable_type.to_owned(),
            trackable_id: trackable_id.to_owned(),
        };
        let id = {
            let mut inner = self.inner.lock().expect("step tree lock poisoned");
            inner.nodes.push(StepNode { parent, snapshot });
            StepId(inner.nodes.len() - 1)
        };
        StepHandle {
            tree: self.clone(),
            id,
        }
    }

    fn notify(&self, id: StepId) {
        let (snapshot, subscribers) = {
            let inner = self.inner.lock().expect("step tree lock poisoned");
            (inner.nodes[id.0].snapshot.clone(), inner.subscribers.clone())
        };
        for subscriber in &subscribers {
            subscriber.on_update(&snapshot);
        }
    }

    fn mutate(&self, id: StepId, f: impl FnOnce(&mut StepSnapshot)) {
        {
            let mut inner = self.inner.lock().expect("step tree lock poisoned");
            let snapshot = &mut inner.nodes[id.0].snapshot;
            // Terminal states are final (spec §3 invariant 4).
            if snapshot.state.is_terminal() {
                return;
            }
            f(snapshot);
        }
        self.notify(id);
    }
}

#[derive(Clone)]
pub struct StepHandle {
    tree: StepTree,
    id: StepId,
}

impl StepHandle {
    pub fn snapshot(&self) -> StepSnapshot {
        let inner = self.tree.inner.lock().expect("step tree lock poisoned");
        inner.nodes[self.id.0].snapshot.clone()
    }

    /// Creates a child step inheriting this step's trackable reference and
    /// the root's subscribers.
    pub fn child(&self, name: &str) -> StepHandle {
        let (trackable_type, trackable_id) = {
            let snapshot = self.snapshot();
            (snapshot.trackable_type, snapshot.trackable_id)
        };
        self.tree
            .new_step(Some(self.id), name, &trackable_type, &trackable_id)
    }

    pub fn enter(&self) {
        self.tree.mutate(self.id, |s| s.state = StepState::InProgress);
    }

    pub fn set_progress(&self, current: u64, total: u64) {
        self.tree.mutate(self.id, |s| {
            s.current = current;
            s.total = total;
        });
    }

    pub fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.tree.mutate(self.id, |s| s.message = Some(message));
    }

    pub fn complete(&self) {
        self.tree.mutate(self.id, |s| {
            s.state = StepState::Completed;
            s.current = s.total.max(s.current);
        });
    }

    pub fn skip(&self) {
        self.tree.mutate(self.id, |s| s.state = StepState::Skipped);
    }

    pub fn fail(&self, error: impl Into<String>) {
        let error = error.into();
        self.tree.mutate(self.id, |s| {
            s.state = StepState::Failed;
            s.error = Some(error);
        });
    }

    /// Runs `f` inside this step: enters on start, completes on `Ok`, fails
    /// on `Err` with the error's message — the defer/guard pattern spec §9
    /// asks for, expressed as scoped execution rather than RAII (`?` inside
    /// `f` still needs to resolve through this to record the failure).
    pub async fn run<F, Fut, T>(&self, f: F) -> KoditResult<T>
    where
        F: FnOnce(StepHandle) -> Fut,
        Fut: Future<Output = KoditResult<T>>,
    {
        self.enter();
        match f(self.clone()).await {
            Ok(value) => {
                self.complete();
                Ok(value)
            }
            Err(err) => {
                self.fail(err.to_string());
                Err(err)
            }
        }
    }
}

/// Writes a `TaskStatus` row on every update (spec §4.7's database
/// persister subscriber).
pub struct DbProgressSubscriber {
    repo: crate::repositories::TaskStatusRepository,
    handle: tokio::runtime::Handle,
}

impl DbProgressSubscriber {
    pub fn new(repo: crate::repositories::TaskStatusRepository) -> Self {
        Self {
            repo,
            handle: tokio::runtime::Handle::current(),
        }
    }
}

impl ProgressSubscriber for DbProgressSubscriber {
    fn on_update(&self, snapshot: &StepSnapshot) {
        let repo = self.repo.clone();
        let status = snapshot.to_task_status();
        self.handle.spawn(async move {
            if let Err(err) = repo.upsert(&status).await {
                tracing::warn!(error = %err, "failed to persist task status");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_state_never_regresses() {
        let tree = StepTree::new(Vec::new());
        let step = tree.root("kodit.index.run", "repository", "1");
        step.enter();
        step.complete();
        step.enter();
        assert_eq!(step.snapshot().state, StepState::Completed);
    }

    #[test]
    fn child_inherits_trackable_reference() {
        let tree = StepTree::new(Vec::new());
        let step = tree.root("kodit.index.run", "repository", "42");
        let child = step.child("acquire");
        assert_eq!(child.snapshot().trackable_id, "42");
    }

    #[test]
    fn child_failure_does_not_fail_parent() {
        let tree = StepTree::new(Vec::new());
        let parent = tree.root("kodit.index.run", "repository", "1");
        parent.enter();
        let child = parent.child("acquire");
        child.enter();
        child.fail("boom");
        assert_eq!(parent.snapshot().state, StepState::InProgress);
    }
}
