use std::collections::HashMap;
use std::fmt;
use tokio::task::AbortHandle;

/// Identifier of one admitted URL within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A URL occupying the in-flight window.
#[derive(Debug)]
pub struct PendingTask {
    pub id: TaskId,
    pub url: String,
    /// Set by transports that run the task on its own tokio task.
    abort: Option<AbortHandle>,
}

impl PendingTask {
    pub fn new(id: TaskId, url: String) -> Self {
        Self {
            id,
            url,
            abort: None,
        }
    }
}

/// In-flight tasks keyed by id.
#[derive(Debug, Default)]
pub struct TaskTable {
    tasks: HashMap<TaskId, PendingTask>,
}

impl TaskTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, task: PendingTask) {
        self.tasks.insert(task.id, task);
    }

    pub fn remove(&mut self, id: TaskId) -> Option<PendingTask> {
        self.tasks.remove(&id)
    }

    pub fn get(&self, id: TaskId) -> Option<&PendingTask> {
        self.tasks.get(&id)
    }

    pub fn set_abort_handle(&mut self, id: TaskId, handle: AbortHandle) {
        if let Some(task) = self.tasks.get_mut(&id) {
            task.abort = Some(handle);
        }
    }

    /// Abort and drop every task still in flight.
    pub fn abort_all(&mut self) -> Vec<PendingTask> {
        let drained: Vec<_> = self.tasks.drain().map(|(_, t)| t).collect();
        for task in &drained {
            if let Some(handle) = &task.abort {
                handle.abort();
            }
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
