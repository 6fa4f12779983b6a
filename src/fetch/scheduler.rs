//! Bounded-concurrency dispatch shared by both transports.
//!
//! A [`TaskQueue`] holds the deduplicated URLs of one batch. Transports
//! pull work with [`TaskQueue::admit`], which refuses once the in-flight
//! window is full, and report each terminal outcome with
//! [`TaskQueue::complete`], which frees a slot for the next URL.

use crate::base::neterror::NetError;
use crate::fetch::outcome::{BatchOutcome, TaskOutcome};
use crate::fetch::task::{PendingTask, TaskId, TaskTable};
use crate::fetch::transport::Transport;
use crate::http::requestspec::RequestSpec;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::task::AbortHandle;

/// URLs of one batch moving from backlog to in-flight to completed.
#[derive(Debug)]
pub struct TaskQueue {
    order: Vec<String>,
    backlog: VecDeque<String>,
    active: TaskTable,
    outcomes: HashMap<String, TaskOutcome>,
    /// `0` means unbounded.
    limit: usize,
    next_id: u64,
    peak_in_flight: usize,
}

impl TaskQueue {
    /// Queue `urls`, dropping repeats while keeping first-seen order.
    pub fn new<I, S>(urls: I, limit: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let order: Vec<String> = urls
            .into_iter()
            .map(Into::into)
            .filter(|u| seen.insert(u.clone()))
            .collect();

        Self {
            backlog: order.iter().cloned().collect(),
            order,
            active: TaskTable::new(),
            outcomes: HashMap::new(),
            limit,
            next_id: 0,
            peak_in_flight: 0,
        }
    }

    fn has_capacity(&self) -> bool {
        self.limit == 0 || self.active.len() < self.limit
    }

    /// Move the next backlog URL into the in-flight window, if there is room.
    pub fn admit(&mut self) -> Option<(TaskId, String)> {
        if !self.has_capacity() {
            return None;
        }
        let url = self.backlog.pop_front()?;
        let id = TaskId::new(self.next_id);
        self.next_id += 1;

        self.active.insert(PendingTask::new(id, url.clone()));
        self.peak_in_flight = self.peak_in_flight.max(self.active.len());
        tracing::debug!(task = %id, url = %url, in_flight = self.active.len(), "task admitted");
        Some((id, url))
    }

    /// Record the outcome of in-flight task `id`.
    ///
    /// Returns `false` for an id that is not in flight.
    pub fn complete(&mut self, id: TaskId, outcome: TaskOutcome) -> bool {
        let Some(task) = self.active.remove(id) else {
            tracing::warn!(task = %id, "completion for unknown task");
            return false;
        };

        match &outcome {
            TaskOutcome::Response(r) if r.status_code == 200 => {
                tracing::debug!(task = %id, url = %task.url, code = r.status_code,
                    elapsed_ms = r.elapsed.as_millis() as u64, "task complete");
            }
            TaskOutcome::Response(r) => {
                tracing::warn!(task = %id, url = %task.url, code = r.status_code, "non-200 response");
            }
            TaskOutcome::Failed { error, .. } => {
                tracing::warn!(task = %id, url = %task.url, error = %error, "task failed");
            }
            TaskOutcome::RedirectLimitExceeded { .. } => {
                tracing::warn!(task = %id, url = %task.url, "redirect limit exceeded");
            }
        }

        self.outcomes.insert(task.url, outcome);
        true
    }

    pub fn set_abort_handle(&mut self, id: TaskId, handle: AbortHandle) {
        self.active.set_abort_handle(id, handle);
    }

    /// Abort everything in flight. Aborted URLs get no outcome.
    pub fn abort_in_flight(&mut self) -> usize {
        self.active.abort_all().len()
    }

    pub fn url_of(&self, id: TaskId) -> Option<&str> {
        self.active.get(id).map(|t| t.url.as_str())
    }

    pub fn submitted(&self) -> usize {
        self.order.len()
    }

    pub fn completed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight
    }

    pub fn is_done(&self) -> bool {
        self.completed() == self.submitted()
    }

    /// Close the batch; every submitted URL must have an outcome.
    pub fn finish(self) -> Result<BatchOutcome, NetError> {
        if !self.is_done() {
            return Err(NetError::IncompleteBatch {
                expected: self.submitted(),
                completed: self.completed(),
            });
        }
        Ok(BatchOutcome {
            order: self.order,
            outcomes: self.outcomes,
            peak_in_flight: self.peak_in_flight,
        })
    }
}

/// Runs batches of URLs through one transport under a concurrency limit.
#[derive(Clone)]
pub struct FetchScheduler {
    transport: Arc<dyn Transport>,
    concurrency_limit: usize,
}

impl FetchScheduler {
    pub fn new(transport: Arc<dyn Transport>, concurrency_limit: usize) -> Self {
        Self {
            transport,
            concurrency_limit,
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Fetch every distinct URL once.
    ///
    /// Per-URL failures are recorded in the outcome. `Err` is returned only
    /// when the transport aborts the batch or leaves URLs without outcome.
    pub async fn fetch<I, S>(&self, urls: I, spec: Arc<RequestSpec>) -> Result<BatchOutcome, NetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut queue = TaskQueue::new(urls, self.concurrency_limit);
        tracing::debug!(
            urls = queue.submitted(),
            limit = self.concurrency_limit,
            transport = ?self.transport.kind(),
            "batch start"
        );

        if queue.submitted() > 0 {
            self.transport.run(&mut queue, spec).await?;
        }
        queue.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::decoder::DecodedResponse;
    use std::time::Duration;

    fn ok() -> TaskOutcome {
        TaskOutcome::Response(DecodedResponse::failure(Duration::ZERO))
    }

    #[test]
    fn test_dedup_keeps_first_order() {
        let queue = TaskQueue::new(["http://b/", "http://a/", "http://b/", "http://c/", "http://a/"], 2);
        assert_eq!(queue.submitted(), 3);
        assert_eq!(queue.backlog_len(), 3);
        let outcome = {
            let mut q = queue;
            while let Some((id, _)) = q.admit() {
                q.complete(id, ok());
            }
            q.finish().unwrap()
        };
        assert_eq!(outcome.order, vec!["http://b/", "http://a/", "http://c/"]);
    }

    #[test]
    fn test_admit_respects_limit() {
        let mut queue = TaskQueue::new(["1", "2", "3", "4", "5"], 2);
        let (a, _) = queue.admit().unwrap();
        let (_b, _) = queue.admit().unwrap();
        assert!(queue.admit().is_none());
        assert_eq!(queue.in_flight(), 2);

        assert!(queue.complete(a, ok()));
        assert!(queue.admit().is_some());
        assert!(queue.admit().is_none());
        assert_eq!(queue.peak_in_flight(), 2);
    }

    #[test]
    fn test_unbounded_admits_everything() {
        let mut queue = TaskQueue::new(["1", "2", "3", "4"], 0);
        let mut admitted = 0;
        while queue.admit().is_some() {
            admitted += 1;
        }
        assert_eq!(admitted, 4);
        assert_eq!(queue.backlog_len(), 0);
        assert_eq!(queue.peak_in_flight(), 4);
    }

    #[test]
    fn test_unknown_completion_ignored() {
        let mut queue = TaskQueue::new(["1"], 1);
        assert!(!queue.complete(TaskId::new(99), ok()));
        assert_eq!(queue.completed(), 0);
    }

    #[test]
    fn test_finish_incomplete() {
        let mut queue = TaskQueue::new(["1", "2", "3"], 3);
        let (id, _) = queue.admit().unwrap();
        queue.admit();
        queue.complete(id, ok());
        assert_eq!(queue.abort_in_flight(), 1);

        let err = queue.finish().unwrap_err();
        assert_eq!(
            err,
            NetError::IncompleteBatch {
                expected: 3,
                completed: 1
            }
        );
    }

    #[test]
    fn test_url_of() {
        let mut queue = TaskQueue::new(["http://x/"], 1);
        let (id, url) = queue.admit().unwrap();
        assert_eq!(queue.url_of(id), Some(url.as_str()));
        queue.complete(id, ok());
        assert!(queue.url_of(id).is_none());
        assert!(queue.is_done());
    }
}
