use crate::base::neterror::NetError;
use crate::http::decoder::DecodedResponse;
use crate::http::result::FetchResult;
use std::collections::HashMap;
use std::time::Duration;

/// Terminal state of one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// A response arrived, whatever its status code.
    Response(DecodedResponse),
    /// No response: connect, TLS or transfer failure.
    Failed { error: NetError, elapsed: Duration },
    /// The redirect chain was full when another `Location` arrived.
    RedirectLimitExceeded { elapsed: Duration },
}

impl TaskOutcome {
    pub fn status_code(&self) -> u16 {
        match self {
            TaskOutcome::Response(r) => r.status_code,
            _ => 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            TaskOutcome::Response(r) => r.elapsed,
            TaskOutcome::Failed { elapsed, .. } => *elapsed,
            TaskOutcome::RedirectLimitExceeded { elapsed } => *elapsed,
        }
    }

    pub fn into_result(self, url: &str) -> FetchResult {
        match self {
            TaskOutcome::Response(r) => FetchResult::from_response(url, r),
            TaskOutcome::Failed { error, elapsed } => FetchResult::failed(url, error, elapsed),
            TaskOutcome::RedirectLimitExceeded { elapsed } => {
                FetchResult::from_response(url, DecodedResponse::failure(elapsed))
                    .with_error(NetError::TooManyRedirects)
            }
        }
    }
}

/// Every submitted URL with its outcome, in submission order.
#[derive(Debug)]
pub struct BatchOutcome {
    pub order: Vec<String>,
    pub outcomes: HashMap<String, TaskOutcome>,
    /// Largest number of tasks in flight at once.
    pub peak_in_flight: usize,
}

impl BatchOutcome {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_results(self) -> HashMap<String, FetchResult> {
        self.outcomes
            .into_iter()
            .map(|(url, outcome)| {
                let result = outcome.into_result(&url);
                (url, result)
            })
            .collect()
    }
}
