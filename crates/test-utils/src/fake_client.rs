//! A scripted [`OperationClient`] for poller tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use taskgroup::lro::{ClientFuture, HttpResponse, LroError, OperationClient};
use tokio::time::Instant;

/// Returns queued status responses in order and records when each request
/// was made. Once the script runs out the last response is repeated.
#[derive(Debug, Default)]
pub struct ScriptedOperationClient {
    script: Mutex<VecDeque<HttpResponse>>,
    last: Mutex<Option<HttpResponse>>,
    final_response: Option<HttpResponse>,
    polls: AtomicUsize,
    final_fetches: AtomicUsize,
    cancels: AtomicUsize,
    cancel_supported: bool,
    poll_times: Mutex<Vec<Instant>>,
}

impl ScriptedOperationClient {
    pub fn new(responses: impl IntoIterator<Item = HttpResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Serve `response` from `fetch_final` instead of reusing the last
    /// status response.
    pub fn with_final_response(mut self, response: HttpResponse) -> Self {
        self.final_response = Some(response);
        self
    }

    pub fn with_cancel_support(mut self) -> Self {
        self.cancel_supported = true;
        self
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn final_fetches(&self) -> usize {
        self.final_fetches.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Clock readings taken at each status request.
    pub fn poll_times(&self) -> Vec<Instant> {
        self.poll_times.lock().unwrap().clone()
    }
}

impl OperationClient for ScriptedOperationClient {
    fn poll_status(&self) -> ClientFuture<'_, HttpResponse> {
        Box::pin(async move {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.poll_times.lock().unwrap().push(Instant::now());

            let next = self.script.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            match next {
                Some(response) => {
                    *last = Some(response.clone());
                    Ok(response)
                }
                None => last
                    .clone()
                    .ok_or_else(|| LroError::Transport("no scripted response".to_string())),
            }
        })
    }

    fn fetch_final(&self) -> Option<ClientFuture<'_, HttpResponse>> {
        let response = self.final_response.clone()?;
        Some(Box::pin(async move {
            self.final_fetches.fetch_add(1, Ordering::SeqCst);
            Ok(response)
        }))
    }

    fn cancel(&self) -> ClientFuture<'_, ()> {
        Box::pin(async move {
            self.cancels.fetch_add(1, Ordering::SeqCst);
            if self.cancel_supported {
                Ok(())
            } else {
                Err(LroError::Transport("cancel not supported".to_string()))
            }
        })
    }
}
