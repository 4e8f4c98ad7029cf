//! Public facade — callback-style entry points over the orchestrator.
//!
//! Callers hand in a URL, an activity handle or a [`LaunchSignalSource`]
//! together with success/error callbacks. Exactly one callback runs for
//! each attempt that starts network work, none for attempts the
//! orchestrator drops. Callbacks always run on the caller's designated
//! context: a [`CallbackQueue`] the caller drains wherever it wants
//! UI-safe delivery to happen.

use tokio::sync::mpsc;
use url::Url;

use crate::lookup::DetailsPayload;
use crate::orchestrator::{LaunchSignal, Orchestrator};
use crate::platform::{ActivityHandle, LaunchSignalSource};

/// A callback scheduled for the designated context.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Create a connected dispatcher/queue pair.
pub fn callback_channel() -> (Dispatcher, CallbackQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Dispatcher { tx }, CallbackQueue { rx })
}

/// Posts callbacks to a [`CallbackQueue`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<Job>,
}

impl Dispatcher {
    /// Queue `job`. Returns `false` if the queue has been dropped.
    pub fn post(&self, job: Job) -> bool {
        self.tx.send(job).is_ok()
    }
}

/// The designated callback context. Jobs run in posting order, on
/// whichever task drains the queue.
#[derive(Debug)]
pub struct CallbackQueue {
    rx: mpsc::UnboundedReceiver<Job>,
}

impl CallbackQueue {
    /// Wait for one job and run it. Returns `false` once every
    /// dispatcher is gone and the queue is empty.
    pub async fn run_one(&mut self) -> bool {
        match self.rx.recv().await {
            Some(job) => {
                job();
                true
            }
            None => false,
        }
    }

    /// Run every job already queued without waiting. Returns how many
    /// ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Run jobs until every dispatcher is gone.
    pub async fn run(mut self) {
        while self.run_one().await {}
    }
}

/// Deep-link resolution entry points.
#[derive(Clone)]
pub struct DeepLinks {
    orchestrator: Orchestrator,
    dispatcher: Dispatcher,
}

impl DeepLinks {
    pub fn new(orchestrator: Orchestrator, dispatcher: Dispatcher) -> Self {
        Self {
            orchestrator,
            dispatcher,
        }
    }

    /// Resolve an explicit launch URL, or run a cold start if `url` is
    /// `None`.
    pub fn resolve<S, E>(&self, url: Option<Url>, on_success: S, on_error: E)
    where
        S: FnOnce(DetailsPayload) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        self.dispatch(LaunchSignal::from(url), on_success, on_error);
    }

    /// Resolve a platform continuation. Only web-browsing continuations
    /// count as an explicit URL.
    pub fn continue_activity<S, E>(&self, handle: ActivityHandle, on_success: S, on_error: E)
    where
        S: FnOnce(DetailsPayload) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        self.dispatch(handle.into_launch_signal(), on_success, on_error);
    }

    /// Resolve whatever `source` currently reports.
    pub fn resolve_from<S, E>(&self, source: &dyn LaunchSignalSource, on_success: S, on_error: E)
    where
        S: FnOnce(DetailsPayload) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        self.dispatch(source.launch_signal().normalize(), on_success, on_error);
    }

    /// Single-callback form: `Some(payload)` on success, `None` on any
    /// error.
    pub fn fetch_details<C>(&self, url: Option<Url>, completion: C)
    where
        C: FnOnce(Option<DetailsPayload>) + Send + 'static,
    {
        let completion = std::sync::Arc::new(std::sync::Mutex::new(Some(completion)));
        let on_error = std::sync::Arc::clone(&completion);
        self.resolve(
            url,
            move |payload| take_and_call(&completion, Some(payload)),
            move |_| take_and_call(&on_error, None),
        );
    }

    fn dispatch<S, E>(&self, signal: LaunchSignal, on_success: S, on_error: E)
    where
        S: FnOnce(DetailsPayload) + Send + 'static,
        E: FnOnce(String) + Send + 'static,
    {
        let ticket = self.orchestrator.resolve(signal);
        let dispatcher = self.dispatcher.clone();

        tokio::spawn(async move {
            let Some(resolution) = ticket.await else {
                return;
            };
            let job: Job = match resolution {
                Ok(payload) => Box::new(move || on_success(payload)),
                Err(e) => {
                    let message = e.to_string();
                    Box::new(move || on_error(message))
                }
            };
            if !dispatcher.post(job) {
                tracing::warn!("callback queue closed, dropping resolution result");
            }
        });
    }
}

type SharedCompletion<C> = std::sync::Arc<std::sync::Mutex<Option<C>>>;

fn take_and_call<C>(slot: &SharedCompletion<C>, value: Option<DetailsPayload>)
where
    C: FnOnce(Option<DetailsPayload>),
{
    let completion = slot
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .take();
    if let Some(completion) = completion {
        completion(value);
    }
}
