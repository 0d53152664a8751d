use std::{collections::VecDeque, sync::Arc};

use tokio::sync::mpsc;
use tracing::debug;

pub mod activity;
pub mod error;
pub mod forms;
pub mod machine;
pub mod service;
pub mod state;

pub use activity::{ActivityFeed, PlaceholderActivityFeed, RemoteActivityFeed};
pub use error::{FormError, ServiceError};
pub use forms::{FormController, FormKind, FoundPatient};
pub use machine::{transition, Completion, Effect, Event, ServiceRequest, Transition};
pub use service::{HttpRecordService, RecordService};
pub use state::{
    AppState, FailureKind, NavTarget, Notice, Operation, SessionEpoch, Severity, View,
};

/// Type of the channel the console's spawned requests report back on.
pub type ReplySender = mpsc::UnboundedSender<Event>;

/// Performs service requests. Cheap to clone into spawned tasks.
#[derive(Clone)]
struct Backend {
    service: Arc<dyn RecordService>,
    activity: Arc<dyn ActivityFeed>,
}

impl Backend {
    async fn execute(&self, request: ServiceRequest) -> Completion {
        debug!(operation = request.operation().label(), "issuing request");
        match request {
            ServiceRequest::Authenticate(credentials) => {
                Completion::Authenticated(self.service.authenticate(&credentials).await)
            }
            ServiceRequest::CreatePatient(draft) => {
                Completion::PatientCreated(self.service.create_patient(&draft).await)
            }
            ServiceRequest::SearchPatient(query) => {
                let result = self.service.search_patient(&query).await;
                Completion::PatientFound { query, result }
            }
            ServiceRequest::UpdatePatient(record) => {
                Completion::PatientUpdated(self.service.update_patient(&record).await)
            }
            ServiceRequest::RecentActivity(query) => {
                Completion::ActivityLoaded(self.activity.recent(query).await)
            }
        }
    }
}

/// Owns one console's [`AppState`] and carries out the effects produced by
/// [`transition`] against the record service.
pub struct AdminConsole {
    state: AppState,
    backend: Backend,
}

impl AdminConsole {
    /// Console whose activity feed comes from the same record service.
    pub fn new(service: Arc<dyn RecordService>, activity_limit: u32) -> Self {
        let activity = Arc::new(RemoteActivityFeed::new(Arc::clone(&service)));
        Self::with_activity_feed(service, activity, activity_limit)
    }

    pub fn with_activity_feed(
        service: Arc<dyn RecordService>,
        activity: Arc<dyn ActivityFeed>,
        activity_limit: u32,
    ) -> Self {
        Self {
            state: AppState::new(activity_limit),
            backend: Backend { service, activity },
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Applies one event without performing any I/O.
    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        let Transition { state, effects } = transition(std::mem::take(&mut self.state), event);
        self.state = state;
        effects
    }

    /// Performs one request and packages the answer as a completion.
    pub async fn execute(&self, request: ServiceRequest) -> Completion {
        self.backend.execute(request).await
    }

    /// Applies `event` and starts every request it issues on its own task.
    /// Each answer arrives on `replies` as an [`Event::Completed`] to be fed
    /// back through `handle`; the console stays usable in the meantime.
    pub fn handle(&mut self, event: Event, replies: &ReplySender) -> Vec<Effect> {
        let effects = self.apply(event);
        for effect in &effects {
            let Effect::Issue { epoch, request } = effect else {
                continue;
            };
            let backend = self.backend.clone();
            let replies = replies.clone();
            let (epoch, request) = (*epoch, request.clone());
            tokio::spawn(async move {
                let completion = backend.execute(request).await;
                if replies.send(Event::Completed { epoch, completion }).is_err() {
                    debug!(%epoch, "console closed before the reply arrived");
                }
            });
        }
        effects
    }

    /// Applies `event`, then runs every request it (and its follow-ups) issue
    /// inline until the console is quiet. Returns all effects in order.
    pub async fn dispatch(&mut self, event: Event) -> Vec<Effect> {
        let mut queue = VecDeque::from([event]);
        let mut observed = Vec::new();
        while let Some(event) = queue.pop_front() {
            for effect in self.apply(event) {
                if let Effect::Issue { epoch, request } = &effect {
                    let completion = self.execute(request.clone()).await;
                    queue.push_back(Event::Completed {
                        epoch: *epoch,
                        completion,
                    });
                }
                observed.push(effect);
            }
        }
        observed
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
