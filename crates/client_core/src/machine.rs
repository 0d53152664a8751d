//! Pure state transitions for the admin console.
//!
//! [`transition`] takes the current [`AppState`] and one [`Event`] and returns
//! the next state together with the effects a host must carry out: requests to
//! issue against the record service, notices to show, and view changes. It does
//! no I/O, so every flow can be driven headlessly.

use shared::{
    domain::{Credentials, PatientDraft, PatientRecord, RecentActivityEntry, SearchQuery},
    protocol::{ActivityQuery, StatusResponse},
};
use tracing::{debug, info, warn};

use crate::{
    error::{FormError, ServiceError},
    forms::{FormController, FormKind, FoundPatient},
    state::{AppState, FailureKind, NavTarget, Notice, Operation, SessionEpoch, View},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Navigate(NavTarget),
    EditField {
        form: FormKind,
        field: String,
        value: String,
    },
    ResetForm(FormKind),
    Submit(FormKind),
    Logout,
    DismissNotice,
    Completed {
        epoch: SessionEpoch,
        completion: Completion,
    },
}

impl Event {
    pub fn edit(form: FormKind, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::EditField {
            form,
            field: field.into(),
            value: value.into(),
        }
    }
}

/// One outbound call to the record service.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceRequest {
    Authenticate(Credentials),
    CreatePatient(PatientDraft),
    SearchPatient(SearchQuery),
    UpdatePatient(PatientRecord),
    RecentActivity(ActivityQuery),
}

impl ServiceRequest {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Authenticate(_) => Operation::Login,
            Self::CreatePatient(_) => Operation::CreatePatient,
            Self::SearchPatient(_) => Operation::SearchPatient,
            Self::UpdatePatient(_) => Operation::UpdatePatient,
            Self::RecentActivity(_) => Operation::RecentActivity,
        }
    }
}

/// The answer to a [`ServiceRequest`], fed back in as [`Event::Completed`]
/// together with the epoch the request was issued in.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Authenticated(Result<StatusResponse, ServiceError>),
    PatientCreated(Result<StatusResponse, ServiceError>),
    PatientFound {
        query: SearchQuery,
        result: Result<PatientRecord, ServiceError>,
    },
    PatientUpdated(Result<StatusResponse, ServiceError>),
    ActivityLoaded(Result<Vec<RecentActivityEntry>, ServiceError>),
}

impl Completion {
    pub fn operation(&self) -> Operation {
        match self {
            Self::Authenticated(_) => Operation::Login,
            Self::PatientCreated(_) => Operation::CreatePatient,
            Self::PatientFound { .. } => Operation::SearchPatient,
            Self::PatientUpdated(_) => Operation::UpdatePatient,
            Self::ActivityLoaded(_) => Operation::RecentActivity,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Issue {
        epoch: SessionEpoch,
        request: ServiceRequest,
    },
    Notify(Notice),
    Navigate(View),
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub state: AppState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(state: AppState) -> Self {
        Self {
            state,
            effects: Vec::new(),
        }
    }

    fn navigate(&mut self, view: View) {
        self.state.view = view;
    }

    fn notify(&mut self, notice: Notice) {
        self.state.notice = Some(notice.clone());
        self.effects.push(Effect::Notify(notice));
    }

    fn issue(&mut self, request: ServiceRequest) {
        self.effects.push(Effect::Issue {
            epoch: self.state.epoch,
            request,
        });
    }

    fn refresh_activity(&mut self) {
        let query = ActivityQuery::latest(self.state.activity_limit);
        self.issue(ServiceRequest::RecentActivity(query));
    }

    fn reject_form(&mut self, err: FormError) {
        warn!(error = %err, "form interaction rejected");
        self.notify(Notice::failure(FailureKind::Validation, None, err.to_string()));
    }
}

pub fn transition(state: AppState, event: Event) -> Transition {
    let before = state.active_view();
    let mut t = Transition::new(state);
    match event {
        Event::Navigate(target) => navigate(&mut t, target),
        Event::EditField { form, field, value } => edit_field(&mut t, form, &field, value),
        Event::ResetForm(form) => reset_form(&mut t, form),
        Event::Submit(form) => submit(&mut t, form),
        Event::Logout => logout(&mut t),
        Event::DismissNotice => t.state.notice = None,
        Event::Completed { epoch, completion } => complete(&mut t, epoch, completion),
    }

    let after = t.state.active_view();
    if before != after {
        debug!(from = %before, to = %after, "view changed");
        t.effects.push(Effect::Navigate(after));
    }
    t
}

fn navigate(t: &mut Transition, target: NavTarget) {
    if !t.state.authenticated {
        debug!(?target, "navigation ignored while signed out");
        return;
    }
    let leaving = t.state.active_view();
    if leaving == View::PatientDetails && target.view() != View::PatientDetails {
        t.state.found_patient = None;
    }
    t.state.notice = None;
    t.navigate(target.view());
}

fn ensure_on_screen(t: &Transition, form: FormKind) -> Result<(), FormError> {
    if t.state.active_view() == form.view() {
        Ok(())
    } else {
        Err(FormError::Inactive { form })
    }
}

fn edit_field(t: &mut Transition, form: FormKind, field: &str, value: String) {
    let result = ensure_on_screen(t, form).and_then(|()| {
        let state = &mut t.state;
        match form {
            FormKind::Login => state.credentials.set_field(field, value),
            FormKind::Register => state.patient_draft.set_field(field, value),
            FormKind::Search => state.search_query.set_field(field, value),
            FormKind::PatientDetails => match state.found_patient.as_mut() {
                Some(found) => found.set_field(field, value),
                None => Err(FormError::Inactive { form }),
            },
        }
    });
    if let Err(err) = result {
        t.reject_form(err);
    }
}

fn reset_form(t: &mut Transition, form: FormKind) {
    if let Err(err) = ensure_on_screen(t, form) {
        t.reject_form(err);
        return;
    }
    let state = &mut t.state;
    match form {
        FormKind::Login => state.credentials.reset(),
        FormKind::Register => state.patient_draft.reset(),
        FormKind::Search => state.search_query.reset(),
        FormKind::PatientDetails => {
            if let Some(found) = state.found_patient.as_mut() {
                found.reset();
            }
        }
    }
}

fn submit(t: &mut Transition, form: FormKind) {
    if let Err(err) = ensure_on_screen(t, form) {
        t.reject_form(err);
        return;
    }
    if t.state.pending.contains_key(&form) {
        debug!(%form, "submit ignored while a request is in flight");
        return;
    }

    let state = &t.state;
    let request = match form {
        FormKind::Login => state
            .credentials
            .check_required()
            .map(|()| ServiceRequest::Authenticate(state.credentials.clone())),
        FormKind::Register => state
            .patient_draft
            .check_required()
            .map(|()| ServiceRequest::CreatePatient(state.patient_draft.clone())),
        FormKind::Search => state
            .search_query
            .check_required()
            .map(|()| ServiceRequest::SearchPatient(state.search_query.clone())),
        FormKind::PatientDetails => match state.found_patient.as_ref() {
            Some(found) => found
                .check_required()
                .map(|()| ServiceRequest::UpdatePatient(found.record().clone())),
            None => Err(FormError::Inactive { form }),
        },
    };

    match request {
        Ok(request) => {
            debug!(%form, operation = request.operation().label(), "submitting form");
            t.state.pending.insert(form, t.state.epoch);
            t.state.notice = None;
            t.issue(request);
        }
        Err(err) => t.reject_form(err),
    }
}

fn logout(t: &mut Transition) {
    if t.state.authenticated {
        info!("signed out");
    }
    t.state.authenticated = false;
    t.state.epoch = t.state.epoch.next();
    t.state.credentials.clear();
    t.state.found_patient = None;
    t.state.notice = None;
    t.navigate(View::Login);
}

fn complete(t: &mut Transition, epoch: SessionEpoch, completion: Completion) {
    let operation = completion.operation();
    if let Some(form) = operation.form() {
        if t.state.pending.get(&form) == Some(&epoch) {
            t.state.pending.remove(&form);
        }
    }
    if epoch != t.state.epoch {
        debug!(
            operation = operation.label(),
            %epoch,
            current = %t.state.epoch,
            "discarding completion from an earlier session"
        );
        return;
    }

    match completion {
        Completion::Authenticated(result) => match result {
            Ok(_) => {
                info!(user_id = %t.state.credentials.user_id, "signed in");
                t.state.authenticated = true;
                t.state.epoch = t.state.epoch.next();
                t.state.credentials.clear();
                t.state.found_patient = None;
                t.state.notice = None;
                t.navigate(View::Dashboard);
                t.refresh_activity();
            }
            Err(err) => t.notify(failure_notice(operation, &err)),
        },
        Completion::PatientCreated(result) => match result {
            Ok(_) => {
                info!("patient registered");
                t.state.patient_draft.reset();
                t.notify(Notice::info(operation, "Patient registered successfully"));
                t.refresh_activity();
            }
            Err(err) => t.notify(failure_notice(operation, &err)),
        },
        Completion::PatientFound { query, result } => {
            if t.state.active_view() != View::Search {
                debug!("discarding search result; search view no longer active");
                return;
            }
            match result {
                Ok(record) => {
                    info!(patient = %record.display_name(), "patient found");
                    t.state.found_patient = Some(FoundPatient::new(record));
                    t.state.notice = None;
                    t.navigate(View::PatientDetails);
                }
                Err(ServiceError::NotFound { detail }) => {
                    let mut message = format!(
                        "No patient found for {} {}",
                        query.first_name, query.last_name
                    );
                    if let Some(detail) = detail.filter(|detail| !detail.trim().is_empty()) {
                        message.push_str(&format!(" ({detail})"));
                    }
                    t.notify(Notice::failure(
                        FailureKind::RemoteRejection,
                        Some(operation),
                        message,
                    ));
                }
                Err(err) => t.notify(failure_notice(operation, &err)),
            }
        }
        Completion::PatientUpdated(result) => match result {
            Ok(_) => {
                info!("patient updated");
                t.notify(Notice::info(operation, "Patient updated successfully"));
                t.navigate(View::Dashboard);
                t.refresh_activity();
            }
            Err(err) => t.notify(failure_notice(operation, &err)),
        },
        Completion::ActivityLoaded(result) => match result {
            Ok(entries) => {
                debug!(count = entries.len(), "recent activity refreshed");
                t.state.recent_activity = entries;
            }
            Err(err) => {
                warn!(error = %err, "recent activity refresh failed");
                if t.state.notice.is_none() {
                    t.notify(failure_notice(operation, &err));
                }
            }
        },
    }
}

fn failure_notice(operation: Operation, err: &ServiceError) -> Notice {
    let (action, generic) = match operation {
        Operation::Login => ("Login failed", "An error occurred during login"),
        Operation::CreatePatient => (
            "Registration failed",
            "An error occurred during patient registration",
        ),
        Operation::SearchPatient => ("Search failed", "An error occurred during patient search"),
        Operation::UpdatePatient => ("Update failed", "An error occurred during patient update"),
        Operation::RecentActivity => (
            "Could not load recent activity",
            "An error occurred while loading recent activity",
        ),
    };

    match err {
        ServiceError::Transport(reason) => {
            warn!(operation = operation.label(), %reason, "request did not complete");
            Notice::failure(FailureKind::Transport, Some(operation), generic)
        }
        ServiceError::Rejected(rejection) => {
            let kind = if operation == Operation::Login {
                FailureKind::Authentication
            } else {
                FailureKind::RemoteRejection
            };
            Notice::failure(
                kind,
                Some(operation),
                format!("{action}: {}", rejection.message),
            )
        }
        ServiceError::NotFound { detail } => {
            let kind = if operation == Operation::Login {
                FailureKind::Authentication
            } else {
                FailureKind::RemoteRejection
            };
            let reason = detail.as_deref().unwrap_or("not found");
            Notice::failure(kind, Some(operation), format!("{action}: {reason}"))
        }
    }
}

#[cfg(test)]
#[path = "tests/machine_tests.rs"]
mod tests;
