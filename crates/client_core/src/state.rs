//! Session gate, active view and per-form drafts for one console session.

use std::{collections::BTreeMap, fmt};

use shared::{
    domain::{Credentials, PatientDraft, PatientRecord, RecentActivityEntry, SearchQuery},
    protocol::DEFAULT_ACTIVITY_LIMIT,
};

use crate::forms::{FormKind, FoundPatient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Login,
    Dashboard,
    Register,
    Search,
    PatientDetails,
}

impl View {
    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Dashboard => "dashboard",
            Self::Register => "register",
            Self::Search => "search",
            Self::PatientDetails => "patientDetails",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Views a signed-in user can pick from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavTarget {
    Dashboard,
    Register,
    Search,
}

impl NavTarget {
    pub fn view(self) -> View {
        match self {
            Self::Dashboard => View::Dashboard,
            Self::Register => View::Register,
            Self::Search => View::Search,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Login,
    CreatePatient,
    SearchPatient,
    UpdatePatient,
    RecentActivity,
}

impl Operation {
    pub fn form(self) -> Option<FormKind> {
        match self {
            Self::Login => Some(FormKind::Login),
            Self::CreatePatient => Some(FormKind::Register),
            Self::SearchPatient => Some(FormKind::Search),
            Self::UpdatePatient => Some(FormKind::PatientDetails),
            Self::RecentActivity => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::CreatePatient => "create_patient",
            Self::SearchPatient => "search_patient",
            Self::UpdatePatient => "update_patient",
            Self::RecentActivity => "recent_activity",
        }
    }
}

/// Counts sign-ins and sign-outs. Every request carries the epoch it was
/// issued in, and its completion is only applied while that epoch is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionEpoch(pub u64);

impl SessionEpoch {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Authentication,
    Validation,
    RemoteRejection,
    Transport,
}

/// A message surfaced to the operator after an interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub kind: Option<FailureKind>,
    pub operation: Option<Operation>,
    pub message: String,
}

impl Notice {
    pub fn info(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            kind: None,
            operation: Some(operation),
            message: message.into(),
        }
    }

    pub fn failure(
        kind: FailureKind,
        operation: Option<Operation>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            kind: Some(kind),
            operation,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub(crate) authenticated: bool,
    pub(crate) epoch: SessionEpoch,
    pub(crate) view: View,
    pub(crate) credentials: Credentials,
    pub(crate) patient_draft: PatientDraft,
    pub(crate) search_query: SearchQuery,
    pub(crate) found_patient: Option<FoundPatient>,
    pub(crate) recent_activity: Vec<RecentActivityEntry>,
    pub(crate) notice: Option<Notice>,
    /// Forms with a request in flight, keyed to the epoch it was issued in.
    pub(crate) pending: BTreeMap<FormKind, SessionEpoch>,
    pub(crate) activity_limit: u32,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_LIMIT)
    }
}

impl AppState {
    pub fn new(activity_limit: u32) -> Self {
        Self {
            authenticated: false,
            epoch: SessionEpoch::default(),
            view: View::Login,
            credentials: Credentials::default(),
            patient_draft: PatientDraft::default(),
            search_query: SearchQuery::default(),
            found_patient: None,
            recent_activity: Vec::new(),
            notice: None,
            pending: BTreeMap::new(),
            activity_limit: activity_limit.max(1),
        }
    }

    pub fn authenticated(&self) -> bool {
        self.authenticated
    }

    /// The view to render. Always `Login` while unauthenticated.
    pub fn active_view(&self) -> View {
        if !self.authenticated {
            return View::Login;
        }
        match self.view {
            View::Login => View::Dashboard,
            View::PatientDetails if self.found_patient.is_none() => View::Search,
            view => view,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn patient_draft(&self) -> &PatientDraft {
        &self.patient_draft
    }

    pub fn search_query(&self) -> &SearchQuery {
        &self.search_query
    }

    pub fn found_patient(&self) -> Option<&FoundPatient> {
        self.found_patient.as_ref()
    }

    pub fn patient_record(&self) -> Option<&PatientRecord> {
        self.found_patient.as_ref().map(FoundPatient::record)
    }

    pub fn recent_activity(&self) -> &[RecentActivityEntry] {
        &self.recent_activity
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_pending(&self, form: FormKind) -> bool {
        self.pending.contains_key(&form)
    }

    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn activity_limit(&self) -> u32 {
        self.activity_limit
    }
}
