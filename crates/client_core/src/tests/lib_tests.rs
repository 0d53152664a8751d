use super::*;
use async_trait::async_trait;
use shared::{
    domain::{
        ActivityId, Credentials, PatientDraft, PatientRecord, RecentActivityEntry, SearchQuery,
    },
    error::RemoteRejection,
    protocol::{ActivityQuery, StatusResponse},
};
use tokio::sync::{mpsc, Mutex, Notify};

#[derive(Default)]
struct FakeRecordService {
    records: Vec<PatientRecord>,
    fail_with: Option<ServiceError>,
    search_gate: Option<Arc<Notify>>,
    calls: Mutex<Vec<ServiceRequest>>,
}

impl FakeRecordService {
    fn with_records(records: Vec<PatientRecord>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }

    fn failing(err: ServiceError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::default()
        }
    }

    async fn record_call(&self, request: ServiceRequest) -> Result<(), ServiceError> {
        self.calls.lock().await.push(request);
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordService for FakeRecordService {
    async fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> Result<StatusResponse, ServiceError> {
        self.record_call(ServiceRequest::Authenticate(credentials.clone()))
            .await?;
        if credentials.password == "x" {
            Ok(StatusResponse::default())
        } else {
            Err(RemoteRejection::new(401, "invalid credentials").into())
        }
    }

    async fn create_patient(&self, draft: &PatientDraft) -> Result<StatusResponse, ServiceError> {
        self.record_call(ServiceRequest::CreatePatient(draft.clone()))
            .await?;
        Ok(StatusResponse::default())
    }

    async fn search_patient(&self, query: &SearchQuery) -> Result<PatientRecord, ServiceError> {
        self.record_call(ServiceRequest::SearchPatient(query.clone()))
            .await?;
        if let Some(gate) = &self.search_gate {
            gate.notified().await;
        }
        self.records
            .iter()
            .find(|r| r.first_name == query.first_name && r.last_name == query.last_name)
            .cloned()
            .ok_or(ServiceError::NotFound { detail: None })
    }

    async fn update_patient(
        &self,
        record: &PatientRecord,
    ) -> Result<StatusResponse, ServiceError> {
        self.record_call(ServiceRequest::UpdatePatient(record.clone()))
            .await?;
        Ok(StatusResponse::default())
    }

    async fn recent_activity(
        &self,
        query: ActivityQuery,
    ) -> Result<Vec<RecentActivityEntry>, ServiceError> {
        self.record_call(ServiceRequest::RecentActivity(query))
            .await?;
        Ok(vec![RecentActivityEntry {
            id: ActivityId(9),
            patient: "Jane Smith".into(),
            action: "Update".into(),
            date: "2024-10-22".into(),
        }])
    }
}

fn jane_smith() -> PatientRecord {
    PatientRecord {
        first_name: "Jane".into(),
        last_name: "Smith".into(),
        dob: "1980-02-01".into(),
        phone: "555-0101".into(),
        weight: "61".into(),
        sugar_level: "5.1".into(),
        blood_level: "O+".into(),
        prescription: "none".into(),
        ..PatientRecord::default()
    }
}

async fn signed_in_console(service: Arc<FakeRecordService>) -> AdminConsole {
    let mut console = AdminConsole::new(service, 5);
    console
        .dispatch(Event::edit(FormKind::Login, "user_id", "admin"))
        .await;
    console
        .dispatch(Event::edit(FormKind::Login, "password", "x"))
        .await;
    console.dispatch(Event::Submit(FormKind::Login)).await;
    console
}

#[tokio::test]
async fn login_flow_reaches_dashboard_and_loads_activity() {
    let service = Arc::new(FakeRecordService::default());
    let console = signed_in_console(Arc::clone(&service)).await;

    assert!(console.state().authenticated());
    assert_eq!(console.state().active_view(), View::Dashboard);
    assert_eq!(console.state().credentials(), &Credentials::default());
    assert_eq!(console.state().recent_activity().len(), 1);

    let calls = service.calls.lock().await;
    assert_eq!(
        *calls,
        vec![
            ServiceRequest::Authenticate(Credentials::new("admin", "x")),
            ServiceRequest::RecentActivity(ActivityQuery::latest(5)),
        ]
    );
}

#[tokio::test]
async fn validation_failure_issues_no_request() {
    let service = Arc::new(FakeRecordService::default());
    let mut console = AdminConsole::new(service.clone(), 5);

    let effects = console.dispatch(Event::Submit(FormKind::Login)).await;

    assert!(matches!(
        effects.as_slice(),
        [Effect::Notify(Notice {
            kind: Some(FailureKind::Validation),
            ..
        })]
    ));
    assert!(service.calls.lock().await.is_empty());
}

#[tokio::test]
async fn search_then_update_round_trips_record() {
    let service = Arc::new(FakeRecordService::with_records(vec![jane_smith()]));
    let mut console = signed_in_console(Arc::clone(&service)).await;

    console.dispatch(Event::Navigate(NavTarget::Search)).await;
    console
        .dispatch(Event::edit(FormKind::Search, "first_name", "Jane"))
        .await;
    console
        .dispatch(Event::edit(FormKind::Search, "last_name", "Smith"))
        .await;
    let effects = console.dispatch(Event::Submit(FormKind::Search)).await;
    assert!(effects.contains(&Effect::Navigate(View::PatientDetails)));
    assert_eq!(console.state().patient_record(), Some(&jane_smith()));

    let effects = console.dispatch(Event::Submit(FormKind::PatientDetails)).await;
    assert!(effects.contains(&Effect::Navigate(View::Dashboard)));

    let calls = service.calls.lock().await;
    let sent = calls.iter().find_map(|call| match call {
        ServiceRequest::UpdatePatient(record) => Some(record.clone()),
        _ => None,
    });
    assert_eq!(sent, Some(jane_smith()));
    assert!(matches!(calls.last(), Some(ServiceRequest::RecentActivity(_))));
}

#[tokio::test]
async fn unknown_patient_stays_on_search() {
    let service = Arc::new(FakeRecordService::default());
    let mut console = signed_in_console(service).await;

    console.dispatch(Event::Navigate(NavTarget::Search)).await;
    console
        .dispatch(Event::edit(FormKind::Search, "first_name", "Jane"))
        .await;
    console
        .dispatch(Event::edit(FormKind::Search, "last_name", "Smith"))
        .await;
    console.dispatch(Event::Submit(FormKind::Search)).await;

    assert_eq!(console.state().active_view(), View::Search);
    assert!(console.state().patient_record().is_none());
    assert!(console.state().notice().is_some_and(Notice::is_error));
}

#[tokio::test]
async fn transport_fault_leaves_session_signed_out() {
    let service = Arc::new(FakeRecordService::failing(ServiceError::Transport(
        "connection refused".into(),
    )));
    let mut console = AdminConsole::with_activity_feed(
        service,
        Arc::new(PlaceholderActivityFeed),
        5,
    );
    console
        .dispatch(Event::edit(FormKind::Login, "user_id", "admin"))
        .await;
    console
        .dispatch(Event::edit(FormKind::Login, "password", "x"))
        .await;
    console.dispatch(Event::Submit(FormKind::Login)).await;

    assert!(!console.state().authenticated());
    assert_eq!(console.state().credentials(), &Credentials::new("admin", "x"));
    let notice = console.state().notice().expect("notice");
    assert_eq!(notice.kind, Some(FailureKind::Transport));
    assert!(!console.state().is_pending(FormKind::Login));
}

#[tokio::test]
async fn placeholder_feed_is_used_when_configured() {
    let service = Arc::new(FakeRecordService::default());
    let mut console = AdminConsole::with_activity_feed(
        service.clone(),
        Arc::new(PlaceholderActivityFeed),
        5,
    );
    console
        .dispatch(Event::edit(FormKind::Login, "user_id", "admin"))
        .await;
    console
        .dispatch(Event::edit(FormKind::Login, "password", "x"))
        .await;
    console.dispatch(Event::Submit(FormKind::Login)).await;

    let patients: Vec<&str> = console
        .state()
        .recent_activity()
        .iter()
        .map(|entry| entry.patient.as_str())
        .collect();
    assert_eq!(patients, vec!["Jane Smith", "John Doe"]);
    assert_eq!(service.calls.lock().await.len(), 1);
}

#[tokio::test]
async fn apply_does_not_touch_the_service() {
    let service = Arc::new(FakeRecordService::default());
    let mut console = AdminConsole::new(service.clone(), 5);
    console.apply(Event::edit(FormKind::Login, "user_id", "admin"));
    console.apply(Event::edit(FormKind::Login, "password", "x"));

    let effects = console.apply(Event::Submit(FormKind::Login));

    assert_eq!(
        effects,
        vec![Effect::Issue {
            epoch: SessionEpoch::default(),
            request: ServiceRequest::Authenticate(Credentials::new("admin", "x")),
        }]
    );
    assert!(console.state().is_pending(FormKind::Login));
    assert!(service.calls.lock().await.is_empty());
}

#[tokio::test]
async fn console_keeps_handling_events_while_a_search_is_outstanding() {
    let gate = Arc::new(Notify::new());
    let service = Arc::new(FakeRecordService {
        records: vec![jane_smith()],
        search_gate: Some(Arc::clone(&gate)),
        ..FakeRecordService::default()
    });
    let mut console = signed_in_console(Arc::clone(&service)).await;
    let (replies_tx, mut replies) = mpsc::unbounded_channel();

    console.handle(Event::Navigate(NavTarget::Search), &replies_tx);
    console.handle(Event::edit(FormKind::Search, "first_name", "Jane"), &replies_tx);
    console.handle(Event::edit(FormKind::Search, "last_name", "Smith"), &replies_tx);
    let effects = console.handle(Event::Submit(FormKind::Search), &replies_tx);
    assert!(matches!(
        effects.as_slice(),
        [Effect::Issue {
            request: ServiceRequest::SearchPatient(_),
            ..
        }]
    ));
    assert!(console.state().is_pending(FormKind::Search));

    let effects = console.handle(Event::Navigate(NavTarget::Dashboard), &replies_tx);
    assert_eq!(effects, vec![Effect::Navigate(View::Dashboard)]);
    assert_eq!(console.state().active_view(), View::Dashboard);
    assert!(console.state().is_pending(FormKind::Search));

    gate.notify_one();
    let reply = replies.recv().await.expect("search reply");
    assert!(matches!(
        &reply,
        Event::Completed {
            completion: Completion::PatientFound { result: Ok(_), .. },
            ..
        }
    ));
    console.handle(reply, &replies_tx);

    assert_eq!(console.state().active_view(), View::Dashboard);
    assert!(console.state().patient_record().is_none());
    assert!(!console.state().is_pending(FormKind::Search));
}

#[tokio::test]
async fn handled_requests_report_back_on_the_reply_channel() {
    let service = Arc::new(FakeRecordService::default());
    let mut console = AdminConsole::new(service, 5);
    let (replies_tx, mut replies) = mpsc::unbounded_channel();

    console.handle(Event::edit(FormKind::Login, "user_id", "admin"), &replies_tx);
    console.handle(Event::edit(FormKind::Login, "password", "x"), &replies_tx);
    console.handle(Event::Submit(FormKind::Login), &replies_tx);
    assert!(!console.state().authenticated());

    let reply = replies.recv().await.expect("login reply");
    let effects = console.handle(reply, &replies_tx);
    assert!(console.state().authenticated());
    assert!(effects.contains(&Effect::Navigate(View::Dashboard)));

    let reply = replies.recv().await.expect("activity reply");
    console.handle(reply, &replies_tx);
    assert_eq!(console.state().recent_activity().len(), 1);
}
