//! Plain-text rendering of the active view.

use std::fmt::Write as _;

use client_core::{AppState, FormController, FormKind, FoundPatient, Notice, Severity, View};
use shared::domain::{Credentials, PatientDraft, SearchQuery};

pub const TITLE: &str = "Genesis Global Medical Department";

pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    let view = state.active_view();

    if view == View::Login {
        out.push_str("== Admin Login ==\n");
    } else {
        let _ = writeln!(out, "== {TITLE} ==");
        out.push_str("[dashboard] [register] [search] [logout]\n\n");
    }

    match view {
        View::Login => render_form::<Credentials>(&mut out, state.credentials(), &[]),
        View::Dashboard => render_dashboard(&mut out, state),
        View::Register => {
            out.push_str("-- Register New Patient --\n");
            render_form::<PatientDraft>(&mut out, state.patient_draft(), &[]);
        }
        View::Search => {
            out.push_str("-- Search Patient --\n");
            render_form::<SearchQuery>(&mut out, state.search_query(), &[]);
        }
        View::PatientDetails => {
            out.push_str("-- Patient Details --\n");
            if let Some(found) = state.found_patient() {
                render_form(&mut out, found, FoundPatient::READ_ONLY);
                if found.is_modified() {
                    out.push_str("(unsaved changes)\n");
                }
            }
        }
    }

    if let Some(form) = FormKind::for_view(view) {
        if state.is_pending(form) {
            out.push_str("... waiting for the record service\n");
        }
    }
    if let Some(notice) = state.notice() {
        out.push('\n');
        out.push_str(&render_notice(notice));
        out.push('\n');
    }
    out
}

fn render_form<F: FormController>(out: &mut String, form: &F, locked: &[&str]) {
    for name in F::FIELDS {
        let value = form.field(name).unwrap_or_default();
        let shown = if *name == "password" && !value.is_empty() {
            "*".repeat(value.chars().count())
        } else {
            value.to_string()
        };
        let required = if F::REQUIRED.contains(name) { "*" } else { " " };
        let lock = if locked.contains(name) { " (locked)" } else { "" };
        let _ = writeln!(out, "{required} {name:<13} {shown}{lock}");
    }
}

fn render_dashboard(out: &mut String, state: &AppState) {
    out.push_str("-- Recent Jobs --\n");
    let entries = state.recent_activity();
    if entries.is_empty() {
        out.push_str("(no recent activity)\n");
        return;
    }
    let _ = writeln!(out, "{:<24} {:<14} {}", "Patient", "Action", "Date");
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<24} {:<14} {}",
            entry.patient, entry.action, entry.date
        );
    }
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.severity {
        Severity::Info => format!("ok: {}", notice.message),
        Severity::Error => format!("error: {}", notice.message),
    }
}
