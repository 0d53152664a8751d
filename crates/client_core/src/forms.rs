//! Per-entity form controllers: field mutation, reset and required-field checks.

use std::fmt;

use shared::domain::{Credentials, PatientDraft, PatientRecord, SearchQuery};

use crate::{error::FormError, state::View};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormKind {
    Login,
    Register,
    Search,
    PatientDetails,
}

impl FormKind {
    pub fn view(self) -> View {
        match self {
            Self::Login => View::Login,
            Self::Register => View::Register,
            Self::Search => View::Search,
            Self::PatientDetails => View::PatientDetails,
        }
    }

    /// The form rendered by `view`, if it has one.
    pub fn for_view(view: View) -> Option<Self> {
        match view {
            View::Login => Some(Self::Login),
            View::Dashboard => None,
            View::Register => Some(Self::Register),
            View::Search => Some(Self::Search),
            View::PatientDetails => Some(Self::PatientDetails),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::Search => "search",
            Self::PatientDetails => "patient details",
        }
    }
}

impl fmt::Display for FormKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub trait FormController {
    const KIND: FormKind;
    /// Field names in display order.
    const FIELDS: &'static [&'static str];
    const REQUIRED: &'static [&'static str];
    const READ_ONLY: &'static [&'static str] = &[];

    fn field(&self, name: &str) -> Option<&str>;

    fn field_mut(&mut self, name: &str) -> Option<&mut String>;

    fn reset(&mut self);

    /// Replaces one field. Values are not validated here.
    fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        if let Some(field) = Self::READ_ONLY.iter().copied().find(|field| *field == name) {
            return Err(FormError::ReadOnlyField {
                form: Self::KIND,
                field,
            });
        }
        let slot = self.field_mut(name).ok_or_else(|| FormError::UnknownField {
            form: Self::KIND,
            field: name.to_string(),
        })?;
        *slot = value.into();
        Ok(())
    }

    fn missing_required(&self) -> Vec<&'static str> {
        Self::REQUIRED
            .iter()
            .copied()
            .filter(|name| self.field(name).map_or(true, |value| value.trim().is_empty()))
            .collect()
    }

    fn check_required(&self) -> Result<(), FormError> {
        let fields = self.missing_required();
        if fields.is_empty() {
            Ok(())
        } else {
            Err(FormError::MissingRequired {
                form: Self::KIND,
                fields,
            })
        }
    }
}

impl FormController for Credentials {
    const KIND: FormKind = FormKind::Login;
    const FIELDS: &'static [&'static str] = &["user_id", "password"];
    const REQUIRED: &'static [&'static str] = &["user_id", "password"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "user_id" => Some(&self.user_id),
            "password" => Some(&self.password),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "user_id" => Some(&mut self.user_id),
            "password" => Some(&mut self.password),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.clear();
    }
}

const PATIENT_FIELDS: &[&str] = &[
    "first_name",
    "last_name",
    "dob",
    "phone",
    "weight",
    "sugar_level",
    "blood_level",
    "prescription",
];

const PATIENT_IDENTITY_FIELDS: &[&str] = &["first_name", "last_name", "dob", "phone"];

impl FormController for PatientDraft {
    const KIND: FormKind = FormKind::Register;
    const FIELDS: &'static [&'static str] = PATIENT_FIELDS;
    const REQUIRED: &'static [&'static str] = PATIENT_IDENTITY_FIELDS;

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "first_name" => Some(&self.first_name),
            "last_name" => Some(&self.last_name),
            "dob" => Some(&self.dob),
            "phone" => Some(&self.phone),
            "weight" => Some(&self.weight),
            "sugar_level" => Some(&self.sugar_level),
            "blood_level" => Some(&self.blood_level),
            "prescription" => Some(&self.prescription),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "first_name" => Some(&mut self.first_name),
            "last_name" => Some(&mut self.last_name),
            "dob" => Some(&mut self.dob),
            "phone" => Some(&mut self.phone),
            "weight" => Some(&mut self.weight),
            "sugar_level" => Some(&mut self.sugar_level),
            "blood_level" => Some(&mut self.blood_level),
            "prescription" => Some(&mut self.prescription),
            _ => None,
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

impl FormController for SearchQuery {
    const KIND: FormKind = FormKind::Search;
    const FIELDS: &'static [&'static str] = &["first_name", "last_name"];
    const REQUIRED: &'static [&'static str] = &["first_name", "last_name"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "first_name" => Some(&self.first_name),
            "last_name" => Some(&self.last_name),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "first_name" => Some(&mut self.first_name),
            "last_name" => Some(&mut self.last_name),
            _ => None,
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A record found by search, plus the local edits made to it.
///
/// Identity fields are read-only; resetting discards edits and restores the
/// record exactly as the service returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundPatient {
    fetched: PatientRecord,
    edited: PatientRecord,
}

impl FoundPatient {
    pub fn new(record: PatientRecord) -> Self {
        Self {
            edited: record.clone(),
            fetched: record,
        }
    }

    pub fn record(&self) -> &PatientRecord {
        &self.edited
    }

    pub fn fetched(&self) -> &PatientRecord {
        &self.fetched
    }

    pub fn is_modified(&self) -> bool {
        self.edited != self.fetched
    }
}

impl FormController for FoundPatient {
    const KIND: FormKind = FormKind::PatientDetails;
    const FIELDS: &'static [&'static str] = PATIENT_FIELDS;
    const REQUIRED: &'static [&'static str] = &[];
    const READ_ONLY: &'static [&'static str] = PATIENT_IDENTITY_FIELDS;

    fn field(&self, name: &str) -> Option<&str> {
        let record = &self.edited;
        match name {
            "first_name" => Some(&record.first_name),
            "last_name" => Some(&record.last_name),
            "dob" => Some(&record.dob),
            "phone" => Some(&record.phone),
            "weight" => Some(&record.weight),
            "sugar_level" => Some(&record.sugar_level),
            "blood_level" => Some(&record.blood_level),
            "prescription" => Some(&record.prescription),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        let record = &mut self.edited;
        match name {
            "weight" => Some(&mut record.weight),
            "sugar_level" => Some(&mut record.sugar_level),
            "blood_level" => Some(&mut record.blood_level),
            "prescription" => Some(&mut record.prescription),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.edited = self.fetched.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> PatientRecord {
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

    #[test]
    fn set_field_replaces_value_without_validation() {
        let mut draft = PatientDraft::default();
        draft.set_field("weight", "not a number").expect("set");
        assert_eq!(draft.weight, "not a number");
    }

    #[test]
    fn unknown_field_is_rejected() {
        let mut query = SearchQuery::default();
        let err = query.set_field("dob", "1990-01-01").expect_err("unknown");
        assert_eq!(
            err,
            FormError::UnknownField {
                form: FormKind::Search,
                field: "dob".into()
            }
        );
    }

    #[test]
    fn reset_twice_matches_reset_once() {
        let mut draft = PatientDraft::default();
        draft.set_field("first_name", "John").expect("set");
        draft.set_field("prescription", "aspirin").expect("set");

        draft.reset();
        let once = draft.clone();
        draft.reset();
        assert_eq!(draft, once);
        assert_eq!(draft, PatientDraft::default());
    }

    #[test]
    fn missing_required_lists_blank_fields_in_order() {
        let mut draft = PatientDraft::default();
        draft.set_field("last_name", "Doe").expect("set");
        draft.set_field("phone", "   ").expect("set");
        assert_eq!(draft.missing_required(), vec!["first_name", "dob", "phone"]);

        let creds = Credentials::new("admin", "");
        assert_eq!(
            creds.check_required(),
            Err(FormError::MissingRequired {
                form: FormKind::Login,
                fields: vec!["password"],
            })
        );
    }

    #[test]
    fn found_patient_identity_is_read_only() {
        let mut found = FoundPatient::new(jane());
        let err = found.set_field("last_name", "Jones").expect_err("read only");
        assert!(matches!(err, FormError::ReadOnlyField { field: "last_name", .. }));
        assert_eq!(found.record().last_name, "Smith");
    }

    #[test]
    fn found_patient_reset_restores_fetched_record() {
        let mut found = FoundPatient::new(jane());
        found.set_field("prescription", "metformin").expect("set");
        assert!(found.is_modified());

        found.reset();
        assert!(!found.is_modified());
        assert_eq!(found.record(), &jane());
    }
}
