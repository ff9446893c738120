use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use tally_core::{DomainResult, EventId, OwnerId, ValidationErrors};

use crate::patch::{double_option, merge};

/// A sales occasion (a convention, a market day, a birthday).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub owner: OwnerId,
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Input: create an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub name: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl NewEvent {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = ValidationErrors::new();
        if self.name.trim().is_empty() {
            errors.push("name", "must not be blank");
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                errors.push("end_date", "must not be before start_date");
            }
        }
        errors.into_result()
    }

    pub fn into_event(self, id: EventId, owner: OwnerId) -> DomainResult<Event> {
        self.validate()?;
        Ok(Event {
            id,
            owner,
            name: self.name.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
        })
    }
}

/// Input: partial update of an event. `null` clears a date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    pub end_date: Option<Option<NaiveDate>>,
}

impl Event {
    /// Re-checks a stored event against the create-time rules.
    pub fn validate(&self) -> DomainResult<()> {
        NewEvent {
            name: self.name.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
        .validate()
    }

    /// The event with `patch` merged in, re-validated as a whole.
    pub fn patched(&self, patch: &EventPatch) -> DomainResult<Event> {
        let merged = NewEvent {
            name: merge(&patch.name, &self.name),
            start_date: merge(&patch.start_date, &self.start_date),
            end_date: merge(&patch.end_date, &self.end_date),
        };
        merged.into_event(self.id, self.owner.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::DomainError;

    fn owner() -> OwnerId {
        OwnerId::new("maya").unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn convention() -> Event {
        NewEvent {
            name: "Anime North 2025".to_string(),
            start_date: Some(date(2025, 5, 23)),
            end_date: Some(date(2025, 5, 25)),
        }
        .into_event(EventId::new(), owner())
        .unwrap()
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = NewEvent {
            name: "  ".to_string(),
            start_date: None,
            end_date: None,
        }
        .validate()
        .unwrap_err();
        match err {
            DomainError::Validation(v) => assert_eq!(v.fields()[0].field, "name"),
            _ => panic!("Expected Validation"),
        }
    }

    #[test]
    fn end_before_start_is_rejected() {
        let input = NewEvent {
            name: "Market".to_string(),
            start_date: Some(date(2025, 6, 2)),
            end_date: Some(date(2025, 6, 1)),
        };
        assert!(matches!(input.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn patch_keeps_unset_fields_and_clears_explicit_nulls() {
        let event = convention();
        let patch: EventPatch =
            serde_json::from_str(r#"{"name": "Anime North", "end_date": null}"#).unwrap();

        let patched = event.patched(&patch).unwrap();
        assert_eq!(patched.id, event.id);
        assert_eq!(patched.name, "Anime North");
        assert_eq!(patched.start_date, event.start_date);
        assert_eq!(patched.end_date, None);
    }

    #[test]
    fn stored_event_is_checked_like_input() {
        assert!(convention().validate().is_ok());

        let reversed = Event {
            start_date: Some(date(2025, 6, 2)),
            end_date: Some(date(2025, 6, 1)),
            ..convention()
        };
        assert!(matches!(reversed.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn patch_is_validated_against_merged_state() {
        let event = convention();
        let patch = EventPatch {
            end_date: Some(Some(date(2025, 1, 1))),
            ..EventPatch::default()
        };
        assert!(event.patched(&patch).is_err());
    }
}
