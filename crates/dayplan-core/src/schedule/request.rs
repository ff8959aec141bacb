use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A caller's choice for a label the engine can also pick by itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Override {
    /// Let the engine decide.
    #[default]
    Auto,
    /// Omit the block entirely.
    Skip,
    Explicit(String),
}

impl Override {
    /// Absent, empty, or `auto` map to [`Override::Auto`]; `skip` maps to
    /// [`Override::Skip`]; anything else is taken verbatim.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Override::Auto;
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
            Override::Auto
        } else if trimmed.eq_ignore_ascii_case("skip") {
            Override::Skip
        } else {
            Override::Explicit(trimmed.to_string())
        }
    }

    pub fn explicit(&self) -> Option<&str> {
        match self {
            Override::Explicit(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Override {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Override::Auto => f.write_str("auto"),
            Override::Skip => f.write_str("skip"),
            Override::Explicit(value) => f.write_str(value),
        }
    }
}

impl Serialize for Override {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Override {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Override::parse(raw.as_deref()))
    }
}

/// Input to one planning run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningRequest {
    /// Defaults to tomorrow when absent.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Free text; not read by the rule-based engine.
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub lunch: Override,
    #[serde(default)]
    pub dinner: Override,
    #[serde(default)]
    pub workout: Override,
}

impl PlanningRequest {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    /// Builds a request from raw string fields, as received from a CLI or form.
    pub fn from_raw(
        date: Option<&str>,
        lunch: Option<&str>,
        dinner: Option<&str>,
        workout: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let date = match date.map(str::trim).filter(|d| !d.is_empty()) {
            Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
                ValidationError::InvalidValue {
                    field: "date".into(),
                    message: format!("'{raw}' is not a YYYY-MM-DD date: {e}"),
                }
            })?),
            None => None,
        };
        let request = Self {
            date,
            notes: notes.map(str::to_string),
            lunch: Override::parse(lunch),
            dinner: Override::parse(dinner),
            workout: Override::parse(workout),
        };
        request.validate()?;
        Ok(request)
    }

    /// Only the workout may be skipped.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("lunch", &self.lunch), ("dinner", &self.dinner)] {
            if *value == Override::Skip {
                return Err(ValidationError::InvalidValue {
                    field: field.into(),
                    message: "'skip' is only accepted for the workout".into(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_parse_to_tri_state() {
        assert_eq!(Override::parse(None), Override::Auto);
        assert_eq!(Override::parse(Some("")), Override::Auto);
        assert_eq!(Override::parse(Some(" AUTO ")), Override::Auto);
        assert_eq!(Override::parse(Some("skip")), Override::Skip);
        assert_eq!(
            Override::parse(Some("Tempo run")),
            Override::Explicit("Tempo run".into())
        );
    }

    #[test]
    fn override_serializes_as_plain_string() {
        let json = serde_json::to_string(&Override::Explicit("Legs".into())).unwrap();
        assert_eq!(json, "\"Legs\"");
        let back: Override = serde_json::from_str("\"auto\"").unwrap();
        assert_eq!(back, Override::Auto);
        let null: Override = serde_json::from_str("null").unwrap();
        assert_eq!(null, Override::Auto);
    }

    #[test]
    fn malformed_date_is_an_input_error() {
        let err = PlanningRequest::from_raw(Some("2026-13-01"), None, None, None, None).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidValue { ref field, .. } if field == "date"));
    }

    #[test]
    fn skipping_a_meal_is_rejected() {
        let err = PlanningRequest::from_raw(None, Some("skip"), None, None, None).unwrap_err();
        assert!(err.to_string().contains("lunch"));
    }

    #[test]
    fn raw_fields_are_resolved() {
        let req =
            PlanningRequest::from_raw(Some("2026-06-02"), Some("Ramen"), Some(""), Some("skip"), None)
                .unwrap();
        assert_eq!(req.date, NaiveDate::from_ymd_opt(2026, 6, 2));
        assert_eq!(req.lunch, Override::Explicit("Ramen".into()));
        assert_eq!(req.dinner, Override::Auto);
        assert_eq!(req.workout, Override::Skip);
    }
}
