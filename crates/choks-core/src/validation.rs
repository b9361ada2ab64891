//! Form input checks
//!
//! Submission only requires a non-empty location and business type. The
//! keystroke cue on the location field is cosmetic and never blocks.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::AnalysisRequest;

/// Minimum location length (exclusive) for the "looks valid" cue.
pub const LOCATION_HINT_MIN_LEN: usize = 3;

/// Business types the backend accepts, with display labels.
pub const KNOWN_BUSINESS_TYPES: [(&str, &str); 4] = [
    ("food_truck", "Food Truck"),
    ("retail", "Retail"),
    ("service", "Service"),
    ("entertainment", "Entertainment"),
];

/// Values read from the form at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub location: String,
    pub business_type: String,
    /// Values of the checked demographic boxes, in document order
    pub demographics: Vec<String>,
}

impl FormSnapshot {
    pub fn new(
        location: impl Into<String>,
        business_type: impl Into<String>,
        demographics: Vec<String>,
    ) -> Self {
        Self {
            location: location.into(),
            business_type: business_type.into(),
            demographics,
        }
    }

    pub fn has_demographics(&self) -> bool {
        self.demographics.iter().any(|d| !d.trim().is_empty())
    }

    /// Build the request body, failing fast on missing required fields.
    pub fn to_request(&self) -> Result<AnalysisRequest, ValidationError> {
        let location = self.location.trim();
        if location.is_empty() {
            return Err(ValidationError::MissingLocation);
        }

        let business_type = self.business_type.trim();
        if business_type.is_empty() {
            return Err(ValidationError::MissingBusinessType);
        }

        let mut target_demographics: Vec<String> = Vec::with_capacity(self.demographics.len());
        for demographic in &self.demographics {
            let demographic = demographic.trim();
            if !demographic.is_empty() && !target_demographics.iter().any(|d| d == demographic) {
                target_demographics.push(demographic.to_string());
            }
        }

        Ok(AnalysisRequest {
            location: location.to_string(),
            business_type: business_type.to_string(),
            target_demographics,
        })
    }
}

/// Visual cue applied to the location field while typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputHint {
    Valid,
    Invalid,
}

impl InputHint {
    pub fn for_location(value: &str) -> Self {
        if value.chars().count() > LOCATION_HINT_MIN_LEN {
            InputHint::Valid
        } else {
            InputHint::Invalid
        }
    }

    /// Class added to the field; the other one is removed.
    pub fn class_name(self) -> &'static str {
        match self {
            InputHint::Valid => "is-valid",
            InputHint::Invalid => "is-invalid",
        }
    }

    pub fn opposite_class_name(self) -> &'static str {
        match self {
            InputHint::Valid => "is-invalid",
            InputHint::Invalid => "is-valid",
        }
    }
}

/// Human label for a business type; unknown types are shown as given.
pub fn business_type_label(business_type: &str) -> String {
    KNOWN_BUSINESS_TYPES
        .iter()
        .find(|(value, _)| value.eq_ignore_ascii_case(business_type.trim()))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| business_type.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_missing_location() {
        let snapshot = FormSnapshot::new("", "retail", vec![]);
        assert_eq!(
            snapshot.to_request(),
            Err(ValidationError::MissingLocation)
        );
    }

    #[test]
    fn test_whitespace_location_counts_as_missing() {
        let snapshot = FormSnapshot::new("  \t", "retail", vec![]);
        assert_eq!(
            snapshot.to_request(),
            Err(ValidationError::MissingLocation)
        );
    }

    #[test]
    fn test_missing_business_type() {
        let snapshot = FormSnapshot::new("Main St", "", vec![]);
        assert_eq!(
            snapshot.to_request(),
            Err(ValidationError::MissingBusinessType)
        );
    }

    #[test]
    fn test_short_location_still_submits() {
        let request = FormSnapshot::new("NY", "retail", vec![]).to_request().unwrap();
        assert_eq!(request.location, "NY");
        assert!(request.target_demographics.is_empty());
    }

    #[test]
    fn test_demographics_deduplicated_in_order() {
        let snapshot = FormSnapshot::new(
            " Downtown Plaza ",
            "food_truck",
            vec![
                "students".into(),
                "young_professionals".into(),
                "students".into(),
                "".into(),
            ],
        );
        let request = snapshot.to_request().unwrap();
        assert_eq!(request.location, "Downtown Plaza");
        assert_eq!(
            request.target_demographics,
            vec!["students".to_string(), "young_professionals".to_string()]
        );
    }

    #[test]
    fn test_location_hint_threshold() {
        assert_eq!(InputHint::for_location(""), InputHint::Invalid);
        assert_eq!(InputHint::for_location("abc"), InputHint::Invalid);
        assert_eq!(InputHint::for_location("abcd"), InputHint::Valid);
        // Counted in characters, not bytes
        assert_eq!(InputHint::for_location("Köln"), InputHint::Valid);
        assert_eq!(InputHint::for_location("Köl"), InputHint::Invalid);
    }

    #[test]
    fn test_business_type_labels() {
        assert_eq!(business_type_label("food_truck"), "Food Truck");
        assert_eq!(business_type_label("RETAIL"), "Retail");
        assert_eq!(business_type_label("pop_up_bar"), "pop_up_bar");
    }

    proptest! {
        /// Any non-blank pair of required fields produces a request
        #[test]
        fn non_blank_fields_always_validate(
            location in "[a-zA-Z0-9][a-zA-Z0-9 ]{0,40}",
            business in "[a-z_]{1,20}",
        ) {
            let request = FormSnapshot::new(location.clone(), business.clone(), vec![])
                .to_request();
            prop_assert!(request.is_ok());
            let request = request.unwrap();
            prop_assert_eq!(request.location, location.trim());
            prop_assert_eq!(request.business_type, business);
        }

        /// The cue never depends on anything but length
        #[test]
        fn hint_matches_length(value in ".{0,12}") {
            let expected = value.chars().count() > 3;
            prop_assert_eq!(InputHint::for_location(&value) == InputHint::Valid, expected);
        }
    }
}
