use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::datetime::{flexible, flexible_option};
use super::patch::{double_option, Changes};

pub const DEFAULT_SUBMISSION_STATUS: &str = "pending";

/// Defines the free-text submission fields once and derives the plain
/// struct, its patch form and name-based access from the same list.
macro_rules! submission_fields {
    ($($field:ident),+ $(,)?) => {
        /// Fields captured from a submission document, in extraction order.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct SubmissionFields {
            $(
                #[serde(default)]
                pub $field: Option<String>,
            )+
        }

        #[derive(Debug, Clone, Default, Deserialize)]
        pub struct SubmissionFieldsPatch {
            $(
                #[serde(default, deserialize_with = "double_option")]
                pub $field: Option<Option<String>>,
            )+
        }

        impl SubmissionFields {
            pub const NAMES: &'static [&'static str] = &[$(stringify!($field)),+];

            pub fn get(&self, name: &str) -> Option<&str> {
                match name {
                    $(stringify!($field) => self.$field.as_deref(),)+
                    _ => None,
                }
            }

            /// Returns false for names outside the field list.
            pub fn set(&mut self, name: &str, value: Option<String>) -> bool {
                match name {
                    $(stringify!($field) => {
                        self.$field = value;
                        true
                    })+
                    _ => false,
                }
            }

            pub fn values(&self) -> Vec<Option<&str>> {
                vec![$(self.$field.as_deref()),+]
            }
        }

        impl SubmissionFieldsPatch {
            pub fn collect(&self, changes: &mut Changes) {
                $(changes.text(stringify!($field), &self.$field);)+
            }
        }
    };
}

submission_fields!(
    effective_date,
    expiration_date,
    producer_name,
    producer_code,
    insured_name,
    additional_insured_names,
    contact_name,
    contact_phone,
    contact_email,
    mailing_address,
    location_street_number,
    location_street_name,
    location_suite,
    location_city,
    location_state,
    location_zip,
    building_limit,
    deductible,
    additional_limits_rents,
    additional_limits_ordinance,
    additional_limits_demolition,
    additional_limits_eqsl,
    additional_insured,
    mortgagee,
    loss_payee,
    construction_type,
    construction_year,
    square_feet,
    sprinkler_percent,
    protection_class,
    line_of_business,
    notes,
);

/// Column order for the rating-system CSV export.
pub const EXPORT_COLUMNS: &[&str] = &[
    "effective_date",
    "expiration_date",
    "notes",
    "producer_name",
    "producer_code",
    "insured_name",
    "additional_insured_names",
    "mailing_address",
    "contact_name",
    "contact_phone",
    "contact_email",
    "location_street_number",
    "location_street_name",
    "location_suite",
    "location_city",
    "location_state",
    "location_zip",
    "building_limit",
    "deductible",
    "additional_limits_rents",
    "additional_limits_ordinance",
    "additional_limits_demolition",
    "additional_limits_eqsl",
    "additional_insured",
    "mortgagee",
    "loss_payee",
    "construction_type",
    "construction_year",
    "square_feet",
    "sprinkler_percent",
    "protection_class",
    "line_of_business",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    #[serde(with = "flexible")]
    pub created_at: NaiveDateTime,
    #[serde(default, with = "flexible_option")]
    pub updated_at: Option<NaiveDateTime>,
    pub original_filename: Option<String>,
    pub file_type: Option<String>,
    pub extracted_text: Option<String>,
    #[serde(flatten)]
    pub fields: SubmissionFields,
    pub agency_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub status: String,
    pub reviewed_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSubmission {
    #[serde(flatten)]
    pub fields: SubmissionFields,
    #[serde(default)]
    pub agency_id: Option<i64>,
    #[serde(default)]
    pub contact_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub extracted_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmissionUpdate {
    #[serde(flatten)]
    pub fields: SubmissionFieldsPatch,
    #[serde(default, deserialize_with = "double_option")]
    pub agency_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_id: Option<Option<i64>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub reviewed_by: Option<Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_list_has_thirty_two_entries() {
        assert_eq!(SubmissionFields::NAMES.len(), 32);
        assert_eq!(SubmissionFields::NAMES[0], "effective_date");
        assert_eq!(SubmissionFields::NAMES[31], "notes");
    }

    #[test]
    fn export_columns_cover_every_field() {
        assert_eq!(EXPORT_COLUMNS.len(), SubmissionFields::NAMES.len());
        for column in EXPORT_COLUMNS {
            assert!(SubmissionFields::NAMES.contains(column), "{column}");
        }
    }

    #[test]
    fn set_and_get_by_name() {
        let mut fields = SubmissionFields::default();
        assert!(fields.set("insured_name", Some("Blue Fin LLC".into())));
        assert!(!fields.set("premium", Some("1".into())));
        assert_eq!(fields.get("insured_name"), Some("Blue Fin LLC"));
        assert_eq!(fields.insured_name.as_deref(), Some("Blue Fin LLC"));
    }

    #[test]
    fn update_collects_only_present_fields() {
        let update: SubmissionUpdate =
            serde_json::from_str(r#"{"insured_name":"Blue Fin","mortgagee":null,"status":"reviewed"}"#)
                .unwrap();
        let mut changes = Changes::new();
        update.fields.collect(&mut changes);
        assert!(changes.contains("insured_name"));
        assert!(changes.contains("mortgagee"));
        assert!(!changes.contains("loss_payee"));
        assert_eq!(update.status.as_deref(), Some("reviewed"));
    }

    #[test]
    fn flattened_create_payload() {
        let new: NewSubmission =
            serde_json::from_str(r#"{"producer_name":"Harbor","agency_id":4}"#).unwrap();
        assert_eq!(new.fields.producer_name.as_deref(), Some("Harbor"));
        assert_eq!(new.agency_id, Some(4));
        assert!(new.status.is_none());
    }
}
