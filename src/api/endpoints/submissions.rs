//! Submission intake and review.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::error::ApiError;
use crate::api::multipart::read_upload;
use crate::api::types::{ApiContext, Message};
use crate::db;
use crate::intake::{self, AgencyMatch};
use crate::models::{Contact, NewSubmission, Submission, SubmissionUpdate, EXPORT_COLUMNS};

/// Characters of extracted text echoed back to the review screen.
const PREVIEW_CHARS: usize = 2000;
const MAX_CONTACT_MATCHES: usize = 10;
const DEFAULT_PAGE_SIZE: i64 = 100;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub extracted_text: String,
    pub extracted_fields: Map<String, Value>,
    pub agency_matches: Vec<AgencyMatch>,
    pub original_filename: String,
    pub file_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactSearch {
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactMatch {
    pub id: i64,
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub agency_id: i64,
}

impl From<Contact> for ContactMatch {
    fn from(c: Contact) -> Self {
        Self {
            id: c.id,
            name: c.name,
            title: c.title,
            email: c.email,
            phone: c.phone,
            agency_id: c.agency_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactSearchResponse {
    pub contact_matches: Vec<ContactMatch>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_page_size")]
    pub limit: i64,
    pub status: Option<String>,
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Serialize)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
    pub content_type: &'static str,
}

fn field_str<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// `POST /submissions/upload`: extract text, ask the model for fields,
/// and suggest agencies for the producer it names.
pub async fn upload(
    State(ctx): State<ApiContext>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = read_upload(multipart).await?;
    tracing::info!(
        filename = %form.filename,
        bytes = form.bytes.len(),
        "Submission document received"
    );

    let core = ctx.core.clone();
    let response = tokio::task::spawn_blocking(move || -> Result<UploadResponse, ApiError> {
        let text = intake::extract_text(&form.filename, &form.bytes)?;

        let extracted_fields = match core.extraction_client(form.field("api_key")) {
            Some(client) => {
                intake::extract_fields(client.as_ref(), &core.config.ai.extraction_model, &text)
            }
            None => {
                tracing::debug!("No AI key available; skipping field extraction");
                Map::new()
            }
        };

        let conn = core.open_db()?;
        let agency_matches = intake::match_agencies(
            &conn,
            field_str(&extracted_fields, "producer_name"),
            field_str(&extracted_fields, "producer_code"),
        )?;

        Ok(UploadResponse {
            extracted_text: intake::truncate_chars(&text, PREVIEW_CHARS).to_string(),
            extracted_fields,
            agency_matches,
            original_filename: form.filename.clone(),
            file_type: form.content_type.clone(),
        })
    })
    .await??;

    Ok(Json(response))
}

/// `POST /submissions/search-contacts/:agency_id`
pub async fn search_contacts(
    State(ctx): State<ApiContext>,
    Path(agency_id): Path<i64>,
    Query(query): Query<ContactSearch>,
) -> Result<Json<ContactSearchResponse>, ApiError> {
    let conn = ctx.db()?;
    let contacts = db::search_contacts(
        &conn,
        agency_id,
        query.contact_name.as_deref(),
        query.contact_email.as_deref(),
        MAX_CONTACT_MATCHES,
    )?;
    Ok(Json(ContactSearchResponse {
        contact_matches: contacts.into_iter().map(ContactMatch::from).collect(),
    }))
}

/// `POST /submissions`
pub async fn create(
    State(ctx): State<ApiContext>,
    Json(payload): Json<NewSubmission>,
) -> Result<(StatusCode, Json<Submission>), ApiError> {
    let conn = ctx.db()?;
    let submission = db::insert_submission(&conn, &payload)?;
    tracing::info!(id = submission.id, "Submission saved");
    Ok((StatusCode::CREATED, Json(submission)))
}

/// `GET /submissions?skip=&limit=&status=`, newest first.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    let conn = ctx.db()?;
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    Ok(Json(db::list_submissions(
        &conn,
        query.skip.max(0),
        query.limit.max(0),
        status,
    )?))
}

/// `GET /submissions/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<Submission>, ApiError> {
    let conn = ctx.db()?;
    db::get_submission(&conn, id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Submission"))
}

/// `PUT /submissions/:id`. Only fields present in the body change.
pub async fn update(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
    Json(payload): Json<SubmissionUpdate>,
) -> Result<Json<Submission>, ApiError> {
    let conn = ctx.db()?;
    db::update_submission(&conn, id, &payload)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Submission"))
}

/// `DELETE /submissions/:id`
pub async fn delete(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<Message>, ApiError> {
    let conn = ctx.db()?;
    if !db::delete_submission(&conn, id)? {
        return Err(ApiError::not_found("Submission"));
    }
    Ok(Json(Message {
        message: "Submission deleted",
    }))
}

/// Header plus one row in rating-system column order.
pub fn submission_csv(submission: &Submission) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    writer.write_record(
        EXPORT_COLUMNS
            .iter()
            .map(|column| submission.fields.get(column).unwrap_or("")),
    )?;
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `GET /submissions/:id/export-csv`
pub async fn export_csv(
    State(ctx): State<ApiContext>,
    Path(id): Path<i64>,
) -> Result<Json<CsvExport>, ApiError> {
    let conn = ctx.db()?;
    let submission = db::get_submission(&conn, id)?.ok_or_else(|| ApiError::not_found("Submission"))?;
    let content =
        submission_csv(&submission).map_err(|e| ApiError::Internal(format!("CSV export: {e}")))?;
    Ok(Json(CsvExport {
        filename: format!("submission_{id}_export.csv"),
        content,
        content_type: "text/csv",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubmissionFields;
    use chrono::NaiveDate;

    fn submission(fields: SubmissionFields) -> Submission {
        Submission {
            id: 3,
            created_at: NaiveDate::from_ymd_opt(2025, 4, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            updated_at: None,
            original_filename: None,
            file_type: None,
            extracted_text: None,
            fields,
            agency_id: None,
            contact_id: None,
            status: "pending".into(),
            reviewed_by: None,
        }
    }

    #[test]
    fn csv_has_header_and_one_row_in_export_order() {
        let mut fields = SubmissionFields::default();
        fields.effective_date = Some("2025-05-01".into());
        fields.notes = Some("Roof 2019".into());
        fields.insured_name = Some("Blue Fin, LLC".into());

        let csv = submission_csv(&submission(fields)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("effective_date,expiration_date,notes,producer_name"));
        assert!(lines[0].ends_with("protection_class,line_of_business"));
        // Commas are quoted, missing values are empty
        assert!(lines[1].starts_with("2025-05-01,,Roof 2019,,,\"Blue Fin, LLC\","));
        assert_eq!(lines[1].matches(',').count(), EXPORT_COLUMNS.len());
    }
}
