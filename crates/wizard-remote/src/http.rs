//! HTTP backend
//!
//! Talks to the census REST API with `reqwest`.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use wizard_snapshot::{decode_envelope, PartialSnapshot, SectionId, SubjectId};

use crate::backend::RecordBackend;
use crate::error::RemoteError;
use crate::wire::{SchoolEnvelope, SubjectMetadata, SubmissionPayload};

const CENSUS_PATH: &str = "/v1/census";
const SCHOOLS_PATH: &str = "/v1/schools";

/// Backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    submit_timeout: Duration,
}

impl HttpBackend {
    /// Create backend for the API rooted at `base_url`
    ///
    /// # Errors
    /// [`RemoteError::Setup`] if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(concat!("census-wizard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            submit_timeout: Duration::from_secs(30),
        })
    }

    /// Set the request timeout applied to submissions
    #[must_use]
    pub fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    /// API root
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl RecordBackend for HttpBackend {
    async fn fetch_record(
        &self,
        subject: SubjectId,
        section: &SectionId,
    ) -> Result<Option<PartialSnapshot>, RemoteError> {
        let url = self.url(CENSUS_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("school_id", subject.to_string()),
                ("section", section.to_string()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RemoteError::status(response.status().as_u16(), url));
        }

        let body = response.text().await?;
        Ok(decode_envelope(&body)?)
    }

    async fn write_record(&self, payload: &SubmissionPayload) -> Result<(), RemoteError> {
        let url = self.url(CENSUS_PATH);
        tracing::debug!(
            subject = %payload.subject,
            section = %payload.section,
            status = %payload.status,
            "submitting record"
        );

        let response = self
            .client
            .post(&url)
            .json(payload)
            .timeout(self.submit_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::status(response.status().as_u16(), url));
        }
        Ok(())
    }

    async fn fetch_subject(&self, subject: SubjectId) -> Result<SubjectMetadata, RemoteError> {
        let url = self.url(SCHOOLS_PATH);
        let response = self
            .client
            .get(&url)
            .query(&[("id", subject.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::status(response.status().as_u16(), url));
        }

        let envelope: SchoolEnvelope = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        let record = envelope
            .data
            .ok_or_else(|| RemoteError::Decode("school response without data".to_string()))?;
        Ok(SubjectMetadata::from_record(subject, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::SubmissionStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use wizard_snapshot::{FormSnapshot, Shift};

    fn general() -> SectionId {
        SectionId::new("general").unwrap()
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let backend = HttpBackend::new("http://localhost:8000/").unwrap();
        assert_eq!(backend.url(CENSUS_PATH), "http://localhost:8000/v1/census");
    }

    #[tokio::test]
    async fn fetch_record_unwraps_string_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CENSUS_PATH))
            .and(query_param("school_id", "42"))
            .and(query_param("section", "general"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": json!({ "total_alunos": 30 }).to_string()
            })))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri()).unwrap();
        let record = backend
            .fetch_record(SubjectId(42), &general())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.get("total_alunos"), Some(&json!(30)));
    }

    #[tokio::test]
    async fn fetch_record_not_found_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CENSUS_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri()).unwrap();
        assert_eq!(backend.fetch_record(SubjectId(1), &general()).await, Ok(None));
    }

    #[tokio::test]
    async fn server_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CENSUS_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri()).unwrap();
        let err = backend.fetch_record(SubjectId(1), &general()).await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 500, .. }));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn write_record_posts_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CENSUS_PATH))
            .and(body_partial_json(json!({
                "school_id": 42,
                "year": 2026,
                "status": "draft",
                "data": { "total_alunos": 30 }
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri()).unwrap();
        let snapshot = FormSnapshot::from_pairs([("total_alunos".to_string(), json!(30))]);
        let payload = SubmissionPayload::new(
            SubjectId(42),
            general(),
            2026,
            SubmissionStatus::Draft,
            &snapshot,
        );
        backend.write_record(&payload).await.unwrap();
    }

    #[tokio::test]
    async fn fetch_subject_reads_shift_flags() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SCHOOLS_PATH))
            .and(query_param("id", "42"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": 42, "turno_tarde": true, "turno_integral": true }
            })))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri()).unwrap();
        let meta = backend.fetch_subject(SubjectId(42)).await.unwrap();
        assert_eq!(meta.shifts, vec![Shift::Afternoon, Shift::FullTime]);
    }
}
