use super::{ScanReply, ScanRequest, ScanTransport};
use crate::config::TransportConfig;
use crate::error::{KioskError, Result, SubmissionError};
use crate::validation::VisitorRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// JSON over HTTP client for the recognition backend
pub struct HttpScanTransport {
    client: reqwest::Client,
    scan_url: String,
}

#[derive(Debug, Serialize)]
struct ScanBody<'a> {
    image_base64: &'a str,
    visitor: Option<VisitorPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct VisitorPayload<'a> {
    name: &'a str,
    age: Option<u32>,
    gender: &'a str,
    email: &'a str,
    phone: &'a str,
    address: &'a str,
    purpose: &'a str,
    person_to_meet: &'a str,
    person_email: &'a str,
    person_phone: &'a str,
    location: &'a str,
}

impl<'a> From<&'a VisitorRecord> for VisitorPayload<'a> {
    fn from(record: &'a VisitorRecord) -> Self {
        Self {
            name: record.name.trim(),
            age: record.age.trim().parse().ok(),
            gender: &record.gender,
            email: record.email.trim(),
            phone: record.phone.trim(),
            address: record.address.trim(),
            purpose: &record.purpose,
            person_to_meet: record.person_to_meet.trim(),
            person_email: record.person_email.trim(),
            person_phone: record.person_phone.trim(),
            location: &record.location,
        }
    }
}

/// Error payloads carry either `message` or FastAPI-style `detail`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    detail: Option<serde_json::Value>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        if let Some(message) = self.message.filter(|m| !m.trim().is_empty()) {
            return Some(message);
        }

        match self.detail? {
            serde_json::Value::String(detail) => Some(detail),
            other => Some(other.to_string()),
        }
    }
}

impl HttpScanTransport {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| KioskError::system(format!("Failed to build HTTP client: {}", e)))?;

        info!("Scan backend at {}", config.scan_url());

        Ok(Self {
            client,
            scan_url: config.scan_url(),
        })
    }

    fn encode_body(request: &ScanRequest) -> ScanBody<'_> {
        ScanBody {
            image_base64: request.image.as_data_url(),
            visitor: request.visitor.as_ref().map(VisitorPayload::from),
        }
    }

    fn decode_error(status: reqwest::StatusCode, body: &str) -> SubmissionError {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message)
            .unwrap_or_default();

        warn!("Scan backend returned {}: {}", status, message);
        SubmissionError::Server(message)
    }
}

#[async_trait]
impl ScanTransport for HttpScanTransport {
    async fn submit_scan(
        &self,
        request: ScanRequest,
    ) -> std::result::Result<ScanReply, SubmissionError> {
        debug!(
            "Submitting scan (details attached: {})",
            request.visitor.is_some()
        );

        let response = self
            .client
            .post(&self.scan_url)
            .json(&Self::encode_body(&request))
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(Self::decode_error(status, &body));
        }

        serde_json::from_str::<ScanReply>(&body)
            .map_err(|e| SubmissionError::Server(format!("Malformed scan reply: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CapturedImage, MOCK_JPEG};
    use crate::transport::ScanAction;

    fn encode(request: &ScanRequest) -> serde_json::Value {
        serde_json::to_value(HttpScanTransport::encode_body(request)).unwrap()
    }

    fn sample_record() -> VisitorRecord {
        VisitorRecord {
            name: " Grace Hopper ".to_string(),
            age: "".to_string(),
            gender: "Female".to_string(),
            email: "grace@example.com".to_string(),
            phone: "555-000-0000".to_string(),
            address: "1 Navy Yard".to_string(),
            purpose: "Interview".to_string(),
            person_to_meet: "Howard Aiken".to_string(),
            person_email: "howard@example.com".to_string(),
            person_phone: "555-111-2222".to_string(),
            location: "Location unavailable".to_string(),
        }
    }

    #[test]
    fn test_body_without_visitor() {
        let image = CapturedImage::from_jpeg(MOCK_JPEG);
        let body = encode(&ScanRequest {
            image: image.clone(),
            visitor: None,
        });

        assert_eq!(body["image_base64"], image.as_data_url());
        assert!(body["visitor"].is_null());
    }

    #[test]
    fn test_body_with_visitor() {
        let mut record = sample_record();
        let request = ScanRequest {
            image: CapturedImage::from_jpeg(MOCK_JPEG),
            visitor: Some(record.clone()),
        };

        let body = encode(&request);
        assert_eq!(body["visitor"]["name"], "Grace Hopper");
        assert!(body["visitor"]["age"].is_null());
        assert_eq!(body["visitor"]["location"], "Location unavailable");

        record.age = "85".to_string();
        let body = encode(&ScanRequest {
            image: request.image,
            visitor: Some(record),
        });
        assert_eq!(body["visitor"]["age"], 85);
    }

    #[test]
    fn test_reply_decoding() {
        let reply: ScanReply = serde_json::from_str(
            r#"{"action": "need_details", "message": "New visitor detected. Please fill details."}"#,
        )
        .unwrap();
        assert_eq!(reply.action, ScanAction::NeedDetails);

        let reply: ScanReply =
            serde_json::from_str(r#"{"action": "exit", "message": "Thank you for visiting, Ada!"}"#)
                .unwrap();
        assert_eq!(reply.action, ScanAction::Complete("exit".to_string()));
        assert_eq!(reply.message, "Thank you for visiting, Ada!");
    }

    #[test]
    fn test_error_decoding() {
        let error = HttpScanTransport::decode_error(
            reqwest::StatusCode::BAD_REQUEST,
            r#"{"detail": "No face detected"}"#,
        );
        assert_eq!(error, SubmissionError::Server("No face detected".to_string()));

        let error = HttpScanTransport::decode_error(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"message": "Storage unavailable"}"#,
        );
        assert_eq!(error, SubmissionError::Server("Storage unavailable".to_string()));

        let error =
            HttpScanTransport::decode_error(reqwest::StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(error, SubmissionError::Server(String::new()));
    }
}
