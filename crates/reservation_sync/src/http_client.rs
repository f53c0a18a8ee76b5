use std::time::Duration;

use campground_model::{Blackout, BlackoutDraft, CalendarSnapshot, MonthRange};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    ApiError, AvailabilityProbe, AvailabilityResult, CalendarApi, ErrorBody, RescheduleRequest,
    RescheduleResponse,
};

/// Client for the calendar backend's JSON API
pub struct HttpCalendarApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpCalendarApi {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!("campground-planner/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Calendar API returned {}: {}", status, body);
        Err(error_from_response(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Map an unsuccessful response to an [`ApiError`].
///
/// The message comes from a `{ "error", "message" }` body when there is one,
/// otherwise from the raw body or the status reason.
pub fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .ok()
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::CONFLICT => ApiError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
        _ => ApiError::Status {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait::async_trait]
impl CalendarApi for HttpCalendarApi {
    async fn fetch_calendar(&self, month: MonthRange) -> Result<CalendarSnapshot, ApiError> {
        debug!("Fetching calendar for {}", month);

        let request = self
            .client
            .get(self.url("/calendar"))
            .query(&[("month", month.to_string())]);
        self.send_json(request).await
    }

    async fn reschedule_reservation(
        &self,
        request: &RescheduleRequest,
    ) -> Result<RescheduleResponse, ApiError> {
        debug!(
            "Rescheduling reservation {} to {:?} {} - {}",
            request.reservation_id, request.campsite_id, request.check_in, request.check_out
        );

        let path = format!("/reservations/{}/reschedule", request.reservation_id);
        let builder = self.client.patch(self.url(&path)).json(request);
        self.send_json(builder).await
    }

    async fn create_blackout(&self, draft: &BlackoutDraft) -> Result<Blackout, ApiError> {
        debug!("Creating blackout {} - {}", draft.start_date, draft.end_date);

        let builder = self.client.post(self.url("/blackouts")).json(draft);
        self.send_json(builder).await
    }

    async fn update_blackout(&self, id: &str, draft: &BlackoutDraft) -> Result<Blackout, ApiError> {
        debug!("Updating blackout {}", id);

        let builder = self
            .client
            .put(self.url(&format!("/blackouts/{}", id)))
            .json(draft);
        self.send_json(builder).await
    }

    async fn delete_blackout(&self, id: &str) -> Result<(), ApiError> {
        debug!("Deleting blackout {}", id);

        let builder = self.client.delete(self.url(&format!("/blackouts/{}", id)));
        self.send(builder).await?;
        Ok(())
    }

    async fn check_availability(
        &self,
        probe: &AvailabilityProbe,
    ) -> Result<AvailabilityResult, ApiError> {
        debug!(
            "Checking availability of {} for {} guests",
            probe.campsite_id, probe.guests
        );

        let builder = self.client.post(self.url("/availability")).json(probe);
        self.send_json(builder).await
    }
}
