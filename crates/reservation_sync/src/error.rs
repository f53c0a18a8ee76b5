use campground_model::ModelError;

/// Errors raised talking to the calendar backend
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response
    #[error("HTTP request failed: {0}")]
    Network(String),

    /// 404
    #[error("Not found: {0}")]
    NotFound(String),

    /// 409, typically an overlap the server detected
    #[error("Conflict: {0}")]
    Conflict(String),

    /// 429
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// 401 or 403
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other unsuccessful status
    #[error("Server returned {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Message from the error body, or the raw body
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The request could not be built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors returned by [`CalendarStore`](crate::CalendarStore) operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The backend call failed and the local change was rolled back
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The payload was rejected before any request was made
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A newer request for the same entity replaced this one
    #[error("Superseded by a newer change")]
    Superseded,

    /// The entity only exists locally and cannot be changed yet
    #[error("Entity {0} is still being created")]
    PendingEntity(String),

    /// The entity is not in the current snapshot
    #[error("Entity {0} not found")]
    NotFound(String),
}
