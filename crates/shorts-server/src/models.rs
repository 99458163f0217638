//! API request and response models.
//!
//! The wire types live in `shorts_core::api` so the extension-side client
//! shares them; this module re-exports them for handlers.

pub use shorts_core::api::{
    AggregateStatsResponse, ErrorResponse, HealthResponse, RegisterRequest, RegisterResponse,
    ResetStatisticsRequest, SaveSettingsRequest, SettingsResponse, StatisticsResponse,
    UpdateStatisticsRequest,
};
