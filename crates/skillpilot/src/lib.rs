//! Coordinator for the Skillpilot placement portal: preference ranking submissions,
//! match-notification dispatch, and list-row reconciliation against the portal's REST
//! endpoints, plus the in-process placement service those endpoints are served from.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
