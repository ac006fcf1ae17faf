//! A small HTTP service keeping local MailChimp list members in sync with
//! MailChimp itself.
//!
//! API endpoints:
//! - `GET /health_check`
//! - `POST /mailchimp/members/{list_id}`
//! - `GET|PUT|DELETE /mailchimp/members/{member_id}`
pub mod configuration;
pub mod domain;
pub mod mailchimp_client;
pub mod routes;
pub mod startup;
pub mod store;
pub mod telemetry;
