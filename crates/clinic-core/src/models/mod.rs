//! Data models for the clinic backend.
//!
//! This module contains the payloads exchanged with the backend:
//!
//! - `AuthReply`, `SecurityQuestion`: auth endpoint envelopes
//! - `Envelope`: the `{code, message, data}` wrapper of REST resources
//! - `Department`, `DutySchedule`: departments and their rosters
//! - `Doctor`, `DoctorPage`: the doctor roster
//! - `Schedule`, `DefaultScheduleRule`: schedule entries and weekly rules
//! - `Article`, `ArticleKind`: typed site content

pub mod article;
pub mod auth;
pub mod department;
pub mod doctor;
pub mod envelope;
pub mod schedule;

pub use article::{Article, ArticleInput, ArticleKind, ArticlePage};
pub use auth::{AuthReply, SecurityAnswer, SecurityQuestion, AUTH_SUCCESS};
pub use department::{Department, DepartmentInput, DutySchedule};
pub use doctor::{Doctor, DoctorInput, DoctorPage, DoctorSummary, UploadedImage};
pub use envelope::{Envelope, SUCCESS_CODES};
pub use schedule::{DefaultScheduleRule, Schedule, ScheduleUpdate};
