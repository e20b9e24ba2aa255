//! Resume intake: pull candidate contact fields out of PDF and DOCX resumes
//! and append them to an Excel workbook, rejecting repeat applicants inside
//! a configurable window.

pub mod config;
pub mod error;
pub mod intelligence;
pub mod models;
pub mod ner;
pub mod processing;
pub mod services;
pub mod store;
pub mod workspace;

pub use error::{IntakeError, Result};
