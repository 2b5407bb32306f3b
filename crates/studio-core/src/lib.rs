//! Core of the SimSS studio: parameter-file round-tripping, per-session
//! isolation, external-executable orchestration, and result collection.

pub mod collect;
pub mod diagram;
pub mod document;
pub mod domain;
pub mod output;
pub mod runner;
pub mod serialization;
pub mod session;
pub mod upload;
