//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Own parcel lifecycle rules that the store leaves open.

pub mod parcel_service;
