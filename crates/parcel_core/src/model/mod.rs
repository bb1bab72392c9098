//! Domain model for tracked parcels.
//!
//! # Responsibility
//! - Define the canonical parcel record shared by store and service layers.
//!
//! # Invariants
//! - Every stored parcel is identified by a positive `ParcelNumber`.
//! - A `ParcelNumber` of zero marks a parcel that has not been stored yet.

pub mod parcel;
