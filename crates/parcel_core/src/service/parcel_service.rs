//! Parcel use-case service.
//!
//! # Responsibility
//! - Register parcels and list them per client.
//! - Enforce lifecycle rules on top of a permissive store.
//!
//! # Invariants
//! - Status only moves forward: `registered -> sent -> delivered`.
//! - Address changes and deletion are allowed only while `registered`.
//! - Rules are checked by the write statement itself, so a concurrent status
//!   change between read and write cannot bypass them.
//! - Service layer remains storage-agnostic.

use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{ParcelStore, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for parcel use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Store failure, including `RepoError::NotFound`.
    Repo(RepoError),
    /// Operation requires the parcel to still be registered.
    NotRegistered {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    /// Parcel has reached its final status.
    AlreadyDelivered(ParcelNumber),
    /// Parcel carries status text outside the lifecycle.
    UnknownStatus {
        number: ParcelNumber,
        status: ParcelStatus,
    },
}

impl ServiceError {
    /// Returns whether the underlying store reported a missing parcel.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Repo(err) if err.is_not_found())
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::NotRegistered { number, status } => write!(
                f,
                "parcel {number} has status `{status}`; only registered parcels can be changed"
            ),
            Self::AlreadyDelivered(number) => write!(f, "parcel {number} is already delivered"),
            Self::UnknownStatus { number, status } => {
                write!(f, "parcel {number} has unknown status `{status}`")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NotRegistered { .. } => None,
            Self::AlreadyDelivered(_) => None,
            Self::UnknownStatus { .. } => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapper over a parcel store.
pub struct ParcelService<S: ParcelStore> {
    store: S,
}

impl<S: ParcelStore> ParcelService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new parcel for `client` and returns it with its number.
    pub fn register(&self, client: ClientId, address: impl Into<String>) -> ServiceResult<Parcel> {
        let mut parcel = Parcel::new(client, address);
        parcel.number = self.store.add(&parcel)?;
        info!(
            "event=parcel_register module=service status=ok number={} client={client}",
            parcel.number
        );
        Ok(parcel)
    }

    /// Loads one parcel by number.
    pub fn get(&self, number: ParcelNumber) -> ServiceResult<Parcel> {
        Ok(self.store.get(number)?)
    }

    /// Lists every parcel owned by `client`.
    pub fn client_parcels(&self, client: ClientId) -> ServiceResult<Vec<Parcel>> {
        Ok(self.store.get_by_client(client)?)
    }

    /// Advances a parcel to its next lifecycle status.
    ///
    /// # Errors
    /// - `AlreadyDelivered` when the parcel is in its final status.
    /// - `UnknownStatus` when the stored status is outside the lifecycle.
    /// - `Repo(StatusMismatch)` when another writer moved the parcel first.
    pub fn next_status(&self, number: ParcelNumber) -> ServiceResult<ParcelStatus> {
        let parcel = self.store.get(number)?;
        let Some(next) = parcel.status.next() else {
            warn!(
                "event=parcel_next_status module=service status=rejected number={number} parcel_status={}",
                parcel.status
            );
            if parcel.status == ParcelStatus::Delivered {
                return Err(ServiceError::AlreadyDelivered(number));
            }
            return Err(ServiceError::UnknownStatus {
                number,
                status: parcel.status,
            });
        };

        self.store
            .set_status_when(number, next.clone(), &parcel.status)?;
        info!(
            "event=parcel_next_status module=service status=ok number={number} from={} to={next}",
            parcel.status
        );
        Ok(next)
    }

    /// Replaces the address of a parcel that has not been sent yet.
    pub fn change_address(&self, number: ParcelNumber, address: &str) -> ServiceResult<()> {
        self.store
            .set_address_when(number, address, &ParcelStatus::Registered)
            .map_err(registered_guard_error)?;
        info!("event=parcel_change_address module=service status=ok number={number}");
        Ok(())
    }

    /// Deletes a parcel that has not been sent yet.
    pub fn delete(&self, number: ParcelNumber) -> ServiceResult<()> {
        self.store
            .delete_when(number, &ParcelStatus::Registered)
            .map_err(registered_guard_error)?;
        info!("event=parcel_delete module=service status=ok number={number}");
        Ok(())
    }
}

fn registered_guard_error(err: RepoError) -> ServiceError {
    match err {
        RepoError::StatusMismatch { number, actual, .. } => ServiceError::NotRegistered {
            number,
            status: actual,
        },
        other => ServiceError::Repo(other),
    }
}
