use parcel_core::db::{open_db, open_db_in_memory};
use parcel_core::{
    ParcelService, ParcelStatus, ParcelStore, RepoError, ServiceError, SqliteParcelStore,
};
use std::collections::HashSet;

#[test]
fn register_stores_registered_parcel() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelStore::try_new(&conn).unwrap());

    let parcel = service.register(1000, "test").unwrap();
    assert!(parcel.is_stored());
    assert_eq!(parcel.status, ParcelStatus::Registered);
    assert_eq!(service.get(parcel.number).unwrap(), parcel);
}

#[test]
fn next_status_walks_lifecycle_then_stops() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelStore::try_new(&conn).unwrap());
    let number = service.register(1, "Psk").unwrap().number;

    assert_eq!(service.next_status(number).unwrap(), ParcelStatus::Sent);
    assert_eq!(service.next_status(number).unwrap(), ParcelStatus::Delivered);

    let err = service.next_status(number).unwrap_err();
    assert!(matches!(err, ServiceError::AlreadyDelivered(n) if n == number));
    assert_eq!(service.get(number).unwrap().status, ParcelStatus::Delivered);
}

#[test]
fn change_address_only_while_registered() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelStore::try_new(&conn).unwrap());
    let number = service.register(1, "old").unwrap().number;

    service.change_address(number, "new").unwrap();
    assert_eq!(service.get(number).unwrap().address, "new");

    service.next_status(number).unwrap();
    let err = service.change_address(number, "too late").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotRegistered {
            status: ParcelStatus::Sent,
            ..
        }
    ));
    assert_eq!(service.get(number).unwrap().address, "new");
}

#[test]
fn delete_only_while_registered() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();
    let service = ParcelService::new(&store);

    let fresh = service.register(5, "fresh").unwrap().number;
    let shipped = service.register(5, "shipped").unwrap().number;
    service.next_status(shipped).unwrap();

    service.delete(fresh).unwrap();
    assert!(matches!(store.get(fresh), Err(RepoError::NotFound(_))));

    let err = service.delete(shipped).unwrap_err();
    assert!(matches!(err, ServiceError::NotRegistered { number, .. } if number == shipped));
    assert!(store.get(shipped).is_ok());
}

#[test]
fn operations_on_missing_parcel_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelStore::try_new(&conn).unwrap());

    assert!(service.get(77).unwrap_err().is_not_found());
    assert!(service.next_status(77).unwrap_err().is_not_found());
    assert!(service.change_address(77, "x").unwrap_err().is_not_found());
    assert!(service.delete(77).unwrap_err().is_not_found());
}

#[test]
fn client_parcels_lists_only_that_client() {
    let conn = open_db_in_memory().unwrap();
    let service = ParcelService::new(SqliteParcelStore::try_new(&conn).unwrap());

    let mine: HashSet<_> = (0..3)
        .map(|i| service.register(42, format!("addr {i}")).unwrap().number)
        .collect();
    service.register(43, "other").unwrap();

    let listed: HashSet<_> = service
        .client_parcels(42)
        .unwrap()
        .into_iter()
        .map(|parcel| parcel.number)
        .collect();
    assert_eq!(listed, mine);
}

#[test]
fn writes_respect_status_changed_by_another_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");
    let conn = open_db(&path).unwrap();
    let other = open_db(&path).unwrap();
    let service = ParcelService::new(SqliteParcelStore::try_new(&conn).unwrap());

    let parcel = service.register(9, "before").unwrap();
    SqliteParcelStore::try_new(&other)
        .unwrap()
        .set_status(parcel.number, ParcelStatus::Sent)
        .unwrap();

    let err = service.change_address(parcel.number, "after").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotRegistered {
            status: ParcelStatus::Sent,
            ..
        }
    ));
    let err = service.delete(parcel.number).unwrap_err();
    assert!(matches!(err, ServiceError::NotRegistered { .. }));

    let stored = service.get(parcel.number).unwrap();
    assert_eq!(stored.address, "before");
    assert_eq!(stored.status, ParcelStatus::Sent);
}

#[test]
fn next_status_rejects_unknown_status_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteParcelStore::try_new(&conn).unwrap();
    let service = ParcelService::new(&store);
    let number = service.register(3, "somewhere").unwrap().number;
    let lost = ParcelStatus::Other("lost".to_string());
    store.set_status(number, lost.clone()).unwrap();

    let err = service.next_status(number).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::UnknownStatus { number: n, ref status } if n == number && *status == lost
    ));
    assert_eq!(store.get(number).unwrap().status, lost);

    assert!(matches!(
        service.change_address(number, "elsewhere").unwrap_err(),
        ServiceError::NotRegistered { .. }
    ));
}
