use chrono::DateTime;
use parcel_core::{Parcel, ParcelStatus, ParseStatusError};

#[test]
fn new_parcel_is_unsaved_and_registered() {
    let parcel = Parcel::new(1000, "test");

    assert_eq!(parcel.number, 0);
    assert!(!parcel.is_stored());
    assert_eq!(parcel.client, 1000);
    assert_eq!(parcel.status, ParcelStatus::Registered);
    assert_eq!(parcel.address, "test");
    assert!(DateTime::parse_from_rfc3339(&parcel.created_at).is_ok());
    assert!(parcel.created_at.ends_with('Z'));
}

#[test]
fn status_text_round_trips_through_from_str() {
    for status in [
        ParcelStatus::Registered,
        ParcelStatus::Sent,
        ParcelStatus::Delivered,
    ] {
        assert_eq!(status.as_str().parse::<ParcelStatus>().unwrap(), status);
        assert_eq!(status.to_string(), status.as_str());
    }
}

#[test]
fn unknown_status_text_is_rejected() {
    let err = "lost".parse::<ParcelStatus>().unwrap_err();
    assert_eq!(err, ParseStatusError("lost".to_string()));
    assert!(err.to_string().contains("lost"));
}

#[test]
fn status_lifecycle_moves_forward_and_stops() {
    assert_eq!(ParcelStatus::Registered.next(), Some(ParcelStatus::Sent));
    assert_eq!(ParcelStatus::Sent.next(), Some(ParcelStatus::Delivered));
    assert_eq!(ParcelStatus::Delivered.next(), None);
}

#[test]
fn parcel_serialization_uses_column_names() {
    let parcel = Parcel {
        number: 12,
        client: 42,
        status: ParcelStatus::Sent,
        address: "Psk, 220 Lenina st.".to_string(),
        created_at: "2026-10-18T09:30:00Z".to_string(),
    };

    let json = serde_json::to_value(&parcel).unwrap();
    assert_eq!(json["number"], 12);
    assert_eq!(json["client"], 42);
    assert_eq!(json["status"], "sent");
    assert_eq!(json["address"], "Psk, 220 Lenina st.");
    assert_eq!(json["created_at"], "2026-10-18T09:30:00Z");

    let decoded: Parcel = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, parcel);
}

#[test]
fn lenient_conversion_keeps_unknown_text() {
    assert_eq!(
        ParcelStatus::from("sent".to_string()),
        ParcelStatus::Sent
    );

    let odd = ParcelStatus::from("lost".to_string());
    assert_eq!(odd, ParcelStatus::Other("lost".to_string()));
    assert_eq!(odd.as_str(), "lost");
    assert!(!odd.is_known());
    assert_eq!(odd.next(), None);
    assert_eq!(String::from(odd), "lost");
}

#[test]
fn unknown_status_serializes_as_plain_text() {
    let mut parcel = Parcel::new(7, "somewhere");
    parcel.status = ParcelStatus::Other("lost".to_string());

    let json = serde_json::to_value(&parcel).unwrap();
    assert_eq!(json["status"], "lost");

    let decoded: Parcel = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, parcel);
}
