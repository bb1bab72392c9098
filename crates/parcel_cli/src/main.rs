//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `parcel_core` linkage and run the parcel lifecycle once against
//!   the configured database.
//! - Keep output short and line-oriented for quick sanity checks.

use log::error;
use parcel_core::db::open_db;
use parcel_core::{
    core_version, init_logging, ping, ClientId, ParcelService, ServiceError, SqliteParcelStore,
    TrackerConfig,
};
use std::error::Error;
use std::process::ExitCode;

const DEMO_CLIENT: ClientId = 1;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={err}");
            eprintln!("parcel_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    println!("parcel_core ping={}", ping());
    println!("parcel_core version={}", core_version());

    let config = TrackerConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = open_db(&config.db_path)?;
    let store = SqliteParcelStore::try_new(&conn)?;
    let service = ParcelService::new(store);

    let parcel = service.register(DEMO_CLIENT, "Psk, 220 Lenina st.")?;
    println!(
        "registered number={} client={} status={}",
        parcel.number, parcel.client, parcel.status
    );

    service.change_address(parcel.number, "Saratov, 14 Pervomayskaya st.")?;
    println!("address changed number={}", parcel.number);

    loop {
        match service.next_status(parcel.number) {
            Ok(status) => println!("status advanced number={} status={status}", parcel.number),
            Err(ServiceError::AlreadyDelivered(_)) => break,
            Err(err) => return Err(err.into()),
        }
    }

    let throwaway = service.register(DEMO_CLIENT, "Tver, 5 Sovetskaya st.")?;
    service.delete(throwaway.number)?;
    println!("deleted number={}", throwaway.number);

    for stored in service.client_parcels(DEMO_CLIENT)? {
        println!(
            "client={} number={} status={} created_at={} address={}",
            stored.client, stored.number, stored.status, stored.created_at, stored.address
        );
    }

    Ok(())
}
