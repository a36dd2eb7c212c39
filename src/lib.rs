//! Client for the Solar-Log JSON interface (`/getjp`).
//!
//! ```no_run
//! # async fn run() -> Result<(), solarlog_rs::Error> {
//! let api = solarlog_rs::api::api(String::from("http://10.0.0.10"), "+0200".parse()?)?;
//! let snapshot = solarlog_rs::TelemetrySnapshot::fetch(&api).await?;
//! println!("{}", snapshot);
//! println!("Remaining power: {}W", snapshot.power_available());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod model;
pub mod snapshot;

pub use api::Error;
pub use snapshot::TelemetrySnapshot;
