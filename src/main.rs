#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use config::Config;
use rocket::{Build, Rocket, State};
use serde::Serialize;
use solarlog_rs::model::{Api, Timezone};
use solarlog_rs::{api, TelemetrySnapshot};
use std::sync::Mutex;
use std::time::{Duration, Instant};

mod metrics;

const TIMEZONE: &str = "UTC";
const INTERVAL: i64 = 60;
const TIMEOUT: i64 = 10;

#[derive(Clone, serde::Deserialize)]
pub struct SolarLogConfig {
    host: String,
    timezone: String,
    interval: u64,
    timeout: u64,
    proxy: Option<String>,
}

/// Structure containing state for API handlers.
pub struct StateData {
    api: Api,
    interval: u64,
    /// Timestamp of last successful metric collection via `metrics::collect()`
    timestamp: Mutex<Option<Instant>>,
}

impl StateData {
    /// Updates `timestamp` to `now()`.
    fn touch(&self) {
        if let Ok(mut ts) = self.timestamp.lock() {
            *ts = Some(Instant::now());
        } else {
            log::trace!("Unable to lock timestamp mutex, will refresh again")
        }
    }

    /// Checks whether `interval_seconds` elapsed since last `touch()`
    fn interval_elapsed(&self, interval_secs: u64) -> bool {
        let elapsed_opt = self
            .timestamp
            .lock()
            .ok()
            .and_then(|a| a.map(|b| b.elapsed().as_secs()));

        if let Some(elapsed) = elapsed_opt {
            elapsed > interval_secs
        } else {
            /* If there is None timestamp/elapsed, always return true to trigger action */
            true
        }
    }
}

/// Snapshot with its derived metrics, as served by `/snapshot`.
#[derive(Serialize)]
struct Report<'a> {
    #[serde(flatten)]
    snapshot: &'a TelemetrySnapshot,
    efficiency: f64,
    alternator_loss: i64,
    usage: f64,
    power_available: i64,
    capacity: f64,
}

impl<'a> From<&'a TelemetrySnapshot> for Report<'a> {
    fn from(snapshot: &'a TelemetrySnapshot) -> Self {
        Report {
            snapshot,
            efficiency: snapshot.efficiency(),
            alternator_loss: snapshot.alternator_loss(),
            usage: snapshot.usage(),
            power_available: snapshot.power_available(),
            capacity: snapshot.capacity(),
        }
    }
}

pub fn read_settings() -> Result<SolarLogConfig, config::ConfigError> {
    let mut settings = Config::default();
    settings
        .set_default("timezone", TIMEZONE)?
        .set_default("interval", INTERVAL)?
        .set_default("timeout", TIMEOUT)?
        .merge(config::Environment::with_prefix("SL"))?;

    settings.try_into()
}

fn build_api(settings: &SolarLogConfig) -> Result<Api, api::Error> {
    let timezone: Timezone = settings.timezone.parse()?;

    let mut builder =
        reqwest::ClientBuilder::new().timeout(Duration::from_secs(settings.timeout));
    if let Some(proxy) = &settings.proxy {
        let proxy = reqwest::Proxy::all(proxy.as_str()).map_err(|e| {
            log::error!("Invalid proxy {}: {}", proxy, e);
            api::Error::InternalError
        })?;
        builder = builder.proxy(proxy);
    }
    let client = builder.build().or(Err(api::Error::InternalError))?;

    Ok(api::api_with_client(settings.host.to_owned(), timezone, client))
}

#[get("/metrics")]
async fn metrics_route(state: &State<StateData>) -> Result<String, api::Error> {
    if state.interval_elapsed(state.interval) {
        metrics::collect(&state.api).await?;
        state.touch();
    } else {
        log::info!("interval time not yet elapsed since last run; returning cached result")
    }
    metrics::read().await
}

#[get("/snapshot")]
async fn snapshot_route(state: &State<StateData>) -> Result<String, api::Error> {
    let snapshot = TelemetrySnapshot::fetch(&state.api).await?;

    serde_json::to_string_pretty(&Report::from(&snapshot)).or(Err(api::Error::FormatError))
}

#[launch]
fn rocket() -> Rocket<Build> {
    env_logger::init();

    let settings = read_settings().expect("Configuration error");
    let api = build_api(&settings).expect("Configuration error");
    log::info!("Reading Solar-Log at {} ({})", api.host, api.timezone);

    let state = StateData {
        api,
        interval: settings.interval,
        timestamp: Mutex::new(None),
    };

    rocket::build()
        .manage(state)
        .mount("/", routes![metrics_route, snapshot_route])
}
