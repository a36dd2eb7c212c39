use prometheus::{Encoder, GaugeVec, IntGaugeVec, TextEncoder};
use solarlog_rs::model::Api;
use solarlog_rs::TelemetrySnapshot;

lazy_static! {
    static ref POWER_GAUGE: IntGaugeVec = register_int_gauge_vec!(
        opts!(
            "solarlog_power_watts",
            "current power reported by Solar-Log (ac, dc), installed peak power (total) and derived surplus (available) and conversion loss (loss)",
        ),
        &["host", "kind"],
    )
    .unwrap();
    static ref VOLTAGE_GAUGE: IntGaugeVec = register_int_gauge_vec!(
        opts!("solarlog_voltage_volts", "AC and DC voltage reported by Solar-Log",),
        &["host", "kind"],
    )
    .unwrap();
    static ref YIELD_GAUGE: IntGaugeVec = register_int_gauge_vec!(
        opts!("solarlog_yield_watthours", "energy yield per period (in Wh)",),
        &["host", "period"],
    )
    .unwrap();
    static ref CONSUMPTION_POWER_GAUGE: IntGaugeVec = register_int_gauge_vec!(
        opts!("solarlog_consumption_watts", "current consumption (in W)",),
        &["host"],
    )
    .unwrap();
    static ref CONSUMPTION_GAUGE: IntGaugeVec = register_int_gauge_vec!(
        opts!(
            "solarlog_consumption_watthours",
            "energy consumption per period (in Wh)",
        ),
        &["host", "period"],
    )
    .unwrap();
    static ref RATIO_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "solarlog_ratio",
            "conversion efficiency, usage of generated power and capacity of peak power, as ratio",
        ),
        &["host", "ratio"],
    )
    .unwrap();
    static ref TIMESTAMP_GAUGE: IntGaugeVec = register_int_gauge_vec!(
        opts!(
            "solarlog_timestamp_seconds",
            "device timestamp of the last readings (unix time)",
        ),
        &["host"],
    )
    .unwrap();
}

/// Feed `snapshot` taken from `host` to Prometheus metrics.
fn process_snapshot(host: &str, snapshot: &TelemetrySnapshot) {
    for (kind, value) in [
        ("ac", snapshot.power_ac()),
        ("dc", snapshot.power_dc()),
        ("total", snapshot.power_total()),
        ("available", snapshot.power_available()),
        ("loss", snapshot.alternator_loss()),
    ] {
        POWER_GAUGE.with_label_values(&[host, kind]).set(value);
    }

    for (kind, value) in [("ac", snapshot.voltage_ac()), ("dc", snapshot.voltage_dc())] {
        VOLTAGE_GAUGE.with_label_values(&[host, kind]).set(value);
    }

    for (period, value) in [
        ("day", snapshot.yield_day()),
        ("yesterday", snapshot.yield_yesterday()),
        ("month", snapshot.yield_month()),
        ("year", snapshot.yield_year()),
        ("total", snapshot.yield_total()),
    ] {
        YIELD_GAUGE.with_label_values(&[host, period]).set(value);
    }

    CONSUMPTION_POWER_GAUGE
        .with_label_values(&[host])
        .set(snapshot.consumption_ac());

    for (period, value) in [
        ("day", snapshot.consumption_day()),
        ("yesterday", snapshot.consumption_yesterday()),
        ("month", snapshot.consumption_month()),
        ("year", snapshot.consumption_year()),
        ("total", snapshot.consumption_total()),
    ] {
        CONSUMPTION_GAUGE.with_label_values(&[host, period]).set(value);
    }

    for (ratio, value) in [
        ("efficiency", snapshot.efficiency()),
        ("usage", snapshot.usage()),
        ("capacity", snapshot.capacity()),
    ] {
        RATIO_GAUGE.with_label_values(&[host, ratio]).set(value);
    }

    TIMESTAMP_GAUGE
        .with_label_values(&[host])
        .set(snapshot.time().timestamp());
}

/// Collect all supported metrics from `api`, updating Prometheus exporter registry.
pub async fn collect(api: &Api) -> Result<(), solarlog_rs::Error> {
    let snapshot = TelemetrySnapshot::fetch(api).await?;
    log::info!("{}", snapshot);
    process_snapshot(&api.host, &snapshot);

    Ok(())
}

/// Read metrics from Prometheus exporter registry.
pub async fn read() -> Result<String, solarlog_rs::Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .or(Err(solarlog_rs::Error::FormatError))?;
    String::from_utf8(buffer).or(Err(solarlog_rs::Error::FormatError))
}
