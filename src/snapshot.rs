use crate::api::{self, Error};
use crate::model::{Api, Field, FieldMap, Timezone, Volt, Watt, WattHour};
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use std::fmt;

/// Format of field 100, e.g. `01.06.23 14:30:00`.
pub const TIME_FORMAT: &str = "%d.%m.%y %H:%M:%S";

/// Point-in-time readings of a Solar-Log device.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    time: DateTime<FixedOffset>,
    power_ac: Watt,
    power_dc: Watt,
    power_total: Watt,
    voltage_ac: Volt,
    voltage_dc: Volt,
    yield_day: WattHour,
    yield_yesterday: WattHour,
    yield_month: WattHour,
    yield_year: WattHour,
    yield_total: WattHour,
    consumption_ac: Watt,
    consumption_day: WattHour,
    consumption_yesterday: WattHour,
    consumption_month: WattHour,
    consumption_year: WattHour,
    consumption_total: WattHour,
}

fn value(fields: &FieldMap, field: Field) -> Result<&Value, Error> {
    fields
        .get(field)
        .ok_or_else(|| Error::MissingField(field.code()))
}

/* Device reports whole units, either as JSON numbers or as numeric strings */
fn integer(fields: &FieldMap, field: Field) -> Result<i64, Error> {
    let value = value(fields, field)?;

    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| {
        Error::InvalidResponse(
            value.to_string(),
            format!("field {} ({}) is not an integer", field.code(), field),
        )
    })
}

/// Parse a device timestamp (`TIME_FORMAT`) in `timezone`.
pub fn parse_time(time: &str, timezone: &Timezone) -> Result<DateTime<FixedOffset>, Error> {
    let naive = NaiveDateTime::parse_from_str(time.trim(), TIME_FORMAT)
        .map_err(|e| Error::TimestampParse(time.to_owned(), e.to_string()))?;

    timezone.localize(&naive).ok_or_else(|| {
        Error::TimestampParse(
            time.to_owned(),
            format!("local time does not exist in {}", timezone),
        )
    })
}

impl TelemetrySnapshot {
    /// Query `api` once and build a snapshot in the device's configured timezone.
    pub async fn fetch(api: &Api) -> Result<TelemetrySnapshot, Error> {
        let fields = api::fetch(api).await?;
        TelemetrySnapshot::from_fields(&fields, &api.timezone)
    }

    pub fn from_fields(fields: &FieldMap, timezone: &Timezone) -> Result<TelemetrySnapshot, Error> {
        let time = value(fields, Field::Time)?;
        let time = time.as_str().ok_or_else(|| {
            Error::InvalidResponse(time.to_string(), String::from("field 100 (time) is not a string"))
        })?;

        Ok(TelemetrySnapshot {
            time: parse_time(time, timezone)?,
            power_ac: integer(fields, Field::PowerAc)?,
            power_dc: integer(fields, Field::PowerDc)?,
            power_total: integer(fields, Field::PowerTotal)?,
            voltage_ac: integer(fields, Field::VoltageAc)?,
            voltage_dc: integer(fields, Field::VoltageDc)?,
            yield_day: integer(fields, Field::YieldDay)?,
            yield_yesterday: integer(fields, Field::YieldYesterday)?,
            yield_month: integer(fields, Field::YieldMonth)?,
            yield_year: integer(fields, Field::YieldYear)?,
            yield_total: integer(fields, Field::YieldTotal)?,
            consumption_ac: integer(fields, Field::ConsumptionAc)?,
            consumption_day: integer(fields, Field::ConsumptionDay)?,
            consumption_yesterday: integer(fields, Field::ConsumptionYesterday)?,
            consumption_month: integer(fields, Field::ConsumptionMonth)?,
            consumption_year: integer(fields, Field::ConsumptionYear)?,
            consumption_total: integer(fields, Field::ConsumptionTotal)?,
        })
    }

    /// Timestamp of the readings.
    pub fn time(&self) -> DateTime<FixedOffset> {
        self.time
    }

    pub fn power_ac(&self) -> Watt {
        self.power_ac
    }

    pub fn power_dc(&self) -> Watt {
        self.power_dc
    }

    /// Installed peak power.
    pub fn power_total(&self) -> Watt {
        self.power_total
    }

    pub fn voltage_ac(&self) -> Volt {
        self.voltage_ac
    }

    pub fn voltage_dc(&self) -> Volt {
        self.voltage_dc
    }

    pub fn yield_day(&self) -> WattHour {
        self.yield_day
    }

    pub fn yield_yesterday(&self) -> WattHour {
        self.yield_yesterday
    }

    pub fn yield_month(&self) -> WattHour {
        self.yield_month
    }

    pub fn yield_year(&self) -> WattHour {
        self.yield_year
    }

    pub fn yield_total(&self) -> WattHour {
        self.yield_total
    }

    /// Current consumption.
    pub fn consumption_ac(&self) -> Watt {
        self.consumption_ac
    }

    pub fn consumption_day(&self) -> WattHour {
        self.consumption_day
    }

    pub fn consumption_yesterday(&self) -> WattHour {
        self.consumption_yesterday
    }

    pub fn consumption_month(&self) -> WattHour {
        self.consumption_month
    }

    pub fn consumption_year(&self) -> WattHour {
        self.consumption_year
    }

    pub fn consumption_total(&self) -> WattHour {
        self.consumption_total
    }

    /// Efficiency of DC to AC conversion, between 0 and 1. Zero when there is no DC power.
    pub fn efficiency(&self) -> f64 {
        if self.power_dc == 0 {
            return 0.0;
        }
        self.power_ac as f64 / self.power_dc as f64
    }

    /// Loss of DC to AC conversion.
    pub fn alternator_loss(&self) -> Watt {
        self.power_dc.saturating_sub(self.power_ac)
    }

    /// Share of AC power consumed; above 1 if more power is consumed than generated.
    pub fn usage(&self) -> f64 {
        if self.power_ac == 0 {
            return 0.0;
        }
        self.consumption_ac as f64 / self.power_ac as f64
    }

    /// Surplus AC power. Negative if more power is consumed than generated.
    pub fn power_available(&self) -> Watt {
        self.power_ac.saturating_sub(self.consumption_ac)
    }

    /// Share of peak power currently generated.
    pub fn capacity(&self) -> f64 {
        if self.power_total == 0 {
            return 0.0;
        }
        self.power_dc as f64 / self.power_total as f64
    }
}

impl fmt::Display for TelemetrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: AC Power: {}W (DC Power: {}W, {}% efficiency, {}W loss), usage: {}W ({}%)",
            self.time.to_rfc3339(),
            self.power_ac,
            self.power_dc,
            (self.efficiency() * 100.0).round(),
            self.alternator_loss(),
            self.consumption_ac,
            (self.usage() * 100.0).round()
        )
    }
}
