use crate::api::Error;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use num_derive::FromPrimitive;
use serde_json::Value;

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub type Watt = i64;
pub type WattHour = i64;
pub type Volt = i64;

/// Timezone the device clock runs in. Solar-Log timestamps carry no offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timezone {
    Offset(FixedOffset),
    Named(Tz),
}

impl Default for Timezone {
    fn default() -> Self {
        Timezone::Offset(Utc.fix())
    }
}

impl Timezone {
    /// Attach this timezone to a device-local `naive` time. Ambiguous local times resolve to the
    /// earlier instant; `None` if the local time does not exist (DST gap).
    pub fn localize(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Timezone::Offset(offset) => offset.from_local_datetime(naive).single(),
            Timezone::Named(tz) => tz
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.with_timezone(&dt.offset().fix())),
        }
    }
}

/// Parse `+HHMM`, `+HH:MM` or `+HH` into seconds east of UTC.
fn parse_offset(s: &str) -> Option<i32> {
    let (sign, rest) = match s.chars().next()? {
        '+' => (1, &s[1..]),
        '-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (
            digits[..2].parse::<i32>().ok()?,
            digits[2..].parse::<i32>().ok()?,
        ),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

impl FromStr for Timezone {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "UTC" | "utc" | "Z" => Ok(Timezone::default()),
            _ if s.starts_with('+') || s.starts_with('-') => parse_offset(s)
                .and_then(FixedOffset::east_opt)
                .map(Timezone::Offset)
                .ok_or_else(|| Error::InvalidTimezone(s.to_owned())),
            _ => s
                .parse::<Tz>()
                .map(Timezone::Named)
                .map_err(|_| Error::InvalidTimezone(s.to_owned())),
        }
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timezone::Offset(offset) => write!(f, "{}", offset),
            Timezone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Api {
    pub host: String,
    pub timezone: Timezone,
    pub client: reqwest::Client,
}

/// Solar-Log field codes of query group 801/170.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive)]
pub enum Field {
    Time = 100,
    PowerAc = 101,
    PowerDc = 102,
    VoltageAc = 103,
    VoltageDc = 104,
    YieldDay = 105,
    YieldYesterday = 106,
    YieldMonth = 107,
    YieldYear = 108,
    YieldTotal = 109,
    ConsumptionAc = 110,
    ConsumptionDay = 111,
    ConsumptionYesterday = 112,
    ConsumptionMonth = 113,
    ConsumptionYear = 114,
    ConsumptionTotal = 115,
    PowerTotal = 116,
}

impl Field {
    pub const ALL: [Field; 17] = [
        Field::Time,
        Field::PowerAc,
        Field::PowerDc,
        Field::VoltageAc,
        Field::VoltageDc,
        Field::YieldDay,
        Field::YieldYesterday,
        Field::YieldMonth,
        Field::YieldYear,
        Field::YieldTotal,
        Field::ConsumptionAc,
        Field::ConsumptionDay,
        Field::ConsumptionYesterday,
        Field::ConsumptionMonth,
        Field::ConsumptionYear,
        Field::ConsumptionTotal,
        Field::PowerTotal,
    ];

    pub fn code(self) -> u64 {
        self as u64
    }

    /// Decode a string-encoded field code such as `"101"`.
    pub fn from_code(code: &str) -> Option<Field> {
        code.parse::<u64>()
            .ok()
            .and_then(num::FromPrimitive::from_u64)
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Time => "time",
            Field::PowerAc => "power_ac",
            Field::PowerDc => "power_dc",
            Field::VoltageAc => "voltage_ac",
            Field::VoltageDc => "voltage_dc",
            Field::YieldDay => "yield_day",
            Field::YieldYesterday => "yield_yesterday",
            Field::YieldMonth => "yield_month",
            Field::YieldYear => "yield_year",
            Field::YieldTotal => "yield_total",
            Field::ConsumptionAc => "consumption_ac",
            Field::ConsumptionDay => "consumption_day",
            Field::ConsumptionYesterday => "consumption_yesterday",
            Field::ConsumptionMonth => "consumption_month",
            Field::ConsumptionYear => "consumption_year",
            Field::ConsumptionTotal => "consumption_total",
            Field::PowerTotal => "power_total",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device readings under their field names, values as returned by the device.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap(BTreeMap<Field, Value>);

impl FieldMap {
    /// Build from `values`, which must hold every field of `Field::ALL`.
    pub fn new(values: BTreeMap<Field, Value>) -> Result<FieldMap, Error> {
        match Field::ALL.iter().find(|field| !values.contains_key(*field)) {
            Some(missing) => Err(Error::MissingField(missing.code())),
            None => Ok(FieldMap(values)),
        }
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.0.get(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, Field, Value> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a Field, &'a Value);
    type IntoIter = btree_map::Iter<'a, Field, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
