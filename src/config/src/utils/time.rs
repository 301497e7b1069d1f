// Copyright 2025 OpenObserve Inc.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

// Wire format for every timestamp: UTC ISO-8601 with milliseconds
// zero-padded to three digits, e.g. `2024-01-01T00:00:00.000Z`.
const ISO_MILLI_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

#[inline(always)]
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

#[inline(always)]
pub fn format_iso_milli(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_iso_milli(s: &str) -> Result<DateTime<Utc>, anyhow::Error> {
    let t = NaiveDateTime::parse_from_str(s, ISO_MILLI_FORMAT)?;
    Ok(t.and_utc())
}

/// Serde adapter for `DateTime<Utc>` fields in the wire format.
pub mod iso_milli {
    use serde::{self, Deserialize, Deserializer, Serializer};

    use super::*;

    pub fn serialize<S>(t: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_iso_milli(t))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_iso_milli(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional timestamps. `null` and the empty string both
/// deserialize to `None` (older senders encode a missing expire time as "").
pub mod iso_milli_opt {
    use serde::{self, Deserialize, Deserializer, Serializer};

    use super::*;

    pub fn serialize<S>(t: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match t {
            Some(t) => serializer.serialize_str(&format_iso_milli(t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = Option::<String>::deserialize(deserializer)?;
        match s.as_deref() {
            None | Some("") => Ok(None),
            Some(s) => parse_iso_milli(s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_iso_milli_pads_to_three_digits() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_iso_milli(&t), "2024-01-01T00:00:00.000Z");

        let t = t + chrono::Duration::milliseconds(7);
        assert_eq!(format_iso_milli(&t), "2024-01-01T00:00:00.007Z");
    }

    #[test]
    fn test_parse_iso_milli_round_trip() {
        let s = "2024-01-01T12:34:56.789Z";
        let t = parse_iso_milli(s).unwrap();
        assert_eq!(format_iso_milli(&t), s);
    }

    #[test]
    fn test_parse_iso_milli_rejects_garbage() {
        assert!(parse_iso_milli("2024-01-01 12:34:56").is_err());
        assert!(parse_iso_milli("").is_err());
    }
}
