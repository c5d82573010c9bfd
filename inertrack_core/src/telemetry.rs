// inertrack_core/src/telemetry.rs

//! The datagram contract between a tracked device and the collector.
//!
//! Binary layout, little-endian:
//!
//! | offset | type | field |
//! |---|---|---|
//! | 0  | i32 | session id |
//! | 4  | f64 | position x (m) |
//! | 12 | f64 | position y (m) |
//! | 20 | i64 | timestamp (unix ms) |
//! | 28 | f64 | position z (m), optional |
//!
//! z sits after the timestamp so collectors that only know the 28-byte
//! layout can still read the first four fields of a 36-byte datagram.

use crate::engine::Snapshot;
use crate::error::TrackerError;
use crate::types::SessionId;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::time::{SystemTime, UNIX_EPOCH};

pub const PLANAR_PACKET_LEN: usize = 28;
pub const SPATIAL_PACKET_LEN: usize = 36;

/// One position report as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionReport {
    pub session_id: SessionId,
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
    pub timestamp_ms: i64,
}

impl PositionReport {
    pub fn from_snapshot(
        snapshot: &Snapshot,
        session_id: SessionId,
        include_z: bool,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            session_id,
            x: snapshot.position.x,
            y: snapshot.position.y,
            z: include_z.then_some(snapshot.position.z),
            timestamp_ms,
        }
    }

    // --- Binary ---

    pub fn encode_binary(&self) -> Vec<u8> {
        let len = if self.z.is_some() {
            SPATIAL_PACKET_LEN
        } else {
            PLANAR_PACKET_LEN
        };
        let mut buf = Vec::with_capacity(len);
        // Writes into a Vec cannot fail.
        let _ = self.write_binary(&mut buf);
        buf
    }

    fn write_binary(&self, buf: &mut Vec<u8>) -> std::io::Result<()> {
        buf.write_i32::<LittleEndian>(self.session_id.0)?;
        buf.write_f64::<LittleEndian>(self.x)?;
        buf.write_f64::<LittleEndian>(self.y)?;
        buf.write_i64::<LittleEndian>(self.timestamp_ms)?;
        if let Some(z) = self.z {
            buf.write_f64::<LittleEndian>(z)?;
        }
        Ok(())
    }

    pub fn decode_binary(data: &[u8]) -> Result<Self, TrackerError> {
        if data.len() != PLANAR_PACKET_LEN && data.len() != SPATIAL_PACKET_LEN {
            return Err(TrackerError::Decode(format!(
                "expected {} or {} bytes, got {}",
                PLANAR_PACKET_LEN,
                SPATIAL_PACKET_LEN,
                data.len()
            )));
        }

        let mut cursor = Cursor::new(data);
        let read = |e: std::io::Error| TrackerError::Decode(e.to_string());
        let session_id = SessionId(cursor.read_i32::<LittleEndian>().map_err(read)?);
        let x = cursor.read_f64::<LittleEndian>().map_err(read)?;
        let y = cursor.read_f64::<LittleEndian>().map_err(read)?;
        let timestamp_ms = cursor.read_i64::<LittleEndian>().map_err(read)?;
        let z = if data.len() == SPATIAL_PACKET_LEN {
            Some(cursor.read_f64::<LittleEndian>().map_err(read)?)
        } else {
            None
        };

        Ok(Self {
            session_id,
            x,
            y,
            z,
            timestamp_ms,
        })
    }

    // --- Text ---

    /// `id=<i32> x=<f64> y=<f64>[ z=<f64>] t=<i64>`
    pub fn encode_text(&self) -> String {
        match self.z {
            Some(z) => format!(
                "id={} x={} y={} z={} t={}",
                self.session_id, self.x, self.y, z, self.timestamp_ms
            ),
            None => format!(
                "id={} x={} y={} t={}",
                self.session_id, self.x, self.y, self.timestamp_ms
            ),
        }
    }

    pub fn decode_text(line: &str) -> Result<Self, TrackerError> {
        let mut session_id = None;
        let mut x = None;
        let mut y = None;
        let mut z = None;
        let mut timestamp_ms = None;

        for field in line.split_whitespace() {
            let (key, value) = field
                .split_once('=')
                .ok_or_else(|| TrackerError::Decode(format!("field '{}' has no '='", field)))?;
            let bad = || TrackerError::Decode(format!("bad value in '{}'", field));
            match key {
                "id" => session_id = Some(SessionId(value.parse().map_err(|_| bad())?)),
                "x" => x = Some(value.parse::<f64>().map_err(|_| bad())?),
                "y" => y = Some(value.parse::<f64>().map_err(|_| bad())?),
                "z" => z = Some(value.parse::<f64>().map_err(|_| bad())?),
                "t" => timestamp_ms = Some(value.parse::<i64>().map_err(|_| bad())?),
                other => {
                    return Err(TrackerError::Decode(format!("unknown field '{}'", other)));
                }
            }
        }

        let missing = |name: &str| TrackerError::Decode(format!("missing field '{}'", name));
        Ok(Self {
            session_id: session_id.ok_or_else(|| missing("id"))?,
            x: x.ok_or_else(|| missing("x"))?,
            y: y.ok_or_else(|| missing("y"))?,
            z,
            timestamp_ms: timestamp_ms.ok_or_else(|| missing("t"))?,
        })
    }
}

/// The two encodings a datagram can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    #[default]
    Binary,
    Text,
}

impl WireFormat {
    pub fn encode(&self, report: &PositionReport) -> Vec<u8> {
        match self {
            WireFormat::Binary => report.encode_binary(),
            WireFormat::Text => report.encode_text().into_bytes(),
        }
    }

    pub fn decode(&self, data: &[u8]) -> Result<PositionReport, TrackerError> {
        match self {
            WireFormat::Binary => PositionReport::decode_binary(data),
            WireFormat::Text => {
                let line = std::str::from_utf8(data)
                    .map_err(|e| TrackerError::Decode(e.to_string()))?;
                PositionReport::decode_text(line.trim())
            }
        }
    }
}

/// Wall-clock milliseconds since the Unix epoch, for datagram timestamps.
/// Integration never uses this clock.
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Vec3;

    fn report() -> PositionReport {
        PositionReport {
            session_id: SessionId(7),
            x: 1.5,
            y: -2.25,
            z: None,
            timestamp_ms: 1000,
        }
    }

    #[test]
    fn test_binary_layout_matches_collector_offsets() {
        let bytes = report().encode_binary();
        assert_eq!(bytes.len(), PLANAR_PACKET_LEN);
        assert_eq!(&bytes[0..4], &7i32.to_le_bytes());
        assert_eq!(&bytes[4..12], &1.5f64.to_le_bytes());
        assert_eq!(&bytes[12..20], &(-2.25f64).to_le_bytes());
        assert_eq!(&bytes[20..28], &1000i64.to_le_bytes());
    }

    #[test]
    fn test_binary_z_is_appended_after_timestamp() {
        let with_z = PositionReport {
            z: Some(0.75),
            ..report()
        };
        let bytes = with_z.encode_binary();
        assert_eq!(bytes.len(), SPATIAL_PACKET_LEN);
        assert_eq!(&bytes[28..36], &0.75f64.to_le_bytes());

        // A 28-byte reader still finds the original fields.
        let prefix = PositionReport::decode_binary(&bytes[..PLANAR_PACKET_LEN]).unwrap();
        assert_eq!(prefix, report());
        assert_eq!(PositionReport::decode_binary(&bytes).unwrap(), with_z);
    }

    #[test]
    fn test_short_datagram_is_rejected() {
        let bytes = report().encode_binary();
        let err = PositionReport::decode_binary(&bytes[..27]).unwrap_err();
        assert!(matches!(err, TrackerError::Decode(_)));
    }

    #[test]
    fn test_text_format() {
        let line = report().encode_text();
        assert_eq!(line, "id=7 x=1.5 y=-2.25 t=1000");
        assert_eq!(PositionReport::decode_text(&line).unwrap(), report());

        assert!(PositionReport::decode_text("id=7 x=1.5 t=1000").is_err());
        assert!(PositionReport::decode_text("id=7 x=abc y=0 t=1").is_err());
        assert!(PositionReport::decode_text("id=7 x=1 y=0 t=1 w=3").is_err());
    }

    #[test]
    fn test_wire_format_text_tolerates_trailing_newline() {
        let decoded = WireFormat::Text
            .decode(b"id=3 x=0 y=1 z=2 t=5\n")
            .unwrap();
        assert_eq!(decoded.z, Some(2.0));
        assert_eq!(decoded.session_id, SessionId(3));
    }

    #[test]
    fn test_from_snapshot_respects_include_z() {
        let snapshot = Snapshot {
            position: Vec3::new(1.0, 2.0, 3.0),
            ..Snapshot::default()
        };
        let planar = PositionReport::from_snapshot(&snapshot, SessionId(1), false, 9);
        assert_eq!(planar.z, None);
        let spatial = PositionReport::from_snapshot(&snapshot, SessionId(1), true, 9);
        assert_eq!(spatial.z, Some(3.0));
        assert_eq!((spatial.x, spatial.y), (1.0, 2.0));
    }
}
