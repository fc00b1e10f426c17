//! Record envelope decoding
//!
//! The backend answers record reads with `{ "data": <payload> }`. The
//! payload is either the field mapping itself, `null`, or a JSON string
//! that encodes the mapping (occasionally encoded more than once).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SnapshotError;
use crate::snapshot::PartialSnapshot;

/// Maximum number of string-encoding layers unwrapped
pub const MAX_ENCODING_DEPTH: usize = 3;

/// Response envelope of the read-record endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordEnvelope {
    /// Record payload, possibly string-encoded
    #[serde(default)]
    pub data: Value,
}

impl RecordEnvelope {
    /// Decode the payload into a field mapping
    ///
    /// # Errors
    /// See [`decode_payload`]
    pub fn into_snapshot(self) -> Result<Option<PartialSnapshot>, SnapshotError> {
        decode_payload(self.data)
    }
}

/// Unwrap a possibly string-encoded payload
///
/// # Returns
/// - `Ok(Some(_))` for an object (after unwrapping string layers)
/// - `Ok(None)` for `null` or an empty string
///
/// # Errors
/// [`SnapshotError::Decode`] when a layer is not valid JSON, when more than
/// [`MAX_ENCODING_DEPTH`] layers are nested, or when the payload ends in
/// something other than an object
pub fn decode_payload(payload: Value) -> Result<Option<PartialSnapshot>, SnapshotError> {
    let mut current = payload;
    let mut layers = 0;

    loop {
        match current {
            Value::Object(map) => return Ok(Some(PartialSnapshot::from_json_map(map))),
            Value::Null => return Ok(None),
            Value::String(encoded) => {
                if encoded.trim().is_empty() {
                    return Ok(None);
                }
                layers += 1;
                if layers > MAX_ENCODING_DEPTH {
                    return Err(SnapshotError::Decode(format!(
                        "payload nested deeper than {MAX_ENCODING_DEPTH} string layers"
                    )));
                }
                current = serde_json::from_str(&encoded)
                    .map_err(|e| SnapshotError::Decode(format!("layer {layers}: {e}")))?;
            }
            other => {
                return Err(SnapshotError::Decode(format!(
                    "expected object payload, got {}",
                    kind_name(&other)
                )));
            }
        }
    }
}

/// Parse a raw response body and decode its payload
///
/// # Errors
/// [`SnapshotError::Json`] if the body is not an envelope, otherwise see
/// [`decode_payload`]
pub fn decode_envelope(body: &str) -> Result<Option<PartialSnapshot>, SnapshotError> {
    let envelope: RecordEnvelope = serde_json::from_str(body)?;
    envelope.into_snapshot()
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
