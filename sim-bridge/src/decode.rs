//! Payload decoding and value formatting.

use sim_api::DataType;

use crate::error::DecodeError;

/// Decode the first element of a little-endian payload as `f64`.
///
/// Trailing bytes are ignored; a response may carry more than one element
/// but the bridge tracks one value per definition.
pub fn decode_first(payload: &[u8], data_type: DataType) -> Result<f64, DecodeError> {
    let size = data_type.size();
    let element = payload.get(..size).ok_or(DecodeError::TooShort {
        expected: size,
        actual: payload.len(),
    })?;

    let value = match data_type {
        DataType::Int32 => i32::from_le_bytes(to_array(element)) as f64,
        DataType::Int64 => i64::from_le_bytes(to_array(element)) as f64,
        DataType::Float32 => f32::from_le_bytes(to_array(element)) as f64,
        DataType::Float64 => f64::from_le_bytes(to_array(element)),
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(DecodeError::NonFinite)
    }
}

fn to_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut array = [0u8; N];
    array.copy_from_slice(&bytes[..N]);
    array
}

/// Render a value the way it is shown to the user: the shortest decimal
/// that reads back to the same number, without a trailing `.0`.
pub fn format_value(value: f64) -> String {
    format!("{}", value)
}
