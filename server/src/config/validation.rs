//! Setting value validation.

use image_engine::ErrorLevel;

/// Upper bound accepted for the request body cap.
pub const MAX_UPLOAD_LIMIT: usize = 64 * 1024 * 1024;
/// Upper bound accepted for the largest QR code size.
pub const MAX_SIZE_LIMIT: u32 = 16_384;

/// Validate a setting value. Returns `Ok(())` if valid, or an error message.
pub fn validate_setting(key: &str, value: &str) -> Result<(), String> {
    match key {
        "ADDR" => validate_addr(value)?,
        "MAX_UPLOAD_BYTES" => {
            let v: usize = value.parse().map_err(|_| "must be an integer")?;
            if !(1..=MAX_UPLOAD_LIMIT).contains(&v) {
                return Err(format!("must be between 1 and {MAX_UPLOAD_LIMIT} bytes"));
            }
        }
        "MAX_SIZE" => {
            let v: u32 = value.parse().map_err(|_| "must be an integer")?;
            if !(1..=MAX_SIZE_LIMIT).contains(&v) {
                return Err(format!("must be between 1 and {MAX_SIZE_LIMIT} pixels"));
            }
        }
        "ERROR_LEVEL" => {
            value.parse::<ErrorLevel>()?;
        }
        _ => return Err(format!("unknown setting '{key}'")),
    }
    Ok(())
}

fn validate_addr(value: &str) -> Result<(), String> {
    let (_, port) = value
        .rsplit_once(':')
        .ok_or("must be in host:port or :port form")?;
    port.parse::<u16>()
        .map_err(|_| format!("invalid port '{port}'"))?;
    Ok(())
}
