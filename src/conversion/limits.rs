use crate::codec::Format;
use crate::conversion::config::ConversionConfig;
use crate::error::{ConversionError, ConversionResult};

/// Reject inputs larger than the configured limit before any decoding.
pub fn check_input_size(input: &[u8], config: &ConversionConfig) -> ConversionResult<()> {
    if input.len() > config.max_input_bytes {
        return Err(ConversionError::InputTooLarge {
            size: input.len(),
            limit: config.max_input_bytes,
        });
    }
    Ok(())
}

/// Borrow the input as UTF-8 text, dropping a leading byte order mark.
pub fn input_text(input: &[u8], format: Format) -> ConversionResult<&str> {
    let text = std::str::from_utf8(input).map_err(|e| {
        ConversionError::decode(format, format!("input is not valid UTF-8: {}", e))
    })?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}
