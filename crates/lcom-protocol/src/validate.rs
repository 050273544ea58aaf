//! Field validation for outgoing commands.
//!
//! Operator input arrives as text or as wide numeric values. Every command
//! has a validator that either returns the typed values to encode or a
//! [`ValidationError`] naming the first offending field;
//! [`validate_lora_parameters_all`] collects every one. Nothing is encoded
//! or framed for a rejected command, so it never consumes a sequence id.

use crate::constants::*;
use crate::error::{Field, ValidationError};
use crate::types::{LoraParameters, Mode, ModeMessage};

/// Unchecked LoRa parameter values, as an operator supplied them.
///
/// Integer fields are held as `i64` so that out-of-range input such as a
/// negative preamble can be reported rather than wrapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawLoraParameters {
    /// Carrier frequency in MHz.
    pub frequency: f64,
    /// Bandwidth in kHz.
    pub bandwidth: f64,
    /// Spreading factor.
    pub spreading_factor: i64,
    /// Coding rate denominator.
    pub coding_rate: i64,
    /// Sync word.
    pub sync_word: i64,
    /// Output power in dBm.
    pub power: i64,
    /// Preamble length in symbols.
    pub preamble_length: i64,
    /// Current limit in mA.
    pub current_limit: f64,
}

impl Default for RawLoraParameters {
    fn default() -> Self {
        RawLoraParameters::from(LoraParameters::default())
    }
}

impl From<LoraParameters> for RawLoraParameters {
    fn from(params: LoraParameters) -> Self {
        RawLoraParameters {
            frequency: params.frequency as f64,
            bandwidth: params.bandwidth as f64,
            spreading_factor: params.spreading_factor as i64,
            coding_rate: params.coding_rate as i64,
            sync_word: params.sync_word as i64,
            power: params.power as i64,
            preamble_length: params.preamble_length as i64,
            current_limit: params.current_limit as f64,
        }
    }
}

impl RawLoraParameters {
    /// Replace one field with a value parsed from text.
    ///
    /// Only parsing is checked here; ranges are checked by
    /// [`validate_lora_parameters`].
    pub fn set_from_text(&mut self, field: Field, raw: &str) -> Result<(), ValidationError> {
        match field {
            Field::Frequency => self.frequency = parse_decimal(field, raw)?,
            Field::Bandwidth => self.bandwidth = parse_decimal(field, raw)?,
            Field::SpreadingFactor => self.spreading_factor = parse_integer(field, raw)?,
            Field::CodingRate => self.coding_rate = parse_integer(field, raw)?,
            Field::SyncWord => self.sync_word = parse_integer(field, raw)?,
            Field::Power => self.power = parse_integer(field, raw)?,
            Field::PreambleLength => self.preamble_length = parse_integer(field, raw)?,
            Field::CurrentLimit => self.current_limit = parse_decimal(field, raw)?,
            Field::UnixTimestamp | Field::Mode | Field::Message => {
                return Err(ValidationError::NotNumeric {
                    field,
                    raw: raw.to_string(),
                })
            }
        }
        Ok(())
    }
}

/// Parse a decimal field. Empty, non-numeric and non-finite text is rejected.
pub fn parse_decimal(field: Field, raw: &str) -> Result<f64, ValidationError> {
    let not_numeric = || ValidationError::NotNumeric {
        field,
        raw: raw.to_string(),
    };

    let value: f64 = raw.trim().parse().map_err(|_| not_numeric())?;
    if !value.is_finite() {
        return Err(not_numeric());
    }
    Ok(value)
}

/// Parse an integer field, decimal or `0x`-prefixed hex.
///
/// Fractional text such as `"9.5"` is rejected rather than rounded.
pub fn parse_integer(field: Field, raw: &str) -> Result<i64, ValidationError> {
    let text = raw.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let (radix, digits) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, digits),
    };

    // from_str_radix accepts its own sign, which would allow "--3".
    if digits.starts_with(['+', '-']) {
        return Err(ValidationError::NotNumeric {
            field,
            raw: raw.to_string(),
        });
    }

    match i64::from_str_radix(digits, radix) {
        Ok(value) => Ok(if negative { -value } else { value }),
        Err(_) => Err(ValidationError::NotNumeric {
            field,
            raw: raw.to_string(),
        }),
    }
}

fn check_decimal(field: Field, value: f64, min: f64, max: f64) -> Result<f64, ValidationError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        log::debug!("rejecting {}: {} not in [{}, {}]", field, value, min, max);
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn check_integer(field: Field, value: i64, min: i64, max: i64) -> Result<i64, ValidationError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        log::debug!("rejecting {}: {} not in [{}, {}]", field, value, min, max);
        Err(ValidationError::OutOfRange {
            field,
            value: value as f64,
            min: min as f64,
            max: max as f64,
        })
    }
}

fn check_length(field: Field, len: usize, min: usize, max: usize) -> Result<(), ValidationError> {
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        log::debug!("rejecting {}: length {} not in [{}, {}]", field, len, min, max);
        Err(ValidationError::BadLength {
            field,
            len,
            min,
            max,
        })
    }
}

fn check_sync_word(value: i64) -> Result<i64, ValidationError> {
    let sync_word = check_integer(Field::SyncWord, value, MIN_SYNC_WORD, MAX_SYNC_WORD)?;
    if sync_word == LORAWAN_SYNC_WORD as i64 {
        log::debug!("rejecting reserved sync word 0x{:02X}", LORAWAN_SYNC_WORD);
        return Err(ValidationError::Reserved {
            field: Field::SyncWord,
            value: LORAWAN_SYNC_WORD,
        });
    }
    Ok(sync_word)
}

/// Validate SetLoraParameters input.
///
/// Fields are checked in wire order and the first failure rejects the whole
/// command.
pub fn validate_lora_parameters(raw: &RawLoraParameters) -> Result<LoraParameters, ValidationError> {
    let frequency = check_decimal(Field::Frequency, raw.frequency, MIN_FREQUENCY, MAX_FREQUENCY)?;
    let bandwidth = check_decimal(Field::Bandwidth, raw.bandwidth, MIN_BANDWIDTH, MAX_BANDWIDTH)?;
    let spreading_factor = check_integer(
        Field::SpreadingFactor,
        raw.spreading_factor,
        MIN_SPREADING_FACTOR,
        MAX_SPREADING_FACTOR,
    )?;
    let coding_rate = check_integer(
        Field::CodingRate,
        raw.coding_rate,
        MIN_CODING_RATE,
        MAX_CODING_RATE,
    )?;
    let sync_word = check_sync_word(raw.sync_word)?;
    let power = check_integer(Field::Power, raw.power, MIN_POWER, MAX_POWER)?;
    let preamble_length = check_integer(
        Field::PreambleLength,
        raw.preamble_length,
        MIN_PREAMBLE_LENGTH,
        MAX_PREAMBLE_LENGTH,
    )?;
    let current_limit = check_decimal(
        Field::CurrentLimit,
        raw.current_limit,
        MIN_CURRENT_LIMIT,
        MAX_CURRENT_LIMIT,
    )?;

    // Every integer is range-checked above, so the narrowing casts are exact.
    Ok(LoraParameters {
        frequency: frequency as f32,
        bandwidth: bandwidth as f32,
        spreading_factor: spreading_factor as u8,
        coding_rate: coding_rate as u8,
        sync_word: sync_word as u8,
        power: power as i8,
        preamble_length: preamble_length as u16,
        current_limit: current_limit as f32,
    })
}

/// Validate SetLoraParameters input, reporting every bad field.
///
/// Errors come back in wire order, one per failing field.
pub fn validate_lora_parameters_all(
    raw: &RawLoraParameters,
) -> Result<LoraParameters, Vec<ValidationError>> {
    let checks = [
        check_decimal(Field::Frequency, raw.frequency, MIN_FREQUENCY, MAX_FREQUENCY).err(),
        check_decimal(Field::Bandwidth, raw.bandwidth, MIN_BANDWIDTH, MAX_BANDWIDTH).err(),
        check_integer(
            Field::SpreadingFactor,
            raw.spreading_factor,
            MIN_SPREADING_FACTOR,
            MAX_SPREADING_FACTOR,
        )
        .err(),
        check_integer(Field::CodingRate, raw.coding_rate, MIN_CODING_RATE, MAX_CODING_RATE).err(),
        check_sync_word(raw.sync_word).err(),
        check_integer(Field::Power, raw.power, MIN_POWER, MAX_POWER).err(),
        check_integer(
            Field::PreambleLength,
            raw.preamble_length,
            MIN_PREAMBLE_LENGTH,
            MAX_PREAMBLE_LENGTH,
        )
        .err(),
        check_decimal(
            Field::CurrentLimit,
            raw.current_limit,
            MIN_CURRENT_LIMIT,
            MAX_CURRENT_LIMIT,
        )
        .err(),
    ];

    let errors: Vec<ValidationError> = checks.into_iter().flatten().collect();
    if errors.is_empty() {
        validate_lora_parameters(raw).map_err(|err| vec![err])
    } else {
        Err(errors)
    }
}

/// Validate a SetUnix timestamp.
pub fn validate_unix_timestamp(timestamp: i64) -> Result<u32, ValidationError> {
    check_integer(Field::UnixTimestamp, timestamp, 0, u32::MAX as i64).map(|t| t as u32)
}

/// Validate a mode name.
pub fn validate_mode(raw: &str) -> Result<Mode, ValidationError> {
    raw.parse()
}

/// Validate SetModeMessage input.
///
/// An empty message is accepted and tells the module to keep its current
/// repeater message.
pub fn validate_mode_message(mode: &str, message: &[u8]) -> Result<ModeMessage, ValidationError> {
    let mode = validate_mode(mode)?;
    check_length(Field::Message, message.len(), 0, MAX_LORA_MESSAGE_LENGTH)?;

    Ok(ModeMessage {
        mode,
        message: message.to_vec(),
    })
}

/// Validate the text of a standalone LoRa message. Empty messages are rejected.
pub fn validate_message(message: &[u8]) -> Result<Vec<u8>, ValidationError> {
    check_length(Field::Message, message.len(), 1, MAX_LORA_MESSAGE_LENGTH)?;
    Ok(message.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RawLoraParameters {
        RawLoraParameters::default()
    }

    #[test]
    fn test_defaults_validate() {
        let params = validate_lora_parameters(&valid()).unwrap();
        assert_eq!(params, LoraParameters::default());
    }

    #[test]
    fn test_range_edges_accepted() {
        let raw = RawLoraParameters {
            frequency: 960.0,
            bandwidth: 0.0,
            spreading_factor: 12,
            coding_rate: 5,
            sync_word: 255,
            power: -17,
            preamble_length: 65535,
            current_limit: 140.0,
        };
        let params = validate_lora_parameters(&raw).unwrap();
        assert_eq!(params.sync_word, 0xFF);
        assert_eq!(params.power, -17);
        assert_eq!(params.preamble_length, u16::MAX);
    }

    #[test]
    fn test_all_bad_fields_reported() {
        let raw = RawLoraParameters {
            frequency: 100.0,
            coding_rate: 9,
            sync_word: 0x34,
            current_limit: 141.0,
            ..valid()
        };

        let fields: Vec<Field> = validate_lora_parameters_all(&raw)
            .unwrap_err()
            .iter()
            .map(ValidationError::field)
            .collect();
        assert_eq!(
            fields,
            vec![Field::Frequency, Field::CodingRate, Field::SyncWord, Field::CurrentLimit]
        );
        assert_eq!(validate_lora_parameters(&raw).unwrap_err().field(), Field::Frequency);

        assert_eq!(
            validate_lora_parameters_all(&valid()),
            Ok(LoraParameters::default())
        );
    }

    #[test]
    fn test_single_bad_field_rejects_command() {
        let cases: Vec<(RawLoraParameters, Field)> = vec![
            (RawLoraParameters { frequency: 100.0, ..valid() }, Field::Frequency),
            (RawLoraParameters { frequency: 960.5, ..valid() }, Field::Frequency),
            (RawLoraParameters { bandwidth: -0.1, ..valid() }, Field::Bandwidth),
            (RawLoraParameters { bandwidth: 510.1, ..valid() }, Field::Bandwidth),
            (RawLoraParameters { spreading_factor: 4, ..valid() }, Field::SpreadingFactor),
            (RawLoraParameters { spreading_factor: 13, ..valid() }, Field::SpreadingFactor),
            (RawLoraParameters { coding_rate: 9, ..valid() }, Field::CodingRate),
            (RawLoraParameters { sync_word: 256, ..valid() }, Field::SyncWord),
            (RawLoraParameters { sync_word: -1, ..valid() }, Field::SyncWord),
            (RawLoraParameters { power: 23, ..valid() }, Field::Power),
            (RawLoraParameters { power: -18, ..valid() }, Field::Power),
            (RawLoraParameters { preamble_length: 5, ..valid() }, Field::PreambleLength),
            (RawLoraParameters { preamble_length: 65536, ..valid() }, Field::PreambleLength),
            (RawLoraParameters { current_limit: 140.5, ..valid() }, Field::CurrentLimit),
            (RawLoraParameters { current_limit: f64::NAN, ..valid() }, Field::CurrentLimit),
        ];

        for (raw, field) in cases {
            let err = validate_lora_parameters(&raw).unwrap_err();
            assert_eq!(err.field(), field, "{:?}", raw);
        }
    }

    #[test]
    fn test_lorawan_sync_word_reserved() {
        let raw = RawLoraParameters { sync_word: 0x34, ..valid() };
        assert_eq!(
            validate_lora_parameters(&raw),
            Err(ValidationError::Reserved {
                field: Field::SyncWord,
                value: 0x34
            })
        );
    }

    #[test]
    fn test_first_failing_field_reported() {
        let raw = RawLoraParameters {
            frequency: 100.0,
            power: 40,
            ..valid()
        };
        assert_eq!(validate_lora_parameters(&raw).unwrap_err().field(), Field::Frequency);
    }

    #[test]
    fn test_set_from_text() {
        let mut raw = valid();
        raw.set_from_text(Field::Frequency, "868.1").unwrap();
        raw.set_from_text(Field::SyncWord, "0x2B").unwrap();
        raw.set_from_text(Field::Power, "-3").unwrap();
        raw.set_from_text(Field::PreambleLength, " 12 ").unwrap();

        assert_eq!(raw.frequency, 868.1);
        assert_eq!(raw.sync_word, 0x2B);
        assert_eq!(raw.power, -3);
        assert_eq!(raw.preamble_length, 12);
    }

    #[test]
    fn test_text_that_is_not_a_number() {
        let mut raw = valid();
        for (field, text) in [
            (Field::Frequency, ""),
            (Field::Frequency, "abc"),
            (Field::Bandwidth, "inf"),
            (Field::SpreadingFactor, "9.5"),
            (Field::Power, "--3"),
            (Field::Power, "-+3"),
            (Field::SyncWord, "0xZZ"),
        ] {
            assert_eq!(
                raw.set_from_text(field, text),
                Err(ValidationError::NotNumeric {
                    field,
                    raw: text.to_string()
                })
            );
        }
        assert_eq!(raw, valid());
    }

    #[test]
    fn test_unix_timestamp_bounds() {
        assert_eq!(validate_unix_timestamp(0), Ok(0));
        assert_eq!(validate_unix_timestamp(1_700_000_000), Ok(1_700_000_000));
        assert_eq!(validate_unix_timestamp(-1).unwrap_err().field(), Field::UnixTimestamp);
        assert!(validate_unix_timestamp(u32::MAX as i64 + 1).is_err());
    }

    #[test]
    fn test_message_length_bounds() {
        assert!(matches!(
            validate_message(b""),
            Err(ValidationError::BadLength { len: 0, .. })
        ));
        assert_eq!(validate_message(&[b'a'; 255]).unwrap().len(), 255);
        assert!(matches!(
            validate_message(&[b'a'; 256]),
            Err(ValidationError::BadLength { len: 256, .. })
        ));
    }

    #[test]
    fn test_mode_message_accepts_empty_message() {
        let accepted = validate_mode_message("Repeater", b"").unwrap();
        assert_eq!(accepted.mode, Mode::Repeater);
        assert!(accepted.message.is_empty());

        assert!(validate_mode_message("Normal", &[b'x'; 255]).is_ok());
        assert_eq!(
            validate_mode_message("Normal", &[b'x'; 256]).unwrap_err().field(),
            Field::Message
        );
        assert_eq!(
            validate_mode_message("Sleep", b"hi"),
            Err(ValidationError::UnknownMode("Sleep".to_string()))
        );
    }
}
