//! Basic string converters for integral configuration values.
//!
//! Values use the `Integer.decode` grammar found in Plexus component
//! descriptors:
//!
//! ```text
//! [+|-] 0x<hex> | 0X<hex> | #<hex> | 0<octal> | <decimal>
//! ```
//!
//! Digits are ASCII only. Other Unicode decimal digits (e.g. `١٢`) are
//! rejected as invalid rather than decoded.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigurationError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Target type of a conversion. Primitive and boxed forms share one tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    Byte,
    Short,
    Int,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Byte => "byte",
            ValueType::Short => "short",
            ValueType::Int => "int",
        }
    }

    /// Inclusive value range.
    pub fn bounds(&self) -> (i64, i64) {
        match self {
            ValueType::Byte => (i8::MIN.into(), i8::MAX.into()),
            ValueType::Short => (i16::MIN.into(), i16::MAX.into()),
            ValueType::Int => (i32::MIN.into(), i32::MAX.into()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "byte" => Ok(ValueType::Byte),
            "short" => Ok(ValueType::Short),
            "int" | "integer" => Ok(ValueType::Int),
            other => Err(ConfigurationError::new(format!(
                "unknown value type '{other}' (expected byte, short or int)"
            ))),
        }
    }
}

/// A converted value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Converted {
    Byte(i8),
    Short(i16),
    Int(i32),
}

impl Converted {
    pub fn value_type(&self) -> ValueType {
        match self {
            Converted::Byte(_) => ValueType::Byte,
            Converted::Short(_) => ValueType::Short,
            Converted::Int(_) => ValueType::Int,
        }
    }

    pub fn as_i64(&self) -> i64 {
        match *self {
            Converted::Byte(v) => v.into(),
            Converted::Short(v) => v.into(),
            Converted::Int(v) => v.into(),
        }
    }
}

impl fmt::Display for Converted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Why a string is not a valid integer literal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// No digits.
    Empty,
    /// A sign after the radix prefix (e.g. `0x-1`).
    SignPosition,
    /// A character that is not a digit of the radix.
    InvalidDigit { radix: u32 },
    /// Valid literal outside the target range.
    OutOfRange,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "zero length number"),
            Self::SignPosition => write!(f, "sign character in wrong position"),
            Self::InvalidDigit { radix } => write!(f, "invalid digit for radix {radix}"),
            Self::OutOfRange => write!(f, "value out of range"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode `value` and check it lies in `min..=max`.
pub fn decode_integer(value: &str, min: i64, max: i64) -> Result<i64, DecodeError> {
    let (negative, rest) = if let Some(r) = value.strip_prefix('-') {
        (true, r)
    } else if let Some(r) = value.strip_prefix('+') {
        (false, r)
    } else {
        (false, value)
    };

    let hex = rest
        .strip_prefix("0x")
        .or_else(|| rest.strip_prefix("0X"))
        .or_else(|| rest.strip_prefix('#'));
    let (radix, digits) = if let Some(d) = hex {
        (16, d)
    } else if rest.len() > 1 && rest.starts_with('0') {
        (8, &rest[1..])
    } else {
        (10, rest)
    };

    if digits.starts_with(['-', '+']) {
        return Err(DecodeError::SignPosition);
    }
    if digits.is_empty() {
        return Err(DecodeError::Empty);
    }
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(DecodeError::InvalidDigit { radix });
    }

    // All digits valid: the only remaining failure is overflow.
    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| DecodeError::OutOfRange)?;
    let signed = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };

    if signed < i128::from(min) || signed > i128::from(max) {
        return Err(DecodeError::OutOfRange);
    }
    Ok(signed as i64)
}

// ---------------------------------------------------------------------------
// Converters
// ---------------------------------------------------------------------------

/// String-to-value converter for one [`ValueType`].
pub trait BasicConverter: Send + Sync {
    fn can_convert(&self, ty: ValueType) -> bool;

    /// # Errors
    /// [`ConfigurationError`] with message `Cannot convert '<value>' to <type>`
    /// and the [`DecodeError`] as its source.
    fn from_str(&self, value: &str) -> Result<Converted, ConfigurationError>;
}

fn decode_as(value: &str, ty: ValueType) -> Result<i64, ConfigurationError> {
    let (min, max) = ty.bounds();
    decode_integer(value, min, max).map_err(|e| {
        ConfigurationError::with_source(format!("Cannot convert '{value}' to {ty}"), e)
    })
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ByteConverter;

impl BasicConverter for ByteConverter {
    fn can_convert(&self, ty: ValueType) -> bool {
        ty == ValueType::Byte
    }

    fn from_str(&self, value: &str) -> Result<Converted, ConfigurationError> {
        decode_as(value, ValueType::Byte).map(|v| Converted::Byte(v as i8))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ShortConverter;

impl BasicConverter for ShortConverter {
    fn can_convert(&self, ty: ValueType) -> bool {
        ty == ValueType::Short
    }

    fn from_str(&self, value: &str) -> Result<Converted, ConfigurationError> {
        decode_as(value, ValueType::Short).map(|v| Converted::Short(v as i16))
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IntConverter;

impl BasicConverter for IntConverter {
    fn can_convert(&self, ty: ValueType) -> bool {
        ty == ValueType::Int
    }

    fn from_str(&self, value: &str) -> Result<Converted, ConfigurationError> {
        decode_as(value, ValueType::Int).map(|v| Converted::Int(v as i32))
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Ordered converter list; the first converter accepting a type wins.
pub struct ConverterLookup {
    converters: Vec<Box<dyn BasicConverter>>,
}

impl ConverterLookup {
    /// Lookup with no converters.
    pub fn empty() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    /// Register a converter after the existing ones.
    pub fn register<C: BasicConverter + 'static>(&mut self, converter: C) {
        self.converters.push(Box::new(converter));
    }

    pub fn lookup(&self, ty: ValueType) -> Option<&dyn BasicConverter> {
        self.converters
            .iter()
            .find(|c| c.can_convert(ty))
            .map(|c| &**c)
    }

    pub fn convert(&self, ty: ValueType, value: &str) -> Result<Converted, ConfigurationError> {
        let converter = self
            .lookup(ty)
            .ok_or_else(|| ConfigurationError::new(format!("no converter registered for {ty}")))?;
        converter.from_str(value)
    }
}

impl Default for ConverterLookup {
    /// Byte, short and int converters.
    fn default() -> Self {
        let mut lookup = Self::empty();
        lookup.register(ByteConverter);
        lookup.register(ShortConverter);
        lookup.register(IntConverter);
        lookup
    }
}

impl fmt::Debug for ConverterLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterLookup")
            .field("converters", &self.converters.len())
            .finish()
    }
}
