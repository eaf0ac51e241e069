//! Conversion of captured phrase text into typed argument values.
//!
//! The built-in table maps a parameter's [`TypeId`] to a converter and a zero
//! value. Integers accept the same literal forms as source code: an optional
//! sign, a `0x`/`0o`/`0b` prefix or a leading `0` for octal, and `_` digit
//! separators. Floats, `bool`, `char` and `String` use their own parsers.

use std::any::{Any, TypeId, type_name};
use std::sync::LazyLock;

use hashbrown::HashMap;
use thiserror::Error;

use crate::param::Param;
use crate::value::{ParseFn, TypeTag, Value, ZeroFn};

/// Failure to convert captured text to a parameter's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CoercionError {
    /// The text is not a valid literal of the target type.
    #[error("cannot parse `{raw}` as {ty}")]
    Invalid {
        /// Captured text.
        raw: String,
        /// Target type name.
        ty: &'static str,
    },
    /// The text is a valid integer that does not fit the target type.
    #[error("`{raw}` is out of range for {ty}")]
    OutOfRange {
        /// Captured text.
        raw: String,
        /// Target type name.
        ty: &'static str,
    },
    /// Captured text cannot be converted to the target type at all.
    #[error("no conversion from captured text to {ty}")]
    Unsupported {
        /// Target type name.
        ty: &'static str,
    },
}

struct Conversion {
    parse: ParseFn,
    zero: ZeroFn,
}

macro_rules! conversions {
    ($convert:ident: $($ty:ty),* $(,)?) => {
        [$((
            TypeId::of::<$ty>(),
            Conversion {
                parse: $convert::<$ty>,
                zero: zero::<$ty>,
            },
        )),*]
    };
}

static CONVERSIONS: LazyLock<HashMap<TypeId, Conversion>> = LazyLock::new(|| {
    let mut table = HashMap::new();
    table.extend(conversions!(
        convert_int: i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize
    ));
    table.extend(conversions!(convert_from_str: f32, f64, char));
    table.extend(conversions!(convert_bool: bool));
    table.extend(conversions!(convert_string: String));
    table
});

fn zero<T: Any + Default>() -> Value {
    Value::new(T::default())
}

fn convert_int<T>(raw: &str) -> Result<Value, CoercionError>
where
    T: Any + TryFrom<i128>,
{
    let wide = parse_int(raw).ok_or_else(|| CoercionError::Invalid {
        raw: raw.to_string(),
        ty: type_name::<T>(),
    })?;
    T::try_from(wide)
        .map(Value::new)
        .map_err(|_| CoercionError::OutOfRange {
            raw: raw.to_string(),
            ty: type_name::<T>(),
        })
}

fn convert_from_str<T>(raw: &str) -> Result<Value, CoercionError>
where
    T: Any + std::str::FromStr,
{
    raw.parse::<T>()
        .map(Value::new)
        .map_err(|_| CoercionError::Invalid {
            raw: raw.to_string(),
            ty: type_name::<T>(),
        })
}

fn convert_bool<T>(raw: &str) -> Result<Value, CoercionError>
where
    T: Any + From<bool>,
{
    let flag = match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => true,
        "0" | "f" | "F" | "false" | "FALSE" | "False" => false,
        _ => {
            return Err(CoercionError::Invalid {
                raw: raw.to_string(),
                ty: type_name::<T>(),
            });
        }
    };
    Ok(Value::new(T::from(flag)))
}

fn convert_string<T>(raw: &str) -> Result<Value, CoercionError>
where
    T: Any + for<'a> From<&'a str>,
{
    Ok(Value::new(T::from(raw)))
}

/// Parse an integer literal with its radix taken from the prefix.
///
/// Returns `None` for anything that is not a well-formed literal, including a
/// magnitude beyond `i128`.
fn parse_int(raw: &str) -> Option<i128> {
    let (negative, unsigned) = raw.strip_prefix('-').map_or_else(
        || (false, raw.strip_prefix('+').unwrap_or(raw)),
        |rest| (true, rest),
    );
    let (radix, digits, prefixed) = split_radix(unsigned);
    let cleaned = strip_separators(digits, prefixed)?;
    if cleaned.is_empty() || cleaned.starts_with(['+', '-']) {
        return None;
    }
    let magnitude = u128::from_str_radix(&cleaned, radix).ok()?;
    if negative {
        0_i128.checked_sub_unsigned(magnitude)
    } else {
        i128::try_from(magnitude).ok()
    }
}

fn split_radix(text: &str) -> (u32, &str, bool) {
    const PREFIXES: [(&str, u32); 6] = [
        ("0x", 16),
        ("0X", 16),
        ("0b", 2),
        ("0B", 2),
        ("0o", 8),
        ("0O", 8),
    ];
    for (prefix, radix) in PREFIXES {
        if let Some(rest) = text.strip_prefix(prefix) {
            return (radix, rest, true);
        }
    }
    match text.strip_prefix('0') {
        Some(rest) if !rest.is_empty() => (8, rest, true),
        _ => (10, text, false),
    }
}

/// Remove `_` separators, rejecting doubled or trailing ones and a leading
/// one that does not follow a radix prefix.
fn strip_separators(digits: &str, prefixed: bool) -> Option<String> {
    if !digits.contains('_') {
        return Some(digits.to_string());
    }
    let misplaced = digits.ends_with('_')
        || digits.contains("__")
        || (digits.starts_with('_') && !prefixed);
    (!misplaced).then(|| digits.replace('_', ""))
}

pub(crate) fn builtin_zero(id: TypeId) -> Option<ZeroFn> {
    CONVERSIONS.get(&id).map(|conversion| conversion.zero)
}

/// Convert a captured [`Param`] to the type described by `tag`.
///
/// A parse hook on the tag takes precedence over the built-in table.
///
/// # Errors
///
/// Returns [`CoercionError`] when the text is not a valid literal of the
/// target type, does not fit it, or the type has no conversion at all.
///
/// # Examples
///
/// ```
/// use stepwise::{Param, TypeTag, coerce};
///
/// let value = coerce(&Param::new("0x1F"), &TypeTag::of::<u8>()).expect("hex literal");
/// assert_eq!(value.get::<u8>(), Some(31));
/// assert!(coerce(&Param::new("256"), &TypeTag::of::<u8>()).is_err());
/// ```
pub fn coerce(param: &Param, tag: &TypeTag) -> Result<Value, CoercionError> {
    let parse = tag
        .parse_hook()
        .or_else(|| CONVERSIONS.get(&tag.id()).map(|conversion| conversion.parse))
        .ok_or(CoercionError::Unsupported { ty: tag.name() })?;
    parse(param.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn coerced<T: Any + Clone>(raw: &str) -> Result<T, CoercionError> {
        coerce(&Param::new(raw), &TypeTag::of::<T>()).map(|value| {
            value
                .get::<T>()
                .unwrap_or_else(|| panic!("coerced value should be a {}", type_name::<T>()))
        })
    }

    #[rstest]
    #[case("42", 42)]
    #[case("-42", -42)]
    #[case("+7", 7)]
    #[case("0x1f", 31)]
    #[case("0X1F", 31)]
    #[case("0b101", 5)]
    #[case("0o17", 15)]
    #[case("017", 15)]
    #[case("0", 0)]
    #[case("1_000", 1000)]
    #[case("0x_ff", 255)]
    #[case("-0x10", -16)]
    fn parses_integer_literals(#[case] raw: &str, #[case] expected: i64) {
        assert_eq!(coerced::<i64>(raw), Ok(expected));
    }

    #[rstest]
    #[case("")]
    #[case("-")]
    #[case("0x")]
    #[case("12a")]
    #[case("--1")]
    #[case("+-1")]
    #[case("1__0")]
    #[case("10_")]
    #[case("_10")]
    #[case("09")]
    #[case(" 1")]
    fn rejects_malformed_integers(#[case] raw: &str) {
        assert_eq!(
            coerced::<i64>(raw),
            Err(CoercionError::Invalid {
                raw: raw.to_string(),
                ty: "i64",
            })
        );
    }

    #[test]
    fn reports_out_of_range_integers() {
        assert_eq!(
            coerced::<i8>("128"),
            Err(CoercionError::OutOfRange {
                raw: "128".into(),
                ty: "i8",
            })
        );
        assert_eq!(coerced::<i8>("-128"), Ok(i8::MIN));
        assert!(matches!(
            coerced::<u32>("-1"),
            Err(CoercionError::OutOfRange { .. })
        ));
    }

    #[test]
    fn parses_extreme_wide_integers() {
        assert_eq!(
            coerced::<i128>("-170141183460469231731687303715884105728"),
            Ok(i128::MIN)
        );
        assert!(coerced::<i128>("170141183460469231731687303715884105728").is_err());
    }

    #[rstest]
    #[case("1.5", 1.5)]
    #[case("-2", -2.0)]
    #[case("1e3", 1000.0)]
    fn parses_floats(#[case] raw: &str, #[case] expected: f64) {
        assert_eq!(coerced::<f64>(raw), Ok(expected));
    }

    #[test]
    fn strings_pass_through_verbatim() {
        assert_eq!(coerced::<String>(" Batman "), Ok(" Batman ".to_string()));
    }

    #[rstest]
    #[case("true", true)]
    #[case("T", true)]
    #[case("1", true)]
    #[case("False", false)]
    #[case("0", false)]
    fn parses_booleans(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(coerced::<bool>(raw), Ok(expected));
    }

    #[test]
    fn parses_single_chars() {
        assert_eq!(coerced::<char>("x"), Ok('x'));
        assert!(coerced::<char>("xy").is_err());
    }

    #[test]
    fn unknown_types_are_unsupported() {
        let Err(err) = coerced::<std::net::Ipv4Addr>("127.0.0.1") else {
            panic!("Ipv4Addr has no built-in conversion");
        };
        assert!(matches!(err, CoercionError::Unsupported { .. }));
    }

    #[test]
    fn tag_hook_overrides_table() {
        fn shout(raw: &str) -> Result<Value, CoercionError> {
            Ok(Value::new(raw.to_uppercase()))
        }
        let hooked = TypeTag::of::<String>().with_parser(shout);
        let value = coerce(&Param::new("quiet"), &hooked)
            .unwrap_or_else(|err| panic!("hooked conversion should succeed: {err}"));
        assert_eq!(value.get::<String>().as_deref(), Some("QUIET"));
    }
}
