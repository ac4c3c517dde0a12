//! Decoding of Go literal text into values.

/// Parse an integer literal (`42`, `0x2A`, `0o52`, `052`, `0b101010`, `1_000`).
///
/// Returns `None` for malformed text or values beyond `i128`.
pub fn parse_int(text: &str) -> Option<i128> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let (digits, radix) = match cleaned.get(..2) {
        Some("0x") | Some("0X") => (&cleaned[2..], 16),
        Some("0b") | Some("0B") => (&cleaned[2..], 2),
        Some("0o") | Some("0O") => (&cleaned[2..], 8),
        _ if cleaned.len() > 1 && cleaned.starts_with('0') => (&cleaned[1..], 8),
        _ => (cleaned.as_str(), 10),
    };
    if digits.is_empty() {
        return None;
    }
    i128::from_str_radix(digits, radix).ok()
}

/// Parse a floating-point literal, decimal (`1.5e3`) or hexadecimal
/// (`0x1.8p+1`).
pub fn parse_float(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    match cleaned.strip_prefix("0x").or_else(|| cleaned.strip_prefix("0X")) {
        Some(hex) => parse_hex_float(hex),
        None => cleaned.parse().ok(),
    }
}

/// Hex mantissa scaled by a binary exponent; `text` follows the `0x`.
fn parse_hex_float(text: &str) -> Option<f64> {
    let (mantissa, exp) = text.split_once(|c| c == 'p' || c == 'P')?;
    let exp: i32 = exp.parse().ok()?;
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let mut value = 0f64;
    for c in int_part.chars().chain(frac_part.chars()) {
        value = value * 16.0 + c.to_digit(16)? as f64;
    }
    let scale = exp.checked_sub(4 * i32::try_from(frac_part.len()).ok()?)?;
    Some(value * 2f64.powi(scale))
}

/// Imaginary part of an imaginary literal (`2i`, `1.5e3i`, `0x10i`).
///
/// Decimal digits with a leading zero are decimal here, unlike integers.
pub fn parse_imag(text: &str) -> Option<f64> {
    let body = text.strip_suffix('i')?;
    parse_float(body).or_else(|| parse_int(body).map(|v| v as f64))
}

/// Decode a rune literal including its quotes, `'a'` or `'\n'`.
pub fn unquote_rune(text: &str) -> Option<u32> {
    let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let value = match chars.next()? {
        '\\' => decode_escape(&mut chars, '\'')?,
        c => c as u32,
    };
    if chars.next().is_some() {
        return None;
    }
    Some(value)
}

/// Decode an interpreted (`"..."`) or raw (`` `...` ``) string literal.
pub fn unquote_string(text: &str) -> Option<String> {
    if let Some(raw) = text.strip_prefix('`').and_then(|t| t.strip_suffix('`')) {
        return Some(raw.replace('\r', ""));
    }
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(char::from_u32(decode_escape(&mut chars, '"')?)?);
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Decode the escape sequence following a backslash.
fn decode_escape(chars: &mut std::str::Chars<'_>, quote: char) -> Option<u32> {
    let c = chars.next()?;
    let simple = match c {
        'a' => Some(0x07),
        'b' => Some(0x08),
        'f' => Some(0x0C),
        'n' => Some(0x0A),
        'r' => Some(0x0D),
        't' => Some(0x09),
        'v' => Some(0x0B),
        '\\' => Some(0x5C),
        _ if c == quote => Some(c as u32),
        _ => None,
    };
    if simple.is_some() {
        return simple;
    }

    let (count, radix) = match c {
        'x' => (2, 16),
        'u' => (4, 16),
        'U' => (8, 16),
        '0'..='7' => (2, 8),
        _ => return None,
    };
    let mut digits = String::with_capacity(count + 1);
    if radix == 8 {
        digits.push(c);
    }
    for _ in 0..count {
        digits.push(chars.next()?);
    }
    u32::from_str_radix(&digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_radixes() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_int("0x2A"), Some(42));
        assert_eq!(parse_int("0o52"), Some(42));
        assert_eq!(parse_int("052"), Some(42));
        assert_eq!(parse_int("0b101010"), Some(42));
        assert_eq!(parse_int("1_000_000"), Some(1_000_000));
        assert_eq!(parse_int("0xFFFFFFFFFFFFFFFF"), Some(u64::MAX as i128));
    }

    #[test]
    fn test_parse_int_rejects_malformed() {
        assert_eq!(parse_int("0x"), None);
        assert_eq!(parse_int("09"), None);
    }

    #[test]
    fn test_parse_float_forms() {
        assert_eq!(parse_float("1.5"), Some(1.5));
        assert_eq!(parse_float("1_000.25e1"), Some(10002.5));
        assert_eq!(parse_float("0x1p-2"), Some(0.25));
        assert_eq!(parse_float("0X1.8P+1"), Some(3.0));
        assert_eq!(parse_float("0x.8p1"), Some(1.0));
        assert_eq!(parse_float("0x1p1023"), Some(2f64.powi(1023)));
        assert_eq!(parse_float("0xp1"), None);
    }

    #[test]
    fn test_parse_imag() {
        assert_eq!(parse_imag("2i"), Some(2.0));
        assert_eq!(parse_imag("0123i"), Some(123.0));
        assert_eq!(parse_imag("1.5e1i"), Some(15.0));
        assert_eq!(parse_imag("0x10i"), Some(16.0));
        assert_eq!(parse_imag("0x1p-2i"), Some(0.25));
        assert_eq!(parse_imag("2"), None);
    }

    #[test]
    fn test_unquote_rune() {
        assert_eq!(unquote_rune("'a'"), Some('a' as u32));
        assert_eq!(unquote_rune(r"'\n'"), Some(10));
        assert_eq!(unquote_rune(r"'\''"), Some('\'' as u32));
        assert_eq!(unquote_rune(r"'\x41'"), Some(0x41));
        assert_eq!(unquote_rune(r"'é'"), Some(0xE9));
        assert_eq!(unquote_rune(r"'\101'"), Some(65));
        assert_eq!(unquote_rune("'ab'"), None);
    }

    #[test]
    fn test_unquote_string() {
        assert_eq!(unquote_string(r#""a\tb""#).as_deref(), Some("a\tb"));
        assert_eq!(unquote_string(r#""say \"hi\"""#).as_deref(), Some("say \"hi\""));
        assert_eq!(unquote_string("`raw\\n`").as_deref(), Some("raw\\n"));
    }
}
