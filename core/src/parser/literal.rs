use super::{Culture, SyntaxError, SyntaxErrorKind};

const MAX_HEX_DIGITS: usize = 8;
const MAX_BIN_DIGITS: usize = 32;

/// Scans a number literal starting at `offset`.
///
/// Returns the value and the number of bytes consumed, or `Ok(None)` when
/// no literal starts there. Accepted forms: decimal with optional fraction
/// and exponent (`1`, `.5`, `2.5e-3`), `0x` hex and `0b` binary integers of
/// at most 32 bits.
pub fn scan_literal(
    text: &str,
    offset: usize,
    culture: &Culture,
) -> Result<Option<(f64, usize)>, SyntaxError> {
    let bytes = &text.as_bytes()[offset..];
    let Some(&first) = bytes.first() else {
        return Ok(None);
    };

    if first == b'0' && bytes.len() > 1 {
        match bytes[1] | 0x20 {
            b'x' => return scan_radix(text, offset, 16).map(Some),
            b'b' => return scan_radix(text, offset, 2).map(Some),
            _ => {}
        }
    }

    scan_decimal(text, offset, culture.decimal_separator())
}

fn scan_radix(text: &str, offset: usize, radix: u32) -> Result<(f64, usize), SyntaxError> {
    let bytes = &text.as_bytes()[offset..];
    let digits = bytes[2..]
        .iter()
        .take_while(|b| (**b as char).is_digit(radix))
        .count();

    // `0x` with nothing after it: the `0` is the literal, the rest is
    // scanned as an identifier.
    if digits == 0 {
        return Ok((0.0, 1));
    }

    let end = 2 + digits;
    let max_digits = if radix == 16 {
        MAX_HEX_DIGITS
    } else {
        MAX_BIN_DIGITS
    };
    if digits > max_digits {
        return Err(SyntaxError::new(
            SyntaxErrorKind::LiteralOverflow,
            offset..offset + end,
            text,
        ));
    }
    if radix == 2 && bytes.get(end).is_some_and(u8::is_ascii_digit) {
        return Err(SyntaxError::new(
            SyntaxErrorKind::MalformedLiteral,
            offset..offset + end + 1,
            text,
        ));
    }

    let value = bytes[2..end].iter().fold(0u32, |acc, b| {
        // Digits were validated above; at most 32 bits were consumed.
        let digit = (*b as char).to_digit(radix).unwrap_or(0);
        acc.wrapping_mul(radix).wrapping_add(digit)
    });
    Ok((value as f64, end))
}

fn scan_decimal(
    text: &str,
    offset: usize,
    separator: char,
) -> Result<Option<(f64, usize)>, SyntaxError> {
    let bytes = &text.as_bytes()[offset..];
    let separator = separator as u8;
    let digits_from = |start: usize| {
        bytes[start.min(bytes.len())..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let integral = digits_from(0);
    let mut end = integral;

    let mut has_fraction = false;
    if bytes.get(end) == Some(&separator) {
        let fraction = digits_from(end + 1);
        if integral > 0 || fraction > 0 {
            has_fraction = true;
            end += 1 + fraction;
        }
    }

    if end == 0 {
        return Ok(None);
    }

    if has_fraction && bytes.get(end) == Some(&separator) {
        return Err(SyntaxError::new(
            SyntaxErrorKind::MalformedLiteral,
            offset..offset + end + 1,
            text,
        ));
    }

    // The exponent only counts when digits follow; `2e` is `2` times `e`.
    if bytes.get(end).is_some_and(|b| b | 0x20 == b'e') {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let exponent_digits = digits_from(exponent);
        if exponent_digits > 0 {
            end = exponent + exponent_digits;
        }
    }

    let literal = &text[offset..offset + end];
    let parsed = if separator == b'.' {
        literal.parse::<f64>()
    } else {
        literal.replace(separator as char, ".").parse::<f64>()
    };
    match parsed {
        Ok(value) => Ok(Some((value, end))),
        Err(_) => Err(SyntaxError::new(
            SyntaxErrorKind::MalformedLiteral,
            offset..offset + end,
            text,
        )),
    }
}

#[cfg(test)]
#[path = "literal_test.rs"]
mod literal_test;
