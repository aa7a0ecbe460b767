//! Product code enumeration.
//!
//! Product codes are 3 or 4 characters over a 34-symbol alphabet (digits and
//! uppercase letters without `I` and `O`), read as base-34 numerals.
//!
//! The ordinal space is laid out as:
//!
//! - `000`..`ZZZ` → `0`..`34³ - 1`
//! - `1000`..`ZZZZ` → `34³`..`34⁴ - 1`
//! - `0000`..`0ZZZ` → `34⁴`..`34⁴ + 34³ - 1`
//!
//! A leading `0` on a 4-character code stands for a fifth digit `1`, so the
//! zero-prefixed block continues the sequence instead of aliasing `000`..`ZZZ`.

/// Digit symbols, indexed by value.
pub const ALPHABET: [u8; 34] = *b"0123456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Numeral radix.
pub const RADIX: u32 = ALPHABET.len() as u32;

const WRAP: u32 = RADIX.pow(4);

/// Largest encodable ordinal (`0ZZZ`).
pub const MAX_ORDINAL: u32 = WRAP + RADIX.pow(3) - 1;

const INVALID: u8 = u8::MAX;

/// Reverse lookup from ASCII byte to digit value.
const DIGITS: [u8; 128] = {
    let mut table = [INVALID; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

/// Product code validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("invalid length {0}, expected 3 or 4 characters")]
    InvalidLength(usize),

    #[error("invalid character {0:?}")]
    InvalidCharacter(char),

    #[error("ordinal {0} is beyond the last product code")]
    OutOfRange(u32),
}

fn digit(c: char) -> Option<u32> {
    let value = *DIGITS.get(c as usize)?;
    (value != INVALID).then_some(value as u32)
}

/// Check that `id` is a well-formed product code.
pub fn validate(id: &str) -> Result<(), IdError> {
    let len = id.chars().count();
    if !(3..=4).contains(&len) {
        return Err(IdError::InvalidLength(len));
    }
    match id.chars().find(|c| digit(*c).is_none()) {
        Some(c) => Err(IdError::InvalidCharacter(c)),
        None => Ok(()),
    }
}

/// Convert a product code to its ordinal.
pub fn decode(id: &str) -> Result<u32, IdError> {
    validate(id)?;

    let mut num = id.chars().filter_map(digit).fold(0, |acc, d| acc * RADIX + d);
    if id.len() == 4 && id.starts_with('0') {
        num += WRAP;
    }
    Ok(num)
}

/// Convert an ordinal back to its canonical product code.
pub fn encode(ordinal: u32) -> Result<String, IdError> {
    if ordinal > MAX_ORDINAL {
        return Err(IdError::OutOfRange(ordinal));
    }

    let (mut num, width) = if ordinal >= WRAP { (ordinal - WRAP, 4) } else { (ordinal, 3) };

    let mut digits = Vec::with_capacity(width);
    while num > 0 {
        digits.push(ALPHABET[(num % RADIX) as usize]);
        num /= RADIX;
    }
    digits.resize(digits.len().max(width), b'0');
    digits.reverse();

    Ok(digits.into_iter().map(char::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alphabet_excludes_ambiguous_letters() {
        assert_eq!(ALPHABET.len(), 34);
        assert!(!ALPHABET.contains(&b'I'));
        assert!(!ALPHABET.contains(&b'O'));
    }

    #[test]
    fn test_decode_known_values() {
        assert_eq!(decode("000").unwrap(), 0);
        assert_eq!(decode("001").unwrap(), 1);
        assert_eq!(decode("00Z").unwrap(), 33);
        assert_eq!(decode("010").unwrap(), 34);
        assert_eq!(decode("ZZZ").unwrap(), RADIX.pow(3) - 1);
        assert_eq!(decode("1000").unwrap(), RADIX.pow(3));
        assert_eq!(decode("ZZZZ").unwrap(), RADIX.pow(4) - 1);
        assert_eq!(decode("0000").unwrap(), RADIX.pow(4));
        assert_eq!(decode("0ZZZ").unwrap(), MAX_ORDINAL);
    }

    #[test]
    fn test_encode_padding() {
        assert_eq!(encode(0).unwrap(), "000");
        assert_eq!(encode(34).unwrap(), "010");
        assert_eq!(encode(RADIX.pow(3)).unwrap(), "1000");
        assert_eq!(encode(RADIX.pow(4)).unwrap(), "0000");
        assert_eq!(encode(RADIX.pow(4) + 1).unwrap(), "0001");
        assert_eq!(encode(MAX_ORDINAL).unwrap(), "0ZZZ");
    }

    #[test]
    fn test_encode_out_of_range() {
        assert_eq!(encode(MAX_ORDINAL + 1), Err(IdError::OutOfRange(MAX_ORDINAL + 1)));
    }

    #[test]
    fn test_sequence_continues_past_three_characters() {
        let last_short = decode("ZZZ").unwrap();
        assert_eq!(encode(last_short + 1).unwrap(), "1000");

        let last_long = decode("ZZZZ").unwrap();
        assert_eq!(encode(last_long + 1).unwrap(), "0000");
    }

    #[test]
    fn test_round_trip_all_ordinals() {
        for n in 0..=MAX_ORDINAL {
            let id = encode(n).unwrap();
            assert_eq!(decode(&id).unwrap(), n, "ordinal {n} encoded as {id}");
        }
    }

    #[test]
    fn test_round_trip_all_three_character_codes() {
        for a in ALPHABET {
            for b in ALPHABET {
                for c in ALPHABET {
                    let id = String::from_utf8(vec![a, b, c]).unwrap();
                    assert_eq!(encode(decode(&id).unwrap()).unwrap(), id);
                }
            }
        }
    }

    #[test]
    fn test_validate_length() {
        assert_eq!(validate("00"), Err(IdError::InvalidLength(2)));
        assert_eq!(validate("00000"), Err(IdError::InvalidLength(5)));
        assert_eq!(validate(""), Err(IdError::InvalidLength(0)));
    }

    #[test]
    fn test_validate_characters() {
        assert_eq!(validate("0I0"), Err(IdError::InvalidCharacter('I')));
        assert_eq!(validate("abc"), Err(IdError::InvalidCharacter('a')));
        assert_eq!(validate("J6FÖ"), Err(IdError::InvalidCharacter('Ö')));
        assert!(validate("J094").is_ok());
        assert!(validate("01P").is_ok());
    }

    #[test]
    fn test_decode_rejects_invalid() {
        assert!(decode("O00").is_err());
        assert!(decode("12").is_err());
    }
}
