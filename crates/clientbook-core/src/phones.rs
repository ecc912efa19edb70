// Normalization of the phone-number shapes callers hand us (one number, a
// list, or "89148479011, 89140097011") into a plain list of integers.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RegistryError;

/// An ordered list of phone numbers to attach to a new client.
///
/// The values are not range-checked here; `number > 1` is the store's job and
/// surfaces as a constraint violation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhoneList(Vec<i64>);

impl PhoneList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl From<i64> for PhoneList {
    fn from(number: i64) -> Self {
        Self(vec![number])
    }
}

impl From<Vec<i64>> for PhoneList {
    fn from(numbers: Vec<i64>) -> Self {
        Self(numbers)
    }
}

impl From<&[i64]> for PhoneList {
    fn from(numbers: &[i64]) -> Self {
        Self(numbers.to_vec())
    }
}

impl<const N: usize> From<[i64; N]> for PhoneList {
    fn from(numbers: [i64; N]) -> Self {
        Self(numbers.to_vec())
    }
}

impl Extend<i64> for PhoneList {
    fn extend<I: IntoIterator<Item = i64>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for PhoneList {
    type Item = i64;
    type IntoIter = std::vec::IntoIter<i64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<i64> for PhoneList {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parses a comma-separated list. Whitespace around each piece is ignored;
/// an empty or blank string yields an empty list.
impl FromStr for PhoneList {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(Self::new());
        }
        s.split(',').map(parse_phone).collect()
    }
}

impl fmt::Display for PhoneList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, number) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{number}")?;
        }
        Ok(())
    }
}

/// Parse a single phone number, tolerating surrounding whitespace.
pub fn parse_phone(input: &str) -> Result<i64, RegistryError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::InvalidPhone {
            input: input.to_string(),
            message: "empty entry".into(),
        });
    }
    trimmed.parse::<i64>().map_err(|e| RegistryError::InvalidPhone {
        input: input.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_number_becomes_one_entry() {
        let number: i64 = 89245618793;
        let list = PhoneList::from(number);
        assert_eq!(list.as_slice(), &[89245618793]);
    }

    #[test]
    fn comma_separated_text_is_split_and_parsed() {
        let list: PhoneList = "89148479011, 89140097011".parse().unwrap();
        assert_eq!(list.as_slice(), &[89148479011, 89140097011]);
    }

    #[test]
    fn separator_spacing_does_not_matter() {
        let list: PhoneList = " 2,3 ,  4".parse().unwrap();
        assert_eq!(list.as_slice(), &[2, 3, 4]);
    }

    #[test]
    fn single_number_as_text() {
        let list: PhoneList = "79245566777".parse().unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn blank_text_is_empty_list() {
        let list: PhoneList = "   ".parse().unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn non_numeric_piece_is_rejected() {
        let err = "89148479011, call me".parse::<PhoneList>().unwrap_err();
        assert!(matches!(err, RegistryError::InvalidPhone { ref input, .. } if input == " call me"));
    }

    #[test]
    fn trailing_comma_is_rejected() {
        let err = "89148479011,".parse::<PhoneList>().unwrap_err();
        assert!(err.to_string().contains("empty entry"));
    }

    #[test]
    fn display_joins_with_comma_space() {
        let list: PhoneList = [89148479011, 89140097011].into_iter().collect();
        assert_eq!(list.to_string(), "89148479011, 89140097011");
    }
}
