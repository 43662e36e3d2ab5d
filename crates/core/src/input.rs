use crate::error::InputError;

/// The full study material for one request, already extracted to text.
///
/// Construction enforces the only two invariants: non-empty after trimming
/// and at most `max_chars` characters long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    text: String,
}

impl RawInput {
    pub fn new(text: impl Into<String>, max_chars: usize) -> Result<Self, InputError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(InputError::Empty);
        }
        // Byte length bounds char count from above, so most inputs skip the scan.
        if text.len() > max_chars {
            let len = text.chars().count();
            if len > max_chars {
                return Err(InputError::TooLong { len, max: max_chars });
            }
        }
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank() {
        assert_eq!(RawInput::new("", 10), Err(InputError::Empty));
        assert_eq!(RawInput::new(" \n\t ", 10), Err(InputError::Empty));
    }

    #[test]
    fn rejects_over_length() {
        assert_eq!(
            RawInput::new("abcdef", 5),
            Err(InputError::TooLong { len: 6, max: 5 })
        );
    }

    #[test]
    fn counts_chars_not_bytes() {
        // 5 chars, 10 bytes
        let input = RawInput::new("ééééé", 5).unwrap();
        assert_eq!(input.as_str(), "ééééé");
    }

    #[test]
    fn keeps_text_verbatim() {
        let input = RawInput::new("  notes \n", 100).unwrap();
        assert_eq!(input.as_str(), "  notes \n");
    }
}
