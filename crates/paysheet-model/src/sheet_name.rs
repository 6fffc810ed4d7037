/// Excel-compatible maximum sheet name length, in characters.
pub const EXCEL_MAX_SHEET_NAME_LEN: usize = 31;

/// Characters Excel rejects in sheet names. `'` is additionally rejected
/// because it delimits quoted sheet names inside formulas.
pub const SHEET_NAME_ILLEGAL_CHARS: [char; 8] = ['/', '\\', '?', '*', '[', ']', ':', '\''];

/// Errors raised when validating a sheet name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SheetNameError {
    #[error("sheet name cannot be empty")]
    Empty,
    #[error("sheet name exceeds {EXCEL_MAX_SHEET_NAME_LEN} characters")]
    TooLong,
    #[error("sheet name contains illegal character '{0}'")]
    IllegalChar(char),
}

/// Validate a sheet name against Excel's rules.
pub fn validate_sheet_name(name: &str) -> Result<(), SheetNameError> {
    if name.trim().is_empty() {
        return Err(SheetNameError::Empty);
    }
    if name.chars().count() > EXCEL_MAX_SHEET_NAME_LEN {
        return Err(SheetNameError::TooLong);
    }
    if let Some(bad) = name.chars().find(|c| SHEET_NAME_ILLEGAL_CHARS.contains(c)) {
        return Err(SheetNameError::IllegalChar(bad));
    }
    Ok(())
}

/// Transform arbitrary display text (e.g. an employee name) into a legal
/// sheet name: illegal characters become `-` and the result is truncated to
/// [`EXCEL_MAX_SHEET_NAME_LEN`] characters.
///
/// Truncation counts characters, not bytes, so multi-byte names are cut on a
/// char boundary. An empty input sanitizes to `-`.
pub fn sanitize_sheet_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if SHEET_NAME_ILLEGAL_CHARS.contains(&c) {
                '-'
            } else {
                c
            }
        })
        .take(EXCEL_MAX_SHEET_NAME_LEN)
        .collect();
    if out.trim().is_empty() {
        out = "-".to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_chars_become_dashes() {
        assert_eq!(sanitize_sheet_name("A/B"), "A-B");
        assert_eq!(sanitize_sheet_name("a[1]:b'c"), "a-1--b-c");
    }

    #[test]
    fn long_names_truncate_to_31_chars() {
        let long = "x".repeat(40);
        let sanitized = sanitize_sheet_name(&long);
        assert_eq!(sanitized.chars().count(), EXCEL_MAX_SHEET_NAME_LEN);
        assert!(validate_sheet_name(&sanitized).is_ok());
    }

    #[test]
    fn truncation_is_char_aware() {
        let name = "张".repeat(40);
        let sanitized = sanitize_sheet_name(&name);
        assert_eq!(sanitized.chars().count(), EXCEL_MAX_SHEET_NAME_LEN);
    }

    #[test]
    fn validation_rejects_bad_names() {
        assert_eq!(validate_sheet_name(""), Err(SheetNameError::Empty));
        assert_eq!(validate_sheet_name("  "), Err(SheetNameError::Empty));
        assert_eq!(
            validate_sheet_name("a/b"),
            Err(SheetNameError::IllegalChar('/'))
        );
        assert_eq!(
            validate_sheet_name(&"x".repeat(32)),
            Err(SheetNameError::TooLong)
        );
        assert!(validate_sheet_name("三月 工资").is_ok());
    }
}
