//! AT line tokenizer

use super::error::DispatchError;

/// Command prefix every line must carry
pub const AT_PREFIX: &str = "AT+";

/// One tokenized AT line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    /// Full command name including the `AT+` prefix, e.g. `AT+SETSF`
    pub name: &'a str,
    /// Text after the first `=`, if the line has one
    pub arg: Option<&'a str>,
}

/// Split a line into command name and optional argument.
///
/// Surrounding whitespace (including the `\r` of a CR LF terminal) is dropped.
/// The split happens once, on the first `=`; the argument is passed on as-is.
pub fn parse_line(line: &str) -> Result<ParsedLine<'_>, DispatchError> {
    let line = line.trim();
    if !line.starts_with(AT_PREFIX) {
        return Err(DispatchError::InvalidCommand);
    }
    let (name, arg) = match line.split_once('=') {
        Some((name, arg)) => (name, Some(arg)),
        None => (line, None),
    };
    Ok(ParsedLine { name, arg })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_prefix() {
        let parsed = parse_line("AT+").unwrap();
        assert_eq!(parsed.name, "AT+");
        assert_eq!(parsed.arg, None);
    }

    #[test]
    fn test_assignment() {
        let parsed = parse_line("AT+SETRF=865000000\r").unwrap();
        assert_eq!(parsed.name, "AT+SETRF");
        assert_eq!(parsed.arg, Some("865000000"));
    }

    #[test]
    fn test_empty_argument_kept() {
        assert_eq!(parse_line("AT+SETSF=").unwrap().arg, Some(""));
    }

    #[test]
    fn test_split_on_first_equals_only() {
        assert_eq!(parse_line("AT+SETSF=7=8").unwrap().arg, Some("7=8"));
    }

    #[test]
    fn test_missing_prefix() {
        assert_eq!(parse_line("SETSF=7"), Err(DispatchError::InvalidCommand));
        assert_eq!(parse_line(""), Err(DispatchError::InvalidCommand));
        assert_eq!(parse_line("at+status"), Err(DispatchError::InvalidCommand));
    }
}
