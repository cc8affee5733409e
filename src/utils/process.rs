//! Helpers for reporting external tool failures

/// Number of stderr lines kept in error messages
const TAIL_LINES: usize = 5;

/// Last few non-empty lines of a tool's stderr, joined with " | "
pub fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(TAIL_LINES);
    lines[start..].join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_keeps_last_lines() {
        let log = "a\nb\n\nc\nd\ne\nf\ng\n";
        assert_eq!(stderr_tail(log), "c | d | e | f | g");
        assert_eq!(stderr_tail(""), "");
    }
}
