//! Pre-execution check on user input, run before a message reaches the agent
//! when the database tools are enabled.
//!
//! This is a substring denylist, not a SQL parser. It has known false
//! negatives (obfuscated payloads) and known false positives (the English
//! word "update"), and is a best-effort filter rather than a security
//! boundary. The database tools are read-only regardless.

/// Tokens that trip the guardrail, matched case-insensitively as substrings.
pub const SQL_DENYLIST: &[&str] = &[
    "DROP",
    "DELETE",
    "UPDATE",
    "INSERT",
    "ALTER",
    "TRUNCATE",
    "--",
    "/*",
    "*/",
    "@@",
    "SLEEP(",
    "BENCHMARK(",
];

#[derive(Debug, Clone, PartialEq)]
pub struct GuardrailOutput {
    pub tripped: bool,
    /// The first denylisted token found, if any.
    pub matched: Option<&'static str>,
}

impl GuardrailOutput {
    fn safe() -> Self {
        Self {
            tripped: false,
            matched: None,
        }
    }

    fn tripped_on(token: &'static str) -> Self {
        Self {
            tripped: true,
            matched: Some(token),
        }
    }
}

/// Scan `input` for denylisted SQL tokens.
pub fn check_sql_injection(input: &str) -> GuardrailOutput {
    let upper = input.to_uppercase();
    for token in SQL_DENYLIST {
        if upper.contains(token) {
            return GuardrailOutput::tripped_on(token);
        }
    }
    GuardrailOutput::safe()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_input_passes() {
        let output = check_sql_injection("show me the five newest customers");
        assert!(!output.tripped);
        assert_eq!(output.matched, None);
    }

    #[test]
    fn test_drop_table_trips_any_case() {
        for input in ["DROP TABLE users", "drop table users", "DrOp TaBlE users"] {
            let output = check_sql_injection(input);
            assert!(output.tripped, "expected trip for {input:?}");
            assert_eq!(output.matched, Some("DROP"));
        }
    }

    #[test]
    fn test_english_update_trips_as_documented() {
        // Substring matching means the plain English word trips too. That is
        // a documented false positive, not a bug.
        let output = check_sql_injection("any update on the delivery?");
        assert!(output.tripped);
        assert_eq!(output.matched, Some("UPDATE"));
    }

    #[test]
    fn test_comment_markers_trip() {
        assert!(check_sql_injection("1 -- comment").tripped);
        assert!(check_sql_injection("/* hidden */").tripped);
    }

    #[test]
    fn test_timing_functions_trip() {
        assert!(check_sql_injection("select sleep(10)").tripped);
        assert!(check_sql_injection("BENCHMARK(100000, md5('x'))").tripped);
    }
}
