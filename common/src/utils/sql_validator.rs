//! SQL statement validator.
//!
//! The agent may only read. Every statement it produces goes through this
//! guard before it touches the database.

use crate::errors::{AppError, AppResult};

/// Validates SQL statements for security.
pub struct SqlValidator;

/// Keywords that mutate data or schema. Matched on word boundaries so
/// column names like `created_at` do not trip the guard.
const FORBIDDEN_KEYWORDS: [&str; 12] = [
    "INSERT", "UPDATE", "DELETE", "DROP", "ALTER", "TRUNCATE", "CREATE", "GRANT", "REVOKE",
    "VACUUM", "COPY", "MERGE",
];

impl SqlValidator {
    /// Checks that `sql` is a single read-only statement.
    ///
    /// # Errors
    /// Returns `AppError::UnsafeSql` if the statement is empty, contains
    /// multiple statements, does not start with SELECT/WITH, or contains a
    /// forbidden keyword.
    pub fn ensure_read_only(sql: &str) -> AppResult<()> {
        let trimmed = sql.trim().trim_end_matches(';').trim_end();
        if trimmed.is_empty() {
            return Err(AppError::UnsafeSql("empty statement".into()));
        }
        if trimmed.contains(';') {
            return Err(AppError::UnsafeSql(
                "multiple statements are not allowed".into(),
            ));
        }

        let upper = trimmed.to_uppercase();
        if !(upper.starts_with("SELECT") || upper.starts_with("WITH")) {
            return Err(AppError::UnsafeSql(
                "only SELECT statements are allowed".into(),
            ));
        }
        for keyword in FORBIDDEN_KEYWORDS {
            if contains_word(&upper, keyword) {
                return Err(AppError::UnsafeSql(format!(
                    "forbidden operation: {}",
                    keyword
                )));
            }
        }
        Ok(())
    }

    /// Checks that a table name is a plain identifier, safe to quote and
    /// interpolate into a sample-row query.
    pub fn is_safe_identifier(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 63
            && name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

fn contains_word(sql: &str, word: &str) -> bool {
    let bytes = sql.as_bytes();
    let mut start = 0;
    while let Some(pos) = sql[start..].find(word) {
        let begin = start + pos;
        let end = begin + word.len();
        let before_ok = begin == 0 || !is_ident_byte(bytes[begin - 1]);
        let after_ok = end == sql.len() || !is_ident_byte(bytes[end]);
        if before_ok && after_ok {
            return true;
        }
        start = begin + 1;
    }
    false
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_is_allowed() {
        assert!(SqlValidator::ensure_read_only("SELECT * FROM users").is_ok());
        assert!(SqlValidator::ensure_read_only("select count(*) from orders;").is_ok());
    }

    #[test]
    fn test_cte_is_allowed() {
        let sql = "WITH recent AS (SELECT * FROM orders) SELECT count(*) FROM recent";
        assert!(SqlValidator::ensure_read_only(sql).is_ok());
    }

    #[test]
    fn test_mutations_are_forbidden() {
        assert!(SqlValidator::ensure_read_only("DROP TABLE users").is_err());
        assert!(SqlValidator::ensure_read_only("INSERT INTO users VALUES (1)").is_err());
        assert!(SqlValidator::ensure_read_only("UPDATE users SET name = 'x'").is_err());
        assert!(SqlValidator::ensure_read_only("DELETE FROM users").is_err());
    }

    #[test]
    fn test_stacked_statements_are_forbidden() {
        let sql = "SELECT * FROM users; DROP TABLE users";
        assert!(SqlValidator::ensure_read_only(sql).is_err());
    }

    #[test]
    fn test_select_hiding_a_mutation_is_forbidden() {
        let sql = "SELECT * FROM users WHERE id IN (DELETE FROM users RETURNING id)";
        assert!(SqlValidator::ensure_read_only(sql).is_err());
    }

    #[test]
    fn test_keyword_like_column_names_pass() {
        assert!(SqlValidator::ensure_read_only("SELECT created_at FROM orders").is_ok());
        assert!(SqlValidator::ensure_read_only("SELECT last_updated FROM orders").is_ok());
    }

    #[test]
    fn test_identifier_check() {
        assert!(SqlValidator::is_safe_identifier("orders"));
        assert!(SqlValidator::is_safe_identifier("order_items_2024"));
        assert!(!SqlValidator::is_safe_identifier(""));
        assert!(!SqlValidator::is_safe_identifier("orders\"; drop table x --"));
        assert!(!SqlValidator::is_safe_identifier("1orders"));
    }
}
