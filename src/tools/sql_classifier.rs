//! Lexical SQL statement classification.
//!
//! Statements are classified by their leading keyword only: the text is
//! trimmed, upper-cased and matched by prefix. Nothing is parsed, so a
//! statement that hides a second command after a `;`, or that starts with a
//! comment, is classified by whatever comes first.

/// Kind of SQL statement, decided by its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT, SHOW, DESCRIBE
    Read,
    Insert,
    Update,
    Delete,
    /// DROP, TRUNCATE; never allowed
    Forbidden(&'static str),
    /// Anything else (CREATE, ALTER, EXPLAIN, WITH, ...)
    Other,
}

const READ_PREFIXES: &[&str] = &["SELECT", "SHOW", "DESCRIBE"];
const FORBIDDEN_PREFIXES: &[&str] = &["DROP", "TRUNCATE"];

impl StatementKind {
    /// Keyword used in error messages.
    pub fn operation_name(&self) -> &'static str {
        match self {
            Self::Read => "query",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Forbidden(keyword) => keyword,
            Self::Other => "other",
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.operation_name())
    }
}

/// Classify a statement by its leading keyword.
///
/// # Examples
///
/// ```
/// use mysql_mcp_server::tools::sql_classifier::{classify, StatementKind};
///
/// assert_eq!(classify("  select * from t"), StatementKind::Read);
/// assert_eq!(classify("DROP TABLE t"), StatementKind::Forbidden("DROP"));
/// assert_eq!(classify("CREATE TABLE t (id INT)"), StatementKind::Other);
/// ```
pub fn classify(sql: &str) -> StatementKind {
    let upper = sql.trim().to_uppercase();

    if READ_PREFIXES.iter().any(|p| upper.starts_with(p)) {
        return StatementKind::Read;
    }
    if upper.starts_with("INSERT") {
        return StatementKind::Insert;
    }
    if upper.starts_with("UPDATE") {
        return StatementKind::Update;
    }
    if upper.starts_with("DELETE") {
        return StatementKind::Delete;
    }
    if let Some(keyword) = FORBIDDEN_PREFIXES.iter().find(|p| upper.starts_with(*p)) {
        return StatementKind::Forbidden(keyword);
    }
    StatementKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_statements() {
        assert_eq!(classify("SELECT 1"), StatementKind::Read);
        assert_eq!(classify("show tables"), StatementKind::Read);
        assert_eq!(classify("Describe users"), StatementKind::Read);
    }

    #[test]
    fn test_write_statements() {
        assert_eq!(classify("INSERT INTO t VALUES (1)"), StatementKind::Insert);
        assert_eq!(classify("update t set a = 1"), StatementKind::Update);
        assert_eq!(classify("delete from t"), StatementKind::Delete);
    }

    #[test]
    fn test_forbidden_statements() {
        assert_eq!(classify("DROP TABLE t"), StatementKind::Forbidden("DROP"));
        assert_eq!(classify("drop database prod"), StatementKind::Forbidden("DROP"));
        assert_eq!(classify("TRUNCATE t"), StatementKind::Forbidden("TRUNCATE"));
        assert!(classify("truncate table t").is_forbidden());
    }

    #[test]
    fn test_leading_whitespace_ignored() {
        assert_eq!(classify("\n\t  SELECT 1"), StatementKind::Read);
        assert_eq!(classify("   DROP TABLE t"), StatementKind::Forbidden("DROP"));
    }

    #[test]
    fn test_other_statements() {
        assert_eq!(classify("CREATE TABLE t (id INT)"), StatementKind::Other);
        assert_eq!(classify("ALTER TABLE t ADD c INT"), StatementKind::Other);
        assert_eq!(classify("EXPLAIN SELECT 1"), StatementKind::Other);
        assert_eq!(classify("WITH x AS (SELECT 1) SELECT * FROM x"), StatementKind::Other);
        assert_eq!(classify(""), StatementKind::Other);
        assert_eq!(classify("   "), StatementKind::Other);
    }

    #[test]
    fn test_only_leading_keyword_counts() {
        // Second statement is not inspected.
        assert_eq!(classify("SELECT 1; DROP TABLE t"), StatementKind::Read);
        // Comment hides the keyword.
        assert_eq!(classify("/* x */ DROP TABLE t"), StatementKind::Other);
        // DESC is not DESCRIBE.
        assert_eq!(classify("DESC t"), StatementKind::Other);
    }

    #[test]
    fn test_kind_helpers() {
        assert!(StatementKind::Insert.is_mutation());
        assert!(!StatementKind::Read.is_mutation());
        assert_eq!(StatementKind::Delete.to_string(), "DELETE");
        assert_eq!(StatementKind::Forbidden("TRUNCATE").operation_name(), "TRUNCATE");
    }
}
