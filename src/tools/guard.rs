//! Permission policy for SQL statements.
//!
//! Four flags decide which statement kinds may run. DROP and TRUNCATE are
//! rejected no matter what the flags say.

use crate::error::{DbError, DbResult};
use crate::tools::sql_classifier::{StatementKind, classify};
use serde::{Deserialize, Serialize};

/// Permission flags, as they appear under `permission` in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permission {
    pub allow_query: bool,
    pub allow_insert: bool,
    pub allow_update: bool,
    pub allow_delete: bool,
}

impl Default for Permission {
    fn default() -> Self {
        Self {
            allow_query: true,
            allow_insert: false,
            allow_update: false,
            allow_delete: false,
        }
    }
}

impl Permission {
    /// Policy with every flag set.
    pub fn allow_all() -> Self {
        Self {
            allow_query: true,
            allow_insert: true,
            allow_update: true,
            allow_delete: true,
        }
    }

    /// Whether a statement of this kind may run.
    pub fn allows(&self, kind: StatementKind) -> bool {
        match kind {
            StatementKind::Read => self.allow_query,
            StatementKind::Insert => self.allow_insert,
            StatementKind::Update => self.allow_update,
            StatementKind::Delete => self.allow_delete,
            StatementKind::Forbidden(_) => false,
            StatementKind::Other => true,
        }
    }

    /// Check a statement kind, returning the matching error when denied.
    pub fn check(&self, kind: StatementKind) -> DbResult<()> {
        match kind {
            StatementKind::Forbidden(keyword) => Err(DbError::forbidden_statement(keyword)),
            kind if self.allows(kind) => Ok(()),
            kind => Err(DbError::permission_denied(kind.operation_name())),
        }
    }

    /// Read-path gate: all-or-nothing on `allow_query`.
    pub fn check_query(&self) -> DbResult<()> {
        if self.allow_query {
            Ok(())
        } else {
            Err(DbError::permission_denied(StatementKind::Read.operation_name()))
        }
    }
}

/// Gate for the query tool: only reads pass.
///
/// DROP/TRUNCATE keep their forbidden-statement error. Every other non-read
/// kind is refused whatever the flags say; `allow_query` is checked on the
/// gateway's read path.
pub fn check_read_only(sql: &str) -> DbResult<StatementKind> {
    match classify(sql) {
        StatementKind::Read => Ok(StatementKind::Read),
        StatementKind::Forbidden(keyword) => Err(DbError::forbidden_statement(keyword)),
        kind => Err(DbError::not_read_only(kind.operation_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_permission() {
        let p = Permission::default();
        assert!(p.allow_query);
        assert!(!p.allow_insert);
        assert!(!p.allow_update);
        assert!(!p.allow_delete);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let p: Permission = serde_json::from_str(r#"{"allow_insert": true}"#).unwrap();
        assert!(p.allow_query);
        assert!(p.allow_insert);
        assert!(!p.allow_delete);
    }

    #[test]
    fn test_matrix() {
        let p = Permission {
            allow_query: true,
            allow_insert: true,
            allow_update: false,
            allow_delete: false,
        };
        assert!(p.allows(StatementKind::Read));
        assert!(p.allows(StatementKind::Insert));
        assert!(!p.allows(StatementKind::Update));
        assert!(!p.allows(StatementKind::Delete));
        assert!(p.allows(StatementKind::Other));
    }

    #[test]
    fn test_forbidden_never_allowed() {
        let p = Permission::allow_all();
        assert!(!p.allows(StatementKind::Forbidden("DROP")));
        assert!(matches!(
            p.check(StatementKind::Forbidden("TRUNCATE")),
            Err(DbError::ForbiddenStatement { .. })
        ));
    }

    #[test]
    fn test_check_denied_reports_operation() {
        let p = Permission::default();
        match p.check(StatementKind::Delete) {
            Err(DbError::PermissionDenied { operation }) => assert_eq!(operation, "DELETE"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_check_query() {
        assert!(Permission::default().check_query().is_ok());
        let p = Permission {
            allow_query: false,
            ..Permission::default()
        };
        assert!(matches!(p.check_query(), Err(DbError::PermissionDenied { .. })));
    }

    #[test]
    fn test_check_read_only() {
        assert_eq!(check_read_only("  select 1").unwrap(), StatementKind::Read);
        assert_eq!(check_read_only("SHOW TABLES").unwrap(), StatementKind::Read);
        assert!(matches!(
            check_read_only("DROP TABLE t"),
            Err(DbError::ForbiddenStatement { .. })
        ));
        for sql in [
            "INSERT INTO t VALUES (1)",
            "DELETE FROM t",
            "EXPLAIN SELECT 1",
            "WITH x AS (SELECT 1) SELECT * FROM x",
            "CREATE TABLE t (id INT)",
        ] {
            assert!(
                matches!(check_read_only(sql), Err(DbError::NotReadOnly { .. })),
                "{sql}"
            );
        }
    }
}
