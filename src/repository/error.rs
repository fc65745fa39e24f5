// ==========================================
// 兽药休药期监测系统 - 仓储层错误类型
// ==========================================
// 约束冲突按 SQLite 扩展错误码分类，供 API 层映射为业务错误
// ==========================================

use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    /// SQLite 忙/锁表（IMMEDIATE 事务在 busy_timeout 内未拿到写锁）
    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    // ===== 约束冲突 =====
    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),

    #[error("检查约束违反: {0}")]
    CheckConstraintViolation(String),

    // ===== 数据质量 =====
    #[error("数据校验失败: {0}")]
    ValidationError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        RepositoryError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        let (code, message) = match &err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                (*code, msg.clone().unwrap_or_else(|| code.to_string()))
            }
            rusqlite::Error::QueryReturnedNoRows => {
                return RepositoryError::not_found("Unknown", "Unknown");
            }
            _ => return RepositoryError::DatabaseQueryError(err.to_string()),
        };

        match (code.code, code.extended_code) {
            (ErrorCode::ConstraintViolation, ffi::SQLITE_CONSTRAINT_UNIQUE)
            | (ErrorCode::ConstraintViolation, ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
                RepositoryError::UniqueConstraintViolation(message)
            }
            (ErrorCode::ConstraintViolation, ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                RepositoryError::ForeignKeyViolation(message)
            }
            (ErrorCode::ConstraintViolation, ffi::SQLITE_CONSTRAINT_CHECK) => {
                RepositoryError::CheckConstraintViolation(message)
            }
            (ErrorCode::DatabaseBusy, _) | (ErrorCode::DatabaseLocked, _) => {
                RepositoryError::DatabaseTransactionError(message)
            }
            _ => RepositoryError::DatabaseQueryError(message),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// 将文本列解析为领域枚举，失败时返回 rusqlite 转换错误
///
/// 用于 query_map 闭包内部（闭包要求返回 rusqlite::Result）。
pub(crate) fn parse_enum_column<T>(
    row: &rusqlite::Row<'_>,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("无法识别的枚举值: {}", raw).into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err: RepositoryError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_constraint_codes() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE t (id INTEGER PRIMARY KEY, code TEXT UNIQUE, n INTEGER CHECK (n >= 0));
             INSERT INTO t (id, code, n) VALUES (1, 'a', 1);",
        )
        .unwrap();

        let dup: RepositoryError = conn
            .execute("INSERT INTO t (id, code, n) VALUES (2, 'a', 1)", [])
            .unwrap_err()
            .into();
        assert!(matches!(dup, RepositoryError::UniqueConstraintViolation(_)));

        let check: RepositoryError = conn
            .execute("INSERT INTO t (id, code, n) VALUES (3, 'b', -1)", [])
            .unwrap_err()
            .into();
        assert!(matches!(check, RepositoryError::CheckConstraintViolation(_)));
    }
}
