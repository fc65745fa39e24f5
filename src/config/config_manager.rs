// ==========================================
// 兽药休药期监测系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
            ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = datetime('now')
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// 未写入数据库的键以默认值出现在快照中。
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let mut config_map: BTreeMap<String, String> = config_keys::DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    // ===== 业务配置 =====

    /// 兽医工作台历史记录条数（默认 10）
    pub fn get_vet_history_limit(&self) -> ConfigResult<i64> {
        let value = self.get_config_or_default(config_keys::VET_HISTORY_LIMIT, "10")?;
        Ok(parse_or_warn(config_keys::VET_HISTORY_LIMIT, &value, 10).max(0))
    }

    /// 单次畜群登记最大个体数（默认 10000）
    pub fn get_flock_bulk_max_count(&self) -> ConfigResult<i64> {
        let value = self.get_config_or_default(config_keys::FLOCK_BULK_MAX_COUNT, "10000")?;
        Ok(parse_or_warn(config_keys::FLOCK_BULK_MAX_COUNT, &value, 10_000))
    }

    /// 是否允许终态记录再次审批（默认 false）
    pub fn get_lifecycle_allow_retransition(&self) -> ConfigResult<bool> {
        let value = self.get_config_or_default(config_keys::LIFECYCLE_ALLOW_RETRANSITION, "false")?;
        Ok(matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
    }
}

fn parse_or_warn(key: &str, raw: &str, default: i64) -> i64 {
    raw.trim().parse::<i64>().unwrap_or_else(|_| {
        tracing::warn!(config_key = key, raw_value = %raw, default, "配置格式错误，使用默认值");
        default
    })
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 兽医工作台
    pub const VET_HISTORY_LIMIT: &str = "vet_history_limit";

    // 畜群批量登记
    pub const FLOCK_BULK_MAX_COUNT: &str = "flock_bulk_max_count";

    // 审批状态机
    pub const LIFECYCLE_ALLOW_RETRANSITION: &str = "lifecycle_allow_retransition";

    pub const DEFAULTS: &[(&str, &str)] = &[
        (VET_HISTORY_LIMIT, "10"),
        (FLOCK_BULK_MAX_COUNT, "10000"),
        (LIFECYCLE_ALLOW_RETRANSITION, "false"),
    ];
}
