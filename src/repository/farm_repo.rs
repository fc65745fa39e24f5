// ==========================================
// 兽药休药期监测系统 - 养殖场/畜群/个体数据仓储
// ==========================================
// 职责: farm / flock / animal 表访问
// 红线: Repository 不含业务逻辑 (标签生成、数量校验在 API 层)
// ==========================================

use crate::domain::farm::{Animal, Farm, Flock};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const FLOCK_COLUMNS: &str = r#"
    id, farm_id, flock_code, flock_tag, species_code, size, date_of_birth,
    avg_weight_kg, avg_feed_kg_per_day, avg_water_l_per_day
"#;

// ==========================================
// FarmRepository
// ==========================================
pub struct FarmRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FarmRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // Farm
    // ==========================================

    /// 创建养殖场，返回新ID（farm.id 被忽略）
    pub fn create_farm(&self, farm: &Farm) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO farm (name, farm_number, state, district, village, total_animals)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                farm.name,
                farm.farm_number,
                farm.state,
                farm.district,
                farm.village,
                farm.total_animals,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_farm(&self, farm_id: i64) -> RepositoryResult<Option<Farm>> {
        let conn = self.get_conn()?;
        let farm = conn
            .query_row(
                r#"
                SELECT id, name, farm_number, state, district, village, total_animals
                FROM farm WHERE id = ?1
                "#,
                params![farm_id],
                |row| {
                    Ok(Farm {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        farm_number: row.get(2)?,
                        state: row.get(3)?,
                        district: row.get(4)?,
                        village: row.get(5)?,
                        total_animals: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(farm)
    }

    // ==========================================
    // Flock
    // ==========================================

    /// 创建畜群，返回新ID（flock.id 被忽略）
    pub fn create_flock(&self, flock: &Flock) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        insert_flock(&conn, flock)
    }

    pub fn find_flock(&self, flock_id: i64) -> RepositoryResult<Option<Flock>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM flock WHERE id = ?1", FLOCK_COLUMNS);
        let flock = conn
            .query_row(&sql, params![flock_id], map_flock_row)
            .optional()?;
        Ok(flock)
    }

    /// 查询养殖场下所有畜群（按ID升序）
    pub fn list_flocks_by_farm(&self, farm_id: i64) -> RepositoryResult<Vec<Flock>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM flock WHERE farm_id = ?1 ORDER BY id ASC",
            FLOCK_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let flocks = stmt
            .query_map(params![farm_id], map_flock_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(flocks)
    }

    /// 同一养殖场下畜群编号是否已存在
    pub fn flock_code_exists(&self, farm_id: i64, flock_code: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM flock WHERE farm_id = ?1 AND flock_code = ?2",
                params![farm_id, flock_code],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    /// 批量登记畜群及其个体（单事务）
    ///
    /// # 步骤
    /// 1. 插入 flock
    /// 2. 按 animal_tags 顺序插入个体
    /// 3. farm.total_animals += 个体数
    ///
    /// # 返回
    /// - Ok((flock_id, animals_created))
    /// - Err(UniqueConstraintViolation): 畜群编号或个体标签重复，事务回滚
    pub fn register_flock_with_animals(
        &self,
        flock: &Flock,
        animal_tags: &[String],
    ) -> RepositoryResult<(i64, usize)> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let flock_id = insert_flock(&tx, flock)?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO animal (flock_id, animal_tag, date_of_birth) VALUES (?1, ?2, ?3)",
            )?;
            for tag in animal_tags {
                stmt.execute(params![flock_id, tag, flock.date_of_birth])?;
            }
        }

        let updated = tx.execute(
            "UPDATE farm SET total_animals = total_animals + ?1 WHERE id = ?2",
            params![animal_tags.len() as i64, flock.farm_id],
        )?;
        if updated == 0 {
            return Err(RepositoryError::not_found("Farm", flock.farm_id));
        }

        tx.commit()?;
        Ok((flock_id, animal_tags.len()))
    }

    // ==========================================
    // Animal
    // ==========================================

    /// 创建个体，返回新ID（animal.id 被忽略）
    pub fn create_animal(&self, animal: &Animal) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO animal (flock_id, animal_tag, date_of_birth, sex)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![animal.flock_id, animal.animal_tag, animal.date_of_birth, animal.sex],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_animal(&self, animal_id: i64) -> RepositoryResult<Option<Animal>> {
        let conn = self.get_conn()?;
        let animal = conn
            .query_row(
                "SELECT id, flock_id, animal_tag, date_of_birth, sex FROM animal WHERE id = ?1",
                params![animal_id],
                map_animal_row,
            )
            .optional()?;
        Ok(animal)
    }

    /// 查询畜群下所有个体（按标签排序）
    pub fn list_animals_by_flock(&self, flock_id: i64) -> RepositoryResult<Vec<Animal>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, flock_id, animal_tag, date_of_birth, sex
            FROM animal WHERE flock_id = ?1
            ORDER BY animal_tag ASC
            "#,
        )?;
        let animals = stmt
            .query_map(params![flock_id], map_animal_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(animals)
    }
}

fn insert_flock(conn: &Connection, flock: &Flock) -> RepositoryResult<i64> {
    conn.execute(
        r#"
        INSERT INTO flock (
            farm_id, flock_code, flock_tag, species_code, size, date_of_birth,
            avg_weight_kg, avg_feed_kg_per_day, avg_water_l_per_day
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            flock.farm_id,
            flock.flock_code,
            flock.flock_tag,
            flock.species_code,
            flock.size,
            flock.date_of_birth,
            flock.avg_weight_kg,
            flock.avg_feed_kg_per_day,
            flock.avg_water_l_per_day,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn map_flock_row(row: &rusqlite::Row<'_>) -> SqliteResult<Flock> {
    Ok(Flock {
        id: row.get(0)?,
        farm_id: row.get(1)?,
        flock_code: row.get(2)?,
        flock_tag: row.get(3)?,
        species_code: row.get(4)?,
        size: row.get(5)?,
        date_of_birth: row.get(6)?,
        avg_weight_kg: row.get(7)?,
        avg_feed_kg_per_day: row.get(8)?,
        avg_water_l_per_day: row.get(9)?,
    })
}

fn map_animal_row(row: &rusqlite::Row<'_>) -> SqliteResult<Animal> {
    Ok(Animal {
        id: row.get(0)?,
        flock_id: row.get(1)?,
        animal_tag: row.get(2)?,
        date_of_birth: row.get(3)?,
        sex: row.get(4)?,
    })
}
