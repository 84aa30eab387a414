use crate::model::{RunRequest, RunStatus, TestEnvironment, TestFilePath, TestUploadDirectory};
use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("failed to open sqlite db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory sqlite db")?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn init_schema(&self) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(crate::storage::schema::DDL)?;
        Ok(())
    }

    // --- Lookup tables ---

    /// Operator path: environments are created out-of-band and must be
    /// unique by name. A duplicate is a plain error, not get-or-create.
    pub fn create_environment(&self, name: &str) -> anyhow::Result<TestEnvironment> {
        let conn = self.conn.lock().unwrap();
        let existing: Option<i64> = conn
            .query_row(
                "SELECT id FROM test_environments WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            anyhow::bail!("environment '{name}' already exists");
        }
        conn.execute(
            "INSERT INTO test_environments(name) VALUES (?1)",
            params![name],
        )
        .context("insert environment")?;
        Ok(TestEnvironment {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub fn environment_name(&self, id: i64) -> anyhow::Result<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let name = conn
            .query_row(
                "SELECT name FROM test_environments WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    /// Ids from `path_ids` with no matching test_file_paths row, in the
    /// order given (first occurrence only).
    pub fn missing_path_ids(&self, path_ids: &[i64]) -> anyhow::Result<Vec<i64>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT 1 FROM test_file_paths WHERE id = ?1")?;
        let mut missing = Vec::new();
        for &id in path_ids {
            let found = stmt
                .query_row(params![id], |_| Ok(()))
                .optional()?
                .is_some();
            if !found && !missing.contains(&id) {
                missing.push(id);
            }
        }
        Ok(missing)
    }

    /// Record one upload: get-or-create the directory row and the stored
    /// path row in a single transaction, so concurrent uploads into a
    /// brand-new directory cannot produce duplicate rows.
    pub fn record_upload(
        &self,
        directory: &str,
        stored_path: &str,
    ) -> anyhow::Result<(TestUploadDirectory, TestFilePath)> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        let dir = Self::get_or_create_upload_dir(&tx, directory)?;
        let path = Self::get_or_create_file_path(&tx, stored_path)?;
        tx.commit()?;
        Ok((dir, path))
    }

    // Explicit insert-or-fetch: the UNIQUE constraint absorbs the conflict
    // and the follow-up SELECT reads whichever row survived.
    fn get_or_create_upload_dir(
        tx: &Transaction,
        directory: &str,
    ) -> anyhow::Result<TestUploadDirectory> {
        tx.execute(
            "INSERT INTO test_upload_dirs(directory) VALUES (?1)
             ON CONFLICT(directory) DO NOTHING",
            params![directory],
        )
        .context("insert upload directory")?;
        let row = tx
            .query_row(
                "SELECT id, directory FROM test_upload_dirs WHERE directory = ?1",
                params![directory],
                |row| {
                    Ok(TestUploadDirectory {
                        id: row.get(0)?,
                        directory: row.get(1)?,
                    })
                },
            )
            .context("fetch upload directory")?;
        Ok(row)
    }

    fn get_or_create_file_path(tx: &Transaction, path: &str) -> anyhow::Result<TestFilePath> {
        tx.execute(
            "INSERT INTO test_file_paths(path) VALUES (?1)
             ON CONFLICT(path) DO NOTHING",
            params![path],
        )
        .context("insert file path")?;
        let row = tx
            .query_row(
                "SELECT id, path FROM test_file_paths WHERE path = ?1",
                params![path],
                |row| {
                    Ok(TestFilePath {
                        id: row.get(0)?,
                        path: row.get(1)?,
                    })
                },
            )
            .context("fetch file path")?;
        Ok(row)
    }

    // --- Asset queries ---
    // Ascending by display field, id as tiebreak so equal values keep
    // insertion order.

    pub fn list_file_paths(&self) -> anyhow::Result<Vec<TestFilePath>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, path FROM test_file_paths ORDER BY path ASC, id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(TestFilePath {
                id: row.get(0)?,
                path: row.get(1)?,
            })
        })?;
        let mut paths = Vec::new();
        for row in rows {
            paths.push(row?);
        }
        Ok(paths)
    }

    pub fn list_environments(&self) -> anyhow::Result<Vec<TestEnvironment>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT id, name FROM test_environments ORDER BY name ASC, id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(TestEnvironment {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        let mut envs = Vec::new();
        for row in rows {
            envs.push(row?);
        }
        Ok(envs)
    }

    pub fn list_upload_dirs(&self) -> anyhow::Result<Vec<TestUploadDirectory>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id, directory FROM test_upload_dirs ORDER BY directory ASC, id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(TestUploadDirectory {
                id: row.get(0)?,
                directory: row.get(1)?,
            })
        })?;
        let mut dirs = Vec::new();
        for row in rows {
            dirs.push(row?);
        }
        Ok(dirs)
    }

    // --- Run requests ---

    /// Persist a new run request with status CREATED. Callers have already
    /// validated that the environment and every path id exist.
    pub fn create_run_request(
        &self,
        requested_by: &str,
        env_id: i64,
        path_ids: &[i64],
    ) -> anyhow::Result<RunRequest> {
        let mut conn = self.conn.lock().unwrap();
        let created_at = chrono::Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO test_run_requests(requested_by, env_id, status, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![requested_by, env_id, RunStatus::Created.as_str(), created_at],
        )
        .context("insert run request")?;
        let id = tx.last_insert_rowid();

        let mut stmt = tx.prepare(
            "INSERT INTO test_run_request_paths(run_request_id, path_id) VALUES (?1, ?2)
             ON CONFLICT(run_request_id, path_id) DO NOTHING",
        )?;
        for path_id in path_ids {
            stmt.execute(params![id, path_id])
                .context("insert run request path")?;
        }
        drop(stmt);

        let env_name: String = tx.query_row(
            "SELECT name FROM test_environments WHERE id = ?1",
            params![env_id],
            |row| row.get(0),
        )?;
        let path = Self::run_request_path_ids(&tx, id)?;
        tx.commit()?;

        Ok(RunRequest {
            id,
            requested_by: requested_by.to_string(),
            env: env_id,
            path,
            status: RunStatus::Created,
            created_at,
            env_name,
            logs: None,
        })
    }

    pub fn get_run_request(&self, id: i64) -> anyhow::Result<Option<RunRequest>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT r.id, r.requested_by, r.env_id, r.status, r.created_at, r.logs, e.name
                 FROM test_run_requests r
                 JOIN test_environments e ON r.env_id = e.id
                 WHERE r.id = ?1",
                params![id],
                |row| {
                    Ok(RunRequest {
                        id: row.get(0)?,
                        requested_by: row.get(1)?,
                        env: row.get(2)?,
                        path: Vec::new(),
                        status: RunStatus::parse(&row.get::<_, String>(3)?),
                        created_at: row.get(4)?,
                        env_name: row.get(6)?,
                        logs: Some(row.get(5)?),
                    })
                },
            )
            .optional()?;

        match row {
            Some(mut req) => {
                req.path = Self::run_request_path_ids(&conn, req.id)?;
                Ok(Some(req))
            }
            None => Ok(None),
        }
    }

    /// Newest first; id breaks ties between equal timestamps.
    pub fn list_run_requests(&self) -> anyhow::Result<Vec<RunRequest>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT r.id, r.requested_by, r.env_id, r.status, r.created_at, e.name
             FROM test_run_requests r
             JOIN test_environments e ON r.env_id = e.id
             ORDER BY r.created_at DESC, r.id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RunRequest {
                id: row.get(0)?,
                requested_by: row.get(1)?,
                env: row.get(2)?,
                path: Vec::new(),
                status: RunStatus::parse(&row.get::<_, String>(3)?),
                created_at: row.get(4)?,
                env_name: row.get(5)?,
                logs: None,
            })
        })?;

        let mut requests = Vec::new();
        for row in rows {
            requests.push(row?);
        }
        for req in &mut requests {
            req.path = Self::run_request_path_ids(&conn, req.id)?;
        }
        Ok(requests)
    }

    fn run_request_path_ids(conn: &Connection, run_request_id: i64) -> anyhow::Result<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT path_id FROM test_run_request_paths
             WHERE run_request_id = ?1 ORDER BY path_id ASC",
        )?;
        let rows = stmt.query_map(params![run_request_id], |row| row.get(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    // --- Worker-owned mutations ---
    // Status transitions and log output belong to the external runner; the
    // API layer never calls these outside tests.

    pub fn set_status(&self, id: i64, status: RunStatus) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE test_run_requests SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if updated == 0 {
            anyhow::bail!("test run request {id} does not exist");
        }
        Ok(())
    }

    pub fn append_logs(&self, id: i64, chunk: &str) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE test_run_requests
             SET logs = CASE WHEN logs = '' THEN ?1 ELSE logs || char(10) || ?1 END
             WHERE id = ?2",
            params![chunk, id],
        )?;
        if updated == 0 {
            anyhow::bail!("test run request {id} does not exist");
        }
        Ok(())
    }
}
