/// Idempotent DDL. The three lookup tables each carry a UNIQUE display
/// column; get-or-create relies on those constraints rather than
/// check-then-insert.
pub const DDL: &str = "
CREATE TABLE IF NOT EXISTS test_environments (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS test_file_paths (
    id   INTEGER PRIMARY KEY AUTOINCREMENT,
    path TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS test_upload_dirs (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    directory TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS test_run_requests (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    requested_by TEXT NOT NULL,
    env_id       INTEGER NOT NULL REFERENCES test_environments(id),
    status       TEXT NOT NULL DEFAULT 'CREATED',
    logs         TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS test_run_request_paths (
    run_request_id INTEGER NOT NULL REFERENCES test_run_requests(id),
    path_id        INTEGER NOT NULL REFERENCES test_file_paths(id),
    PRIMARY KEY (run_request_id, path_id)
);

CREATE INDEX IF NOT EXISTS idx_run_requests_created_at
    ON test_run_requests(created_at);
";
