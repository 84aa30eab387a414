use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind: String,
    pub db_path: PathBuf,
    pub data_root: PathBuf,
    pub runner_url: Option<String>,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            db_path: PathBuf::from("crucible.db"),
            data_root: PathBuf::from("data"),
            runner_url: None,
            max_upload_bytes: 8 * 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = env::var("CRUCIBLE_BIND") {
            cfg.bind = v;
        }
        if let Ok(v) = env::var("CRUCIBLE_DB") {
            cfg.db_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("CRUCIBLE_DATA_ROOT") {
            cfg.data_root = PathBuf::from(v);
        }
        if let Ok(v) = env::var("CRUCIBLE_RUNNER_URL") {
            cfg.runner_url = Some(v);
        }
        if let Ok(v) = env::var("CRUCIBLE_MAX_UPLOAD_BYTES") {
            if let Ok(n) = v.parse() {
                cfg.max_upload_bytes = n;
            }
        }
        if let Ok(v) = env::var("CRUCIBLE_LOG") {
            cfg.log_level = v;
        }
        cfg
    }
}
