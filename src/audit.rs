//! Append-only text logs: `<logPath>/<table>.log` per table and `<logPath>/sql.log` for `/sql`.
//! Write failures are reported through tracing and never fail the request.

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

pub const SQL_LOG: &str = "sql";

#[derive(Clone, Debug, Default)]
pub struct AuditLog {
    dir: Option<PathBuf>,
}

impl AuditLog {
    /// Log under `dir`, creating it if needed.
    pub async fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(AuditLog { dir: Some(dir) })
    }

    pub fn disabled() -> Self {
        AuditLog { dir: None }
    }

    pub fn file_for(&self, name: &str) -> Option<PathBuf> {
        let safe: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.dir.as_ref().map(|d| d.join(format!("{}.log", safe)))
    }

    pub async fn record(&self, name: &str, entry: &str) {
        let Some(path) = self.file_for(name) else {
            return;
        };
        let line = format!("{} {}\n", chrono::Utc::now().to_rfc3339(), entry);
        let res = async {
            let mut f = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await?;
            f.write_all(line.as_bytes()).await?;
            f.flush().await
        }
        .await;
        if let Err(e) = res {
            tracing::warn!(file = %path.display(), "audit write failed: {}", e);
        }
    }
}
