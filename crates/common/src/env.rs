//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Ensure expected directories exist; warn on missing optional ones.
pub async fn ensure_env(frontend_dir: &str, data_dir: &str) -> anyhow::Result<()> {
    if tokio::fs::metadata(frontend_dir).await.is_err() {
        warn!(%frontend_dir, "frontend bundle directory not found; client routes will 404");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_data_dir() -> anyhow::Result<()> {
        let base = std::env::temp_dir().join(format!("portal_env_{}", std::process::id()));
        let data = base.join("data");
        ensure_env("/nonexistent-frontend", data.to_str().unwrap_or("data")).await?;
        assert!(tokio::fs::metadata(&data).await.is_ok());
        let _ = tokio::fs::remove_dir_all(&base).await;
        Ok(())
    }
}
