//! Client hints loaded from a JSON file, standing in for
//! `navigator.userAgentData` when driving the sequencer from a terminal.

use std::path::PathBuf;

use async_trait::async_trait;
use paramsync_browser::{HighEntropySource, HighEntropyValues, ProbeError};

pub struct FileHints {
    path: PathBuf,
}

impl FileHints {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HighEntropySource for FileHints {
    fn is_supported(&self) -> bool {
        self.path.exists()
    }

    async fn get_high_entropy_values(
        &self,
        _hints: &[&str],
    ) -> Result<HighEntropyValues, ProbeError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ProbeError::Unavailable(format!("{}: {e}", self.path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| ProbeError::Denied(format!("malformed hints file: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_hints_file() {
        let path = std::env::temp_dir().join(format!("paramsync-hints-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{"platform":"Windows","platformVersion":"15.0.0","mobile":false,
               "fullVersionList":[{"brand":"Microsoft Edge","version":"120.0.2210.91"}]}"#,
        )
        .unwrap();

        let hints = FileHints::new(&path);
        assert!(hints.is_supported());
        let values = hints.get_high_entropy_values(&[]).await.unwrap();
        assert_eq!(values.platform, "Windows");
        assert_eq!(values.to_environment().browser_brand, "Microsoft Edge");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_is_unsupported() {
        assert!(!FileHints::new("/nonexistent/hints.json").is_supported());
    }
}
