use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub llm: LlmConfig,
    pub reports: ReportConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat-completions endpoint.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: usize,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Base URL prefix for download links embedded in manifests.
    pub download_base: String,
    pub list_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl AppConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<(), String> {
        if self.llm.endpoint.is_empty() {
            return Err("llm.endpoint must not be empty".into());
        }
        if self.llm.max_tokens == 0 {
            return Err("llm.max_tokens must be > 0".into());
        }
        if self.llm.request_timeout_secs == 0 {
            return Err("llm.request_timeout_secs must be > 0".into());
        }
        if self.reports.list_limit == 0 {
            return Err("reports.list_limit must be > 0".into());
        }
        if !self.reports.download_base.starts_with('/') {
            return Err("reports.download_base must be an absolute URL path".into());
        }
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }

    pub fn conversations_dir(&self) -> PathBuf {
        self.data_dir.join("conversations")
    }

    pub fn evaluations_dir(&self) -> PathBuf {
        self.data_dir.join("evaluations")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            llm: LlmConfig {
                endpoint: "http://localhost:11434/v1/chat/completions".to_string(),
                model: "llama3.1".to_string(),
                api_key: None,
                max_tokens: 1500,
                request_timeout_secs: 120,
            },
            reports: ReportConfig {
                download_base: "/api/reports/download".to_string(),
                list_limit: 10,
            },
            server: ServerConfig {
                bind_addr: "127.0.0.1:8080".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_relative_download_base() {
        let mut config = AppConfig::default();
        config.reports.download_base = "api/reports".into();
        assert!(config.validate().is_err());
    }
}
