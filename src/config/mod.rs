use crate::utils::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, sync::Arc};

pub const DEFAULT_CONFIG_PATH: &str = "config.yml";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub ip_header: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// 单次请求允许上传的图片总大小（MB）
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_max_upload_mb() -> usize {
    20
}

/// 上传大小上限的最大允许值（MB）
pub const MAX_UPLOAD_MB_LIMIT: usize = 1024;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StorageConfig {
    /// 示例图片根目录，布局为 `<memes_dir>/<key>/example.<ext>`
    pub memes_dir: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_prefix: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SwaggerConfig {
    pub endpoint: String,
    pub title: String,
    pub description: String,
    pub version: String,
    pub server_url: String,
    pub server_description: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub swagger: SwaggerConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_prefix: "meme-server".to_string(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ip_header: "x-forwarded-for".to_string(),
        }
    }
}

impl Default for SwaggerConfig {
    fn default() -> Self {
        Self {
            endpoint: "/swagger-ui".to_string(),
            title: "Meme Server API".to_string(),
            description: "表情包生成服务".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            server_url: "/".to_string(),
            server_description: "当前服务".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 2233,
                proxy: ProxyConfig::default(),
                max_upload_mb: default_max_upload_mb(),
            },
            storage: StorageConfig {
                memes_dir: "memes".to_string(),
            },
            logging: LoggingConfig::default(),
            swagger: SwaggerConfig::default(),
        }
    }
}

impl Config {
    /// 配置文件路径，可通过 `CONFIG_PATH` 环境变量覆盖
    pub fn path_from_env() -> String {
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// 读取配置文件；文件不存在时先生成一份
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            Self::bootstrap(path)?;
        }

        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("读取配置文件 {} 失败: {}", path.display(), e)))?;
        let config = Self::from_yaml(&content)?;

        let memes_dir = Path::new(&config.storage.memes_dir);
        if !memes_dir.exists() {
            fs::create_dir_all(memes_dir)
                .map_err(|e| AppError::Config(format!("创建示例图片目录失败: {}", e)))?;
            tracing::info!("示例图片目录已创建: {}", memes_dir.display());
        }

        Ok(Arc::new(config))
    }

    /// 优先复制同目录下的 `<name>.example`，否则写入内置默认值
    fn bootstrap(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::Config(format!("创建配置目录失败: {}", e)))?;
        }

        let mut example = path.as_os_str().to_owned();
        example.push(".example");
        let example = Path::new(&example);
        if example.exists() {
            fs::copy(example, path)
                .map_err(|e| AppError::Config(format!("复制示例配置文件失败: {}", e)))?;
            tracing::info!("已从 {} 生成配置文件", example.display());
            return Ok(());
        }

        let content = serde_yaml::to_string(&Config::default())
            .map_err(|e| AppError::Config(format!("序列化默认配置失败: {}", e)))?;
        fs::write(path, content)
            .map_err(|e| AppError::Config(format!("写入默认配置文件失败: {}", e)))?;
        tracing::info!("配置文件不存在，已写入默认配置: {}", path.display());
        Ok(())
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config("Server port must be greater than 0".to_string()));
        }

        if self.server.host.is_empty() {
            return Err(AppError::Config("Server host cannot be empty".to_string()));
        }

        if self.server.max_upload_mb == 0 || self.server.max_upload_mb > MAX_UPLOAD_MB_LIMIT {
            return Err(AppError::Config(format!(
                "Upload limit must be between 1 and {} MB",
                MAX_UPLOAD_MB_LIMIT
            )));
        }

        if self.storage.memes_dir.is_empty() {
            return Err(AppError::Config("Memes directory path cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = Config::from_yaml(
            "server:\n  host: 127.0.0.1\n  port: 8080\nstorage:\n  memes_dir: data/memes\n",
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_upload_mb, 20);
        assert!(!config.server.proxy.enabled);
        assert_eq!(config.logging.file_prefix, "meme-server");
        assert_eq!(config.swagger.endpoint, "/swagger-ui");
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.memes_dir.clear();
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_upload_limit_bounds() {
        let mut config = Config::default();
        config.server.max_upload_mb = usize::MAX;
        assert!(config.validate().is_err());
        // 未经校验的值也不会溢出
        assert_eq!(config.max_upload_bytes(), usize::MAX);

        config.server.max_upload_mb = MAX_UPLOAD_MB_LIMIT;
        assert!(config.validate().is_ok());
        assert_eq!(config.max_upload_bytes(), MAX_UPLOAD_MB_LIMIT * 1024 * 1024);
    }

    #[test]
    fn test_missing_file_is_created_from_example() {
        let dir = std::env::temp_dir().join(format!("meme-config-{}", fastrand::u64(..)));
        fs::create_dir_all(&dir).unwrap();
        let memes_dir = dir.join("memes");
        fs::write(
            dir.join("config.yml.example"),
            format!(
                "server:\n  host: 127.0.0.1\n  port: 9000\nstorage:\n  memes_dir: {}\n",
                memes_dir.display()
            ),
        )
        .unwrap();

        let config = Config::load_from_file(dir.join("config.yml")).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(dir.join("config.yml").exists());
        assert!(memes_dir.is_dir());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.server.port, 2233);
        assert_eq!(config.storage.memes_dir, "memes");
    }
}
