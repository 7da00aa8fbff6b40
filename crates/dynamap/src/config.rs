use std::{env, time::Duration};

/// Process-wide configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Worker threads dedicated to database calls (default: available parallelism)
    pub pool_size: usize,
    /// Prefix applied to every table name (default: empty)
    pub table_prefix: String,
    /// Tracing filter directive (default: "dynamap=info")
    pub log_filter: String,
    /// Custom DynamoDB endpoint, e.g. DynamoDB Local (default: none)
    pub endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: String,
    /// Timeout for blocking calls in milliseconds (default: 10,000)
    pub timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DYNAMAP_POOL_SIZE` - Worker pool size (default: available parallelism, or 4)
    /// - `DYNAMAP_TABLE_PREFIX` - Table name prefix (default: "")
    /// - `DYNAMAP_LOG` - Tracing filter (default: "dynamap=info")
    /// - `AWS_ENDPOINT_URL` - Custom endpoint (default: unset)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    /// - `DYNAMAP_TIMEOUT_MS` - Blocking call timeout (default: 10,000)
    pub fn from_env() -> Self {
        Self {
            pool_size: env::var("DYNAMAP_POOL_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or_else(default_pool_size),
            table_prefix: env::var("DYNAMAP_TABLE_PREFIX").unwrap_or_default(),
            log_filter: env::var("DYNAMAP_LOG").unwrap_or_else(|_| "dynamap=info".to_string()),
            endpoint_url: env::var("AWS_ENDPOINT_URL").ok().filter(|v| !v.is_empty()),
            region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            timeout_ms: env::var("DYNAMAP_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        }
    }

    /// Get the blocking timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({})", url),
            None => format!("AWS DynamoDB (region: {})", self.region),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            pool_size: 2,
            table_prefix: "test-".to_string(),
            log_filter: "dynamap=debug".to_string(),
            endpoint_url: None,
            region: "eu-west-1".to_string(),
            timeout_ms: 1_500,
        }
    }

    #[test]
    fn test_timeout_conversion() {
        assert_eq!(sample_config().timeout(), Duration::from_millis(1_500));
    }

    #[test]
    fn test_target_display() {
        let mut config = sample_config();
        assert_eq!(config.target_display(), "AWS DynamoDB (region: eu-west-1)");

        config.endpoint_url = Some("http://localhost:8000".to_string());
        assert_eq!(
            config.target_display(),
            "Local DynamoDB (http://localhost:8000)"
        );
    }

    #[test]
    fn test_default_values() {
        // Clear environment variables to test defaults
        env::remove_var("DYNAMAP_POOL_SIZE");
        env::remove_var("DYNAMAP_TABLE_PREFIX");
        env::remove_var("DYNAMAP_LOG");
        env::remove_var("AWS_ENDPOINT_URL");
        env::remove_var("AWS_REGION");
        env::remove_var("DYNAMAP_TIMEOUT_MS");

        let config = Config::from_env();

        assert!(config.pool_size > 0);
        assert_eq!(config.table_prefix, "");
        assert_eq!(config.log_filter, "dynamap=info");
        assert_eq!(config.endpoint_url, None);
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.timeout_ms, 10_000);
    }
}
