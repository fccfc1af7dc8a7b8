//! Global arguments for the CLI.

use alloy_primitives::B256;
use anyhow::{Context, Result};
use clap::Args;
use orbit_cli::{LogArgs, load_toml};
use orbit_governance::AuditConfig;
use orbit_providers_alloy::{AlloyChainClient, RetryConfig};
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Global arguments for the CLI.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Logging arguments.
    #[command(flatten)]
    pub log: LogArgs,
    /// JSON-RPC endpoint of the parent chain.
    #[arg(long = "rpc-url", env = "ORBIT_RPC_URL")]
    pub rpc_url: Url,
    /// TOML file with audit settings. Flags take precedence over its values.
    #[arg(long = "config", short = 'c', env = "ORBIT_AUDIT_CONFIG")]
    pub config: Option<PathBuf>,
    /// Upper bound on reads in flight within one phase.
    #[arg(long = "max-concurrent-reads", env = "ORBIT_MAX_CONCURRENT_READS")]
    pub max_concurrent_reads: Option<usize>,
    /// First block scanned for historical events.
    #[arg(long = "from-block")]
    pub from_block: Option<u64>,
    /// Last block scanned for historical events. Defaults to the chain head.
    #[arg(long = "to-block")]
    pub to_block: Option<u64>,
    /// Additional keyset hash whose signing keys are public. Repeatable.
    #[arg(long = "null-keyset")]
    pub null_keysets: Vec<B256>,
    /// Retries of a failed RPC request.
    #[arg(long = "rpc.max-retries", default_value_t = 3)]
    pub max_retries: usize,
    /// Delay before the first retry, in milliseconds.
    #[arg(long = "rpc.retry-delay-ms", default_value_t = 250)]
    pub retry_delay_ms: u64,
}

impl GlobalArgs {
    /// Loads the configuration file, if any, and applies the flag overrides on top.
    pub fn audit_config(&self) -> Result<AuditConfig> {
        let mut config = match &self.config {
            Some(path) => load_toml::<AuditConfig>(path)
                .with_context(|| format!("loading audit config from {}", path.display()))?,
            None => AuditConfig::default(),
        };

        if let Some(reads) = self.max_concurrent_reads {
            config.max_concurrent_reads = reads;
        }
        if let Some(from) = self.from_block {
            config.from_block = from;
        }
        if self.to_block.is_some() {
            config.to_block = self.to_block;
        }
        config.null_keyset_hashes.extend(self.null_keysets.iter().copied());

        if let Some(to) = config.to_block {
            anyhow::ensure!(
                config.from_block <= to,
                "invalid block range: from block {} is after to block {to}",
                config.from_block
            );
        }
        Ok(config)
    }

    /// The retry policy of the RPC client.
    pub const fn retry_config(&self) -> RetryConfig {
        let min_delay = Duration::from_millis(self.retry_delay_ms);
        RetryConfig {
            max_retries: self.max_retries,
            min_delay,
            max_delay: min_delay.saturating_mul(32),
        }
    }

    /// Connects to the parent chain.
    pub fn chain_client(&self) -> AlloyChainClient {
        AlloyChainClient::new_http(self.rpc_url.clone(), self.retry_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        global: GlobalArgs,
    }

    fn parse(args: &[&str]) -> GlobalArgs {
        let mut argv = vec!["orbit-audit", "--rpc-url", "http://localhost:8545"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn test_defaults_without_config_file() {
        let global = parse(&[]);
        assert_eq!(global.audit_config().unwrap(), AuditConfig::default());
        assert_eq!(global.retry_config(), RetryConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "max_concurrent_reads = 8\nfrom_block = 10\nto_block = 500\n\n\
             [discovery]\nactivity_window_blocks = 100"
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let global = parse(&["--config", path, "--max-concurrent-reads", "2", "--from-block", "20"]);
        let config = global.audit_config().unwrap();

        assert_eq!(config.max_concurrent_reads, 2);
        assert_eq!(config.from_block, 20);
        assert_eq!(config.to_block, Some(500));
        assert_eq!(config.discovery.activity_window_blocks, 100);
    }

    #[test]
    fn test_null_keysets_are_appended() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "null_keyset_hashes = [\"0x{}\"]", "aa".repeat(32)).unwrap();

        let extra = format!("0x{}", "bb".repeat(32));
        let path = file.path().to_str().unwrap();
        let config = parse(&["--config", path, "--null-keyset", &extra]).audit_config().unwrap();

        assert_eq!(
            config.null_keyset_hashes,
            vec![B256::repeat_byte(0xaa), B256::repeat_byte(0xbb)]
        );
    }

    #[test]
    fn test_inverted_block_range_is_rejected() {
        let global = parse(&["--from-block", "10", "--to-block", "5"]);
        assert!(global.audit_config().is_err());
    }

    #[test]
    fn test_unknown_config_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_reads = 3").unwrap();

        let path = file.path().to_str().unwrap();
        assert!(parse(&["--config", path]).audit_config().is_err());
    }

    #[test]
    fn test_retry_config_from_flags() {
        let global = parse(&["--rpc.max-retries", "0", "--rpc.retry-delay-ms", "100"]);
        let retry = global.retry_config();
        assert_eq!(retry.max_retries, 0);
        assert_eq!(retry.min_delay, Duration::from_millis(100));
        assert_eq!(retry.max_delay, Duration::from_millis(3_200));
    }
}
