use clap::Parser;
use std::collections::HashMap;

/// Deletion policy for a managed resource: whether tearing down the CR also
/// tears down the backing cloud resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DeletionPolicy {
    Delete,
    Retain,
}

impl std::str::FromStr for DeletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Delete" => Ok(DeletionPolicy::Delete),
            "Retain" => Ok(DeletionPolicy::Retain),
            other => Err(format!("unknown deletion policy {other}")),
        }
    }
}

/// Parses the `kind=seconds,kind2=seconds2` map form of
/// `--reconcile-resource-resync-seconds`.
fn parse_resync_map(raw: &str) -> Result<HashMap<String, u64>, String> {
    let mut map = HashMap::new();
    if raw.is_empty() {
        return Ok(map);
    }
    for entry in raw.split(',') {
        let (kind, seconds) = entry
            .split_once('=')
            .ok_or_else(|| format!("malformed resync entry {entry:?}, expected kind=seconds"))?;
        let seconds: u64 = seconds
            .parse()
            .map_err(|_| format!("malformed resync seconds in {entry:?}"))?;
        map.insert(kind.to_owned(), seconds);
    }
    Ok(map)
}

/// Top-level CLI configuration for the operator binary. Mirrors the
/// operator flags the design's context-resolution table reads from.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Default AWS region used when neither the CR nor its namespace
    /// override it.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub aws_region: String,

    /// Default account id assumed when the CR carries no
    /// `status.ackResourceMetadata.ownerAccountID` and its namespace has no
    /// override.
    #[arg(long, env = "ACK_DEFAULT_ACCOUNT_ID")]
    pub default_account_id: Option<String>,

    /// Default cloud API endpoint override.
    #[arg(long, env = "ACK_DEFAULT_ENDPOINT_URL")]
    pub default_endpoint_url: Option<String>,

    /// Default deletion policy applied when neither the CR nor its
    /// namespace overrides it.
    #[arg(long, env = "ACK_DELETION_POLICY", default_value = "Delete")]
    pub deletion_policy: DeletionPolicy,

    /// Resync period, in seconds, for any kind without a more specific
    /// override.
    #[arg(long, env = "ACK_RECONCILE_DEFAULT_RESYNC_SECONDS", default_value_t = 36_000)]
    pub reconcile_default_resync_seconds: u64,

    /// Per-kind resync overrides, `kind=seconds,kind2=seconds2`.
    #[arg(long, env = "ACK_RECONCILE_RESOURCE_RESYNC_SECONDS", value_parser = parse_resync_map, default_value = "")]
    pub reconcile_resource_resync_seconds: HashMap<String, u64>,

    /// Prometheus metrics server scrape port. Disabled by default.
    #[cfg(feature = "metrics")]
    #[arg(long, env = "METRICS_PORT")]
    pub metrics_port: Option<u16>,
}

/// Read-only snapshot of operator flags (`C`), as consulted by the
/// context-resolution helpers in `context.rs`.
#[derive(Debug, Clone)]
pub struct Config {
    pub default_account_id: Option<String>,
    pub default_region: String,
    pub default_endpoint_url: Option<String>,
    pub default_deletion_policy: DeletionPolicy,
    pub default_resync_seconds: u64,
    pub resource_resync_seconds: HashMap<String, u64>,
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        Config {
            default_account_id: cli.default_account_id.clone(),
            default_region: cli.aws_region.clone(),
            default_endpoint_url: cli.default_endpoint_url.clone(),
            default_deletion_policy: cli.deletion_policy,
            default_resync_seconds: cli.reconcile_default_resync_seconds,
            resource_resync_seconds: cli.reconcile_resource_resync_seconds.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resync_map() {
        let map = parse_resync_map("Bucket=30,Topic=120").unwrap();
        assert_eq!(map.get("Bucket"), Some(&30));
        assert_eq!(map.get("Topic"), Some(&120));
    }

    #[test]
    fn empty_resync_map() {
        assert!(parse_resync_map("").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_entry() {
        assert!(parse_resync_map("Bucket").is_err());
        assert!(parse_resync_map("Bucket=notanumber").is_err());
    }
}
