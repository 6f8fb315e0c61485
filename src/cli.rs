use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "lazystack",
    version,
    about = "A keyboard-driven Kubernetes dashboard for the terminal."
)]
pub struct CliArgs {
    /// Start in a specific namespace
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Kubeconfig context to connect with
    #[arg(long)]
    pub context: Option<String>,

    /// Path to a kubeconfig file
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Refresh interval in milliseconds
    #[arg(long)]
    pub refresh_ms: Option<u64>,

    /// Log lines fetched per pod
    #[arg(long)]
    pub tail_lines: Option<i64>,

    /// Config file (skips discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Append tracing output to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::CliArgs;
    use clap::Parser;

    #[test]
    fn defaults_leave_overrides_unset() {
        let args = CliArgs::try_parse_from(["lazystack"]).expect("args should parse");
        assert_eq!(args.namespace, None);
        assert_eq!(args.refresh_ms, None);
        assert_eq!(args.log_filter, "info");
    }

    #[test]
    fn short_namespace_flag_is_accepted() {
        let args = CliArgs::try_parse_from(["lazystack", "-n", "shop", "--refresh-ms", "2500"])
            .expect("args should parse");
        assert_eq!(args.namespace.as_deref(), Some("shop"));
        assert_eq!(args.refresh_ms, Some(2_500));
    }
}
