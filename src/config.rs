use crate::cli::CliArgs;
use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_NAMESPACE: &str = "default";
const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TAIL_LINES: i64 = 100;
const DEFAULT_LOCAL_PORT: u16 = 8080;
const DEFAULT_REMOTE_PORT: u16 = 80;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    kubernetes: KubernetesSection,
    ui: UiSection,
    port_forward: PortForwardSection,
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct KubernetesSection {
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
    default_namespace: String,
    #[serde(deserialize_with = "duration_field")]
    refresh_interval: Duration,
    #[serde(deserialize_with = "duration_field")]
    request_timeout: Duration,
}

impl Default for KubernetesSection {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiSection {
    log_tail_lines: i64,
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            log_tail_lines: DEFAULT_TAIL_LINES,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct PortForwardSection {
    local_port: u16,
    remote_port: u16,
}

impl Default for PortForwardSection {
    fn default() -> Self {
        Self {
            local_port: DEFAULT_LOCAL_PORT,
            remote_port: DEFAULT_REMOTE_PORT,
        }
    }
}

/// Where the kube client comes from.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct KubeSettings {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
}

/// Knobs the reducer needs at runtime.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ViewSettings {
    pub log_tail_lines: i64,
    pub local_port: u16,
    pub remote_port: u16,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            log_tail_lines: DEFAULT_TAIL_LINES,
            local_port: DEFAULT_LOCAL_PORT,
            remote_port: DEFAULT_REMOTE_PORT,
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Settings {
    pub source: Option<PathBuf>,
    pub kube: KubeSettings,
    pub namespace: String,
    pub refresh_interval: Duration,
    pub request_timeout: Duration,
    pub view: ViewSettings,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn load(args: &CliArgs) -> Result<Self> {
        let source = args.config.clone().or_else(discover_config_path);
        let file = match &source {
            Some(path) => read_config_file(path)?,
            None => ConfigFile::default(),
        };
        Ok(Self::from_file(file, source).with_overrides(args))
    }

    fn from_file(file: ConfigFile, source: Option<PathBuf>) -> Self {
        let namespace = Some(file.kubernetes.default_namespace)
            .filter(|namespace| !namespace.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());
        Self {
            source,
            kube: KubeSettings {
                kubeconfig: file.kubernetes.kubeconfig,
                context: file.kubernetes.context,
            },
            namespace,
            refresh_interval: file.kubernetes.refresh_interval,
            request_timeout: file.kubernetes.request_timeout,
            view: ViewSettings {
                log_tail_lines: file.ui.log_tail_lines.max(1),
                local_port: file.port_forward.local_port,
                remote_port: file.port_forward.remote_port,
            },
            log_file: file.log_file,
        }
    }

    fn with_overrides(mut self, args: &CliArgs) -> Self {
        if let Some(namespace) = args.namespace.as_ref().filter(|ns| !ns.trim().is_empty()) {
            self.namespace = namespace.clone();
        }
        if let Some(context) = &args.context {
            self.kube.context = Some(context.clone());
        }
        if let Some(kubeconfig) = &args.kubeconfig {
            self.kube.kubeconfig = Some(kubeconfig.clone());
        }
        if let Some(refresh_ms) = args.refresh_ms {
            self.refresh_interval = Duration::from_millis(refresh_ms.max(100));
        }
        if let Some(tail_lines) = args.tail_lines {
            self.view.log_tail_lines = tail_lines.max(1);
        }
        if let Some(log_file) = &args.log_file {
            self.log_file = Some(log_file.clone());
        }
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_file(ConfigFile::default(), None)
    }
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("failed to parse config {}", path.display()))
}

fn parse_config(raw: &str) -> Result<ConfigFile> {
    if raw.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("LAZYSTACK_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("lazystack.yaml"),
        PathBuf::from("lazystack.yml"),
        PathBuf::from(".lazystack.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let candidate = PathBuf::from(home).join(".config/lazystack/config.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let system = PathBuf::from("/etc/lazystack/config.yaml");
    system.exists().then_some(system)
}

/// Explicit kubeconfig to read, if any. Under `sudo` without `KUBECONFIG`,
/// the invoking user's `~/.kube/config` wins over root's.
pub fn kubeconfig_override(
    explicit: Option<&Path>,
    kubeconfig_env: Option<&str>,
    sudo_user: Option<&str>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if kubeconfig_env.is_some_and(|value| !value.trim().is_empty()) {
        return None;
    }
    let user = sudo_user.map(str::trim).filter(|user| !user.is_empty())?;
    let home = if user == "root" {
        PathBuf::from("/root")
    } else {
        PathBuf::from("/home").join(user)
    };
    Some(home.join(".kube/config"))
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    let value = raw.trim();
    if value.is_empty() {
        bail!("empty duration");
    }

    let split = value
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(value.len());
    let (number, unit) = value.split_at(split);
    let number = number
        .parse::<f64>()
        .with_context(|| format!("invalid duration '{raw}'"))?;
    let seconds = match unit.trim() {
        "" | "s" => number,
        "ms" => number / 1_000.0,
        "m" => number * 60.0,
        "h" => number * 3_600.0,
        other => bail!("unknown duration unit '{other}' in '{raw}'"),
    };
    let duration = Duration::try_from_secs_f64(seconds)
        .map_err(|error| anyhow!("invalid duration '{raw}': {error}"))?;
    non_zero(duration, raw)
}

fn non_zero(duration: Duration, raw: &str) -> Result<Duration> {
    if duration.is_zero() {
        bail!("duration must be positive: '{raw}'");
    }
    Ok(duration)
}

fn duration_field<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Seconds(u64),
        Text(String),
    }

    match RawDuration::deserialize(deserializer)? {
        RawDuration::Seconds(seconds) => non_zero(Duration::from_secs(seconds), &seconds.to_string())
            .map_err(serde::de::Error::custom),
        RawDuration::Text(text) => parse_duration(&text).map_err(serde::de::Error::custom),
    }
}
