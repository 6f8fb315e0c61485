use crate::model::{PodEnvVars, PodInfo, PodMetrics, SelectionContext, Tab};
use std::fmt::Write as _;

const BAR_WIDTH: usize = 20;
const CPU_FULL_SCALE_MILLIS: u64 = 1_000;
const MEMORY_FULL_SCALE_BYTES: u64 = 1_073_741_824;
const METRICS_SERVER_NOTE: &str = "Note: Metrics require metrics-server to be installed in the cluster.\n\
Install with: kubectl apply -f https://github.com/kubernetes-sigs/metrics-server/releases/latest/download/components.yaml";

/// Text shown in a tab when the current selection has nothing for it.
pub fn placeholder(tab: Tab) -> &'static str {
    match tab {
        Tab::Logs => "Select a pod to view logs",
        Tab::Stats => "Select a pod to view stats",
        Tab::Env => "Select a pod to view environment variables",
        Tab::Config => "Select a resource to view YAML configuration",
        Tab::Top => "No pods loaded",
        Tab::Exec => "Select a pod to exec into",
    }
}

pub fn loading(tab: Tab, name: &str) -> String {
    match tab {
        Tab::Logs => format!("Loading logs for {name}..."),
        Tab::Stats => format!("Loading metrics for {name}...\n\n{METRICS_SERVER_NOTE}"),
        Tab::Env => format!("Loading environment variables for {name}..."),
        Tab::Config => format!("Loading YAML for {name}..."),
        Tab::Top | Tab::Exec => String::new(),
    }
}

pub fn logs(pod: &str, raw: String) -> String {
    if raw.trim().is_empty() {
        format!("No logs available for {pod}")
    } else {
        raw
    }
}

pub fn usage_bar(percent: u64, width: usize) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * width / 100;
    let mut bar = "█".repeat(filled);
    bar.push_str(&"░".repeat(width - filled));
    bar
}

fn percent_of(value: u64, full_scale: u64) -> u64 {
    (value.saturating_mul(100) / full_scale.max(1)).min(100)
}

pub fn stats(metrics: &PodMetrics) -> String {
    let cpu_percent = percent_of(metrics.cpu_millis, CPU_FULL_SCALE_MILLIS);
    let memory_percent = percent_of(metrics.memory_bytes, MEMORY_FULL_SCALE_BYTES);

    format!(
        "Resource Metrics for: {name}\n\n\
         CPU Usage:    {cpu}  {cpu_bar} ({cpu_percent}%)\n\
         Memory Usage: {memory}  {memory_bar} ({memory_percent}%)\n\n\
         Raw Values:\n  CPU:    {cpu}\n  Memory: {memory}\n\n\
         Namespace: {namespace}",
        name = metrics.name,
        cpu = metrics.cpu_formatted,
        cpu_bar = usage_bar(cpu_percent, BAR_WIDTH),
        memory = metrics.memory_formatted,
        memory_bar = usage_bar(memory_percent, BAR_WIDTH),
        namespace = metrics.namespace,
    )
}

pub fn metrics_unavailable(pod: &str) -> String {
    format!("Metrics unavailable for {pod}\n\n{METRICS_SERVER_NOTE}")
}

pub fn env_listing(env: &PodEnvVars) -> String {
    if env.containers.is_empty() {
        return format!("No environment variables found for {}", env.pod);
    }

    let mut out = String::new();
    let _ = writeln!(out, "Environment Variables for: {}", env.pod);
    let _ = writeln!(out, "Namespace: {}\n", env.namespace);

    for container in &env.containers {
        let _ = writeln!(out, "━━━ Container: {} ━━━\n", container.container);
        if container.vars.is_empty() {
            out.push_str("  (no environment variables)\n\n");
            continue;
        }
        for var in &container.vars {
            let _ = writeln!(out, "  {}", var.name);
            if let Some(value) = var.value.as_deref().filter(|value| !value.is_empty()) {
                let _ = writeln!(out, "    = {value}");
            }
            if let Some(source) = var.source.as_deref() {
                let _ = writeln!(out, "    → {source}");
            }
            out.push('\n');
        }
    }

    out
}

pub fn config(context: &SelectionContext, yaml: &str) -> String {
    format!(
        "YAML Configuration for {}: {} (Namespace: {})\n\n{yaml}",
        context.kind, context.name, context.namespace
    )
}

pub fn exec_hint(context: &SelectionContext) -> String {
    format!(
        "Exec into: {name}\n\n$ kubectl exec -it {name} -n {namespace} -- /bin/sh",
        name = context.name,
        namespace = context.namespace,
    )
}

/// Pods ordered by restart count, busiest first.
pub fn top(namespace: &str, pods: &[&PodInfo]) -> String {
    if pods.is_empty() {
        return placeholder(Tab::Top).to_string();
    }

    let mut ranked = pods.to_vec();
    ranked.sort_by(|left, right| {
        right
            .restarts
            .cmp(&left.restarts)
            .then_with(|| left.name.cmp(&right.name))
    });

    let name_width = ranked
        .iter()
        .map(|pod| pod.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());
    let status_width = ranked
        .iter()
        .map(|pod| pod.status.chars().count())
        .max()
        .unwrap_or(0)
        .max("STATUS".len());

    let mut out = format!("Pods in {namespace} by restarts\n\n");
    let _ = writeln!(
        out,
        "{:<name_width$}  {:<status_width$}  {:<5}  RESTARTS",
        "NAME", "STATUS", "READY"
    );
    for pod in ranked {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<status_width$}  {:<5}  {}",
            pod.name, pod.status, pod.ready, pod.restarts
        );
    }
    out
}
