use crate::config::{KubeSettings, kubeconfig_override};
use crate::model::{
    ContainerEnv, DeploymentInfo, EnvVar, PodEnvVars, PodInfo, PodMetrics, ResourceKind,
    ServiceInfo,
};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{self as corev1, Namespace, Pod, Service};
use kube::api::{DeleteParams, ListParams, LogParams, Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, Client, Config, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Debug;
use tracing::debug;

const SECRET_PLACEHOLDER: &str = "<secret>";
const NONE_PLACEHOLDER: &str = "<none>";
const GIB: u64 = 1_073_741_824;
const MIB: u64 = 1_048_576;

/// Everything the dashboard asks of the cluster.
#[async_trait]
pub trait ResourceManager: Send + Sync {
    async fn list_namespaces(&self) -> Result<Vec<String>>;
    async fn list_deployments(&self, namespace: &str) -> Result<Vec<DeploymentInfo>>;
    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodInfo>>;
    async fn list_services(&self, namespace: &str) -> Result<Vec<ServiceInfo>>;
    async fn pod_logs(&self, namespace: &str, pod: &str, tail_lines: i64) -> Result<String>;
    async fn pod_metrics(&self, namespace: &str, pod: &str) -> Result<PodMetrics>;
    async fn pod_env_vars(&self, namespace: &str, pod: &str) -> Result<PodEnvVars>;
    async fn resource_yaml(&self, kind: ResourceKind, namespace: &str, name: &str)
    -> Result<String>;
    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()>;
    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<()>;
    async fn scale_deployment(&self, namespace: &str, name: &str, replicas: i32) -> Result<()>;
}

#[derive(Clone)]
pub struct KubeGateway {
    client: Client,
    context: String,
}

impl KubeGateway {
    pub async fn connect(settings: &KubeSettings) -> Result<Self> {
        let kubeconfig_env = std::env::var("KUBECONFIG").ok();
        let sudo_user = std::env::var("SUDO_USER").ok();
        let explicit = kubeconfig_override(
            settings.kubeconfig.as_deref(),
            kubeconfig_env.as_deref(),
            sudo_user.as_deref(),
        )
        .filter(|path| settings.kubeconfig.is_some() || path.exists());

        let kubeconfig = match explicit {
            Some(path) => Some(
                Kubeconfig::read_from(&path)
                    .with_context(|| format!("failed to read kubeconfig {}", path.display()))?,
            ),
            None => Kubeconfig::read().ok(),
        };

        let (config, context) = if let Some(kubeconfig) = kubeconfig {
            let context = settings
                .context
                .clone()
                .or_else(|| kubeconfig.current_context.clone())
                .unwrap_or_else(|| "default".to_string());
            let options = KubeConfigOptions {
                context: settings.context.clone(),
                cluster: None,
                user: None,
            };
            let config = Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .context("failed to load Kubernetes configuration")?;
            (config, context)
        } else {
            if settings.context.is_some() {
                bail!("kubeconfig not found; context selection is unavailable");
            }
            let config = Config::infer()
                .await
                .context("failed to infer Kubernetes configuration")?;
            (config, "in-cluster".to_string())
        };

        let client = Client::try_from(config).context("failed to initialize Kubernetes client")?;
        debug!(context = %context, "kubernetes client ready");
        Ok(Self { client, context })
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    async fn namespaced_yaml<K>(&self, namespace: &str, name: &str) -> Result<String>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug + Serialize,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let mut object = api
            .get(name)
            .await
            .with_context(|| format!("failed to get {namespace}/{name}"))?;
        object.meta_mut().managed_fields = None;
        serde_yaml::to_string(&object).context("failed to render YAML")
    }
}

#[async_trait]
impl ResourceManager for KubeGateway {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api.list(&list_params()).await?;
        Ok(list.into_iter().map(|namespace| namespace.name_any()).collect())
    }

    async fn list_deployments(&self, namespace: &str) -> Result<Vec<DeploymentInfo>> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&list_params()).await?;
        Ok(list.items.iter().map(deployment_info).collect())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<PodInfo>> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&list_params()).await?;
        Ok(list.items.iter().map(pod_info).collect())
    }

    async fn list_services(&self, namespace: &str) -> Result<Vec<ServiceInfo>> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&list_params()).await?;
        Ok(list.items.iter().map(service_info).collect())
    }

    async fn pod_logs(&self, namespace: &str, pod: &str, tail_lines: i64) -> Result<String> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            tail_lines: Some(tail_lines),
            ..LogParams::default()
        };
        api.logs(pod, &params)
            .await
            .with_context(|| format!("failed to fetch logs for {namespace}/{pod}"))
    }

    async fn pod_metrics(&self, namespace: &str, pod: &str) -> Result<PodMetrics> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "PodMetrics");
        let resource = ApiResource::from_gvk_with_plural(&gvk, "pods");
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, &resource);
        let object = api
            .get(pod)
            .await
            .with_context(|| format!("metrics unavailable for {namespace}/{pod}"))?;
        Ok(pod_metrics(pod, namespace, &object.data))
    }

    async fn pod_env_vars(&self, namespace: &str, pod: &str) -> Result<PodEnvVars> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let object = api
            .get(pod)
            .await
            .with_context(|| format!("failed to get pod {namespace}/{pod}"))?;
        let containers = object
            .spec
            .as_ref()
            .map(|spec| spec.containers.iter().map(container_env).collect())
            .unwrap_or_default();
        Ok(PodEnvVars {
            pod: pod.to_string(),
            namespace: namespace.to_string(),
            containers,
        })
    }

    async fn resource_yaml(
        &self,
        kind: ResourceKind,
        namespace: &str,
        name: &str,
    ) -> Result<String> {
        match kind {
            ResourceKind::Pod => self.namespaced_yaml::<Pod>(namespace, name).await,
            ResourceKind::Deployment => self.namespaced_yaml::<Deployment>(namespace, name).await,
            ResourceKind::Service => self.namespaced_yaml::<Service>(namespace, name).await,
        }
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let _ = api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<()> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let _ = api.delete(name, &DeleteParams::default()).await?;
        Ok(())
    }

    async fn scale_deployment(&self, namespace: &str, name: &str, replicas: i32) -> Result<()> {
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "spec": { "replicas": replicas } });
        let _ = api
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

fn list_params() -> ListParams {
    ListParams::default().limit(500)
}

fn deployment_info(deployment: &Deployment) -> DeploymentInfo {
    let status = deployment.status.as_ref();
    let replicas = deployment
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        .or_else(|| status.and_then(|status| status.replicas))
        .unwrap_or(0);
    let ready = status.and_then(|status| status.ready_replicas).unwrap_or(0);
    DeploymentInfo {
        name: deployment.name_any(),
        ready: format!("{ready}/{replicas}"),
        up_to_date: status.and_then(|status| status.updated_replicas).unwrap_or(0),
        available: status
            .and_then(|status| status.available_replicas)
            .unwrap_or(0),
        replicas,
    }
}

fn pod_info(pod: &Pod) -> PodInfo {
    let status = pod
        .status
        .as_ref()
        .and_then(|status| status.phase.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let (ready, total, restarts) = pod
        .status
        .as_ref()
        .map(pod_readiness)
        .unwrap_or((0, 0, 0));
    PodInfo {
        name: pod.name_any(),
        status,
        ready: format!("{ready}/{total}"),
        restarts,
    }
}

fn pod_readiness(status: &corev1::PodStatus) -> (usize, usize, i32) {
    let container_statuses = status.container_statuses.as_deref().unwrap_or(&[]);
    let ready = container_statuses
        .iter()
        .filter(|container| container.ready)
        .count();
    let restarts = container_statuses
        .iter()
        .map(|container| container.restart_count)
        .sum();
    (ready, container_statuses.len(), restarts)
}

fn service_info(service: &Service) -> ServiceInfo {
    let spec = service.spec.as_ref();
    let ingress_address = service
        .status
        .as_ref()
        .and_then(|status| status.load_balancer.as_ref())
        .and_then(|balancer| balancer.ingress.as_ref())
        .and_then(|ingress| ingress.first())
        .and_then(|entry| entry.ip.clone().or_else(|| entry.hostname.clone()));
    let external_ip = ingress_address
        .or_else(|| {
            spec.and_then(|spec| spec.external_ips.as_ref())
                .and_then(|ips| ips.first().cloned())
        })
        .unwrap_or_else(|| NONE_PLACEHOLDER.to_string());

    ServiceInfo {
        name: service.name_any(),
        service_type: spec
            .and_then(|spec| spec.type_.clone())
            .unwrap_or_else(|| "ClusterIP".to_string()),
        cluster_ip: spec
            .and_then(|spec| spec.cluster_ip.clone())
            .filter(|ip| !ip.is_empty())
            .unwrap_or_else(|| NONE_PLACEHOLDER.to_string()),
        external_ip,
        ports: service_ports_summary(service),
    }
}

fn service_ports_summary(service: &Service) -> String {
    let ports = service
        .spec
        .as_ref()
        .and_then(|spec| spec.ports.as_deref())
        .unwrap_or(&[]);
    if ports.is_empty() {
        return NONE_PLACEHOLDER.to_string();
    }

    ports
        .iter()
        .map(|port| {
            let protocol = port.protocol.as_deref().unwrap_or("TCP");
            format!("{}/{}", port.port, protocol)
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn container_env(container: &corev1::Container) -> ContainerEnv {
    let mut vars = container
        .env
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(env_var)
        .collect::<Vec<_>>();

    for source in container.env_from.as_deref().unwrap_or(&[]) {
        let prefix = source
            .prefix
            .as_deref()
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| format!(" (prefix: {prefix})"))
            .unwrap_or_default();
        if let Some(config_map) = &source.config_map_ref {
            vars.push(EnvVar {
                name: "[envFrom]".to_string(),
                value: None,
                source: Some(format!(
                    "ConfigMap: {}{prefix}",
                    reference_field(config_map, "name")
                )),
            });
        }
        if let Some(secret) = &source.secret_ref {
            vars.push(EnvVar {
                name: "[envFrom]".to_string(),
                value: None,
                source: Some(format!(
                    "Secret: {}{prefix}",
                    reference_field(secret, "name")
                )),
            });
        }
    }

    ContainerEnv {
        container: container.name.clone(),
        vars,
    }
}

fn env_var(var: &corev1::EnvVar) -> EnvVar {
    let Some(from) = &var.value_from else {
        return EnvVar {
            name: var.name.clone(),
            value: var.value.clone(),
            source: None,
        };
    };

    let (value, source) = if let Some(key) = &from.config_map_key_ref {
        (
            None,
            format!(
                "ConfigMap: {} (key: {})",
                reference_field(key, "name"),
                reference_field(key, "key")
            ),
        )
    } else if let Some(key) = &from.secret_key_ref {
        (
            Some(SECRET_PLACEHOLDER.to_string()),
            format!(
                "Secret: {} (key: {})",
                reference_field(key, "name"),
                reference_field(key, "key")
            ),
        )
    } else if let Some(field) = &from.field_ref {
        (None, format!("Field: {}", reference_field(field, "fieldPath")))
    } else if let Some(resource) = &from.resource_field_ref {
        (
            None,
            format!("Resource: {}", reference_field(resource, "resource")),
        )
    } else {
        (None, "unknown source".to_string())
    };

    EnvVar {
        name: var.name.clone(),
        value,
        source: Some(source),
    }
}

/// Reads a string field from any API reference type by its wire name.
fn reference_field<T: Serialize>(reference: &T, field: &str) -> String {
    serde_json::to_value(reference)
        .ok()
        .and_then(|value| value.get(field).and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

fn pod_metrics(pod: &str, namespace: &str, data: &Value) -> PodMetrics {
    let (cpu_millis, memory_bytes) = parse_pod_metrics_usage(data);
    PodMetrics {
        name: pod.to_string(),
        namespace: namespace.to_string(),
        cpu_millis,
        memory_bytes,
        cpu_formatted: format_cpu_millis(cpu_millis),
        memory_formatted: format_memory(memory_bytes),
    }
}

fn parse_pod_metrics_usage(data: &Value) -> (u64, u64) {
    let Some(containers) = data.get("containers").and_then(Value::as_array) else {
        return (0, 0);
    };

    containers
        .iter()
        .fold((0u64, 0u64), |(cpu, memory), container| {
            let usage = container.get("usage");
            let container_cpu = usage
                .and_then(|usage| usage.get("cpu"))
                .and_then(Value::as_str)
                .and_then(parse_cpu_millicores)
                .unwrap_or(0);
            let container_memory = usage
                .and_then(|usage| usage.get("memory"))
                .and_then(Value::as_str)
                .and_then(parse_memory_bytes)
                .unwrap_or(0);
            (
                cpu.saturating_add(container_cpu),
                memory.saturating_add(container_memory),
            )
        })
}

fn parse_cpu_millicores(value: &str) -> Option<u64> {
    let raw = value.trim();
    let (number, multiplier) = if let Some(number) = raw.strip_suffix('m') {
        (number, 1.0)
    } else if let Some(number) = raw.strip_suffix('u') {
        (number, 0.001)
    } else if let Some(number) = raw.strip_suffix('n') {
        (number, 0.000_001)
    } else {
        (raw, 1000.0)
    };
    non_negative(number.parse::<f64>().ok()? * multiplier)
}

fn parse_memory_bytes(value: &str) -> Option<u64> {
    const UNITS: [(&str, f64); 8] = [
        ("Ti", 1_099_511_627_776.0),
        ("Gi", 1_073_741_824.0),
        ("Mi", 1_048_576.0),
        ("Ki", 1_024.0),
        ("T", 1_000_000_000_000.0),
        ("G", 1_000_000_000.0),
        ("M", 1_000_000.0),
        ("k", 1_000.0),
    ];

    let raw = value.trim();
    for (suffix, multiplier) in UNITS {
        if let Some(number) = raw.strip_suffix(suffix) {
            return non_negative(number.parse::<f64>().ok()? * multiplier);
        }
    }
    non_negative(raw.parse::<f64>().ok()?)
}

fn non_negative(value: f64) -> Option<u64> {
    let rounded = value.round();
    (rounded.is_finite() && rounded >= 0.0).then_some(rounded as u64)
}

fn format_cpu_millis(millis: u64) -> String {
    if millis >= 1_000 {
        format!("{:.2}", millis as f64 / 1_000.0)
    } else {
        format!("{millis}m")
    }
}

fn format_memory(bytes: u64) -> String {
    if bytes >= GIB {
        format!("{:.2}Gi", bytes as f64 / GIB as f64)
    } else {
        format!("{}Mi", bytes / MIB)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        container_env, deployment_info, format_cpu_millis, format_memory, parse_cpu_millicores,
        parse_memory_bytes, pod_info, pod_metrics, service_info,
    };
    use k8s_openapi::api::apps::v1::Deployment;
    use k8s_openapi::api::core::v1::{Container, Pod, Service};
    use serde_json::json;

    #[test]
    fn deployment_ready_uses_desired_replicas() {
        let deployment: Deployment = serde_json::from_value(json!({
            "metadata": { "name": "api" },
            "spec": {
                "replicas": 3,
                "selector": {},
                "template": {}
            },
            "status": { "readyReplicas": 2, "updatedReplicas": 3, "availableReplicas": 2 }
        }))
        .expect("fixture should deserialize");
        let info = deployment_info(&deployment);
        assert_eq!(info.name, "api");
        assert_eq!(info.ready, "2/3");
        assert_eq!(info.up_to_date, 3);
        assert_eq!(info.available, 2);
        assert_eq!(info.replicas, 3);
    }

    #[test]
    fn pod_info_sums_container_restarts() {
        let pod: Pod = serde_json::from_value(json!({
            "metadata": { "name": "web-7f9c" },
            "status": {
                "phase": "Running",
                "containerStatuses": [
                    { "name": "app", "ready": true, "restartCount": 2, "image": "a", "imageID": "" },
                    { "name": "proxy", "ready": false, "restartCount": 1, "image": "b", "imageID": "" }
                ]
            }
        }))
        .expect("fixture should deserialize");
        let info = pod_info(&pod);
        assert_eq!(info.status, "Running");
        assert_eq!(info.ready, "1/2");
        assert_eq!(info.restarts, 3);
    }

    #[test]
    fn pod_without_status_is_unknown() {
        let pod: Pod = serde_json::from_value(json!({ "metadata": { "name": "fresh" } }))
            .expect("fixture should deserialize");
        let info = pod_info(&pod);
        assert_eq!(info.status, "Unknown");
        assert_eq!(info.ready, "0/0");
    }

    #[test]
    fn service_prefers_load_balancer_address() {
        let service: Service = serde_json::from_value(json!({
            "metadata": { "name": "front" },
            "spec": {
                "type": "LoadBalancer",
                "clusterIP": "10.0.0.7",
                "externalIPs": ["192.0.2.1"],
                "ports": [{ "port": 80 }, { "port": 53, "protocol": "UDP" }]
            },
            "status": { "loadBalancer": { "ingress": [{ "hostname": "lb.example.com" }] } }
        }))
        .expect("fixture should deserialize");
        let info = service_info(&service);
        assert_eq!(info.service_type, "LoadBalancer");
        assert_eq!(info.cluster_ip, "10.0.0.7");
        assert_eq!(info.external_ip, "lb.example.com");
        assert_eq!(info.ports, "80/TCP,53/UDP");
    }

    #[test]
    fn service_without_addresses_uses_placeholders() {
        let service: Service = serde_json::from_value(json!({
            "metadata": { "name": "headless" },
            "spec": {}
        }))
        .expect("fixture should deserialize");
        let info = service_info(&service);
        assert_eq!(info.service_type, "ClusterIP");
        assert_eq!(info.external_ip, "<none>");
        assert_eq!(info.ports, "<none>");
    }

    #[test]
    fn env_sources_are_described() {
        let container: Container = serde_json::from_value(json!({
            "name": "app",
            "env": [
                { "name": "MODE", "value": "prod" },
                { "name": "TOKEN", "valueFrom": { "secretKeyRef": { "name": "api", "key": "token" } } },
                { "name": "LEVEL", "valueFrom": { "configMapKeyRef": { "name": "cfg", "key": "level" } } },
                { "name": "NODE", "valueFrom": { "fieldRef": { "fieldPath": "spec.nodeName" } } }
            ],
            "envFrom": [{ "configMapRef": { "name": "shared" }, "prefix": "APP_" }]
        }))
        .expect("fixture should deserialize");
        let env = container_env(&container);
        assert_eq!(env.container, "app");
        assert_eq!(env.vars.len(), 5);
        assert_eq!(env.vars[0].value.as_deref(), Some("prod"));
        assert_eq!(env.vars[1].value.as_deref(), Some("<secret>"));
        assert_eq!(
            env.vars[1].source.as_deref(),
            Some("Secret: api (key: token)")
        );
        assert_eq!(
            env.vars[2].source.as_deref(),
            Some("ConfigMap: cfg (key: level)")
        );
        assert_eq!(env.vars[3].source.as_deref(), Some("Field: spec.nodeName"));
        assert_eq!(
            env.vars[4].source.as_deref(),
            Some("ConfigMap: shared (prefix: APP_)")
        );
    }

    #[test]
    fn metrics_sum_all_containers() {
        let data = json!({
            "containers": [
                { "name": "app", "usage": { "cpu": "250m", "memory": "256Mi" } },
                { "name": "proxy", "usage": { "cpu": "1500000n", "memory": "64Mi" } }
            ]
        });
        let metrics = pod_metrics("web", "shop", &data);
        assert_eq!(metrics.cpu_millis, 252);
        assert_eq!(metrics.memory_bytes, 320 * 1_048_576);
        assert_eq!(metrics.cpu_formatted, "252m");
        assert_eq!(metrics.memory_formatted, "320Mi");
    }

    #[test]
    fn quantities_parse_and_format() {
        assert_eq!(parse_cpu_millicores("2"), Some(2_000));
        assert_eq!(parse_cpu_millicores("bogus"), None);
        assert_eq!(parse_memory_bytes("1Gi"), Some(1_073_741_824));
        assert_eq!(parse_memory_bytes("500k"), Some(500_000));
        assert_eq!(format_cpu_millis(1_500), "1.50");
        assert_eq!(format_memory(1_610_612_736), "1.50Gi");
    }
}
