use crate::app::AppEvent;
use crate::k8s::ResourceManager;
use crate::model::{DeploymentInfo, PodEnvVars, PodInfo, PodMetrics, ResourceKind, ServiceInfo};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("k8s manager not initialized")]
    NotInitialized,
    #[error("request timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum LoadKind {
    Namespaces,
    Deployments {
        namespace: String,
    },
    Pods {
        namespace: String,
    },
    Services {
        namespace: String,
    },
    PodLogs {
        namespace: String,
        pod: String,
        tail_lines: i64,
    },
    PodMetrics {
        namespace: String,
        pod: String,
    },
    PodEnv {
        namespace: String,
        pod: String,
    },
    ResourceYaml {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },
}

impl LoadKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Namespaces => "list-namespaces",
            Self::Deployments { .. } => "list-deployments",
            Self::Pods { .. } => "list-pods",
            Self::Services { .. } => "list-services",
            Self::PodLogs { .. } => "pod-logs",
            Self::PodMetrics { .. } => "pod-metrics",
            Self::PodEnv { .. } => "pod-env",
            Self::ResourceYaml { .. } => "resource-yaml",
        }
    }

    /// Namespace a list load was issued for. `None` for cluster-wide lists
    /// and for tab content.
    pub fn list_namespace(&self) -> Option<&str> {
        match self {
            Self::Deployments { namespace }
            | Self::Pods { namespace }
            | Self::Services { namespace } => Some(namespace),
            _ => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Self::Namespaces | Self::Deployments { .. } | Self::Pods { .. } | Self::Services { .. }
        )
    }
}

/// A load tagged with the selection generation active when it was issued.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LoadRequest {
    pub kind: LoadKind,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadPayload {
    Namespaces(Vec<String>),
    Deployments(Vec<DeploymentInfo>),
    Pods(Vec<PodInfo>),
    Services(Vec<ServiceInfo>),
    Logs(String),
    Metrics(PodMetrics),
    Env(PodEnvVars),
    Yaml(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult {
    pub request: LoadRequest,
    pub outcome: Result<LoadPayload, String>,
    pub completed_at: DateTime<Local>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Mutation {
    DeletePod {
        namespace: String,
        name: String,
    },
    DeleteDeployment {
        namespace: String,
        name: String,
    },
    ScaleDeployment {
        namespace: String,
        name: String,
        replicas: i32,
    },
}

impl Mutation {
    pub fn target(&self) -> &str {
        match self {
            Self::DeletePod { name, .. }
            | Self::DeleteDeployment { name, .. }
            | Self::ScaleDeployment { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    pub mutation: Mutation,
    pub outcome: Result<(), String>,
}

/// Runs backend calls off the event loop. Every call ends with exactly one
/// event on the queue.
#[derive(Clone)]
pub struct Dispatcher {
    backend: Option<Arc<dyn ResourceManager>>,
    events: UnboundedSender<AppEvent>,
    limit: Duration,
}

impl Dispatcher {
    pub fn new(
        backend: Option<Arc<dyn ResourceManager>>,
        events: UnboundedSender<AppEvent>,
        limit: Duration,
    ) -> Self {
        Self {
            backend,
            events,
            limit,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    pub fn load(&self, request: LoadRequest) {
        let Some(backend) = self.backend.clone() else {
            self.emit(AppEvent::Loaded(LoadResult {
                request,
                outcome: Err(DispatchError::NotInitialized.to_string()),
                completed_at: Local::now(),
            }));
            return;
        };

        debug!(
            kind = request.kind.label(),
            generation = request.generation,
            "dispatching load"
        );
        let events = self.events.clone();
        let limit = self.limit;
        tokio::spawn(async move {
            let outcome = match timeout(limit, execute_load(backend.as_ref(), &request.kind)).await
            {
                Ok(Ok(payload)) => Ok(payload),
                Ok(Err(error)) => Err(compact_error(&error)),
                Err(_) => Err(DispatchError::TimedOut(limit).to_string()),
            };
            let _ = events.send(AppEvent::Loaded(LoadResult {
                request,
                outcome,
                completed_at: Local::now(),
            }));
        });
    }

    pub fn mutate(&self, mutation: Mutation) {
        let Some(backend) = self.backend.clone() else {
            self.emit(AppEvent::MutationFinished(MutationResult {
                mutation,
                outcome: Err(DispatchError::NotInitialized.to_string()),
            }));
            return;
        };

        debug!(?mutation, "dispatching mutation");
        let events = self.events.clone();
        let limit = self.limit;
        tokio::spawn(async move {
            let outcome =
                match timeout(limit, execute_mutation(backend.as_ref(), &mutation)).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(error)) => Err(compact_error(&error)),
                    Err(_) => Err(DispatchError::TimedOut(limit).to_string()),
                };
            let _ = events.send(AppEvent::MutationFinished(MutationResult { mutation, outcome }));
        });
    }

    fn emit(&self, event: AppEvent) {
        if self.events.send(event).is_err() {
            warn!("event queue closed; dropping dispatcher result");
        }
    }
}

pub async fn execute_load(
    backend: &dyn ResourceManager,
    kind: &LoadKind,
) -> anyhow::Result<LoadPayload> {
    let payload = match kind {
        LoadKind::Namespaces => LoadPayload::Namespaces(backend.list_namespaces().await?),
        LoadKind::Deployments { namespace } => {
            LoadPayload::Deployments(backend.list_deployments(namespace).await?)
        }
        LoadKind::Pods { namespace } => LoadPayload::Pods(backend.list_pods(namespace).await?),
        LoadKind::Services { namespace } => {
            LoadPayload::Services(backend.list_services(namespace).await?)
        }
        LoadKind::PodLogs {
            namespace,
            pod,
            tail_lines,
        } => LoadPayload::Logs(backend.pod_logs(namespace, pod, *tail_lines).await?),
        LoadKind::PodMetrics { namespace, pod } => {
            LoadPayload::Metrics(backend.pod_metrics(namespace, pod).await?)
        }
        LoadKind::PodEnv { namespace, pod } => {
            LoadPayload::Env(backend.pod_env_vars(namespace, pod).await?)
        }
        LoadKind::ResourceYaml {
            kind,
            namespace,
            name,
        } => LoadPayload::Yaml(backend.resource_yaml(*kind, namespace, name).await?),
    };
    Ok(payload)
}

pub async fn execute_mutation(
    backend: &dyn ResourceManager,
    mutation: &Mutation,
) -> anyhow::Result<()> {
    match mutation {
        Mutation::DeletePod { namespace, name } => backend.delete_pod(namespace, name).await,
        Mutation::DeleteDeployment { namespace, name } => {
            backend.delete_deployment(namespace, name).await
        }
        Mutation::ScaleDeployment {
            namespace,
            name,
            replicas,
        } => backend.scale_deployment(namespace, name, *replicas).await,
    }
}

/// One-line rendering of an error chain, capped at two causes.
pub fn compact_error(error: &anyhow::Error) -> String {
    error
        .chain()
        .take(3)
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use super::{
        Dispatcher, LoadKind, LoadPayload, LoadRequest, Mutation, compact_error,
    };
    use crate::app::AppEvent;
    use crate::k8s::ResourceManager;
    use crate::model::{
        DeploymentInfo, PodEnvVars, PodInfo, PodMetrics, ResourceKind, ServiceInfo,
    };
    use anyhow::{Context, Result, anyhow, bail};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;

    /// In-memory cluster used by dispatcher tests.
    #[derive(Default)]
    pub(crate) struct FakeCluster {
        pub pods: Vec<PodInfo>,
        pub log_delay: Option<Duration>,
        pub fail_mutations: bool,
        pub calls: Mutex<Vec<String>>,
    }

    impl FakeCluster {
        fn record(&self, call: String) {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(call);
            }
        }
    }

    #[async_trait]
    impl ResourceManager for FakeCluster {
        async fn list_namespaces(&self) -> Result<Vec<String>> {
            Ok(vec!["default".to_string(), "shop".to_string()])
        }

        async fn list_deployments(&self, _namespace: &str) -> Result<Vec<DeploymentInfo>> {
            Ok(Vec::new())
        }

        async fn list_pods(&self, _namespace: &str) -> Result<Vec<PodInfo>> {
            Ok(self.pods.clone())
        }

        async fn list_services(&self, namespace: &str) -> Result<Vec<ServiceInfo>> {
            bail!("services are forbidden in {namespace}")
        }

        async fn pod_logs(&self, _namespace: &str, pod: &str, tail_lines: i64) -> Result<String> {
            if let Some(delay) = self.log_delay {
                tokio::time::sleep(delay).await;
            }
            Ok(format!("{tail_lines} lines from {pod}"))
        }

        async fn pod_metrics(&self, _namespace: &str, _pod: &str) -> Result<PodMetrics> {
            bail!("the server could not find the requested resource")
        }

        async fn pod_env_vars(&self, namespace: &str, pod: &str) -> Result<PodEnvVars> {
            Ok(PodEnvVars {
                pod: pod.to_string(),
                namespace: namespace.to_string(),
                containers: Vec::new(),
            })
        }

        async fn resource_yaml(
            &self,
            kind: ResourceKind,
            _namespace: &str,
            name: &str,
        ) -> Result<String> {
            Ok(format!("kind: {kind}\nname: {name}\n"))
        }

        async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()> {
            self.record(format!("delete-pod {namespace}/{name}"));
            if self.fail_mutations {
                bail!("forbidden");
            }
            Ok(())
        }

        async fn delete_deployment(&self, namespace: &str, name: &str) -> Result<()> {
            self.record(format!("delete-deployment {namespace}/{name}"));
            Ok(())
        }

        async fn scale_deployment(&self, namespace: &str, name: &str, replicas: i32) -> Result<()> {
            self.record(format!("scale {namespace}/{name} {replicas}"));
            Ok(())
        }
    }

    fn request(kind: LoadKind) -> LoadRequest {
        LoadRequest {
            kind,
            generation: 7,
        }
    }

    #[test]
    fn uninitialized_backend_fails_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(None, tx, Duration::from_secs(1));
        assert!(!dispatcher.is_initialized());

        dispatcher.load(request(LoadKind::Namespaces));
        let Ok(AppEvent::Loaded(result)) = rx.try_recv() else {
            panic!("expected an immediate load result");
        };
        assert_eq!(result.outcome, Err("k8s manager not initialized".to_string()));
        assert_eq!(result.request.generation, 7);

        dispatcher.mutate(Mutation::DeletePod {
            namespace: "default".to_string(),
            name: "web".to_string(),
        });
        let Ok(AppEvent::MutationFinished(result)) = rx.try_recv() else {
            panic!("expected an immediate mutation result");
        };
        assert_eq!(result.outcome, Err("k8s manager not initialized".to_string()));
    }

    #[tokio::test]
    async fn each_load_yields_exactly_one_event() {
        let cluster = FakeCluster {
            pods: vec![PodInfo {
                name: "web".to_string(),
                status: "Running".to_string(),
                ready: "1/1".to_string(),
                restarts: 0,
            }],
            ..FakeCluster::default()
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(Some(Arc::new(cluster)), tx, Duration::from_secs(5));

        dispatcher.load(request(LoadKind::Pods {
            namespace: "default".to_string(),
        }));
        let Some(AppEvent::Loaded(result)) = rx.recv().await else {
            panic!("expected a load result");
        };
        let Ok(LoadPayload::Pods(pods)) = result.outcome else {
            panic!("expected pods payload");
        };
        assert_eq!(pods.len(), 1);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn backend_errors_become_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(
            Some(Arc::new(FakeCluster::default())),
            tx,
            Duration::from_secs(5),
        );
        dispatcher.load(request(LoadKind::Services {
            namespace: "shop".to_string(),
        }));
        let Some(AppEvent::Loaded(result)) = rx.recv().await else {
            panic!("expected a load result");
        };
        assert_eq!(
            result.outcome,
            Err("services are forbidden in shop".to_string())
        );
    }

    #[tokio::test]
    async fn slow_loads_time_out() {
        let cluster = FakeCluster {
            log_delay: Some(Duration::from_secs(5)),
            ..FakeCluster::default()
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(Some(Arc::new(cluster)), tx, Duration::from_millis(20));
        dispatcher.load(request(LoadKind::PodLogs {
            namespace: "default".to_string(),
            pod: "web".to_string(),
            tail_lines: 100,
        }));
        let Some(AppEvent::Loaded(result)) = rx.recv().await else {
            panic!("expected a load result");
        };
        let Err(message) = result.outcome else {
            panic!("expected a timeout");
        };
        assert!(message.starts_with("request timed out"));
    }

    #[tokio::test]
    async fn mutations_reach_the_backend() {
        let cluster = Arc::new(FakeCluster::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let backend: Arc<dyn ResourceManager> = cluster.clone();
        let dispatcher = Dispatcher::new(Some(backend), tx, Duration::from_secs(5));
        dispatcher.mutate(Mutation::ScaleDeployment {
            namespace: "default".to_string(),
            name: "api".to_string(),
            replicas: 4,
        });
        let Some(AppEvent::MutationFinished(result)) = rx.recv().await else {
            panic!("expected a mutation result");
        };
        assert_eq!(result.outcome, Ok(()));
        let calls = cluster.calls.lock().map(|calls| calls.clone()).unwrap_or_default();
        assert_eq!(calls, vec!["scale default/api 4".to_string()]);
    }

    #[test]
    fn compact_error_keeps_two_causes() {
        let error = Err::<(), _>(anyhow!("connection refused"))
            .context("failed to list pods")
            .context("refresh failed")
            .context("outer")
            .unwrap_err();
        assert_eq!(
            compact_error(&error),
            "outer: refresh failed: failed to list pods"
        );
    }
}
