use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceCategory {
    Namespaces,
    Deployments,
    Pods,
    Services,
}

impl ResourceCategory {
    pub const ALL: [Self; 4] = [
        Self::Namespaces,
        Self::Deployments,
        Self::Pods,
        Self::Services,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Namespaces => 0,
            Self::Deployments => 1,
            Self::Pods => 2,
            Self::Services => 3,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn prev(self) -> Self {
        Self::from_index(self.index() + Self::ALL.len() - 1)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Namespaces => "Namespaces",
            Self::Deployments => "Deployments",
            Self::Pods => "Pods",
            Self::Services => "Services",
        }
    }

    pub fn hotkey(self) -> char {
        match self {
            Self::Namespaces => '1',
            Self::Deployments => '2',
            Self::Pods => '3',
            Self::Services => '4',
        }
    }

    pub fn from_hotkey(key: char) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.hotkey() == key)
    }

    /// Kind of resource the content tabs describe when an item of this
    /// category is selected. Namespaces have none.
    pub fn resource_kind(self) -> Option<ResourceKind> {
        match self {
            Self::Namespaces => None,
            Self::Deployments => Some(ResourceKind::Deployment),
            Self::Pods => Some(ResourceKind::Pod),
            Self::Services => Some(ResourceKind::Service),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Tab {
    Logs,
    Stats,
    Env,
    Config,
    Top,
    Exec,
}

impl Tab {
    pub const ALL: [Self; 6] = [
        Self::Logs,
        Self::Stats,
        Self::Env,
        Self::Config,
        Self::Top,
        Self::Exec,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Logs => 0,
            Self::Stats => 1,
            Self::Env => 2,
            Self::Config => 3,
            Self::Top => 4,
            Self::Exec => 5,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Logs => "Logs",
            Self::Stats => "Stats",
            Self::Env => "Env",
            Self::Config => "Config",
            Self::Top => "Top",
            Self::Exec => "Exec",
        }
    }

    pub fn hotkey(self) -> char {
        match self {
            Self::Logs => 'l',
            Self::Stats => 's',
            Self::Env => 'e',
            Self::Config => 'c',
            Self::Top => 't',
            Self::Exec => 'x',
        }
    }

    pub fn from_hotkey(key: char) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.hotkey() == key)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Pod,
    Deployment,
    Service,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pod => "pod",
            Self::Deployment => "deployment",
            Self::Service => "service",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared row capability used by list rendering.
pub trait DisplayItem {
    fn title(&self) -> &str;
    fn description(&self) -> String;
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DeploymentInfo {
    pub name: String,
    pub ready: String,
    pub up_to_date: i32,
    pub available: i32,
    pub replicas: i32,
}

impl DisplayItem for DeploymentInfo {
    fn title(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        let marker = if self.available < self.replicas {
            '○'
        } else {
            '●'
        };
        format!(
            "{marker} Ready: {} | Up-to-date: {}",
            self.ready, self.up_to_date
        )
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct PodInfo {
    pub name: String,
    pub status: String,
    pub ready: String,
    pub restarts: i32,
}

impl DisplayItem for PodInfo {
    fn title(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        let marker = if self.status == "Running" { '●' } else { '○' };
        format!("{marker} {} | {}", self.status, self.ready)
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ServiceInfo {
    pub name: String,
    pub service_type: String,
    pub cluster_ip: String,
    pub external_ip: String,
    pub ports: String,
}

impl DisplayItem for ServiceInfo {
    fn title(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("{} | {} | {}", self.service_type, self.cluster_ip, self.ports)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ResourceItem {
    Namespace(String),
    Deployment(DeploymentInfo),
    Pod(PodInfo),
    Service(ServiceInfo),
}

impl ResourceItem {
    pub fn kind(&self) -> Option<ResourceKind> {
        match self {
            Self::Namespace(_) => None,
            Self::Deployment(_) => Some(ResourceKind::Deployment),
            Self::Pod(_) => Some(ResourceKind::Pod),
            Self::Service(_) => Some(ResourceKind::Service),
        }
    }
}

impl DisplayItem for ResourceItem {
    fn title(&self) -> &str {
        match self {
            Self::Namespace(name) => name,
            Self::Deployment(info) => info.title(),
            Self::Pod(info) => info.title(),
            Self::Service(info) => info.title(),
        }
    }

    fn description(&self) -> String {
        match self {
            Self::Namespace(_) => String::new(),
            Self::Deployment(info) => info.description(),
            Self::Pod(info) => info.description(),
            Self::Service(info) => info.description(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodMetrics {
    pub name: String,
    pub namespace: String,
    pub cpu_millis: u64,
    pub memory_bytes: u64,
    pub cpu_formatted: String,
    pub memory_formatted: String,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct EnvVar {
    pub name: String,
    pub value: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ContainerEnv {
    pub container: String,
    pub vars: Vec<EnvVar>,
}

/// Environment of every container in a pod, in declaration order.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct PodEnvVars {
    pub pod: String,
    pub namespace: String,
    pub containers: Vec<ContainerEnv>,
}

/// Identifies the resource the content tabs currently describe.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SelectionContext {
    pub name: String,
    pub kind: ResourceKind,
    pub namespace: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ConfirmAction {
    DeletePod,
    DeleteDeployment,
    ScaleDeployment,
}

impl ConfirmAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DeletePod => "delete-pod",
            Self::DeleteDeployment => "delete-deployment",
            Self::ScaleDeployment => "scale-deployment",
        }
    }

    pub fn is_destructive(self) -> bool {
        matches!(self, Self::DeletePod | Self::DeleteDeployment)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ConfirmRequest {
    pub action: ConfirmAction,
    pub target: String,
    pub namespace: String,
    pub replicas: Option<i32>,
}

impl ConfirmRequest {
    pub fn prompt(&self) -> String {
        match self.action {
            ConfirmAction::DeletePod => format!("Delete pod '{}'?", self.target),
            ConfirmAction::DeleteDeployment => format!("Delete deployment '{}'?", self.target),
            ConfirmAction::ScaleDeployment => format!(
                "Scale '{}' to {} replicas?",
                self.target,
                self.replicas.unwrap_or_default()
            ),
        }
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub enum DialogState {
    #[default]
    None,
    Confirm(ConfirmRequest),
    Help,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct PortForwardKey {
    pub pod: String,
    pub local_port: u16,
}

impl Display for PortForwardKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.pod, self.local_port)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ConfirmAction, ConfirmRequest, DeploymentInfo, DisplayItem, PodInfo, ResourceCategory,
        ResourceItem, Tab,
    };

    #[test]
    fn category_cycle_is_a_bijection() {
        for category in ResourceCategory::ALL {
            assert_eq!(category.next().prev(), category);
            assert_eq!(category.prev().next(), category);
            let mut current = category;
            for _ in 0..ResourceCategory::ALL.len() {
                current = current.next();
            }
            assert_eq!(current, category);
        }
    }

    #[test]
    fn hotkeys_round_trip() {
        for category in ResourceCategory::ALL {
            assert_eq!(
                ResourceCategory::from_hotkey(category.hotkey()),
                Some(category)
            );
        }
        for tab in Tab::ALL {
            assert_eq!(Tab::from_hotkey(tab.hotkey()), Some(tab));
        }
        assert_eq!(ResourceCategory::from_hotkey('5'), None);
        assert_eq!(Tab::from_hotkey('z'), None);
    }

    #[test]
    fn deployment_description_marks_unavailable_replicas() {
        let healthy = DeploymentInfo {
            name: "api".to_string(),
            ready: "3/3".to_string(),
            up_to_date: 3,
            available: 3,
            replicas: 3,
        };
        assert_eq!(healthy.description(), "● Ready: 3/3 | Up-to-date: 3");

        let degraded = DeploymentInfo {
            available: 1,
            ready: "1/3".to_string(),
            ..healthy
        };
        assert!(degraded.description().starts_with('○'));
    }

    #[test]
    fn resource_item_delegates_to_inner_record() {
        let item = ResourceItem::Pod(PodInfo {
            name: "web-7f9c".to_string(),
            status: "Pending".to_string(),
            ready: "0/1".to_string(),
            restarts: 0,
        });
        assert_eq!(item.title(), "web-7f9c");
        assert_eq!(item.description(), "○ Pending | 0/1");

        let namespace = ResourceItem::Namespace("default".to_string());
        assert_eq!(namespace.title(), "default");
        assert!(namespace.description().is_empty());
        assert_eq!(namespace.kind(), None);
    }

    #[test]
    fn confirm_prompts_name_the_target() {
        let scale = ConfirmRequest {
            action: ConfirmAction::ScaleDeployment,
            target: "api".to_string(),
            namespace: "default".to_string(),
            replicas: Some(4),
        };
        assert_eq!(scale.prompt(), "Scale 'api' to 4 replicas?");
        assert!(!scale.action.is_destructive());

        let delete = ConfirmRequest {
            action: ConfirmAction::DeletePod,
            target: "web-7f9c".to_string(),
            namespace: "default".to_string(),
            replicas: None,
        };
        assert_eq!(delete.prompt(), "Delete pod 'web-7f9c'?");
        assert_eq!(delete.action.as_str(), "delete-pod");
    }
}
