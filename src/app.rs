use crate::config::ViewSettings;
use crate::content;
use crate::dispatch::{LoadKind, LoadPayload, LoadRequest, LoadResult, Mutation, MutationResult};
use crate::input::{self, Action, InputMode};
use crate::layout::Geometry;
use crate::model::{
    ConfirmAction, ConfirmRequest, DialogState, DisplayItem, PodInfo, PortForwardKey,
    ResourceCategory, ResourceItem, ResourceKind, SelectionContext, Tab,
};
use crate::pane::{ListPane, Navigation};
use crate::viewport::ContentViewport;
use chrono::{DateTime, Local};
use crossterm::event::KeyEvent;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const STATUS_MAX_CHARS: usize = 180;
const REFRESHING_STATUS: &str = "Refreshing...";

/// Everything the event loop feeds into [`update`].
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    Tick,
    Loaded(LoadResult),
    MutationFinished(MutationResult),
    PortForwardStarted { key: PortForwardKey, remote_port: u16 },
    PortForwardFailed { key: PortForwardKey, error: String },
    PortForwardExited {
        key: PortForwardKey,
        detail: String,
        success: bool,
    },
    PortForwardsStopped { count: usize },
}

/// Follow-up work requested by the reducer. The runtime executes these;
/// results come back as [`AppEvent`]s.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Load(LoadRequest),
    Mutate(Mutation),
    StartPortForward {
        key: PortForwardKey,
        namespace: String,
        remote_port: u16,
    },
    StopPortForward(PortForwardKey),
    StopAllPortForwards,
    Quit,
}

#[derive(Debug, Clone)]
pub struct AppState {
    running: bool,
    category: ResourceCategory,
    tab: Tab,
    panes: [ListPane; 4],
    viewports: [ContentViewport; 6],
    namespace: String,
    context: String,
    selection: Option<SelectionContext>,
    generation: u64,
    dialog: DialogState,
    port_forwards: BTreeMap<PortForwardKey, u16>,
    geometry: Geometry,
    status: String,
    last_error: Option<String>,
    last_refresh: Option<DateTime<Local>>,
    settings: ViewSettings,
}

/// Applies one event and returns the next state plus the work it asks for.
pub fn update(mut state: AppState, event: AppEvent) -> (AppState, Vec<Effect>) {
    let effects = state.handle(event);
    (state, effects)
}

impl AppState {
    pub fn new(
        settings: ViewSettings,
        namespace: impl Into<String>,
        context: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        let mut state = Self {
            running: true,
            category: ResourceCategory::Namespaces,
            tab: Tab::Logs,
            panes: ResourceCategory::ALL.map(ListPane::new),
            viewports: Tab::ALL.map(|tab| ContentViewport::new(tab == Tab::Logs)),
            namespace: namespace.into(),
            context: context.into(),
            selection: None,
            generation: 0,
            dialog: DialogState::None,
            port_forwards: BTreeMap::new(),
            geometry: Geometry::default(),
            status: String::new(),
            last_error: None,
            last_refresh: None,
            settings,
        };
        state.set_status(status);
        for tab in Tab::ALL {
            state.viewport_mut(tab).reset(content::placeholder(tab));
        }
        state
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn category(&self) -> ResourceCategory {
        self.category
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn pane(&self, category: ResourceCategory) -> &ListPane {
        &self.panes[category.index()]
    }

    pub fn viewport(&self, tab: Tab) -> &ContentViewport {
        &self.viewports[tab.index()]
    }

    pub fn active_viewport(&self) -> &ContentViewport {
        self.viewport(self.tab)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn selection(&self) -> Option<&SelectionContext> {
        self.selection.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    pub fn port_forward_count(&self) -> usize {
        self.port_forwards.len()
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_refresh(&self) -> Option<DateTime<Local>> {
        self.last_refresh
    }

    pub fn input_mode(&self) -> InputMode {
        match self.dialog {
            DialogState::None => InputMode::Normal,
            DialogState::Confirm(_) => InputMode::Confirm,
            DialogState::Help => InputMode::Help,
        }
    }

    /// The four list loads issued at startup, on every tick and on refresh.
    pub fn list_loads(&self) -> Vec<Effect> {
        let mut effects = vec![self.load(LoadKind::Namespaces)];
        effects.extend(self.namespaced_list_loads());
        effects
    }

    fn namespaced_list_loads(&self) -> Vec<Effect> {
        let namespace = self.namespace.clone();
        vec![
            self.load(LoadKind::Deployments {
                namespace: namespace.clone(),
            }),
            self.load(LoadKind::Pods {
                namespace: namespace.clone(),
            }),
            self.load(LoadKind::Services { namespace }),
        ]
    }

    fn load(&self, kind: LoadKind) -> Effect {
        Effect::Load(LoadRequest {
            kind,
            generation: self.generation,
        })
    }

    fn handle(&mut self, event: AppEvent) -> Vec<Effect> {
        match event {
            AppEvent::Key(key) => {
                let Some(action) = input::map_key(self.input_mode(), key) else {
                    return Vec::new();
                };
                debug!(?action, "key action");
                self.apply_action(action)
            }
            AppEvent::Resize { width, height } => {
                self.resize(width, height);
                Vec::new()
            }
            AppEvent::Tick => self.list_loads(),
            AppEvent::Loaded(result) => self.on_loaded(result),
            AppEvent::MutationFinished(result) => self.on_mutation_finished(result),
            AppEvent::PortForwardStarted { key, remote_port } => {
                // A stop may have been handled while the start was queued.
                if !self.port_forwards.contains_key(&key) {
                    debug!(%key, "ignoring start of an untracked port-forward");
                    return Vec::new();
                }
                info!(%key, remote_port, "port-forward started");
                self.set_status(format!(
                    "Port-forward started: localhost:{} -> {}:{remote_port}",
                    key.local_port, key.pod
                ));
                Vec::new()
            }
            AppEvent::PortForwardFailed { key, error } => {
                warn!(%key, %error, "port-forward failed to start");
                self.port_forwards.remove(&key);
                self.set_error(format!("Error starting port-forward: {error}"));
                Vec::new()
            }
            AppEvent::PortForwardExited {
                key,
                detail,
                success,
            } => {
                let Some(remote_port) = self.port_forwards.remove(&key) else {
                    return Vec::new();
                };
                let target = format!("localhost:{} -> {}:{remote_port}", key.local_port, key.pod);
                if success {
                    self.set_status(format!("Port-forward closed: {target}"));
                } else {
                    self.set_error(format!("Port-forward exited ({detail}): {target}"));
                }
                Vec::new()
            }
            AppEvent::PortForwardsStopped { count } => {
                info!(count, "stopped port-forwards");
                self.set_status("Stopped all port-forwards");
                Vec::new()
            }
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        let geometry = Geometry::compute(width, height);
        self.geometry = geometry;
        for pane in &mut self.panes {
            pane.set_height(geometry.section_rows);
        }
        for viewport in &mut self.viewports {
            viewport.set_height(geometry.viewport_height);
        }
    }

    fn apply_action(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::Quit => {
                self.running = false;
                self.set_status("Stopping port-forwards...");
                vec![Effect::Quit]
            }
            Action::NextCategory => self.focus_category(self.category.next()),
            Action::PrevCategory => self.focus_category(self.category.prev()),
            Action::JumpCategory(category) => self.focus_category(category),
            Action::SelectTab(tab) => {
                self.tab = tab;
                Vec::new()
            }
            Action::Navigate(navigation) => self.navigate(navigation),
            Action::ScrollContentUp => {
                self.viewport_mut(self.tab).scroll_up(1);
                Vec::new()
            }
            Action::ScrollContentDown => {
                self.viewport_mut(self.tab).scroll_down(1);
                Vec::new()
            }
            Action::ContentHalfPageUp => {
                let viewport = self.viewport_mut(self.tab);
                viewport.scroll_up(viewport.half_page());
                Vec::new()
            }
            Action::ContentHalfPageDown => {
                let viewport = self.viewport_mut(self.tab);
                viewport.scroll_down(viewport.half_page());
                Vec::new()
            }
            Action::ToggleFollow => {
                let tab = self.tab;
                let following = self.viewport_mut(tab).toggle_auto_follow();
                let mode = if following { "on" } else { "off" };
                self.set_status(format!("Auto-follow {mode} for {}", tab.title()));
                Vec::new()
            }
            Action::Select => self.select_current(),
            Action::Delete => self.prepare_delete(),
            Action::ScaleUp => self.prepare_scale(1),
            Action::ScaleDown => self.prepare_scale(-1),
            Action::StartPortForward => self.start_port_forward(),
            Action::StopPortForwards => {
                self.port_forwards.clear();
                vec![Effect::StopAllPortForwards]
            }
            Action::Refresh => {
                self.set_status(REFRESHING_STATUS);
                self.list_loads()
            }
            Action::ToggleHelp => {
                self.dialog = DialogState::Help;
                Vec::new()
            }
            Action::CloseHelp => {
                if self.dialog == DialogState::Help {
                    self.dialog = DialogState::None;
                }
                Vec::new()
            }
            Action::ConfirmYes => self.confirm(),
            Action::ConfirmNo => {
                if matches!(self.dialog, DialogState::Confirm(_)) {
                    self.dialog = DialogState::None;
                    self.set_status("Action cancelled");
                }
                Vec::new()
            }
        }
    }

    fn focus_category(&mut self, category: ResourceCategory) -> Vec<Effect> {
        self.category = category;
        let Some(kind) = category.resource_kind() else {
            return Vec::new();
        };
        self.tab = if kind == ResourceKind::Pod {
            Tab::Logs
        } else {
            Tab::Config
        };
        match self.context_from_pane(category) {
            Some(context) => self.select_resource(context, true),
            None => Vec::new(),
        }
    }

    fn navigate(&mut self, navigation: Navigation) -> Vec<Effect> {
        let category = self.category;
        if !self.pane_mut(category).navigate(navigation) {
            return Vec::new();
        }

        if category == ResourceCategory::Namespaces {
            let Some(namespace) = self.selected_title(category) else {
                return Vec::new();
            };
            if namespace == self.namespace {
                return Vec::new();
            }
            return self.switch_namespace(namespace);
        }

        let Some(context) = self.context_from_pane(category) else {
            return Vec::new();
        };
        if self.selection.as_ref() == Some(&context) {
            return Vec::new();
        }
        self.set_status(format!("Selected: {}", context.name));
        self.select_resource(context, false)
    }

    fn select_current(&mut self) -> Vec<Effect> {
        let category = self.category;
        if category == ResourceCategory::Namespaces {
            let Some(namespace) = self.selected_title(category) else {
                return Vec::new();
            };
            let effects = self.switch_namespace(namespace);
            self.category = ResourceCategory::Pods;
            self.tab = Tab::Logs;
            return effects;
        }

        let Some(context) = self.context_from_pane(category) else {
            return Vec::new();
        };
        self.set_status(format!("Selected: {}", context.name));
        self.select_resource(context, true)
    }

    fn switch_namespace(&mut self, namespace: String) -> Vec<Effect> {
        info!(%namespace, "switching namespace");
        self.namespace = namespace;
        self.clear_selection();
        for category in [
            ResourceCategory::Deployments,
            ResourceCategory::Pods,
            ResourceCategory::Services,
        ] {
            self.pane_mut(category).clear();
        }
        self.refresh_top();
        self.set_status(format!("Switched to namespace: {}", self.namespace));
        self.namespaced_list_loads()
    }

    /// Points the content tabs at `context` and requests their content.
    /// Without `force`, re-selecting the current context is a no-op.
    fn select_resource(&mut self, context: SelectionContext, force: bool) -> Vec<Effect> {
        if !force && self.selection.as_ref() == Some(&context) {
            return Vec::new();
        }

        self.generation = self.generation.wrapping_add(1);
        if context.kind != ResourceKind::Pod
            && matches!(self.tab, Tab::Logs | Tab::Stats | Tab::Env | Tab::Exec)
        {
            self.tab = Tab::Config;
        }

        let name = context.name.clone();
        let namespace = context.namespace.clone();
        let mut kinds = Vec::new();
        if context.kind == ResourceKind::Pod {
            for tab in [Tab::Logs, Tab::Stats, Tab::Env] {
                self.viewport_mut(tab).reset(content::loading(tab, &name));
            }
            self.viewport_mut(Tab::Exec)
                .reset(content::exec_hint(&context));
            kinds.push(LoadKind::PodLogs {
                namespace: namespace.clone(),
                pod: name.clone(),
                tail_lines: self.settings.log_tail_lines,
            });
            kinds.push(LoadKind::PodMetrics {
                namespace: namespace.clone(),
                pod: name.clone(),
            });
            kinds.push(LoadKind::PodEnv {
                namespace: namespace.clone(),
                pod: name.clone(),
            });
        } else {
            for tab in [Tab::Logs, Tab::Stats, Tab::Env, Tab::Exec] {
                self.viewport_mut(tab).reset(content::placeholder(tab));
            }
        }
        self.viewport_mut(Tab::Config)
            .reset(content::loading(Tab::Config, &name));
        kinds.push(LoadKind::ResourceYaml {
            kind: context.kind,
            namespace,
            name,
        });

        debug!(
            resource = %context.name,
            kind = %context.kind,
            generation = self.generation,
            "selection changed"
        );
        self.selection = Some(context);
        kinds.into_iter().map(|kind| self.load(kind)).collect()
    }

    fn clear_selection(&mut self) {
        self.selection = None;
        self.generation = self.generation.wrapping_add(1);
        for tab in Tab::ALL {
            if tab != Tab::Top {
                self.viewport_mut(tab).reset(content::placeholder(tab));
            }
        }
    }

    fn prepare_delete(&mut self) -> Vec<Effect> {
        let action = match self.category {
            ResourceCategory::Pods => ConfirmAction::DeletePod,
            ResourceCategory::Deployments => ConfirmAction::DeleteDeployment,
            other => {
                self.set_status(format!("Delete is not available for {}", other.title()));
                return Vec::new();
            }
        };
        let Some(target) = self.selected_title(self.category) else {
            self.set_status(format!("No {} selected", self.category.title()));
            return Vec::new();
        };
        self.dialog = DialogState::Confirm(ConfirmRequest {
            action,
            target,
            namespace: self.namespace.clone(),
            replicas: None,
        });
        Vec::new()
    }

    fn prepare_scale(&mut self, delta: i32) -> Vec<Effect> {
        if self.category != ResourceCategory::Deployments {
            self.set_status("Scaling is only available for deployments");
            return Vec::new();
        }
        let Some(ResourceItem::Deployment(info)) = self.pane(self.category).selected_item().cloned()
        else {
            self.set_status("No deployment selected");
            return Vec::new();
        };
        let target = info.replicas.saturating_add(delta);
        if target < 0 {
            self.set_status(format!("Cannot scale {} below 0 replicas", info.name));
            return Vec::new();
        }
        self.dialog = DialogState::Confirm(ConfirmRequest {
            action: ConfirmAction::ScaleDeployment,
            target: info.name,
            namespace: self.namespace.clone(),
            replicas: Some(target),
        });
        Vec::new()
    }

    fn confirm(&mut self) -> Vec<Effect> {
        let DialogState::Confirm(request) = std::mem::take(&mut self.dialog) else {
            return Vec::new();
        };
        let ConfirmRequest {
            action,
            target,
            namespace,
            replicas,
        } = request;

        let mutation = match action {
            ConfirmAction::DeletePod => {
                self.set_status(format!("Deleting pod: {target}..."));
                Mutation::DeletePod {
                    namespace,
                    name: target,
                }
            }
            ConfirmAction::DeleteDeployment => {
                self.set_status(format!("Deleting deployment: {target}..."));
                Mutation::DeleteDeployment {
                    namespace,
                    name: target,
                }
            }
            ConfirmAction::ScaleDeployment => {
                let replicas = replicas.unwrap_or_default();
                self.set_status(format!("Scaling {target} to {replicas} replicas..."));
                Mutation::ScaleDeployment {
                    namespace,
                    name: target,
                    replicas,
                }
            }
        };
        vec![Effect::Mutate(mutation)]
    }

    fn on_mutation_finished(&mut self, result: MutationResult) -> Vec<Effect> {
        let MutationResult { mutation, outcome } = result;
        if let Err(error) = outcome {
            warn!(resource = mutation.target(), %error, "mutation failed");
            let message = match mutation {
                Mutation::DeletePod { .. } => format!("Error deleting pod: {error}"),
                Mutation::DeleteDeployment { .. } => format!("Error deleting deployment: {error}"),
                Mutation::ScaleDeployment { .. } => format!("Error scaling: {error}"),
            };
            self.set_error(message);
            return Vec::new();
        }

        let namespace = self.namespace.clone();
        match mutation {
            Mutation::DeletePod { name, .. } => {
                self.set_status(format!("Deleted pod: {name}"));
                let mut effects = vec![self.load(LoadKind::Pods { namespace })];
                let orphaned = self
                    .port_forwards
                    .keys()
                    .filter(|key| key.pod == name)
                    .cloned()
                    .collect::<Vec<_>>();
                for key in orphaned {
                    self.port_forwards.remove(&key);
                    effects.push(Effect::StopPortForward(key));
                }
                effects
            }
            Mutation::DeleteDeployment { name, .. } => {
                self.set_status(format!("Deleted deployment: {name}"));
                vec![self.load(LoadKind::Deployments { namespace })]
            }
            Mutation::ScaleDeployment { name, replicas, .. } => {
                self.set_status(format!("Scaled {name} to {replicas} replicas"));
                vec![self.load(LoadKind::Deployments { namespace })]
            }
        }
    }

    fn start_port_forward(&mut self) -> Vec<Effect> {
        if self.category != ResourceCategory::Pods {
            self.set_status("Port-forward is only available for pods");
            return Vec::new();
        }
        let Some(pod) = self.selected_title(ResourceCategory::Pods) else {
            self.set_status("No pod selected");
            return Vec::new();
        };
        let active = self
            .port_forwards
            .iter()
            .find(|(key, _)| key.pod == pod)
            .map(|(key, remote_port)| {
                format!(
                    "Port-forward already active: localhost:{} -> {}:{remote_port}",
                    key.local_port, key.pod
                )
            });
        if let Some(message) = active {
            self.set_status(message);
            return Vec::new();
        }

        let remote_port = self.settings.remote_port;
        let key = PortForwardKey {
            pod,
            local_port: self.next_free_local_port(),
        };
        self.set_status(format!(
            "Starting port-forward: localhost:{} -> {}:{remote_port}...",
            key.local_port, key.pod
        ));
        self.port_forwards.insert(key.clone(), remote_port);
        vec![Effect::StartPortForward {
            key,
            namespace: self.namespace.clone(),
            remote_port,
        }]
    }

    fn next_free_local_port(&self) -> u16 {
        let base = self.settings.local_port;
        (base..=u16::MAX)
            .find(|port| !self.port_forwards.keys().any(|key| key.local_port == *port))
            .unwrap_or(base)
    }

    fn on_loaded(&mut self, result: LoadResult) -> Vec<Effect> {
        let LoadResult {
            request,
            outcome,
            completed_at,
        } = result;

        if request.kind.is_list() {
            if let Some(namespace) = request.kind.list_namespace()
                && namespace != self.namespace
            {
                debug!(
                    kind = request.kind.label(),
                    %namespace,
                    "discarding list for inactive namespace"
                );
                return Vec::new();
            }
            self.apply_list(request.kind, outcome, completed_at);
            return Vec::new();
        }

        if request.generation != self.generation {
            debug!(
                kind = request.kind.label(),
                issued = request.generation,
                current = self.generation,
                "discarding stale content"
            );
            return Vec::new();
        }
        self.apply_content(request.kind, outcome);
        Vec::new()
    }

    fn apply_list(
        &mut self,
        kind: LoadKind,
        outcome: Result<LoadPayload, String>,
        completed_at: DateTime<Local>,
    ) {
        let category = match kind {
            LoadKind::Namespaces => ResourceCategory::Namespaces,
            LoadKind::Deployments { .. } => ResourceCategory::Deployments,
            LoadKind::Pods { .. } => ResourceCategory::Pods,
            _ => ResourceCategory::Services,
        };

        let payload = match outcome {
            Ok(payload) => payload,
            Err(error) => {
                let message = format!(
                    "Error loading {}: {error}",
                    category.title().to_ascii_lowercase()
                );
                self.pane_mut(category).set_error(message.clone());
                self.set_error(message);
                if category == ResourceCategory::Pods {
                    self.refresh_top();
                }
                return;
            }
        };

        let items = match payload {
            LoadPayload::Namespaces(names) => names.into_iter().map(ResourceItem::Namespace).collect(),
            LoadPayload::Deployments(list) => list.into_iter().map(ResourceItem::Deployment).collect(),
            LoadPayload::Pods(list) => list.into_iter().map(ResourceItem::Pod).collect(),
            LoadPayload::Services(list) => list.into_iter().map(ResourceItem::Service).collect(),
            other => {
                warn!(?other, "list load returned unexpected payload");
                return;
            }
        };

        let namespace = self.namespace.clone();
        let pane = self.pane_mut(category);
        pane.replace_items(items);
        if category == ResourceCategory::Namespaces {
            pane.select_title(&namespace);
        }
        self.last_refresh = Some(completed_at);

        if category == ResourceCategory::Pods {
            self.refresh_top();
            if self.status == REFRESHING_STATUS {
                let count = self.pane(category).len();
                self.set_status(format!("Loaded {count} pods from {}", self.namespace));
            }
        }
    }

    fn apply_content(&mut self, kind: LoadKind, outcome: Result<LoadPayload, String>) {
        let Some(context) = self.selection.clone() else {
            return;
        };

        let (tab, text) = match (kind, outcome) {
            (LoadKind::PodLogs { pod, .. }, Ok(LoadPayload::Logs(raw))) => {
                (Tab::Logs, content::logs(&pod, raw))
            }
            (LoadKind::PodLogs { .. }, Err(error)) => (Tab::Logs, format!("Error: {error}")),
            (LoadKind::PodMetrics { .. }, Ok(LoadPayload::Metrics(metrics))) => {
                (Tab::Stats, content::stats(&metrics))
            }
            (LoadKind::PodMetrics { pod, .. }, Err(error)) => {
                debug!(%pod, %error, "metrics unavailable");
                (Tab::Stats, content::metrics_unavailable(&pod))
            }
            (LoadKind::PodEnv { .. }, Ok(LoadPayload::Env(env))) => {
                (Tab::Env, content::env_listing(&env))
            }
            (LoadKind::PodEnv { .. }, Err(error)) => (
                Tab::Env,
                format!("Error loading environment variables: {error}"),
            ),
            (LoadKind::ResourceYaml { .. }, Ok(LoadPayload::Yaml(yaml))) => {
                (Tab::Config, content::config(&context, &yaml))
            }
            (LoadKind::ResourceYaml { .. }, Err(error)) => {
                (Tab::Config, format!("Error loading YAML: {error}"))
            }
            (kind, _) => {
                warn!(kind = kind.label(), "content load returned unexpected payload");
                return;
            }
        };
        let viewport = self.viewport_mut(tab);
        if tab == Tab::Logs {
            viewport.set_content(text);
        } else {
            viewport.reset(text);
        }
    }

    fn refresh_top(&mut self) {
        let text = {
            let pods = self
                .pane(ResourceCategory::Pods)
                .items()
                .iter()
                .filter_map(|item| match item {
                    ResourceItem::Pod(info) => Some(info),
                    _ => None,
                })
                .collect::<Vec<&PodInfo>>();
            content::top(&self.namespace, &pods)
        };
        self.viewport_mut(Tab::Top).set_content(text);
    }

    fn context_from_pane(&self, category: ResourceCategory) -> Option<SelectionContext> {
        let item = self.pane(category).selected_item()?;
        Some(SelectionContext {
            name: item.title().to_string(),
            kind: item.kind()?,
            namespace: self.namespace.clone(),
        })
    }

    fn selected_title(&self, category: ResourceCategory) -> Option<String> {
        self.pane(category)
            .selected_item()
            .map(|item| item.title().to_string())
    }

    fn pane_mut(&mut self, category: ResourceCategory) -> &mut ListPane {
        &mut self.panes[category.index()]
    }

    fn viewport_mut(&mut self, tab: Tab) -> &mut ContentViewport {
        &mut self.viewports[tab.index()]
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = normalize_status_text(message.into());
        self.last_error = None;
    }

    fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.status = normalize_status_text(message.clone());
        self.last_error = Some(message);
    }
}

fn normalize_status_text(message: String) -> String {
    let single_line = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= STATUS_MAX_CHARS {
        return single_line;
    }
    let mut out = single_line
        .chars()
        .take(STATUS_MAX_CHARS - 1)
        .collect::<String>();
    out.push('…');
    out
}
