//! In-memory fake adapters for unit tests.
//!
//! Each fake shares its state through an `Arc<Mutex<_>>` handle so a test
//! can keep mutating and inspecting it after the adapter has been boxed
//! into a [`ServiceContext`].

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use crate::context::ServiceContext;
use crate::endpoint::EndpointTarget;
use crate::ports::clock::Clock;
use crate::ports::containers::{ContainerInfo, ContainerOrchestrator, ContainerStatus};
use crate::ports::filesystem::FileSystem;
use crate::ports::host::HostManager;
use crate::ports::id_gen::IdGenerator;
use crate::ports::net::{EndpointProber, ProbeFuture, Reachability};
use crate::ports::shell::{ShellExecutor, ShellOutput};
use crate::ports::PortError;

/// Scripted response for one shell command.
#[derive(Debug, Clone)]
pub enum ShellScript {
    /// The command runs and exits with the given code and stdout.
    Exits {
        /// Exit code to report.
        code: i32,
        /// Stdout to report.
        stdout: String,
    },
    /// The command cannot be invoked at all.
    FailsToSpawn(String),
}

/// Shell executor that replays scripted outputs keyed by exact command.
pub struct FakeShell {
    /// Scripted command table.
    pub scripts: Arc<Mutex<HashMap<String, ShellScript>>>,
}

impl ShellExecutor for FakeShell {
    fn run(&self, command: &str, _timeout: Duration) -> Result<ShellOutput, PortError> {
        let scripts = self.scripts.lock().unwrap();
        match scripts.get(command) {
            Some(ShellScript::Exits { code, stdout }) => Ok(ShellOutput {
                exit_code: *code,
                stdout: stdout.clone(),
                stderr: String::new(),
            }),
            Some(ShellScript::FailsToSpawn(reason)) => Err(reason.clone().into()),
            None => Err(format!("no scripted output for command: {command}").into()),
        }
    }
}

/// Mutable host state behind [`FakeHost`].
#[derive(Debug, Default)]
pub struct HostState {
    /// Installed package names.
    pub installed: HashSet<String>,
    /// Active service names.
    pub active: HashSet<String>,
    /// Whether the caller is root.
    pub root: bool,
    /// Packages whose installation should fail, with a reason.
    pub failing_installs: HashMap<String, String>,
    /// Services whose start should fail, with a reason.
    pub failing_starts: HashMap<String, String>,
}

/// Host manager over in-memory package/service sets. `install` and
/// `start` mutate the sets, so remediation convergence is observable.
pub struct FakeHost {
    /// Shared host state.
    pub state: Arc<Mutex<HostState>>,
    /// Shared shell script table; installing a package also makes its
    /// binary resolvable via `command -v`.
    pub shell: Arc<Mutex<HashMap<String, ShellScript>>>,
}

impl HostManager for FakeHost {
    fn is_installed(&self, package: &str) -> Result<bool, PortError> {
        Ok(self.state.lock().unwrap().installed.contains(package))
    }

    fn install(&self, package: &str) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.failing_installs.get(package) {
            return Err(reason.clone().into());
        }
        state.installed.insert(package.to_string());
        self.shell.lock().unwrap().insert(
            format!("command -v {package}"),
            ShellScript::Exits { code: 0, stdout: format!("/usr/bin/{package}") },
        );
        Ok(())
    }

    fn is_active(&self, service: &str) -> Result<bool, PortError> {
        Ok(self.state.lock().unwrap().active.contains(service))
    }

    fn start(&self, service: &str) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = state.failing_starts.get(service) {
            return Err(reason.clone().into());
        }
        state.active.insert(service.to_string());
        Ok(())
    }

    fn is_root(&self) -> bool {
        self.state.lock().unwrap().root
    }
}

/// Mutable container state behind [`FakeContainers`].
#[derive(Debug, Default)]
pub struct ContainersState {
    /// Status per container name.
    pub statuses: HashMap<String, ContainerStatus>,
    /// When set, `apply_declared_state` fails with this reason.
    pub apply_failure: Option<String>,
    /// Number of times `apply_declared_state` has been called.
    pub apply_calls: u32,
}

/// Orchestrator whose `apply_declared_state` brings every known
/// container up.
pub struct FakeContainers {
    /// Shared container state.
    pub state: Arc<Mutex<ContainersState>>,
}

impl ContainerOrchestrator for FakeContainers {
    fn status(&self, name: &str) -> Result<ContainerStatus, PortError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .statuses
            .get(name)
            .copied()
            .unwrap_or(ContainerStatus::Down))
    }

    fn apply_declared_state(&self) -> Result<(), PortError> {
        let mut state = self.state.lock().unwrap();
        state.apply_calls += 1;
        if let Some(reason) = &state.apply_failure {
            return Err(reason.clone().into());
        }
        for status in state.statuses.values_mut() {
            *status = ContainerStatus::Up;
        }
        Ok(())
    }

    fn ps(&self) -> Result<Vec<ContainerInfo>, PortError> {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<ContainerInfo> = state
            .statuses
            .iter()
            .map(|(name, status)| ContainerInfo {
                name: name.clone(),
                status: format!("{status:?}"),
                ports: String::new(),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}

/// Mutable filesystem state behind [`FakeFileSystem`].
#[derive(Debug, Default)]
pub struct FsState {
    /// File contents by path.
    pub files: HashMap<PathBuf, String>,
    /// Existing directories.
    pub dirs: HashSet<PathBuf>,
}

/// In-memory filesystem.
pub struct FakeFileSystem {
    /// Shared filesystem state.
    pub state: Arc<Mutex<FsState>>,
}

impl FileSystem for FakeFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String, PortError> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| format!("no such file: {}", path.display()).into())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), PortError> {
        self.state.lock().unwrap().files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), PortError> {
        self.state.lock().unwrap().dirs.insert(path.to_path_buf());
        Ok(())
    }
}

/// Scripted behavior for one endpoint target.
#[derive(Debug, Clone)]
pub enum ProberScript {
    /// Reachable from the given attempt number onward (1-based).
    HealthyAfter(u32),
    /// Never reachable.
    Never,
}

/// Mutable prober state behind [`FakeProber`].
#[derive(Debug, Default)]
pub struct ProberState {
    /// Script per target key (URL or address).
    pub scripts: HashMap<String, ProberScript>,
    /// Attempts seen per target key.
    pub attempts: HashMap<String, u32>,
}

/// Endpoint prober that replays scripted reachability per target.
pub struct FakeProber {
    /// Shared prober state.
    pub state: Arc<Mutex<ProberState>>,
}

impl EndpointProber for FakeProber {
    fn probe(&self, target: &EndpointTarget) -> ProbeFuture<'_> {
        let key = target.key().to_string();
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut state = state.lock().unwrap();
            let attempt = state.attempts.entry(key.clone()).or_insert(0);
            *attempt += 1;
            let attempt = *attempt;
            match state.scripts.get(&key) {
                Some(ProberScript::HealthyAfter(n)) if attempt >= *n => Reachability::Reachable,
                Some(_) => Reachability::Unreachable { reason: "not yet up".into() },
                None => Reachability::Unreachable { reason: "unscripted target".into() },
            }
        })
    }
}

/// Clock that starts at a fixed instant and advances by a fixed step on
/// every `now()` call.
pub struct FakeClock {
    current: Mutex<DateTime<Utc>>,
    step: chrono::Duration,
}

impl FakeClock {
    /// Creates a clock advancing by `step` per `now()` call.
    pub fn stepping(step: chrono::Duration) -> Self {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Self { current: Mutex::new(start), step }
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock().unwrap();
        let now = *current;
        *current += self.step;
        now
    }
}

/// ID generator returning a fixed id.
pub struct FixedIdGenerator(pub String);

impl IdGenerator for FixedIdGenerator {
    fn generate_id(&self) -> String {
        self.0.clone()
    }
}

/// Handles to every fake's shared state, kept by the test.
pub struct FakeHandles {
    /// Shell script table.
    pub shell: Arc<Mutex<HashMap<String, ShellScript>>>,
    /// Host state.
    pub host: Arc<Mutex<HostState>>,
    /// Container state.
    pub containers: Arc<Mutex<ContainersState>>,
    /// Filesystem state.
    pub fs: Arc<Mutex<FsState>>,
    /// Prober state.
    pub prober: Arc<Mutex<ProberState>>,
}

/// Builds a context wired entirely to fakes, plus handles for scripting
/// and inspection. The clock advances 10ms per reading so durations are
/// nonzero but deterministic.
pub fn context() -> (ServiceContext, FakeHandles) {
    let shell = Arc::new(Mutex::new(HashMap::new()));
    let host = Arc::new(Mutex::new(HostState::default()));
    let containers = Arc::new(Mutex::new(ContainersState::default()));
    let fs = Arc::new(Mutex::new(FsState::default()));
    let prober = Arc::new(Mutex::new(ProberState::default()));

    let ctx = ServiceContext {
        clock: Box::new(FakeClock::stepping(chrono::Duration::milliseconds(10))),
        shell: Box::new(FakeShell { scripts: Arc::clone(&shell) }),
        host: Box::new(FakeHost { state: Arc::clone(&host), shell: Arc::clone(&shell) }),
        containers: Box::new(FakeContainers { state: Arc::clone(&containers) }),
        fs: Box::new(FakeFileSystem { state: Arc::clone(&fs) }),
        net: Arc::new(FakeProber { state: Arc::clone(&prober) }),
        id_gen: Box::new(FixedIdGenerator("run-test".into())),
    };

    let handles = FakeHandles { shell, host, containers, fs, prober };
    (ctx, handles)
}
