//! Plugin prerequisites: checks and install/uninstall steps that run off the update thread.
//!
//! Progress is published through atomic flags that the host polls; nothing here touches
//! node scripts or condition trees.

use crate::error::PrerequisiteError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// One step of installing or uninstalling a prerequisite.
///
/// Runs on a blocking thread. Long steps should poll `token` and return early when it is
/// cancelled.
pub trait PrerequisiteAction: Send + Sync {
    fn name(&self) -> &str;
    fn execute(&self, token: &CancellationToken) -> Result<(), String>;
}

struct FnAction<F> {
    name: String,
    run: F,
}

impl<F> PrerequisiteAction for FnAction<F>
where
    F: Fn(&CancellationToken) -> Result<(), String> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, token: &CancellationToken) -> Result<(), String> {
        (self.run)(token)
    }
}

/// Wraps a closure as an action.
pub fn action<F>(name: impl Into<String>, run: F) -> Arc<dyn PrerequisiteAction>
where
    F: Fn(&CancellationToken) -> Result<(), String> + Send + Sync + 'static,
{
    Arc::new(FnAction {
        name: name.into(),
        run,
    })
}

type Check = Arc<dyn Fn() -> bool + Send + Sync>;

/// Something a plugin needs before it can be enabled, e.g. a driver or runtime.
#[derive(Clone)]
pub struct Prerequisite {
    name: String,
    check: Check,
    install_actions: Vec<Arc<dyn PrerequisiteAction>>,
    uninstall_actions: Vec<Arc<dyn PrerequisiteAction>>,
}

impl Prerequisite {
    pub fn new<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            check: Arc::new(check),
            install_actions: Vec::new(),
            uninstall_actions: Vec::new(),
        }
    }

    pub fn with_install_action(mut self, action: Arc<dyn PrerequisiteAction>) -> Self {
        self.install_actions.push(action);
        self
    }

    pub fn with_uninstall_action(mut self, action: Arc<dyn PrerequisiteAction>) -> Self {
        self.uninstall_actions.push(action);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn install_actions(&self) -> &[Arc<dyn PrerequisiteAction>] {
        &self.install_actions
    }

    pub fn uninstall_actions(&self) -> &[Arc<dyn PrerequisiteAction>] {
        &self.uninstall_actions
    }

    /// Runs the check on the calling thread. May be slow.
    pub fn is_met(&self) -> bool {
        (self.check)()
    }
}

impl std::fmt::Debug for Prerequisite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prerequisite")
            .field("name", &self.name)
            .field("install_actions", &self.install_actions.len())
            .field("uninstall_actions", &self.uninstall_actions.len())
            .finish()
    }
}

const IDLE: u8 = 0;
const INSTALLING: u8 = 1;
const UNINSTALLING: u8 = 2;
const NO_STEP: usize = usize::MAX;

#[derive(Debug)]
struct HandleState {
    prerequisite: Prerequisite,
    is_met: AtomicBool,
    phase: AtomicU8,
    active_step: AtomicUsize,
}

/// Releases the busy phase on every exit path.
struct PhaseGuard(Arc<HandleState>);

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        self.0.active_step.store(NO_STEP, Ordering::Release);
        self.0.phase.store(IDLE, Ordering::Release);
    }
}

/// Shared, pollable state of one prerequisite.
#[derive(Debug, Clone)]
pub struct PrerequisiteHandle {
    state: Arc<HandleState>,
}

impl PrerequisiteHandle {
    pub fn new(prerequisite: Prerequisite) -> Self {
        Self {
            state: Arc::new(HandleState {
                prerequisite,
                is_met: AtomicBool::new(false),
                phase: AtomicU8::new(IDLE),
                active_step: AtomicUsize::new(NO_STEP),
            }),
        }
    }

    pub fn prerequisite(&self) -> &Prerequisite {
        &self.state.prerequisite
    }

    /// The result of the last completed check.
    pub fn is_met(&self) -> bool {
        self.state.is_met.load(Ordering::Acquire)
    }

    pub fn installing(&self) -> bool {
        self.state.phase.load(Ordering::Acquire) == INSTALLING
    }

    pub fn uninstalling(&self) -> bool {
        self.state.phase.load(Ordering::Acquire) == UNINSTALLING
    }

    pub fn busy(&self) -> bool {
        self.state.phase.load(Ordering::Acquire) != IDLE
    }

    /// Index of the action currently running.
    pub fn active_step(&self) -> Option<usize> {
        match self.state.active_step.load(Ordering::Acquire) {
            NO_STEP => None,
            step => Some(step),
        }
    }

    /// Runs the check on the blocking pool and publishes the result.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn_check(&self) -> JoinHandle<bool> {
        let state = Arc::clone(&self.state);
        tokio::task::spawn_blocking(move || {
            let met = state.prerequisite.is_met();
            state.is_met.store(met, Ordering::Release);
            debug!(prerequisite = %state.prerequisite.name(), met, "prerequisite checked");
            met
        })
    }

    /// Runs the install actions in order.
    ///
    /// Refuses with [`PrerequisiteError::Busy`] while another install or uninstall runs.
    /// Stops at the first failing action or at cancellation. The met flag is re-checked
    /// afterwards either way.
    pub async fn install(&self, token: CancellationToken) -> Result<(), PrerequisiteError> {
        self.run(INSTALLING, token).await
    }

    /// Runs the uninstall actions in order. Same rules as [`PrerequisiteHandle::install`].
    pub async fn uninstall(&self, token: CancellationToken) -> Result<(), PrerequisiteError> {
        self.run(UNINSTALLING, token).await
    }

    async fn run(&self, phase: u8, token: CancellationToken) -> Result<(), PrerequisiteError> {
        let name = self.state.prerequisite.name().to_string();
        if self
            .state
            .phase
            .compare_exchange(IDLE, phase, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PrerequisiteError::Busy(name));
        }
        let guard = PhaseGuard(Arc::clone(&self.state));
        debug!(prerequisite = %name, installing = phase == INSTALLING, "prerequisite task started");

        let task = tokio::task::spawn_blocking(move || {
            let state = Arc::clone(&guard.0);
            let prerequisite = &state.prerequisite;
            let actions = if phase == INSTALLING {
                prerequisite.install_actions()
            } else {
                prerequisite.uninstall_actions()
            };
            let result = run_actions(&state, actions, &token);
            state.is_met.store(prerequisite.is_met(), Ordering::Release);
            drop(guard);
            result
        });

        let result = task.await.unwrap_or_else(|e| {
            Err(PrerequisiteError::TaskFailed {
                prerequisite: name.clone(),
                message: e.to_string(),
            })
        });
        match &result {
            Ok(()) => debug!(prerequisite = %name, "prerequisite task finished"),
            Err(err) => warn!(prerequisite = %name, error = %err, "prerequisite task stopped"),
        }
        result
    }
}

fn run_actions(
    state: &HandleState,
    actions: &[Arc<dyn PrerequisiteAction>],
    token: &CancellationToken,
) -> Result<(), PrerequisiteError> {
    let name = state.prerequisite.name();
    for (step, action) in actions.iter().enumerate() {
        if token.is_cancelled() {
            return Err(PrerequisiteError::Cancelled(name.to_string()));
        }
        state.active_step.store(step, Ordering::Release);
        action
            .execute(token)
            .map_err(|message| PrerequisiteError::ActionFailed {
                prerequisite: name.to_string(),
                action: action.name().to_string(),
                message,
            })?;
    }
    Ok(())
}
