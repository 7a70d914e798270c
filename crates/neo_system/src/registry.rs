//! System registry and frame scheduler.
//!
//! Systems run strictly in registration order, one at a time, every frame.
//! Each system moves through `Constructed → Initialized → Destroyed`; the
//! active flag is independent of that lifecycle and only decides whether
//! `update` is called.

use neo_component::ComponentStore;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::config::ErrorPolicy;
use crate::context::SystemContext;
use crate::error::SystemError;
use crate::system::System;

/// Handle to a registered system. Ids are dense and follow registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SystemId(pub u32);

impl SystemId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Lifecycle state of a registered system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemState {
    /// Registered, `init` not yet run (or failed under `Continue`).
    Constructed,
    /// `init` succeeded; eligible for updates while active.
    Initialized,
    /// `shutdown` has run. Terminal.
    Destroyed,
}

/// Outcome of one [`SystemRegistry::update_frame`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrameReport {
    /// Frame the report belongs to.
    pub frame: u64,
    /// Systems whose `update` ran and succeeded, in execution order.
    pub executed: Vec<SystemId>,
    /// Inactive systems that were passed over.
    pub skipped: Vec<SystemId>,
    /// Systems whose `init` or `update` failed under [`ErrorPolicy::Continue`].
    pub failed: Vec<SystemId>,
    /// Handler invocations during the frame's bus flush.
    pub delivered: usize,
}

/// One system's entry in an [`EditorSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemInspection {
    /// The system's id.
    pub id: SystemId,
    /// The system's name.
    pub name: &'static str,
    /// Lifecycle state at the time of the pass.
    pub state: SystemState,
    /// Whether the system is scheduled for updates.
    pub active: bool,
    /// Whatever the system reported from [`System::inspect`].
    pub details: Option<serde_json::Value>,
}

/// Read-only view of every initialized system, produced by the editor pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EditorSnapshot {
    /// Live entities at the time of the pass.
    pub entity_count: usize,
    /// Per-system entries, in registration order.
    pub systems: Vec<SystemInspection>,
}

impl EditorSnapshot {
    /// Look up a system's entry by name.
    #[must_use]
    pub fn system(&self, name: &str) -> Option<&SystemInspection> {
        self.systems.iter().find(|s| s.name == name)
    }
}

struct SystemEntry {
    name: &'static str,
    system: Box<dyn System>,
    state: SystemState,
    active: bool,
}

/// Ordered collection of systems plus the policy applied when one fails.
pub struct SystemRegistry {
    entries: Vec<SystemEntry>,
    policy: ErrorPolicy,
}

impl Default for SystemRegistry {
    fn default() -> Self {
        Self::new(ErrorPolicy::default())
    }
}

impl SystemRegistry {
    /// Create an empty registry with the given failure policy.
    #[must_use]
    pub fn new(policy: ErrorPolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
        }
    }

    /// The failure policy.
    #[must_use]
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Number of registered systems, destroyed ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no system has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a system. It runs after every system registered before it.
    pub fn add_system<S: System>(&mut self, system: S) -> SystemId {
        let id = SystemId(self.entries.len() as u32);
        let name = system.name();
        self.entries.push(SystemEntry {
            name,
            system: Box::new(system),
            state: SystemState::Constructed,
            active: true,
        });
        info!(system = name, id = id.0, "system registered");
        id
    }

    /// Typed access to a registered system.
    ///
    /// Returns `None` if `id` is unknown or the system is not an `S`.
    #[must_use]
    pub fn system<S: System>(&self, id: SystemId) -> Option<&S> {
        let entry = self.entries.get(id.index())?;
        let system: &dyn System = entry.system.as_ref();
        system.as_any().downcast_ref::<S>()
    }

    /// Typed mutable access to a registered system.
    pub fn system_mut<S: System>(&mut self, id: SystemId) -> Option<&mut S> {
        let entry = self.entries.get_mut(id.index())?;
        let system: &mut dyn System = entry.system.as_mut();
        system.as_any_mut().downcast_mut::<S>()
    }

    /// The name a system registered with.
    #[must_use]
    pub fn name(&self, id: SystemId) -> Option<&'static str> {
        self.entries.get(id.index()).map(|e| e.name)
    }

    /// Look up the first system registered under `name`.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<SystemId> {
        self.entries
            .iter()
            .position(|e| e.name == name)
            .map(|i| SystemId(i as u32))
    }

    /// Enable or disable a system's updates.
    ///
    /// # Errors
    ///
    /// [`SystemError::UnknownSystem`] for a bad id, [`SystemError::Destroyed`]
    /// once the system has been shut down.
    pub fn set_active(&mut self, id: SystemId, active: bool) -> Result<(), SystemError> {
        let entry = self
            .entries
            .get_mut(id.index())
            .ok_or(SystemError::UnknownSystem(id))?;
        if entry.state == SystemState::Destroyed {
            return Err(SystemError::Destroyed(entry.name));
        }
        if entry.active != active {
            entry.active = active;
            debug!(system = entry.name, active, "system activity changed");
        }
        Ok(())
    }

    /// Whether a system is scheduled for updates. Unknown ids are inactive.
    #[must_use]
    pub fn is_active(&self, id: SystemId) -> bool {
        self.entries.get(id.index()).is_some_and(|e| e.active)
    }

    /// Lifecycle state of a system.
    #[must_use]
    pub fn state(&self, id: SystemId) -> Option<SystemState> {
        self.entries.get(id.index()).map(|e| e.state)
    }

    /// Run `init` on every system still in `Constructed`, in order.
    ///
    /// Returns the number of systems that initialized successfully.
    ///
    /// # Errors
    ///
    /// Under [`ErrorPolicy::Halt`], the first failing system aborts the pass
    /// with [`SystemError::InitFailed`].
    pub fn init_all(&mut self, ctx: &mut SystemContext<'_>) -> Result<usize, SystemError> {
        let mut initialized = 0;
        for entry in &mut self.entries {
            if entry.state == SystemState::Constructed && init_entry(entry, ctx, self.policy)? {
                initialized += 1;
            }
        }
        Ok(initialized)
    }

    /// Run one frame: `update` every active system in registration order.
    ///
    /// Systems registered after [`init_all`](Self::init_all) are initialized
    /// right before their first update.
    ///
    /// # Errors
    ///
    /// Under [`ErrorPolicy::Halt`], the first failure aborts the frame with
    /// [`SystemError::InitFailed`] or [`SystemError::UpdateFailed`]; systems
    /// after it do not run.
    pub fn update_frame(&mut self, ctx: &mut SystemContext<'_>) -> Result<FrameReport, SystemError> {
        let mut report = FrameReport {
            frame: ctx.frame.frame,
            ..FrameReport::default()
        };

        for (index, entry) in self.entries.iter_mut().enumerate() {
            let id = SystemId(index as u32);
            if entry.state == SystemState::Destroyed {
                continue;
            }
            if !entry.active {
                debug!(system = entry.name, "inactive, skipped");
                report.skipped.push(id);
                continue;
            }
            if entry.state == SystemState::Constructed && !init_entry(entry, ctx, self.policy)? {
                report.failed.push(id);
                continue;
            }

            match entry.system.update(ctx) {
                Ok(()) => report.executed.push(id),
                Err(source) => match self.policy {
                    ErrorPolicy::Continue => {
                        error!(system = entry.name, frame = report.frame, error = %source, "system update failed");
                        report.failed.push(id);
                    }
                    ErrorPolicy::Halt => {
                        error!(system = entry.name, frame = report.frame, error = %source, "system update failed, halting frame");
                        return Err(SystemError::UpdateFailed {
                            system: entry.name,
                            frame: report.frame,
                            source,
                        });
                    }
                },
            }
        }

        Ok(report)
    }

    /// Collect [`System::inspect`] output from every initialized system.
    ///
    /// The store is only borrowed shared, so the pass can't change it.
    #[must_use]
    pub fn editor_pass(&self, store: &ComponentStore) -> EditorSnapshot {
        let systems = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.state == SystemState::Initialized)
            .map(|(index, e)| SystemInspection {
                id: SystemId(index as u32),
                name: e.name,
                state: e.state,
                active: e.active,
                details: e.system.inspect(store),
            })
            .collect();

        EditorSnapshot {
            entity_count: store.entity_count(),
            systems,
        }
    }

    /// Shut every system down in reverse registration order.
    ///
    /// Systems that were never initialized skip `shutdown` but still end up
    /// `Destroyed`. Returns the number of `shutdown` calls made.
    pub fn shutdown_all(&mut self, ctx: &mut SystemContext<'_>) -> usize {
        let mut calls = 0;
        for entry in self.entries.iter_mut().rev() {
            match entry.state {
                SystemState::Destroyed => continue,
                SystemState::Initialized => {
                    entry.system.shutdown(ctx);
                    calls += 1;
                }
                SystemState::Constructed => {}
            }
            entry.state = SystemState::Destroyed;
            entry.active = false;
            info!(system = entry.name, "system destroyed");
        }
        calls
    }
}

/// Returns `Ok(false)` when `init` failed and the policy says carry on.
fn init_entry(
    entry: &mut SystemEntry,
    ctx: &mut SystemContext<'_>,
    policy: ErrorPolicy,
) -> Result<bool, SystemError> {
    match entry.system.init(ctx) {
        Ok(()) => {
            entry.state = SystemState::Initialized;
            info!(system = entry.name, "system initialized");
            Ok(true)
        }
        Err(source) => match policy {
            ErrorPolicy::Continue => {
                // Stays Constructed; re-activating retries init.
                entry.active = false;
                error!(system = entry.name, error = %source, "system init failed, deactivated");
                Ok(false)
            }
            ErrorPolicy::Halt => {
                error!(system = entry.name, error = %source, "system init failed");
                Err(SystemError::InitFailed {
                    system: entry.name,
                    source,
                })
            }
        },
    }
}

impl std::fmt::Debug for SystemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemRegistry")
            .field(
                "systems",
                &self.entries.iter().map(|e| (e.name, e.state, e.active)).collect::<Vec<_>>(),
            )
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use neo_component::Component;
    use neo_message::MessageBus;
    use serde::Serialize;
    use serde_json::json;

    use super::*;
    use crate::config::WindowConfig;
    use crate::timer::FrameInfo;

    type Log = Rc<RefCell<Vec<String>>>;

    #[derive(Debug, Clone, Copy, PartialEq, Serialize)]
    struct Counter(u32);

    impl Component for Counter {
        fn type_name() -> &'static str {
            "Counter"
        }
    }

    /// Records every lifecycle call into a shared log.
    struct Probe {
        name: &'static str,
        log: Log,
        fail_init: bool,
        fail_update: bool,
    }

    impl Probe {
        fn new(name: &'static str, log: &Log) -> Self {
            Self {
                name,
                log: Rc::clone(log),
                fail_init: false,
                fail_update: false,
            }
        }
    }

    impl System for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn init(&mut self, _ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
            self.log.borrow_mut().push(format!("init:{}", self.name));
            if self.fail_init {
                anyhow::bail!("{} refused to start", self.name);
            }
            Ok(())
        }

        fn update(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
            self.log
                .borrow_mut()
                .push(format!("update:{}:{}", self.name, ctx.frame.frame));
            if self.fail_update {
                anyhow::bail!("{} broke", self.name);
            }
            Ok(())
        }

        fn inspect(&self, _store: &ComponentStore) -> Option<serde_json::Value> {
            Some(json!({ "name": self.name }))
        }

        fn shutdown(&mut self, _ctx: &mut SystemContext<'_>) {
            self.log.borrow_mut().push(format!("shutdown:{}", self.name));
        }
    }

    /// Bumps every `Counter` once per update.
    struct Increment;

    impl System for Increment {
        fn name(&self) -> &'static str {
            "increment"
        }

        fn update(&mut self, ctx: &mut SystemContext<'_>) -> anyhow::Result<()> {
            for counter in ctx.store.get_components_mut::<Counter>() {
                counter.0 += 1;
            }
            Ok(())
        }
    }

    fn frame(n: u64) -> FrameInfo {
        FrameInfo {
            frame: n,
            dt: 1.0 / 60.0,
            ..FrameInfo::default()
        }
    }

    fn run_frame(
        registry: &mut SystemRegistry,
        store: &mut ComponentStore,
        bus: &mut MessageBus,
        n: u64,
    ) -> Result<FrameReport, SystemError> {
        let mut ctx = SystemContext::new(store, bus, frame(n), WindowConfig::default());
        registry.update_frame(&mut ctx)
    }

    fn taken(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.borrow_mut())
    }

    #[test]
    fn test_registration_order_is_execution_order() {
        let log = Log::default();
        let mut registry = SystemRegistry::default();
        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        let s1 = registry.add_system(Probe::new("s1", &log));
        let s2 = registry.add_system(Probe::new("s2", &log));
        let s3 = registry.add_system(Probe::new("s3", &log));

        {
            let mut ctx = SystemContext::new(&mut store, &mut bus, frame(0), WindowConfig::default());
            assert_eq!(registry.init_all(&mut ctx).unwrap(), 3);
        }
        assert_eq!(taken(&log), vec!["init:s1", "init:s2", "init:s3"]);

        for n in 1..=3 {
            let report = run_frame(&mut registry, &mut store, &mut bus, n).unwrap();
            assert_eq!(report.executed, vec![s1, s2, s3]);
        }
        let expected: Vec<String> = (1..=3)
            .flat_map(|n| ["s1", "s2", "s3"].map(|s| format!("update:{s}:{n}")))
            .collect();
        assert_eq!(taken(&log), expected);
    }

    #[test]
    fn test_deactivated_system_is_skipped() {
        let log = Log::default();
        let mut registry = SystemRegistry::default();
        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        let s1 = registry.add_system(Probe::new("s1", &log));
        let s2 = registry.add_system(Probe::new("s2", &log));
        let s3 = registry.add_system(Probe::new("s3", &log));
        run_frame(&mut registry, &mut store, &mut bus, 1).unwrap();
        taken(&log);

        registry.set_active(s2, false).unwrap();
        assert!(!registry.is_active(s2));
        let report = run_frame(&mut registry, &mut store, &mut bus, 2).unwrap();
        assert_eq!(report.executed, vec![s1, s3]);
        assert_eq!(report.skipped, vec![s2]);
        assert_eq!(taken(&log), vec!["update:s1:2", "update:s3:2"]);

        registry.set_active(s2, true).unwrap();
        run_frame(&mut registry, &mut store, &mut bus, 3).unwrap();
        assert_eq!(taken(&log), vec!["update:s1:3", "update:s2:3", "update:s3:3"]);
    }

    #[test]
    fn test_inactive_system_makes_no_mutation() {
        let mut registry = SystemRegistry::default();
        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        let e = store.create_entity();
        store.add_component(e, Counter(0)).unwrap();
        let id = registry.add_system(Increment);

        run_frame(&mut registry, &mut store, &mut bus, 1).unwrap();
        assert_eq!(store.get_component::<Counter>(e), Some(&Counter(1)));

        registry.set_active(id, false).unwrap();
        run_frame(&mut registry, &mut store, &mut bus, 2).unwrap();
        run_frame(&mut registry, &mut store, &mut bus, 3).unwrap();
        assert_eq!(store.get_component::<Counter>(e), Some(&Counter(1)));
    }

    #[test]
    fn test_late_system_is_initialized_lazily() {
        let log = Log::default();
        let mut registry = SystemRegistry::default();
        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        registry.add_system(Probe::new("early", &log));
        {
            let mut ctx = SystemContext::new(&mut store, &mut bus, frame(0), WindowConfig::default());
            registry.init_all(&mut ctx).unwrap();
        }
        let late = registry.add_system(Probe::new("late", &log));
        assert_eq!(registry.state(late), Some(SystemState::Constructed));
        taken(&log);

        run_frame(&mut registry, &mut store, &mut bus, 1).unwrap();
        assert_eq!(taken(&log), vec!["update:early:1", "init:late", "update:late:1"]);
        assert_eq!(registry.state(late), Some(SystemState::Initialized));

        // init runs exactly once.
        run_frame(&mut registry, &mut store, &mut bus, 2).unwrap();
        assert_eq!(taken(&log), vec!["update:early:2", "update:late:2"]);
    }

    #[test]
    fn test_continue_policy_runs_remaining_systems() {
        let log = Log::default();
        let mut registry = SystemRegistry::new(ErrorPolicy::Continue);
        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        let s1 = registry.add_system(Probe {
            fail_update: true,
            ..Probe::new("s1", &log)
        });
        let s2 = registry.add_system(Probe::new("s2", &log));

        let report = run_frame(&mut registry, &mut store, &mut bus, 1).unwrap();
        assert_eq!(report.failed, vec![s1]);
        assert_eq!(report.executed, vec![s2]);
        // A failed update leaves the system scheduled.
        assert!(registry.is_active(s1));
    }

    #[test]
    fn test_halt_policy_aborts_frame() {
        let log = Log::default();
        let mut registry = SystemRegistry::new(ErrorPolicy::Halt);
        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        registry.add_system(Probe {
            fail_update: true,
            ..Probe::new("s1", &log)
        });
        registry.add_system(Probe::new("s2", &log));

        let err = run_frame(&mut registry, &mut store, &mut bus, 1).unwrap_err();
        match err {
            SystemError::UpdateFailed { system, frame, .. } => {
                assert_eq!(system, "s1");
                assert_eq!(frame, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!taken(&log).iter().any(|l| l.starts_with("update:s2")));
    }

    #[test]
    fn test_failed_init_under_continue_deactivates() {
        let log = Log::default();
        let mut registry = SystemRegistry::new(ErrorPolicy::Continue);
        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        let bad = registry.add_system(Probe {
            fail_init: true,
            ..Probe::new("bad", &log)
        });
        let good = registry.add_system(Probe::new("good", &log));

        let report = run_frame(&mut registry, &mut store, &mut bus, 1).unwrap();
        assert_eq!(report.failed, vec![bad]);
        assert_eq!(report.executed, vec![good]);
        assert!(!registry.is_active(bad));
        assert_eq!(registry.state(bad), Some(SystemState::Constructed));
        assert!(!taken(&log).contains(&"update:bad:1".to_string()));
    }

    #[test]
    fn test_failed_init_under_halt() {
        let log = Log::default();
        let mut registry = SystemRegistry::new(ErrorPolicy::Halt);
        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        registry.add_system(Probe {
            fail_init: true,
            ..Probe::new("bad", &log)
        });
        let mut ctx = SystemContext::new(&mut store, &mut bus, frame(0), WindowConfig::default());
        let err = registry.init_all(&mut ctx).unwrap_err();
        assert!(matches!(err, SystemError::InitFailed { system: "bad", .. }));
    }

    #[test]
    fn test_shutdown_runs_in_reverse_and_destroys() {
        let log = Log::default();
        let mut registry = SystemRegistry::default();
        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        let a = registry.add_system(Probe::new("a", &log));
        registry.add_system(Probe::new("b", &log));
        let c = registry.add_system(Probe::new("c", &log));
        {
            let mut ctx = SystemContext::new(&mut store, &mut bus, frame(0), WindowConfig::default());
            registry.init_all(&mut ctx).unwrap();
            taken(&log);
            assert_eq!(registry.shutdown_all(&mut ctx), 3);
        }
        assert_eq!(taken(&log), vec!["shutdown:c", "shutdown:b", "shutdown:a"]);
        assert_eq!(registry.state(a), Some(SystemState::Destroyed));
        assert!(!registry.is_active(c));

        // Destroyed systems never run again.
        assert!(matches!(
            registry.set_active(a, true),
            Err(SystemError::Destroyed("a"))
        ));
        let report = run_frame(&mut registry, &mut store, &mut bus, 1).unwrap();
        assert!(report.executed.is_empty());
        assert!(taken(&log).is_empty());
    }

    #[test]
    fn test_editor_pass_lists_initialized_systems() {
        let log = Log::default();
        let mut registry = SystemRegistry::default();
        let mut store = ComponentStore::new();
        let mut bus = MessageBus::new();
        store.create_entity();
        registry.add_system(Probe::new("a", &log));
        {
            let mut ctx = SystemContext::new(&mut store, &mut bus, frame(0), WindowConfig::default());
            registry.init_all(&mut ctx).unwrap();
        }
        registry.add_system(Probe::new("pending", &log));

        let snapshot = registry.editor_pass(&store);
        assert_eq!(snapshot.entity_count, 1);
        assert_eq!(snapshot.systems.len(), 1);
        let a = snapshot.system("a").unwrap();
        assert_eq!(a.details, Some(json!({ "name": "a" })));
        assert!(snapshot.system("pending").is_none());
    }

    #[test]
    fn test_typed_access() {
        let log = Log::default();
        let mut registry = SystemRegistry::default();
        let probe = registry.add_system(Probe::new("probe", &log));
        let inc = registry.add_system(Increment);

        assert_eq!(registry.system::<Probe>(probe).map(|p| p.name), Some("probe"));
        assert!(registry.system::<Probe>(inc).is_none());
        registry.system_mut::<Probe>(probe).unwrap().fail_update = true;
        assert!(registry.system::<Probe>(probe).unwrap().fail_update);
        assert_eq!(registry.find("increment"), Some(inc));
        assert!(registry.system::<Increment>(SystemId(9)).is_none());
        assert!(matches!(
            registry.set_active(SystemId(9), false),
            Err(SystemError::UnknownSystem(SystemId(9)))
        ));
    }
}
