use chrono::{DateTime, Utc};
use tracing::debug;

use drover_core::Result;

/// Capability surface of a bound engine. Implementations wrap whatever
/// introspection the concrete engine exposes; every query is allowed to
/// fail and the facade treats a failure as "inactive" for that call.
pub trait EngineProbe: Send {
    /// Whether the engine is actively pathing toward a goal.
    fn is_pathing(&self) -> Result<bool>;

    /// Whether the engine's builder process is running.
    fn is_builder_active(&self) -> Result<bool>;

    /// Whether the engine's mining process is running.
    fn is_mining_active(&self) -> Result<bool>;
}

/// One-shot binder invoked lazily on first use. Returning `None` means the
/// engine is absent, permanently, for this process lifetime.
pub type EngineBinder = Box<dyn FnOnce() -> Option<Box<dyn EngineProbe>> + Send>;

enum Binding {
    Untried(EngineBinder),
    Unbound,
    Bound(Box<dyn EngineProbe>),
}

/// Defensive facade over an optionally-present engine.
///
/// Callers never see binding or query failures: an unbound engine answers
/// "false" to everything, and so does any individual query that errors.
pub struct EngineFacade {
    binding: Binding,
    last_active_at: Option<DateTime<Utc>>,
}

impl EngineFacade {
    pub fn new(binder: EngineBinder) -> Self {
        Self {
            binding: Binding::Untried(binder),
            last_active_at: None,
        }
    }

    /// A facade over no engine at all. Every query reports inactive.
    pub fn absent() -> Self {
        Self {
            binding: Binding::Unbound,
            last_active_at: None,
        }
    }

    fn probe(&mut self) -> Option<&dyn EngineProbe> {
        if let Binding::Untried(_) = self.binding {
            let binder = match std::mem::replace(&mut self.binding, Binding::Unbound) {
                Binding::Untried(b) => b,
                _ => unreachable!(),
            };
            match binder() {
                Some(p) => {
                    debug!("engine capability bound");
                    self.binding = Binding::Bound(p);
                }
                None => {
                    debug!("engine absent; all capability queries will report inactive");
                }
            }
        }
        match &self.binding {
            Binding::Bound(p) => Some(p.as_ref()),
            _ => None,
        }
    }

    pub fn is_pathing(&mut self) -> bool {
        self.probe()
            .map(|p| p.is_pathing().unwrap_or(false))
            .unwrap_or(false)
    }

    pub fn is_builder_active(&mut self, now: DateTime<Utc>) -> bool {
        let active = self
            .probe()
            .map(|p| p.is_builder_active().unwrap_or(false))
            .unwrap_or(false);
        if active {
            self.last_active_at = Some(now);
        }
        active
    }

    /// Whether any background process (builder or mining) is running.
    pub fn is_any_process_active(&mut self, now: DateTime<Utc>) -> bool {
        let mut active = self.is_builder_active(now);
        active |= self
            .probe()
            .map(|p| p.is_mining_active().unwrap_or(false))
            .unwrap_or(false);
        if active {
            self.last_active_at = Some(now);
        }
        active
    }

    /// When any active-process query last observed a "true", if ever.
    pub fn last_active_at(&self) -> Option<DateTime<Utc>> {
        self.last_active_at
    }

    /// Per-tick refresh of the last-active bookkeeping.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.is_any_process_active(now);
    }
}
