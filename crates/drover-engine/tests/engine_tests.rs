#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use chrono::{Duration, Utc};
    use drover_core::{DroverError, Result};
    use drover_engine::{EngineFacade, EngineProbe};

    /// Probe whose answers and failure mode can be flipped from the test.
    #[derive(Default)]
    struct Flags {
        pathing: AtomicBool,
        builder: AtomicBool,
        mining: AtomicBool,
        failing: AtomicBool,
    }

    struct FakeProbe(Arc<Flags>);

    impl FakeProbe {
        fn get(&self, flag: &AtomicBool) -> Result<bool> {
            if self.0.failing.load(Ordering::SeqCst) {
                return Err(DroverError::Engine("introspection broke".into()));
            }
            Ok(flag.load(Ordering::SeqCst))
        }
    }

    impl EngineProbe for FakeProbe {
        fn is_pathing(&self) -> Result<bool> {
            self.get(&self.0.pathing)
        }
        fn is_builder_active(&self) -> Result<bool> {
            self.get(&self.0.builder)
        }
        fn is_mining_active(&self) -> Result<bool> {
            self.get(&self.0.mining)
        }
    }

    fn bound(flags: Arc<Flags>) -> EngineFacade {
        EngineFacade::new(Box::new(move || {
            Some(Box::new(FakeProbe(flags)) as Box<dyn EngineProbe>)
        }))
    }

    #[test]
    fn test_absent_engine_reports_inactive() {
        let mut facade = EngineFacade::absent();
        let now = Utc::now();
        assert!(!facade.is_pathing());
        assert!(!facade.is_builder_active(now));
        assert!(!facade.is_any_process_active(now));
        assert!(facade.last_active_at().is_none());
    }

    #[test]
    fn test_failed_bind_is_permanent_and_tried_once() {
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = attempts.clone();
        let mut facade = EngineFacade::new(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            None
        }));
        for _ in 0..5 {
            assert!(!facade.is_pathing());
        }
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_query_failure_swallowed_as_inactive() {
        let flags = Arc::new(Flags::default());
        flags.pathing.store(true, Ordering::SeqCst);
        flags.failing.store(true, Ordering::SeqCst);
        let mut facade = bound(flags.clone());
        assert!(!facade.is_pathing());

        // The same call succeeds once the probe recovers
        flags.failing.store(false, Ordering::SeqCst);
        assert!(facade.is_pathing());
    }

    #[test]
    fn test_last_active_tracks_any_process() {
        let flags = Arc::new(Flags::default());
        let mut facade = bound(flags.clone());
        let t0 = Utc::now();

        assert!(!facade.is_any_process_active(t0));
        assert!(facade.last_active_at().is_none());

        flags.mining.store(true, Ordering::SeqCst);
        let t1 = t0 + Duration::seconds(1);
        assert!(facade.is_any_process_active(t1));
        assert_eq!(facade.last_active_at(), Some(t1));

        // Going inactive preserves the last observation
        flags.mining.store(false, Ordering::SeqCst);
        let t2 = t1 + Duration::seconds(1);
        assert!(!facade.is_any_process_active(t2));
        assert_eq!(facade.last_active_at(), Some(t1));
    }

    #[test]
    fn test_tick_refreshes_last_active() {
        let flags = Arc::new(Flags::default());
        flags.builder.store(true, Ordering::SeqCst);
        let mut facade = bound(flags);
        let now = Utc::now();
        facade.tick(now);
        assert_eq!(facade.last_active_at(), Some(now));
    }
}
