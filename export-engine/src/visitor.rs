// Copyright (c) James Kassemi, SC, US. All rights reserved.
use std::{collections::HashSet, sync::Arc};

use core_types::{Block, Revision};
use log::{debug, warn};
use parking_lot::Mutex;

use crate::{
    errors::{RunError, VisitorError},
    tables::TableRef,
};

/// Lifecycle shared by both visitor kinds. `setup` runs once before the first block of a
/// run and `teardown` once after it ends, whether the run succeeded or not.
pub trait Visitor: Send {
    fn name(&self) -> &str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }

    fn setup(&mut self) -> Result<(), VisitorError> {
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), VisitorError> {
        Ok(())
    }
}

pub trait BlockVisitor: Visitor {
    fn visit_block(&mut self, block: &Block) -> Result<(), VisitorError>;
}

pub trait RevisionVisitor: Visitor {
    fn visit_revision(
        &mut self,
        revision: Revision<'_>,
        table: TableRef<'_>,
    ) -> Result<(), VisitorError>;
}

pub type SharedBlockVisitor = Arc<Mutex<dyn BlockVisitor>>;
pub type SharedRevisionVisitor = Arc<Mutex<dyn RevisionVisitor>>;

/// Wraps a visitor so the caller can keep a handle for reading results after the run.
pub fn shared<V>(visitor: V) -> Arc<Mutex<V>> {
    Arc::new(Mutex::new(visitor))
}

/// Ordered block and revision visitors for one engine.
#[derive(Clone, Default)]
pub struct VisitorSet {
    block: Vec<SharedBlockVisitor>,
    revision: Vec<SharedRevisionVisitor>,
}

impl VisitorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block_visitor(&mut self, visitor: SharedBlockVisitor) -> &mut Self {
        self.block.push(visitor);
        self
    }

    pub fn add_revision_visitor(&mut self, visitor: SharedRevisionVisitor) -> &mut Self {
        self.revision.push(visitor);
        self
    }

    pub fn with_block_visitor(mut self, visitor: SharedBlockVisitor) -> Self {
        self.add_block_visitor(visitor);
        self
    }

    pub fn with_revision_visitor(mut self, visitor: SharedRevisionVisitor) -> Self {
        self.add_revision_visitor(visitor);
        self
    }

    pub fn block_visitors(&self) -> &[SharedBlockVisitor] {
        &self.block
    }

    pub fn revision_visitors(&self) -> &[SharedRevisionVisitor] {
        &self.revision
    }

    pub fn has_revision_visitors(&self) -> bool {
        !self.revision.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.block.is_empty() && self.revision.is_empty()
    }

    /// Revision visitors first, then block visitors; an instance registered under both
    /// kinds appears once.
    fn members(&self) -> Vec<Member> {
        let mut seen = HashSet::new();
        let revisions = self
            .revision
            .iter()
            .filter(|v| seen.insert(Arc::as_ptr(*v) as *const () as usize))
            .cloned()
            .map(Member::Revision)
            .collect::<Vec<_>>();
        let blocks = self
            .block
            .iter()
            .filter(|v| seen.insert(Arc::as_ptr(*v) as *const () as usize))
            .cloned()
            .map(Member::Block);
        revisions.into_iter().chain(blocks).collect()
    }

    /// Starts a lifecycle. Teardown runs when the guard is finished or dropped.
    pub fn lifecycle(&self, label: &str) -> LifecycleGuard {
        LifecycleGuard {
            members: self.members(),
            label: label.to_string(),
            torn_down: false,
        }
    }
}

#[derive(Clone)]
enum Member {
    Block(SharedBlockVisitor),
    Revision(SharedRevisionVisitor),
}

impl Member {
    fn name(&self) -> String {
        match self {
            Member::Block(v) => v.lock().name().to_string(),
            Member::Revision(v) => v.lock().name().to_string(),
        }
    }

    fn setup(&self) -> Result<(), VisitorError> {
        match self {
            Member::Block(v) => v.lock().setup(),
            Member::Revision(v) => v.lock().setup(),
        }
    }

    fn teardown(&self) -> Result<(), VisitorError> {
        match self {
            Member::Block(v) => v.lock().teardown(),
            Member::Revision(v) => v.lock().teardown(),
        }
    }
}

/// A teardown that failed, reported after every visitor has been torn down.
#[derive(Debug)]
pub struct TeardownFailure {
    pub visitor: String,
    pub error: VisitorError,
}

/// Holds a run's visitors between setup and teardown.
pub struct LifecycleGuard {
    members: Vec<Member>,
    label: String,
    torn_down: bool,
}

impl LifecycleGuard {
    /// Sets up every visitor in order, stopping at the first failure. Teardown still
    /// covers all of them.
    pub fn setup(&mut self) -> Result<(), RunError> {
        for member in &self.members {
            if let Err(source) = member.setup() {
                return Err(RunError::Setup {
                    visitor: member.name(),
                    source,
                });
            }
        }
        debug!("[{}] {} visitors set up", self.label, self.members.len());
        Ok(())
    }

    pub fn finish(mut self) -> Vec<TeardownFailure> {
        self.teardown_all()
    }

    fn teardown_all(&mut self) -> Vec<TeardownFailure> {
        if self.torn_down {
            return Vec::new();
        }
        self.torn_down = true;
        let mut failures = Vec::new();
        for member in &self.members {
            if let Err(error) = member.teardown() {
                let visitor = member.name();
                warn!("[{}] teardown of {} failed: {}", self.label, visitor, error);
                failures.push(TeardownFailure { visitor, error });
            }
        }
        failures
    }
}

impl Drop for LifecycleGuard {
    fn drop(&mut self) {
        self.teardown_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        setups: usize,
        teardowns: usize,
        fail_setup: bool,
        fail_teardown: bool,
    }

    impl Visitor for Recorder {
        fn setup(&mut self) -> Result<(), VisitorError> {
            self.setups += 1;
            if self.fail_setup {
                return Err(VisitorError::msg("setup refused"));
            }
            Ok(())
        }

        fn teardown(&mut self) -> Result<(), VisitorError> {
            self.teardowns += 1;
            if self.fail_teardown {
                return Err(VisitorError::msg("teardown refused"));
            }
            Ok(())
        }
    }

    impl BlockVisitor for Recorder {
        fn visit_block(&mut self, _block: &Block) -> Result<(), VisitorError> {
            Ok(())
        }
    }

    impl RevisionVisitor for Recorder {
        fn visit_revision(
            &mut self,
            _revision: Revision<'_>,
            _table: TableRef<'_>,
        ) -> Result<(), VisitorError> {
            Ok(())
        }
    }

    #[test]
    fn dual_registration_gets_one_lifecycle() {
        let both = shared(Recorder::default());
        let visitors = VisitorSet::new()
            .with_block_visitor(both.clone())
            .with_revision_visitor(both.clone());

        let mut guard = visitors.lifecycle("test");
        guard.setup().expect("setup");
        assert!(guard.finish().is_empty());

        let recorder = both.lock();
        assert_eq!(recorder.setups, 1);
        assert_eq!(recorder.teardowns, 1);
    }

    #[test]
    fn dropping_the_guard_tears_down_once() {
        let v = shared(Recorder::default());
        let visitors = VisitorSet::new().with_block_visitor(v.clone());
        {
            let mut guard = visitors.lifecycle("test");
            guard.setup().expect("setup");
        }
        assert_eq!(v.lock().teardowns, 1);
    }

    #[test]
    fn failed_setup_still_tears_down_everyone() {
        let first = shared(Recorder {
            fail_setup: true,
            ..Default::default()
        });
        let second = shared(Recorder::default());
        let visitors = VisitorSet::new()
            .with_block_visitor(first.clone())
            .with_block_visitor(second.clone());

        let mut guard = visitors.lifecycle("test");
        let err = guard.setup().unwrap_err();
        assert!(matches!(err, RunError::Setup { .. }));
        guard.finish();

        assert_eq!(first.lock().teardowns, 1);
        assert_eq!(second.lock().setups, 0);
        assert_eq!(second.lock().teardowns, 1);
    }

    #[test]
    fn teardown_failures_do_not_stop_other_teardowns() {
        let failing = shared(Recorder {
            fail_teardown: true,
            ..Default::default()
        });
        let ok = shared(Recorder::default());
        let visitors = VisitorSet::new()
            .with_revision_visitor(failing.clone())
            .with_block_visitor(ok.clone());

        let mut guard = visitors.lifecycle("test");
        guard.setup().expect("setup");
        let failures = guard.finish();

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].visitor, "Recorder");
        assert_eq!(ok.lock().teardowns, 1);
    }
}
