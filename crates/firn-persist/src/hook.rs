use std::any::Any;

use firn::{IdGenerator, MonotonicClock, TimeSource};

use crate::{
    error::{Error, Result},
    registry::{AssignRegistry, IdField},
};

/// Assigns identifiers to records immediately before they are written.
///
/// The persistence layer invokes this hook with each candidate entity; any
/// entity whose identifier field is unset receives a fresh id, and entities
/// that already carry one pass through untouched. The generator handle is
/// injected at construction and shared with whatever else generates ids in
/// the process — the hook holds no global state.
///
/// # Example
///
/// ```
/// use firn::{IdGenerator, MonotonicClock, NodeIdentity, RecordId};
/// use firn_persist::{AssignRegistry, IdField, PersistHook};
///
/// struct User {
///     id: Option<RecordId>,
/// }
///
/// impl IdField for User {
///     fn id(&self) -> Option<RecordId> {
///         self.id
///     }
///
///     fn set_id(&mut self, id: RecordId) {
///         self.id = Some(id);
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let node = NodeIdentity::new(3, 1)?;
/// let generator = IdGenerator::new(node, MonotonicClock::default());
///
/// let mut registry = AssignRegistry::new();
/// registry.register::<User>();
/// let hook = PersistHook::new(generator, registry);
///
/// let mut user = User { id: None };
/// hook.before_persist(&mut user)?;
/// assert!(user.id.is_some());
/// # Ok(())
/// # }
/// ```
pub struct PersistHook<T: TimeSource = MonotonicClock> {
    generator: IdGenerator<T>,
    registry: AssignRegistry,
}

impl<T: TimeSource> PersistHook<T> {
    pub fn new(generator: IdGenerator<T>, registry: AssignRegistry) -> Self {
        Self {
            generator,
            registry,
        }
    }

    /// Ensures `entity` carries an identifier, assigning a fresh one iff the
    /// field is currently unset. Returns whether an assignment happened.
    ///
    /// Statically dispatched; the type system already proves the field is
    /// accessible, so no registration is required on this path.
    ///
    /// # Errors
    ///
    /// Propagates generation failures ([`firn::Error::ClockRegression`]).
    pub fn before_persist<E: IdField>(&self, entity: &mut E) -> Result<bool> {
        if entity.id().is_some() {
            return Ok(false);
        }
        let id = self.generator.next_id()?;
        entity.set_id(id);
        tracing::debug!(%id, entity = std::any::type_name::<E>(), "assigned record id");
        Ok(true)
    }

    /// The opaque-entity variant for persistence frameworks that dispatch
    /// listener callbacks over type-erased records. Returns whether an
    /// assignment happened.
    ///
    /// # Errors
    ///
    /// - [`Error::Unregistered`] if the entity's concrete type was never
    ///   registered. The hook only ever sees types that opted in, so this is
    ///   a wiring fault and must not be swallowed by the caller.
    /// - [`Error::FieldAccess`] if the registered accessor rejects the
    ///   entity.
    /// - Generation failures, as for [`Self::before_persist`].
    pub fn before_persist_dyn(&self, entity: &mut dyn Any) -> Result<bool> {
        let type_id = (*entity).type_id();
        let entry = self
            .registry
            .entry(type_id)
            .ok_or(Error::Unregistered { type_id })?;

        if (entry.get)(entity).is_some() {
            return Ok(false);
        }
        let id = self.generator.next_id()?;
        if !(entry.set)(entity, id) {
            return Err(Error::FieldAccess {
                type_name: entry.type_name,
            });
        }
        tracing::debug!(%id, entity = entry.type_name, "assigned record id");
        Ok(true)
    }

    /// The generator this hook assigns from.
    pub fn generator(&self) -> &IdGenerator<T> {
        &self.generator
    }
}

#[cfg(test)]
mod tests {
    use firn::{NodeIdentity, RecordId};

    use super::*;

    struct FixedTime;

    impl TimeSource for FixedTime {
        fn current_millis(&self) -> u64 {
            42
        }
    }

    struct Invoice {
        id: Option<RecordId>,
        total_cents: i64,
    }

    impl IdField for Invoice {
        fn id(&self) -> Option<RecordId> {
            self.id
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }
    }

    struct AuditEvent {
        id: Option<RecordId>,
    }

    impl IdField for AuditEvent {
        fn id(&self) -> Option<RecordId> {
            self.id
        }

        fn set_id(&mut self, id: RecordId) {
            self.id = Some(id);
        }
    }

    fn hook_with<F>(configure: F) -> PersistHook<FixedTime>
    where
        F: FnOnce(&mut AssignRegistry),
    {
        let node = NodeIdentity::new(5, 2).unwrap();
        let generator = IdGenerator::new(node, FixedTime);
        let mut registry = AssignRegistry::new();
        configure(&mut registry);
        PersistHook::new(generator, registry)
    }

    #[test]
    fn assigns_when_unset() {
        let hook = hook_with(|r| r.register::<Invoice>());
        let mut invoice = Invoice {
            id: None,
            total_cents: 1299,
        };

        assert!(hook.before_persist(&mut invoice).unwrap());
        let id = invoice.id.expect("id assigned");
        assert_eq!(id.worker_id(), 5);
        assert_eq!(id.datacenter_id(), 2);
        assert_eq!(invoice.total_cents, 1299);
    }

    #[test]
    fn leaves_existing_id_untouched() {
        let hook = hook_with(|r| r.register::<Invoice>());
        let existing = RecordId::from_raw(0xDEAD_BEEF);
        let mut invoice = Invoice {
            id: Some(existing),
            total_cents: 0,
        };

        assert!(!hook.before_persist(&mut invoice).unwrap());
        assert_eq!(invoice.id, Some(existing));
    }

    #[test]
    fn repeated_hook_runs_are_idempotent() {
        let hook = hook_with(|r| r.register::<Invoice>());
        let mut invoice = Invoice {
            id: None,
            total_cents: 0,
        };

        hook.before_persist(&mut invoice).unwrap();
        let first = invoice.id;
        hook.before_persist(&mut invoice).unwrap();
        assert_eq!(invoice.id, first);
    }

    #[test]
    fn dyn_path_assigns_through_the_table() {
        let hook = hook_with(|r| {
            r.register::<Invoice>();
            r.register::<AuditEvent>();
        });

        let mut invoice = Invoice {
            id: None,
            total_cents: 50,
        };
        let mut event = AuditEvent { id: None };

        assert!(hook.before_persist_dyn(&mut invoice).unwrap());
        assert!(hook.before_persist_dyn(&mut event).unwrap());
        assert_ne!(invoice.id, event.id);
    }

    #[test]
    fn dyn_path_preserves_existing_id() {
        let hook = hook_with(|r| r.register::<Invoice>());
        let existing = RecordId::from_raw(77);
        let mut invoice = Invoice {
            id: Some(existing),
            total_cents: 0,
        };

        assert!(!hook.before_persist_dyn(&mut invoice).unwrap());
        assert_eq!(invoice.id, Some(existing));
    }

    #[test]
    fn dyn_path_rejects_unregistered_entity() {
        let hook = hook_with(|_| {});
        let mut event = AuditEvent { id: None };

        let err = hook.before_persist_dyn(&mut event).unwrap_err();
        assert!(matches!(err, Error::Unregistered { .. }));
        assert!(event.id.is_none());
    }

    #[test]
    fn registry_reports_registrations() {
        let mut registry = AssignRegistry::new();
        assert!(registry.is_empty());
        registry.register::<Invoice>();
        assert!(registry.contains::<Invoice>());
        assert!(!registry.contains::<AuditEvent>());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn generation_failure_propagates() {
        struct Backwards {
            calls: std::cell::Cell<u64>,
        }

        impl TimeSource for Backwards {
            fn current_millis(&self) -> u64 {
                let n = self.calls.get();
                self.calls.set(n + 1);
                // First reading 42, everything after reads 41.
                if n == 0 { 42 } else { 41 }
            }
        }

        let node = NodeIdentity::new(0, 1).unwrap();
        let generator = IdGenerator::new(
            node,
            Backwards {
                calls: std::cell::Cell::new(0),
            },
        );
        let mut registry = AssignRegistry::new();
        registry.register::<Invoice>();
        let hook = PersistHook::new(generator, registry);

        let mut first = Invoice {
            id: None,
            total_cents: 0,
        };
        hook.before_persist(&mut first).unwrap();

        let mut second = Invoice {
            id: None,
            total_cents: 0,
        };
        let err = hook.before_persist(&mut second).unwrap_err();
        assert!(matches!(
            err,
            Error::IdGeneration(firn::Error::ClockRegression { last: 42, now: 41 })
        ));
        assert!(second.id.is_none());
    }
}
