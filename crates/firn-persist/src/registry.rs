use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

use firn::RecordId;

/// The typed accessor pair for an entity's identifier field.
///
/// Implementing this trait is the static equivalent of tagging a field as
/// "assign an identifier here if absent": the hook reads through [`id`] and
/// writes through [`set_id`], so there is no field scanning at persist time
/// and no way to register a type whose field cannot be written.
///
/// `None` is the single "unset" representation. A type whose unset state is
/// something else (a zero, a sentinel) maps it to `None` in its
/// implementation.
///
/// ```
/// use firn::RecordId;
/// use firn_persist::IdField;
///
/// struct User {
///     id: Option<RecordId>,
///     name: String,
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
/// ```
///
/// [`id`]: IdField::id
/// [`set_id`]: IdField::set_id
pub trait IdField: Any {
    /// Returns the identifier currently held by this entity, or `None` if
    /// unset.
    fn id(&self) -> Option<RecordId>;

    /// Writes the identifier into the entity.
    fn set_id(&mut self, id: RecordId);
}

type Get = fn(&dyn Any) -> Option<RecordId>;
type Set = fn(&mut dyn Any, RecordId) -> bool;

pub(crate) struct Entry {
    pub(crate) type_name: &'static str,
    pub(crate) get: Get,
    pub(crate) set: Set,
}

/// The entity-type → accessor table consulted by the dynamic hook path.
///
/// Built once at startup by registering every entity type the persistence
/// layer will route through the hook; lookups afterwards are a single
/// `TypeId` hash probe. There is nothing reflective here: each entry is a
/// pair of monomorphized function pointers produced at registration.
#[derive(Default)]
pub struct AssignRegistry {
    entries: HashMap<TypeId, Entry>,
}

impl AssignRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `E`'s identifier-field accessors. Re-registering a type
    /// replaces the previous entry.
    pub fn register<E: IdField>(&mut self) {
        self.entries.insert(
            TypeId::of::<E>(),
            Entry {
                type_name: type_name::<E>(),
                get: get_id::<E>,
                set: set_id::<E>,
            },
        );
    }

    /// Returns true if `E` has been registered.
    pub fn contains<E: IdField>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<E>())
    }

    /// Number of registered entity types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entry(&self, type_id: TypeId) -> Option<&Entry> {
        self.entries.get(&type_id)
    }
}

fn get_id<E: IdField>(entity: &dyn Any) -> Option<RecordId> {
    entity.downcast_ref::<E>().and_then(IdField::id)
}

fn set_id<E: IdField>(entity: &mut dyn Any, id: RecordId) -> bool {
    match entity.downcast_mut::<E>() {
        Some(entity) => {
            entity.set_id(id);
            true
        }
        None => false,
    }
}
