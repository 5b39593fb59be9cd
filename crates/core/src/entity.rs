//! Entity trait: records addressed by a stable identifier.

/// Entity marker + minimal interface.
///
/// Implemented by menu nodes and roles so snapshot helpers can index either
/// kind of record by id.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Index a slice of entities by id.
///
/// Later duplicates overwrite earlier ones; callers that care about id
/// uniqueness validate before inserting.
pub fn index_by_id<E: Entity>(items: &[E]) -> std::collections::HashMap<E::Id, &E> {
    items.iter().map(|item| (item.id(), item)).collect()
}
