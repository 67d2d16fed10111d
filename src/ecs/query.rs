use specs::prelude::{Component, World, WorldExt};
use specs::{BitSet, Entity};

use super::components::Position;
use super::relations::Relation;

type MaskFn = fn(&World) -> BitSet;

fn mask_of<T: Component>(world: &World) -> BitSet {
    world.read_component::<T>().mask().clone()
}

/// Entity filter evaluated as bitset intersection/difference over the
/// per-kind storage masks, the relation index and the spatial index.
#[derive(Clone, Default)]
pub struct Query {
    pub(super) all_of: Vec<MaskFn>,
    pub(super) none_of: Vec<MaskFn>,
    pub(super) related: Vec<(Relation, Entity)>,
    pub(super) not_related: Vec<(Relation, Entity)>,
    pub(super) at: Option<Position>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires a component or tag.
    pub fn with<T: Component>(mut self) -> Self {
        self.all_of.push(mask_of::<T>);
        self
    }

    pub fn without<T: Component>(mut self) -> Self {
        self.none_of.push(mask_of::<T>);
        self
    }

    /// Requires an edge `(label, entity, target)`.
    pub fn related(mut self, label: Relation, target: Entity) -> Self {
        self.related.push((label, target));
        self
    }

    pub fn not_related(mut self, label: Relation, target: Entity) -> Self {
        self.not_related.push((label, target));
        self
    }

    /// Requires the entity to stand exactly on `position`.
    pub fn at(mut self, position: Position) -> Self {
        self.at = Some(position);
        self
    }
}

pub(super) fn narrow(acc: &mut Option<BitSet>, set: BitSet) {
    match acc {
        Some(current) => *current &= &set,
        None => *acc = Some(set),
    }
}

pub(super) fn bitset_of(entities: impl IntoIterator<Item = Entity>) -> BitSet {
    let mut set = BitSet::new();
    for entity in entities {
        set.add(entity.id());
    }
    set
}
