//! Directed, labeled edges between entities, indexed from both ends.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use specs::Entity;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Relation {
    /// Contained by a map or by an inventory holder.
    IsIn,
    EquippedBy,
    /// Grants stat bonuses to the target.
    Affecting,
    /// Instantiated from the target template.
    IsA,
}

impl Relation {
    pub const ALL: [Relation; 4] = [
        Relation::IsIn,
        Relation::EquippedBy,
        Relation::Affecting,
        Relation::IsA,
    ];
}

#[derive(Clone, Debug, Default)]
pub struct RelationStore {
    forward: HashMap<(Entity, Relation), BTreeSet<Entity>>,
    reverse: HashMap<(Entity, Relation), BTreeSet<Entity>>,
}

impl RelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an edge, keeping any other targets the source already has.
    pub fn add(&mut self, source: Entity, label: Relation, target: Entity) {
        self.forward
            .entry((source, label))
            .or_default()
            .insert(target);
        self.reverse
            .entry((target, label))
            .or_default()
            .insert(source);
    }

    /// Replaces every target of `source` under `label` with `target`.
    pub fn set(&mut self, source: Entity, label: Relation, target: Entity) {
        self.remove(source, label, None);
        self.add(source, label, target);
    }

    /// Removes one edge, or every edge of `label` leaving `source`.
    pub fn remove(&mut self, source: Entity, label: Relation, target: Option<Entity>) {
        let targets: Vec<Entity> = match target {
            Some(target) => vec![target],
            None => self.targets(source, label).collect(),
        };
        for target in targets {
            detach(&mut self.forward, (source, label), target);
            detach(&mut self.reverse, (target, label), source);
        }
    }

    pub fn has(&self, source: Entity, label: Relation, target: Entity) -> bool {
        self.forward
            .get(&(source, label))
            .is_some_and(|targets| targets.contains(&target))
    }

    pub fn targets(&self, source: Entity, label: Relation) -> impl Iterator<Item = Entity> + '_ {
        self.forward
            .get(&(source, label))
            .into_iter()
            .flat_map(|targets| targets.iter().copied())
    }

    pub fn target(&self, source: Entity, label: Relation) -> Option<Entity> {
        self.targets(source, label).next()
    }

    pub fn sources(&self, label: Relation, target: Entity) -> impl Iterator<Item = Entity> + '_ {
        self.reverse
            .get(&(target, label))
            .into_iter()
            .flat_map(|sources| sources.iter().copied())
    }

    /// Drops every edge touching `entity`, in either direction.
    pub fn forget(&mut self, entity: Entity) {
        for label in Relation::ALL {
            self.remove(entity, label, None);
            let sources: Vec<Entity> = self.sources(label, entity).collect();
            for source in sources {
                self.remove(source, label, Some(entity));
            }
        }
    }

    pub fn edges(&self) -> impl Iterator<Item = (Entity, Relation, Entity)> + '_ {
        self.forward.iter().flat_map(|((source, label), targets)| {
            targets.iter().map(move |target| (*source, *label, *target))
        })
    }
}

fn detach(
    index: &mut HashMap<(Entity, Relation), BTreeSet<Entity>>,
    key: (Entity, Relation),
    value: Entity,
) {
    if let Some(set) = index.get_mut(&key) {
        set.remove(&value);
        if set.is_empty() {
            index.remove(&key);
        }
    }
}
