use std::collections::{BTreeSet, HashMap};

use specs::Entity;

use super::components::Position;

/// Position -> occupants lookup, kept in step with the `Position` storage
/// by the store's change hook.
#[derive(Clone, Debug, Default)]
pub struct SpatialIndex {
    cells: HashMap<Position, BTreeSet<Entity>>,
}

impl SpatialIndex {
    pub fn at(&self, position: &Position) -> impl Iterator<Item = Entity> + '_ {
        self.cells
            .get(position)
            .into_iter()
            .flat_map(|occupants| occupants.iter().copied())
    }

    pub fn is_empty_at(&self, position: &Position) -> bool {
        self.cells.get(position).is_none_or(BTreeSet::is_empty)
    }

    pub fn relocate(&mut self, entity: Entity, old: Option<&Position>, new: Option<&Position>) {
        if let Some(old) = old {
            if let Some(occupants) = self.cells.get_mut(old) {
                occupants.remove(&entity);
                if occupants.is_empty() {
                    self.cells.remove(old);
                }
            }
        }
        if let Some(new) = new {
            self.cells.entry(*new).or_default().insert(entity);
        }
    }
}
