pub mod components;
pub mod query;
pub mod relations;
pub mod resources;
pub mod snapshot;
pub mod spatial;

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};

use bracket_random::prelude::RandomNumberGenerator;
use specs::prelude::{Builder, Component, Join, World as SpecsWorld, WorldExt};
use specs::{BitSet, Entity};

use crate::ai::Ai;
use crate::config::CoreConfig;
use crate::map::MapKey;

use self::{
    components::{
        AssignedKey, Count, Defense, DefenseBonus, Destination, DownStairs, EquipSlot, Floor,
        Graphic, Hp, IsActor, IsAlive, IsBlocking, IsGhost, IsItem, IsPlayer, IsTemplate,
        ItemUse, LastSeen, Level, MapShape, MaxHp, MemoryTiles, Name, Position, Power,
        PowerBonus, RewardXp, Serial, SpawnWeight, TemplateKey, Tiles, UpStairs, VisibleTiles,
        Xp,
    },
    query::{Query, bitset_of, narrow},
    relations::{Relation, RelationStore},
    resources::{MessageKind, MessageLog},
    spatial::SpatialIndex,
};

type PositionObserver = Box<dyn FnMut(Entity, Option<&Position>, Option<&Position>)>;

/// Entity/component/tag/relation database the whole simulation runs on.
///
/// Components and tags live in specs storages; relations and the
/// position index are kept beside them. Every `Position` write goes
/// through [`WorldStore::set_position`] / [`WorldStore::clear_position`],
/// which update the spatial index and the `IsIn` relation before
/// returning.
pub struct WorldStore {
    specs_world: SpecsWorld,
    relations: RelationStore,
    spatial: SpatialIndex,
    observers: Vec<PositionObserver>,
    templates: HashMap<String, Entity>,
    maps: HashMap<MapKey, Entity>,
    next_serial: u64,
}

impl WorldStore {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, CoreConfig::default())
    }

    pub fn with_config(seed: u64, config: CoreConfig) -> Self {
        let mut specs_world = SpecsWorld::new();
        Self::register_components(&mut specs_world);
        specs_world.insert(RandomNumberGenerator::seeded(seed));
        specs_world.insert(MessageLog::default());
        specs_world.insert(config);

        Self {
            specs_world,
            relations: RelationStore::new(),
            spatial: SpatialIndex::default(),
            observers: Vec::new(),
            templates: HashMap::new(),
            maps: HashMap::new(),
            next_serial: 0,
        }
    }

    fn register_components(world: &mut SpecsWorld) {
        world.register::<Serial>();
        world.register::<Position>();
        world.register::<Graphic>();
        world.register::<Name>();
        world.register::<Hp>();
        world.register::<MaxHp>();
        world.register::<Power>();
        world.register::<Defense>();
        world.register::<PowerBonus>();
        world.register::<DefenseBonus>();
        world.register::<RewardXp>();
        world.register::<Level>();
        world.register::<Xp>();
        world.register::<Floor>();
        world.register::<MapShape>();
        world.register::<Tiles>();
        world.register::<VisibleTiles>();
        world.register::<MemoryTiles>();
        world.register::<MapKey>();
        world.register::<Destination>();
        world.register::<SpawnWeight>();
        world.register::<EquipSlot>();
        world.register::<AssignedKey>();
        world.register::<Count>();
        world.register::<ItemUse>();
        world.register::<TemplateKey>();
        world.register::<LastSeen>();
        world.register::<Ai>();
        world.register::<IsPlayer>();
        world.register::<IsActor>();
        world.register::<IsItem>();
        world.register::<IsAlive>();
        world.register::<IsBlocking>();
        world.register::<IsGhost>();
        world.register::<IsTemplate>();
        world.register::<UpStairs>();
        world.register::<DownStairs>();
    }

    pub fn create(&mut self) -> Entity {
        let serial = Serial(self.next_serial);
        self.next_serial += 1;
        self.specs_world.create_entity().with(serial).build()
    }

    /// Removes an entity with all of its components, tags and relations.
    pub fn destroy(&mut self, entity: Entity) {
        self.clear_position(entity);
        self.relations.forget(entity);
        if let Some(TemplateKey(key)) = self.get::<TemplateKey>(entity) {
            self.templates.remove(&key);
        }
        let _ = self.specs_world.delete_entity(entity);
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.specs_world.is_alive(entity)
    }

    pub fn get<T: Component + Clone>(&self, entity: Entity) -> Option<T> {
        self.specs_world.read_component::<T>().get(entity).cloned()
    }

    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.specs_world.read_component::<T>().contains(entity)
    }

    /// Attaches a component, replacing any previous value of that kind.
    /// `Position` values are routed through the change hook.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) {
        if let Some(position) = (&value as &dyn Any).downcast_ref::<Position>() {
            self.set_position(entity, *position);
            return;
        }
        if let Err(err) = self
            .specs_world
            .write_component::<T>()
            .insert(entity, value)
        {
            panic!("cannot attach {} to {entity:?}: {err}", type_name::<T>());
        }
    }

    pub fn remove<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if TypeId::of::<T>() == TypeId::of::<Position>() {
            let old = self.clear_position(entity)?;
            let boxed: Box<dyn Any> = Box::new(old);
            return boxed.downcast::<T>().ok().map(|value| *value);
        }
        self.specs_world.write_component::<T>().remove(entity)
    }

    /// Mutates a component in place. `Position` must be written with
    /// `set_position` instead.
    pub fn modify<T: Component, R>(&mut self, entity: Entity, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        assert!(
            TypeId::of::<T>() != TypeId::of::<Position>(),
            "positions must be changed through set_position"
        );
        self.specs_world
            .write_component::<T>()
            .get_mut(entity)
            .map(f)
    }

    pub fn tag<T: Component + Default>(&mut self, entity: Entity) {
        self.insert(entity, T::default());
    }

    pub fn untag<T: Component>(&mut self, entity: Entity) {
        self.remove::<T>(entity);
    }

    pub fn set_position(&mut self, entity: Entity, position: Position) {
        let old = match self
            .specs_world
            .write_component::<Position>()
            .insert(entity, position)
        {
            Ok(old) => old,
            Err(err) => panic!("cannot place {entity:?}: {err}"),
        };
        self.position_changed(entity, old, Some(position));
    }

    pub fn clear_position(&mut self, entity: Entity) -> Option<Position> {
        let old = self.specs_world.write_component::<Position>().remove(entity);
        if old.is_some() {
            self.position_changed(entity, old, None);
        }
        old
    }

    fn position_changed(&mut self, entity: Entity, old: Option<Position>, new: Option<Position>) {
        if old == new {
            return;
        }
        self.spatial.relocate(entity, old.as_ref(), new.as_ref());
        match new {
            Some(position) => self.relations.set(entity, Relation::IsIn, position.map),
            None => self.relations.remove(entity, Relation::IsIn, None),
        }
        for observer in &mut self.observers {
            observer(entity, old.as_ref(), new.as_ref());
        }
    }

    /// Registers a callback run synchronously after every position change,
    /// once the spatial index and `IsIn` relation are already updated.
    pub fn observe_positions(
        &mut self,
        observer: impl FnMut(Entity, Option<&Position>, Option<&Position>) + 'static,
    ) {
        self.observers.push(Box::new(observer));
    }

    pub fn entities_at(&self, position: &Position) -> Vec<Entity> {
        self.spatial.at(position).collect()
    }

    pub fn is_vacant(&self, position: &Position) -> bool {
        self.spatial.is_empty_at(position)
    }

    pub fn relate(&mut self, source: Entity, label: Relation, target: Entity) {
        self.relations.add(source, label, target);
    }

    pub fn relate_exclusive(&mut self, source: Entity, label: Relation, target: Entity) {
        self.relations.set(source, label, target);
    }

    pub fn unrelate(&mut self, source: Entity, label: Relation, target: Option<Entity>) {
        self.relations.remove(source, label, target);
    }

    pub fn related(&self, source: Entity, label: Relation, target: Entity) -> bool {
        self.relations.has(source, label, target)
    }

    pub fn target(&self, source: Entity, label: Relation) -> Option<Entity> {
        self.relations.target(source, label)
    }

    pub fn sources(&self, label: Relation, target: Entity) -> Vec<Entity> {
        self.relations.sources(label, target).collect()
    }

    pub fn relations(&self) -> &RelationStore {
        &self.relations
    }

    /// Runs `query` and returns the matches in creation order.
    pub fn query(&self, query: &Query) -> Vec<Entity> {
        let mut included: Option<BitSet> = None;
        for mask in &query.all_of {
            narrow(&mut included, mask(&self.specs_world));
        }
        for (label, target) in &query.related {
            narrow(&mut included, bitset_of(self.relations.sources(*label, *target)));
        }
        if let Some(position) = &query.at {
            narrow(&mut included, bitset_of(self.spatial.at(position)));
        }

        let mut excluded = BitSet::new();
        for mask in &query.none_of {
            excluded |= &mask(&self.specs_world);
        }
        for (label, target) in &query.not_related {
            excluded |= &bitset_of(self.relations.sources(*label, *target));
        }

        let entities = self.specs_world.entities();
        let included = included.unwrap_or_else(|| bitset_of((&*entities).join()));
        let serials = self.specs_world.read_component::<Serial>();
        let mut found: Vec<Entity> = (&*entities, &included)
            .join()
            .map(|(entity, _)| entity)
            .filter(|entity| !excluded.contains(entity.id()))
            .collect();
        found.sort_by_key(|entity| serials.get(*entity).copied());
        found
    }

    pub fn query_one(&self, query: &Query) -> Option<Entity> {
        self.query(query).into_iter().next()
    }

    pub fn rng(&self) -> impl DerefMut<Target = RandomNumberGenerator> + '_ {
        self.specs_world.write_resource::<RandomNumberGenerator>()
    }

    /// Uniform roll in `min..max`.
    pub fn roll(&self, min: i32, max: i32) -> i32 {
        self.rng().range(min, max)
    }

    /// Copy of the generator, for saving without advancing it.
    pub fn rng_state(&self) -> RandomNumberGenerator {
        (*self.specs_world.read_resource::<RandomNumberGenerator>()).clone()
    }

    pub fn set_rng(&mut self, rng: RandomNumberGenerator) {
        self.specs_world.insert(rng);
    }

    pub fn config(&self) -> impl Deref<Target = CoreConfig> + '_ {
        self.specs_world.read_resource::<CoreConfig>()
    }

    pub fn messages(&self) -> impl Deref<Target = MessageLog> + '_ {
        self.specs_world.read_resource::<MessageLog>()
    }

    pub fn add_message<S: Into<String>>(&mut self, text: S, kind: MessageKind) {
        self.specs_world
            .write_resource::<MessageLog>()
            .push(text, kind);
    }

    pub(crate) fn replace_messages(&mut self, log: MessageLog) {
        self.specs_world.insert(log);
    }

    pub fn name_of(&self, entity: Entity) -> String {
        self.get::<Name>(entity)
            .map_or_else(|| "???".to_string(), |Name(name)| name)
    }

    /// Creates an `IsTemplate` prototype registered under `key`.
    pub fn define_template(&mut self, key: &str) -> Entity {
        if let Some(old) = self.templates.get(key).copied() {
            self.destroy(old);
        }
        let template = self.create();
        self.tag::<IsTemplate>(template);
        self.insert(template, TemplateKey(key.to_string()));
        self.templates.insert(key.to_string(), template);
        template
    }

    pub fn template(&self, key: &str) -> Option<Entity> {
        self.templates.get(key).copied()
    }

    /// Copies a template's gameplay components onto a fresh entity linked
    /// back to it with `IsA`.
    pub fn instantiate(&mut self, template: Entity) -> Entity {
        let entity = self.create();
        self.copy_component::<Graphic>(template, entity);
        self.copy_component::<Name>(template, entity);
        self.copy_component::<Hp>(template, entity);
        self.copy_component::<MaxHp>(template, entity);
        self.copy_component::<Power>(template, entity);
        self.copy_component::<Defense>(template, entity);
        self.copy_component::<PowerBonus>(template, entity);
        self.copy_component::<DefenseBonus>(template, entity);
        self.copy_component::<RewardXp>(template, entity);
        self.copy_component::<Level>(template, entity);
        self.copy_component::<Xp>(template, entity);
        self.copy_component::<EquipSlot>(template, entity);
        self.copy_component::<Count>(template, entity);
        self.copy_component::<ItemUse>(template, entity);
        self.copy_component::<IsActor>(template, entity);
        self.copy_component::<IsItem>(template, entity);
        self.relations.set(entity, Relation::IsA, template);
        entity
    }

    fn copy_component<T: Component + Clone>(&mut self, from: Entity, to: Entity) {
        if let Some(value) = self.get::<T>(from) {
            self.insert(to, value);
        }
    }

    pub fn cached_map(&self, key: MapKey) -> Option<Entity> {
        self.maps.get(&key).copied()
    }

    pub(crate) fn cache_map(&mut self, key: MapKey, map: Entity) {
        self.maps.insert(key, map);
    }
}
