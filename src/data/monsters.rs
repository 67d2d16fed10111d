#[derive(Clone, Debug)]
pub struct MonsterTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub glyph: char,
    pub color: [u8; 3],
    pub hp: i32,
    pub power: i32,
    pub defense: i32,
    pub reward_xp: i32,
    /// Floor -> weight steps; empty means never spawned by the generator.
    pub spawn_weight: &'static [(i32, i32)],
}

impl MonsterTemplate {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        key: &'static str,
        glyph: char,
        color: [u8; 3],
        hp: i32,
        power: i32,
        defense: i32,
        reward_xp: i32,
        spawn_weight: &'static [(i32, i32)],
    ) -> Self {
        Self {
            key,
            name: key,
            glyph,
            color,
            hp,
            power,
            defense,
            reward_xp,
            spawn_weight,
        }
    }
}

pub const PLAYER: MonsterTemplate =
    MonsterTemplate::new("player", '@', [255, 255, 255], 30, 2, 1, 0, &[]);

pub const MONSTERS: [MonsterTemplate; 2] = [
    MonsterTemplate::new("orc", 'o', [63, 127, 63], 10, 3, 0, 35, &[(1, 80)]),
    MonsterTemplate::new(
        "troll",
        'T',
        [0, 127, 0],
        16,
        4,
        1,
        100,
        &[(3, 15), (5, 30), (7, 60)],
    ),
];
