use std::{fs, io, path::Path};

use bracket_geometry::prelude::Point;

use crate::combat::LevelUpChoice;
use crate::states::Input;

/// Pre-recorded input for headless runs. One character per event; `#`
/// starts a comment that runs to the end of the line.
#[derive(Clone, Debug, Default)]
pub struct ScriptedInput {
    inputs: Vec<Input>,
    cursor: usize,
}

impl ScriptedInput {
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn parse(script: &str) -> Self {
        let mut inputs = Vec::new();
        for line in script.lines() {
            let commands = line.split('#').next().unwrap_or_default().trim();
            for key in commands.chars() {
                if key.is_whitespace() {
                    continue;
                }
                match key_to_input(key) {
                    Some(input) => inputs.push(input),
                    None => log::warn!("unknown key in script: {key:?}"),
                }
            }
        }
        Self { inputs, cursor: 0 }
    }

    pub fn next_input(&mut self) -> Option<Input> {
        let input = self.inputs.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(input)
    }

    pub fn remaining(&self) -> usize {
        self.inputs.len() - self.cursor
    }
}

impl Iterator for ScriptedInput {
    type Item = Input;

    fn next(&mut self) -> Option<Input> {
        self.next_input()
    }
}

fn key_to_input(key: char) -> Option<Input> {
    let step = |x: i32, y: i32| Some(Input::Direction(Point::new(x, y)));
    match key {
        'h' => step(-1, 0),
        'j' => step(0, 1),
        'k' => step(0, -1),
        'l' => step(1, 0),
        'y' => step(-1, -1),
        'u' => step(1, -1),
        'b' => step(-1, 1),
        'n' => step(1, 1),
        '.' => Some(Input::Wait),
        'g' => Some(Input::Pickup),
        'i' => Some(Input::OpenInventory),
        'd' => Some(Input::OpenDrop),
        '>' => Some(Input::Descend),
        '<' => Some(Input::Ascend),
        'e' => Some(Input::Confirm),
        'q' | '\x1B' => Some(Input::Cancel),
        '1' => Some(Input::Choose(LevelUpChoice::Constitution)),
        '2' => Some(Input::Choose(LevelUpChoice::Strength)),
        '3' => Some(Input::Choose(LevelUpChoice::Agility)),
        'A'..='Z' => Some(Input::Select(key.to_ascii_lowercase())),
        _ => None,
    }
}
