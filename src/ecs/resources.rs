use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    #[default]
    Normal,
    Welcome,
    PlayerAttack,
    EnemyAttack,
    PlayerDie,
    EnemyDie,
    Impossible,
    LevelUp,
}

impl MessageKind {
    pub fn color(self) -> [u8; 3] {
        match self {
            MessageKind::Normal => [255, 255, 255],
            MessageKind::Welcome => [32, 160, 255],
            MessageKind::PlayerAttack => [224, 224, 224],
            MessageKind::EnemyAttack => [255, 192, 192],
            MessageKind::PlayerDie => [255, 48, 48],
            MessageKind::EnemyDie => [255, 160, 48],
            MessageKind::Impossible => [128, 128, 128],
            MessageKind::LevelUp => [255, 255, 0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub kind: MessageKind,
    pub count: u32,
}

impl Message {
    pub fn full_text(&self) -> String {
        if self.count > 1 {
            format!("{} (x{})", self.text, self.count)
        } else {
            self.text.clone()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLog {
    pub entries: Vec<Message>,
}

impl MessageLog {
    /// Appends a message, stacking it onto the previous one when identical.
    pub fn push<S: Into<String>>(&mut self, text: S, kind: MessageKind) {
        let text = text.into();
        if let Some(last) = self.entries.last_mut() {
            if last.text == text {
                last.count += 1;
                return;
            }
        }
        self.entries.push(Message {
            text,
            kind,
            count: 1,
        });
    }

    pub fn last_text(&self) -> Option<&str> {
        self.entries.last().map(|message| message.text.as_str())
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.iter().any(|message| message.text == text)
    }
}
