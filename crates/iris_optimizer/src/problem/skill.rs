use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Skill(u32);

impl Skill {
    pub fn new(skill: u32) -> Self {
        Skill(skill)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}
