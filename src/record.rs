use serde::{Deserialize, Serialize};

/// Position assigned to keywords that are unranked or carry no usable rank.
pub const UNRANKED_POSITION: u32 = 999;

/// One keyword row in canonical shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub keyword: String,
    pub volume: u64,
    pub position: u32,
    pub url: String,
    pub domain: String,
}

impl Record {
    pub fn new(keyword: impl Into<String>, volume: u64, position: u32) -> Self {
        Self {
            keyword: keyword.into(),
            volume,
            position,
            url: String::new(),
            domain: String::new(),
        }
    }

    pub fn is_ranked(&self) -> bool {
        self.position < UNRANKED_POSITION
    }
}
