use serde::{Deserialize, Deserializer};

use super::index::Coded;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub native: String,
    #[serde(default, deserialize_with = "bool_or_int")]
    pub rtl: bool,
}

impl Language {
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.native.to_lowercase().contains(needle)
    }
}

impl Coded for Language {
    fn code(&self) -> &str {
        &self.code
    }
}

// Some dumps of the language list encode rtl as 0/1.
fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u8),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(n) => Err(serde::de::Error::custom(format!(
            "invalid rtl flag {}; expected 0 or 1",
            n
        ))),
    }
}
