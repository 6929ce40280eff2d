use super::index::Coded;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub code: String,
    pub name: String,
}

/// One row of the states side table: every state of the country `code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateGroup {
    pub code: String,
    #[serde(default)]
    pub states: Vec<State>,
}

impl StateGroup {
    pub fn position(&self, state_code: &str) -> Option<usize> {
        self.states.iter().position(|s| s.code == state_code)
    }
}

impl Coded for StateGroup {
    fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewState {
    pub code: String,
    pub name: String,
    pub country_code: String,
}
