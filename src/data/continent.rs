use super::index::Coded;

/// A stored `{code, name}` pointer from a continent to one of its countries.
/// The name is a denormalized copy and is not kept in sync with the country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryRef {
    pub code: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continent {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub countries: Vec<CountryRef>,
}

impl Continent {
    pub fn references(&self, country_code: &str) -> bool {
        self.countries.iter().any(|r| r.code == country_code)
    }
}

impl Coded for Continent {
    fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewContinent {
    pub code: String,
    pub name: String,
    /// Country codes to reference, in order.
    pub countries: Vec<String>,
}

/// Fields to merge onto an existing continent. `countries` replaces the whole
/// reference list when present.
#[derive(Debug, Clone, Default)]
pub struct ContinentPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub countries: Option<Vec<String>>,
}
