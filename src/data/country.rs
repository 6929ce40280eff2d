use super::index::Coded;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capital: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Country {
    /// Case-insensitive substring match on name or capital. `needle` must
    /// already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .capital
                .as_ref()
                .is_some_and(|capital| capital.to_lowercase().contains(needle))
    }

    pub fn apply(&mut self, patch: CountryPatch) {
        if let Some(code) = patch.code {
            self.code = code;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if patch.capital.is_some() {
            self.capital = patch.capital;
        }
        if patch.currency.is_some() {
            self.currency = patch.currency;
        }
        if patch.phone.is_some() {
            self.phone = patch.phone;
        }
    }
}

impl Coded for Country {
    fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewCountry {
    pub code: String,
    pub name: String,
    pub capital: Option<String>,
    pub currency: Option<String>,
    pub phone: Option<String>,
}

impl From<NewCountry> for Country {
    fn from(new: NewCountry) -> Self {
        Self {
            code: new.code,
            name: new.name,
            capital: new.capital,
            currency: new.currency,
            phone: new.phone,
        }
    }
}

/// Fields to merge onto an existing country; `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct CountryPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub capital: Option<String>,
    pub currency: Option<String>,
    pub phone: Option<String>,
}
