use crate::data::{self, resolve, DatasetStore};
use async_graphql::*;
use std::sync::Arc;

/// A continent and the countries it lists
pub struct Continent(pub data::Continent);

#[Object]
impl Continent {
    /// Continent code, e.g. "AS"
    async fn code(&self) -> &str {
        &self.0.code
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    /// Listed countries that exist in the dataset; unknown codes are skipped
    async fn countries(&self, ctx: &Context<'_>) -> Result<Vec<Country>> {
        let store = ctx.data::<Arc<DatasetStore>>()?;
        trace!("resolve Continent.countries for {}", self.0.code);
        Ok(store.read(|ds| {
            resolve::continent_countries(ds, &self.0)
                .cloned()
                .map(Country)
                .collect()
        }))
    }

    /// Number of listed country codes, including unknown ones
    async fn country_count(&self) -> usize {
        resolve::continent_country_count(&self.0)
    }
}

/// A country
pub struct Country(pub data::Country);

#[Object]
impl Country {
    /// ISO 3166 alpha-2 code
    async fn code(&self) -> &str {
        &self.0.code
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn capital(&self) -> Option<&str> {
        self.0.capital.as_deref()
    }

    async fn currency(&self) -> Option<&str> {
        self.0.currency.as_deref()
    }

    /// Calling code without the leading "+"
    async fn phone(&self) -> Option<&str> {
        self.0.phone.as_deref()
    }

    async fn states(&self, ctx: &Context<'_>) -> Result<Vec<State>> {
        let store = ctx.data::<Arc<DatasetStore>>()?;
        trace!("resolve Country.states for {}", self.0.code);
        Ok(store.read(|ds| {
            resolve::country_states(ds, &self.0.code)
                .iter()
                .map(|s| State::new(s.clone(), &self.0.code))
                .collect()
        }))
    }

    async fn state_count(&self, ctx: &Context<'_>) -> Result<usize> {
        let store = ctx.data::<Arc<DatasetStore>>()?;
        Ok(store.read(|ds| resolve::country_state_count(ds, &self.0.code)))
    }

    /// The first continent listing this country
    async fn continent(&self, ctx: &Context<'_>) -> Result<Option<Continent>> {
        let store = ctx.data::<Arc<DatasetStore>>()?;
        trace!("resolve Country.continent for {}", self.0.code);
        Ok(store.read(|ds| {
            resolve::country_continent(ds, &self.0.code)
                .cloned()
                .map(Continent)
        }))
    }
}

/// A state, province or region of a country
pub struct State {
    pub state: data::State,
    pub country_code: String,
}

impl State {
    pub fn new(state: data::State, country_code: &str) -> Self {
        Self {
            state,
            country_code: country_code.to_string(),
        }
    }
}

#[Object]
impl State {
    async fn code(&self) -> &str {
        &self.state.code
    }

    async fn name(&self) -> &str {
        &self.state.name
    }

    /// Code of the country this state is listed under
    async fn country_code(&self) -> &str {
        &self.country_code
    }

    async fn country(&self, ctx: &Context<'_>) -> Result<Option<Country>> {
        let store = ctx.data::<Arc<DatasetStore>>()?;
        trace!("resolve State.country for {}", self.state.code);
        Ok(store.read(|ds| {
            resolve::state_country(ds, &self.country_code)
                .cloned()
                .map(Country)
        }))
    }
}

/// A language
#[derive(SimpleObject)]
pub struct Language {
    /// ISO 639-1 code
    pub code: String,
    /// English name
    pub name: String,
    /// Name in the language itself
    pub native: String,
    /// Whether the language is written right to left
    pub rtl: bool,
}

impl From<data::Language> for Language {
    fn from(language: data::Language) -> Self {
        Self {
            code: language.code,
            name: language.name,
            native: language.native,
            rtl: language.rtl,
        }
    }
}

/// Anything the search query can match
#[derive(Union)]
pub enum SearchResult {
    Country(Country),
    State(State),
    Language(Language),
}

impl From<resolve::SearchHit<'_>> for SearchResult {
    fn from(hit: resolve::SearchHit<'_>) -> Self {
        match hit {
            resolve::SearchHit::Country(c) => SearchResult::Country(Country(c.clone())),
            resolve::SearchHit::State(country_code, s) => {
                SearchResult::State(State::new(s.clone(), country_code))
            }
            resolve::SearchHit::Language(l) => SearchResult::Language(l.clone().into()),
        }
    }
}

/// Input for creating a country
#[derive(InputObject)]
pub struct CountryInput {
    pub code: String,
    pub name: String,
    pub capital: Option<String>,
    pub currency: Option<String>,
    pub phone: Option<String>,
}

impl From<CountryInput> for data::NewCountry {
    fn from(input: CountryInput) -> Self {
        Self {
            code: input.code,
            name: input.name,
            capital: input.capital,
            currency: input.currency,
            phone: input.phone,
        }
    }
}

/// Fields to change on a country; omitted fields keep their value
#[derive(InputObject)]
pub struct UpdateCountryInput {
    pub code: Option<String>,
    pub name: Option<String>,
    pub capital: Option<String>,
    pub currency: Option<String>,
    pub phone: Option<String>,
}

impl From<UpdateCountryInput> for data::CountryPatch {
    fn from(input: UpdateCountryInput) -> Self {
        Self {
            code: input.code,
            name: input.name,
            capital: input.capital,
            currency: input.currency,
            phone: input.phone,
        }
    }
}

/// Input for creating a continent
#[derive(InputObject)]
pub struct ContinentInput {
    pub code: String,
    pub name: String,
    /// Codes of the countries on this continent
    #[graphql(default)]
    pub countries: Vec<String>,
}

impl From<ContinentInput> for data::NewContinent {
    fn from(input: ContinentInput) -> Self {
        Self {
            code: input.code,
            name: input.name,
            countries: input.countries,
        }
    }
}

/// Fields to change on a continent; `countries` replaces the whole list
#[derive(InputObject)]
pub struct UpdateContinentInput {
    pub code: Option<String>,
    pub name: Option<String>,
    pub countries: Option<Vec<String>>,
}

impl From<UpdateContinentInput> for data::ContinentPatch {
    fn from(input: UpdateContinentInput) -> Self {
        Self {
            code: input.code,
            name: input.name,
            countries: input.countries,
        }
    }
}

/// Input for adding a state to a country's list
#[derive(InputObject)]
pub struct StateInput {
    pub code: String,
    pub name: String,
    pub country_code: String,
}

impl From<StateInput> for data::NewState {
    fn from(input: StateInput) -> Self {
        Self {
            code: input.code,
            name: input.name,
            country_code: input.country_code,
        }
    }
}
