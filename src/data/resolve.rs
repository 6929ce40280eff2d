//! Derived fields of the entity graph, computed from a dataset snapshot.
//!
//! Nothing here fails: a relationship that can't be followed resolves to an
//! empty list or `None`.

use super::{Continent, Country, Dataset, Language, State};

/// The continent's stored references resolved through the country index.
/// References to unknown countries are dropped, so the result can be shorter
/// than `continent.countries`.
pub fn continent_countries<'a>(
    dataset: &'a Dataset,
    continent: &'a Continent,
) -> impl Iterator<Item = &'a Country> + 'a {
    continent
        .countries
        .iter()
        .filter_map(move |r| dataset.countries.find(&r.code))
}

/// The raw number of stored references, dangling ones included.
pub fn continent_country_count(continent: &Continent) -> usize {
    continent.countries.len()
}

pub fn country_states<'a>(dataset: &'a Dataset, country_code: &str) -> &'a [State] {
    dataset
        .states
        .find(country_code)
        .map(|group| group.states.as_slice())
        .unwrap_or(&[])
}

pub fn country_state_count(dataset: &Dataset, country_code: &str) -> usize {
    country_states(dataset, country_code).len()
}

/// The first continent that lists `country_code`.
pub fn country_continent<'a>(dataset: &'a Dataset, country_code: &str) -> Option<&'a Continent> {
    dataset
        .continents
        .iter()
        .find(|continent| continent.references(country_code))
}

/// The country a state belongs to, given the side-table group it was read
/// from.
pub fn state_country<'a>(dataset: &'a Dataset, parent_code: &str) -> Option<&'a Country> {
    dataset.countries.find(parent_code)
}

pub fn search_countries<'a>(
    dataset: &'a Dataset,
    search: &str,
) -> impl Iterator<Item = &'a Country> + 'a {
    let needle = search.to_lowercase();
    dataset
        .countries
        .iter()
        .filter(move |country| country.matches(&needle))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchHit<'a> {
    Country(&'a Country),
    /// A state together with the code of the country it is listed under.
    State(&'a str, &'a State),
    Language(&'a Language),
}

/// Countries (name, capital), then states (name), then languages (name,
/// native), each in source order. A blank keyword matches nothing.
pub fn search<'a>(dataset: &'a Dataset, keyword: &str) -> Vec<SearchHit<'a>> {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    let needle = needle.as_str();
    let countries = dataset
        .countries
        .iter()
        .filter(move |c| c.matches(needle))
        .map(SearchHit::Country);
    let states = dataset.states.iter().flat_map(move |group| {
        group
            .states
            .iter()
            .filter(move |s| s.name.to_lowercase().contains(needle))
            .map(move |s| SearchHit::State(group.code.as_str(), s))
    });
    let languages = dataset
        .languages
        .iter()
        .filter(move |l| l.matches(needle))
        .map(SearchHit::Language);
    countries.chain(states).chain(languages).collect()
}
