use crate::data::{resolve, DataError, DatasetStore};
use crate::graphql::types::*;
use async_graphql::*;
use futures::stream::{self, Stream};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

pub type GraphQLSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

fn store<'a>(ctx: &Context<'a>) -> Result<&'a Arc<DatasetStore>> {
    ctx.data::<Arc<DatasetStore>>()
}

impl ErrorExtensions for DataError {
    fn extend(&self) -> Error {
        Error::new(self.to_string()).extend_with(|_, e| match self {
            DataError::NotFound { kind, code } => {
                e.set("code", "NOT_FOUND");
                e.set("entity", kind.to_string());
                e.set("key", code.as_str());
            }
            DataError::StateNotFound { country_code, code } => {
                e.set("code", "NOT_FOUND");
                e.set("entity", "State");
                e.set("key", code.as_str());
                e.set("countryCode", country_code.as_str());
            }
            DataError::DuplicateKey { kind, code } => {
                e.set("code", "DUPLICATE_KEY");
                e.set("entity", kind.to_string());
                e.set("key", code.as_str());
            }
            DataError::DuplicateState { country_code, code } => {
                e.set("code", "DUPLICATE_KEY");
                e.set("entity", "State");
                e.set("key", code.as_str());
                e.set("countryCode", country_code.as_str());
            }
            DataError::Persist(_) => e.set("code", "INTERNAL"),
        })
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// All continents
    async fn continents(&self, ctx: &Context<'_>) -> Result<Vec<Continent>> {
        debug!("query continents");
        Ok(store(ctx)?.continents().into_iter().map(Continent).collect())
    }

    /// A continent by code
    async fn continent(&self, ctx: &Context<'_>, code: String) -> Result<Option<Continent>> {
        debug!("query continent {}", code);
        Ok(store(ctx)?.continent(&code).map(Continent))
    }

    /// All countries
    async fn countries(&self, ctx: &Context<'_>) -> Result<Vec<Country>> {
        debug!("query countries");
        Ok(store(ctx)?.countries().into_iter().map(Country).collect())
    }

    /// A country by code
    async fn country(&self, ctx: &Context<'_>, code: String) -> Result<Option<Country>> {
        debug!("query country {}", code);
        Ok(store(ctx)?.country(&code).map(Country))
    }

    /// All languages
    async fn languages(&self, ctx: &Context<'_>) -> Result<Vec<Language>> {
        debug!("query languages");
        Ok(store(ctx)?
            .languages()
            .into_iter()
            .map(Language::from)
            .collect())
    }

    /// A language by code
    async fn language(&self, ctx: &Context<'_>, code: String) -> Result<Option<Language>> {
        debug!("query language {}", code);
        Ok(store(ctx)?.language(&code).map(Language::from))
    }

    /// States of a country; empty for a country without any
    async fn states(&self, ctx: &Context<'_>, country_code: String) -> Result<Vec<State>> {
        debug!("query states of {}", country_code);
        Ok(store(ctx)?
            .states(&country_code)
            .into_iter()
            .map(|s| State::new(s, &country_code))
            .collect())
    }

    /// Countries whose name or capital contains `search`, ignoring case
    async fn search_countries(&self, ctx: &Context<'_>, search: String) -> Result<Vec<Country>> {
        debug!("query searchCountries {:?}", search);
        Ok(store(ctx)?
            .search_countries(&search)
            .into_iter()
            .map(Country)
            .collect())
    }

    /// Countries, states and languages whose names contain `keyword`, ignoring case
    async fn search(&self, ctx: &Context<'_>, keyword: String) -> Result<Vec<SearchResult>> {
        debug!("query search {:?}", keyword);
        Ok(store(ctx)?.read(|ds| {
            resolve::search(ds, &keyword)
                .into_iter()
                .map(SearchResult::from)
                .collect()
        }))
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Add a country; the code must be unused
    async fn create_country(&self, ctx: &Context<'_>, input: CountryInput) -> Result<Country> {
        store(ctx)?
            .create_country(input.into())
            .map(Country)
            .map_err(|e| e.extend())
    }

    /// Change the given fields of a country
    async fn update_country(
        &self,
        ctx: &Context<'_>,
        code: String,
        input: UpdateCountryInput,
    ) -> Result<Country> {
        store(ctx)?
            .update_country(&code, input.into())
            .map(Country)
            .map_err(|e| e.extend())
    }

    async fn delete_country(&self, ctx: &Context<'_>, code: String) -> Result<bool> {
        store(ctx)?.delete_country(&code).map_err(|e| e.extend())
    }

    /// Add a continent; the code must be unused
    async fn create_continent(
        &self,
        ctx: &Context<'_>,
        input: ContinentInput,
    ) -> Result<Continent> {
        store(ctx)?
            .create_continent(input.into())
            .map(Continent)
            .map_err(|e| e.extend())
    }

    async fn update_continent(
        &self,
        ctx: &Context<'_>,
        code: String,
        input: UpdateContinentInput,
    ) -> Result<Continent> {
        store(ctx)?
            .update_continent(&code, input.into())
            .map(Continent)
            .map_err(|e| e.extend())
    }

    async fn delete_continent(&self, ctx: &Context<'_>, code: String) -> Result<bool> {
        store(ctx)?.delete_continent(&code).map_err(|e| e.extend())
    }

    /// Add a state to a country that already has a state list
    async fn create_state(&self, ctx: &Context<'_>, input: StateInput) -> Result<State> {
        let country_code = input.country_code.clone();
        store(ctx)?
            .create_state(input.into())
            .map(|s| State::new(s, &country_code))
            .map_err(|e| e.extend())
    }

    /// Rename a state
    async fn update_state(
        &self,
        ctx: &Context<'_>,
        country_code: String,
        code: String,
        name: String,
    ) -> Result<State> {
        store(ctx)?
            .update_state(&country_code, &code, name)
            .map(|s| State::new(s, &country_code))
            .map_err(|e| e.extend())
    }

    async fn delete_state(
        &self,
        ctx: &Context<'_>,
        country_code: String,
        code: String,
    ) -> Result<bool> {
        store(ctx)?
            .delete_state(&country_code, &code)
            .map_err(|e| e.extend())
    }
}

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Every country created after subscribing
    async fn country_added(&self, ctx: &Context<'_>) -> Result<impl Stream<Item = Country>> {
        let rx = store(ctx)?.subscribe_country_added();
        debug!("new countryAdded subscriber");
        Ok(stream::unfold(rx, |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(country) => return Some((Country(country), rx)),
                    Err(RecvError::Lagged(missed)) => {
                        warn!("countryAdded subscriber lagged; dropped {} events", missed)
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }))
    }
}

pub fn create_schema(store: Arc<DatasetStore>) -> GraphQLSchema {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(store)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Dataset;
    use futures::{FutureExt, StreamExt};
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;

    fn init_logger() {
        let _ = pretty_env_logger::env_logger::builder()
            .is_test(true)
            .try_init();
    }

    fn fixture(continents: serde_json::Value) -> GraphQLSchema {
        init_logger();
        let countries = json!([
            {"code": "IN", "name": "India", "currency": "INR", "phone": "91"},
            {"code": "ID", "name": "Indonesia", "capital": "Jakarta", "currency": "IDR", "phone": "62"},
            {"code": "US", "name": "United States", "capital": "Washington D.C.", "currency": "USD", "phone": "1"},
        ]);
        let states = json!([
            {"code": "US", "states": [
                {"code": "CA", "name": "California"},
                {"code": "NY", "name": "New York"},
            ]},
        ]);
        let languages = json!([
            {"code": "hi", "name": "Hindi", "native": "हिन्दी", "rtl": false},
            {"code": "ar", "name": "Arabic", "native": "العربية", "rtl": true},
        ]);
        let dataset = Dataset::new(
            serde_json::from_value(continents).unwrap(),
            serde_json::from_value(countries).unwrap(),
            serde_json::from_value(states).unwrap(),
            serde_json::from_value(languages).unwrap(),
        );
        create_schema(Arc::new(DatasetStore::new(dataset)))
    }

    fn schema() -> GraphQLSchema {
        fixture(json!([
            {"code": "AS", "name": "Asia", "countries": [{"code": "IN", "name": "India"}, {"code": "ID", "name": "Indonesia"}]},
            {"code": "NA", "name": "North America", "countries": [{"code": "US", "name": "United States"}]},
        ]))
    }

    async fn run(schema: &GraphQLSchema, query: &str) -> serde_json::Value {
        let response = schema.execute(query).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        response.data.into_json().unwrap()
    }

    #[tokio::test]
    async fn continent_counts_agree() {
        let schema = fixture(json!([
            {"code": "AS", "name": "Asia", "countries": [{"code": "IN"}]},
        ]));
        let data = run(
            &schema,
            r#"{
                continent(code: "AS") { countryCount countries { code } }
                country(code: "IN") { continent { code } }
            }"#,
        )
        .await;
        assert_eq!(
            json!({
                "continent": {"countryCount": 1, "countries": [{"code": "IN"}]},
                "country": {"continent": {"code": "AS"}},
            }),
            data
        );
    }

    #[tokio::test]
    async fn dangling_reference_is_filtered_but_counted() {
        let schema = fixture(json!([
            {"code": "AS", "name": "Asia", "countries": [{"code": "IN"}, {"code": "ZZ"}]},
        ]));
        let data = run(
            &schema,
            r#"{ continent(code: "AS") { countryCount countries { code } } }"#,
        )
        .await;
        assert_eq!(
            json!({"continent": {"countryCount": 2, "countries": [{"code": "IN"}]}}),
            data
        );
    }

    #[tokio::test]
    async fn missing_reads_are_null_or_empty() {
        let schema = schema();
        let data = run(
            &schema,
            r#"{
                continent(code: "XX") { code }
                country(code: "ZZ") { code }
                language(code: "zz") { code }
                states(countryCode: "ZZ") { code }
                searchCountries(search: "atlantis") { code }
            }"#,
        )
        .await;
        assert_eq!(
            json!({
                "continent": null,
                "country": null,
                "language": null,
                "states": [],
                "searchCountries": [],
            }),
            data
        );
    }

    #[tokio::test]
    async fn nested_states_resolve_their_country() {
        let schema = schema();
        let data = run(
            &schema,
            r#"{
                country(code: "US") {
                    stateCount
                    states { code country { name continent { name } } }
                }
                states(countryCode: "US") { name countryCode }
            }"#,
        )
        .await;
        assert_eq!(
            json!({
                "country": {
                    "stateCount": 2,
                    "states": [
                        {"code": "CA", "country": {"name": "United States", "continent": {"name": "North America"}}},
                        {"code": "NY", "country": {"name": "United States", "continent": {"name": "North America"}}},
                    ],
                },
                "states": [
                    {"name": "California", "countryCode": "US"},
                    {"name": "New York", "countryCode": "US"},
                ],
            }),
            data
        );
    }

    #[tokio::test]
    async fn country_without_states() {
        let schema = schema();
        let data = run(
            &schema,
            r#"{ country(code: "IN") { stateCount states { code } capital } }"#,
        )
        .await;
        assert_eq!(
            json!({"country": {"stateCount": 0, "states": [], "capital": null}}),
            data
        );
    }

    #[tokio::test]
    async fn search_countries_matches_name_ignoring_case() {
        let schema = schema();
        let data = run(&schema, r#"{ searchCountries(search: "IND") { code } }"#).await;
        assert_eq!(
            json!({"searchCountries": [{"code": "IN"}, {"code": "ID"}]}),
            data
        );
    }

    #[tokio::test]
    async fn search_returns_union_members() {
        let schema = schema();
        let data = run(
            &schema,
            r#"{
                search(keyword: "ar") {
                    __typename
                    ... on Country { code }
                    ... on State { code countryCode }
                    ... on Language { code rtl }
                }
            }"#,
        )
        .await;
        assert_eq!(
            json!({"search": [
                {"__typename": "Country", "code": "ID"},
                {"__typename": "Language", "code": "ar", "rtl": true},
            ]}),
            data
        );

        let data = run(
            &schema,
            r#"{ search(keyword: "new") { __typename ... on State { code countryCode } } }"#,
        )
        .await;
        assert_eq!(
            json!({"search": [{"__typename": "State", "code": "NY", "countryCode": "US"}]}),
            data
        );
    }

    #[tokio::test]
    async fn country_lifecycle() {
        let schema = schema();
        let data = run(
            &schema,
            r#"mutation {
                createCountry(input: {code: "FR", name: "France", capital: "Paris", currency: "EUR", phone: "33"}) { code name }
            }"#,
        )
        .await;
        assert_eq!(
            json!({"createCountry": {"code": "FR", "name": "France"}}),
            data
        );

        run(
            &schema,
            r#"mutation { updateCountry(code: "FR", input: {capital: "Lyon"}) { code } }"#,
        )
        .await;
        let data = run(&schema, r#"{ country(code: "FR") { name capital currency } }"#).await;
        assert_eq!(
            json!({"country": {"name": "France", "capital": "Lyon", "currency": "EUR"}}),
            data
        );

        let data = run(&schema, r#"mutation { deleteCountry(code: "FR") }"#).await;
        assert_eq!(json!({"deleteCountry": true}), data);
        let data = run(&schema, r#"{ country(code: "FR") { code } }"#).await;
        assert_eq!(json!({"country": null}), data);
    }

    #[tokio::test]
    async fn write_errors_carry_code_and_key() {
        let schema = schema();
        let response = schema
            .execute(r#"mutation { updateCountry(code: "ZZ", input: {name: "Nowhere"}) { code } }"#)
            .await;
        assert_eq!(1, response.errors.len());
        let error = serde_json::to_value(&response.errors[0]).unwrap();
        assert_eq!("Country with code ZZ not found", error["message"]);
        assert_eq!("NOT_FOUND", error["extensions"]["code"]);
        assert_eq!("ZZ", error["extensions"]["key"]);

        let response = schema
            .execute(r#"mutation { deleteState(countryCode: "US", code: "NOPE") }"#)
            .await;
        let error = serde_json::to_value(&response.errors[0]).unwrap();
        assert_eq!("State", error["extensions"]["entity"]);
        assert_eq!("US", error["extensions"]["countryCode"]);

        let response = schema
            .execute(r#"mutation { deleteState(countryCode: "ZZ", code: "CA") }"#)
            .await;
        let error = serde_json::to_value(&response.errors[0]).unwrap();
        assert_eq!("Country", error["extensions"]["entity"]);

        let response = schema
            .execute(r#"mutation { createCountry(input: {code: "IN", name: "India"}) { code } }"#)
            .await;
        let error = serde_json::to_value(&response.errors[0]).unwrap();
        assert_eq!("DUPLICATE_KEY", error["extensions"]["code"]);
    }

    #[tokio::test]
    async fn state_mutations() {
        let schema = schema();
        let data = run(
            &schema,
            r#"mutation {
                createState(input: {code: "TX", name: "Texas", countryCode: "US"}) { code country { code } }
                updateState(countryCode: "US", code: "NY", name: "New York State") { name }
                deleteState(countryCode: "US", code: "CA")
            }"#,
        )
        .await;
        assert_eq!(
            json!({
                "createState": {"code": "TX", "country": {"code": "US"}},
                "updateState": {"name": "New York State"},
                "deleteState": true,
            }),
            data
        );
        let data = run(&schema, r#"{ states(countryCode: "US") { code name } }"#).await;
        assert_eq!(
            json!({"states": [
                {"code": "NY", "name": "New York State"},
                {"code": "TX", "name": "Texas"},
            ]}),
            data
        );
    }

    #[tokio::test]
    async fn continent_mutations() {
        let schema = schema();
        let data = run(
            &schema,
            r#"mutation {
                createContinent(input: {code: "EU", name: "Europe"}) { code countryCount countries { code } }
                updateContinent(code: "EU", input: {countries: ["IN", "XX"]}) { countryCount countries { code } }
            }"#,
        )
        .await;
        assert_eq!(
            json!({
                "createContinent": {"code": "EU", "countryCount": 0, "countries": []},
                "updateContinent": {"countryCount": 2, "countries": [{"code": "IN"}]},
            }),
            data
        );
        let data = run(&schema, r#"mutation { deleteContinent(code: "EU") }"#).await;
        assert_eq!(json!({"deleteContinent": true}), data);
    }

    #[tokio::test]
    async fn country_added_subscription() {
        let schema = schema();
        let mut stream = schema.execute_stream("subscription { countryAdded { code name } }");
        // first poll registers the subscriber
        assert!(stream.next().now_or_never().is_none());

        run(
            &schema,
            r#"mutation { createCountry(input: {code: "FR", name: "France"}) { code } }"#,
        )
        .await;

        let response = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .unwrap()
            .unwrap();
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        assert_eq!(
            json!({"countryAdded": {"code": "FR", "name": "France"}}),
            response.data.into_json().unwrap()
        );
    }

    #[tokio::test]
    async fn shipped_data_serves_every_country() {
        init_logger();
        let store = DatasetStore::open(&Path::new(env!("CARGO_MANIFEST_DIR")).join("data"), false)
            .unwrap();
        let expected: Vec<_> = store.countries().into_iter().map(|c| c.code).collect();
        let schema = create_schema(Arc::new(store));
        let data = run(&schema, "{ countries { code } }").await;
        let codes: Vec<_> = data["countries"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["code"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(expected, codes);
    }

    #[test]
    fn sdl_exposes_operations() {
        let sdl = schema().sdl();
        for type_name in ["type Continent", "type Country", "type State", "type Language"] {
            assert!(sdl.contains(type_name), "missing {}", type_name);
        }
        assert!(sdl.contains("union SearchResult = Country | State | Language"));
        assert!(sdl.contains("input CountryInput"));
        assert!(sdl.contains("input StateInput"));
        for field in [
            "continents",
            "searchCountries(search: String!)",
            "createCountry(input: CountryInput!)",
            "deleteState(",
            "countryAdded",
        ] {
            assert!(sdl.contains(field), "missing {}", field);
        }
    }
}
