mod schema;
pub mod types;

pub use schema::{create_schema, GraphQLSchema, MutationRoot, QueryRoot, SubscriptionRoot};
