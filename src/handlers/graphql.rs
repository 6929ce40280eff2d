use crate::graphql::GraphQLSchema;
use crate::handlers::HandlerError;
use actix_web::{web, HttpRequest, HttpResponse, Result};
use async_graphql::http::{playground_source, GraphQLPlaygroundConfig};
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse, GraphQLSubscription};

/// GraphQL endpoint handler
pub async fn graphql_handler(
    schema: web::Data<GraphQLSchema>,
    req: GraphQLRequest,
) -> Result<GraphQLResponse, HandlerError> {
    let request = req.into_inner();
    debug!(
        "graphql operation {}",
        request.operation_name.as_deref().unwrap_or("<anonymous>")
    );
    let response = schema.execute(request).await;
    if response.is_err() {
        debug!("graphql operation returned {} errors", response.errors.len());
    }
    Ok(GraphQLResponse::from(response))
}

/// Subscriptions over WebSocket on the same path as queries
pub async fn graphql_subscription(
    schema: web::Data<GraphQLSchema>,
    req: HttpRequest,
    payload: web::Payload,
) -> Result<HttpResponse> {
    debug!("websocket upgrade from {:?}", req.peer_addr());
    GraphQLSubscription::new(GraphQLSchema::clone(&schema)).start(&req, payload)
}

/// GraphQL Playground handler for development/testing
pub async fn graphql_playground() -> Result<HttpResponse, HandlerError> {
    trace!("serving playground");
    let source = playground_source(
        GraphQLPlaygroundConfig::new("/graphql").subscription_endpoint("/graphql"),
    );
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Dataset, DatasetStore, NewCountry};
    use crate::graphql::create_schema;
    use actix_web::{test, App};
    use serde_json::json;
    use std::sync::Arc;

    fn schema() -> GraphQLSchema {
        let store = DatasetStore::new(Dataset::default());
        store
            .create_country(NewCountry {
                code: "FR".to_string(),
                name: "France".to_string(),
                ..Default::default()
            })
            .unwrap();
        create_schema(Arc::new(store))
    }

    #[actix_web::test]
    async fn named_operation_is_executed() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(schema()))
                .route("/graphql", web::post().to(graphql_handler)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/graphql")
            .set_json(json!({
                "query": "query Codes { countries { code } } query Names { countries { name } }",
                "operationName": "Names",
            }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(json!({"data": {"countries": [{"name": "France"}]}}), body);
    }

    #[actix_web::test]
    async fn errors_are_returned_in_the_body() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(schema()))
                .route("/graphql", web::post().to(graphql_handler)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/graphql")
            .set_json(json!({"query": "mutation { deleteCountry(code: \"ZZ\") }"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!("NOT_FOUND", body["errors"][0]["extensions"]["code"]);
    }

    #[actix_web::test]
    async fn playground_is_html() {
        let app =
            test::init_service(App::new().route("/graphql", web::get().to(graphql_playground)))
                .await;
        let req = test::TestRequest::get().uri("/graphql").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        assert!(std::str::from_utf8(&body).unwrap().contains("/graphql"));
    }
}
