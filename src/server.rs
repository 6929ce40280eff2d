use super::handlers;
use super::AppState;

use actix_web::{guard, middleware, web, App, HttpResponse, HttpServer};

pub async fn run(app_state: &AppState) -> std::io::Result<()> {
    let app_state = app_state.clone();
    let (host, port) = (app_state.config.host.clone(), app_state.config.port);

    info!("starting server at http://{}:{}/graphql", host, port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(app_state.schema.clone()))
            .wrap(middleware::Logger::default())
            .service(
                web::resource("/graphql")
                    .route(web::post().to(handlers::graphql::graphql_handler))
                    .route(
                        web::get()
                            .guard(guard::Header("upgrade", "websocket"))
                            .to(handlers::graphql::graphql_subscription),
                    )
                    .route(web::get().to(handlers::graphql::graphql_playground)),
            )
            .service(web::resource("/health").route(web::get().to(handlers::health)))
            .service(web::resource("/flush").route(web::post().to(handlers::flush)))
            .default_service(web::route().to(|| HttpResponse::NotFound()))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
