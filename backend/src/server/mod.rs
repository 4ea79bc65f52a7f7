//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::Clock;

use backend::RequestScope;
use backend::domain::ports::TracingLifecycleHook;
use backend::domain::{ContextAuditorProvider, UserAccount, UserAccountService};
use backend::inbound::http::state::HttpState;
use backend::inbound::http::{configure, route_not_found};
use backend::middleware::FaultDisclosure;
use backend::outbound::persistence::InMemoryEntityRepository;

/// Wire the user account service over an in-memory repository.
fn build_http_state(clock: Arc<dyn Clock>) -> web::Data<HttpState> {
    let repository = InMemoryEntityRepository::<UserAccount>::new(clock)
        .with_hook(Arc::new(TracingLifecycleHook));
    let users = UserAccountService::new(Arc::new(repository), Arc::new(ContextAuditorProvider));
    web::Data::new(HttpState::new(Arc::new(users)))
}

fn build_app(
    http_state: web::Data<HttpState>,
    disclosure: FaultDisclosure,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(http_state)
        .wrap(RequestScope::new(disclosure))
        .configure(configure)
        .default_service(web::to(route_not_found))
}

/// Construct an Actix HTTP server from `config`.
///
/// Every worker shares one repository so writes are visible across
/// connections.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let ServerConfig {
        bind_addr,
        disclosure,
        clock,
    } = config;
    let http_state = build_http_state(clock);

    let server = HttpServer::new(move || build_app(http_state.clone(), disclosure))
        .bind(bind_addr)?
        .run();
    Ok(server)
}
