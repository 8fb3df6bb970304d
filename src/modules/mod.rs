pub mod department;
pub mod health;
pub mod user;

use crate::{router::Endpoint, types::Context};

/// Every endpoint the service serves, bound to the resources in `ctx`.
pub fn endpoint_conf(ctx: &Context) -> Vec<Endpoint> {
    let mut endpoints = health::endpoint_conf(ctx);
    endpoints.extend(department::endpoint_conf(ctx));
    endpoints.extend(user::endpoint_conf(ctx));
    endpoints
}
