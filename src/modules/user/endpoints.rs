use super::repository::User;
use crate::{
    controller::{self, Controller, Operation, ResponseShape, Route},
    repository::{PgRepository, Repository},
    router::{Endpoint, Method},
    types::Context,
};
use std::sync::Arc;

const ROUTES: &[Route] = &[
    Route {
        name: "GetAllUsers",
        method: Method::Get,
        pattern: "/users",
        operation: Operation::List(ResponseShape::Paginated),
    },
    Route {
        name: "GetAllUsersV2",
        method: Method::Get,
        pattern: "/v2/users",
        operation: Operation::List(ResponseShape::Records),
    },
];

pub fn endpoints<R>(controller: Arc<Controller<R>>) -> Vec<Endpoint>
where
    R: Repository<Record = User>,
{
    controller::endpoints(controller, ROUTES)
}

pub fn endpoint_conf(ctx: &Context) -> Vec<Endpoint> {
    let logger = ctx.logger().scoped("user");

    let controller = Controller::new(
        PgRepository::<User>::new(ctx.database().clone(), logger.clone()),
        logger,
    );

    endpoints(Arc::new(controller))
}
