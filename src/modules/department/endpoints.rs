use super::repository::Department;
use crate::{
    controller::{self, Controller, Operation, ResponseShape, Route},
    repository::{PgRepository, Repository},
    router::{Endpoint, Method},
    types::Context,
};
use std::sync::Arc;

const ROUTES: &[Route] = &[Route {
    name: "GetAllDepartments",
    method: Method::Get,
    pattern: "/departments",
    operation: Operation::List(ResponseShape::Paginated),
}];

pub fn endpoints<R>(controller: Arc<Controller<R>>) -> Vec<Endpoint>
where
    R: Repository<Record = Department>,
{
    controller::endpoints(controller, ROUTES)
}

pub fn endpoint_conf(ctx: &Context) -> Vec<Endpoint> {
    let logger = ctx.logger().scoped("department");

    let controller = Controller::new(
        PgRepository::<Department>::new(ctx.database().clone(), logger.clone()),
        logger,
    );

    endpoints(Arc::new(controller))
}
