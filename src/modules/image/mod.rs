pub mod middleware;
pub mod routes;

pub use routes::get_router;
