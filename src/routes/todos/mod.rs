pub mod dto;
pub mod model;
pub mod normalize;
pub mod routes;
