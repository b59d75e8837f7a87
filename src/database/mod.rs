pub mod model;
pub mod sql;
