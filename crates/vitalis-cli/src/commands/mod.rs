pub mod boost;
pub mod facts;
pub mod sleep;
pub mod status;
