//! Reading Module
//!
//! Short practice passages and the token view the reader uses for
//! click-to-look-up words.

mod handler;
mod lib;
mod routes;

pub use lib::*;

pub use routes::routes;
