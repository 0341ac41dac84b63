//! Adventure Module
//!
//! The record behind the interactive-fiction mode: sessions (conversations) and
//! their turns (messages). Narrator replies and scene images come from external
//! providers; this module only stores what is said.

mod handler;
mod lib;
mod routes;

pub use lib::*;

pub use routes::routes;

pub fn migrations() -> &'static [(&'static str, &'static str)] {
    &[(
        "adventure_001_schema.sql",
        include_str!("migrations/001_schema.sql"),
    )]
}
