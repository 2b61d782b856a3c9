//! Walk trace renderers.
//!
//! Pure consumers of the immutable walk result: nothing in here feeds back
//! into the engine.

pub mod html;
pub mod terminal;
