pub mod draw;
pub mod error;
pub mod scale;
pub mod spec;
pub mod theme;
