pub mod ai;
pub mod entity;
pub mod maze;
pub mod motion;
pub mod rules;
pub mod tile;
