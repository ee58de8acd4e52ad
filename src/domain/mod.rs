pub mod ai;
pub mod entity;
pub mod map;
pub mod mapgen;
pub mod physics;
pub mod rules;
pub mod tile;
pub mod treasure;
