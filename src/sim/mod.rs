pub mod dig;
pub mod event;
pub mod game;
pub mod interact;
pub mod level;
pub mod save;
pub mod scheduler;
pub mod step;
pub mod view;
pub mod world;
