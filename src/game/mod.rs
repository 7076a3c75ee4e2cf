pub mod border;
pub mod engine;
pub mod entity;
pub mod food;
pub mod growth;
pub mod index;
pub mod movement;
pub mod overlap;
pub mod physics;
pub mod player;
pub mod snapshot;
pub mod world;
