pub mod game;
pub mod scoring;
pub mod secret;
pub mod timer;
