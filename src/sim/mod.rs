pub mod clock;
pub mod event;
pub mod level;
pub mod save;
pub mod session;
pub mod step;
