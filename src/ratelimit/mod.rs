pub mod clock;
pub mod cooldown;
