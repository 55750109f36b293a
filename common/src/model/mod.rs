pub mod group;
pub mod guest;
pub mod message;
pub mod roster;
