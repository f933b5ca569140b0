pub mod plan;
pub mod provision;
pub mod verify;
