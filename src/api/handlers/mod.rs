pub mod entries;
pub mod health;
pub mod home;
