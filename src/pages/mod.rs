pub mod courses;
pub mod home;
pub mod not_found;
