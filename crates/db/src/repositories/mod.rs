pub mod appointment;
pub mod audit;
pub mod user;
pub mod working_hours;
