pub mod generator;
pub mod reports;
pub mod seeding;
