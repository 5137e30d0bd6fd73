pub mod decision;
pub mod health;
