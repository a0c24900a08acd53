pub mod chat;
pub mod files;
pub mod health;
pub mod pages;
