pub mod accounts;
pub mod migration;
