// OAuth client-credentials exchange

pub mod token;

pub use token::fetch_token_impl;
