pub mod account;
pub mod action_token;
pub mod clock;
