pub mod account;
pub mod action_token;

pub use account::PostgresAccountRepository;
pub use action_token::PostgresActionTokenRepository;
