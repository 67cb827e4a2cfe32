use thiserror::Error;

#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Account {0} is already registered")]
    AlreadyRegistered(String),

    #[error("Invalid account id: {0}")]
    InvalidId(String),
}

pub type Result<T> = std::result::Result<T, AccountError>;
