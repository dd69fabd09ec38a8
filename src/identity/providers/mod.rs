pub mod cognito;

pub use cognito::{CognitoProvider, CognitoSettings};
