mod static_credentials;

pub use static_credentials::StaticCredentials;
