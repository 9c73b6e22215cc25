pub mod db;
pub mod errors;
pub mod helpers;
pub mod media;
pub mod multipart;
pub mod query_params;
pub mod token;
