pub mod fit;
pub mod job;
pub mod message;
pub mod outcome;
pub mod profile;
