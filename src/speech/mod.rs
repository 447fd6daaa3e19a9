pub mod session;
pub mod worker;
