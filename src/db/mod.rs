pub mod access;
pub mod access_requests;
pub mod submissions;
