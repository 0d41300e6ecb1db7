pub mod access;
pub mod access_requests;
pub mod pagination;
pub mod submissions;
