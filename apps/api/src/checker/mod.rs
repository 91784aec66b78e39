// Resume checker: upload -> external scorer -> decode -> best-effort persist.
// The transient upload is removed on every exit path.
pub mod decoder;
pub mod delegate;
pub mod handlers;
pub mod sink;
pub mod upload;
