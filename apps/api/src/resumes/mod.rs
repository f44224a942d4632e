// Resume endpoints: listing, analytics, deletion and upload preflight checks.
// Text extraction, parsing and file storage run outside this service and
// report failures through `errors::ResumeError`.

pub mod analytics;
pub mod errors;
pub mod handlers;
pub mod upload;
