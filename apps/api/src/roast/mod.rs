// Resume roast pipeline: sanitize → compose → invoke → extract.
// All model calls go through llm_client; no direct Anthropic calls here.

pub mod extractor;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod sanitizer;
pub mod schema;
