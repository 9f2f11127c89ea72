// Document text acquisition: turns an uploaded PDF or plain-text file into
// one string that the roast pipeline then validates like pasted text.

pub mod extract;
pub mod handlers;
