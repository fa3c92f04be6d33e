mod chat;
mod profile;

pub use chat::*;
pub use profile::*;
