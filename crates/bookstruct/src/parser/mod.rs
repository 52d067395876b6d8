pub mod classify;
pub mod code;
pub mod fonts;
pub mod source;
