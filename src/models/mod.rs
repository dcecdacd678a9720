pub mod args;
pub mod meme;
