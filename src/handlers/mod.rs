pub mod form;
pub mod meme;
