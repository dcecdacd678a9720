pub mod catalogue;
pub mod examples;
pub mod meme;
pub mod registry;
