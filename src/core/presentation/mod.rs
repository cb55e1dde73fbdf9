pub mod slide_deck;

pub use slide_deck::create_presentation;
