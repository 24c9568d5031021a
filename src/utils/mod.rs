pub mod open;

pub use open::open_url;
