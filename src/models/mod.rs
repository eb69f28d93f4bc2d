pub mod image;
pub mod listing;
pub mod price;
pub mod product;
pub mod search;

pub use image::*;
pub use listing::*;
pub use price::*;
pub use product::*;
pub use search::*;
