pub mod post;
pub mod product;
pub mod research;
