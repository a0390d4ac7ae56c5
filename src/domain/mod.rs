pub mod credential;
pub mod generated_post;
pub mod post;
pub mod product;
pub mod research;
