pub mod invoice;
pub mod product;
