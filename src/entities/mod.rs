pub mod inventory_item;
pub mod location;
pub mod product;
