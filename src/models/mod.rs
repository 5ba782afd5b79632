pub mod attribute;
pub mod price;
pub mod recipe;
pub mod user;

pub use attribute::*;
pub use price::*;
pub use recipe::*;
pub use user::*;
