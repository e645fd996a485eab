pub mod cart;
pub mod money;
pub mod order;
pub mod policy;
pub mod product;
pub mod shipping;
pub mod store;
pub mod subscription;
pub mod user;

pub use cart::*;
pub use money::*;
pub use order::*;
pub use policy::*;
pub use product::*;
pub use shipping::*;
pub use store::*;
pub use subscription::*;
pub use user::*;
