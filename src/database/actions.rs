mod favorites;
mod ingredients;
mod pool;
mod recipes;
mod shopping_list;
mod subscriptions;
mod tags;
mod users;

pub use favorites::*;
pub use ingredients::*;
pub use pool::*;
pub use recipes::*;
pub use shopping_list::*;
pub use subscriptions::*;
pub use tags::*;
pub use users::*;
