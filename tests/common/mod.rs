pub mod entities;
pub mod stores;

#[allow(unused_imports)]
pub use entities::{user, users};
#[allow(unused_imports)]
pub use stores::CountingStore;
