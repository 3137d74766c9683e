pub mod navigation;
pub mod proxy;


pub use navigation::*;
pub use proxy::*;
