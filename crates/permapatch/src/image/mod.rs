mod handle;
mod version;

#[cfg(test)]
pub mod mock;

pub use handle::ImageHandle;
pub use version::*;

#[cfg(test)]
pub use mock::MockImage;
