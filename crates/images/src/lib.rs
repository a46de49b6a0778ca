//! Image resolution for the public site and the admin console.
//!
//! [`ImageResolver`] answers "which URL should this slot show?" without ever
//! blocking on the network. It starts from the hardcoded defaults, adopts a
//! cached registry when one is fresh, and refreshes from the backend in the
//! background through a [`RegistrySource`].

pub mod cache;
pub mod loader;
pub mod resolver;
pub mod source;

pub use cache::{CachedRegistry, RegistryCache, CACHE_VERSION};
pub use loader::{HttpImageLoader, ImageInfo, ImageLoader, LoadError};
pub use resolver::{ImageResolver, PreloadError, RefreshOutcome, ResolverState};
pub use source::RegistrySource;
