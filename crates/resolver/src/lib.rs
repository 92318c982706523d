//! # Semantic Resolver (`resolver`)
//!
//! Maps a semantic identifier to the base URL of the matching service that is
//! authoritative for its namespace. The namespace is the leading segment of
//! the identifier (`remote-service.com` in `remote-service.com/semanticID/tres`).
//!
//! Two implementations of [`Resolver`] ship here:
//!
//! - [`HttpResolver`] asks a service directory
//!   (`GET {directory}/get_semantic_matching_service`) and caches answers per
//!   namespace.
//! - [`StaticResolver`] serves a fixed map.
//!
//! Resolution never errors. Failures come back as
//! [`Resolution::Unresolved`] with an [`UnresolvedReason`].
//!
//! ```
//! use resolver::{namespace_of, Resolution, Resolver, StaticResolver};
//!
//! # tokio_test_block(async {
//! let resolver = StaticResolver::new().with_namespace("remote-service.com", "http://remote:8000");
//! let resolution = resolver.resolve("remote-service.com/semanticID/tres").await;
//! assert_eq!(resolution.endpoint().map(|e| e.as_str()), Some("http://remote:8000"));
//! assert_eq!(namespace_of("remote-service.com/semanticID/tres"), Some("remote-service.com"));
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f);
//! # }
//! ```

mod cache;
mod http;
mod namespace;
mod static_resolver;
mod types;

pub use crate::cache::ResolutionCache;
pub use crate::http::{HttpResolver, DEFAULT_CACHE_TTL, DEFAULT_RESOLVER_TIMEOUT, DIRECTORY_ROUTE};
pub use crate::namespace::{namespace_of, same_namespace, NAMESPACE_SEPARATOR};
pub use crate::static_resolver::StaticResolver;
pub use crate::types::{Endpoint, Resolution, Resolver, ResolverError, UnresolvedReason};
