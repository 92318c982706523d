//! Semantic Matching Server - HTTP/JSON front end of a matching service
//!
//! Exposes one service's equivalence table and its federated match queries.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /all_matches` - every stored edge, grouped by source
//! - `GET|POST /get_matches` - matches for one identifier (`MatchRequest` body)
//! - `POST /post_matches` - add edges (`{"matches": [...]}`)
//! - `POST /remove_matches` - remove edges, 404 if any is not stored
//! - `POST /clear` - drop every edge
//! - `GET /`, `/health`, `/ready`, `/metrics`
//!
//! # Configuration
//!
//! [`ServerConfig::load`] reads `.env`, an optional `matcher.{toml,yaml,json}`
//! and `SEMANTIC_MATCHER__*` environment variables, e.g.
//! `SEMANTIC_MATCHER__FEDERATION__DEADLINE=3000`.

pub mod config;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ResolverSettings, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
