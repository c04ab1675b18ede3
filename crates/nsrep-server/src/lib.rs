//! HTTP server for the nsrep metadata repository.
//!
//! Routes:
//!
//! | Method | Path | |
//! |---|---|---|
//! | GET, POST, DELETE | `/items/*id` | read, write, delete (with subtree) |
//! | GET | `/history/*id?limit=` | stored versions, newest first |
//! | GET | `/search?query=&from=&length=&facets=` | paged search |
//! | GET, POST | `/graphql` | schema in SDL, selection documents |
//! | GET | `/health` | liveness |

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::{build_router, AppState};
pub use server::NsrepServer;
