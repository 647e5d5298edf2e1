//! HTTP REST API endpoints.
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/api/search-users?query=` | GET | User search |
//! | `/api/profile-enhanced/{profile_id}` | GET | Merged legacy and current profile |
//! | `/api/invitations/{profile_id}` | GET | Users a profile invited |
//! | `/api/network/{profile_id}?depth=` | GET | Invitation graph |
//! | `/api/recent-searches` | GET, POST | Recently searched profiles |
//! | `/api/cache-stats` | GET | Response cache statistics |
//! | `/api/cache-clear` | POST | Empty the response cache |
//! | `/health` | GET | Liveness probe |

pub mod routes;
pub mod state;

pub use routes::{
    create_router, create_router_with_body_limit, create_router_with_observability, ApiError,
    JsonBadRequest, DEFAULT_BODY_LIMIT,
};
pub use state::AppState;
