mod error;
mod extract;
mod handlers;
mod router;
mod server;
mod types;

pub use error::{ApiError, ApiResult};
pub use extract::AuthUser;
pub use router::build_router;
pub use server::ApiServer;
pub use types::*;

use crate::application::{AuthService, VoucherService};
use crate::storage::Repository;

/// Shared handler state: the two application services over one repository.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub vouchers: VoucherService,
}

impl AppState {
    pub fn new(repo: Repository) -> Self {
        Self {
            auth: AuthService::new(repo.clone()),
            vouchers: VoucherService::new(repo),
        }
    }
}
