mod entry;
mod ledger;
mod money;
mod user;
mod voucher;

pub use entry::*;
pub use ledger::*;
pub use money::*;
pub use user::*;
pub use voucher::*;
