mod accounts;
mod driver;

pub use accounts::AccountRepository;
pub use driver::DatabaseDriver;
