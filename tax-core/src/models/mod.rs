mod elapsed_time;
mod session;
mod tax_bracket;
mod tax_computation;

pub use elapsed_time::ElapsedTime;
pub use session::{Session, Step, UserId};
pub use tax_bracket::{BracketTable, BracketTableError, TaxBracket};
pub use tax_computation::{TaxComputationInput, TaxComputationResult};
