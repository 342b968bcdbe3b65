//! Money lent, repaid or gifted between people, and the net summary of who owes whom.

mod endpoints;
mod model;
mod summary;

pub use endpoints::{list_person_transactions_endpoint, summary_endpoint};
pub use model::{PersonTransaction, PersonTransactionForm, TransferStatus};
pub use summary::{NetSummary, NetSummaryView, Transfer, TransferDetail, summarize};
