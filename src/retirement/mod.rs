//! Retirement records: 401k contributions and Social Security statements.

mod plan_401k;
mod ssn;

pub use plan_401k::{Retirement401k, Retirement401kForm};
pub use ssn::{Ssn, SsnRecord, SsnRecordForm};
