//! # Repository Module
//!
//! Database repository implementations for Dayclose.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Operation (dayclose-service)                                          │
//! │       │                                                                 │
//! │       │  db.submissions().submit_batch(manager, date, batch_id)        │
//! │       ▼                                                                 │
//! │  SubmissionRepository                                                  │
//! │  ├── create(&self, submission, initial_expense)                        │
//! │  ├── replace_report(&self, submission, expenses, expected_status)      │
//! │  ├── submit_batch(&self, manager_id, date, batch_id)                   │
//! │  └── find_by_outlet_date(&self, outlet_id, date)                       │
//! │       │                                                                 │
//! │       │  SQL inside ONE transaction per mutating call                  │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                        │
//! │  • SQL is isolated in one place                                        │
//! │  • Multi-row invariants live next to the rows they protect             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`outlet::OutletRepository`] - Outlet config lookups and ownership checks
//! - [`submission::SubmissionRepository`] - Lifecycle writes, batch submit, notes
//! - [`expense::ExpenseRepository`] - Expense reads and the bulk approval sub-flow
//! - [`external_sales::ExternalSalesRepository`] - Snapshot delete-and-reinsert

pub mod expense;
pub mod external_sales;
pub mod outlet;
pub mod submission;
