pub mod category;
pub mod history;
pub mod message;
pub mod money;
pub mod period;
pub mod store;
pub mod transaction;

pub use category::{default_categories, Category, CategorySuggestion, DEFAULT_CATEGORIES};
pub use history::{current_balance, merge, monthly_spending, MergeOutcome};
pub use message::{filter_known_senders, RawMessage, KNOWN_SENDERS};
pub use money::Money;
pub use period::DateRange;
pub use store::{CategoryStore, InMemoryStore, StoreError, TransactionStore};
pub use transaction::{Transaction, TransactionError, TransactionType, UNKNOWN_ACCOUNT};
