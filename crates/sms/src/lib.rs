macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod assemble;
pub mod bank;
pub mod classify;
pub mod confidence;
pub mod describe;
pub mod engine;
pub mod extract;
pub mod service;

pub use assemble::{transaction_id, Assembler, Rejection};
pub use bank::{
    BankProfile, BankProfileConfig, BankRegistry, RegistryError, SenderOverlap, DEFAULT_BANKS,
};
pub use classify::{CategoryClassifier, KEYWORD_GROUPS, OTHER_CATEGORY, UPI_CATEGORY};
pub use describe::describe;
pub use engine::{BatchOutcome, SmsEngine};
pub use extract::{ExtractedFields, Extractor};
pub use service::{initialize_categories, IngestReport, Recategorization, TransactionService};
