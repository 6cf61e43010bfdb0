pub mod config;
pub mod decimal;
pub mod disbursement;
pub mod errors;
pub mod events;
pub mod loan;
pub mod overdue;
pub mod payments;
pub mod serialization;
pub mod state;
pub mod types;

// re-export key types
pub use config::{EngineConfig, RiskThresholds, ScheduleConfig, StatusThresholds};
pub use decimal::{Money, Rate};
pub use disbursement::{DisbursementCalculator, LoanComputation, LoanTerms, MAX_PERIODS};
pub use errors::{LoanError, Result};
pub use events::{Event, EventStore};
pub use loan::Loan;
pub use overdue::{
    assess_overdue, calculate_credit_score, calculate_overdue_days, calculate_risk_level,
    derive_customer_status, generate_collection_advice, overdue_stage, parse_due_date, CollectionAdvice,
    CreditHistory, OverdueAssessment, OverdueInput, PenaltyCalculation, PenaltyConfig, PenaltyEngine,
};
pub use payments::{
    check_settlement, OutstandingBalances, PaymentAllocator, PaymentRequest, PaymentResult,
    RepaymentInstallment, RepaymentSchedule, ScheduleGenerator, SettlementResult,
};
pub use serialization::LoanView;
pub use types::{
    CollectionMethod, CollectionPriority, CollectionTimeline, CustomerStatus, InstallmentStatus, LoanId,
    LoanMethod, LoanStatus, OverdueStage, PaymentAllocation, PaymentMethod, RiskLevel,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
