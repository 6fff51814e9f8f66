pub mod chemical;
pub mod stock_history;
pub mod usage_log;
