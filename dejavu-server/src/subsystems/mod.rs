pub mod accounts;
pub mod ask;
pub mod history;
pub mod resolve;
pub mod scan;
