pub mod affiliate_ledger;
pub mod booking_ledger;
pub mod calendar;
pub mod commission_ledger;
pub mod crm_dispatch;
pub mod monitor;
pub mod notification;
pub mod validation;
