//! Entity module - Contains all SeaORM entity definitions for the community store.
//! Each collection of the document store is one table; each entity has a Model
//! struct for data and an Entity struct for operations.

pub mod announcement;
pub mod chat_message;
pub mod complaint;
pub mod emergency;
pub mod fund_entry;
pub mod payment;
pub mod resident;
pub mod visitor;

// Re-export specific types to avoid conflicts
pub use announcement::{
    Column as AnnouncementColumn, Entity as Announcement, Model as AnnouncementModel,
};
pub use chat_message::{
    Column as ChatMessageColumn, Entity as ChatMessage, Model as ChatMessageModel,
};
pub use complaint::{Column as ComplaintColumn, Entity as Complaint, Model as ComplaintModel};
pub use emergency::{Column as EmergencyColumn, Entity as Emergency, Model as EmergencyModel};
pub use fund_entry::{Column as FundEntryColumn, Entity as FundEntry, Model as FundEntryModel};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
pub use resident::{Column as ResidentColumn, Entity as Resident, Model as ResidentModel};
pub use visitor::{Column as VisitorColumn, Entity as Visitor, Model as VisitorModel};
