pub mod schema;
pub use schema::{FieldType, Schema};

pub mod layout;
pub use layout::Layout;

pub mod rid;
pub use rid::Rid;

pub mod constant;
pub use constant::Constant;

pub mod scan;
pub use scan::{Scan, UpdateScan};

pub mod record_page;
pub use record_page::RecordPage;

pub mod table_scan;
pub use table_scan::TableScan;
