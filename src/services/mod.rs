pub mod api_client;
pub mod export;
pub mod intake;
pub mod session;

pub use api_client::{ApiClient, DownloadedFile};
pub use export::ExportController;
pub use intake::{CsvFile, IntakeController};
pub use session::{Session, Ticket};
