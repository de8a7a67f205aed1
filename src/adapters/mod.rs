// 外部系統的具體實作：商品 API、發佈平台、檔案儲存

pub mod paapi;
pub mod storage;
pub mod threads;
pub mod x;

pub use paapi::{PaApiClient, PaApiSettings};
pub use storage::LocalStorage;
pub use threads::ThreadsPublisher;
pub use x::XPublisher;
