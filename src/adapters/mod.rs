// Adapters layer: 對外部系統（HTTP、檔案系統）的具體實作

pub mod http;
pub mod storage;
