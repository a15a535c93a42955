// Domain layer: 資料模型與 ports（介面），不依賴 adapters。

pub mod model;
pub mod ports;
